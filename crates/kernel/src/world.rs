use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use weft_common::{EntityId, vec3_xyz};

use crate::entity::{Entity, EntityState};

/// A reported geometric interaction between two entities.
///
/// The core provides the channel only; contacts are populated by an
/// external detector (or a future broad+narrow phase).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub a: EntityId,
    pub b: EntityId,
    #[serde(with = "vec3_xyz")]
    pub normal: Vec3,
    pub depth: f32,
}

/// Serializable snapshot of the entire world at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldState {
    pub timestamp: f64,
    pub step_count: u64,
    pub entities: Vec<EntityState>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contacts: Vec<Contact>,
}

/// How [`World::apply_state`] treats records whose id has no match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestorePolicy {
    /// Instantiate entities for unknown ids instead of ignoring the record.
    pub create_missing: bool,
}

impl RestorePolicy {
    pub fn create_missing() -> Self {
        Self {
            create_missing: true,
        }
    }
}

/// Handle identifying one registered contact listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type ContactListener = Box<dyn FnMut(&Contact)>;

/// The authoritative registry and integrator of all entities.
///
/// All mutation goes through explicit operations; renderers and other
/// consumers read, never write. Entities are keyed in a `BTreeMap` so every
/// traversal (integration, observation, snapshots) happens in one canonical
/// order.
#[derive(Default)]
pub struct World {
    entities: BTreeMap<EntityId, Entity>,
    step_count: u64,
    timestamp: f64,
    /// Contacts reported during the current step; cleared when the next
    /// step begins.
    contacts: Vec<Contact>,
    initial: Option<WorldState>,
    listeners: Vec<(ListenerId, ContactListener)>,
    next_listener: u64,
}

impl World {
    /// Create an empty world at step 0.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    /// Simulation time: the sum of every dt passed to [`World::advance`].
    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Register an entity. An existing entity with the same id is replaced.
    pub fn add(&mut self, entity: Entity) {
        self.entities.insert(entity.id.clone(), entity);
    }

    /// Remove an entity. Removing an unknown id is a no-op.
    pub fn remove(&mut self, id: &EntityId) -> Option<Entity> {
        self.entities.remove(id)
    }

    pub fn get(&self, id: &EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    pub fn get_mut(&mut self, id: &EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id)
    }

    /// Read-only access to all entities in canonical id order.
    pub fn entities(&self) -> &BTreeMap<EntityId, Entity> {
        &self.entities
    }

    /// Contacts reported during the current step.
    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    /// Advance every entity by one fixed step of `dt` seconds.
    ///
    /// Explicit Euler: `position += velocity * dt`; a non-zero angular
    /// velocity composes an axis-angle delta onto the rotation. Pure with
    /// respect to (state, dt) — no clock reads, no randomness.
    pub fn advance(&mut self, dt: f32) {
        self.contacts.clear();

        for entity in self.entities.values_mut() {
            entity.position += entity.velocity * dt;

            let speed = entity.angular_velocity.length();
            if speed > 0.0 {
                let axis = entity.angular_velocity / speed;
                let delta = Quat::from_axis_angle(axis, speed * dt);
                entity.rotation = (delta * entity.rotation).normalize();
            }
        }

        self.step_count += 1;
        self.timestamp += f64::from(dt);
    }

    /// Snapshot the world into a fully owned, serializable [`WorldState`].
    pub fn state(&self) -> WorldState {
        WorldState {
            timestamp: self.timestamp,
            step_count: self.step_count,
            entities: self.entities.values().map(Entity::state).collect(),
            contacts: self.contacts.clone(),
        }
    }

    /// Restore from a snapshot.
    ///
    /// Records are matched to existing entities by id. Unknown ids are
    /// instantiated when `policy.create_missing` is set and silently
    /// ignored otherwise — the ignore path is deliberate and never an
    /// error. Entities absent from the snapshot are left untouched.
    pub fn apply_state(&mut self, state: &WorldState, policy: RestorePolicy) {
        self.timestamp = state.timestamp;
        self.step_count = state.step_count;
        self.contacts = state.contacts.clone();

        for record in &state.entities {
            match self.entities.entry(record.id.clone()) {
                Entry::Occupied(mut entry) => entry.get_mut().apply_state(record),
                Entry::Vacant(entry) if policy.create_missing => {
                    entry.insert(Entity::from_state(record));
                }
                Entry::Vacant(_) => {
                    tracing::debug!(id = %record.id, "ignoring snapshot record for unknown entity");
                }
            }
        }
    }

    /// Empty the entity set, reset counters, and drop any captured
    /// baseline.
    pub fn clear(&mut self) {
        self.entities.clear();
        self.contacts.clear();
        self.step_count = 0;
        self.timestamp = 0.0;
        self.initial = None;
    }

    /// Capture the current state as the recovery baseline for
    /// [`World::reset_to_initial_state`].
    pub fn capture_initial_state(&mut self) {
        self.initial = Some(self.state());
    }

    /// Restore the captured baseline, or [`World::clear`] if none was ever
    /// captured. The entity set comes out exactly as captured: entities
    /// removed since the capture are recreated, entities added since are
    /// removed.
    pub fn reset_to_initial_state(&mut self) {
        match self.initial.clone() {
            Some(baseline) => {
                let captured: BTreeSet<&EntityId> =
                    baseline.entities.iter().map(|record| &record.id).collect();
                self.entities.retain(|id, _| captured.contains(id));
                self.apply_state(&baseline, RestorePolicy::create_missing());
            }
            None => self.clear(),
        }
    }

    /// Record a contact for the current step and synchronously notify all
    /// listeners in registration order.
    pub fn emit_contact(&mut self, contact: Contact) {
        self.contacts.push(contact.clone());
        for (_, listener) in &mut self.listeners {
            listener(&contact);
        }
    }

    /// Subscribe to contact notifications. Returns a handle for removal.
    pub fn on_contact(&mut self, listener: impl FnMut(&Contact) + 'static) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Unsubscribe a contact listener. Returns whether it was registered.
    pub fn remove_contact_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn mover(id: &str, position: Vec3, velocity: Vec3) -> Entity {
        Entity::new(id, "mover", position).with_velocity(velocity)
    }

    #[test]
    fn world_starts_empty() {
        let w = World::new();
        assert_eq!(w.step_count(), 0);
        assert_eq!(w.timestamp(), 0.0);
        assert_eq!(w.entity_count(), 0);
    }

    #[test]
    fn remove_unknown_id_is_noop() {
        let mut w = World::new();
        w.add(mover("a", Vec3::ZERO, Vec3::ZERO));
        assert!(w.remove(&"ghost".into()).is_none());
        assert_eq!(w.entity_count(), 1);
    }

    #[test]
    fn advance_integrates_position() {
        let mut w = World::new();
        w.add(mover("a", Vec3::ZERO, Vec3::new(2.0, 0.0, -1.0)));
        w.advance(0.5);

        let e = w.get(&"a".into()).unwrap();
        assert_eq!(e.position, Vec3::new(1.0, 0.0, -0.5));
        assert_eq!(w.step_count(), 1);
        assert_eq!(w.timestamp(), 0.5);
    }

    #[test]
    fn half_steps_match_full_step_for_constant_velocity() {
        let mut full = World::new();
        let mut halved = World::new();
        full.add(mover("a", Vec3::ZERO, Vec3::new(3.0, 1.0, -2.0)));
        halved.add(mover("a", Vec3::ZERO, Vec3::new(3.0, 1.0, -2.0)));

        full.advance(0.1);
        halved.advance(0.05);
        halved.advance(0.05);

        let p_full = full.get(&"a".into()).unwrap().position;
        let p_half = halved.get(&"a".into()).unwrap().position;
        assert!((p_full - p_half).length() < 1e-5);
        assert_eq!(halved.step_count(), 2);
    }

    #[test]
    fn advance_composes_rotation_from_angular_velocity() {
        let mut w = World::new();
        let mut e = mover("spinner", Vec3::ZERO, Vec3::ZERO);
        e.angular_velocity = Vec3::new(0.0, std::f32::consts::FRAC_PI_2, 0.0);
        w.add(e);

        // Quarter-turn per second for one second of steps.
        for _ in 0..10 {
            w.advance(0.1);
        }

        let rotation = w.get(&"spinner".into()).unwrap().rotation;
        let expected = Quat::from_rotation_y(std::f32::consts::FRAC_PI_2);
        assert!(rotation.angle_between(expected) < 1e-3);
    }

    #[test]
    fn zero_angular_velocity_leaves_rotation_untouched() {
        let mut w = World::new();
        let initial = Quat::from_rotation_y(0.3);
        w.add(mover("a", Vec3::ZERO, Vec3::X).with_rotation(initial));
        w.advance(0.1);
        assert_eq!(w.get(&"a".into()).unwrap().rotation, initial);
    }

    #[test]
    fn state_apply_state_roundtrip_is_field_equal() {
        let mut w = World::new();
        w.add(mover("a", Vec3::new(1.0, 2.0, 3.0), Vec3::X));
        w.add(mover("b", Vec3::new(-5.0, 0.0, 4.0), Vec3::ZERO));
        w.advance(0.25);
        let snapshot = w.state();

        let mut restored = World::new();
        restored.apply_state(&snapshot, RestorePolicy::create_missing());

        assert_eq!(restored.state(), snapshot);
    }

    #[test]
    fn apply_state_unknown_id_is_ignored_by_default() {
        let mut w = World::new();
        w.add(mover("a", Vec3::ZERO, Vec3::ZERO));

        let mut other = World::new();
        other.add(mover("phantom", Vec3::ONE, Vec3::ZERO));
        let state = other.state();

        w.apply_state(&state, RestorePolicy::default());
        assert_eq!(w.entity_count(), 1);
        assert!(w.get(&"phantom".into()).is_none());
    }

    #[test]
    fn capture_then_reset_restores_capture_time_state() {
        let mut w = World::new();
        w.add(mover("a", Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0)));
        w.capture_initial_state();
        let baseline = w.state();

        for _ in 0..50 {
            w.advance(1.0 / 60.0);
        }
        w.get_mut(&"a".into()).unwrap().velocity = Vec3::new(0.0, 9.0, 0.0);
        w.remove(&"a".into());

        w.reset_to_initial_state();
        assert_eq!(w.state(), baseline);
    }

    #[test]
    fn reset_removes_entities_added_after_capture() {
        let mut w = World::new();
        w.add(mover("a", Vec3::ZERO, Vec3::X));
        w.capture_initial_state();
        let baseline = w.state();

        w.add(mover("late", Vec3::ONE, Vec3::ZERO));
        w.advance(0.1);

        w.reset_to_initial_state();
        assert!(w.get(&"late".into()).is_none());
        assert_eq!(w.state(), baseline);
    }

    #[test]
    fn reset_without_baseline_clears() {
        let mut w = World::new();
        w.add(mover("a", Vec3::ZERO, Vec3::ZERO));
        w.advance(0.1);
        w.reset_to_initial_state();
        assert_eq!(w.entity_count(), 0);
        assert_eq!(w.step_count(), 0);
        assert_eq!(w.timestamp(), 0.0);
    }

    #[test]
    fn clear_discards_baseline() {
        let mut w = World::new();
        w.add(mover("a", Vec3::ZERO, Vec3::ZERO));
        w.capture_initial_state();
        w.clear();
        // Baseline is gone, so reset falls back to clear semantics.
        w.add(mover("b", Vec3::ONE, Vec3::ZERO));
        w.reset_to_initial_state();
        assert_eq!(w.entity_count(), 0);
    }

    #[test]
    fn contacts_clear_at_start_of_each_step() {
        let mut w = World::new();
        w.emit_contact(Contact {
            a: "a".into(),
            b: "b".into(),
            normal: Vec3::Y,
            depth: 0.1,
        });
        assert_eq!(w.contacts().len(), 1);
        w.advance(0.1);
        assert!(w.contacts().is_empty());
    }

    #[test]
    fn listeners_notified_in_registration_order() {
        let mut w = World::new();
        let order = Rc::new(RefCell::new(Vec::new()));

        let o1 = Rc::clone(&order);
        w.on_contact(move |_| o1.borrow_mut().push("first"));
        let o2 = Rc::clone(&order);
        w.on_contact(move |_| o2.borrow_mut().push("second"));

        w.emit_contact(Contact {
            a: "a".into(),
            b: "b".into(),
            normal: Vec3::Y,
            depth: 0.0,
        });
        assert_eq!(*order.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn removed_listener_is_not_notified() {
        let mut w = World::new();
        let count = Rc::new(RefCell::new(0));

        let c = Rc::clone(&count);
        let id = w.on_contact(move |_| *c.borrow_mut() += 1);

        let contact = Contact {
            a: "a".into(),
            b: "b".into(),
            normal: Vec3::X,
            depth: 0.2,
        };
        w.emit_contact(contact.clone());
        assert!(w.remove_contact_listener(id));
        assert!(!w.remove_contact_listener(id));
        w.emit_contact(contact);

        assert_eq!(*count.borrow(), 1);
        assert_eq!(w.contacts().len(), 2);
    }

    #[test]
    fn world_state_serializes_to_interchange_shape() {
        let mut w = World::new();
        w.add(mover("a", Vec3::new(1.0, 0.0, 0.0), Vec3::ZERO));
        w.advance(0.5);

        let json = serde_json::to_value(w.state()).unwrap();
        assert_eq!(json["timestamp"], 0.5);
        assert_eq!(json["stepCount"], 1);
        assert_eq!(json["entities"][0]["id"], "a");
        assert_eq!(json["entities"][0]["position"]["x"], 1.0);
    }
}
