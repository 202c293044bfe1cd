use serde::{Deserialize, Serialize};
use weft_kernel::{RestorePolicy, World, WorldState};

/// A world snapshot with a content hash for corruption detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub state: WorldState,
    /// FNV-1a over the canonical JSON encoding of `state`.
    pub hash: u64,
}

impl Snapshot {
    /// Capture the current world state.
    pub fn capture(world: &World) -> Self {
        let state = world.state();
        let hash = state_hash(&state);
        Self { state, hash }
    }

    /// Recompute the hash and compare.
    pub fn verify(&self) -> bool {
        self.hash == state_hash(&self.state)
    }

    /// Restore this snapshot into a world. Entities the snapshot knows but
    /// the world does not are recreated.
    pub fn restore_into(&self, world: &mut World) {
        world.apply_state(&self.state, RestorePolicy::create_missing());
    }
}

/// In-memory snapshot stack for rollback within one session.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    snapshots: Vec<Snapshot>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture and store a snapshot; returns its index.
    pub fn take_snapshot(&mut self, world: &World) -> usize {
        self.snapshots.push(Snapshot::capture(world));
        self.snapshots.len() - 1
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Snapshot> {
        self.snapshots.get(index)
    }

    /// Roll the world back to snapshot `index`. Returns whether the index
    /// existed.
    pub fn rollback(&self, index: usize, world: &mut World) -> bool {
        match self.snapshots.get(index) {
            Some(snapshot) => {
                snapshot.restore_into(world);
                true
            }
            None => false,
        }
    }
}

/// FNV-1a over the JSON encoding. Content addressing for corruption
/// detection, not cryptographic integrity (the file store layers sha256 on
/// top).
fn state_hash(state: &WorldState) -> u64 {
    let encoded = serde_json::to_string(state).unwrap_or_default();
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in encoded.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    hash
}
