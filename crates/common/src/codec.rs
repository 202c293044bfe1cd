//! Serde adapters for the snapshot interchange format.
//!
//! The interchange format encodes vectors as `{x, y, z}` objects and
//! rotations as `{x, y, z, w}` objects. glam's own serde support encodes
//! both as sequences, so fields crossing the interchange boundary use
//! `#[serde(with = "vec3_xyz")]` / `#[serde(with = "quat_xyzw")]` instead.

/// `glam::Vec3` as a `{x, y, z}` object.
pub mod vec3_xyz {
    use glam::Vec3;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    pub(super) struct Xyz {
        pub x: f32,
        pub y: f32,
        pub z: f32,
    }

    impl From<Vec3> for Xyz {
        fn from(v: Vec3) -> Self {
            Self {
                x: v.x,
                y: v.y,
                z: v.z,
            }
        }
    }

    impl From<Xyz> for Vec3 {
        fn from(v: Xyz) -> Self {
            Vec3::new(v.x, v.y, v.z)
        }
    }

    pub fn serialize<S: Serializer>(v: &Vec3, serializer: S) -> Result<S::Ok, S::Error> {
        Xyz::from(*v).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec3, D::Error> {
        Xyz::deserialize(deserializer).map(Vec3::from)
    }

    /// `Option<glam::Vec3>`, for optional interchange fields.
    pub mod opt {
        use super::Xyz;
        use glam::Vec3;
        use serde::{Deserialize, Deserializer, Serialize, Serializer};

        pub fn serialize<S: Serializer>(
            v: &Option<Vec3>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            v.map(Xyz::from).serialize(serializer)
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<Vec3>, D::Error> {
            Ok(Option::<Xyz>::deserialize(deserializer)?.map(Vec3::from))
        }
    }
}

/// `glam::Quat` as a `{x, y, z, w}` object.
pub mod quat_xyzw {
    use glam::Quat;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    pub(super) struct Xyzw {
        pub x: f32,
        pub y: f32,
        pub z: f32,
        pub w: f32,
    }

    impl From<Quat> for Xyzw {
        fn from(q: Quat) -> Self {
            Self {
                x: q.x,
                y: q.y,
                z: q.z,
                w: q.w,
            }
        }
    }

    impl From<Xyzw> for Quat {
        fn from(q: Xyzw) -> Self {
            Quat::from_xyzw(q.x, q.y, q.z, q.w)
        }
    }

    pub fn serialize<S: Serializer>(q: &Quat, serializer: S) -> Result<S::Ok, S::Error> {
        Xyzw::from(*q).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Quat, D::Error> {
        Xyzw::deserialize(deserializer).map(Quat::from)
    }

    /// `Option<glam::Quat>`, for optional interchange fields.
    pub mod opt {
        use super::Xyzw;
        use glam::Quat;
        use serde::{Deserialize, Deserializer, Serialize, Serializer};

        pub fn serialize<S: Serializer>(
            q: &Option<Quat>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            q.map(Xyzw::from).serialize(serializer)
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<Quat>, D::Error> {
            Ok(Option::<Xyzw>::deserialize(deserializer)?.map(Quat::from))
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::{Quat, Vec3};
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Sample {
        #[serde(with = "super::vec3_xyz")]
        position: Vec3,
        #[serde(with = "super::quat_xyzw")]
        rotation: Quat,
    }

    #[test]
    fn vec3_encodes_as_named_object() {
        let s = Sample {
            position: Vec3::new(1.0, 2.0, 3.0),
            rotation: Quat::IDENTITY,
        };
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["position"]["x"], 1.0);
        assert_eq!(json["position"]["z"], 3.0);
        assert_eq!(json["rotation"]["w"], 1.0);
    }

    #[test]
    fn roundtrip_preserves_values() {
        let s = Sample {
            position: Vec3::new(-4.5, 0.0, 9.25),
            rotation: Quat::from_rotation_y(0.5),
        };
        let json = serde_json::to_string(&s).unwrap();
        let back: Sample = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
    }

    #[test]
    fn interchange_object_form_parses() {
        let json = r#"{"position":{"x":5,"y":0,"z":0},"rotation":{"x":0,"y":0,"z":0,"w":1}}"#;
        let s: Sample = serde_json::from_str(json).unwrap();
        assert_eq!(s.position, Vec3::new(5.0, 0.0, 0.0));
        assert_eq!(s.rotation, Quat::IDENTITY);
    }
}
