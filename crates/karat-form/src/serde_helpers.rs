use serde::{Deserialize, Deserializer, Serializer};

/// Booleans the backend encodes as 0/1 integers.
///
/// Serializes as the integer form; accepts either integers or JSON booleans on
/// the way in, since older backend endpoints are inconsistent about it.
pub mod int_bool {
    use super::*;

    pub fn serialize<S>(value: &bool, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u8(u8::from(*value))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(u8),
            Bool(bool),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Int(0) => Ok(false),
            Raw::Int(_) => Ok(true),
            Raw::Bool(flag) => Ok(flag),
        }
    }
}
