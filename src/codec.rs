//! JSON capabilities used for payloads and result targets.
//!
//! Both traits are blanket-implemented over serde, so any `Serialize` value is a
//! [`Payload`] and any `DeserializeOwned` value is a [`Target`]. They are object safe,
//! which lets the verb methods take `Option<&dyn Payload>` and `Option<&mut dyn Target>`
//! and accept a bare `None` without type annotations.

use serde::{de::DeserializeOwned, Serialize};

/// A value that can be sent as a JSON request body.
pub trait Payload {
    /// Serializes the value to JSON bytes.
    fn to_json(&self) -> serde_json::Result<Vec<u8>>;
}

impl<T> Payload for T
where
    T: Serialize + ?Sized,
{
    fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

/// A mutable location a JSON response body can be decoded into.
pub trait Target {
    /// Replaces `self` with the value decoded from `body`.
    ///
    /// On failure `self` is left untouched.
    fn decode_json(&mut self, body: &[u8]) -> serde_json::Result<()>;
}

impl<T> Target for T
where
    T: DeserializeOwned,
{
    fn decode_json(&mut self, body: &[u8]) -> serde_json::Result<()> {
        *self = serde_json::from_slice(body)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{ser::Error as _, Deserialize, Serializer};
    use std::collections::HashMap;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    struct Pair {
        a: u8,
        b: String,
    }

    struct Opaque;

    impl Serialize for Opaque {
        fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
            Err(S::Error::custom("opaque values have no JSON form"))
        }
    }

    #[test]
    fn test_payload_serializes_through_trait_object() {
        let mut map = HashMap::new();
        map.insert("k", 1);
        let payload: &dyn Payload = &map;
        assert_eq!(payload.to_json().unwrap(), br#"{"k":1}"#.to_vec());
    }

    #[test]
    fn test_payload_reports_unrepresentable_values() {
        let payload: &dyn Payload = &Opaque;
        assert!(payload.to_json().is_err());
    }

    #[test]
    fn test_target_decodes_in_place() {
        let mut pair = Pair::default();
        let target: &mut dyn Target = &mut pair;
        target.decode_json(br#"{"a":7,"b":"x"}"#).unwrap();
        assert_eq!(
            pair,
            Pair {
                a: 7,
                b: "x".to_string()
            }
        );
    }

    #[test]
    fn test_target_untouched_on_failure() {
        let mut pair = Pair {
            a: 1,
            b: "keep".to_string(),
        };
        assert!(pair.decode_json(b"not json").is_err());
        assert_eq!(pair.b, "keep");
    }
}
