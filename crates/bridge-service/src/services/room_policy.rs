//! Room name to disclosure policy resolution.

use crate::errors::BridgeError;
use crate::models::AttributeConDisCon;
use std::collections::HashMap;

/// Disclosure policies per room, with an optional fallback.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoomPolicies {
    rooms: HashMap<String, AttributeConDisCon>,
    default: Option<AttributeConDisCon>,
}

impl RoomPolicies {
    pub fn new(rooms: HashMap<String, AttributeConDisCon>, default: Option<AttributeConDisCon>) -> Self {
        Self { rooms, default }
    }

    /// Policy for `room`: an exact match wins, then the default policy.
    ///
    /// # Errors
    ///
    /// Returns `BridgeError::UnknownRoom` if neither applies.
    pub fn resolve(&self, room: &str) -> Result<&AttributeConDisCon, BridgeError> {
        self.rooms
            .get(room)
            .or(self.default.as_ref())
            .ok_or_else(|| BridgeError::UnknownRoom(room.to_string()))
    }

    /// Number of rooms with their own policy.
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::models::AttributeRequest;

    fn policy(attribute: &str) -> AttributeConDisCon {
        vec![vec![vec![AttributeRequest::Type(attribute.to_string())]]]
    }

    fn demo_rooms() -> HashMap<String, AttributeConDisCon> {
        HashMap::from([(
            "demo".to_string(),
            policy("irma-demo.MijnOverheid.fullName.firstname"),
        )])
    }

    #[test]
    fn test_exact_match() {
        let policies = RoomPolicies::new(demo_rooms(), None);
        assert_eq!(
            policies.resolve("demo").unwrap(),
            &policy("irma-demo.MijnOverheid.fullName.firstname")
        );
    }

    #[test]
    fn test_exact_match_wins_over_default() {
        let policies = RoomPolicies::new(demo_rooms(), Some(policy("irma-demo.default")));
        assert_eq!(
            policies.resolve("demo").unwrap(),
            &policy("irma-demo.MijnOverheid.fullName.firstname")
        );
    }

    #[test]
    fn test_falls_back_to_default() {
        let policies = RoomPolicies::new(demo_rooms(), Some(policy("irma-demo.default")));
        assert_eq!(
            policies.resolve("other").unwrap(),
            &policy("irma-demo.default")
        );
    }

    #[test]
    fn test_unknown_room_without_default() {
        let policies = RoomPolicies::new(demo_rooms(), None);
        let err = policies.resolve("nope").unwrap_err();
        assert!(matches!(err, BridgeError::UnknownRoom(room) if room == "nope"));
    }

    #[test]
    fn test_empty_room_name_uses_default() {
        let policies = RoomPolicies::new(HashMap::new(), Some(policy("irma-demo.default")));
        assert!(policies.resolve("").is_ok());
        assert!(policies.is_empty());
        assert!(policies.has_default());
    }

    #[test]
    fn test_room_names_are_case_sensitive() {
        let policies = RoomPolicies::new(demo_rooms(), None);
        assert!(policies.resolve("Demo").is_err());
    }
}
