use serde::{Deserialize, Serialize};

/// Keys of the durable records.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum StorageKey {
    /// Last known [`PlayerPosition`](sanctuary_core::PlayerPosition).
    PlayerPosition,
    /// [`PermissionRecord`] of the last GPS permission decision.
    GpsPermissionStatus,
    /// [`PlayerChoiceRecord`] of the last continue/new decision.
    PlayerChoice,
    /// Identifier of the saved player, present when continuing is possible.
    PlayerId,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionStatus {
    Granted,
    Denied,
}

/// Stored outcome of a GPS permission prompt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionRecord {
    pub status: PermissionStatus,
    /// Unix milliseconds when the decision was recorded.
    pub timestamp: u64,
}

/// Whether the player resumes a saved adventure or starts a new one.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PlayerChoice {
    Continue,
    New,
}

impl PlayerChoice {
    pub fn label(&self) -> &'static str {
        match self {
            PlayerChoice::Continue => "Continue Adventure",
            PlayerChoice::New => "Start New Adventure",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerChoiceRecord {
    pub choice: PlayerChoice,
    pub timestamp: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_keys() {
        assert_eq!(StorageKey::PlayerPosition.as_ref(), "player_position");
        assert_eq!(StorageKey::GpsPermissionStatus.as_ref(), "gps_permission_status");
        assert_eq!(StorageKey::PlayerChoice.as_ref(), "player_choice");
        assert_eq!(StorageKey::PlayerId.as_ref(), "player_id");
    }

    #[test]
    fn test_permission_record_json() {
        let record = PermissionRecord {
            status: PermissionStatus::Denied,
            timestamp: 42,
        };
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"status":"denied","timestamp":42}"#);
    }
}
