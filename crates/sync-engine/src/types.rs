// crates/sync-engine/src/types.rs
//! Ledger records for recorded ranges and their tracks

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;
use verserec_core::ItemId;

/// Upload lifecycle of one recorded track
///
/// A track that has no ledger entry is absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackState {
    /// Captured locally, never sent
    Recorded,
    /// An upload was attempted and has not succeeded yet
    UploadPending,
    /// Accepted by the server under `remote_id`
    Uploaded { remote_id: String },
}

impl TrackState {
    pub fn is_uploaded(&self) -> bool {
        matches!(self, TrackState::Uploaded { .. })
    }

    pub fn remote_id(&self) -> Option<&str> {
        match self {
            TrackState::Uploaded { remote_id } => Some(remote_id),
            _ => None,
        }
    }
}

impl fmt::Display for TrackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackState::Recorded => write!(f, "recorded"),
            TrackState::UploadPending => write!(f, "upload pending"),
            TrackState::Uploaded { remote_id } => write!(f, "uploaded as {}", remote_id),
        }
    }
}

/// One item's take inside a range recording
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackRecord {
    pub state: TrackState,
    /// Human-readable label of the range the take was made in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl TrackRecord {
    /// A freshly captured take
    pub fn recorded(label: Option<String>) -> Self {
        Self {
            state: TrackState::Recorded,
            label,
            recorded_at: Utc::now(),
        }
    }
}

/// A user-recorded session over one range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeRecording {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub first: ItemId,
    pub last: ItemId,
    #[serde(default)]
    pub tracks: BTreeMap<ItemId, TrackRecord>,
}

impl RangeRecording {
    /// Creates an empty recording for the range `first..=last`
    pub fn new(id: Uuid, first: ItemId, last: ItemId) -> Self {
        let now = Utc::now();
        Self {
            id,
            created_at: now,
            updated_at: now,
            first,
            last,
            tracks: BTreeMap::new(),
        }
    }

    pub fn track(&self, item: ItemId) -> Option<&TrackRecord> {
        self.tracks.get(&item)
    }

    /// Tracks without a remote id, in ascending item order
    pub fn pending_items(&self) -> Vec<ItemId> {
        self.tracks
            .iter()
            .filter(|(_, track)| !track.state.is_uploaded())
            .map(|(item, _)| *item)
            .collect()
    }

    pub fn uploaded_count(&self) -> usize {
        self.tracks
            .values()
            .filter(|track| track.state.is_uploaded())
            .count()
    }

    pub fn is_fully_uploaded(&self) -> bool {
        !self.tracks.is_empty() && self.pending_items().is_empty()
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Reciter metadata sent with every upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadProfile {
    pub user_id: String,
    pub riwayah: String,
}

impl Default for UploadProfile {
    fn default() -> Self {
        Self {
            user_id: "1".to_string(),
            riwayah: "Qaloon".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(chapter: u16, sequence: u16) -> ItemId {
        ItemId::new(chapter, sequence).unwrap()
    }

    #[test]
    fn test_pending_items_are_ordered() {
        let mut recording = RangeRecording::new(Uuid::new_v4(), id(78, 1), id(78, 5));
        for s in [5, 1, 3] {
            recording.tracks.insert(id(78, s), TrackRecord::recorded(None));
        }
        recording.tracks.get_mut(&id(78, 3)).unwrap().state = TrackState::Uploaded {
            remote_id: "abc.m4a".to_string(),
        };

        assert_eq!(recording.pending_items(), vec![id(78, 1), id(78, 5)]);
        assert_eq!(recording.uploaded_count(), 1);
        assert!(!recording.is_fully_uploaded());
    }

    #[test]
    fn test_track_state_accessors() {
        let state = TrackState::Uploaded {
            remote_id: "x.m4a".to_string(),
        };
        assert!(state.is_uploaded());
        assert_eq!(state.remote_id(), Some("x.m4a"));
        assert_eq!(TrackState::UploadPending.remote_id(), None);
        assert_eq!(TrackState::Recorded.to_string(), "recorded");
    }

    #[test]
    fn test_serialization_uses_item_keys() {
        let mut recording = RangeRecording::new(Uuid::new_v4(), id(78, 1), id(78, 2));
        recording.tracks.insert(id(78, 2), TrackRecord::recorded(Some("An-Naba 1 : 2".into())));

        let json = serde_json::to_value(&recording).unwrap();
        assert_eq!(json["first"], "078001");
        assert_eq!(json["tracks"]["078002"]["state"], "recorded");

        let back: RangeRecording = serde_json::from_value(json).unwrap();
        assert_eq!(back, recording);
    }
}
