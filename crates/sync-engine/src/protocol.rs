// crates/sync-engine/src/protocol.rs
//! Upload endpoint wire format

use crate::types::UploadProfile;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use verserec_core::ItemId;

/// Multipart field carrying the audio
pub const AUDIO_FIELD: &str = "audio_file";

/// Content type of recorded takes
pub const AUDIO_CONTENT_TYPE: &str = "audio/m4a";

/// Query parameter carrying [`RecordingData`] as JSON
pub const RECORDING_DATA_PARAM: &str = "recording_data";

/// One end of an uploaded span
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersePosition {
    pub surah_number: u16,
    pub ayah_in_surah_number: u16,
    pub part_number: u8,
}

/// Metadata describing an uploaded take
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordingData {
    pub start: VersePosition,
    pub end: VersePosition,
    pub riwayah: String,
    pub user_id: String,
}

impl RecordingData {
    /// Metadata for a single-item take
    pub fn for_item(item: ItemId, profile: &UploadProfile) -> Self {
        let position = |part_number| VersePosition {
            surah_number: item.chapter(),
            ayah_in_surah_number: item.sequence(),
            part_number,
        };
        Self {
            start: position(0),
            end: position(1),
            riwayah: profile.riwayah.clone(),
            user_id: profile.user_id.clone(),
        }
    }
}

/// Successful upload answer
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadResponse {
    /// Server-assigned name, stored as the track's remote id
    pub file_name: String,
}

/// File name a take is uploaded and stored under
pub fn track_file_name(recording: Uuid, item: ItemId) -> String {
    format!("{}-{}.m4a", recording, item)
}
