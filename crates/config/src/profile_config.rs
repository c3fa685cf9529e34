//! Reciter profile sent along with uploads

use crate::validation::{ConfigSection, ValidationError, Validator};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProfileConfig {
    /// Identifier the upload service files recordings under
    pub user_id: String,

    /// Transmission the user recites in
    pub riwayah: String,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            user_id: "1".to_string(),
            riwayah: "Qaloon".to_string(),
        }
    }
}

impl ConfigSection for ProfileConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        Validator::collect_errors(vec![
            Validator::not_empty(&self.user_id, "profile.user_id"),
            Validator::one_of(
                &self.riwayah.as_str(),
                &["Qaloon", "Hafs", "Warsh"],
                "profile.riwayah",
            ),
        ])
    }

    fn merge(&mut self, other: Self) {
        self.user_id = other.user_id;
        self.riwayah = other.riwayah;
    }

    fn section_name(&self) -> &'static str {
        "profile"
    }
}
