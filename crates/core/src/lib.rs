//! Core domain types for verserec: verse identifiers, the corpus index,
//! navigation ranges, audio sources and the shared error taxonomy.

pub mod error;
pub mod types;

// Re-export commonly used types
pub use error::{AppError, ErrorSeverity, RecoveryAction, Result};
pub use types::{
    Addressing, AudioSource, ContentIndex, Item, ItemId, NavigationMode, PlaybackRate, Range,
    RangeSelector, WordBox,
};
