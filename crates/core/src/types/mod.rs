//! Domain types for verserec
//!
//! - `item`: verse identifiers and corpus items
//! - `index`: the read-only corpus index
//! - `range`: range selectors and navigation modes
//! - `rate`: the playback rate cycle
//! - `source`: reference audio sources

mod index;
mod item;
mod range;
mod rate;
mod source;

pub use index::ContentIndex;
pub use item::{Item, ItemId, WordBox};
pub use range::{NavigationMode, Range, RangeSelector};
pub use rate::PlaybackRate;
pub use source::{Addressing, AudioSource};
