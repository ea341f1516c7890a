//! Mod decoding.
//!
//! Turns JSON mod files into [`ModTree`]s of tagged [`ModEntry`] values.

mod entry;
mod key;
mod tree;

pub use entry::ModEntry;
pub use key::{ModKey, DELETION_MARKER};
pub use tree::{ModError, ModTree, INLINE_ORIGIN};
