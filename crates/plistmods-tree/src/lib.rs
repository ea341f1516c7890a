//! In-memory XML property list trees.
//!
//! A small model of the plist format for tools that edit plists in place:
//! dicts keep document order, scalar payloads keep their serialized text,
//! and saving re-asserts the Apple DOCTYPE.

mod document;
mod error;
mod node;
mod reader;
mod writer;

pub use document::PlistDocument;
pub use error::TreeError;
pub use node::{Dict, NodeKind, PlistNode, Scalar, ScalarKind};
pub use writer::{DOCTYPE_PUBLIC_ID, DOCTYPE_SYSTEM_ID};
