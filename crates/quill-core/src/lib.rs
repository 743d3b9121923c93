//! # quill-core
//!
//! Core types for the Quill social graph:
//! - Canonical CBOR wire encoding
//! - BLAKE3 refhash (the content address of every envelope)
//! - The immutable timestamped `Envelope<T>` wrapper
//! - The four message payload types (post, moderation, connection, media)
//!
//! This crate has no network code and no storage code.
//! It is the foundation the indexer crate builds on.

pub mod encoding;
pub mod error;
pub mod envelope;
pub mod hash;
pub mod message;
pub mod wire;

pub use envelope::Envelope;
pub use error::{Error, Result};
pub use hash::Refhash;
pub use message::{
    Connection, ConnectionKind, Identity, Media, Moderation, ModerationKind, Post,
};
pub use wire::WireEncode;
