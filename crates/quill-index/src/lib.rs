//! # quill-index
//!
//! The relational storage layer of the Quill social graph: ingests signed,
//! timestamped envelopes delivered by the sync layer, deduplicates them by
//! refhash, maintains derived counters (reply/like/pin), stores the directed
//! follow/block graph, and serves cursor-paginated queries back to the API
//! layer.
//!
//! The engine is a handle constructed once and shared (by `Arc`) with each
//! DAO — there is no ambient global state. Every insert runs inside a single
//! transaction; duplicate delivery of an envelope is a silent no-op, which
//! is the property that makes gossip retransmission safe.

pub mod connections;
pub mod engine;
mod envelopes;
pub mod error;
pub mod media;
pub mod moderations;
pub mod page;
pub mod posts;
pub mod schema;

pub use connections::ConnectionsDao;
pub use engine::Engine;
pub use error::{Error, Result};
pub use media::MediaDao;
pub use moderations::ModerationsDao;
pub use page::Page;
pub use posts::{PostsDao, DEFAULT_MAX_REPLY_DEPTH};
pub use schema::ensure_schema;
