//! The four message payload types carried by envelopes.
//!
//! A payload's wire form (see [`WireEncode`]) carries only what the
//! producing client asserts. The reply/like/pin counters on [`Post`] are
//! derived state: always zero at creation, mutated only by the indexer as
//! a side effect of ingesting other envelopes.

use ciborium::Value;
use serde::{Deserialize, Serialize};

use crate::encoding::{cbor_bytes, cbor_map, cbor_text, cbor_text_array};
use crate::error::{Error, Result};
use crate::hash::Refhash;
use crate::wire::WireEncode;

/// A network identity: a top-level domain name plus an optional subdomain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub tld: String,
    pub subdomain: Option<String>,
}

impl Identity {
    pub fn new(tld: impl Into<String>, subdomain: Option<&str>) -> Self {
        Self {
            tld: tld.into(),
            subdomain: subdomain.map(str::to_string),
        }
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.subdomain {
            Some(sub) => write!(f, "{sub}.{}", self.tld),
            None => write!(f, "{}", self.tld),
        }
    }
}

/// A post: top-level content or a reply to another post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub body: String,
    pub title: Option<String>,
    /// Refhash of the parent post, if this is a reply.
    pub reference: Option<Refhash>,
    pub topic: Option<String>,
    pub tags: Vec<String>,
    /// Derived: count of descendants within the propagation bound.
    pub reply_count: u64,
    /// Derived: count of LIKE moderations targeting this post.
    pub like_count: u64,
    /// Derived: count of PIN moderations targeting this post.
    pub pin_count: u64,
}

impl Post {
    /// Create a top-level post with the given body. Counters start at zero.
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            title: None,
            reference: None,
            topic: None,
            tags: Vec::new(),
            reply_count: 0,
            like_count: 0,
            pin_count: 0,
        }
    }

    /// Create a reply to the post addressed by `reference`.
    pub fn reply(body: impl Into<String>, reference: Refhash) -> Self {
        Self {
            reference: Some(reference),
            ..Self::new(body)
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }
}

impl WireEncode for Post {
    fn to_cbor(&self) -> Value {
        let mut entries: Vec<(&str, Value)> = vec![("body", cbor_text(&self.body))];
        if let Some(ref title) = self.title {
            entries.push(("title", cbor_text(title)));
        }
        if let Some(ref reference) = self.reference {
            entries.push(("reference", cbor_text(&reference.to_hex())));
        }
        if let Some(ref topic) = self.topic {
            entries.push(("topic", cbor_text(topic)));
        }
        entries.push(("tags", cbor_text_array(&self.tags)));
        cbor_map(entries)
    }
}

/// The kind of a moderation event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ModerationKind {
    Like,
    Pin,
}

impl ModerationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModerationKind::Like => "LIKE",
            ModerationKind::Pin => "PIN",
        }
    }

    pub fn from_str(s: &str) -> Result<Self> {
        match s {
            "LIKE" => Ok(ModerationKind::Like),
            "PIN" => Ok(ModerationKind::Pin),
            other => Err(Error::InvalidField {
                field: "moderation kind".into(),
                reason: format!("unknown value: {other}"),
            }),
        }
    }
}

/// A single reaction event (like or pin) targeting a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Moderation {
    /// Refhash of the target post.
    pub reference: Refhash,
    pub kind: ModerationKind,
}

impl Moderation {
    pub fn new(reference: Refhash, kind: ModerationKind) -> Self {
        Self { reference, kind }
    }
}

impl WireEncode for Moderation {
    fn to_cbor(&self) -> Value {
        cbor_map(vec![
            ("reference", cbor_text(&self.reference.to_hex())),
            ("kind", cbor_text(self.kind.as_str())),
        ])
    }
}

/// The kind of a directed graph edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConnectionKind {
    Follow,
    Block,
}

impl ConnectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionKind::Follow => "FOLLOW",
            ConnectionKind::Block => "BLOCK",
        }
    }

    pub fn from_str(s: &str) -> Result<Self> {
        match s {
            "FOLLOW" => Ok(ConnectionKind::Follow),
            "BLOCK" => Ok(ConnectionKind::Block),
            other => Err(Error::InvalidField {
                field: "connection kind".into(),
                reason: format!("unknown value: {other}"),
            }),
        }
    }
}

/// A directed edge from the envelope's author to the named identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub target: Identity,
    pub kind: ConnectionKind,
}

impl Connection {
    pub fn new(target: Identity, kind: ConnectionKind) -> Self {
        Self { target, kind }
    }
}

impl WireEncode for Connection {
    fn to_cbor(&self) -> Value {
        let mut entries: Vec<(&str, Value)> = vec![("tld", cbor_text(&self.target.tld))];
        if let Some(ref sub) = self.target.subdomain {
            entries.push(("subdomain", cbor_text(sub)));
        }
        entries.push(("kind", cbor_text(self.kind.as_str())));
        cbor_map(entries)
    }
}

/// A binary attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Media {
    pub filename: String,
    pub mime_type: String,
    pub content: Vec<u8>,
}

impl Media {
    pub fn new(
        filename: impl Into<String>,
        mime_type: impl Into<String>,
        content: Vec<u8>,
    ) -> Self {
        Self {
            filename: filename.into(),
            mime_type: mime_type.into(),
            content,
        }
    }
}

impl WireEncode for Media {
    fn to_cbor(&self) -> Value {
        cbor_map(vec![
            ("filename", cbor_text(&self.filename)),
            ("mime_type", cbor_text(&self.mime_type)),
            ("content", cbor_bytes(&self.content)),
        ])
    }
}
