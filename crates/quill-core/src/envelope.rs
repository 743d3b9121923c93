//! The envelope model.
//!
//! Every record gossiped over the network — post, moderation, connection,
//! media — travels inside an envelope that stamps authorship (tld plus
//! optional subdomain), a network identifier, a creation timestamp, and the
//! refhash derived from all of it. The refhash is computed exactly once at
//! creation; envelopes are never updated in place and never deleted by this
//! layer.

use ciborium::Value;

use crate::encoding::{cbor_bytes, cbor_int, to_canonical_bytes};
use crate::error::Result;
use crate::hash::Refhash;
use crate::message::Identity;
use crate::wire::WireEncode;

/// A timestamped, identity-stamped wrapper around a message payload,
/// addressed by its content hash.
///
/// Two envelopes with the same author and message but different timestamps
/// have different refhashes: the content address is "this exact timestamped
/// statement", not message equality.
#[derive(Debug, Clone)]
pub struct Envelope<T> {
    /// Storage-assigned sequence id. `None` until the envelope is persisted.
    pub id: Option<i64>,
    pub tld: String,
    pub subdomain: Option<String>,
    pub network_id: String,
    pub refhash: Refhash,
    /// Creation time in milliseconds since the Unix epoch. Informational;
    /// it participates in the refhash but is not trusted for ordering.
    pub created_at: u64,
    pub message: T,
    pub additional_data: Option<Vec<u8>>,
}

impl<T: WireEncode> Envelope<T> {
    /// Create an envelope stamped with the current time.
    pub fn new(
        network_id: impl Into<String>,
        tld: impl Into<String>,
        subdomain: Option<&str>,
        message: T,
    ) -> Result<Self> {
        Self::new_at(network_id, tld, subdomain, now_millis(), message)
    }

    /// Create an envelope with an explicit creation timestamp.
    ///
    /// The refhash is a pure function of the arguments: any party given the
    /// same inputs reproduces the same hash.
    pub fn new_at(
        network_id: impl Into<String>,
        tld: impl Into<String>,
        subdomain: Option<&str>,
        created_at: u64,
        message: T,
    ) -> Result<Self> {
        let tld = tld.into();
        let subdomain = subdomain.map(str::to_string);
        let refhash = compute_refhash(created_at, &message, subdomain.as_deref(), &tld)?;
        Ok(Self {
            id: None,
            tld,
            subdomain,
            network_id: network_id.into(),
            refhash,
            created_at,
            message,
            additional_data: None,
        })
    }

    pub fn with_additional_data(mut self, data: Vec<u8>) -> Self {
        self.additional_data = Some(data);
        self
    }
}

impl<T> Envelope<T> {
    /// Rehydrate an envelope from stored fields.
    ///
    /// For the storage layer only: the refhash was validated on first sight
    /// and is read back verbatim, never recomputed.
    #[allow(clippy::too_many_arguments)]
    pub fn from_stored(
        id: i64,
        tld: String,
        subdomain: Option<String>,
        network_id: String,
        refhash: Refhash,
        created_at: u64,
        message: T,
        additional_data: Option<Vec<u8>>,
    ) -> Self {
        Self {
            id: Some(id),
            tld,
            subdomain,
            network_id,
            refhash,
            created_at,
            message,
            additional_data,
        }
    }

    /// The authoring identity of this envelope.
    pub fn identity(&self) -> Identity {
        Identity {
            tld: self.tld.clone(),
            subdomain: self.subdomain.clone(),
        }
    }
}

/// `refhash = BLAKE3(canonical([created_at, wire_bytes]) || subdomain-or-"" || tld)`
fn compute_refhash<T: WireEncode>(
    created_at: u64,
    message: &T,
    subdomain: Option<&str>,
    tld: &str,
) -> Result<Refhash> {
    let wire = message.to_wire()?;
    let stamped = Value::Array(vec![cbor_int(created_at), cbor_bytes(&wire)]);
    let serialized = to_canonical_bytes(&stamped)?;
    Ok(Refhash::digest_parts(&[
        &serialized,
        subdomain.unwrap_or("").as_bytes(),
        tld.as_bytes(),
    ]))
}

/// Current Unix timestamp in milliseconds.
pub fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
