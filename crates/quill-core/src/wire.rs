//! The wire-codec seam between message payloads and the refhash.
//!
//! Every payload type describes itself as a CBOR value; the canonical
//! encoder turns that into the deterministic byte form the refhash is
//! computed over. The indexer never touches the codec directly — it only
//! sees envelopes whose refhash was stamped at creation time.

use ciborium::Value;

use crate::encoding::to_canonical_bytes;
use crate::error::Result;

/// A message payload that can be serialized to its deterministic wire form.
pub trait WireEncode {
    /// The CBOR shape of this payload.
    ///
    /// Derived fields (counters maintained by the indexer) must not appear
    /// here: the wire form is the producer's statement, nothing more.
    fn to_cbor(&self) -> Value;

    /// Canonical wire bytes of this payload.
    fn to_wire(&self) -> Result<Vec<u8>> {
        to_canonical_bytes(&self.to_cbor())
    }
}
