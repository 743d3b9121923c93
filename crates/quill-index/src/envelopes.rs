//! Shared envelope-row plumbing used by all four DAOs.
//!
//! Every record type shares the same envelope wrapper; the per-type tables
//! hold only the payload columns and point back at `envelopes.id`.

use rusqlite::{params, Connection, Row};

use quill_core::{Envelope, Refhash};

use crate::error::Result;

/// Column list every DAO query selects first, in this exact order.
/// Payload columns follow at index 7.
pub(crate) const ENVELOPE_COLUMNS: &str =
    "e.id, e.tld, e.subdomain, e.network_id, e.refhash, e.created_at, e.additional_data";

/// Check whether an envelope with this refhash is already stored.
pub(crate) fn exists(conn: &Connection, refhash: &Refhash) -> rusqlite::Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM envelopes WHERE refhash = ?1",
        params![refhash.to_hex()],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Insert the envelope row and return its storage-assigned id.
pub(crate) fn insert<T>(conn: &Connection, envelope: &Envelope<T>) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO envelopes (tld, subdomain, network_id, refhash, created_at, additional_data)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            envelope.tld,
            envelope.subdomain,
            envelope.network_id,
            envelope.refhash.to_hex(),
            envelope.created_at as i64,
            envelope.additional_data,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// The common envelope fields of a fetched row.
pub(crate) struct StoredEnvelope {
    pub id: i64,
    pub tld: String,
    pub subdomain: Option<String>,
    pub network_id: String,
    pub refhash: String,
    pub created_at: i64,
    pub additional_data: Option<Vec<u8>>,
}

impl StoredEnvelope {
    /// Read the [`ENVELOPE_COLUMNS`] prefix of a row.
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            tld: row.get(1)?,
            subdomain: row.get(2)?,
            network_id: row.get(3)?,
            refhash: row.get(4)?,
            created_at: row.get(5)?,
            additional_data: row.get(6)?,
        })
    }

    /// Rehydrate the full envelope around a decoded payload.
    pub fn into_envelope<T>(self, message: T) -> Result<Envelope<T>> {
        let refhash = Refhash::from_hex(&self.refhash)?;
        Ok(Envelope::from_stored(
            self.id,
            self.tld,
            self.subdomain,
            self.network_id,
            refhash,
            self.created_at as u64,
            message,
            self.additional_data,
        ))
    }
}
