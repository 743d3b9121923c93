//! Media blob persistence.

use rusqlite::{params, Row};
use std::sync::Arc;
use tracing::debug;

use quill_core::{Envelope, Media, Refhash};

use crate::engine::Engine;
use crate::envelopes::{self, StoredEnvelope, ENVELOPE_COLUMNS};
use crate::error::Result;

/// DAO for media envelopes. Blobs are stored whole; there is no chunking.
pub struct MediaDao {
    engine: Arc<Engine>,
}

impl MediaDao {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self { engine }
    }

    /// Persist a media envelope. Idempotent on refhash.
    pub fn insert_media(&self, envelope: &Envelope<Media>) -> Result<()> {
        self.engine.with_tx(|tx| {
            if envelopes::exists(tx, &envelope.refhash)? {
                debug!(refhash = %envelope.refhash, "duplicate media envelope, skipping");
                return Ok(());
            }
            let envelope_id = envelopes::insert(tx, envelope)?;
            let media = &envelope.message;
            tx.execute(
                "INSERT INTO media (envelope_id, filename, mime_type, content)
                 VALUES (?1, ?2, ?3, ?4)",
                params![envelope_id, media.filename, media.mime_type, media.content],
            )?;
            Ok(())
        })
    }

    /// Fetch a media envelope by its refhash, blob included.
    pub fn get_media_by_refhash(&self, refhash: &Refhash) -> Result<Option<Envelope<Media>>> {
        let sql = format!(
            "SELECT {ENVELOPE_COLUMNS}, m.filename, m.mime_type, m.content
             FROM envelopes e JOIN media m ON m.envelope_id = e.id
             WHERE e.refhash = ?1"
        );
        let row = self
            .engine
            .first(&sql, params![refhash.to_hex()], MediaRow::from_row)?;
        row.map(MediaRow::into_envelope).transpose()
    }
}

struct MediaRow {
    env: StoredEnvelope,
    filename: String,
    mime_type: String,
    content: Vec<u8>,
}

impl MediaRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            env: StoredEnvelope::from_row(row)?,
            filename: row.get(7)?,
            mime_type: row.get(8)?,
            content: row.get(9)?,
        })
    }

    fn into_envelope(self) -> Result<Envelope<Media>> {
        let media = Media::new(self.filename, self.mime_type, self.content);
        self.env.into_envelope(media)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ensure_schema;

    fn dao() -> MediaDao {
        let engine = Arc::new(Engine::open_in_memory().unwrap());
        ensure_schema(&engine).unwrap();
        MediaDao::new(engine)
    }

    #[test]
    fn insert_and_get_roundtrip() {
        let dao = dao();
        let bytes = vec![0x89, 0x50, 0x4e, 0x47, 0x00, 0xff, 0x7f];
        let env = Envelope::new_at(
            "testnet",
            "alicetld",
            Some("alice"),
            1000,
            Media::new("avatar.png", "image/png", bytes.clone()),
        )
        .unwrap();
        dao.insert_media(&env).unwrap();

        let stored = dao.get_media_by_refhash(&env.refhash).unwrap().unwrap();
        assert!(stored.id.is_some());
        assert_eq!(stored.refhash, env.refhash);
        assert_eq!(stored.message.filename, "avatar.png");
        assert_eq!(stored.message.mime_type, "image/png");
        assert_eq!(stored.message.content, bytes);
    }

    #[test]
    fn duplicate_insert_is_a_noop() {
        let dao = dao();
        let env = Envelope::new_at(
            "testnet",
            "alicetld",
            None,
            1000,
            Media::new("clip.mp4", "video/mp4", vec![1, 2, 3]),
        )
        .unwrap();
        dao.insert_media(&env).unwrap();
        dao.insert_media(&env).unwrap();

        let count: i64 = dao
            .engine
            .first("SELECT COUNT(*) FROM media", [], |row| row.get(0))
            .unwrap()
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn missing_refhash_is_none() {
        let dao = dao();
        let absent = Refhash::digest(b"nothing stored under this");
        assert!(dao.get_media_by_refhash(&absent).unwrap().is_none());
    }
}
