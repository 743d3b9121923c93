//! Relational schema for the envelope store and the four record types.

use crate::engine::Engine;
use crate::error::Result;

/// Create all tables and indexes if they do not exist yet. Idempotent.
pub fn ensure_schema(engine: &Engine) -> Result<()> {
    engine.exec_batch(
        "CREATE TABLE IF NOT EXISTS envelopes (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            tld             TEXT NOT NULL,
            subdomain       TEXT,
            network_id      TEXT NOT NULL,
            refhash         TEXT NOT NULL UNIQUE,
            created_at      INTEGER NOT NULL,
            additional_data BLOB
        );

        CREATE INDEX IF NOT EXISTS idx_envelopes_identity
            ON envelopes(tld, subdomain);

        CREATE TABLE IF NOT EXISTS posts (
            envelope_id INTEGER PRIMARY KEY REFERENCES envelopes(id),
            body        TEXT NOT NULL,
            title       TEXT,
            reference   TEXT,
            topic       TEXT,
            tags        TEXT NOT NULL DEFAULT '[]',
            reply_count INTEGER NOT NULL DEFAULT 0,
            like_count  INTEGER NOT NULL DEFAULT 0,
            pin_count   INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_posts_reference
            ON posts(reference);

        CREATE TABLE IF NOT EXISTS moderations (
            envelope_id INTEGER PRIMARY KEY REFERENCES envelopes(id),
            reference   TEXT NOT NULL,
            kind        TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_moderations_reference
            ON moderations(reference);

        CREATE TABLE IF NOT EXISTS connections (
            envelope_id         INTEGER PRIMARY KEY REFERENCES envelopes(id),
            connectee_tld       TEXT NOT NULL,
            connectee_subdomain TEXT,
            kind                TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_connections_target
            ON connections(connectee_tld, connectee_subdomain);

        CREATE TABLE IF NOT EXISTS media (
            envelope_id INTEGER PRIMARY KEY REFERENCES envelopes(id),
            filename    TEXT NOT NULL,
            mime_type   TEXT NOT NULL,
            content     BLOB NOT NULL
        );",
    )
}
