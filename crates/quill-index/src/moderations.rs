//! Moderation (like/pin) persistence and target-counter accounting.

use rusqlite::{params, Row};
use std::sync::Arc;
use tracing::debug;

use quill_core::{Envelope, Moderation, ModerationKind, Refhash};

use crate::engine::Engine;
use crate::envelopes::{self, StoredEnvelope, ENVELOPE_COLUMNS};
use crate::error::Result;
use crate::page::Page;

/// DAO for moderation envelopes.
pub struct ModerationsDao {
    engine: Arc<Engine>,
}

impl ModerationsDao {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self { engine }
    }

    /// Persist a moderation envelope.
    ///
    /// Idempotent on refhash. In the same transaction, a LIKE bumps the
    /// target post's like count and a PIN its pin count. Moderations do not
    /// cascade: only the immediate target is touched, and a dangling target
    /// leaves the counters of nothing to touch (the moderation row is still
    /// stored).
    pub fn insert_moderation(&self, envelope: &Envelope<Moderation>) -> Result<()> {
        self.engine.with_tx(|tx| {
            if envelopes::exists(tx, &envelope.refhash)? {
                debug!(refhash = %envelope.refhash, "duplicate moderation envelope, skipping");
                return Ok(());
            }
            let envelope_id = envelopes::insert(tx, envelope)?;
            let moderation = &envelope.message;
            tx.execute(
                "INSERT INTO moderations (envelope_id, reference, kind) VALUES (?1, ?2, ?3)",
                params![
                    envelope_id,
                    moderation.reference.to_hex(),
                    moderation.kind.as_str(),
                ],
            )?;

            let counter = match moderation.kind {
                ModerationKind::Like => "like_count",
                ModerationKind::Pin => "pin_count",
            };
            let updated = tx.execute(
                &format!(
                    "UPDATE posts SET {counter} = {counter} + 1
                     WHERE envelope_id = (SELECT id FROM envelopes WHERE refhash = ?1)"
                ),
                params![moderation.reference.to_hex()],
            )?;
            if updated == 0 {
                debug!(reference = %moderation.reference, "moderation targets unknown post");
            }
            Ok(())
        })
    }

    /// Page through the moderations targeting a post, oldest first.
    pub fn get_moderations_by_reference(
        &self,
        reference: &Refhash,
        cursor: Option<i64>,
        limit: usize,
    ) -> Result<Page<Envelope<Moderation>>> {
        let limit = limit.max(1);
        let sql = format!(
            "SELECT {ENVELOPE_COLUMNS}, m.reference, m.kind
             FROM envelopes e JOIN moderations m ON m.envelope_id = e.id
             WHERE m.reference = ?1 AND e.id > ?2
             ORDER BY e.id ASC LIMIT ?3"
        );
        let mut rows: Vec<ModerationRow> = Vec::new();
        self.engine.each(
            &sql,
            params![reference.to_hex(), cursor.unwrap_or(0), limit as i64],
            |row| {
                rows.push(ModerationRow::from_row(row)?);
                Ok(())
            },
        )?;
        let last_id = rows.last().map(|r| r.env.id);
        let items: Result<Vec<_>> = rows
            .into_iter()
            .map(ModerationRow::into_envelope)
            .collect();
        Ok(Page::from_rows(items?, last_id, limit))
    }
}

struct ModerationRow {
    env: StoredEnvelope,
    reference: String,
    kind: String,
}

impl ModerationRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            env: StoredEnvelope::from_row(row)?,
            reference: row.get(7)?,
            kind: row.get(8)?,
        })
    }

    fn into_envelope(self) -> Result<Envelope<Moderation>> {
        let moderation = Moderation {
            reference: Refhash::from_hex(&self.reference)?,
            kind: ModerationKind::from_str(&self.kind)?,
        };
        self.env.into_envelope(moderation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::posts::PostsDao;
    use crate::schema::ensure_schema;
    use quill_core::Post;

    fn daos() -> (PostsDao, ModerationsDao) {
        let engine = Arc::new(Engine::open_in_memory().unwrap());
        ensure_schema(&engine).unwrap();
        (
            PostsDao::new(engine.clone()),
            ModerationsDao::new(engine),
        )
    }

    fn like(subdomain: &str, created_at: u64, target: Refhash) -> Envelope<Moderation> {
        Envelope::new_at(
            "testnet",
            "testtld",
            Some(subdomain),
            created_at,
            Moderation::new(target, ModerationKind::Like),
        )
        .unwrap()
    }

    #[test]
    fn like_increments_target_counter() {
        let (posts, moderations) = daos();
        let post = Envelope::new_at("testnet", "testtld", Some("alice"), 1000, Post::new("hi"))
            .unwrap();
        posts.insert_post(&post).unwrap();

        moderations
            .insert_moderation(&like("bob", 2000, post.refhash))
            .unwrap();

        let stored = posts.get_post_by_refhash(&post.refhash).unwrap().unwrap();
        assert_eq!(stored.message.like_count, 1);
        assert_eq!(stored.message.pin_count, 0);
    }

    #[test]
    fn distinct_reactions_accumulate() {
        let (posts, moderations) = daos();
        let post = Envelope::new_at("testnet", "testtld", Some("alice"), 1000, Post::new("hi"))
            .unwrap();
        posts.insert_post(&post).unwrap();

        for i in 0..3u64 {
            moderations
                .insert_moderation(&like("bob", 2000 + i, post.refhash))
                .unwrap();
        }
        for i in 0..2u64 {
            let pin = Envelope::new_at(
                "testnet",
                "testtld",
                Some("carol"),
                3000 + i,
                Moderation::new(post.refhash, ModerationKind::Pin),
            )
            .unwrap();
            moderations.insert_moderation(&pin).unwrap();
        }

        let stored = posts.get_post_by_refhash(&post.refhash).unwrap().unwrap();
        assert_eq!(stored.message.like_count, 3);
        assert_eq!(stored.message.pin_count, 2);
    }

    #[test]
    fn duplicate_moderation_counts_once() {
        let (posts, moderations) = daos();
        let post = Envelope::new_at("testnet", "testtld", Some("alice"), 1000, Post::new("hi"))
            .unwrap();
        posts.insert_post(&post).unwrap();

        let reaction = like("bob", 2000, post.refhash);
        moderations.insert_moderation(&reaction).unwrap();
        moderations.insert_moderation(&reaction).unwrap();

        let stored = posts.get_post_by_refhash(&post.refhash).unwrap().unwrap();
        assert_eq!(stored.message.like_count, 1, "at-most-once accounting");
    }

    #[test]
    fn dangling_target_still_stores_the_moderation() {
        let (_posts, moderations) = daos();
        let ghost = Refhash::digest(b"no such post");
        moderations
            .insert_moderation(&like("bob", 2000, ghost))
            .unwrap();

        let page = moderations
            .get_moderations_by_reference(&ghost, None, 10)
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].message.kind, ModerationKind::Like);
    }

    #[test]
    fn moderations_page_in_insertion_order() {
        let (posts, moderations) = daos();
        let post = Envelope::new_at("testnet", "testtld", Some("alice"), 1000, Post::new("hi"))
            .unwrap();
        posts.insert_post(&post).unwrap();

        let mut expected = Vec::new();
        for i in 0..5u64 {
            let reaction = like("bob", 2000 + i, post.refhash);
            moderations.insert_moderation(&reaction).unwrap();
            expected.push(reaction.refhash);
        }

        let mut collected = Vec::new();
        let mut cursor = None;
        for _ in 0..10 {
            let page = moderations
                .get_moderations_by_reference(&post.refhash, cursor, 2)
                .unwrap();
            collected.extend(page.items.iter().map(|e| e.refhash));
            match page.next {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }
        assert_eq!(collected, expected);
    }
}
