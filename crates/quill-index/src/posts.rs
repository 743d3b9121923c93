//! Post persistence and bounded reply-count propagation.

use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::Arc;
use tracing::debug;

use quill_core::{Envelope, Post, Refhash};

use crate::engine::Engine;
use crate::envelopes::{self, StoredEnvelope, ENVELOPE_COLUMNS};
use crate::error::{Error, Result};
use crate::page::Page;

/// Default bound on how many ancestors a new reply bumps.
///
/// Propagation cost is O(depth) regardless of thread depth: a counter is
/// "descendants within this many hops", not total descendants — a deliberate
/// precision/performance tradeoff for deep threads.
pub const DEFAULT_MAX_REPLY_DEPTH: u32 = 4;

/// DAO for post envelopes.
pub struct PostsDao {
    engine: Arc<Engine>,
    max_reply_depth: u32,
}

impl PostsDao {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self {
            engine,
            max_reply_depth: DEFAULT_MAX_REPLY_DEPTH,
        }
    }

    /// Override the ancestor-propagation bound.
    pub fn with_max_reply_depth(engine: Arc<Engine>, max_reply_depth: u32) -> Self {
        Self {
            engine,
            max_reply_depth,
        }
    }

    /// Persist a post envelope.
    ///
    /// Idempotent: redelivery of an already-stored refhash is a silent no-op
    /// with no double counting. If the post is a reply, the reply counters of
    /// up to `max_reply_depth` ancestors are incremented in the same
    /// transaction.
    pub fn insert_post(&self, envelope: &Envelope<Post>) -> Result<()> {
        self.engine.with_tx(|tx| {
            if envelopes::exists(tx, &envelope.refhash)? {
                debug!(refhash = %envelope.refhash, "duplicate post envelope, skipping");
                return Ok(());
            }
            let envelope_id = envelopes::insert(tx, envelope)?;
            let post = &envelope.message;
            tx.execute(
                "INSERT INTO posts (envelope_id, body, title, reference, topic, tags)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    envelope_id,
                    post.body,
                    post.title,
                    post.reference.map(|r| r.to_hex()),
                    post.topic,
                    serde_json::to_string(&post.tags).unwrap_or_else(|_| "[]".into()),
                ],
            )?;
            debug!(refhash = %envelope.refhash, "post stored");

            if let Some(parent) = post.reference {
                self.propagate_reply_counts(tx, parent)?;
            }
            Ok(())
        })
    }

    /// Walk the parent chain, bumping each ancestor's reply count, for at
    /// most `max_reply_depth` hops. Stops early at a post that was never
    /// seen (dangling reference) or at a root post.
    fn propagate_reply_counts(&self, conn: &Connection, first: Refhash) -> Result<()> {
        let mut current = first.to_hex();
        for _ in 0..self.max_reply_depth {
            let parent_of_current: Option<Option<String>> = conn
                .query_row(
                    "SELECT p.reference FROM posts p
                     JOIN envelopes e ON e.id = p.envelope_id
                     WHERE e.refhash = ?1",
                    params![current],
                    |row| row.get(0),
                )
                .optional()?;

            let Some(next) = parent_of_current else {
                debug!(refhash = %current, "reply chain ends at unknown post");
                break;
            };

            conn.execute(
                "UPDATE posts SET reply_count = reply_count + 1
                 WHERE envelope_id = (SELECT id FROM envelopes WHERE refhash = ?1)",
                params![current],
            )?;

            match next {
                Some(grandparent) => current = grandparent,
                None => break, // reached a root post
            }
        }
        Ok(())
    }

    /// Fetch a post (with its current derived counters) by refhash.
    pub fn get_post_by_refhash(&self, refhash: &Refhash) -> Result<Option<Envelope<Post>>> {
        let sql = format!(
            "SELECT {ENVELOPE_COLUMNS}, {POST_COLUMNS}
             FROM envelopes e JOIN posts p ON p.envelope_id = e.id
             WHERE e.refhash = ?1"
        );
        let row = self
            .engine
            .first(&sql, params![refhash.to_hex()], PostRow::from_row)?;
        row.map(PostRow::into_envelope).transpose()
    }

    /// Page through an identity's posts, oldest first.
    pub fn get_posts_by_identity(
        &self,
        tld: &str,
        subdomain: Option<&str>,
        cursor: Option<i64>,
        limit: usize,
    ) -> Result<Page<Envelope<Post>>> {
        let limit = limit.max(1);
        let sql = format!(
            "SELECT {ENVELOPE_COLUMNS}, {POST_COLUMNS}
             FROM envelopes e JOIN posts p ON p.envelope_id = e.id
             WHERE e.tld = ?1 AND e.subdomain IS ?2 AND e.id > ?3
             ORDER BY e.id ASC LIMIT ?4"
        );
        let mut rows: Vec<PostRow> = Vec::new();
        self.engine.each(
            &sql,
            params![tld, subdomain, cursor.unwrap_or(0), limit as i64],
            |row| {
                rows.push(PostRow::from_row(row)?);
                Ok(())
            },
        )?;
        collect_page(rows, limit)
    }

    /// Page through the direct replies to a post, oldest first.
    pub fn get_replies(
        &self,
        reference: &Refhash,
        cursor: Option<i64>,
        limit: usize,
    ) -> Result<Page<Envelope<Post>>> {
        let limit = limit.max(1);
        let sql = format!(
            "SELECT {ENVELOPE_COLUMNS}, {POST_COLUMNS}
             FROM envelopes e JOIN posts p ON p.envelope_id = e.id
             WHERE p.reference = ?1 AND e.id > ?2
             ORDER BY e.id ASC LIMIT ?3"
        );
        let mut rows: Vec<PostRow> = Vec::new();
        self.engine.each(
            &sql,
            params![reference.to_hex(), cursor.unwrap_or(0), limit as i64],
            |row| {
                rows.push(PostRow::from_row(row)?);
                Ok(())
            },
        )?;
        collect_page(rows, limit)
    }
}

const POST_COLUMNS: &str =
    "p.body, p.title, p.reference, p.topic, p.tags, p.reply_count, p.like_count, p.pin_count";

struct PostRow {
    env: StoredEnvelope,
    body: String,
    title: Option<String>,
    reference: Option<String>,
    topic: Option<String>,
    tags_json: String,
    reply_count: i64,
    like_count: i64,
    pin_count: i64,
}

impl PostRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            env: StoredEnvelope::from_row(row)?,
            body: row.get(7)?,
            title: row.get(8)?,
            reference: row.get(9)?,
            topic: row.get(10)?,
            tags_json: row.get(11)?,
            reply_count: row.get(12)?,
            like_count: row.get(13)?,
            pin_count: row.get(14)?,
        })
    }

    fn into_envelope(self) -> Result<Envelope<Post>> {
        let reference = self
            .reference
            .as_deref()
            .map(Refhash::from_hex)
            .transpose()?;
        let tags: Vec<String> = serde_json::from_str(&self.tags_json)
            .map_err(|e| Error::CorruptRow(format!("tags column: {e}")))?;
        let post = Post {
            body: self.body,
            title: self.title,
            reference,
            topic: self.topic,
            tags,
            reply_count: self.reply_count as u64,
            like_count: self.like_count as u64,
            pin_count: self.pin_count as u64,
        };
        self.env.into_envelope(post)
    }
}

fn collect_page(rows: Vec<PostRow>, limit: usize) -> Result<Page<Envelope<Post>>> {
    let last_id = rows.last().map(|r| r.env.id);
    let items: Result<Vec<_>> = rows.into_iter().map(PostRow::into_envelope).collect();
    Ok(Page::from_rows(items?, last_id, limit))
}
