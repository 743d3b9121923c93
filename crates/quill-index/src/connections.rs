//! Directed social-graph edges (follow/block) and their queries.

use rusqlite::params;
use std::sync::Arc;
use tracing::debug;

use quill_core::{Connection, ConnectionKind, Envelope, Identity};

use crate::engine::Engine;
use crate::envelopes;
use crate::error::Result;
use crate::page::Page;

/// Which end of the edge the queried identity sits on.
enum Direction {
    /// Identity is the edge source; return targets.
    Outgoing,
    /// Identity is the edge target; return sources.
    Incoming,
}

/// DAO for connection envelopes.
pub struct ConnectionsDao {
    engine: Arc<Engine>,
}

impl ConnectionsDao {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self { engine }
    }

    /// Persist a connection envelope: a directed edge from the authoring
    /// identity to the identity named in the message, tagged FOLLOW or
    /// BLOCK. Idempotent on refhash.
    pub fn insert_connection(&self, envelope: &Envelope<Connection>) -> Result<()> {
        self.engine.with_tx(|tx| {
            if envelopes::exists(tx, &envelope.refhash)? {
                debug!(refhash = %envelope.refhash, "duplicate connection envelope, skipping");
                return Ok(());
            }
            let envelope_id = envelopes::insert(tx, envelope)?;
            let connection = &envelope.message;
            tx.execute(
                "INSERT INTO connections (envelope_id, connectee_tld, connectee_subdomain, kind)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    envelope_id,
                    connection.target.tld,
                    connection.target.subdomain,
                    connection.kind.as_str(),
                ],
            )?;
            Ok(())
        })
    }

    /// Identities this identity follows, oldest edge first.
    pub fn get_followees(
        &self,
        tld: &str,
        subdomain: Option<&str>,
        cursor: Option<i64>,
        limit: usize,
    ) -> Result<Page<Identity>> {
        self.edges(tld, subdomain, ConnectionKind::Follow, Direction::Outgoing, cursor, limit)
    }

    /// Identities that follow this identity, oldest edge first.
    pub fn get_followers(
        &self,
        tld: &str,
        subdomain: Option<&str>,
        cursor: Option<i64>,
        limit: usize,
    ) -> Result<Page<Identity>> {
        self.edges(tld, subdomain, ConnectionKind::Follow, Direction::Incoming, cursor, limit)
    }

    /// Identities this identity blocks, oldest edge first.
    pub fn get_blockees(
        &self,
        tld: &str,
        subdomain: Option<&str>,
        cursor: Option<i64>,
        limit: usize,
    ) -> Result<Page<Identity>> {
        self.edges(tld, subdomain, ConnectionKind::Block, Direction::Outgoing, cursor, limit)
    }

    /// Identities that block this identity, oldest edge first.
    pub fn get_blockers(
        &self,
        tld: &str,
        subdomain: Option<&str>,
        cursor: Option<i64>,
        limit: usize,
    ) -> Result<Page<Identity>> {
        self.edges(tld, subdomain, ConnectionKind::Block, Direction::Incoming, cursor, limit)
    }

    fn edges(
        &self,
        tld: &str,
        subdomain: Option<&str>,
        kind: ConnectionKind,
        direction: Direction,
        cursor: Option<i64>,
        limit: usize,
    ) -> Result<Page<Identity>> {
        let limit = limit.max(1);
        // The source identity lives on the envelope row; the target on the
        // connection row.
        let sql = match direction {
            Direction::Outgoing => {
                "SELECT e.id, c.connectee_tld, c.connectee_subdomain
                 FROM envelopes e JOIN connections c ON c.envelope_id = e.id
                 WHERE e.tld = ?1 AND e.subdomain IS ?2 AND c.kind = ?3 AND e.id > ?4
                 ORDER BY e.id ASC LIMIT ?5"
            }
            Direction::Incoming => {
                "SELECT e.id, e.tld, e.subdomain
                 FROM envelopes e JOIN connections c ON c.envelope_id = e.id
                 WHERE c.connectee_tld = ?1 AND c.connectee_subdomain IS ?2
                   AND c.kind = ?3 AND e.id > ?4
                 ORDER BY e.id ASC LIMIT ?5"
            }
        };

        let mut items: Vec<Identity> = Vec::new();
        let mut last_id: Option<i64> = None;
        self.engine.each(
            sql,
            params![tld, subdomain, kind.as_str(), cursor.unwrap_or(0), limit as i64],
            |row| {
                last_id = Some(row.get(0)?);
                items.push(Identity {
                    tld: row.get(1)?,
                    subdomain: row.get(2)?,
                });
                Ok(())
            },
        )?;
        Ok(Page::from_rows(items, last_id, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ensure_schema;

    fn dao() -> ConnectionsDao {
        let engine = Arc::new(Engine::open_in_memory().unwrap());
        ensure_schema(&engine).unwrap();
        ConnectionsDao::new(engine)
    }

    fn edge(
        source: (&str, Option<&str>),
        target: (&str, Option<&str>),
        kind: ConnectionKind,
        created_at: u64,
    ) -> Envelope<Connection> {
        Envelope::new_at(
            "testnet",
            source.0,
            source.1,
            created_at,
            Connection::new(Identity::new(target.0, target.1), kind),
        )
        .unwrap()
    }

    #[test]
    fn follow_is_visible_from_both_ends() {
        let dao = dao();
        let follow = edge(
            ("alicetld", Some("alice")),
            ("bobtld", Some("bob")),
            ConnectionKind::Follow,
            1000,
        );
        dao.insert_connection(&follow).unwrap();

        let followees = dao.get_followees("alicetld", Some("alice"), None, 10).unwrap();
        assert_eq!(followees.items, vec![Identity::new("bobtld", Some("bob"))]);

        let followers = dao.get_followers("bobtld", Some("bob"), None, 10).unwrap();
        assert_eq!(followers.items, vec![Identity::new("alicetld", Some("alice"))]);

        // A follow edge is invisible to the block queries.
        assert!(dao.get_blockees("alicetld", Some("alice"), None, 10).unwrap().items.is_empty());
        assert!(dao.get_blockers("bobtld", Some("bob"), None, 10).unwrap().items.is_empty());
    }

    #[test]
    fn block_is_visible_from_both_ends() {
        let dao = dao();
        let block = edge(
            ("alicetld", Some("alice")),
            ("bobtld", Some("bob")),
            ConnectionKind::Block,
            1000,
        );
        dao.insert_connection(&block).unwrap();

        let blockees = dao.get_blockees("alicetld", Some("alice"), None, 10).unwrap();
        assert_eq!(blockees.items, vec![Identity::new("bobtld", Some("bob"))]);

        let blockers = dao.get_blockers("bobtld", Some("bob"), None, 10).unwrap();
        assert_eq!(blockers.items, vec![Identity::new("alicetld", Some("alice"))]);
    }

    #[test]
    fn followees_keep_insertion_order() {
        let dao = dao();
        for i in 0..3u64 {
            let target_tld = format!("connecteetld{i}");
            let target_sub = format!("connecteesub{i}");
            let follow = edge(
                ("testtld", Some("testsub")),
                (&target_tld, Some(target_sub.as_str())),
                ConnectionKind::Follow,
                1000 + i,
            );
            dao.insert_connection(&follow).unwrap();
        }

        let page = dao.get_followees("testtld", Some("testsub"), None, 10).unwrap();
        assert_eq!(
            page.items,
            vec![
                Identity::new("connecteetld0", Some("connecteesub0")),
                Identity::new("connecteetld1", Some("connecteesub1")),
                Identity::new("connecteetld2", Some("connecteesub2")),
            ]
        );
        assert!(page.next.is_none());
    }

    #[test]
    fn duplicate_edge_envelope_is_a_noop() {
        let dao = dao();
        let follow = edge(
            ("alicetld", None),
            ("bobtld", None),
            ConnectionKind::Follow,
            1000,
        );
        dao.insert_connection(&follow).unwrap();
        dao.insert_connection(&follow).unwrap();

        let page = dao.get_followees("alicetld", None, None, 10).unwrap();
        assert_eq!(page.items.len(), 1);
    }

    #[test]
    fn edge_pages_walk_without_duplicates() {
        let dao = dao();
        let mut expected = Vec::new();
        for i in 0..5u64 {
            let target_tld = format!("tld{i}");
            let follow = edge(
                ("testtld", Some("testsub")),
                (&target_tld, None),
                ConnectionKind::Follow,
                1000 + i,
            );
            dao.insert_connection(&follow).unwrap();
            expected.push(Identity::new(target_tld, None));
        }

        let mut collected = Vec::new();
        let mut cursor = None;
        for _ in 0..10 {
            let page = dao
                .get_followees("testtld", Some("testsub"), cursor, 2)
                .unwrap();
            collected.extend(page.items);
            match page.next {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }
        assert_eq!(collected, expected);
    }

    #[test]
    fn identities_without_subdomain_do_not_match_subdomains() {
        let dao = dao();
        let follow = edge(("alicetld", None), ("bobtld", None), ConnectionKind::Follow, 1000);
        dao.insert_connection(&follow).unwrap();

        assert_eq!(dao.get_followees("alicetld", None, None, 10).unwrap().items.len(), 1);
        assert!(dao
            .get_followees("alicetld", Some("alice"), None, 10)
            .unwrap()
            .items
            .is_empty());
    }
}
