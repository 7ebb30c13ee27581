use crate::Database;
use crate::models::{ChirpRow, NewChirpRow, UserRow};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior};

const CHIRP_COLUMNS: &str =
    "c.id, c.author_id, u.username, c.message, c.liked, c.created_at, c.updated_at";

impl Database {
    // -- Users --

    pub fn create_user(&self, id: &str, username: &str, password_hash: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, password) VALUES (?1, ?2, ?3)",
                (id, username, password_hash),
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "username", username))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    /// Every user except `user_id`, oldest account first.
    pub fn list_users_except(&self, user_id: &str) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, username, password, created_at FROM users
                 WHERE id != ?1
                 ORDER BY created_at, rowid",
            )?;
            let rows = stmt
                .query_map([user_id], user_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Chirps --

    /// Insert a chirp unless its author already owns `quota` chirps.
    /// The count and the insert share one immediate transaction.
    /// Returns false when the quota was already reached.
    pub fn insert_chirp_within_quota(&self, chirp: &NewChirpRow<'_>, quota: u32) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let count: u32 = tx.query_row(
                "SELECT COUNT(*) FROM chirps WHERE author_id = ?1",
                [chirp.author_id],
                |row| row.get(0),
            )?;
            if count >= quota {
                return Ok(false);
            }

            tx.execute(
                "INSERT INTO chirps (id, author_id, message, liked, created_at, updated_at)
                 VALUES (?1, ?2, ?3, 0, ?4, ?4)",
                (chirp.id, chirp.author_id, chirp.message, chirp.created_at),
            )?;
            tx.commit()?;
            Ok(true)
        })
    }

    /// Replace a chirp's message. `liked` is left alone so a concurrent like survives.
    /// Returns false if no row matched.
    pub fn update_chirp_message(&self, id: &str, message: &str, updated_at: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE chirps SET message = ?2, updated_at = ?3 WHERE id = ?1",
                (id, message, updated_at),
            )?;
            Ok(changed == 1)
        })
    }

    /// Flip `liked` from false to true. Returns false if the chirp was
    /// already liked or does not exist; in both cases nothing is written.
    pub fn mark_chirp_liked(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute("UPDATE chirps SET liked = 1 WHERE id = ?1 AND liked = 0", [id])?;
            Ok(changed == 1)
        })
    }

    pub fn delete_chirp(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute("DELETE FROM chirps WHERE id = ?1", [id])?;
            Ok(changed == 1)
        })
    }

    pub fn get_chirp(&self, id: &str) -> Result<Option<ChirpRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {CHIRP_COLUMNS} FROM chirps c
                 LEFT JOIN users u ON c.author_id = u.id
                 WHERE c.id = ?1"
            );
            let row = conn.query_row(&sql, [id], chirp_from_row).optional()?;
            Ok(row)
        })
    }

    pub fn count_chirps_by_author(&self, author_id: &str) -> Result<u32> {
        self.with_conn(|conn| {
            let count = conn.query_row(
                "SELECT COUNT(*) FROM chirps WHERE author_id = ?1",
                [author_id],
                |row| row.get(0),
            )?;
            Ok(count)
        })
    }

    /// All chirps with their author's name, newest first. Equal timestamps
    /// fall back to insertion order, newest first.
    pub fn list_chirps_newest_first(&self) -> Result<Vec<ChirpRow>> {
        self.with_conn(|conn| {
            // JOIN users to fetch the author name in the same query
            let sql = format!(
                "SELECT {CHIRP_COLUMNS} FROM chirps c
                 LEFT JOIN users u ON c.author_id = u.id
                 ORDER BY c.created_at DESC, c.rowid DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], chirp_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    let sql = format!("SELECT id, username, password, created_at FROM users WHERE {column} = ?1");
    let row = conn.query_row(&sql, [value], user_from_row).optional()?;
    Ok(row)
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        password: row.get(2)?,
        created_at: row.get(3)?,
    })
}

fn chirp_from_row(row: &Row<'_>) -> rusqlite::Result<ChirpRow> {
    Ok(ChirpRow {
        id: row.get(0)?,
        author_id: row.get(1)?,
        author_username: row.get::<_, Option<String>>(2)?.unwrap_or_else(|| "unknown".to_string()),
        message: row.get(3)?,
        liked: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}
