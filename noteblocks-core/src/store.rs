//! SQLite-backed profile store
//!
//! Rendering a pubkey mention usually wants a human-readable name, so the
//! store keeps a small `profiles` table keyed by hex pubkey. A single writer
//! connection handles upserts; reads go through a pool of read-only
//! connections handed out by [`ProfileDb::begin_read`] and returned by
//! [`ProfileDb::end_read`]. Scoped access on top of that pair lives in
//! [`crate::txn`].
//!
//! # Examples
//!
//! ```no_run
//! use noteblocks_core::ProfileDb;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let db = ProfileDb::open(Path::new("./profiles.db"))?;
//! db.upsert("7e7e9c42a91bfef19fa929e5fda1b72e0ebc1a4c1141673e2794234d86addf4e",
//!           Some("jb55"), Some("Will"))?;
//!
//! let conn = db.begin_read()?;
//! if let Some(profile) = conn.profile("7e7e9c42a91bfef19fa929e5fda1b72e0ebc1a4c1141673e2794234d86addf4e")? {
//!     println!("{}", profile);
//! }
//! db.end_read(conn);
//! # Ok(())
//! # }
//! ```

use crate::{Error, Result};
use rusqlite::{Connection, OpenFlags, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Profile record as stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Public key (hex-encoded)
    pub pubkey: String,
    /// Short handle, if the profile set one
    pub name: Option<String>,
    /// Full display name, if the profile set one
    pub display_name: Option<String>,
    /// Unix timestamp of the last upsert
    pub updated_at: i64,
}

impl Profile {
    /// Preferred human-readable name: display name first, then handle
    ///
    /// Empty strings count as unset; real-world profile events carry them.
    pub fn best_name(&self) -> Option<&str> {
        self.display_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .or_else(|| self.name.as_deref().filter(|name| !name.is_empty()))
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string_pretty(self) {
            Ok(json) => write!(f, "{}", json),
            Err(_) => write!(f, "<invalid Profile>"),
        }
    }
}

/// Profile store with one writer and pooled read-only connections
pub struct ProfileDb {
    path: PathBuf,
    writer: Mutex<Connection>,
    readers: Mutex<Vec<Connection>>,
    /// Read connections currently out
    reads_open: AtomicUsize,
    /// Read connections handed out over this handle's lifetime
    reads_total: AtomicUsize,
}

/// A read-only connection checked out of the pool
///
/// Obtained from [`ProfileDb::begin_read`] and given back through
/// [`ProfileDb::end_read`]. Holds no reference to the pool itself, so the
/// scoped wrapper in [`crate::txn`] owns the pairing.
pub struct ReadConn {
    conn: Connection,
}

impl ReadConn {
    /// Look up a profile by hex pubkey
    pub fn profile(&self, pubkey: &str) -> Result<Option<Profile>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT pubkey, name, display_name, updated_at
             FROM profiles WHERE pubkey = ?",
        )?;

        let profile = stmt
            .query_row(params![pubkey], |row| {
                Ok(Profile {
                    pubkey: row.get(0)?,
                    name: row.get(1)?,
                    display_name: row.get(2)?,
                    updated_at: row.get(3)?,
                })
            })
            .optional()?;

        Ok(profile)
    }

    /// Look up just the preferred name for a hex pubkey
    pub fn profile_name(&self, pubkey: &str) -> Result<Option<String>> {
        Ok(self
            .profile(pubkey)?
            .as_ref()
            .and_then(Profile::best_name)
            .map(str::to_string))
    }
}

impl ProfileDb {
    /// Create or open a profile store at the specified path
    ///
    /// The schema is created if missing, and the database is switched to WAL
    /// so readers never block the writer.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use noteblocks_core::ProfileDb;
    /// use std::path::Path;
    ///
    /// let db = ProfileDb::open(Path::new("./profiles.db"))?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "opening profile store");

        let writer = Connection::open(path)?;
        writer.pragma_update(None, "journal_mode", "WAL")?;
        Self::create_schema(&writer)?;

        Ok(Self {
            path: path.to_path_buf(),
            writer: Mutex::new(writer),
            readers: Mutex::new(Vec::new()),
            reads_open: AtomicUsize::new(0),
            reads_total: AtomicUsize::new(0),
        })
    }

    fn create_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS profiles (
                pubkey TEXT PRIMARY KEY,
                name TEXT,
                display_name TEXT,
                updated_at INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_profiles_name ON profiles(name);
            "#,
        )?;

        Ok(())
    }

    /// Insert or update a profile
    ///
    /// The pubkey must be 64 hex characters; anything else is rejected with
    /// [`Error::InvalidPubkey`] before touching the database.
    ///
    /// # Arguments
    ///
    /// * `pubkey` - Public key (hex-encoded)
    /// * `name` - Short handle, replaces the stored one
    /// * `display_name` - Full display name, replaces the stored one
    pub fn upsert(&self, pubkey: &str, name: Option<&str>, display_name: Option<&str>) -> Result<()> {
        validate_pubkey(pubkey)?;

        let updated_at = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_secs() as i64;

        let writer = self.writer.lock().unwrap();
        writer.execute(
            "INSERT INTO profiles (pubkey, name, display_name, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(pubkey) DO UPDATE SET
                 name = excluded.name,
                 display_name = excluded.display_name,
                 updated_at = excluded.updated_at",
            params![pubkey, name, display_name, updated_at],
        )?;

        Ok(())
    }

    /// Number of profiles stored
    pub fn count(&self) -> Result<u64> {
        let writer = self.writer.lock().unwrap();
        let count = writer.query_row("SELECT COUNT(*) FROM profiles", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Check out a read-only connection
    ///
    /// Reuses a pooled connection when one is available, otherwise opens a
    /// fresh read-only connection against the same file. Callers must hand
    /// the connection back through [`ProfileDb::end_read`].
    pub fn begin_read(&self) -> Result<ReadConn> {
        let pooled = self.readers.lock().unwrap().pop();
        let conn = match pooled {
            Some(conn) => conn,
            None => Connection::open_with_flags(
                &self.path,
                OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )?,
        };

        let open = self.reads_open.fetch_add(1, Ordering::Relaxed) + 1;
        let total = self.reads_total.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::trace!(open, total, "read connection checked out");

        Ok(ReadConn { conn })
    }

    /// Return a read connection to the pool
    pub fn end_read(&self, conn: ReadConn) {
        self.readers.lock().unwrap().push(conn.conn);
        let open = self.reads_open.fetch_sub(1, Ordering::Relaxed) - 1;
        tracing::trace!(open, "read connection returned");
    }

    /// Read connections currently checked out
    pub fn open_reads(&self) -> usize {
        self.reads_open.load(Ordering::Relaxed)
    }

    /// Read connections handed out since this store was opened
    pub fn total_reads(&self) -> usize {
        self.reads_total.load(Ordering::Relaxed)
    }
}

fn validate_pubkey(pubkey: &str) -> Result<()> {
    if pubkey.len() == 64 && pubkey.bytes().all(|b| b.is_ascii_hexdigit()) {
        Ok(())
    } else {
        Err(Error::InvalidPubkey(pubkey.to_string()))
    }
}
