//! Scoped read transactions over the profile store
//!
//! A [`ReadTxn`] pairs one checked-out read connection with the value that was
//! computed under it, and hands the connection back exactly once when the
//! owning handle drops. Nested scopes borrow the parent's connection instead
//! of acquiring a second one, and ownership transfer goes through consuming
//! methods ([`ReadTxn::map`], [`ReadTxn::extend`], [`ReadTxn::transpose`]),
//! so a moved-from handle simply no longer exists.
//!
//! When the store cannot hand out a connection the handle degrades: the
//! callback still runs, against a view whose lookups all return `None`.
//! Callers see missing data rather than an error, which is what the content
//! rendering paths want.
//!
//! # Examples
//!
//! ```no_run
//! use noteblocks_core::{ProfileDb, ReadTxn};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let db = ProfileDb::open(Path::new("./profiles.db"))?;
//!
//! let txn = ReadTxn::new(&db, |view| {
//!     view.profile_name("7e7e9c42a91bfef19fa929e5fda1b72e0ebc1a4c1141673e2794234d86addf4e")
//! });
//! if let Some(name) = txn.value() {
//!     println!("{name}");
//! }
//! // The connection goes back to the pool here.
//! # Ok(())
//! # }
//! ```

use crate::store::{Profile, ProfileDb, ReadConn};
use std::marker::PhantomData;
use std::rc::Rc;

/// Returns the checked-out connection to the pool exactly once
struct TxnGuard<'db> {
    db: &'db ProfileDb,
    /// `Some` until drop; the `Option` only exists so drop can move the
    /// connection out
    conn: Option<ReadConn>,
}

impl Drop for TxnGuard<'_> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.db.end_read(conn);
        }
    }
}

/// How a handle relates to the underlying connection
enum Scope<'db> {
    /// Freshly acquired; released when this handle drops
    Owned(TxnGuard<'db>),
    /// Borrowed from an enclosing scope, which handles the release
    Inherited(&'db ReadConn),
    /// Acquisition failed; there is no connection at all
    Degraded,
}

/// Read access for the duration of one transaction scope
///
/// Obtained from [`ReadTxn::view`] or inside the closures passed to
/// [`ReadTxn::new`] and [`ReadTxn::nested`]. Lookups on a degraded view
/// return `None`; store errors are logged and also surface as `None`, since
/// the consumers of these lookups are rendering paths that prefer missing
/// data over failure.
#[derive(Clone, Copy)]
pub struct ReadView<'v> {
    conn: Option<&'v ReadConn>,
}

impl ReadView<'_> {
    /// Whether a real connection backs this view
    pub fn is_live(&self) -> bool {
        self.conn.is_some()
    }

    /// Look up a profile by hex pubkey
    pub fn profile(&self, pubkey: &str) -> Option<Profile> {
        let conn = self.conn?;
        match conn.profile(pubkey) {
            Ok(profile) => profile,
            Err(err) => {
                tracing::warn!(%err, "profile lookup failed");
                None
            }
        }
    }

    /// Look up the preferred name for a hex pubkey
    pub fn profile_name(&self, pubkey: &str) -> Option<String> {
        let conn = self.conn?;
        match conn.profile_name(pubkey) {
            Ok(name) => name,
            Err(err) => {
                tracing::warn!(%err, "profile name lookup failed");
                None
            }
        }
    }
}

/// A scoped read transaction carrying the value computed under it
///
/// The handle that owns the connection returns it to the pool when dropped;
/// inherited and degraded handles release nothing. Handles stay on the
/// thread that opened them.
pub struct ReadTxn<'db, T> {
    scope: Scope<'db>,
    value: T,
    /// Read scopes are single-threaded; this keeps the whole handle off
    /// other threads, not just the borrowed views.
    _confined: PhantomData<Rc<ReadConn>>,
}

impl<'db, T> ReadTxn<'db, T> {
    /// Open a top-level scope and compute a value under it
    ///
    /// Acquires a read connection from the store and runs `with` against it.
    /// If the store cannot provide one, the handle degrades: `with` still
    /// runs, against a view whose lookups return `None`.
    pub fn new<F>(db: &'db ProfileDb, with: F) -> Self
    where
        F: FnOnce(&ReadView<'_>) -> T,
    {
        match db.begin_read() {
            Ok(conn) => {
                let guard = TxnGuard {
                    db,
                    conn: Some(conn),
                };
                let value = with(&ReadView {
                    conn: guard.conn.as_ref(),
                });
                ReadTxn {
                    scope: Scope::Owned(guard),
                    value,
                    _confined: PhantomData,
                }
            }
            Err(err) => {
                tracing::warn!(%err, "read acquire failed, continuing without a transaction");
                let value = with(&ReadView { conn: None });
                ReadTxn {
                    scope: Scope::Degraded,
                    value,
                    _confined: PhantomData,
                }
            }
        }
    }

    /// Open a nested scope that shares this handle's connection
    ///
    /// Never acquires a second connection and never blocks; the nested
    /// handle borrows from `self`, so it cannot outlive the parent scope. A
    /// nested scope of a degraded handle is itself degraded.
    pub fn nested<U, F>(&self, with: F) -> ReadTxn<'_, U>
    where
        F: FnOnce(&ReadView<'_>) -> U,
    {
        let conn = self.conn();
        let value = with(&ReadView { conn });
        let scope = match conn {
            Some(conn) => Scope::Inherited(conn),
            None => Scope::Degraded,
        };
        ReadTxn {
            scope,
            value,
            _confined: PhantomData,
        }
    }

    fn conn(&self) -> Option<&ReadConn> {
        match &self.scope {
            Scope::Owned(guard) => guard.conn.as_ref(),
            Scope::Inherited(conn) => Some(conn),
            Scope::Degraded => None,
        }
    }

    /// Borrow the wrapped value
    ///
    /// The value is only meaningful while this scope is open; take owned
    /// data out with [`ReadTxn::into_value`] instead of stashing references
    /// for later.
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Take the value and end the scope
    ///
    /// If this handle owns the connection it is returned to the pool here.
    pub fn into_value(self) -> T {
        self.value
    }

    /// The read view backing this scope, for further lookups
    pub fn view(&self) -> ReadView<'_> {
        ReadView { conn: self.conn() }
    }

    /// Whether this handle acquired (and will release) the connection
    pub fn owns_transaction(&self) -> bool {
        matches!(self.scope, Scope::Owned(_))
    }

    /// Whether this scope is running without any connection
    pub fn is_degraded(&self) -> bool {
        matches!(self.scope, Scope::Degraded)
    }

    /// Transform the value, transferring scope ownership to the new handle
    ///
    /// Consumes the handle, so the source cannot be touched afterward:
    ///
    /// ```compile_fail
    /// use noteblocks_core::{ProfileDb, ReadTxn};
    ///
    /// fn demo(db: &ProfileDb) {
    ///     let txn = ReadTxn::new(db, |_| 1u64);
    ///     let doubled = txn.map(|n| n * 2);
    ///     let _ = txn.value(); // error: `txn` was moved
    /// }
    /// ```
    pub fn map<U, F>(self, f: F) -> ReadTxn<'db, U>
    where
        F: FnOnce(T) -> U,
    {
        let Self {
            scope,
            value,
            _confined,
        } = self;
        ReadTxn {
            scope,
            value: f(value),
            _confined,
        }
    }

    /// Compute a new value from the whole handle, transferring ownership
    ///
    /// Unlike [`ReadTxn::map`] the closure sees the handle itself, so it can
    /// run further lookups through [`ReadTxn::view`] while deriving the new
    /// value. The transaction stays open, now owned by the returned handle.
    pub fn extend<U, F>(self, with: F) -> ReadTxn<'db, U>
    where
        F: FnOnce(&Self) -> U,
    {
        let value = with(&self);
        let Self {
            scope, _confined, ..
        } = self;
        ReadTxn {
            scope,
            value,
            _confined,
        }
    }
}

impl<'db, T> ReadTxn<'db, Option<T>> {
    /// Unwrap an optional value, ending the scope when it was absent
    ///
    /// `Some` keeps the transaction open under the new handle; `None`
    /// releases it immediately, since there is nothing left worth holding
    /// the connection for.
    pub fn transpose(self) -> Option<ReadTxn<'db, T>> {
        let Self {
            scope,
            value,
            _confined,
        } = self;
        value.map(|value| ReadTxn {
            scope,
            value,
            _confined,
        })
    }
}

/// Look up a profile under its own read scope
pub fn lookup_profile<'db>(db: &'db ProfileDb, pubkey: &str) -> ReadTxn<'db, Option<Profile>> {
    ReadTxn::new(db, |view| view.profile(pubkey))
}

/// Look up a profile's preferred name under its own read scope
pub fn lookup_profile_name<'db>(db: &'db ProfileDb, pubkey: &str) -> ReadTxn<'db, Option<String>> {
    ReadTxn::new(db, |view| view.profile_name(pubkey))
}
