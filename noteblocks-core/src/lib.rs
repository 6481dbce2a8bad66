//! Noteblocks Core Library
//!
//! This library decodes Nostr note content into typed blocks, renders blocks
//! back into wire content, and derives the tags a new post needs. A small
//! SQLite profile store with scoped read transactions backs name resolution
//! for mention rendering.
//!
//! # Features
//!
//! - Content decoding into typed blocks (text, mentions, hashtags, URLs, invoices, relays)
//! - `#[index]` mention resolution against the note's tag list
//! - NIP-19 entity handling (`npub`, `nprofile`, `note`, `nevent`, `nsec`, `nrelay`, `naddr`)
//! - BOLT-11 decoding for inline lightning invoices
//! - Identity-preserving rendering of blocks back into content text
//! - `p`/`t`/`r` tag derivation for composing new posts
//! - SQLite profile store with a single writer and pooled read-only connections
//! - Scoped read transactions with nesting and compile-time move tracking
//! - Serde support for blocks, profiles, and composed posts
//!
//! # Examples
//!
//! ## Decoding note content
//!
//! ```
//! use noteblocks_core::parse_content;
//!
//! let tags = vec![vec!["p".to_string(), "f".repeat(64)]];
//! let blocks = parse_content("gm #[0] #coffee", &tags);
//!
//! assert_eq!(blocks.words, 3);
//! assert!(blocks.blocks[1].as_mention().is_some());
//! assert_eq!(blocks.blocks[3].as_hashtag(), Some("coffee"));
//! ```
//!
//! ## Composing a post
//!
//! ```
//! use noteblocks_core::{Block, compose_post};
//!
//! let blocks = vec![
//!     Block::Text("good morning ".to_string()),
//!     Block::Hashtag("Nostr".to_string()),
//! ];
//! let post = compose_post(&blocks, Vec::new());
//!
//! assert_eq!(post.content, "good morning #Nostr");
//! assert_eq!(post.tags, vec![vec!["t".to_string(), "nostr".to_string()]]);
//! ```
//!
//! ## Resolving names under a read scope
//!
//! ```no_run
//! use noteblocks_core::{ProfileDb, ReadTxn};
//! use std::path::Path;
//!
//! let pubkey = "7e7e9c42a91bfef19fa929e5fda1b72e0ebc1a4c1141673e2794234d86addf4e";
//!
//! let db = ProfileDb::open(Path::new("./profiles.db"))?;
//! db.upsert(pubkey, Some("jb55"), Some("Will"))?;
//!
//! let txn = ReadTxn::new(&db, |view| view.profile_name(pubkey));
//! assert_eq!(txn.value().as_deref(), Some("Will"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Public modules
pub mod block;
pub mod compose;
pub mod error;
pub mod invoice;
pub mod mention;
pub mod parse;
pub mod render;
pub mod scan;
pub mod store;
pub mod txn;

// Re-export commonly used types and functions
pub use block::{Block, Blocks};
pub use compose::{ComposedPost, compose_post, compose_tags};
pub use error::{Error, Result};
pub use invoice::{Amount, Invoice, InvoiceDescription, LnInvoice};
pub use mention::{Mention, MentionKind, ReferenceId, Tag, find_tag_ref};
pub use parse::parse_content;
pub use render::render_blocks;
pub use scan::{RawToken, scan_content};
pub use store::{Profile, ProfileDb, ReadConn};
pub use txn::{ReadTxn, ReadView, lookup_profile, lookup_profile_name};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_render_identity() {
        // Structured content comes back out byte for byte.
        let content = "gm #nostr https://damus.io/notedeck";
        let blocks = parse_content(content, &[]);
        assert_eq!(render_blocks(&blocks.blocks), content);
    }
}
