//! Typed block model for parsed note content
//!
//! A note body decodes into an ordered sequence of [`Block`] values. Blocks
//! are immutable once constructed; a [`Blocks`] value is produced fresh on
//! every decode and holds no reference to anything used during resolution.

use crate::invoice::Invoice;
use crate::mention::Mention;
use serde::{Deserialize, Serialize};
use url::Url;

/// One semantically typed unit of parsed note content
///
/// Equality is per-variant on identifying content; invoice blocks compare by
/// their encoded string only (see [`LnInvoice`](crate::LnInvoice)).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Block {
    /// Literal text, never further interpreted
    Text(String),
    /// A reference to another user or event
    Mention(Mention),
    /// A hashtag, stored as originally cased
    Hashtag(String),
    /// A syntactically valid absolute URL
    Url(Url),
    /// A decoded BOLT-11 lightning invoice
    Invoice(Invoice),
    /// A relay address extracted from an `nrelay` entity
    Relay(String),
}

impl Block {
    /// The literal text, if this is a text block
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Block::Text(text) => Some(text),
            _ => None,
        }
    }

    /// The mention, if this is a mention block
    pub fn as_mention(&self) -> Option<&Mention> {
        match self {
            Block::Mention(mention) => Some(mention),
            _ => None,
        }
    }

    /// The hashtag (without the `#`), if this is a hashtag block
    pub fn as_hashtag(&self) -> Option<&str> {
        match self {
            Block::Hashtag(tag) => Some(tag),
            _ => None,
        }
    }

    /// The URL, if this is a url block
    pub fn as_url(&self) -> Option<&Url> {
        match self {
            Block::Url(url) => Some(url),
            _ => None,
        }
    }

    /// The invoice, if this is an invoice block
    pub fn as_invoice(&self) -> Option<&Invoice> {
        match self {
            Block::Invoice(invoice) => Some(invoice),
            _ => None,
        }
    }

    /// The relay address, if this is a relay block
    pub fn as_relay(&self) -> Option<&str> {
        match self {
            Block::Relay(relay) => Some(relay),
            _ => None,
        }
    }
}

/// A decoded note body: ordered blocks plus the original word count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blocks {
    /// Count of whitespace-delimited words in the original content,
    /// independent of block boundaries. Layout heuristic for renderers;
    /// never recomputed from the blocks.
    pub words: usize,
    /// The blocks, in content order
    pub blocks: Vec<Block>,
}
