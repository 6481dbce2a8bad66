//! Mention references and their tag representation
//!
//! A mention points at another user or event. It either came from a `#[i]`
//! placeholder resolved against the note's tag list (in which case it keeps
//! the tag index), or from a self-contained bech32 entity embedded in the
//! content (no index).

use serde::{Deserialize, Serialize};

/// One note tag: an ordered string sequence whose first element is the
/// discriminator key (`"e"`, `"p"`, `"t"`, `"r"`, …)
///
/// Tags are not unique, and list position is significant: `#[i]` placeholders
/// in content address the tag list positionally.
pub type Tag = Vec<String>;

/// What a mention refers to
///
/// Maps to the tag discriminator keys `"p"` (pubkey) and `"e"` (event).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MentionKind {
    Pubkey,
    Event,
}

impl MentionKind {
    /// The tag discriminator key for this kind
    pub fn key(&self) -> &'static str {
        match self {
            MentionKind::Pubkey => "p",
            MentionKind::Event => "e",
        }
    }

    /// Parse a tag discriminator key
    ///
    /// Only `"e"` and `"p"` are recognized mention discriminators; anything
    /// else (including `"t"`, `"r"` and custom keys) returns `None`.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "p" => Some(MentionKind::Pubkey),
            "e" => Some(MentionKind::Event),
            _ => None,
        }
    }
}

/// Identity of a referenced entity
///
/// The kind discriminator lives here (not beside it on [`Mention`]), so a
/// reference can never disagree with the mention kind it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceId {
    /// Discriminator, `"p"` or `"e"` on the wire
    pub kind: MentionKind,
    /// 32-byte identifier, hex encoded
    pub id: String,
    /// Optional relay hint
    pub relay: Option<String>,
}

impl ReferenceId {
    /// The tag row for this reference: `[key, id]` or `[key, id, relay]`
    pub fn to_tag(&self) -> Vec<String> {
        let mut tag = vec![self.kind.key().to_string(), self.id.clone()];
        if let Some(relay) = &self.relay {
            tag.push(relay.clone());
        }
        tag
    }
}

/// A reference to another user or event, optionally tied to a tag position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mention {
    /// Position into the note's tag list this mention was resolved from;
    /// `None` when built from a bech32 entity not backed by a tag
    pub index: Option<usize>,
    /// The referenced entity
    pub reference: ReferenceId,
}

impl Mention {
    /// Mention of an event by hex id, without a tag index
    pub fn note(id: impl Into<String>) -> Self {
        Self {
            index: None,
            reference: ReferenceId {
                kind: MentionKind::Event,
                id: id.into(),
                relay: None,
            },
        }
    }

    /// Mention of a user by hex pubkey, without a tag index
    pub fn pubkey(id: impl Into<String>) -> Self {
        Self {
            index: None,
            reference: ReferenceId {
                kind: MentionKind::Pubkey,
                id: id.into(),
                relay: None,
            },
        }
    }

    /// The kind of entity referenced
    pub fn kind(&self) -> MentionKind {
        self.reference.kind
    }

    /// Resolve a `#[index]` placeholder against a tag list
    ///
    /// Returns `None` unless the index is in bounds, the tag has at least an
    /// id field, and the discriminator is a recognized mention key. Callers
    /// fall back to literal text in that case.
    pub fn from_tag_index(tags: &[Tag], index: usize) -> Option<Self> {
        let tag = tags.get(index)?;
        if tag.len() < 2 {
            return None;
        }
        let kind = MentionKind::from_key(&tag[0])?;
        Some(Self {
            index: Some(index),
            reference: ReferenceId {
                kind,
                id: tag[1].clone(),
                relay: tag.get(2).cloned(),
            },
        })
    }
}

/// Find the first tag matching a discriminator key and id, as an indexed
/// mention
///
/// Used when a freshly composed note is decoded against its own tag list and
/// a bech32-derived reference should be rewritten to the tag position it
/// landed at.
pub fn find_tag_ref(kind: MentionKind, id: &str, tags: &[Tag]) -> Option<Mention> {
    tags.iter()
        .enumerate()
        .find(|(_, tag)| tag.len() >= 2 && tag[0] == kind.key() && tag[1] == id)
        .and_then(|(i, _)| Mention::from_tag_index(tags, i))
}
