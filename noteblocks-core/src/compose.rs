//! Reference-tag derivation for freshly authored notes
//!
//! A note about to be signed needs its tag list to cover everything its
//! content refers to. [`compose_tags`] derives those tags from the block
//! sequence and appends them to whatever tags the caller supplies (a reply-to
//! reference, for instance). Event mentions are never derived here: callers
//! supply event references up front, and mention-index resolution depends on
//! that ordering, so deriving them too would double them up.

use crate::block::Block;
use crate::mention::{MentionKind, Tag};
use crate::render::render_blocks;
use serde::{Deserialize, Serialize};

/// Content string and final tag list, ready for the signing step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposedPost {
    pub content: String,
    pub tags: Vec<Tag>,
}

/// Append one derived tag per referencing block to the caller's tags
///
/// Pubkey mentions append `["p", hex, relay?]`, hashtags append
/// `["t", lowercased]`, URLs append `["r", url]`. Text, invoice, relay, and
/// event-mention blocks derive nothing. The caller's tags keep their
/// positions; derived tags follow them in block order.
///
/// # Example
///
/// ```
/// use noteblocks_core::{Block, compose_tags};
///
/// let tags = compose_tags(&[Block::Hashtag("Nostr".to_string())], Vec::new());
/// assert_eq!(tags, vec![vec!["t".to_string(), "nostr".to_string()]]);
/// ```
pub fn compose_tags(blocks: &[Block], caller_tags: Vec<Tag>) -> Vec<Tag> {
    let mut tags = caller_tags;
    for block in blocks {
        match block {
            Block::Mention(mention) => {
                if mention.kind() == MentionKind::Pubkey {
                    tags.push(mention.reference.to_tag());
                }
            }
            Block::Hashtag(hashtag) => {
                tags.push(vec!["t".to_string(), hashtag.to_lowercase()]);
            }
            Block::Url(url) => {
                tags.push(vec!["r".to_string(), url.to_string()]);
            }
            Block::Text(_) | Block::Invoice(_) | Block::Relay(_) => {}
        }
    }
    tags
}

/// Render the content and derive the tags in one step
pub fn compose_post(blocks: &[Block], caller_tags: Vec<Tag>) -> ComposedPost {
    ComposedPost {
        content: render_blocks(blocks),
        tags: compose_tags(blocks, caller_tags),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mention::Mention;

    #[test]
    fn test_hashtag_tag_is_lowercased() {
        let blocks = vec![Block::Hashtag("Nostr".to_string())];
        let tags = compose_tags(&blocks, Vec::new());
        assert_eq!(tags, vec![vec!["t".to_string(), "nostr".to_string()]]);
        // The block itself keeps its casing.
        assert_eq!(render_blocks(&blocks), "#Nostr");
    }

    #[test]
    fn test_pubkey_mention_carries_relay_hint() {
        let mut mention = Mention::pubkey("a".repeat(64));
        mention.reference.relay = Some("wss://relay.damus.io".to_string());
        let tags = compose_tags(&[Block::Mention(mention)], Vec::new());
        assert_eq!(
            tags,
            vec![vec![
                "p".to_string(),
                "a".repeat(64),
                "wss://relay.damus.io".to_string(),
            ]]
        );
    }

    #[test]
    fn test_event_mentions_are_not_derived() {
        let blocks = vec![Block::Mention(Mention::note("b".repeat(64)))];
        assert!(compose_tags(&blocks, Vec::new()).is_empty());
    }

    #[test]
    fn test_caller_tags_come_first() {
        let caller = vec![vec!["e".to_string(), "c".repeat(64)]];
        let blocks = vec![
            Block::Hashtag("zaps".to_string()),
            Block::Mention(Mention::pubkey("a".repeat(64))),
        ];
        let tags = compose_tags(&blocks, caller);
        assert_eq!(tags.len(), 3);
        assert_eq!(tags[0][0], "e");
        assert_eq!(tags[1], vec!["t".to_string(), "zaps".to_string()]);
        assert_eq!(tags[2], vec!["p".to_string(), "a".repeat(64)]);
    }

    #[test]
    fn test_url_derives_r_tag() {
        let blocks = vec![Block::Url(url::Url::parse("https://damus.io/").unwrap())];
        let tags = compose_tags(&blocks, Vec::new());
        assert_eq!(
            tags,
            vec![vec!["r".to_string(), "https://damus.io/".to_string()]]
        );
    }

    #[test]
    fn test_non_referencing_blocks_derive_nothing() {
        let blocks = vec![
            Block::Text("gm".to_string()),
            Block::Relay("wss://nos.lol".to_string()),
        ];
        assert!(compose_tags(&blocks, Vec::new()).is_empty());
    }

    #[test]
    fn test_compose_post_pairs_content_with_tags() {
        let blocks = vec![
            Block::Text("good morning ".to_string()),
            Block::Hashtag("Coffee".to_string()),
        ];
        let post = compose_post(&blocks, Vec::new());
        assert_eq!(post.content, "good morning #Coffee");
        assert_eq!(post.tags, vec![vec!["t".to_string(), "coffee".to_string()]]);
    }
}
