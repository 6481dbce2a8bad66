//! Rendering blocks back into content text
//!
//! Each [`Block`] renders to its canonical textual form through [`Display`],
//! and [`render_blocks`] concatenates a sequence of them. Rendering is purely
//! structural: no validation, no escaping, no separators beyond what the
//! blocks themselves carry.
//!
//! [`Display`]: std::fmt::Display

use std::fmt;

use nostr_sdk::prelude::{EventId, PublicKey, ToBech32};

use crate::block::Block;
use crate::mention::{Mention, MentionKind};

impl fmt::Display for Mention {
    /// Tag-indexed mentions render as their `#[i]` placeholder. Standalone
    /// mentions render as a `nostr:`-prefixed bech32 pointer, falling back to
    /// the bare hex identifier when the stored id cannot be re-encoded.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(index) = self.index {
            return write!(f, "#[{index}]");
        }
        match bech32_pointer(self) {
            Some(entity) => write!(f, "nostr:{entity}"),
            None => f.write_str(&self.reference.id),
        }
    }
}

fn bech32_pointer(mention: &Mention) -> Option<String> {
    match mention.kind() {
        MentionKind::Pubkey => PublicKey::from_hex(&mention.reference.id)
            .ok()?
            .to_bech32()
            .ok(),
        MentionKind::Event => EventId::from_hex(&mention.reference.id)
            .ok()?
            .to_bech32()
            .ok(),
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Block::Text(text) => f.write_str(text),
            Block::Mention(mention) => mention.fmt(f),
            Block::Hashtag(tag) => write!(f, "#{tag}"),
            Block::Url(url) => f.write_str(url.as_str()),
            Block::Invoice(invoice) => f.write_str(&invoice.string),
            Block::Relay(relay) => f.write_str(relay),
        }
    }
}

/// Concatenate a block sequence back into a content string
///
/// # Example
///
/// ```
/// use noteblocks_core::{Block, render_blocks};
///
/// let blocks = vec![
///     Block::Text("tagged ".to_string()),
///     Block::Hashtag("Nostr".to_string()),
/// ];
/// assert_eq!(render_blocks(&blocks), "tagged #Nostr");
/// ```
pub fn render_blocks(blocks: &[Block]) -> String {
    blocks.iter().map(|block| block.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_content;

    const NPUB: &str = "npub10elfcs4fr0l0r8af98jlmgdh9c8tcxjvz9qkw038js35mp4dma8qzvjptg";
    const NPUB_HEX: &str = "7e7e9c42a91bfef19fa929e5fda1b72e0ebc1a4c1141673e2794234d86addf4e";

    #[test]
    fn test_indexed_mention_renders_placeholder() {
        let mut mention = Mention::pubkey("a".repeat(64));
        mention.index = Some(3);
        assert_eq!(mention.to_string(), "#[3]");
    }

    #[test]
    fn test_pubkey_mention_renders_npub() {
        let mention = Mention::pubkey(NPUB_HEX);
        assert_eq!(mention.to_string(), format!("nostr:{NPUB}"));
    }

    #[test]
    fn test_event_mention_survives_render_and_reparse() {
        let mention = Mention::note("b".repeat(64));
        let rendered = mention.to_string();
        assert!(rendered.starts_with("nostr:note1"));

        let reparsed = parse_content(&rendered, &[]);
        let back = reparsed.blocks[0].as_mention().unwrap();
        assert_eq!(back.reference, mention.reference);
    }

    #[test]
    fn test_unencodable_mention_falls_back_to_raw_id() {
        let mention = Mention::pubkey("not hex at all");
        assert_eq!(mention.to_string(), "not hex at all");
    }

    #[test]
    fn test_hashtag_keeps_original_casing() {
        assert_eq!(Block::Hashtag("Nostr".to_string()).to_string(), "#Nostr");
    }

    #[test]
    fn test_relay_and_text_render_verbatim() {
        assert_eq!(
            Block::Relay("wss://relay.damus.io".to_string()).to_string(),
            "wss://relay.damus.io"
        );
        assert_eq!(Block::Text("as is".to_string()).to_string(), "as is");
    }

    #[test]
    fn test_render_blocks_concatenates_in_order() {
        let blocks = vec![
            Block::Text("see ".to_string()),
            Block::Url(url::Url::parse("https://damus.io/notedeck").unwrap()),
            Block::Text(" and ".to_string()),
            Block::Hashtag("zaps".to_string()),
        ];
        assert_eq!(
            render_blocks(&blocks),
            "see https://damus.io/notedeck and #zaps"
        );
    }

    #[test]
    fn test_empty_blocks_render_empty() {
        assert_eq!(render_blocks(&[]), "");
    }
}
