//! The block decoder
//!
//! [`parse_content`] turns a content string and its tag list into a
//! [`Blocks`] value. It never fails: every malformed token either degrades to
//! literal text or is dropped, per the policy each arm documents. The
//! asymmetry is deliberate and load-bearing for existing content: a broken
//! `#[i]` placeholder is still meaningful to show a reader, while a broken
//! invoice or an entity kind we cannot represent is noise.

use crate::block::{Block, Blocks};
use crate::invoice::Invoice;
use crate::mention::{Mention, Tag};
use crate::scan::{RawToken, scan_content};
use nostr_sdk::prelude::{FromBech32, Keys, Nip19, SecretKey};
use url::Url;

/// Decode a content string against its tag list
///
/// Mention placeholders (`#[i]`) resolve positionally against `tags`; bech32
/// entities are self-contained and resolve on their own. The returned word
/// count is taken from the original content, before any token is interpreted.
///
/// # Example
///
/// ```
/// use noteblocks_core::{Block, parse_content};
///
/// let tags = vec![vec!["p".to_string(), "f".repeat(64)]];
/// let blocks = parse_content("gm #[0]", &tags);
///
/// assert_eq!(blocks.words, 2);
/// assert_eq!(blocks.blocks[0], Block::Text("gm ".to_string()));
/// assert!(blocks.blocks[1].as_mention().is_some());
/// ```
pub fn parse_content(content: &str, tags: &[Tag]) -> Blocks {
    let words = content.split_whitespace().count();
    let mut blocks = Vec::new();

    for token in scan_content(content) {
        match token {
            RawToken::Text(text) => blocks.push(Block::Text(text)),
            RawToken::Hashtag(tag) => blocks.push(Block::Hashtag(tag)),
            RawToken::Url(span) => match Url::parse(&span) {
                Ok(url) => blocks.push(Block::Url(url)),
                // Looked like a URL, does not parse as one: keep the text.
                Err(_) => blocks.push(Block::Text(span)),
            },
            RawToken::MentionIndex(index) => match Mention::from_tag_index(tags, index) {
                Some(mention) => blocks.push(Block::Mention(mention)),
                // Out-of-range index or unusable tag: keep the placeholder
                // verbatim so nothing is silently lost.
                None => blocks.push(Block::Text(format!("#[{index}]"))),
            },
            RawToken::Invoice(entity) => match Invoice::from_bolt11(&entity) {
                Some(invoice) => blocks.push(Block::Invoice(invoice)),
                None => {
                    tracing::debug!(len = entity.len(), "dropping malformed invoice");
                }
            },
            RawToken::Bech32 { text, entity } => match convert_bech32(&entity) {
                Bech32Outcome::Block(block) => blocks.push(block),
                Bech32Outcome::Drop => {
                    tracing::debug!(entity = %entity, "dropping unhandled bech32 entity");
                }
                Bech32Outcome::Malformed => blocks.push(Block::Text(text)),
            },
        }
    }

    Blocks { words, blocks }
}

enum Bech32Outcome {
    /// The entity resolved to a block
    Block(Block),
    /// Checksum-valid entity of a kind we produce no block for
    Drop,
    /// Not actually a bech32 entity; the span stays literal text
    Malformed,
}

/// Resolve one bech32 entity per its human-readable part
fn convert_bech32(entity: &str) -> Bech32Outcome {
    // Checksum and charset gate. Whatever fails here only looked like an
    // entity and stays text.
    let Ok((hrp, data)) = bech32::decode(entity) else {
        return Bech32Outcome::Malformed;
    };

    match hrp.to_string().as_str() {
        "npub" | "nprofile" | "note" | "nevent" => match Nip19::from_bech32(entity) {
            Ok(Nip19::Pubkey(pk)) => Bech32Outcome::Block(Block::Mention(Mention::pubkey(
                pk.to_hex(),
            ))),
            Ok(Nip19::Profile(profile)) => {
                let mut mention = Mention::pubkey(profile.public_key.to_hex());
                mention.reference.relay = profile.relays.first().map(|r| r.to_string());
                Bech32Outcome::Block(Block::Mention(mention))
            }
            Ok(Nip19::EventId(id)) => Bech32Outcome::Block(Block::Mention(Mention::note(
                id.to_hex(),
            ))),
            Ok(Nip19::Event(event)) => {
                let mut mention = Mention::note(event.event_id.to_hex());
                mention.reference.relay = event.relays.first().map(|r| r.to_string());
                Bech32Outcome::Block(Block::Mention(mention))
            }
            // Checksum passed but the payload did not decode as its own kind
            // claims; treat the span as text, same as the checksum gate.
            _ => Bech32Outcome::Malformed,
        },
        "nsec" => Bech32Outcome::Block(Block::Mention(secret_to_mention(&data))),
        "nrelay" => match relay_from_tlv(&data) {
            Some(relay) => Bech32Outcome::Block(Block::Relay(relay)),
            None => Bech32Outcome::Malformed,
        },
        // Not decomposed; re-wrapped under the canonical prefix.
        "naddr" => Bech32Outcome::Block(Block::Text(format!("nostr:{entity}"))),
        _ => Bech32Outcome::Drop,
    }
}

/// A secret key pasted into content becomes a mention of its public key
///
/// Conversion uses the signing capability; when the payload is not a usable
/// secret key the raw bytes are kept as the identifier instead. Secret keys
/// in content are already a misuse case, so this never blocks decoding.
fn secret_to_mention(data: &[u8]) -> Mention {
    match SecretKey::from_slice(data) {
        Ok(secret_key) => Mention::pubkey(Keys::new(secret_key).public_key().to_hex()),
        Err(_) => Mention::pubkey(hex::encode(data)),
    }
}

/// Extract the relay address from an `nrelay` TLV payload (type 0)
///
/// Current Nostr libraries dropped this entity, but notes containing one
/// still exist, so the TLV is read directly.
fn relay_from_tlv(data: &[u8]) -> Option<String> {
    let mut rest = data;
    while rest.len() >= 2 {
        let (typ, len) = (rest[0], rest[1] as usize);
        if rest.len() < 2 + len {
            return None;
        }
        if typ == 0 {
            return String::from_utf8(rest[2..2 + len].to_vec()).ok();
        }
        rest = &rest[2 + len..];
    }
    None
}
