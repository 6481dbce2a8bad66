//! Raw token scanner for note content
//!
//! Splits a content string into owned tokens: plain text runs, `#hashtag`
//! spans, `#[index]` mention placeholders, URL spans, BOLT-11 invoice spans,
//! and bech32 entity spans. The scanner is purely lexical; resolving tokens
//! against the tag list and deciding what survives as a block happens in the
//! decoder.
//!
//! Structural tokens begin only at a word boundary: the start of input or
//! after a non-alphanumeric character, so `face#palm` and `notebook` stay
//! text. Every token owns its payload; nothing borrows from the scanned
//! string.

/// One raw token produced by the scanner
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawToken {
    /// A run of uninterpreted text
    Text(String),
    /// `#hashtag`, payload without the `#`
    Hashtag(String),
    /// An `http://` or `https://` span, unvalidated
    Url(String),
    /// An `lnbc` bech32 run, `lightning:` prefix already stripped
    Invoice(String),
    /// A `#[index]` placeholder
    MentionIndex(usize),
    /// A bech32 entity span
    Bech32 {
        /// The span as it appeared, any `nostr:` or `@` prefix included
        text: String,
        /// The bare entity, prefix stripped
        entity: String,
    },
}

/// The NIP-19 entity prefixes recognized without a `nostr:` marker
const BECH32_HRPS: [&str; 7] = [
    "npub1", "nsec1", "note1", "nevent1", "nprofile1", "nrelay1", "naddr1",
];

/// Scan a content string into raw tokens
///
/// Never fails; content with no structure yields a single text token, and an
/// empty string yields no tokens. Consecutive unstructured characters always
/// collapse into one text token.
pub fn scan_content(content: &str) -> Vec<RawToken> {
    let cs: Vec<(usize, char)> = content.char_indices().collect();
    let mut tokens = Vec::new();
    let mut text_start = 0;
    let mut i = 0;

    while i < cs.len() {
        let boundary = i == 0 || !cs[i - 1].1.is_alphanumeric();
        if boundary {
            if let Some((token, next)) = match_token(content, &cs, i) {
                let (off, _) = cs[i];
                if off > text_start {
                    tokens.push(RawToken::Text(content[text_start..off].to_string()));
                }
                tokens.push(token);
                i = next;
                text_start = end_offset(content, &cs, i);
                continue;
            }
        }
        i += 1;
    }

    if content.len() > text_start {
        tokens.push(RawToken::Text(content[text_start..].to_string()));
    }

    tokens
}

/// Byte offset of the char at index `i`, or the end of the string
fn end_offset(content: &str, cs: &[(usize, char)], i: usize) -> usize {
    cs.get(i).map_or(content.len(), |&(off, _)| off)
}

/// Index after the last char from `start` satisfying `pred`
fn run_end(cs: &[(usize, char)], start: usize, pred: impl Fn(char) -> bool) -> usize {
    let mut j = start;
    while j < cs.len() && pred(cs[j].1) {
        j += 1;
    }
    j
}

fn match_token(content: &str, cs: &[(usize, char)], i: usize) -> Option<(RawToken, usize)> {
    match cs[i].1 {
        '#' => match_mention_index(cs, i).or_else(|| match_hashtag(content, cs, i)),
        'h' => match_url(content, cs, i),
        'l' => match_invoice(content, cs, i),
        _ => None,
    }
    .or_else(|| match_bech32(content, cs, i))
}

/// `#[` digits `]`; anything else after `#[` is not a token
fn match_mention_index(cs: &[(usize, char)], i: usize) -> Option<(RawToken, usize)> {
    if cs.get(i + 1)?.1 != '[' {
        return None;
    }
    let digits_end = run_end(cs, i + 2, |c| c.is_ascii_digit());
    if digits_end == i + 2 || cs.get(digits_end)?.1 != ']' {
        return None;
    }
    let digits: String = cs[i + 2..digits_end].iter().map(|&(_, c)| c).collect();
    let index = digits.parse::<usize>().ok()?;
    Some((RawToken::MentionIndex(index), digits_end + 1))
}

/// `#` followed by at least one alphanumeric char
fn match_hashtag(content: &str, cs: &[(usize, char)], i: usize) -> Option<(RawToken, usize)> {
    let end = run_end(cs, i + 1, char::is_alphanumeric);
    if end == i + 1 {
        return None;
    }
    let start = cs[i + 1].0;
    let tag = content[start..end_offset(content, cs, end)].to_string();
    Some((RawToken::Hashtag(tag), end))
}

/// `http://` or `https://`, consuming until whitespace
fn match_url(content: &str, cs: &[(usize, char)], i: usize) -> Option<(RawToken, usize)> {
    let rest = &content[cs[i].0..];
    if !rest.starts_with("http://") && !rest.starts_with("https://") {
        return None;
    }
    let end = run_end(cs, i, |c| !c.is_whitespace());
    let span = content[cs[i].0..end_offset(content, cs, end)].to_string();
    Some((RawToken::Url(span), end))
}

/// `lnbc` bech32 run, optionally behind a `lightning:` prefix
///
/// The scanner does not validate the invoice; a short or corrupt run still
/// tokenizes and the decoder drops it.
fn match_invoice(content: &str, cs: &[(usize, char)], i: usize) -> Option<(RawToken, usize)> {
    let rest = &content[cs[i].0..];
    let entity_start = if rest.starts_with("lightning:lnbc") {
        i + "lightning:".len()
    } else if rest.starts_with("lnbc") {
        i
    } else {
        return None;
    };
    let end = run_end(cs, entity_start, |c| c.is_ascii_alphanumeric());
    let entity = content[cs[entity_start].0..end_offset(content, cs, end)].to_string();
    Some((RawToken::Invoice(entity), end))
}

/// A NIP-19 entity: bare (known prefixes only), `@`-marked (known prefixes
/// only), or `nostr:`-marked (any plausible entity, so the decoder can drop
/// unknown kinds)
fn match_bech32(content: &str, cs: &[(usize, char)], i: usize) -> Option<(RawToken, usize)> {
    let rest = &content[cs[i].0..];
    let entity_start = if let Some(stripped) = rest.strip_prefix("nostr:") {
        if !starts_alphanumeric(stripped) {
            return None;
        }
        i + "nostr:".len()
    } else if rest.starts_with('@') && has_known_hrp(&rest[1..]) {
        i + 1
    } else if has_known_hrp(rest) {
        i
    } else {
        return None;
    };

    let end = run_end(cs, entity_start, |c| c.is_ascii_alphanumeric());
    let entity = content[cs[entity_start].0..end_offset(content, cs, end)].to_string();
    let text = content[cs[i].0..end_offset(content, cs, end)].to_string();
    Some((RawToken::Bech32 { text, entity }, end))
}

fn starts_alphanumeric(s: &str) -> bool {
    s.chars().next().is_some_and(|c| c.is_ascii_alphanumeric())
}

fn has_known_hrp(s: &str) -> bool {
    BECH32_HRPS.iter().any(|hrp| s.starts_with(hrp))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> RawToken {
        RawToken::Text(s.to_string())
    }

    #[test]
    fn test_plain_text_single_token() {
        assert_eq!(scan_content("hello world"), vec![text("hello world")]);
    }

    #[test]
    fn test_empty_content_no_tokens() {
        assert_eq!(scan_content(""), Vec::new());
    }

    #[test]
    fn test_hashtag_at_boundary() {
        assert_eq!(
            scan_content("gm #coffee everyone"),
            vec![
                text("gm "),
                RawToken::Hashtag("coffee".to_string()),
                text(" everyone"),
            ]
        );
    }

    #[test]
    fn test_hashtag_mid_word_is_text() {
        assert_eq!(scan_content("face#palm"), vec![text("face#palm")]);
    }

    #[test]
    fn test_hashtag_start_of_input() {
        assert_eq!(
            scan_content("#Nostr"),
            vec![RawToken::Hashtag("Nostr".to_string())]
        );
    }

    #[test]
    fn test_bare_hash_is_text() {
        assert_eq!(scan_content("just a # sign"), vec![text("just a # sign")]);
    }

    #[test]
    fn test_unicode_hashtag() {
        assert_eq!(
            scan_content("#日本 tour"),
            vec![RawToken::Hashtag("日本".to_string()), text(" tour")]
        );
    }

    #[test]
    fn test_mention_index() {
        assert_eq!(
            scan_content("hello #[5]"),
            vec![text("hello "), RawToken::MentionIndex(5)]
        );
    }

    #[test]
    fn test_mention_index_multi_digit() {
        assert_eq!(scan_content("#[42]"), vec![RawToken::MentionIndex(42)]);
    }

    #[test]
    fn test_malformed_mention_index_is_text() {
        assert_eq!(scan_content("#[]"), vec![text("#[]")]);
        assert_eq!(scan_content("#[abc]"), vec![text("#[abc]")]);
        assert_eq!(scan_content("#[12"), vec![text("#[12")]);
    }

    #[test]
    fn test_overflowing_mention_index_is_text() {
        let s = "#[99999999999999999999999999]";
        assert_eq!(scan_content(s), vec![text(s)]);
    }

    #[test]
    fn test_url_span() {
        assert_eq!(
            scan_content("read https://damus.io/notedeck now"),
            vec![
                text("read "),
                RawToken::Url("https://damus.io/notedeck".to_string()),
                text(" now"),
            ]
        );
    }

    #[test]
    fn test_url_consumes_until_whitespace() {
        assert_eq!(
            scan_content("https://a.example/x?q=1#frag"),
            vec![RawToken::Url("https://a.example/x?q=1#frag".to_string())]
        );
    }

    #[test]
    fn test_invoice_span() {
        assert_eq!(
            scan_content("pay lnbc1qqqqq please"),
            vec![
                text("pay "),
                RawToken::Invoice("lnbc1qqqqq".to_string()),
                text(" please"),
            ]
        );
    }

    #[test]
    fn test_lightning_prefix_stripped() {
        assert_eq!(
            scan_content("lightning:lnbc1qqqqq"),
            vec![RawToken::Invoice("lnbc1qqqqq".to_string())]
        );
    }

    #[test]
    fn test_bare_known_entity() {
        let tokens = scan_content("npub1xyz tail");
        assert_eq!(
            tokens,
            vec![
                RawToken::Bech32 {
                    text: "npub1xyz".to_string(),
                    entity: "npub1xyz".to_string(),
                },
                text(" tail"),
            ]
        );
    }

    #[test]
    fn test_nostr_prefix_keeps_appearance() {
        let tokens = scan_content("nostr:note1abc");
        assert_eq!(
            tokens,
            vec![RawToken::Bech32 {
                text: "nostr:note1abc".to_string(),
                entity: "note1abc".to_string(),
            }]
        );
    }

    #[test]
    fn test_at_prefix_requires_known_hrp() {
        assert_eq!(
            scan_content("@npub1xyz"),
            vec![RawToken::Bech32 {
                text: "@npub1xyz".to_string(),
                entity: "npub1xyz".to_string(),
            }]
        );
        assert_eq!(scan_content("@alice"), vec![text("@alice")]);
    }

    #[test]
    fn test_nostr_prefix_accepts_unknown_hrp() {
        assert_eq!(
            scan_content("nostr:nscript1xyz"),
            vec![RawToken::Bech32 {
                text: "nostr:nscript1xyz".to_string(),
                entity: "nscript1xyz".to_string(),
            }]
        );
    }

    #[test]
    fn test_unknown_bare_hrp_stays_text() {
        assert_eq!(scan_content("nscript1xyz"), vec![text("nscript1xyz")]);
    }

    #[test]
    fn test_entity_mid_word_is_text() {
        assert_eq!(scan_content("xnpub1xyz"), vec![text("xnpub1xyz")]);
        assert_eq!(scan_content("notebook1"), vec![text("notebook1")]);
    }

    #[test]
    fn test_mixed_content_order() {
        let tokens = scan_content("gm #[0] check https://damus.io #introductions");
        assert_eq!(
            tokens,
            vec![
                text("gm "),
                RawToken::MentionIndex(0),
                text(" check "),
                RawToken::Url("https://damus.io".to_string()),
                text(" "),
                RawToken::Hashtag("introductions".to_string()),
            ]
        );
    }
}
