//! Showcase of the noteblocks-core API
//!
//! Run with: cargo run --example api_showcase

use noteblocks_core::{
    Block, Blocks, Mention, ProfileDb, ReadTxn, Result, compose_post, parse_content, render_blocks,
};
use tempfile::TempDir;

fn main() -> Result<()> {
    println!("🚀 Noteblocks Core API Showcase\n");

    // Feature 1: Decoding
    println!("1️⃣  Decoding");
    println!("   Turning note content into typed blocks...\n");

    let pubkey = "32e1827635450ebb3c5a7d12c1f8e7b2b514439ac10a67eef3d9fd9c5c68e245";
    let tags = vec![vec!["p".to_string(), pubkey.to_string()]];
    let content = "gm #[0] welcome to #nostr, intro docs at https://damus.io/notedeck";

    let decoded = parse_content(content, &tags);
    println!(
        "   ✅ Decoded {} words into {} blocks:",
        decoded.words,
        decoded.blocks.len()
    );
    for block in &decoded.blocks {
        match block {
            Block::Text(text) => println!("      text     {:?}", text),
            Block::Mention(mention) => println!("      mention  {}", mention.reference.id),
            Block::Hashtag(tag) => println!("      hashtag  #{}", tag),
            Block::Url(url) => println!("      url      {}", url),
            Block::Invoice(invoice) => {
                println!("      invoice  {} msat", invoice.amount.msats().unwrap_or(0))
            }
            Block::Relay(relay) => println!("      relay    {}", relay),
        }
    }

    // Feature 2: Fallback, never failure
    println!("\n2️⃣  Fallback");
    println!("   Placeholders that resolve to nothing stay literal...\n");

    let dangling = parse_content("hello #[7]", &[]);
    println!("   ✅ Decoded to: {:?}", dangling.blocks);

    // Feature 3: Rendering
    println!("\n3️⃣  Rendering");
    println!("   Blocks render back to canonical content...\n");

    let rendered = render_blocks(&decoded.blocks);
    println!("   ✅ Round trip intact: {}", rendered == content);

    // Feature 4: Serde Support
    println!("\n4️⃣  Serde Support");
    println!("   Blocks serialize as tagged JSON...\n");

    let json = serde_json::to_string_pretty(&decoded)?;
    println!("   Serialized length: {} bytes", json.len());

    let deserialized: Blocks = serde_json::from_str(&json)?;
    println!("   ✅ Equal after round trip: {}", deserialized == decoded);

    // Feature 5: Composition
    println!("\n5️⃣  Composition");
    println!("   Deriving tags for a drafted note...\n");

    let authored = vec![
        Block::Text("shipping it today ".to_string()),
        Block::Hashtag("BuildInPublic".to_string()),
        Block::Text(" cc ".to_string()),
        Block::Mention(Mention::pubkey(pubkey)),
    ];
    let post = compose_post(&authored, Vec::new());
    println!("   ✅ Content: {:?}", post.content);
    println!("   ✅ Tags: {:?}", post.tags);

    // Feature 6: Profile store and read scopes
    println!("\n6️⃣  Profile Store & Read Scopes");
    println!("   Resolving mention names under one transaction...\n");

    let temp_dir = TempDir::new()?;
    let db = ProfileDb::open(&temp_dir.path().join("profiles.db"))?;
    db.upsert(pubkey, Some("jb55"), Some("Will"))?;

    let names = ReadTxn::new(&db, |view| {
        decoded
            .blocks
            .iter()
            .filter_map(|block| block.as_mention())
            .map(|mention| {
                view.profile_name(&mention.reference.id)
                    .unwrap_or_else(|| "anon".to_string())
            })
            .collect::<Vec<_>>()
    });
    println!("   ✅ Resolved names: {:?}", names.value());
    println!("   ✅ Transactions opened: {}", db.total_reads());

    // Summary
    println!("\n✨ Summary");
    println!("   All features demonstrated successfully!");
    println!("   • Decoding: Typed blocks out of raw content");
    println!("   • Fallback: Malformed references stay literal");
    println!("   • Rendering: Canonical content back out");
    println!("   • Serde Support: Tagged JSON interchange");
    println!("   • Composition: Tag derivation for drafts");
    println!("   • Read Scopes: One transaction, many lookups");

    Ok(())
}
