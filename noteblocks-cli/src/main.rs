use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use noteblocks_core::{
    Block, MentionKind, ProfileDb, ReadTxn, Tag, compose_post, lookup_profile, parse_content,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, error, info, warn};

mod input;

use input::InputReader;

#[derive(Parser, Debug)]
#[command(name = "noteblocks")]
#[command(about = "Decode Nostr note content into typed blocks", long_about = None)]
#[command(version)]
struct Cli {
    /// Show detailed progress information
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Parser, Debug)]
enum Commands {
    /// Decode one note's content into typed blocks as JSON
    Decode {
        /// Note content, or '-' for stdin
        #[arg(value_name = "CONTENT")]
        content: String,

        /// Note tags as a JSON array of string arrays
        #[arg(short, long, default_value = "[]")]
        tags: String,

        /// Profile database for resolving mention names
        #[arg(long)]
        db: Option<PathBuf>,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Decode a JSONL stream of notes, one JSON result per line
    Batch {
        /// Input file path (.jsonl, .jsonl.gz) or '-' for stdin
        #[arg(value_name = "INPUT")]
        input: String,

        /// Profile database for resolving mention names
        #[arg(long)]
        db: Option<PathBuf>,

        /// Skip event lines whose kind is not 1 (text note)
        #[arg(long)]
        notes_only: bool,

        /// Disable progress bar
        #[arg(long)]
        no_progress: bool,
    },

    /// Render authored blocks into content and derive their tags
    Compose {
        /// Blocks as a JSON array, or '-' for stdin
        #[arg(value_name = "BLOCKS")]
        blocks: String,

        /// Tags already chosen by the caller, as a JSON array
        #[arg(short, long, default_value = "[]")]
        tags: String,
    },

    /// Manage the profile store behind mention-name resolution
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
}

#[derive(Parser, Debug)]
enum ProfileAction {
    /// Insert or update a profile
    Set {
        /// Public key (64 hex characters)
        pubkey: String,

        /// Short handle
        #[arg(long)]
        name: Option<String>,

        /// Full display name
        #[arg(long)]
        display_name: Option<String>,

        /// Profile database path
        #[arg(long, default_value = "./profiles.db")]
        db: PathBuf,
    },

    /// Print a stored profile as JSON
    Get {
        /// Public key (64 hex characters)
        pubkey: String,

        /// Profile database path
        #[arg(long, default_value = "./profiles.db")]
        db: PathBuf,
    },
}

/// One line of batch input
///
/// Extra fields (id, sig, created_at, ...) are ignored, so raw relay dumps
/// feed straight in.
#[derive(Debug, Deserialize)]
struct NoteLine {
    content: String,
    #[serde(default)]
    tags: Vec<Tag>,
}

/// JSON shape written for each decoded note
#[derive(Debug, Serialize)]
struct DecodedNote {
    words: usize,
    blocks: Vec<Block>,
    /// Resolved names for mentioned pubkeys, present only when a profile
    /// database was given and at least one name resolved
    #[serde(skip_serializing_if = "Option::is_none")]
    names: Option<BTreeMap<String, String>>,
}

#[derive(Debug)]
struct BatchStats {
    total_lines: u64,
    decoded_notes: u64,
    malformed_lines: u64,
    skipped_lines: u64,
    total_blocks: u64,
}

impl BatchStats {
    fn new() -> Self {
        Self {
            total_lines: 0,
            decoded_notes: 0,
            malformed_lines: 0,
            skipped_lines: 0,
            total_blocks: 0,
        }
    }

    /// Summary goes to stderr; stdout carries only the decoded JSONL.
    fn print_summary(&self, filtered: usize) {
        eprintln!("\n📊 Batch Summary:");
        eprintln!("  Total lines processed: {}", self.total_lines);
        eprintln!("  ✅ Decoded notes:      {}", self.decoded_notes);
        eprintln!("  ❌ Malformed lines:    {}", self.malformed_lines);
        if self.skipped_lines > 0 {
            eprintln!("  ⏭️  Skipped lines:      {}", self.skipped_lines);
        }
        if filtered > 0 {
            eprintln!("  🚫 Filtered non-notes: {}", filtered);
        }
        eprintln!("  Blocks produced:       {}", self.total_blocks);

        let success_rate = if self.total_lines > 0 {
            (self.decoded_notes as f64 / self.total_lines as f64) * 100.0
        } else {
            0.0
        };
        eprintln!("  Success rate:          {:.1}%", success_rate);
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    match cli.command {
        Commands::Decode {
            content,
            tags,
            db,
            pretty,
        } => {
            decode_command(&content, &tags, db.as_deref(), pretty)?;
        }
        Commands::Batch {
            input,
            db,
            notes_only,
            no_progress,
        } => {
            batch_command(&input, db.as_deref(), notes_only, !no_progress)?;
        }
        Commands::Compose { blocks, tags } => {
            compose_command(&blocks, &tags)?;
        }
        Commands::Profile { action } => match action {
            ProfileAction::Set {
                pubkey,
                name,
                display_name,
                db,
            } => {
                profile_set(&pubkey, name.as_deref(), display_name.as_deref(), &db)?;
            }
            ProfileAction::Get { pubkey, db } => {
                profile_get(&pubkey, &db)?;
            }
        },
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::filter::LevelFilter;

    let filter = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn decode_command(
    content: &str,
    tags_json: &str,
    db_path: Option<&Path>,
    pretty: bool,
) -> Result<()> {
    let tags = parse_tags(tags_json)?;
    let content = input::arg_or_stdin(content)?;

    debug!("Decoding {} bytes of content", content.len());
    let blocks = parse_content(&content, &tags);

    let names = match db_path {
        Some(path) => {
            let db = ProfileDb::open(path)?;
            let names = resolve_names(&db, &blocks.blocks);
            (!names.is_empty()).then_some(names)
        }
        None => None,
    };

    let note = DecodedNote {
        words: blocks.words,
        blocks: blocks.blocks,
        names,
    };
    print_json(&note, pretty)
}

fn batch_command(
    input: &str,
    db_path: Option<&Path>,
    notes_only: bool,
    show_progress: bool,
) -> Result<()> {
    info!("Starting batch decode");
    info!("Input: {}", input);

    let db = match db_path {
        Some(path) => {
            info!("Profile database: {}", path.display());
            Some(ProfileDb::open(path)?)
        }
        None => None,
    };

    let mut reader = InputReader::with_options(input, notes_only)?;

    // Set up progress bar
    let progress = if show_progress {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    } else {
        None
    };

    let mut stats = BatchStats::new();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    // Process each line
    for (line_num, line_result) in reader.by_ref().enumerate() {
        stats.total_lines += 1;

        let line = match line_result {
            Ok(line) => line,
            Err(e) => {
                error!("Failed to read line {}: {}", line_num + 1, e);
                stats.skipped_lines += 1;
                continue;
            }
        };

        // Skip empty lines
        if line.trim().is_empty() {
            stats.skipped_lines += 1;
            continue;
        }

        // Update progress
        if let Some(ref pb) = progress {
            pb.set_message(format!(
                "Processed: {} | Decoded: {} | Malformed: {}",
                stats.total_lines, stats.decoded_notes, stats.malformed_lines
            ));
        }

        // Parse the JSON line
        let note: NoteLine = match serde_json::from_str(&line) {
            Ok(note) => note,
            Err(e) => {
                warn!("Failed to parse line {}: {}", line_num + 1, e);
                stats.malformed_lines += 1;
                continue;
            }
        };

        // Decoding itself never fails
        let blocks = parse_content(&note.content, &note.tags);
        stats.total_blocks += blocks.blocks.len() as u64;

        let names = match &db {
            Some(db) => {
                let names = resolve_names(db, &blocks.blocks);
                (!names.is_empty()).then_some(names)
            }
            None => None,
        };

        let decoded = DecodedNote {
            words: blocks.words,
            blocks: blocks.blocks,
            names,
        };
        serde_json::to_writer(&mut out, &decoded)?;
        writeln!(out)?;

        stats.decoded_notes += 1;
        debug!("Decoded line {}", line_num + 1);
    }

    // Clean up progress bar
    if let Some(pb) = progress {
        pb.finish_with_message(format!(
            "Complete! Processed: {} | Decoded: {} | Malformed: {}",
            stats.total_lines, stats.decoded_notes, stats.malformed_lines
        ));
    }

    info!("Batch decode complete");
    stats.print_summary(reader.filtered_count());

    // Exit code: 0 if any notes decoded, 1 if all failed
    if stats.decoded_notes == 0 && stats.total_lines > 0 {
        std::process::exit(1);
    }

    Ok(())
}

fn compose_command(blocks_arg: &str, tags_json: &str) -> Result<()> {
    let caller_tags = parse_tags(tags_json)?;
    let raw = input::arg_or_stdin(blocks_arg)?;
    let blocks: Vec<Block> =
        serde_json::from_str(&raw).context("Blocks must be a JSON array of block values")?;

    debug!("Composing {} blocks", blocks.len());
    let post = compose_post(&blocks, caller_tags);
    print_json(&post, false)
}

fn profile_set(
    pubkey: &str,
    name: Option<&str>,
    display_name: Option<&str>,
    db_path: &Path,
) -> Result<()> {
    let db = ProfileDb::open(db_path)?;
    db.upsert(pubkey, name, display_name)?;

    info!("Stored profile for {}", pubkey);
    println!("✅ Stored profile for {}", pubkey);
    Ok(())
}

fn profile_get(pubkey: &str, db_path: &Path) -> Result<()> {
    let db = ProfileDb::open(db_path)?;
    match lookup_profile(&db, pubkey).into_value() {
        Some(profile) => print_json(&profile, true),
        None => anyhow::bail!("No profile stored for {}", pubkey),
    }
}

/// Resolve preferred names for every mentioned pubkey under one read scope
fn resolve_names(db: &ProfileDb, blocks: &[Block]) -> BTreeMap<String, String> {
    let txn = ReadTxn::new(db, |view| {
        let mut names = BTreeMap::new();
        for block in blocks {
            if let Some(mention) = block.as_mention()
                && mention.kind() == MentionKind::Pubkey
                && let Some(name) = view.profile_name(&mention.reference.id)
            {
                names.insert(mention.reference.id.clone(), name);
            }
        }
        names
    });
    txn.into_value()
}

fn parse_tags(json: &str) -> Result<Vec<Tag>> {
    serde_json::from_str(json).context("Tags must be a JSON array of string arrays")
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", json);
    Ok(())
}
