use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use regex::Regex;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines, Read};
use std::path::Path;
use std::sync::OnceLock;

/// Regex to extract kind value from JSON
/// Matches: "kind": 123, "kind":456, etc.
static KIND_REGEX: OnceLock<Regex> = OnceLock::new();

fn get_kind_regex() -> &'static Regex {
    KIND_REGEX
        .get_or_init(|| Regex::new(r#""kind"\s*:\s*(\d+)"#).expect("Failed to compile kind regex"))
}

/// Line reader for JSONL input with optional preprocessing
///
/// Accepts a file path, a gzipped file path (`.gz`), or `-` for stdin.
pub struct InputReader {
    reader: Lines<BufReader<Box<dyn Read>>>,
    notes_only: bool,
    filtered_count: usize,
}

impl InputReader {
    /// Create a new input reader from a file path or `-`
    pub fn new(input: &str) -> Result<Self> {
        Self::with_options(input, false)
    }

    /// Create a new input reader with preprocessing options
    ///
    /// # Arguments
    /// * `input` - Path to the input file, or `-` for stdin
    /// * `notes_only` - If true, filters out event lines whose kind is not 1
    pub fn with_options(input: &str, notes_only: bool) -> Result<Self> {
        let source: Box<dyn Read> = if input == "-" {
            Box::new(std::io::stdin())
        } else {
            let path = Path::new(input);
            if !path.exists() {
                anyhow::bail!("Input file does not exist: {}", input);
            }

            let file =
                File::open(path).context(format!("Failed to open input file: {}", input))?;
            if input.ends_with(".gz") {
                Box::new(GzDecoder::new(file))
            } else {
                Box::new(file)
            }
        };
        let reader = BufReader::with_capacity(1024 * 1024, source); // 1MB buffer

        Ok(Self {
            reader: reader.lines(),
            notes_only,
            filtered_count: 0,
        })
    }

    /// Get the number of lines filtered out because they are not text notes
    pub fn filtered_count(&self) -> usize {
        self.filtered_count
    }

    /// Check if a JSON line looks like a text note (kind 1)
    ///
    /// Lines without a kind field pass; plain `{"content": ...}` input has
    /// no kind and full parsing decides what to do with it.
    pub fn is_text_note(line: &str) -> bool {
        let regex = get_kind_regex();

        regex
            .captures(line)
            .and_then(|captures| captures.get(1))
            .and_then(|kind_match| kind_match.as_str().parse::<u64>().ok())
            .is_none_or(|kind| kind == 1)
    }
}

impl Iterator for InputReader {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line_result = self.reader.next()?;

            let line = match line_result {
                Ok(l) => l,
                Err(e) => return Some(Err(e).context("Failed to read line from input")),
            };

            // Apply note filtering if enabled
            if self.notes_only && !Self::is_text_note(&line) {
                self.filtered_count += 1;
                continue; // Skip this line and read the next one
            }

            return Some(Ok(line));
        }
    }
}

/// Resolve an argument that is either a literal value or `-` for stdin
///
/// Reading from stdin strips the trailing newline the shell pipe adds.
pub fn arg_or_stdin(arg: &str) -> Result<String> {
    if arg != "-" {
        return Ok(arg.to_string());
    }

    let mut buffer = String::new();
    std::io::stdin()
        .read_to_string(&mut buffer)
        .context("Failed to read from stdin")?;
    Ok(buffer.trim_end_matches('\n').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_file_reader() {
        // Create a temporary file with test data
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "line 1").unwrap();
        writeln!(file, "line 2").unwrap();
        writeln!(file, "line 3").unwrap();
        file.flush().unwrap();

        let reader = InputReader::new(file.path().to_str().unwrap()).unwrap();
        let lines: Vec<String> = reader.map(|r| r.unwrap()).collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "line 1");
        assert_eq!(lines[1], "line 2");
        assert_eq!(lines[2], "line 3");
    }

    #[test]
    fn test_gzipped_file_reader() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("notes.jsonl.gz");

        let file = std::fs::File::create(&path).unwrap();
        let mut encoder =
            flate2::write::GzEncoder::new(file, flate2::Compression::default());
        writeln!(encoder, "line 1").unwrap();
        writeln!(encoder, "line 2").unwrap();
        encoder.finish().unwrap();

        let reader = InputReader::new(path.to_str().unwrap()).unwrap();
        let lines: Vec<String> = reader.map(|r| r.unwrap()).collect();

        assert_eq!(lines, vec!["line 1", "line 2"]);
    }

    #[test]
    fn test_file_not_found() {
        let result = InputReader::new("/nonexistent/file.jsonl");
        assert!(result.is_err());
    }

    #[test]
    fn test_is_text_note() {
        // Text notes
        assert!(InputReader::is_text_note(r#"{"kind": 1, "content": "gm"}"#));
        assert!(InputReader::is_text_note(r#"{"kind":1}"#));

        // Other event kinds
        assert!(!InputReader::is_text_note(r#"{"kind": 7, "content": "+"}"#));
        assert!(!InputReader::is_text_note(r#"{"kind":0}"#));
        assert!(!InputReader::is_text_note(r#"{"kind": 30023}"#));

        // No kind field: pass through, full parsing decides
        assert!(InputReader::is_text_note(r#"{"content": "plain note line"}"#));
    }

    #[test]
    fn test_filter_non_notes() {
        // Create a temporary file with mixed event kinds
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"kind": 1, "content": "a note"}}"#).unwrap();
        writeln!(file, r#"{{"kind": 7, "content": "+"}}"#).unwrap();
        writeln!(file, r#"{{"content": "kindless line"}}"#).unwrap();
        writeln!(file, r#"{{"kind": 0, "content": "{{}}"}}"#).unwrap();
        writeln!(file, r#"{{"kind": 1, "content": "another note"}}"#).unwrap();
        file.flush().unwrap();

        let mut reader = InputReader::with_options(
            file.path().to_str().unwrap(),
            true, // enable filtering
        )
        .unwrap();

        let lines: Vec<String> = reader.by_ref().map(|r| r.unwrap()).collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("a note"));
        assert!(lines[1].contains("kindless line"));
        assert!(lines[2].contains("another note"));

        // Check that 2 lines were filtered
        assert_eq!(reader.filtered_count(), 2);
    }

    #[test]
    fn test_no_filtering_by_default() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"kind": 7, "content": "+"}}"#).unwrap();
        file.flush().unwrap();

        let mut reader = InputReader::new(file.path().to_str().unwrap()).unwrap();
        let lines: Vec<String> = reader.by_ref().map(|r| r.unwrap()).collect();

        assert_eq!(lines.len(), 1);
        assert_eq!(reader.filtered_count(), 0);
    }

    #[test]
    fn test_arg_passthrough() {
        assert_eq!(arg_or_stdin("gm nostr").unwrap(), "gm nostr");
        assert_eq!(arg_or_stdin("").unwrap(), "");
    }
}
