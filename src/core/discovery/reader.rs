//! Lightweight config reading
//!
//! Discovery and file-id extraction only need a handful of values from each
//! config. [`PatternConfigReader`] pulls them out of the config text with
//! regular expressions instead of evaluating the config language.

use crate::domain::errors::ExfigError;
use crate::domain::ids::FileId;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Values discovery needs from one config
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigSummary {
    /// Design files (light first, then dark) in declaration order
    pub figma_file_ids: Vec<FileId>,
    /// Separate token-source files
    pub tokens_file_ids: Vec<FileId>,
    /// Output locations as written in the config (unresolved)
    pub output_paths: Vec<PathBuf>,
}

impl ConfigSummary {
    /// Every referenced file id, design files first
    pub fn file_ids(&self) -> impl Iterator<Item = &FileId> {
        self.figma_file_ids.iter().chain(self.tokens_file_ids.iter())
    }
}

/// Reads the discovery-relevant parts of a config file
pub trait ConfigReader: Send + Sync {
    fn read(&self, path: &Path) -> Result<ConfigSummary>;
}

/// Keys whose value names a design file
const FIGMA_FILE_KEYS: &str = "lightFileId|darkFileId|lightHighContrastFileId|darkHighContrastFileId";

/// Keys whose value names a token-source file
const TOKENS_FILE_KEYS: &str = "tokensFileId";

/// Keys whose value is an output location
const OUTPUT_KEYS: &str =
    "xcassetsPath|mainRes|output|outputPath|outputDirectory|assetsDirectory|resourcesPath";

fn assignment_pattern(keys: &str) -> Regex {
    // Constant pattern; compilation cannot fail for the key lists above
    Regex::new(&format!(r#"(?m)^\s*({keys})\s*=\s*"([^"]*)""#))
        .expect("assignment pattern is valid")
}

fn figma_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| assignment_pattern(FIGMA_FILE_KEYS))
}

fn tokens_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| assignment_pattern(TOKENS_FILE_KEYS))
}

fn output_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| assignment_pattern(OUTPUT_KEYS))
}

/// Regex-based [`ConfigReader`]
///
/// Comments are stripped first, then the text must have balanced braces
/// outside string literals; anything else is reported as a configuration
/// error for that file only.
///
/// ```
/// use exfig::core::discovery::PatternConfigReader;
///
/// let summary = PatternConfigReader::new()
///     .parse("figma {\n  lightFileId = \"abc\"\n}\nios {\n  xcassetsPath = \"App/Assets.xcassets\"\n}\n")
///     .unwrap();
/// assert_eq!(summary.figma_file_ids[0].as_str(), "abc");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternConfigReader;

impl PatternConfigReader {
    pub fn new() -> Self {
        Self
    }

    /// Extracts a summary from config text
    pub fn parse(&self, contents: &str) -> Result<ConfigSummary> {
        let text = strip_comments(contents);
        check_braces(&text)?;

        Ok(ConfigSummary {
            figma_file_ids: capture_ids(figma_pattern(), &text),
            tokens_file_ids: capture_ids(tokens_pattern(), &text),
            output_paths: output_pattern()
                .captures_iter(&text)
                .map(|cap| cap[2].trim().to_string())
                .filter(|value| !value.is_empty())
                .map(PathBuf::from)
                .collect(),
        })
    }
}

impl ConfigReader for PatternConfigReader {
    fn read(&self, path: &Path) -> Result<ConfigSummary> {
        let contents = fs::read_to_string(path).map_err(|e| {
            ExfigError::Configuration(format!("Failed to read {}: {}", path.display(), e))
        })?;
        self.parse(&contents).map_err(|e| match e {
            ExfigError::Configuration(msg) => {
                ExfigError::Configuration(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }
}

fn capture_ids(pattern: &Regex, text: &str) -> Vec<FileId> {
    pattern
        .captures_iter(text)
        .filter_map(|cap| FileId::new(&cap[2]).ok())
        .collect()
}

/// Removes `//` line comments and `/* */` block comments outside strings
pub(crate) fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                }
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        let lookahead = chars.peek().copied();
        match (c, lookahead) {
            ('"', _) => {
                in_string = true;
                out.push(c);
            }
            ('/', Some('/')) => {
                for next in chars.by_ref() {
                    if next == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut prev = '\0';
                for next in chars.by_ref() {
                    if next == '\n' {
                        out.push('\n');
                    }
                    if prev == '*' && next == '/' {
                        break;
                    }
                    prev = next;
                }
            }
            _ => out.push(c),
        }
    }

    out
}

fn check_braces(text: &str) -> Result<()> {
    let mut depth: i64 = 0;
    let mut in_string = false;
    let mut escaped = false;

    for c in text.chars() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth < 0 {
                    return Err(ExfigError::Configuration(
                        "unexpected closing brace".to_string(),
                    ));
                }
            }
            _ => {}
        }
    }

    if in_string {
        return Err(ExfigError::Configuration("unterminated string".to_string()));
    }
    if depth != 0 {
        return Err(ExfigError::Configuration(format!(
            "{depth} unclosed brace(s)"
        )));
    }
    Ok(())
}
