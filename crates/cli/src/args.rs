//! Command-line arguments.
//!
//! Shared with `build.rs`, which generates shell completions from the same
//! definition.

use std::path::PathBuf;
use std::str::FromStr;

use clap::Parser;
use clap_complete::Shell;

/// Which extractor handles web pages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engine {
    Local,
    Ai,
}

impl FromStr for Engine {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "ai" | "remote" => Ok(Self::Ai),
            _ => Err(format!("Invalid engine: {}. Valid options: local, ai", s)),
        }
    }
}

/// Convert web articles and PDFs into navigable PDFs for e-paper tablets
#[derive(Parser, Debug)]
#[command(name = "paperfold")]
#[command(author = "Paperfold Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Convert web articles and PDFs into e-paper friendly PDFs", long_about = None)]
pub struct Args {
    /// URL (or text containing one), local HTML or PDF file, or "-" for HTML on stdin
    #[arg(value_name = "INPUT", required_unless_present_any = ["history", "clear_history", "save_key", "completions"])]
    pub input: Option<String>,

    /// Output file or directory (default: <title>.pdf in the current directory)
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Extraction engine for web pages (local, ai)
    #[arg(long, default_value = "local", value_name = "ENGINE")]
    pub engine: Engine,

    /// Write a reading-mode HTML page instead of a PDF
    #[arg(long)]
    pub read: bool,

    /// API key for AI extraction (falls back to PAPERFOLD_API_KEY, then the saved key)
    #[arg(long, value_name = "KEY")]
    pub api_key: Option<String>,

    /// Save the given API key for later runs (an empty key removes it)
    #[arg(long)]
    pub save_key: bool,

    /// Model used for AI extraction
    #[arg(long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Relay prefix for fetching pages and images ("" fetches directly)
    #[arg(long, value_name = "URL")]
    pub relay: Option<String>,

    /// HTTP timeout in seconds
    #[arg(long, default_value = "30", value_name = "SECS")]
    pub timeout: u64,

    /// Directory for history and the saved API key
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// List recently converted URLs
    #[arg(long)]
    pub history: bool,

    /// Forget all recently converted URLs
    #[arg(long)]
    pub clear_history: bool,

    /// Print progress and pipeline logs
    #[arg(short, long)]
    pub verbose: bool,

    /// Generate shell completion script
    #[arg(long, value_name = "SHELL")]
    pub completions: Option<Shell>,
}
