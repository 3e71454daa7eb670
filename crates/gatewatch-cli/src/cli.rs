//! CLI definition using clap

use std::path::PathBuf;

use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};

use gatewatch_types::OutputFormat;

#[derive(Parser)]
#[command(name = "gatewatch")]
#[command(author = "yuuji")]
#[command(version)]
#[command(about = "Campus gate access control from license plate recognition")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Vehicle registry file (.toml or .csv). Uses config value if not specified.
    #[arg(long, global = true)]
    pub registry: Option<PathBuf>,

    /// OCR command override
    #[arg(long, global = true)]
    pub ocr_command: Option<String>,

    /// Output format (json, table). Uses config value if not specified.
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Replay a folder of images as the gate camera
    Watch {
        /// Folder containing frames, replayed in file-name order
        frames: PathBuf,

        /// Recognize on a worker pool instead of the polling loop
        #[arg(long)]
        concurrent: bool,

        /// Number of recognition workers. 0 = auto (CPU count). Uses config value if not specified.
        #[arg(long, short = 'j')]
        workers: Option<usize>,

        /// Keep the ledger in memory only
        #[arg(long)]
        ephemeral: bool,
    },

    /// Read the plate in a single image
    Recognize {
        /// Path to image file
        image: PathBuf,

        /// Write a copy with the plate outlined
        #[arg(long)]
        annotate: Option<PathBuf>,
    },

    /// Decide entry or exit for a plate typed in by the operator
    ///
    /// Debounce memory lives only as long as one process. Two `decide` runs a
    /// second apart toggle ENTRY and EXIT; repeated reads are only ignored
    /// within a single `watch` run.
    Decide {
        /// License plate (e.g. "ABC-1234")
        plate: String,

        /// Decision time as "YYYY-MM-DD HH:MM:SS" (default: now)
        #[arg(long, value_parser = parse_timestamp)]
        at: Option<NaiveDateTime>,

        /// Keep the ledger in memory only
        #[arg(long)]
        ephemeral: bool,
    },

    /// Manage configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Set vehicle registry file
        #[arg(long)]
        set_registry: Option<PathBuf>,

        /// Set OCR command
        #[arg(long)]
        set_ocr_command: Option<String>,

        /// Set debounce window in seconds
        #[arg(long)]
        set_debounce: Option<u64>,

        /// Set minimum plate contour area in px²
        #[arg(long)]
        set_min_area: Option<f64>,

        /// Set default output format
        #[arg(long)]
        set_output: Option<OutputFormat>,

        /// Reset to defaults
        #[arg(long)]
        reset: bool,
    },
}

fn parse_timestamp(value: &str) -> Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
        .map_err(|e| format!("expected \"YYYY-MM-DD HH:MM:SS\": {}", e))
}
