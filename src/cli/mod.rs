//! CLI module - Command-line interface for Essai
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Essai - essay practice with AI scoring
#[derive(Parser)]
#[command(name = "essai")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API server
    #[command(alias = "web", alias = "daemon")]
    Serve,

    /// Create default config file
    #[command(alias = "--init")]
    Init,

    /// Validate configuration and report problems
    #[command(alias = "check")]
    CheckConfig,

    /// Score an essay from a file
    Score {
        /// Essay topic
        #[arg(long)]
        topic: String,
        /// File holding the essay text
        file: PathBuf,
        /// Save the scored essay for this account
        #[arg(long)]
        save_as: Option<String>,
    },

    /// Watch a file and auto-save it as a draft while you write
    Draft {
        /// Account email the drafts belong to
        #[arg(long)]
        email: String,
        /// File being edited
        file: PathBuf,
        /// Draft topic
        #[arg(long, default_value = "Untitled")]
        topic: String,
        /// Save frequency such as "30s" or "2m" (defaults to config)
        #[arg(long)]
        every: Option<String>,
    },

    /// Show recent essays for an account
    #[command(alias = "h")]
    History {
        /// Account email
        #[arg(long)]
        email: String,
        /// Number of entries to show
        #[arg(long, default_value = "10")]
        limit: u64,
        /// Only show drafts
        #[arg(long)]
        drafts: bool,
    },
}

pub use commands::*;
