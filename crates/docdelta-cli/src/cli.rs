use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "docdelta",
    about = "Compare file trees, text, structured XML, and paginated documents",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// TOML configuration file
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Compare two directory trees (or two files) by content hash
    Tree(TreeArgs),
    /// Compare two files with the strategy for their content type
    File(FileArgs),
    /// Show how a file would be compared
    Classify(ClassifyArgs),
    /// Print the effective configuration as TOML
    Config(ConfigArgs),
}

#[derive(Args)]
pub struct TreeArgs {
    pub left: PathBuf,
    pub right: PathBuf,
    /// Skip paths containing this substring (repeatable)
    #[arg(long, value_name = "PAT")]
    pub exclude: Vec<String>,
    /// Only partition paths; do not compare the content of changed files
    #[arg(long)]
    pub no_content: bool,
}

#[derive(Args)]
pub struct FileArgs {
    pub left: PathBuf,
    pub right: PathBuf,
    /// Write page composites to DIR/<run-id>/page-NNN.png
    #[arg(long, value_name = "DIR")]
    pub out: Option<PathBuf>,
}

#[derive(Args)]
pub struct ClassifyArgs {
    pub path: PathBuf,
}

#[derive(Args)]
pub struct ConfigArgs {}
