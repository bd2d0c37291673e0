//! CLI command definitions

use clap::{Parser, ValueEnum};
use docquorum_domain::AnswerType;
use std::path::PathBuf;

/// Output format for decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Decision plus every candidate answer
    Full,
    /// Final answer, confidence and source
    Summary,
    /// JSON output
    Json,
}

impl From<OutputFormat> for docquorum_domain::OutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Full => docquorum_domain::OutputFormat::Full,
            OutputFormat::Summary => docquorum_domain::OutputFormat::Summary,
            OutputFormat::Json => docquorum_domain::OutputFormat::Json,
        }
    }
}

/// Expected shape of the answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AnswerTypeArg {
    /// Yes or no
    Boolean,
    Date,
    Number,
    /// Free text
    Text,
}

impl From<AnswerTypeArg> for AnswerType {
    fn from(arg: AnswerTypeArg) -> Self {
        match arg {
            AnswerTypeArg::Boolean => AnswerType::Boolean,
            AnswerTypeArg::Date => AnswerType::Date,
            AnswerTypeArg::Number => AnswerType::Number,
            AnswerTypeArg::Text => AnswerType::Text,
        }
    }
}

/// CLI arguments for docquorum
#[derive(Parser, Debug)]
#[command(name = "docquorum")]
#[command(author, version, about = "Ask several models about one document and settle on an answer")]
#[command(long_about = r#"
docquorum answers a question about a long document by asking one to three
models independently and reconciling their answers.

The process has three steps:
1. Chunking: the document is split to fit each model's context window
2. Extraction: every provider answers from its most relevant chunks
3. Consensus: answers are compared; disagreements go to the arbitrator

Configuration files are loaded from (in priority order):
1. --config <path>     Explicit config file
2. ./docquorum.toml    Project-level config
3. ~/.config/docquorum/config.toml   Global config
4. DOCQUORUM_* environment variables

Example:
  docquorum policy.txt "Is flood damage covered?" --type boolean
  docquorum lease.txt "When does the lease end?" --type date -o json
"#)]
pub struct Cli {
    /// Document to evaluate
    #[arg(value_name = "DOCUMENT", required_unless_present = "show_config")]
    pub document: Option<PathBuf>,

    /// Question to answer about the document
    #[arg(value_name = "QUESTION", required_unless_present = "show_config")]
    pub question: Option<String>,

    /// Expected answer type
    #[arg(short = 't', long = "type", value_enum, default_value = "text")]
    pub answer_type: AnswerTypeArg,

    /// Output format (overrides [output] format)
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory for daily-rotated log files
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}
