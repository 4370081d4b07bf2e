use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use engine_logging::LogDestination;

#[derive(Debug, Parser, Clone)]
#[command(name = "hirex", version, about = "Tailor a LaTeX resume to a job description")]
pub struct Cli {
    /// Config file (defaults to <config dir>/hirex/config.ron)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Backend base URL, overrides the config file
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Storage file for cached results and preferences
    #[arg(long, global = true)]
    pub storage: Option<PathBuf>,

    /// Where log output goes
    #[arg(long, value_enum, default_value_t = LogTarget::File, global = true)]
    pub log: LogTarget,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogTarget {
    Terminal,
    File,
    Both,
}

impl From<LogTarget> for LogDestination {
    fn from(target: LogTarget) -> Self {
        match target {
            LogTarget::Terminal => LogDestination::Terminal,
            LogTarget::File => LogDestination::File,
            LogTarget::Both => LogDestination::Both,
        }
    }
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Submit a resume and a job description for optimization
    Submit(SubmitArgs),
    /// Show the cached result
    Preview,
    /// Write the cached LaTeX source to a file
    ExportTex {
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Write a cached PDF to a file
    ExportPdf {
        /// Export the humanized variant
        #[arg(long)]
        humanized: bool,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Copy the cached LaTeX source to the clipboard
    Copy,
    /// Clear the cached result (preferences are kept)
    Reset,
    /// Show or change the theme
    Theme {
        #[arg(value_enum)]
        mode: Option<ThemeArg>,
    },
    /// Show or change the default humanize setting
    Humanize {
        #[arg(value_enum)]
        state: Option<Switch>,
    },
    /// Check that the backend is reachable
    Health,
}

#[derive(Debug, Args, Clone)]
pub struct SubmitArgs {
    /// The base resume (.tex)
    #[arg(long)]
    pub resume: PathBuf,

    /// File holding the job description
    #[arg(long, conflicts_with = "jd_text", required_unless_present = "jd_text")]
    pub jd: Option<PathBuf>,

    /// Job description passed inline
    #[arg(long)]
    pub jd_text: Option<String>,

    /// Ask the backend to humanize the bullets (defaults to the saved preference)
    #[arg(long)]
    pub humanize: bool,

    /// Request budget, e.g. `180s` or `3m`
    #[arg(long)]
    pub timeout: Option<humantime::Duration>,

    /// Do not show the result after a successful submission
    #[arg(long)]
    pub no_preview: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ThemeArg {
    Light,
    Dark,
    Toggle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Switch {
    On,
    Off,
}
