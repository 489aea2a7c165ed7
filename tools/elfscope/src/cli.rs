//! Command-line interface definitions for elfscope.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use elfscope_elf::{DispatchPolicy, ParseOptions};

/// ELF64 file inspector.
#[derive(Parser)]
#[command(name = "elfscope", version, about)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Emit JSON instead of text tables.
    #[arg(long, global = true)]
    pub json: bool,

    /// How section contents are classified.
    #[arg(long, value_enum, default_value_t = Dispatch::ByType, global = true)]
    pub dispatch: Dispatch,

    /// Fail on the first section whose content cannot be decoded.
    #[arg(long, global = true)]
    pub strict: bool,

    /// Suppress warnings about undecodable sections.
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Print decoding diagnostics.
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

impl Cli {
    /// Library options selected by the global flags.
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            dispatch: self.dispatch.into(),
            strict: self.strict,
        }
    }
}

/// Section classification policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Dispatch {
    /// By `sh_type`.
    ByType,
    /// By conventional section name.
    ByName,
}

impl From<Dispatch> for DispatchPolicy {
    fn from(dispatch: Dispatch) -> Self {
        match dispatch {
            Dispatch::ByType => Self::ByType,
            Dispatch::ByName => Self::ByName,
        }
    }
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Command {
    /// Print the file header.
    Header(FileArgs),
    /// Print the program headers and the sections each segment contains.
    Segments(FileArgs),
    /// Print the section headers.
    Sections(FileArgs),
    /// Print every symbol table.
    Symbols(FileArgs),
    /// Print every relocation table.
    Relocs(FileArgs),
    /// Dump the contents of every string table.
    Strings(FileArgs),
    /// Print everything.
    All(FileArgs),
}

impl Command {
    /// The input file of any subcommand.
    pub fn file(&self) -> &PathBuf {
        match self {
            Self::Header(args)
            | Self::Segments(args)
            | Self::Sections(args)
            | Self::Symbols(args)
            | Self::Relocs(args)
            | Self::Strings(args)
            | Self::All(args) => &args.file,
        }
    }
}

/// Arguments shared by every subcommand.
#[derive(Parser)]
pub struct FileArgs {
    /// ELF64 file to inspect.
    pub file: PathBuf,
}
