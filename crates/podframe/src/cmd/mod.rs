use clap::{Args, Subcommand};
use std::path::PathBuf;

use podframe_buffer::{BufferConfig, HeaderMode, DEFAULT_INITIAL_CAPACITY, DEFAULT_MAX_CAPACITY};

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod demo;
pub mod encode;
pub mod inspect;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write sample blocks, move them through base64 and read them back.
    Demo(DemoArgs),
    /// Build blocks from field lists and print the base64 transport text.
    Encode(EncodeArgs),
    /// Decode base64 transport text and list its blocks.
    Inspect(InspectArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Demo(args) => demo::run(args, format),
        Command::Encode(args) => encode::run(args, format),
        Command::Inspect(args) => inspect::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// Buffer layout flags shared by every subcommand that builds or reads a
/// buffer. Both ends must use the same layout.
#[derive(Args, Debug, Clone)]
pub struct BufferArgs {
    /// Fixed id length in bytes (max 64). Ignored with --variable.
    #[arg(long, default_value_t = 4)]
    pub header_len: usize,
    /// Use null-terminated ids of any length instead of fixed ones.
    #[arg(long)]
    pub variable: bool,
    /// Initial buffer allocation in bytes.
    #[arg(long, default_value_t = DEFAULT_INITIAL_CAPACITY)]
    pub initial_capacity: usize,
    /// Growth ceiling in bytes.
    #[arg(long, default_value_t = DEFAULT_MAX_CAPACITY)]
    pub max_capacity: usize,
}

impl BufferArgs {
    pub fn config(&self) -> BufferConfig {
        let header_mode = if self.variable {
            HeaderMode::Variable
        } else {
            HeaderMode::fixed(self.header_len)
        };
        BufferConfig {
            initial_capacity: self.initial_capacity,
            header_mode,
            max_capacity: self.max_capacity,
        }
    }
}

#[derive(Args, Debug)]
pub struct DemoArgs {
    #[command(flatten)]
    pub buffer: BufferArgs,
    /// Number of sample blocks to write.
    #[arg(long, default_value_t = 2)]
    pub blocks: u16,
    /// Dump the writer's whole allocated region to this file.
    #[arg(long, value_name = "PATH")]
    pub dump: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    #[command(flatten)]
    pub buffer: BufferArgs,
    /// Block as ID=FIELDS, FIELDS being comma-separated kind:value items
    /// or `null` (e.g. dev1=i32:4096,u8:97,null,f32:3.14). Repeatable.
    #[arg(long = "block", value_name = "ID=FIELDS", required = true)]
    pub blocks: Vec<String>,
    /// Dump the whole allocated region to this file.
    #[arg(long, value_name = "PATH")]
    pub dump: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    #[command(flatten)]
    pub buffer: BufferArgs,
    /// Base64 transport text. Read from stdin when neither this nor --file is given.
    #[arg(conflicts_with = "file")]
    pub text: Option<String>,
    /// Read the base64 transport text from a file.
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,
    /// Field kinds of every block (comma-separated, e.g. i32,u8,str,u8,f32).
    #[arg(long, value_delimiter = ',')]
    pub kinds: Option<Vec<String>>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
