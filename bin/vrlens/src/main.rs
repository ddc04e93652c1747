use vrlens::Revision;
use vrlens::read::LensReaderSettings;
use vrlens::write::LensWriterSettings;

use crate::prelude::*;

#[allow(unused_imports)]
mod prelude {
    pub use std::path::{Path, PathBuf};

    pub use anyhow::{Context, Result as AnyResult, bail};
}

mod cmd {
    pub mod convert;
    pub mod info;
    pub mod merge;
    pub mod to_obj;
    pub mod verify;
    #[cfg(feature = "obj")]
    pub mod from_obj;
}

mod util;

#[derive(clap::Parser, Debug)]
#[command(about = "Tool for working with VR lens model files.")]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,
    /// Operation to perform
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Args, Debug)]
struct CommonArgs {
    /// Print extra info about what the tool is doing
    #[arg(short, long)]
    verbose: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum RevisionArg {
    /// Stride 20, any number of meshes
    A,
    /// Stride 24, first mesh only
    B,
}

#[derive(clap::Args, Debug)]
struct WriteArgs {
    /// File format revision to write
    #[arg(short, long, value_enum, default_value = "a")]
    revision: RevisionArg,
    /// Allow meshes whose indices point past their own vertices
    #[arg(long)]
    no_validate: bool,
}

#[derive(clap::Args, Debug)]
struct ReadArgs {
    /// Fail on bytes after the index block instead of ignoring them
    #[arg(long)]
    strict: bool,
}

#[derive(clap::Args, Debug)]
struct OutputArgs {
    /// Overwrite output file if it exists
    #[arg(short, long)]
    overwrite: bool,
}

#[derive(clap::Args, Debug)]
struct InputPath {
    /// Path to the input file
    in_file: PathBuf,
}

#[derive(clap::Args, Debug)]
struct InputPaths {
    /// Path to the input files
    in_files: Vec<PathBuf>,
}

#[derive(clap::Args, Debug)]
struct OutputPath {
    /// Path where to save the output file
    out_file: PathBuf,
}

#[derive(clap::Args, Debug)]
struct InOutPaths {
    /// Path to the input file
    in_file: PathBuf,
    /// Path to the output file (if unspecified, overwrite the input)
    out_file: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
struct OptOutputPath {
    /// Path where to save the output file (stdout if unspecified)
    out_file: Option<PathBuf>,
}

#[derive(clap::Subcommand, Debug)]
enum CliCommand {
    /// Print information about the tool
    Version,
    /// Show general info about the file
    Info(cmd::info::InfoArgs),
    /// Try decoding the file to check for errors
    Verify(cmd::verify::VerifyArgs),
    /// Rewrite a file using another format revision
    Convert(cmd::convert::ConvertArgs),
    /// Load several files, save a file with their combined geometry
    Merge(cmd::merge::MergeArgs),
    /// Import from OBJ format
    #[cfg(feature = "obj")]
    FromObj(cmd::from_obj::FromObjArgs),
    /// Export to OBJ format
    ToObj(cmd::to_obj::ToObjArgs),
}

impl From<RevisionArg> for Revision {
    fn from(arg: RevisionArg) -> Self {
        match arg {
            RevisionArg::A => Revision::A,
            RevisionArg::B => Revision::B,
        }
    }
}

impl From<&ReadArgs> for LensReaderSettings {
    fn from(args: &ReadArgs) -> Self {
        Self {
            allow_trailing_data: !args.strict,
            ..Default::default()
        }
    }
}

impl From<&WriteArgs> for LensWriterSettings {
    fn from(args: &WriteArgs) -> Self {
        Self {
            revision: args.revision.into(),
            validate_meshes: !args.no_validate,
        }
    }
}

fn run_command(cli: &Cli) -> AnyResult<()> {
    match &cli.command {
        CliCommand::Version => {
            // Verbose always prints version anyway
            if !cli.common.verbose {
                print_version();
            }
            Ok(())
        }
        CliCommand::Info(args) => cmd::info::run(&cli.common, args),
        CliCommand::Verify(args) => cmd::verify::run(&cli.common, args),
        CliCommand::Convert(args) => cmd::convert::run(&cli.common, args),
        CliCommand::Merge(args) => cmd::merge::run(&cli.common, args),
        #[cfg(feature = "obj")]
        CliCommand::FromObj(args) => cmd::from_obj::run(&cli.common, args),
        CliCommand::ToObj(args) => cmd::to_obj::run(&cli.common, args),
    }
}

fn print_version() {
    eprintln!(
        "{} version {}. Works with file format revisions:",
        env!("CARGO_BIN_NAME"),
        env!("CARGO_PKG_VERSION"),
    );
    for rev in Revision::ALL {
        eprintln!("  {}", rev);
    }
    eprintln!();
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    use clap::Parser;
    let cli = Cli::parse();

    init_logging(cli.common.verbose);

    if cli.common.verbose {
        print_version();
    }

    if let Err(e) = run_command(&cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(2);
    }
}
