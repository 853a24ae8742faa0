mod compiler;

use std::{
    fs,
    io::{self, BufWriter, Write},
    path::PathBuf,
};

use anyhow::Context;
use clap::Parser;
use serde::Deserialize;
use session::{CompilerOption, InputFile, Session};
use tracing_subscriber::EnvFilter;

use crate::compiler::Command;

#[derive(Parser, Debug)]
#[clap(name = "brilopt", about = "Analyses and rewrites Bril programs")]
struct CommandLine {
    #[clap(flatten)]
    command_line: Config,
    #[clap(long, value_name = "FILE")]
    /// Path to the config file
    config: Option<PathBuf>,
    #[clap(subcommand)]
    command: Command,
}

#[derive(clap::Args, Deserialize, Debug, Default)]
#[serde(default, deny_unknown_fields)]
struct Config {
    #[clap(short, long, value_name = "FILE")]
    /// Path to the JSON program, read from stdin if absent
    input: Option<PathBuf>,
    #[clap(short, long, value_name = "FILE")]
    /// Path to the output file, stdout if absent
    output: Option<PathBuf>,
    #[clap(
        long,
        value_name = "BOOL",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
    )]
    /// Check the control-flow graph after every pass
    verify: Option<bool>,
    #[clap(
        short,
        long,
        value_name = "BOOL",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
    )]
    /// Log at debug level unless RUST_LOG says otherwise
    verbose: Option<bool>,
}

impl Config {
    fn merge(self, other: Self) -> Self {
        Self {
            input: self.input.or(other.input),
            output: self.output.or(other.output),
            verify: self.verify.or(other.verify),
            verbose: self.verbose.or(other.verbose),
        }
    }
}

fn main() -> anyhow::Result<()> {
    let command_line = CommandLine::parse();

    let config = if let Some(path) = &command_line.config {
        let config = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&config).unwrap_or_else(|error| exit_with(&error.to_string()))
    } else {
        Config::default()
    };
    let config = command_line.command_line.merge(config);

    let level = if config.verbose.unwrap_or(false) { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_writer(io::stderr)
        .without_time()
        .init();

    let input = InputFile::read(config.input.clone()).with_context(|| match &config.input {
        Some(path) => format!("failed to read {}", path.display()),
        None => "failed to read stdin".to_string(),
    })?;
    let session = Session::new(
        input,
        config.output,
        CompilerOption {
            verify: config.verify.unwrap_or(false),
        },
    );

    let mut output: Box<dyn Write> = match &session.output_path {
        Some(path) => Box::new(BufWriter::new(
            fs::File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };
    compiler::run(&session, &command_line.command, &mut output)?;
    output.flush()?;
    Ok(())
}

fn exit_with(message: &str) -> ! {
    <CommandLine as clap::CommandFactory>::command()
        .error(clap::error::ErrorKind::InvalidValue, message)
        .exit();
}
