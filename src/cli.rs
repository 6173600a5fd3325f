//! Command line interface
//!
//! Options accept one or two leading dashes (`-input` and `--input` are
//! the same). Argv is rewritten into clap's spelling before parsing.

use std::ffi::OsString;
use std::fs;
use std::path::PathBuf;

use clap::error::{ContextKind, ErrorKind};
use clap::{ArgAction, Parser};

use crate::config::{EngineSettings, RunConfig, DEFAULT_VERBOSITY};
use crate::error::{RestoreError, Result};
use crate::loader::ExitStatus;

/// Long options that may also be written with a single dash
const LONG_OPTIONS: &[&str] = &["config", "input", "keep-going", "help", "version"];

/// Short flags that may also be written with two dashes
const SHORT_FLAGS: &[&str] = &["v", "q"];

/// kvrestore
#[derive(Parser, Debug)]
#[command(name = "kvrestore")]
#[command(about = "Replay dump log files back into their keystores")]
#[command(version)]
pub struct Args {
    /// Engine settings file (TOML) overlaid onto the engine defaults
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory searched for *.log dump files [default: .]
    #[arg(long, value_name = "DIR")]
    pub input: Option<PathBuf>,

    /// Continue past a keystore that fails to load
    #[arg(long)]
    pub keep_going: bool,

    /// Increase verbosity (repeatable)
    #[arg(short = 'v', action = ArgAction::Count)]
    pub verbose: u8,

    /// Only report critical messages
    #[arg(short = 'q')]
    pub quiet: bool,
}

impl Args {
    /// Effective verbosity: `-q` wins, otherwise 1 plus one per `-v`
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            DEFAULT_VERBOSITY.saturating_add(self.verbose)
        }
    }

    /// Turn the arguments into a run configuration
    ///
    /// Creates the input directory if it is missing and loads the engine
    /// settings file.
    pub fn resolve(&self) -> Result<RunConfig> {
        let input_dir = self.input.clone().unwrap_or_else(|| PathBuf::from("."));
        fs::create_dir_all(&input_dir).map_err(|e| {
            RestoreError::Config(format!(
                "input directory {} is not usable: {}",
                input_dir.display(),
                e
            ))
        })?;

        let engine = match &self.config {
            Some(path) => EngineSettings::from_file(path)?,
            None => EngineSettings::default(),
        };

        Ok(RunConfig::builder()
            .input_dir(input_dir)
            .keep_going(self.keep_going)
            .verbosity(self.verbosity())
            .engine(engine)
            .build())
    }
}

/// Early termination decided while parsing the command line
#[derive(Debug)]
pub struct CliExit {
    pub status: ExitStatus,
    pub message: String,
}

impl CliExit {
    /// Help and version go to stdout, everything else to stderr
    pub fn print(&self) {
        if self.status.is_success() {
            print!("{}", self.message);
        } else {
            eprintln!("{}", self.message.trim_end());
        }
    }
}

/// Parse argv (program name first)
pub fn parse<I, T>(argv: I) -> std::result::Result<Args, CliExit>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let originals: Vec<OsString> = argv.into_iter().map(Into::into).collect();
    let normalized = normalize_args(&originals);

    Args::try_parse_from(normalized.clone()).map_err(|err| {
        let status = match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitStatus::Success,
            ErrorKind::UnknownArgument => {
                let token = err
                    .get(ContextKind::InvalidArg)
                    .map(|arg| offending_token(&originals, &normalized, &arg.to_string()))
                    .unwrap_or_default();
                return CliExit {
                    status: ExitStatus::Usage,
                    message: format!("unrecognized option: {}", token),
                };
            }
            ErrorKind::InvalidValue | ErrorKind::MissingRequiredArgument => ExitStatus::Startup,
            _ => ExitStatus::Usage,
        };
        CliExit {
            status,
            message: err.render().to_string(),
        }
    })
}

/// Rewrite `-input` into `--input` and `--v` into `-v`
///
/// The first element (program name) and everything after a bare `--` are
/// left alone.
pub fn normalize_args(argv: &[OsString]) -> Vec<OsString> {
    let mut out = Vec::with_capacity(argv.len());
    let mut passthrough = false;

    for (i, arg) in argv.iter().enumerate() {
        if i == 0 || passthrough {
            out.push(arg.clone());
            continue;
        }
        let Some(text) = arg.to_str() else {
            out.push(arg.clone());
            continue;
        };
        if text == "--" {
            passthrough = true;
            out.push(arg.clone());
            continue;
        }

        let rewritten = if let Some(rest) = text.strip_prefix("--") {
            if SHORT_FLAGS.contains(&rest) {
                Some(format!("-{}", rest))
            } else {
                None
            }
        } else if let Some(rest) = text.strip_prefix('-') {
            let name = rest.split('=').next().unwrap_or(rest);
            if LONG_OPTIONS.contains(&name) {
                Some(format!("-{}", text))
            } else {
                None
            }
        } else {
            None
        };

        out.push(rewritten.map(OsString::from).unwrap_or_else(|| arg.clone()));
    }
    out
}

/// Map clap's view of a bad argument back to what the user typed
fn offending_token(originals: &[OsString], normalized: &[OsString], invalid: &str) -> String {
    normalized
        .iter()
        .zip(originals)
        .skip(1)
        .find(|(norm, _)| {
            norm.to_str()
                .is_some_and(|n| n == invalid || (invalid.len() > 1 && n.starts_with(invalid)))
        })
        .map(|(_, original)| original.to_string_lossy().into_owned())
        .unwrap_or_else(|| invalid.to_string())
}
