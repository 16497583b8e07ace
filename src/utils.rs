use std::{
    fmt,
    fs::File,
    path::Path,
    process::{Command, Stdio},
    str::FromStr,
};

use anyhow::Context;
use clap::ArgMatches;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    None,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl FromStr for LogLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "error" => Ok(Self::Error),
            "warn" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            _ => Err(anyhow!("invalid log level '{}'", s)),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "none",
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        })
    }
}

impl LogLevel {
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    fn verbosity(&self) -> usize {
        match self {
            Self::None | Self::Error => 0,
            Self::Warn => 1,
            Self::Info => 2,
            Self::Debug => 3,
            Self::Trace => 4,
        }
    }
}

/// Set up logging to stderr from the command line options
pub fn init_log(m: &ArgMatches) {
    let level = m
        .get_one::<LogLevel>("loglevel")
        .copied()
        .unwrap_or(LogLevel::Info);
    let quiet = m.get_flag("quiet") || level.is_none();
    let ts = m
        .get_one::<stderrlog::Timestamp>("timestamp")
        .copied()
        .unwrap_or(stderrlog::Timestamp::Off);

    stderrlog::new()
        .quiet(quiet)
        .verbosity(level.verbosity())
        .timestamp(ts)
        .init()
        .unwrap()
}

/// Run an external command to completion, inheriting stdout and stderr.
/// Fails if the child cannot be launched or exits with a non-zero status.
pub fn run_command(cmd: &mut Command, desc: &str) -> anyhow::Result<()> {
    debug!("Running {:?}", cmd);
    let status = cmd
        .status()
        .with_context(|| format!("Error launching {}", desc))?;
    if status.success() {
        Ok(())
    } else {
        Err(anyhow!("{} failed ({})", desc, status))
    }
}

/// As [`run_command`], but with the child's stdout captured to `path`.
pub fn run_command_stdout_to(cmd: &mut Command, path: &Path, desc: &str) -> anyhow::Result<()> {
    let out = File::create(path)
        .with_context(|| format!("Error creating output file {}", path.display()))?;
    cmd.stdout(Stdio::from(out));
    run_command(cmd, desc)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn log_level_from_str() {
        assert_eq!("info".parse::<LogLevel>().unwrap(), LogLevel::Info);
        assert_eq!("WARN".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert!("chatty".parse::<LogLevel>().is_err());
    }

    #[test]
    fn log_level_none_is_quiet() {
        assert!("none".parse::<LogLevel>().unwrap().is_none());
        assert!(!LogLevel::Error.is_none());
    }
}
