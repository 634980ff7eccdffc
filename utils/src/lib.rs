use std::{
    env,
    ffi::{OsStr, OsString},
    fmt,
    path::{Component, Path, PathBuf},
    str::FromStr,
};

use anyhow::Context;
use clap::ArgMatches;

mod exec_log;

pub use exec_log::ExecLog;

/// LogLevel
///
/// Represents minimum level of messages that will be logged
///
#[derive(Debug, Clone, Copy)]
pub struct LogLevel {
    pub level: usize,
}

impl FromStr for LogLevel {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" => Ok(LogLevel { level: 0 }),
            "warn" => Ok(LogLevel { level: 1 }),
            "info" => Ok(LogLevel { level: 2 }),
            "debug" => Ok(LogLevel { level: 3 }),
            "trace" => Ok(LogLevel { level: 4 }),
            "none" => Ok(LogLevel { level: 5 }),
            _ => Err("no match"),
        }
    }
}

impl LogLevel {
    pub fn is_none(&self) -> bool {
        self.level > 4
    }
    pub fn get_level(&self) -> usize {
        if self.level > 4 {
            0
        } else {
            self.level
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let level_str = ["error", "warn", "info", "debug", "trace", "none"];
        if self.level < 6 {
            write!(f, "{}", level_str[self.level])
        } else {
            write!(f, "unknown")
        }
    }
}

/// Initialize diagnostic logging (to stderr) from command line arguments
pub fn init_log(m: &ArgMatches) -> anyhow::Result<()> {
    let verbose = m
        .get_one::<LogLevel>("loglevel")
        .copied()
        .unwrap_or(LogLevel { level: 2 });
    let quiet = verbose.is_none() || m.get_flag("quiet");
    let ts = m
        .get_one::<stderrlog::Timestamp>("timestamp")
        .copied()
        .unwrap_or(stderrlog::Timestamp::Off);

    stderrlog::new()
        .quiet(quiet)
        .verbosity(verbose.get_level())
        .timestamp(ts)
        .init()
        .with_context(|| "Could not initialize logging")
}

/// Make `p` absolute by joining it to `cwd` if required, then remove `.`
/// components and resolve `..` lexically.  Symbolic links are not followed
/// and the path does not have to exist.
pub fn absolute_path<P: AsRef<Path>, Q: AsRef<Path>>(p: P, cwd: Q) -> PathBuf {
    let p = p.as_ref();
    let joined = if p.is_absolute() {
        p.to_owned()
    } else {
        cwd.as_ref().join(p)
    };
    let mut out = PathBuf::new();
    for c in joined.components() {
        match c {
            Component::CurDir => (),
            // pop() is a no-op at the root, so /.. stays at /
            Component::ParentDir => {
                out.pop();
            }
            c => out.push(c),
        }
    }
    out
}

/// Build a search path variable value with `dir` in front of the entries of `current`
pub fn prepend_search_path(dir: &Path, current: Option<&OsStr>) -> anyhow::Result<OsString> {
    let mut v = vec![dir.to_owned()];
    if let Some(s) = current {
        v.extend(env::split_paths(s).filter(|p| !p.as_os_str().is_empty()))
    }
    env::join_paths(v).with_context(|| format!("Could not add {} to search path", dir.display()))
}
