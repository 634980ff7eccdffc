use std::{
    io::Write,
    process::{ExitStatus, Stdio},
};

use anyhow::Context;
use chrono::Local;
use thiserror::Error;
use utils::ExecLog;

use crate::{
    config::Config,
    rscript::{parse_version_output, RCommand},
};

const DESCRIPTION: &str = "Run 1 code Rmarkdown";

/// Rscript ran but did not succeed
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{program} exited with status {code}")]
    Exit { program: String, code: i32 },
    #[error("{program} was terminated by signal {signal}")]
    Signal { program: String, signal: i32 },
}

impl EngineError {
    /// Exit code for this process.  Never 0
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Exit { code, .. } => match u8::try_from(*code) {
                Ok(0) | Err(_) => 1,
                Ok(c) => c,
            },
            Self::Signal { signal, .. } => u8::try_from(128 + *signal).unwrap_or(1),
        }
    }
}

/// Strategy
///
/// Build the render command, look up the R and package versions and
/// record both in the execution log, then run Rscript once.  The end
/// time is only logged if Rscript succeeds.
pub fn process<W: Write>(cfg: &Config, log: &mut ExecLog<W>) -> anyhow::Result<()> {
    debug!("Starting processing");

    let cmd = RCommand::render(cfg).with_context(|| "Could not build Rscript command")?;
    let version = engine_version(cfg);
    debug!("Rscript version: {}", version);

    log.command(DESCRIPTION, &cfg.rscript_name(), &version, &cmd.to_string())
        .with_context(|| "Error writing to log file")?;
    log.start(&Local::now().naive_local())
        .with_context(|| "Error writing to log file")?;

    execute(&cmd)?;

    log.end(&Local::now().naive_local())
        .with_context(|| "Error writing to log file")?;
    debug!("Report written to {}", cfg.html().display());
    Ok(())
}

/// Run cmd to completion.  stderr is discarded and stdout only shown
/// at debug level
pub fn execute(cmd: &RCommand) -> anyhow::Result<()> {
    let program = cmd.program().to_string_lossy().into_owned();
    debug!("Running {}", cmd);
    let output = cmd
        .to_command()
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .with_context(|| format!("Could not launch {}", program))?;

    for l in String::from_utf8_lossy(&output.stdout).lines() {
        debug!("{}: {}", program, l)
    }
    check_status(program, output.status)?;
    Ok(())
}

fn check_status(program: String, status: ExitStatus) -> Result<(), EngineError> {
    if status.success() {
        Ok(())
    } else if let Some(code) = status.code() {
        Err(EngineError::Exit { program, code })
    } else {
        Err(EngineError::Signal {
            program,
            signal: signal_of(&status),
        })
    }
}

#[cfg(unix)]
fn signal_of(status: &ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status.signal().unwrap_or(0)
}

#[cfg(not(unix))]
fn signal_of(_status: &ExitStatus) -> i32 {
    0
}

/// Versions of R, rmarkdown and phyloseq, or "unknown"
fn engine_version(cfg: &Config) -> String {
    let cmd = RCommand::version_query(cfg);
    match cmd
        .to_command()
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
    {
        Ok(o) if o.status.success() => {
            parse_version_output(&String::from_utf8_lossy(&o.stdout)).unwrap_or_else(|| {
                warn!("No version information returned by {}", cmd.program().display());
                "unknown".to_string()
            })
        }
        Ok(o) => {
            warn!("Version query failed ({})", o.status);
            "unknown".to_string()
        }
        Err(e) => {
            warn!("Could not run {}: {}", cmd.program().display(), e);
            "unknown".to_string()
        }
    }
}
