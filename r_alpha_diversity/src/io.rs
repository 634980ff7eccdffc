use std::{
    fs::OpenOptions,
    io::{BufWriter, Write},
    path::Path,
};

use anyhow::Context;
use compress_io::compress::CompressIo;
use utils::ExecLog;

/// Open the execution log.  With no path the log goes to stdout.
/// An existing log file is appended to so earlier entries from a
/// pipeline are kept
pub fn open_exec_log(p: Option<&Path>) -> anyhow::Result<ExecLog<Box<dyn Write>>> {
    let wrt: Box<dyn Write> = match p {
        Some(p) => {
            trace!("Opening execution log {} for appending", p.display());
            let f = OpenOptions::new()
                .create(true)
                .append(true)
                .open(p)
                .with_context(|| format!("Failed to open log file {}", p.display()))?;
            Box::new(BufWriter::new(f))
        }
        None => {
            trace!("Execution log to stdout");
            let wrt = CompressIo::new()
                .bufwriter()
                .with_context(|| "Failed to open standard output for logging")?;
            Box::new(wrt)
        }
    };
    Ok(ExecLog::new(wrt))
}
