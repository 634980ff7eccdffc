use std::io::{self, Write};

use chrono::NaiveDateTime;

const TIME_FORMAT: &str = "%d %b %Y %H:%M:%S";

/// ExecLog
///
/// Execution log recording which software was run, with which
/// arguments, and the external commands it launched
///
pub struct ExecLog<W: Write> {
    wrt: W,
}

impl<W: Write> ExecLog<W> {
    pub fn new(wrt: W) -> Self {
        Self { wrt }
    }

    /// Header for the run: program name and version plus the full command line
    pub fn application(&mut self, software: &str, version: &str, args: &[String]) -> io::Result<()> {
        write!(
            self.wrt,
            "## Application\nSoftware :{} (version : {})\nCommand : {}\n\n",
            software,
            version,
            args.join(" ")
        )?;
        self.wrt.flush()
    }

    /// Record an external command before it is launched
    pub fn command(
        &mut self,
        desc: &str,
        program: &str,
        version: &str,
        cmd_line: &str,
    ) -> io::Result<()> {
        write!(
            self.wrt,
            "# {} ({} version : {})\nCommand:\n\t{}\n\n",
            desc, program, version, cmd_line
        )?;
        self.wrt.flush()
    }

    pub fn start(&mut self, t: &NaiveDateTime) -> io::Result<()> {
        write!(self.wrt, "Execution:\n\tstart: {}\n", t.format(TIME_FORMAT))?;
        self.wrt.flush()
    }

    /// Only called once the command has completed successfully
    pub fn end(&mut self, t: &NaiveDateTime) -> io::Result<()> {
        write!(self.wrt, "\tend:   {}\n\n", t.format(TIME_FORMAT))?;
        self.wrt.flush()
    }

    pub fn into_inner(self) -> W {
        self.wrt
    }
}
