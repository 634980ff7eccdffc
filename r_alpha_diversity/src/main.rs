mod cli;
mod config;
mod io;
mod measure;
mod process;
mod rscript;

#[macro_use]
extern crate log;
#[macro_use]
extern crate anyhow;

use std::process::ExitCode;

use anyhow::Context;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            // Rscript failures keep their own exit code
            let code = e
                .downcast_ref::<process::EngineError>()
                .map(|x| x.exit_code())
                .unwrap_or(1);
            ExitCode::from(code)
        }
    }
}

fn run() -> anyhow::Result<()> {
    let (cfg, mut log) =
        cli::handle_cli().with_context(|| "Error processing command line arguments")?;
    process::process(&cfg, &mut log)
}
