use std::{
    env,
    io::Write,
    path::{Path, PathBuf},
};

use clap::{
    crate_authors, crate_description, crate_name, crate_version, value_parser, Arg, ArgAction,
    ArgMatches, Command,
};

use anyhow::Context;

use utils::{absolute_path, init_log, ExecLog, LogLevel};

use crate::{config::*, io::open_exec_log, measure::parse_measures, rscript::search_path_env};

const TEMPLATE_NAME: &str = "r_alpha_diversity.Rmd";

/// Set up definition of command options for clap
fn cli_model() -> Command {
    Command::new(crate_name!())
        .about(crate_description!())
        .version(crate_version!())
        .author(crate_authors!())
        .arg(
            Arg::new("timestamp")
                .short('X')
                .long("timestamp")
                .value_parser(value_parser!(stderrlog::Timestamp))
                .value_name("GRANULARITY")
                .default_value("none")
                .help("Prepend log entries with a timestamp"),
        )
        .arg(
            Arg::new("loglevel")
                .long("loglevel")
                .value_name("LOGLEVEL")
                .value_parser(value_parser!(LogLevel))
                .ignore_case(true)
                .default_value("warn")
                .help("Set log level"),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .action(ArgAction::SetTrue)
                .long("quiet")
                .conflicts_with("loglevel")
                .help("Silence all output"),
        )
        .arg(
            Arg::new("var_exp")
                .short('v')
                .long("varExp")
                .value_parser(value_parser!(String))
                .value_name("STRING")
                .required(true)
                .help("The experiment variable used to aggregate sample diversities"),
        )
        .arg(
            Arg::new("alpha_measures")
                .short('m')
                .long("alpha-measures")
                .value_parser(value_parser!(String))
                .value_name("MEASURE")
                .num_args(1..)
                .action(ArgAction::Append)
                .default_values(["Observed", "Chao1", "Shannon", "InvSimpson"])
                .help("The indices of alpha diversity, as separate arguments or a comma separated list. \
                Available indices: Observed, Chao1, Shannon, InvSimpson, Simpson, ACE, Fisher"),
        )
        .arg(
            Arg::new("rdata")
                .short('r')
                .long("rdata")
                .value_parser(value_parser!(PathBuf))
                .value_name("PATH")
                .required(true)
                .help("RData file containing a phyloseq object (from phyloseq import data)"),
        )
        .arg(
            Arg::new("html")
                .short('o')
                .long("html")
                .value_parser(value_parser!(PathBuf))
                .value_name("PATH")
                .default_value("alpha_diversity.html")
                .help("Set output html file"),
        )
        .arg(
            Arg::new("alpha_out")
                .short('a')
                .long("alpha-out")
                .value_parser(value_parser!(PathBuf))
                .value_name("PATH")
                .default_value("alpha_diversity.tsv")
                .help("Set output file for the alpha diversity table"),
        )
        .arg(
            Arg::new("log_file")
                .short('l')
                .long("log-file")
                .value_parser(value_parser!(PathBuf))
                .value_name("PATH")
                .help("Set file for information on executed commands [default: <stdout>]"),
        )
        .arg(
            Arg::new("rscript")
                .long("rscript")
                .value_parser(value_parser!(PathBuf))
                .value_name("PATH")
                .default_value("Rscript")
                .help("Set Rscript executable"),
        )
        .arg(
            Arg::new("template")
                .long("template")
                .value_parser(value_parser!(PathBuf))
                .value_name("PATH")
                .help(format!(
                    "Set Rmarkdown report template [default: {} next to the executable]",
                    TEMPLATE_NAME
                )),
        )
}

/// Handle command line options.  Write the application entry to the
/// execution log and set up Config structure
pub fn handle_cli() -> anyhow::Result<(Config, ExecLog<Box<dyn Write>>)> {
    // Get matches from command line
    let m = cli_model().get_matches();

    // Setup logging
    init_log(&m)?;

    let args: Vec<String> = env::args_os()
        .map(|s| s.to_string_lossy().into_owned())
        .collect();
    let software = args.first().map(|s| s.as_str()).unwrap_or(crate_name!());

    let mut log = open_exec_log(m.get_one::<PathBuf>("log_file").map(|p| p.as_path()))?;
    log.application(software, crate_version!(), &args)
        .with_context(|| "Error writing to log file")?;

    let cwd = env::current_dir().with_context(|| "Could not get current directory")?;
    let exe = env::current_exe().with_context(|| "Could not get path of executable")?;
    let exe_dir = exe.parent().unwrap_or(&cwd);

    let mut cfg = config_from_matches(&m, &cwd, exe_dir)?;
    cfg.set_env(search_path_env(exe_dir, |k| env::var_os(k))?);

    Ok((cfg, log))
}

/// Validate options and build Config.  Relative paths are resolved against cwd
fn config_from_matches(m: &ArgMatches, cwd: &Path, exe_dir: &Path) -> anyhow::Result<Config> {
    debug!("Processing command line options");

    let measures: Vec<&String> = m
        .get_many::<String>("alpha_measures")
        .map(|v| v.collect())
        .unwrap_or_default();
    let measures = parse_measures(&measures)?;
    debug!("Alpha diversity measures: {:?}", measures);

    let path = |id: &str| {
        absolute_path(
            m.get_one::<PathBuf>(id)
                .expect("Missing required or default path"),
            cwd,
        )
    };

    let rdata = path("rdata");
    let html = path("html");
    let alpha_out = path("alpha_out");
    let var_exp = m
        .get_one::<String>("var_exp")
        .expect("Missing experiment variable")
        .clone();

    let mut cfg = Config::new(rdata, html, alpha_out, var_exp, measures);

    // A bare program name is looked up in PATH
    let rscript = m.get_one::<PathBuf>("rscript").expect("Missing default Rscript");
    if rscript.components().count() > 1 {
        cfg.set_rscript(absolute_path(rscript, cwd))
    } else {
        cfg.set_rscript(rscript)
    }

    match m.get_one::<PathBuf>("template") {
        Some(p) => cfg.set_template(absolute_path(p, cwd)),
        None => cfg.set_template(exe_dir.join(TEMPLATE_NAME)),
    }

    Ok(cfg)
}
