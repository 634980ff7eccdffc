use std::{
    borrow::Cow,
    ffi::OsString,
    fmt,
    path::{Path, PathBuf},
    process::Command,
};

use utils::prepend_search_path;

use crate::{config::Config, measure::join_measures};

/// Prints the R, rmarkdown and phyloseq versions, one R value per line
const VERSION_EXPR: &str = r#"(sessionInfo()[[1]][13])[[1]][1]; paste("Rmarkdown version: ",packageVersion("rmarkdown")) ; library(phyloseq); paste("Phyloseq version: ",packageVersion("phyloseq"))"#;

/// RCommand
///
/// A single Rscript invocation: program, argument list and the
/// environment overrides for the child.  No shell is involved.
///
pub struct RCommand {
    program: PathBuf,
    args: Vec<String>,
    env: Vec<(OsString, OsString)>,
}

impl RCommand {
    fn new(cfg: &Config, expr: String) -> Self {
        Self {
            program: cfg.rscript().to_owned(),
            args: vec!["-e".to_string(), expr],
            env: cfg.env().to_vec(),
        }
    }

    /// Render the report template with the parameters from cfg
    pub fn render(cfg: &Config) -> anyhow::Result<Self> {
        let expr = format!(
            "rmarkdown::render({},output_file={}, params=list(data={}, measures={}, varExp={},fileAlpha={}), intermediates_dir={})",
            r_path(cfg.template())?,
            r_path(cfg.html())?,
            r_path(cfg.rdata())?,
            r_string(&join_measures(cfg.measures())),
            r_string(cfg.var_exp()),
            r_path(cfg.alpha_out())?,
            r_path(cfg.intermediates_dir())?,
        );
        Ok(Self::new(cfg, expr))
    }

    /// Query the versions of R and the packages used by the report
    pub fn version_query(cfg: &Config) -> Self {
        Self::new(cfg, VERSION_EXPR.to_string())
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn to_command(&self) -> Command {
        let mut c = Command::new(&self.program);
        c.args(&self.args)
            .envs(self.env.iter().map(|(k, v)| (k.as_os_str(), v.as_os_str())));
        c
    }
}

/// Shell style rendering, for the execution log only
impl fmt::Display for RCommand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", shell_quote(&self.program.to_string_lossy()))?;
        for a in self.args.iter() {
            write!(f, " {}", shell_quote(a))?
        }
        Ok(())
    }
}

fn shell_quote(s: &str) -> Cow<str> {
    let plain = |c: char| c.is_ascii_alphanumeric() || "_-./:=,+@%".contains(c);
    if !s.is_empty() && s.chars().all(plain) {
        Cow::Borrowed(s)
    } else {
        Cow::Owned(format!("'{}'", s.replace('\'', r"'\''")))
    }
}

/// Single quoted R string literal
pub fn r_string(s: &str) -> String {
    let mut t = String::with_capacity(s.len() + 2);
    t.push('\'');
    for c in s.chars() {
        match c {
            '\\' => t.push_str(r"\\"),
            '\'' => t.push_str(r"\'"),
            '\n' => t.push_str(r"\n"),
            '\r' => t.push_str(r"\r"),
            '\t' => t.push_str(r"\t"),
            c => t.push(c),
        }
    }
    t.push('\'');
    t
}

fn r_path(p: &Path) -> anyhow::Result<String> {
    p.to_str()
        .map(r_string)
        .ok_or_else(|| anyhow!("Path {} is not valid UTF-8", p.display()))
}

/// Environment for the Rscript process
///
/// `<install>/libexec` goes in front of PATH and `<install>/lib` in
/// front of R_LIBS, where `<install>` is the parent of the directory
/// holding the executable.  Current values are obtained from `lookup`.
pub fn search_path_env<F>(exe_dir: &Path, lookup: F) -> anyhow::Result<Vec<(OsString, OsString)>>
where
    F: Fn(&str) -> Option<OsString>,
{
    let install = exe_dir.parent().unwrap_or(exe_dir);
    let mut v = Vec::with_capacity(2);
    for (var, sub) in [("PATH", "libexec"), ("R_LIBS", "lib")] {
        let s = prepend_search_path(&install.join(sub), lookup(var).as_deref())?;
        trace!("{}={}", var, s.to_string_lossy());
        v.push((OsString::from(var), s))
    }
    Ok(v)
}

/// Extract the version strings from the output of the version query
///
/// Each line is an R value such as `[1] "Rmarkdown version:  2.25"`;
/// the index and quotes are dropped and the values joined with `; `
pub fn parse_version_output(s: &str) -> Option<String> {
    let v: Vec<_> = s
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .map(unwrap_r_value)
        .collect();
    if v.is_empty() {
        None
    } else {
        Some(v.join("; "))
    }
}

fn unwrap_r_value(l: &str) -> &str {
    let l = l
        .strip_prefix('[')
        .and_then(|r| r.find(']').map(|i| r[i + 1..].trim_start()))
        .unwrap_or(l);
    l.strip_prefix('"')
        .and_then(|r| r.strip_suffix('"'))
        .unwrap_or(l)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::measure::Measure;

    fn test_cfg() -> Config {
        let mut cfg = Config::new(
            PathBuf::from("/data/in.rdata"),
            PathBuf::from("/out/report.html"),
            PathBuf::from("/out/alpha.tsv"),
            "EnvType".to_string(),
            vec![Measure::Observed, Measure::Shannon],
        );
        cfg.set_template("/opt/tool/bin/r_alpha_diversity.Rmd");
        cfg.set_env(vec![(OsString::from("R_LIBS"), OsString::from("/opt/tool/lib"))]);
        cfg
    }

    #[test]
    fn render_expression() {
        let cmd = RCommand::render(&test_cfg()).unwrap();
        assert_eq!(cmd.program(), Path::new("Rscript"));
        assert_eq!(
            cmd.args(),
            &[
                "-e".to_string(),
                "rmarkdown::render('/opt/tool/bin/r_alpha_diversity.Rmd',output_file='/out/report.html', \
                 params=list(data='/data/in.rdata', measures='Observed,Shannon', varExp='EnvType',\
                 fileAlpha='/out/alpha.tsv'), intermediates_dir='/out')"
                    .to_string()
            ]
        );
    }

    #[test]
    fn render_escapes_quotes() {
        let mut cfg = Config::new(
            PathBuf::from("/data/it's.rdata"),
            PathBuf::from("/out/report.html"),
            PathBuf::from("/out/alpha.tsv"),
            r"Env'), system('rm'), x=('\".to_string(),
            vec![Measure::Chao1],
        );
        cfg.set_template("/t.Rmd");
        let cmd = RCommand::render(&cfg).unwrap();
        let expr = &cmd.args()[1];
        assert!(expr.contains(r"data='/data/it\'s.rdata'"));
        assert!(expr.contains(r"varExp='Env\'), system(\'rm\'), x=(\'\\'"));
    }

    #[test]
    fn command_carries_env() {
        let cmd = RCommand::version_query(&test_cfg());
        let c = cmd.to_command();
        let envs: Vec<_> = c.get_envs().collect();
        assert_eq!(
            envs,
            vec![(
                std::ffi::OsStr::new("R_LIBS"),
                Some(std::ffi::OsStr::new("/opt/tool/lib"))
            )]
        );
        assert_eq!(cmd.args()[0], "-e");
        assert_eq!(cmd.args()[1], VERSION_EXPR);
    }

    #[test]
    fn display_is_shell_quoted() {
        let cmd = RCommand::render(&test_cfg()).unwrap();
        let s = cmd.to_string();
        assert!(s.starts_with("Rscript -e 'rmarkdown::render('\\''/opt/tool/bin/"));
        assert_eq!(shell_quote("Rscript"), "Rscript");
        assert_eq!(shell_quote(""), "''");
        assert_eq!(shell_quote("a b"), "'a b'");
    }

    #[test]
    fn r_string_literal() {
        assert_eq!(r_string("EnvType"), "'EnvType'");
        assert_eq!(r_string(r"a\b'c"), r"'a\\b\'c'");
        assert_eq!(r_string("a\nb"), r"'a\nb'");
    }

    #[test]
    fn env_prepends_install_dirs() {
        let lookup = |k: &str| match k {
            "PATH" => Some(OsString::from("/usr/bin:/bin")),
            _ => None,
        };
        let env = search_path_env(Path::new("/opt/tool/bin"), lookup).unwrap();
        assert_eq!(
            env,
            vec![
                (
                    OsString::from("PATH"),
                    OsString::from("/opt/tool/libexec:/usr/bin:/bin")
                ),
                (OsString::from("R_LIBS"), OsString::from("/opt/tool/lib")),
            ]
        );
    }

    #[test]
    fn version_output() {
        let out = "[1] \"R version 4.3.1 (2023-06-16)\"\n\
                   [1] \"Rmarkdown version:  2.25\"\n\
                   [1] \"Phyloseq version:  1.46.0\"\n";
        assert_eq!(
            parse_version_output(out).unwrap(),
            "R version 4.3.1 (2023-06-16); Rmarkdown version:  2.25; Phyloseq version:  1.46.0"
        );
        assert_eq!(parse_version_output("plain\n").unwrap(), "plain");
        assert!(parse_version_output("\n  \n").is_none());
    }
}
