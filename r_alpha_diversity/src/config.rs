use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

use crate::measure::Measure;

/// Config
///
/// Configuration info for the program
/// This is generated from the command line arguments
/// Once set it is read only
///
/// rdata - RData file with the phyloseq object (absolute)
/// html - output report (absolute)
/// alpha_out - output alpha diversity table (absolute)
/// var_exp - experiment variable used to aggregate sample diversities
/// measures - alpha diversity indices, in the order requested
/// rscript - Rscript executable
/// template - Rmarkdown report template
/// env - environment overrides for the Rscript process
///
pub struct Config {
    rdata: PathBuf,
    html: PathBuf,
    alpha_out: PathBuf,
    var_exp: String,
    measures: Vec<Measure>,
    rscript: PathBuf,
    template: PathBuf,
    env: Vec<(OsString, OsString)>,
}

impl Config {
    pub fn new(
        rdata: PathBuf,
        html: PathBuf,
        alpha_out: PathBuf,
        var_exp: String,
        measures: Vec<Measure>,
    ) -> Self {
        Self {
            rdata,
            html,
            alpha_out,
            var_exp,
            measures,
            rscript: PathBuf::from("Rscript"),
            template: PathBuf::from("r_alpha_diversity.Rmd"),
            env: Vec::new(),
        }
    }

    pub fn set_rscript<P: AsRef<Path>>(&mut self, p: P) {
        self.rscript = p.as_ref().to_owned()
    }

    pub fn set_template<P: AsRef<Path>>(&mut self, p: P) {
        self.template = p.as_ref().to_owned()
    }

    pub fn set_env(&mut self, env: Vec<(OsString, OsString)>) {
        self.env = env
    }

    pub fn rdata(&self) -> &Path {
        &self.rdata
    }

    pub fn html(&self) -> &Path {
        &self.html
    }

    pub fn alpha_out(&self) -> &Path {
        &self.alpha_out
    }

    pub fn var_exp(&self) -> &str {
        &self.var_exp
    }

    pub fn measures(&self) -> &[Measure] {
        &self.measures
    }

    pub fn rscript(&self) -> &Path {
        &self.rscript
    }

    /// Name of the Rscript program for logging
    pub fn rscript_name(&self) -> String {
        self.rscript
            .file_name()
            .unwrap_or(self.rscript.as_os_str())
            .to_string_lossy()
            .into_owned()
    }

    pub fn template(&self) -> &Path {
        &self.template
    }

    pub fn env(&self) -> &[(OsString, OsString)] {
        &self.env
    }

    /// Rmarkdown intermediate files go next to the report
    pub fn intermediates_dir(&self) -> &Path {
        self.html.parent().unwrap_or(&self.html)
    }
}
