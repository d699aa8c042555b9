use anyhow::{Context, Result};
use colored::Colorize;
use std::path::PathBuf;

use crate::client::ReqwestTransport;
use crate::parser::{load_suites, Suite, DEFAULT_SUITE};
use crate::report::{self, RunReport};
use crate::runner::{ConsoleListener, Harness, Prober};
use crate::utils::config::Config;

/// Options for one `run` invocation, already merged with the config file
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub url: Option<String>,
    pub server: Option<String>,
    pub suite: Option<String>,
    pub phone: Option<String>,
    pub tags: Vec<String>,
    pub output: Option<PathBuf>,
    pub report: bool,
    pub verbose: bool,
}

impl RunOptions {
    pub fn for_url(url: Option<String>) -> Self {
        Self {
            url,
            server: None,
            suite: None,
            phone: None,
            tags: Vec::new(),
            output: None,
            report: false,
            verbose: false,
        }
    }
}

/// Load the selected suites, run each against the resolved target and write
/// the reports. Probe failures are part of the reports; errors are fatal.
pub fn run_probes(options: &RunOptions, config: &Config) -> Result<Vec<RunReport>> {
    let suites = load_suites(options.suite.as_deref().unwrap_or(DEFAULT_SUITE))?;
    let output_dir = options
        .output
        .clone()
        .unwrap_or_else(|| config.output_dir.clone());

    let mut reports = Vec::with_capacity(suites.len());
    for (index, suite) in suites.iter().enumerate() {
        let suite = prepare_suite(suite, options);
        let base_url = resolve_target(&suite, options, config)?;

        if suite.step_count() == 0 {
            log::warn!("Suite '{}' has no steps after tag filtering", suite.name);
        }

        let transport = ReqwestTransport::new().context("Failed to build HTTP client")?;
        let prober = Prober::new(transport, &base_url)
            .with_timeout(config.timeout())
            .with_body_limit(config.body_limit);
        let mut harness = Harness::new(prober);
        harness.subscribe(Box::new(ConsoleListener::new(options.verbose)));

        let report = harness
            .run(&suite)
            .with_context(|| format!("Suite '{}' aborted", suite.name))?;

        report::console::print_summary(&report);

        let file_name = report_file_name(index, suites.len(), &suite.name, &config.report_file);
        let path = report::write_reports(&report, &output_dir, &file_name, options.report)?;
        println!("{} Report: {}", "📄".cyan(), path.display());

        reports.push(report);
    }

    Ok(reports)
}

/// `--url`/`--server` win over the suite's `baseUrl`, which wins over the config
fn resolve_target(suite: &Suite, options: &RunOptions, config: &Config) -> Result<String> {
    match (&options.url, &options.server, &suite.base_url) {
        (None, None, Some(url)) => Ok(url.clone()),
        _ => config.resolve_base_url(options.url.as_deref(), options.server.as_deref()),
    }
}

/// Suites may share a name, so multi-suite runs prefix the run position
fn report_file_name(index: usize, count: usize, suite_name: &str, report_file: &str) -> String {
    if count > 1 {
        format!("{:02}-{}-{}", index + 1, suite_name, report_file)
    } else {
        report_file.to_string()
    }
}

/// Apply tag filtering and the `--phone` override
fn prepare_suite(suite: &Suite, options: &RunOptions) -> Suite {
    let mut suite = suite.select(&options.tags);
    if let (Some(phone), Some(login)) = (&options.phone, suite.login.as_mut()) {
        login.phone = phone.clone();
    }
    suite
}
