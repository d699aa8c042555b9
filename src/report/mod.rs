pub mod console;
pub mod html;
pub mod json;
pub mod junit;
pub mod types;

pub use types::{ErrorAnalysis, RunReport, RunSummary};

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Re-render a saved JSON report in another format
pub fn generate_report(results_path: &Path, format: &str, output: Option<&Path>) -> Result<()> {
    let report = json::load(results_path)?;

    match format {
        "json" => json::generate(&report, output),
        "html" => html::generate(&report, output),
        "junit" | "xml" => junit::generate(&report, output),
        _ => anyhow::bail!("Unknown format: {}", format),
    }
}

/// Write the JSON report, plus HTML and JUnit when `all_formats` is set.
/// Returns the path of the JSON file.
pub fn write_reports(
    report: &RunReport,
    output_dir: &Path,
    file_name: &str,
    all_formats: bool,
) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output dir: {}", output_dir.display()))?;

    let json_path = output_dir.join(file_name);
    json::generate(report, Some(&json_path))?;

    if all_formats {
        let stem = json_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "probe_report".to_string());
        html::generate(report, Some(&output_dir.join(format!("{}.html", stem))))?;
        junit::generate(report, Some(&output_dir.join(format!("{}.xml", stem))))?;
    }

    Ok(json_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::state::ProbeSession;

    #[test]
    fn test_write_reports_all_formats() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("reports");
        let report = RunReport::build(ProbeSession::new("run", "smoke", "http://h"));

        let path = write_reports(&report, &out, "probe_report.json", true).unwrap();

        assert_eq!(path, out.join("probe_report.json"));
        assert!(out.join("probe_report.html").exists());
        assert!(out.join("probe_report.xml").exists());
    }

    #[test]
    fn test_generate_report_rejects_unknown_format() {
        let dir = tempfile::tempdir().unwrap();
        let report = RunReport::build(ProbeSession::new("run", "smoke", "http://h"));
        let path = write_reports(&report, dir.path(), "r.json", false).unwrap();

        assert!(generate_report(&path, "pdf", None).is_err());
        assert!(generate_report(&path, "html", Some(&dir.path().join("r.html"))).is_ok());
    }
}
