use super::types::RunReport;
use anyhow::{Context, Result};
use std::path::Path;

/// Write the JSON report to `output`, or stdout when no path is given
pub fn generate(report: &RunReport, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;

    if let Some(path) = output {
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write report: {}", path.display()))?;
        println!("JSON report saved to: {}", path.display());
    } else {
        println!("{}", json);
    }

    Ok(())
}

pub fn load(path: &Path) -> Result<RunReport> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read report: {}", path.display()))?;
    let report = serde_json::from_str(&content)
        .with_context(|| format!("Not a probe report: {}", path.display()))?;
    Ok(report)
}
