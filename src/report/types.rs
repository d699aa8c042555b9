use crate::runner::state::{FailureClass, ProbeResult, ProbeSession, SkippedProbe};
use serde::{Deserialize, Serialize};

/// Aggregate record of one run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub run_id: String,
    pub suite: String,
    pub base_url: String,
    pub started_at: String,
    pub finished_at: String,
    pub summary: RunSummary,
    pub error_analysis: ErrorAnalysis,
    pub results: Vec<ProbeResult>,
    #[serde(default)]
    pub skipped: Vec<SkippedProbe>,
    #[serde(default)]
    pub auth_error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Percentage, None when nothing was sent
    pub success_rate: Option<f64>,
    pub total_duration_ms: u64,
}

/// Failed probes grouped by status class. Every failed probe is in exactly one bucket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ErrorAnalysis {
    #[serde(rename = "401Errors")]
    pub unauthorized: Vec<ProbeResult>,
    #[serde(rename = "500Errors")]
    pub server_error: Vec<ProbeResult>,
    #[serde(rename = "otherErrors")]
    pub other: Vec<ProbeResult>,
}

impl ErrorAnalysis {
    pub fn from_results(results: &[ProbeResult]) -> Self {
        let mut analysis = Self::default();
        for result in results {
            match result.failure_class() {
                Some(FailureClass::Unauthorized) => analysis.unauthorized.push(result.clone()),
                Some(FailureClass::ServerError) => analysis.server_error.push(result.clone()),
                Some(FailureClass::Other) => analysis.other.push(result.clone()),
                None => {}
            }
        }
        analysis
    }

    pub fn len(&self) -> usize {
        self.unauthorized.len() + self.server_error.len() + self.other.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RunSummary {
    pub fn from_results(results: &[ProbeResult], skipped: usize, total_duration_ms: u64) -> Self {
        let total = results.len();
        let passed = results.iter().filter(|r| r.success).count();
        Self {
            total,
            passed,
            failed: total - passed,
            skipped,
            success_rate: (total > 0).then(|| passed as f64 / total as f64 * 100.0),
            total_duration_ms,
        }
    }
}

impl RunReport {
    /// Close a session into its report
    pub fn build(session: ProbeSession) -> Self {
        let total_duration_ms = session.elapsed_ms();
        let summary =
            RunSummary::from_results(&session.results, session.skipped.len(), total_duration_ms);
        let error_analysis = ErrorAnalysis::from_results(&session.results);

        Self {
            run_id: session.run_id,
            suite: session.suite_name,
            base_url: session.base_url,
            started_at: session.started_at,
            finished_at: chrono::Local::now().to_rfc3339(),
            summary,
            error_analysis,
            results: session.results,
            skipped: session.skipped,
            auth_error: session.auth_error,
        }
    }
}
