use super::types::RunReport;
use crate::runner::state::ProbeResult;
use colored::Colorize;

/// Print the end-of-run summary with failures grouped by status class
pub fn print_summary(report: &RunReport) {
    let summary = &report.summary;

    println!("\n{}", "=".repeat(60));
    println!("{}", "Probe Summary".bold());
    println!("{}", "=".repeat(60));
    println!("  Suite:        {}", report.suite.cyan());
    println!("  Total:        {}", summary.total);
    println!("  Passed:       {}", summary.passed.to_string().green());
    println!("  Failed:       {}", summary.failed.to_string().red());
    if summary.skipped > 0 {
        println!("  Skipped:      {}", summary.skipped.to_string().yellow());
    }
    match summary.success_rate {
        Some(rate) => println!("  Success rate: {:.1}%", rate),
        None => println!("  Success rate: n/a"),
    }
    println!("  Duration:     {}ms", summary.total_duration_ms);

    if let Some(err) = &report.auth_error {
        println!("\n{} {}", "Login failed:".red().bold(), err);
    }

    let analysis = &report.error_analysis;
    if analysis.is_empty() {
        return;
    }

    println!("\n{}", "Failed endpoints".bold());
    print_bucket("401 Unauthorized", &analysis.unauthorized);
    print_bucket("500 Internal Server Error", &analysis.server_error);
    print_bucket("Other errors", &analysis.other);
}

fn print_bucket(title: &str, bucket: &[ProbeResult]) {
    if bucket.is_empty() {
        return;
    }
    println!("  {} ({})", title.yellow(), bucket.len());
    for result in bucket {
        let status = if result.status_code == 0 {
            "no response".to_string()
        } else {
            result.status_code.to_string()
        };
        println!(
            "    - {} {} [{}]",
            result.method.as_str(),
            result.endpoint,
            status
        );
    }
}
