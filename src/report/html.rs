use super::types::RunReport;
use crate::runner::state::ProbeResult;
use anyhow::Result;
use std::path::Path;

/// Generate HTML report
pub fn generate(report: &RunReport, output: Option<&Path>) -> Result<()> {
    let html = generate_html(report);

    if let Some(path) = output {
        std::fs::write(path, html)?;
        println!("HTML report saved to: {}", path.display());
    } else {
        println!("{}", html);
    }

    Ok(())
}

pub fn generate_html(report: &RunReport) -> String {
    let summary = &report.summary;
    let pass_rate = summary.success_rate.unwrap_or(0.0);

    let mut rows_html = String::new();
    for result in &report.results {
        rows_html.push_str(&probe_row(result));
    }
    for skipped in &report.skipped {
        rows_html.push_str(&format!(
            r##"
            <tr class="skipped">
                <td class="icon">○</td>
                <td>{name}</td>
                <td class="method">{method}</td>
                <td class="endpoint">{endpoint}</td>
                <td>-</td>
                <td>-</td>
                <td class="detail">{reason}</td>
            </tr>"##,
            name = html_escape(&skipped.name),
            method = skipped.method.as_str(),
            endpoint = html_escape(&skipped.endpoint),
            reason = html_escape(&skipped.reason),
        ));
    }

    let auth_html = match &report.auth_error {
        Some(err) => format!(
            r##"<div class="auth-error">Login failed: {}</div>"##,
            html_escape(err)
        ),
        None => String::new(),
    };

    let analysis = &report.error_analysis;
    let buckets_html = [
        ("401 Unauthorized", &analysis.unauthorized),
        ("500 Server Error", &analysis.server_error),
        ("Other", &analysis.other),
    ]
    .iter()
    .filter(|(_, bucket)| !bucket.is_empty())
    .map(|(title, bucket)| {
        let items: String = bucket
            .iter()
            .map(|r| {
                format!(
                    "<li><span class=\"method\">{}</span> {}</li>",
                    r.method.as_str(),
                    html_escape(&r.endpoint)
                )
            })
            .collect();
        format!(
            r##"<div class="bucket"><h3>{} ({})</h3><ul>{}</ul></div>"##,
            title,
            bucket.len(),
            items
        )
    })
    .collect::<String>();

    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Probe Report - {suite}</title>
    <style>
        :root {{
            --bg-primary: #0a0f1d;
            --bg-secondary: #141b2d;
            --border: #374151;
            --text-primary: #f9fafb;
            --text-secondary: #9ca3af;
            --green: #10b981;
            --red: #ef4444;
            --yellow: #f59e0b;
            --blue: #3b82f6;
        }}
        body {{
            font-family: system-ui, sans-serif;
            background: var(--bg-primary);
            color: var(--text-primary);
            margin: 0;
            padding: 2rem;
        }}
        h1 {{ margin: 0 0 0.25rem 0; }}
        .meta {{ color: var(--text-secondary); margin-bottom: 1.5rem; }}
        .stats {{ display: flex; gap: 1rem; margin-bottom: 1.5rem; }}
        .stat {{
            background: var(--bg-secondary);
            border: 1px solid var(--border);
            border-radius: 12px;
            padding: 1rem 1.5rem;
            min-width: 120px;
        }}
        .stat-value {{ font-size: 2rem; font-weight: 700; }}
        .stat-label {{ color: var(--text-secondary); font-size: 0.85rem; }}
        .stat.passed .stat-value {{ color: var(--green); }}
        .stat.failed .stat-value {{ color: var(--red); }}
        .stat.skipped .stat-value {{ color: var(--yellow); }}
        .progress {{
            background: var(--bg-secondary);
            border: 1px solid var(--border);
            border-radius: 8px;
            height: 10px;
            overflow: hidden;
            margin-bottom: 1.5rem;
        }}
        .progress-bar {{ background: var(--green); height: 100%; }}
        .auth-error {{
            border: 1px solid var(--red);
            color: var(--red);
            border-radius: 8px;
            padding: 0.75rem 1rem;
            margin-bottom: 1.5rem;
        }}
        table {{ width: 100%; border-collapse: collapse; background: var(--bg-secondary); }}
        th, td {{ padding: 0.5rem 0.75rem; border-bottom: 1px solid var(--border); text-align: left; }}
        th {{ color: var(--text-secondary); font-weight: 500; }}
        .method {{ color: var(--blue); font-family: monospace; }}
        .endpoint {{ font-family: monospace; }}
        .detail {{ color: var(--text-secondary); font-family: monospace; font-size: 0.85rem; }}
        tr.passed .icon {{ color: var(--green); }}
        tr.failed .icon {{ color: var(--red); }}
        tr.skipped .icon {{ color: var(--yellow); }}
        .buckets {{ display: flex; gap: 1rem; margin-top: 1.5rem; }}
        .bucket {{
            background: var(--bg-secondary);
            border: 1px solid var(--border);
            border-radius: 12px;
            padding: 0 1rem;
            flex: 1;
        }}
    </style>
</head>
<body>
    <h1>{suite}</h1>
    <div class="meta">{base_url} &middot; run {run_id} &middot; {started_at} &middot; {duration}</div>
    <div class="stats">
        <div class="stat"><div class="stat-value">{total}</div><div class="stat-label">Total</div></div>
        <div class="stat passed"><div class="stat-value">{passed}</div><div class="stat-label">Passed</div></div>
        <div class="stat failed"><div class="stat-value">{failed}</div><div class="stat-label">Failed</div></div>
        <div class="stat skipped"><div class="stat-value">{skipped}</div><div class="stat-label">Skipped</div></div>
        <div class="stat"><div class="stat-value">{pass_rate:.1}%</div><div class="stat-label">Success Rate</div></div>
    </div>
    <div class="progress"><div class="progress-bar" style="width: {pass_rate:.1}%"></div></div>
    {auth_html}
    <table>
        <thead>
            <tr><th></th><th>Name</th><th>Method</th><th>Endpoint</th><th>Status</th><th>Time</th><th>Detail</th></tr>
        </thead>
        <tbody>{rows_html}
        </tbody>
    </table>
    <div class="buckets">{buckets_html}</div>
</body>
</html>"##,
        suite = html_escape(&report.suite),
        base_url = html_escape(&report.base_url),
        run_id = html_escape(&report.run_id),
        started_at = html_escape(&report.started_at),
        duration = format_duration(summary.total_duration_ms),
        total = summary.total,
        passed = summary.passed,
        failed = summary.failed,
        skipped = summary.skipped,
        pass_rate = pass_rate,
        auth_html = auth_html,
        rows_html = rows_html,
        buckets_html = buckets_html,
    )
}

fn probe_row(result: &ProbeResult) -> String {
    let (icon, class) = if result.success {
        ("✓", "passed")
    } else {
        ("✗", "failed")
    };
    let detail = match &result.error {
        Some(err) => err.as_str(),
        None if result.success => "",
        None => result.response.as_str(),
    };

    format!(
        r##"
            <tr class="{class}">
                <td class="icon">{icon}</td>
                <td>{name}</td>
                <td class="method">{method}</td>
                <td class="endpoint">{endpoint}</td>
                <td>{status}</td>
                <td>{time}</td>
                <td class="detail">{detail}</td>
            </tr>"##,
        class = class,
        icon = icon,
        name = html_escape(&result.name),
        method = result.method.as_str(),
        endpoint = html_escape(&result.endpoint),
        status = result.status_code,
        time = format_duration(result.duration_ms),
        detail = html_escape(detail),
    )
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn format_duration(ms: u64) -> String {
    if ms < 1000 {
        format!("{}ms", ms)
    } else {
        format!("{:.1}s", ms as f64 / 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Method;
    use crate::runner::state::ProbeSession;

    #[test]
    fn test_html_escapes_response_and_lists_buckets() {
        let mut session = ProbeSession::new("run-1", "smoke", "http://h");
        session.record(ProbeResult::from_response(
            "admin",
            "/api/admin/database/fix/test",
            Method::Post,
            500,
            "<b>boom</b>",
            500,
            1500,
        ));
        session.auth_error = Some("rejected".to_string());
        let html = generate_html(&RunReport::build(session));

        assert!(html.contains("&lt;b&gt;boom&lt;/b&gt;"));
        assert!(html.contains("500 Server Error (1)"));
        assert!(html.contains("Login failed: rejected"));
        assert!(html.contains("1.5s"));
    }
}
