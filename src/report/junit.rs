use super::types::RunReport;
use crate::runner::state::{ProbeResult, SkippedProbe};
use anyhow::Result;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;
use std::path::Path;

/// Generate JUnit XML: one testsuite per run, one testcase per probe
pub fn generate_junit_xml(report: &RunReport) -> Result<String> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let summary = &report.summary;
    let tests = (summary.total + summary.skipped).to_string();
    let failures = summary.failed.to_string();
    let skipped = summary.skipped.to_string();
    let time = seconds(summary.total_duration_ms);

    let mut suites_start = BytesStart::new("testsuites");
    suites_start.push_attribute(("name", "lumi-probe-run"));
    suites_start.push_attribute(("tests", tests.as_str()));
    suites_start.push_attribute(("failures", failures.as_str()));
    suites_start.push_attribute(("skipped", skipped.as_str()));
    suites_start.push_attribute(("time", time.as_str()));
    writer.write_event(Event::Start(suites_start))?;

    let mut suite_start = BytesStart::new("testsuite");
    suite_start.push_attribute(("name", report.suite.as_str()));
    suite_start.push_attribute(("id", report.run_id.as_str()));
    suite_start.push_attribute(("tests", tests.as_str()));
    suite_start.push_attribute(("failures", failures.as_str()));
    suite_start.push_attribute(("skipped", skipped.as_str()));
    suite_start.push_attribute(("time", time.as_str()));
    suite_start.push_attribute(("timestamp", report.started_at.as_str()));
    suite_start.push_attribute(("hostname", report.base_url.as_str()));
    writer.write_event(Event::Start(suite_start))?;

    for result in &report.results {
        write_probe_case(&mut writer, &report.suite, result)?;
    }
    for skipped in &report.skipped {
        write_skipped_case(&mut writer, &report.suite, skipped)?;
    }

    writer.write_event(Event::End(BytesEnd::new("testsuite")))?;
    writer.write_event(Event::End(BytesEnd::new("testsuites")))?;

    let xml = String::from_utf8(writer.into_inner().into_inner())?;
    Ok(xml)
}

fn seconds(ms: u64) -> String {
    (ms as f64 / 1000.0).to_string()
}

fn case_name(name: &str, method: &str, endpoint: &str) -> String {
    format!("{} [{} {}]", name, method, endpoint)
}

fn write_probe_case<W: std::io::Write>(
    writer: &mut Writer<W>,
    suite: &str,
    result: &ProbeResult,
) -> Result<()> {
    let name = case_name(&result.name, result.method.as_str(), &result.endpoint);
    let time = seconds(result.duration_ms);

    let mut case_start = BytesStart::new("testcase");
    case_start.push_attribute(("name", name.as_str()));
    case_start.push_attribute(("classname", suite));
    case_start.push_attribute(("time", time.as_str()));
    writer.write_event(Event::Start(case_start))?;

    if !result.success {
        let message = match &result.error {
            Some(err) => err.clone(),
            None => format!("HTTP {}", result.status_code),
        };
        let mut fail_start = BytesStart::new("failure");
        fail_start.push_attribute(("message", message.as_str()));
        fail_start.push_attribute(("type", "HttpStatus"));
        writer.write_event(Event::Start(fail_start))?;
        if !result.response.is_empty() {
            writer.write_event(Event::Text(BytesText::new(&result.response)))?;
        }
        writer.write_event(Event::End(BytesEnd::new("failure")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("testcase")))?;
    Ok(())
}

fn write_skipped_case<W: std::io::Write>(
    writer: &mut Writer<W>,
    suite: &str,
    skipped: &SkippedProbe,
) -> Result<()> {
    let name = case_name(&skipped.name, skipped.method.as_str(), &skipped.endpoint);

    let mut case_start = BytesStart::new("testcase");
    case_start.push_attribute(("name", name.as_str()));
    case_start.push_attribute(("classname", suite));
    case_start.push_attribute(("time", "0"));
    writer.write_event(Event::Start(case_start))?;

    let mut skip = BytesStart::new("skipped");
    skip.push_attribute(("message", skipped.reason.as_str()));
    writer.write_event(Event::Empty(skip))?;

    writer.write_event(Event::End(BytesEnd::new("testcase")))?;
    Ok(())
}

/// Write JUnit XML to a file or stdout
pub fn generate(report: &RunReport, output: Option<&Path>) -> Result<()> {
    let xml = generate_junit_xml(report)?;
    match output {
        Some(path) => {
            std::fs::write(path, xml)?;
            println!("JUnit report saved to: {}", path.display());
        }
        None => println!("{}", xml),
    }
    Ok(())
}
