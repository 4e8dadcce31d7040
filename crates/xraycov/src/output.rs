//! Output formatting for coverage reports

use facet::Facet;
use owo_colors::OwoColorize;
use xraycov_core::catalog::display_title;
use xraycov_core::{CoverageRef, CoverageReport, TestCase};

use crate::config::AtlassianConfig;

/// Default file name for saved HTML reports
pub const REPORT_FILE_NAME: &str = "test-coverage-report.html";

/// Output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Html,
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "html" => Some(Self::Html),
            "text" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Render a coverage report in the specified format
pub fn render_report(report: &CoverageReport, format: OutputFormat, atlassian: &AtlassianConfig) -> String {
    match format {
        OutputFormat::Html => render_html(report, atlassian),
        OutputFormat::Text => render_text(report, false),
        OutputFormat::Json => render_json(report),
    }
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

const HTML_HEAD: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Test Coverage</title>
<style>
body { font-size: 20px; font-family: system-ui, sans-serif; }
th, td { border: 1px solid #7d7d7d; }
.refs a { font-size: 12px; }
.panel-header {
  background-color: #ccc;
  color: #444;
  padding: 18px;
  width: 100%;
  border: none;
  text-align: left;
  outline: none;
  font-size: 15px;
}
.panel-header:hover { background-color: #7d7d7d; }
.panel { margin: 2% 0 5% 0; padding: 0 18px; width: 100%; overflow: hidden; }
</style>
</head>
<body>
"#;

const HTML_TAIL: &str = "</body>\n</html>\n";

/// Standalone HTML coverage report.
///
/// Grouped into one table per epic when `group_by_epic` is set.
pub fn render_html(report: &CoverageReport, atlassian: &AtlassianConfig) -> String {
    let mut output = String::from(HTML_HEAD);

    output.push_str(&format!(
        "<h1>Overall Test Coverage {}%</h1>\n",
        report.coverage_percent()
    ));

    if atlassian.group_by_epic {
        for epic in report.epic_breakdown() {
            output.push_str(&format!(
                "<button class=\"panel-header\">{} [{}%]</button>\n",
                html_escape(&epic.name),
                epic.percent
            ));
            output.push_str("<table class=\"panel\">\n<thead>\n");
            output.push_str("<th style=\"width:10%\">ID</th>\n<th>Test Case</th>\n<th style=\"width:20%\">Coverage</th>\n");
            output.push_str("</thead>\n<tbody>\n");
            for case in report.cases.iter().filter(|c| epic.cases.contains(&c.key)) {
                push_row(&mut output, report, case, display_title(&case.summary), atlassian);
            }
            output.push_str("</tbody>\n</table>\n");
        }
    } else {
        output.push_str("<table>\n<thead>\n<th>ID</th>\n<th>test case</th>\n<th>covered</th>\n</thead>\n<tbody>\n");
        for case in &report.cases {
            push_row(&mut output, report, case, &case.summary, atlassian);
        }
        output.push_str("</tbody>\n</table>\n");
    }

    output.push_str(HTML_TAIL);
    output
}

fn push_row(
    output: &mut String,
    report: &CoverageReport,
    case: &TestCase,
    title: &str,
    atlassian: &AtlassianConfig,
) {
    output.push_str("<tr>\n");
    output.push_str(&format!(
        "<td><a href=\"{}\">{}</a></td>\n",
        html_escape(&atlassian.browse_url(&case.key)),
        html_escape(&case.key)
    ));
    output.push_str(&format!("<td>{}</td>\n", html_escape(title)));

    let refs = report.references_for(&case.key);
    if refs.is_empty() {
        output.push_str("<td>-</td>\n");
    } else {
        output.push_str("<td><ul class=\"refs\">");
        for r in refs {
            output.push_str(&ref_link(r));
        }
        output.push_str("</ul></td>\n");
    }
    output.push_str("</tr>\n");
}

/// Link to a reference location, relative to the project root
fn ref_link(r: &CoverageRef) -> String {
    let file = r.file.to_string_lossy().replace('\\', "/");
    format!(
        "<li><a href=\"{0}\" data-file=\"{0}\" data-line=\"{1}\">{0}#{1}</a></li>",
        html_escape(&file),
        r.line
    )
}

pub fn render_text(report: &CoverageReport, verbose: bool) -> String {
    let mut output = String::new();

    output.push('\n');
    output.push_str(&format!(
        "{} {} Test Coverage\n",
        "##".bold(),
        report.project.cyan().bold()
    ));
    output.push('\n');

    let percent = report.coverage_percent();
    let percent_str = format!("{}%", percent);
    let color_percent = if percent >= 80 {
        percent_str.green().to_string()
    } else if percent >= 50 {
        percent_str.yellow().to_string()
    } else {
        percent_str.red().to_string()
    };

    output.push_str(&format!(
        "Coverage: {} ({}/{} test cases)\n\n",
        color_percent,
        report.covered_count(),
        report.total()
    ));

    let epics = report.epic_breakdown();
    if !epics.is_empty() {
        output.push_str("Epics:\n");
        for epic in &epics {
            output.push_str(&format!(
                "  {} {}% ({}/{})\n",
                epic.name.cyan(),
                epic.percent,
                epic.covered,
                epic.cases.len()
            ));
        }
        output.push('\n');
    }

    if !report.unknown_references.is_empty() {
        output.push_str(&format!(
            "{} Unknown References ({}):\n",
            "!".red().bold(),
            report.unknown_references.len()
        ));
        for r in &report.unknown_references {
            output.push_str(&format!(
                "  {} {}:{} - no test case {}-{}\n",
                "-".red(),
                r.file.display(),
                r.line,
                report.project,
                r.id.yellow()
            ));
        }
        output.push('\n');
    }

    let uncovered: Vec<_> = report.uncovered().collect();
    if !uncovered.is_empty() {
        output.push_str(&format!(
            "{} Uncovered Test Cases ({}):\n",
            "?".yellow().bold(),
            uncovered.len()
        ));
        for case in uncovered {
            output.push_str(&format!(
                "  {} {} {}\n",
                "-".yellow(),
                case.key,
                case.summary.dimmed()
            ));
        }
        output.push('\n');
    }

    if verbose {
        for case in report.cases.iter().filter(|c| report.is_covered(&c.key)) {
            output.push_str(&format!("  [{}] {}\n", case.key.green(), case.summary));
            for r in report.references_for(&case.key) {
                output.push_str(&format!(
                    "      {}:{}\n",
                    r.file.display().to_string().dimmed(),
                    r.line.to_string().dimmed()
                ));
            }
        }
    }

    output
}

#[derive(Facet)]
struct JsonReport {
    project: String,
    total: usize,
    covered: usize,
    coverage_percent: u32,
    test_cases: Vec<JsonTestCase>,
    unknown_references: Vec<JsonReference>,
}

#[derive(Facet)]
struct JsonTestCase {
    key: String,
    summary: String,
    covered: bool,
    references: Vec<JsonReference>,
}

#[derive(Facet)]
struct JsonReference {
    id: String,
    file: String,
    line: usize,
}

impl From<&CoverageRef> for JsonReference {
    fn from(r: &CoverageRef) -> Self {
        JsonReference {
            id: r.id.clone(),
            file: r.file.display().to_string(),
            line: r.line,
        }
    }
}

pub fn render_json(report: &CoverageReport) -> String {
    let json_report = JsonReport {
        project: report.project.clone(),
        total: report.total(),
        covered: report.covered_count(),
        coverage_percent: report.coverage_percent(),
        test_cases: report
            .cases
            .iter()
            .map(|case| JsonTestCase {
                key: case.key.clone(),
                summary: case.summary.clone(),
                covered: report.is_covered(&case.key),
                references: report
                    .references_for(&case.key)
                    .iter()
                    .map(JsonReference::from)
                    .collect(),
            })
            .collect(),
        unknown_references: report
            .unknown_references
            .iter()
            .map(JsonReference::from)
            .collect(),
    };

    facet_json::to_string_pretty(&json_report).expect("JSON serialization failed")
}
