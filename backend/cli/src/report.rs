//! Terminal rendering for analysis results, history tables and analytics.

use labelguard_core::ComplianceResult;
use labelguard_history::{AnalyticsSummary, HistoryRecord, HistoryStatus};

pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";
pub const DIM: &str = "\x1b[2m";
pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";

/// Check if the terminal supports color output.
pub fn supports_color() -> bool {
    std::env::var("NO_COLOR").is_err()
        && (std::env::var("COLORTERM").is_ok()
            || std::env::var("TERM").map(|t| t != "dumb").unwrap_or(false))
}

fn paint(color: bool, style: &str, text: &str) -> String {
    if color {
        format!("{style}{text}{RESET}")
    } else {
        text.to_string()
    }
}

/// Strip ANSI escape codes from a string.
pub fn strip_ansi(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            for next in chars.by_ref() {
                if next == 'm' {
                    break;
                }
            }
        } else {
            result.push(c);
        }
    }
    result
}

/// Visible column width: ANSI codes removed, counted in characters.
fn display_width(s: &str) -> usize {
    strip_ansi(s).chars().count()
}

fn score_style(score: u8) -> &'static str {
    match score {
        80..=u8::MAX => GREEN,
        60..=79 => YELLOW,
        _ => RED,
    }
}

/// Human-readable compliance report.
pub fn render_result(result: &ComplianceResult, color: bool) -> String {
    let mut out = String::new();
    let score = format!("{}%", result.compliance_score);
    out.push_str(&format!(
        "{} {}\n\n",
        paint(color, BOLD, "Compliance score:"),
        paint(color, score_style(result.compliance_score), &score)
    ));

    for check in &result.compliances {
        let mark = if check.passed {
            paint(color, GREEN, "PASS")
        } else {
            paint(color, RED, "FAIL")
        };
        out.push_str(&format!("  {}  {}\n", mark, check.rule));
        if !check.details.is_empty() {
            out.push_str(&format!("        {}\n", paint(color, DIM, &check.details)));
        }
    }

    if !result.extracted_text.is_empty() {
        out.push_str(&format!("\n{}\n{}\n", paint(color, BOLD, "Extracted text:"), result.extracted_text));
    }
    out
}

/// History records as a left-aligned table.
pub fn render_history(records: &[HistoryRecord], color: bool) -> String {
    let headers = ["Date", "Product", "Score", "Status"];
    let rows: Vec<[String; 4]> = records
        .iter()
        .map(|r| {
            let status = match r.status {
                HistoryStatus::Passed => paint(color, GREEN, "passed"),
                HistoryStatus::Failed => paint(color, RED, "failed"),
            };
            [
                r.date.format("%Y-%m-%d %H:%M").to_string(),
                r.product_name.clone(),
                format!("{}%", r.compliance_score),
                status,
            ]
        })
        .collect();

    let mut widths = headers.map(display_width);
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(display_width(cell));
        }
    }

    let line = |cells: &[String]| {
        let padded: Vec<String> = cells
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let pad = widths[i].saturating_sub(display_width(cell));
                format!("{cell}{}", " ".repeat(pad))
            })
            .collect();
        format!("  {}\n", padded.join("  ").trim_end())
    };

    let mut out = line(&headers.map(|h| paint(color, BOLD, h))[..]);
    out.push_str(&line(&widths.map(|w| "-".repeat(w))[..]));
    for row in &rows {
        out.push_str(&line(&row[..]));
    }
    out
}

pub fn render_analytics(summary: &AnalyticsSummary, color: bool) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", paint(color, BOLD, "Compliance analytics")));
    out.push_str(&format!("  Products analyzed: {}\n", summary.total_products));
    out.push_str(&format!("  Average score:     {}%\n", summary.average_score));
    out.push_str(&format!(
        "  Passed / failed:   {} / {} ({}% pass rate)\n",
        summary.passed_products, summary.failed_products, summary.pass_rate
    ));

    out.push_str("\n  Score distribution:\n");
    for bucket in &summary.score_distribution {
        out.push_str(&format!("    {:>7}  {}\n", bucket.range, "#".repeat(bucket.count)));
    }

    if !summary.at_risk.is_empty() {
        out.push_str(&format!("\n  {}\n", paint(color, RED, "At risk:")));
        for record in &summary.at_risk {
            out.push_str(&format!("    {:>3}%  {}\n", record.compliance_score, record.product_name));
        }
    }
    out
}
