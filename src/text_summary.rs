//! Text summary builder for CLI output.
//!
//! Formats the two result sections the way the interactive form lists them.

use crate::model::{MatchReport, MatchResult};

/// Pre-formatted lines for text output.
pub(crate) struct TextSummary {
    pub lines: Vec<String>,
}

fn push_section(lines: &mut Vec<String>, title: &str, results: &[MatchResult]) {
    if results.is_empty() {
        return;
    }
    lines.push(format!("{title}:"));
    for r in results {
        lines.push(format!(
            "  {} - {} (score {:.2})",
            display_name(r),
            r.filename,
            r.score
        ));
    }
}

fn display_name(r: &MatchResult) -> &str {
    if r.candidate_name.trim().is_empty() {
        "(unknown)"
    } else {
        r.candidate_name.as_str()
    }
}

pub(crate) fn build_text_summary(report: &MatchReport) -> TextSummary {
    let mut lines = Vec::new();
    lines.push(format!(
        "Mode: {:?} | Resumes: {}",
        report.mode,
        report.files.join(", ")
    ));

    push_section(&mut lines, "Top Matching Resumes", &report.results);
    push_section(&mut lines, "Resumes with Low Match Score", &report.less_score);
    if report.results.is_empty() && report.less_score.is_empty() {
        lines.push("No results returned.".to_string());
    }

    if let Some(path) = report.archive_path.as_ref() {
        lines.push(format!("Top resumes archive: {}", path.display()));
    }

    TextSummary { lines }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MatchMode;

    fn report(results: Vec<MatchResult>, less: Vec<MatchResult>) -> MatchReport {
        MatchReport {
            timestamp_utc: "now".into(),
            base_url: "http://svc".into(),
            mode: MatchMode::Enhanced,
            files: vec!["a.pdf".into(), "b.pdf".into()],
            results,
            less_score: less,
            archive_path: None,
        }
    }

    fn r(name: &str, file: &str, score: f64) -> MatchResult {
        MatchResult {
            candidate_name: name.into(),
            filename: file.into(),
            score,
        }
    }

    #[test]
    fn lists_both_sections() {
        let s = build_text_summary(&report(
            vec![r("Ada Lovelace", "a.pdf", 0.87)],
            vec![r("", "b.pdf", 0.12)],
        ));
        assert_eq!(s.lines[0], "Mode: Enhanced | Resumes: a.pdf, b.pdf");
        assert_eq!(s.lines[1], "Top Matching Resumes:");
        assert_eq!(s.lines[2], "  Ada Lovelace - a.pdf (score 0.87)");
        assert_eq!(s.lines[3], "Resumes with Low Match Score:");
        assert_eq!(s.lines[4], "  (unknown) - b.pdf (score 0.12)");
    }

    #[test]
    fn empty_response_is_not_an_error() {
        let s = build_text_summary(&report(Vec::new(), Vec::new()));
        assert_eq!(s.lines.last().unwrap(), "No results returned.");
    }
}
