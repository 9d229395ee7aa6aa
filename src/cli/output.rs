use crate::{CheckOutcome, Severity, SpellIssue};
use colored::*;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FileReport<'a> {
    pub file: String,
    #[serde(flatten)]
    pub outcome: &'a CheckOutcome,
}

#[derive(Debug, Serialize)]
struct JsonOutput<'a> {
    files_checked: usize,
    total_issues: usize,
    files: &'a [FileReport<'a>],
}

/// Issues of one file, for text output.
pub fn print_issues(file_path: &Path, outcome: &CheckOutcome, colored_output: bool) {
    if outcome.spelling.is_empty() {
        return;
    }

    let file_name = file_path.display().to_string();
    if colored_output {
        println!("\n{}", file_name.bold().underline());
    } else {
        println!("\n{}", file_name);
    }

    for issue in &outcome.spelling {
        println!("{}", format_issue(issue, colored_output));
        if !issue.suggestions.is_empty() {
            println!("{}", format_suggestions(&issue.suggestions, colored_output));
        }
    }
}

fn format_issue(issue: &SpellIssue, colored: bool) -> String {
    let location = format!("{}:{}", issue.line, issue.column);
    let severity = severity_label(issue.severity);
    if colored {
        let severity = match issue.severity {
            Severity::Error => severity.red(),
            Severity::Info => severity.blue(),
            Severity::Hint => severity.dimmed(),
        };
        format!(
            "  {} {} {} {}",
            location.blue().bold(),
            severity,
            issue.word.red().bold(),
            format!("({:.2})", issue.confidence).dimmed()
        )
    } else {
        format!("  {} {} {} ({:.2})", location, severity, issue.word, issue.confidence)
    }
}

fn format_suggestions(suggestions: &[String], colored: bool) -> String {
    if colored {
        let list = suggestions
            .iter()
            .map(|s| s.green().to_string())
            .collect::<Vec<_>>()
            .join(&", ".dimmed().to_string());
        format!("    {} {}", "→".dimmed(), list)
    } else {
        format!("    → {}", suggestions.join(", "))
    }
}

fn severity_label(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "error",
        Severity::Info => "info",
        Severity::Hint => "hint",
    }
}

pub fn print_json(reports: &[FileReport<'_>]) -> serde_json::Result<()> {
    println!("{}", render_json(reports)?);
    Ok(())
}

fn render_json(reports: &[FileReport<'_>]) -> serde_json::Result<String> {
    let output = JsonOutput {
        files_checked: reports.len(),
        total_issues: reports.iter().map(|r| r.outcome.error_count()).sum(),
        files: reports,
    };
    serde_json::to_string_pretty(&output)
}

pub fn print_check_summary(total_issues: usize, files: usize, colored: bool) {
    println!();
    if total_issues == 0 {
        if colored {
            println!("{}", "✓ No spelling errors found!".green().bold());
        } else {
            println!("✓ No spelling errors found!");
        }
        return;
    }

    let issue_word = if total_issues == 1 { "issue" } else { "issues" };
    let file_word = if files == 1 { "file" } else { "files" };
    if colored {
        println!(
            "{} {} {} found in {} {}",
            "✗".red().bold(),
            total_issues.to_string().red().bold(),
            issue_word,
            files,
            file_word
        );
    } else {
        println!("✗ {} {} found in {} {}", total_issues, issue_word, files, file_word);
    }
}
