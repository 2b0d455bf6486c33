use owo_colors::OwoColorize;
use std::io::IsTerminal;

use crate::record::{test_label, Subject, SubmissionRecord};
use crate::roster::LostTest;
use crate::scoring::{AggregateStats, SchoolStanding, TestWinners};

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Outcome of one pipeline step, shown after its label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Success,
    Fail,
    Skipped,
}

/// Format a step line such as `Loading keys... Success`.
pub fn format_step(label: &str, status: StepStatus, use_colors: bool) -> String {
    let word = match status {
        StepStatus::Success => "Success",
        StepStatus::Fail => "Fail",
        StepStatus::Skipped => "Skipped",
    };
    if !use_colors {
        return format!("{}... {}", label, word);
    }
    match status {
        StepStatus::Success => format!("{}... {}", label, word.green()),
        StepStatus::Fail => format!("{}... {}", label, word.red()),
        StepStatus::Skipped => format!("{}... {}", label, word.yellow()),
    }
}

/// Flagged records with their dataset index, one per line.
pub fn format_record_rows(records: &[SubmissionRecord], flagged: &[usize]) -> String {
    let mut lines = vec![format!(
        "{:>6}  {:>6}  {:>7}  {:<16}  {:>5}",
        "index", "school", "student", "test", "score"
    )];
    for &index in flagged {
        let Some(record) = records.get(index) else {
            continue;
        };
        lines.push(format!(
            "{:>6}  {:>6}  {:>7}  {:<16}  {:>5}",
            index,
            record.school_id,
            record.student_id,
            test_label(record.test),
            record.score
        ));
    }
    lines.join("\n")
}

/// Submissions per test plus a grand total.
pub fn format_test_totals(records: &[SubmissionRecord], use_colors: bool) -> String {
    let mut lines = Vec::new();
    for test in Subject::ALL {
        let count = records.iter().filter(|r| r.test == Some(test)).count();
        lines.push(format!("{:<20}{:>6}", test.name(), count));
    }
    let unknown = records.iter().filter(|r| r.test.is_none()).count();
    if unknown > 0 {
        lines.push(format!("{:<20}{:>6}", test_label(None), unknown));
    }
    let total = format!("{:<20}{:>6}", "Total", records.len());
    if use_colors {
        lines.push(total.bold().to_string());
    } else {
        lines.push(total);
    }
    lines.join("\n")
}

/// Count, max and quantile columns for every test.
pub fn format_aggregates(stats: &AggregateStats) -> String {
    let mut header = format!("{:<18}{:>6}{:>6}", "test", "count", "max");
    for spec in stats.specs() {
        header.push_str(&format!("{:>8}", spec.column));
    }
    let mut lines = vec![header];
    for (test, aggregate) in stats.iter() {
        let mut line = format!("{:<18}{:>6}{:>6}", test.name(), aggregate.count, aggregate.max);
        for spec in stats.specs() {
            match aggregate.quantile(spec.level) {
                Some(value) => line.push_str(&format!("{:>8.2}", value)),
                None => line.push_str(&format!("{:>8}", "-")),
            }
        }
        lines.push(line);
    }
    lines.join("\n")
}

pub fn format_lost_tests(lost: &[LostTest]) -> String {
    if lost.is_empty() {
        return "No lost tests.".to_string();
    }
    let mut lines = vec![format!(
        "{:>6}  {:>7}  {:<24}  {}",
        "school", "student", "name", "test"
    )];
    lines.extend(lost.iter().map(|l| {
        format!(
            "{:>6}  {:>7}  {:<24}  {}",
            l.school_id, l.student_id, l.name, l.test
        )
    }));
    lines.join("\n")
}

/// The first `limit` standings, numbered from 1.
pub fn format_rankings(standings: &[SchoolStanding], limit: usize, use_colors: bool) -> String {
    if standings.is_empty() {
        return "No schools ranked.".to_string();
    }
    standings
        .iter()
        .take(limit)
        .enumerate()
        .map(|(i, s)| {
            let name = s.name.as_deref().unwrap_or("(unknown school)");
            if use_colors {
                format!(
                    "{:>2}. {:<32} {:>4} {:>5}",
                    i + 1,
                    name.bold(),
                    s.school_id.cyan(),
                    s.points
                )
            } else {
                format!("{:>2}. {:<32} {:>4} {:>5}", i + 1, name, s.school_id, s.points)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Winner names grouped by test and bucket.
pub fn format_winners(winners: &[TestWinners]) -> String {
    let mut lines = Vec::new();
    for test in winners {
        lines.push(test.test.to_string());
        for list in &test.lists {
            let names = if list.names.is_empty() {
                "-".to_string()
            } else {
                list.names.join(", ")
            };
            lines.push(format!("  top {}%: {}", list.bucket.percent(), names));
        }
    }
    lines.join("\n")
}
