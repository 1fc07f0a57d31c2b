//! Output formatting for command results and run reports

use barrage_engine::{ProgressView, Run, RunStatus};
use colored::*;
use serde_json::Value;
use std::io::{self, Write};

use crate::commands::CommandOutput;

/// Output formatter for console results
#[derive(Debug, Default)]
pub struct OutputFormatter {
    /// Width of the last progress line, so it can be blanked out
    last_progress: std::cell::Cell<usize>,
}

impl OutputFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Display a command result
    pub fn display(&self, output: CommandOutput) {
        match output {
            CommandOutput::Success { message, data } => {
                self.print_success(&message);
                if let Some(data) = data {
                    self.print_json(&data);
                }
            }
            CommandOutput::Table { headers, rows } => {
                self.print_table(&headers, &rows);
            }
            CommandOutput::Json { data } => {
                self.print_json(&data);
            }
            CommandOutput::Text { content } => {
                println!("{}", content);
            }
            CommandOutput::Report { run } => {
                self.print_run_report(&run);
            }
        }
    }

    pub fn print_success(&self, message: &str) {
        println!("{} {}", "✓".bright_green().bold(), message);
    }

    pub fn print_error(&self, message: &str) {
        eprintln!("{} {}", "✗".bright_red().bold(), message.bright_red());
    }

    pub fn print_warning(&self, message: &str) {
        println!("{} {}", "⚠".bright_yellow().bold(), message.bright_yellow());
    }

    pub fn print_info(&self, message: &str) {
        println!("{} {}", "ℹ".bright_blue().bold(), message);
    }

    /// Print JSON data with formatting
    pub fn print_json(&self, data: &Value) {
        match serde_json::to_string_pretty(data) {
            Ok(formatted) => {
                for line in formatted.lines() {
                    println!("{}", colorize_json_line(line));
                }
            }
            Err(_) => println!("{}", data),
        }
    }

    /// Print a table with headers and rows
    pub fn print_table(&self, headers: &[String], rows: &[Vec<String>]) {
        if headers.is_empty() || rows.is_empty() {
            self.print_info("No data to display");
            return;
        }

        let widths = column_widths(headers, rows);

        print_separator(&widths, ('┌', '┬', '┐'));
        print!("│");
        for (header, width) in headers.iter().zip(&widths) {
            print!(" {} │", pad(header, *width).bright_cyan().bold());
        }
        println!();
        print_separator(&widths, ('├', '┼', '┤'));

        for row in rows {
            print!("│");
            for (i, width) in widths.iter().enumerate() {
                let cell = row.get(i).map(String::as_str).unwrap_or("");
                print!(" {} │", pad(cell, *width));
            }
            println!();
        }
        print_separator(&widths, ('└', '┴', '┘'));
    }

    /// Overwrite the current line with live run progress
    pub fn print_progress(&self, progress: &ProgressView) {
        let line = progress_line(progress);
        let width = line.chars().count();
        let blank = self.last_progress.get().saturating_sub(width);
        print!("\r{} {}{}", "⏳".bright_yellow(), line, " ".repeat(blank));
        self.last_progress.set(width);
        let _ = io::stdout().flush();
    }

    /// Clear the progress line
    pub fn clear_progress(&self) {
        let width = self.last_progress.replace(0);
        if width == 0 {
            return;
        }
        print!("\r{}\r", " ".repeat(width + 3));
        let _ = io::stdout().flush();
    }

    /// Summary of a finished run
    pub fn print_run_report(&self, run: &Run) {
        let status = match run.status {
            RunStatus::Completed => run.status.as_str().bright_green().bold(),
            RunStatus::Cancelled => run.status.as_str().bright_yellow().bold(),
            RunStatus::Failed => run.status.as_str().bright_red().bold(),
            RunStatus::Running => run.status.as_str().bright_blue().bold(),
        };
        let name = if run.is_scratch() {
            "(ad hoc)".to_string()
        } else {
            run.config_name.clone()
        };

        println!("{} {} {}", "Run".bold(), run.id, status);
        println!("  config:  {}", name);
        println!("  request: {}", run.request_file);
        if let Some(ref message) = run.error_message {
            println!("  error:   {}", message.bright_red());
        }

        let headers = vec!["Metric".to_string(), "Value".to_string()];
        self.print_table(&headers, &report_rows(run));
    }
}

/// Rows of the run report table
pub fn report_rows(run: &Run) -> Vec<Vec<String>> {
    let duration = run
        .duration()
        .map(|d| format_duration_ms(d.num_milliseconds().max(0) as u64))
        .unwrap_or_else(|| "-".to_string());

    let row = |metric: &str, value: String| vec![metric.to_string(), value];
    vec![
        row("Duration", duration),
        row("Sent", run.total_requests_sent.to_string()),
        row("Completed", run.total_requests_completed.to_string()),
        row(
            "Successful",
            format!("{} ({:.1}%)", run.success(), run.success_rate()),
        ),
        row("Transport errors", run.total_errors.to_string()),
        row("Validation errors", run.total_validation_errors.to_string()),
        row("Min", format!("{} ms", run.min_duration_ms)),
        row("Avg", format!("{:.1} ms", run.avg_duration_ms)),
        row("Max", format!("{} ms", run.max_duration_ms)),
        row("p50", format!("{} ms", run.p50_duration_ms)),
        row("p95", format!("{} ms", run.p95_duration_ms)),
        row("p99", format!("{} ms", run.p99_duration_ms)),
        row("Throughput", format!("{:.1} req/s", run.requests_per_second)),
    ]
}

/// One-line progress summary
pub fn progress_line(progress: &ProgressView) -> String {
    format!(
        "{} {}/{} sent, {} ok, {} err, {} invalid, {} active ({}/{} ramped), {:.1} req/s, {}",
        progress.state,
        progress.sent,
        progress.total_requests,
        progress.success,
        progress.errors,
        progress.validation_errors,
        progress.active_workers,
        progress.scheduled_workers,
        progress.workers,
        progress.requests_per_second,
        format_duration_ms(progress.elapsed_ms)
    )
}

/// `850ms`, `12.3s`, `4m05s`
pub fn format_duration_ms(ms: u64) -> String {
    if ms < 1_000 {
        format!("{}ms", ms)
    } else if ms < 60_000 {
        format!("{:.1}s", ms as f64 / 1_000.0)
    } else {
        let secs = ms / 1_000;
        format!("{}m{:02}s", secs / 60, secs % 60)
    }
}

fn column_widths(headers: &[String], rows: &[Vec<String>]) -> Vec<usize> {
    let mut widths: Vec<_> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }
    widths
}

fn pad(text: &str, width: usize) -> String {
    format!("{:width$}", text, width = width)
}

fn print_separator(widths: &[usize], (left, middle, right): (char, char, char)) {
    let line = widths
        .iter()
        .map(|&width| "─".repeat(width + 2))
        .collect::<Vec<_>>()
        .join(&middle.to_string());
    println!("{}{}{}", left, line, right);
}

/// Colorize a JSON line for better readability
fn colorize_json_line(line: &str) -> String {
    let trimmed = line.trim_start();
    let indent = &line[..line.len() - trimmed.len()];

    if trimmed.starts_with('"') {
        if let Some(colon) = trimmed.find("\": ") {
            let (key, value) = trimmed.split_at(colon + 2);
            return format!("{}{}{}", indent, key.bright_blue(), value.bright_white());
        }
        return format!("{}{}", indent, trimmed.bright_green());
    }

    let scalar = trimmed.chars().next().is_some_and(|c| c.is_ascii_digit() || c == '-')
        || trimmed.starts_with("true")
        || trimmed.starts_with("false")
        || trimmed.starts_with("null");
    if scalar {
        return format!("{}{}", indent, trimmed.bright_yellow());
    }

    line.to_string()
}
