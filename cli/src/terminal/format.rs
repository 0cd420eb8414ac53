use std::time::Duration;

use colored::*;
use subtake_core::pipeline::SourceReport;

use crate::terminal::colors;

type Detail = (String, ColoredString);

pub fn source_to_detail(report: &SourceReport) -> Detail {
    let value = match &report.error {
        Some(reason) => reason.color(colors::FAILURE),
        None => format!(
            "{} found, {} new",
            report.found,
            report.new.to_string().color(colors::HOSTNAME).bold()
        )
        .color(colors::TEXT_DEFAULT),
    };
    (report.name.clone(), value)
}

pub fn elapsed(duration: Duration) -> ColoredString {
    format!("{:.2}s", duration.as_secs_f64()).bold().yellow()
}

pub fn count(n: usize, singular: &str, plural: &str) -> String {
    let unit = if n == 1 { singular } else { plural };
    format!("{n} {unit}")
}
