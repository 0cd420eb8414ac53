use colored::*;
use indicatif::ProgressStyle;
use tracing::Span;
use tracing_indicatif::span_ext::IndicatifSpanExt;

const TICKS: &[&str] = &[
    "▁▁▁▁▁",
    "▁▂▂▂▁",
    "▁▄▂▄▁",
    "▂▄▆▄▂",
    "▄▆█▆▄",
    "▂▄▆▄▂",
    "▁▄▂▄▁",
    "▁▂▂▂▁",
];

pub fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.blue} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(TICKS)
}

/// Attaches a spinner to `span`, shown while the span is entered.
pub fn attach(span: &Span, message: &str) {
    span.pb_set_style(&spinner_style());
    span.pb_set_message(message);
}

pub fn report_probe_progress(span: &Span, checked: usize, total: usize) {
    span.pb_set_message(&format!(
        "Probed {} of {} subdomains for takeovers...",
        checked.to_string().green().bold(),
        total
    ));
}
