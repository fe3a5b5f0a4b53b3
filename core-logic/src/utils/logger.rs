use anyhow::{Context, Result};
use chrono::Local;
use nu_ansi_term::{Color, Style};
use std::fmt;
use tracing::{Event, Level, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{format::Writer, FmtContext, FormatEvent, FormatFields},
    prelude::*,
    registry::LookupSpan,
    Layer,
};

/// Crate targets that are shown at INFO on the console.
const AGENT_TARGETS: &[&str] = &["aztec_flush", "core_logic"];

/// Installs the console + rolling file subscriber.
///
/// The returned guard flushes the file writer on drop and must be kept alive
/// for the lifetime of the process.
pub fn setup_logger() -> Result<WorkerGuard> {
    std::fs::create_dir_all("logs").context("Failed to create logs directory")?;

    let file_appender = tracing_appender::rolling::hourly("logs", "flush");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .event_format(FileFormatter)
        .with_filter(agent_filter(Level::INFO, Level::WARN));

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_ansi(true)
        .event_format(TerminalFormatter)
        .with_filter(agent_filter(Level::INFO, Level::WARN));

    tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .context("Failed to install global subscriber")?;

    Ok(guard)
}

fn agent_filter(agent: Level, default: Level) -> tracing_subscriber::filter::Targets {
    AGENT_TARGETS
        .iter()
        .fold(tracing_subscriber::filter::Targets::new(), |targets, t| {
            targets.with_target(*t, agent)
        })
        .with_default(default)
}

// --- Formatters ---

struct MessageVisitor {
    message: String,
}

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        }
    }
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        }
    }
}

fn event_message(event: &Event<'_>) -> String {
    let mut visitor = MessageVisitor {
        message: String::new(),
    };
    event.record(&mut visitor);
    visitor.message
}

/// Highlights outcome keywords so a campaign can be read at a glance.
pub(crate) fn colorize(msg: &str) -> String {
    let palette = [
        ("SUCCESS", Color::LightGreen),
        ("FAILED", Color::LightRed),
        ("SKIPPED", Color::LightYellow),
    ];

    palette.iter().fold(msg.to_string(), |acc, (word, color)| {
        if acc.contains(word) {
            let painted = Style::new().fg(*color).bold().paint(*word).to_string();
            acc.replace(word, &painted)
        } else {
            acc
        }
    })
}

pub struct TerminalFormatter;

impl<S, N> FormatEvent<S, N> for TerminalFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let timestamp = Local::now().format("%H:%M:%S");
        let msg = event_message(event);

        let line = match *event.metadata().level() {
            Level::ERROR => Style::new().fg(Color::Red).paint(msg).to_string(),
            Level::WARN => Style::new().fg(Color::Yellow).paint(msg).to_string(),
            _ => colorize(&msg),
        };

        writeln!(writer, "{} {}", Color::DarkGray.paint(timestamp.to_string()), line)
    }
}

pub struct FileFormatter;

impl<S, N> FormatEvent<S, N> for FileFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        let level = event.metadata().level();

        write!(writer, "{} [{}] ", timestamp, level)?;
        writeln!(writer, "{}", event_message(event))
    }
}
