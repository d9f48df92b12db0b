//! Console and log-file rendering of cider's tracing events.
//!
//! Events are classified by target: stage headers, per-item outcomes
//! (`cider::changed`, `cider::satisfied`, `cider::conflict`,
//! `cider::failed`) and summary rows (`cider::summary`, with a `status`
//! field).  Anything else falls back to its level.
use std::fs;
use std::io::Write as _;
use std::sync::Mutex;

use tracing::Level;

use super::types::TaskStatus;
use super::utils::{format_utc_datetime, format_utc_time, log_file_path, strip_ansi};

pub(super) const STAGE: &str = "cider::stage";
pub(super) const SUMMARY: &str = "cider::summary";
pub(super) const CHANGED: &str = "cider::changed";
pub(super) const SATISFIED: &str = "cider::satisfied";
pub(super) const CONFLICT: &str = "cider::conflict";
pub(super) const ITEM_FAILED: &str = "cider::failed";

/// What an event represents, decided from its target and level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Stage,
    Changed,
    Satisfied,
    Conflict,
    ItemFailed,
    Summary(TaskStatus),
    Plain(Level),
}

/// The fields cider events carry.
#[derive(Default)]
struct Fields {
    message: String,
    status: Option<String>,
}

impl tracing::field::Visit for Fields {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        match field.name() {
            "message" => value.clone_into(&mut self.message),
            "status" => self.status = Some(value.to_string()),
            _ => {}
        }
    }
}

/// Read an event's fields and classify it.
fn classify(event: &tracing::Event<'_>) -> (Kind, String) {
    let mut fields = Fields::default();
    event.record(&mut fields);
    let metadata = event.metadata();
    let kind = match metadata.target() {
        STAGE => Kind::Stage,
        CHANGED => Kind::Changed,
        SATISFIED => Kind::Satisfied,
        CONFLICT => Kind::Conflict,
        ITEM_FAILED => Kind::ItemFailed,
        SUMMARY => fields
            .status
            .as_deref()
            .and_then(TaskStatus::from_label)
            .map_or(Kind::Plain(*metadata.level()), Kind::Summary),
        _ => Kind::Plain(*metadata.level()),
    };
    (kind, fields.message)
}

/// Plain-text rendering for the log file.
fn file_line(kind: Kind, level: Level, msg: &str) -> String {
    match kind {
        Kind::Stage => format!("==> {msg}"),
        Kind::Changed => format!("    [changed] {msg}"),
        Kind::Satisfied => format!("    [ok] {msg}"),
        Kind::Conflict if level == Level::ERROR => format!("    [conflict] {msg}"),
        Kind::Conflict => format!("    [conflict, forced] {msg}"),
        Kind::ItemFailed => format!("    [skipped] {msg}"),
        Kind::Summary(status) => format!("    [{}] {msg}", status.label()),
        Kind::Plain(Level::ERROR) => format!("    [error] {msg}"),
        Kind::Plain(Level::WARN) => format!("    [warn] {msg}"),
        Kind::Plain(Level::DEBUG | Level::TRACE) => format!("    [debug] {msg}"),
        Kind::Plain(_) => format!("    {msg}"),
    }
}

/// Coloured rendering for the terminal.
fn console_line(kind: Kind, level: Level, msg: &str) -> String {
    match kind {
        Kind::Stage => format!("\x1b[1;34m==>\x1b[0m \x1b[1m{msg}\x1b[0m"),
        Kind::Changed => format!("  \x1b[32m+\x1b[0m {msg}"),
        Kind::Satisfied => format!("  \x1b[2m= {msg}\x1b[0m"),
        Kind::Conflict if level == Level::ERROR => format!("\x1b[31mCONFLICT\x1b[0m {msg}"),
        Kind::Conflict => format!("\x1b[33mREPLACE\x1b[0m  {msg}"),
        Kind::ItemFailed => format!("\x1b[31mSKIP\x1b[0m  {msg}"),
        Kind::Summary(status) => {
            let (glyph, color) = status.marker();
            format!("  {color}{glyph} {msg}\x1b[0m")
        }
        Kind::Plain(Level::ERROR) => format!("\x1b[31mERROR\x1b[0m {msg}"),
        Kind::Plain(Level::WARN) => format!("\x1b[33mWARN\x1b[0m  {msg}"),
        Kind::Plain(Level::INFO) => format!("  {msg}"),
        Kind::Plain(_) => format!("  \x1b[2m{msg}\x1b[0m"),
    }
}

/// Appends every event to `$XDG_CACHE_HOME/cider/<command>.log`,
/// timestamped and without ANSI codes.
#[derive(Debug)]
pub(super) struct FileLayer {
    file: Mutex<fs::File>,
}

impl FileLayer {
    /// Truncate the log for `command` and write a run header.  `None` when
    /// the file cannot be opened.
    pub(super) fn new(command: &str) -> Option<Self> {
        let path = log_file_path(command)?;
        let rule = "=".repeat(42);
        let header = format!(
            "{rule}\ncider {} {command} {}\n{rule}\n",
            crate::VERSION,
            format_utc_datetime(),
        );
        fs::write(&path, header).ok()?;
        let file = fs::OpenOptions::new().append(true).open(&path).ok()?;
        Some(Self {
            file: Mutex::new(file),
        })
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for FileLayer {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let (kind, msg) = classify(event);
        let line = file_line(kind, *event.metadata().level(), &strip_ansi(&msg));
        if let Ok(mut f) = self.file.lock() {
            writeln!(f, "[{}] {line}", format_utc_time()).ok();
        }
    }
}

struct CiderFormatter;

impl<S, N> tracing_subscriber::fmt::FormatEvent<S, N> for CiderFormatter
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    N: for<'a> tracing_subscriber::fmt::FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &tracing_subscriber::fmt::FmtContext<'_, S, N>,
        mut writer: tracing_subscriber::fmt::format::Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let (kind, msg) = classify(event);
        writeln!(writer, "{}", console_line(kind, *event.metadata().level(), &msg))
    }
}

/// Initialise the global [`tracing`] subscriber.
///
/// Warnings and errors go to stderr, everything else to stdout; debug
/// events (including already-satisfied items) reach the console only with
/// `verbose`.  The file layer always records at `DEBUG`.  Call once, before
/// any logging.
pub fn init_subscriber(verbose: bool, command: &str) {
    use tracing_subscriber::fmt::writer::MakeWriterExt as _;
    use tracing_subscriber::{
        Layer as _, filter::LevelFilter, fmt, layer::SubscriberExt as _,
        util::SubscriberInitExt as _,
    };

    let console_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };

    let make_writer = std::io::stderr
        .with_max_level(Level::WARN)
        .and(std::io::stdout.with_min_level(Level::INFO));

    let console_layer = fmt::layer()
        .event_format(CiderFormatter)
        .with_writer(make_writer)
        .with_filter(console_level);

    let file_layer = FileLayer::new(command).map(|l| l.with_filter(LevelFilter::DEBUG));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflicts_render_by_severity() {
        assert_eq!(
            file_line(Kind::Conflict, Level::ERROR, "~/.vimrc"),
            "    [conflict] ~/.vimrc"
        );
        assert_eq!(
            file_line(Kind::Conflict, Level::WARN, "~/.vimrc"),
            "    [conflict, forced] ~/.vimrc"
        );
        assert!(console_line(Kind::Conflict, Level::ERROR, "x").contains("CONFLICT"));
        assert!(console_line(Kind::Conflict, Level::WARN, "x").contains("REPLACE"));
    }

    #[test]
    fn item_classes_are_tagged_in_file() {
        assert_eq!(file_line(Kind::Changed, Level::INFO, "git"), "    [changed] git");
        assert_eq!(file_line(Kind::Satisfied, Level::DEBUG, "git"), "    [ok] git");
        assert_eq!(file_line(Kind::ItemFailed, Level::ERROR, "git"), "    [skipped] git");
    }

    #[test]
    fn summary_rows_use_status_marker() {
        let line = console_line(Kind::Summary(TaskStatus::Skipped), Level::INFO, "Apply icons");
        assert!(line.contains("○ Apply icons"));
        assert_eq!(
            file_line(Kind::Summary(TaskStatus::NotApplicable), Level::INFO, "Add taps"),
            "    [n/a] Add taps"
        );
    }

    #[test]
    fn plain_events_fall_back_to_level() {
        assert_eq!(file_line(Kind::Plain(Level::WARN), Level::WARN, "w"), "    [warn] w");
        assert_eq!(file_line(Kind::Plain(Level::INFO), Level::INFO, "i"), "    i");
        assert!(console_line(Kind::Plain(Level::ERROR), Level::ERROR, "e").contains("ERROR"));
    }
}
