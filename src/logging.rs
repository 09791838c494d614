//! Minimal `tracing` subscriber for the board.
//!
//! Each event becomes one line, `LEVEL target: message key=value ...`, handed
//! to a plain function so the firmware can route it to `esp_println`. Spans
//! are accepted and ignored. Lines longer than `LINE_CAP` are cut short.

use core::fmt::{self, Write};

use heapless::String;
use tracing::{
    field::{Field, Visit},
    span, Event, Level, Metadata, Subscriber,
};

pub const LINE_CAP: usize = 160;

/// Receives one formatted event at a time.
pub type LineSink = fn(fmt::Arguments<'_>);

pub struct PrintSubscriber {
    sink: LineSink,
    max_level: Level,
}

impl PrintSubscriber {
    pub const fn new(sink: LineSink, max_level: Level) -> Self {
        Self { sink, max_level }
    }
}

struct LineVisitor<'a> {
    message: &'a mut String<LINE_CAP>,
    fields: &'a mut String<LINE_CAP>,
}

impl Visit for LineVisitor<'_> {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        // overflow only truncates the line
        if field.name() == "message" {
            let _ = write!(self.message, "{value:?}");
        } else {
            let _ = write!(self.fields, " {}={value:?}", field.name());
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            let _ = self.message.push_str(value);
        } else {
            let _ = write!(self.fields, " {}={value}", field.name());
        }
    }
}

impl Subscriber for PrintSubscriber {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        // more verbose levels compare greater
        *metadata.level() <= self.max_level
    }

    fn new_span(&self, _span: &span::Attributes<'_>) -> span::Id {
        span::Id::from_u64(1)
    }

    fn record(&self, _span: &span::Id, _values: &span::Record<'_>) {}

    fn record_follows_from(&self, _span: &span::Id, _follows: &span::Id) {}

    fn event(&self, event: &Event<'_>) {
        let mut message = String::new();
        let mut fields = String::new();
        event.record(&mut LineVisitor {
            message: &mut message,
            fields: &mut fields,
        });
        let meta = event.metadata();
        (self.sink)(format_args!(
            "{} {}: {}{}",
            meta.level(),
            meta.target(),
            message,
            fields
        ));
    }

    fn enter(&self, _span: &span::Id) {}

    fn exit(&self, _span: &span::Id) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    thread_local! {
        static LINES: RefCell<Vec<std::string::String>> = const { RefCell::new(Vec::new()) };
    }

    fn capture(args: fmt::Arguments<'_>) {
        LINES.with(|lines| lines.borrow_mut().push(args.to_string()));
    }

    fn take_lines() -> Vec<std::string::String> {
        LINES.with(|lines| lines.borrow_mut().drain(..).collect())
    }

    #[test]
    fn formats_message_and_fields() {
        let subscriber = PrintSubscriber::new(capture, Level::INFO);
        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(stopped = true, year = 2000, "rtc time not trusted");
        });
        let lines = take_lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("WARN analog_watchface::logging"), "{}", lines[0]);
        assert!(lines[0].contains(": rtc time not trusted"), "{}", lines[0]);
        assert!(lines[0].contains(" stopped=true"), "{}", lines[0]);
        assert!(lines[0].contains(" year=2000"), "{}", lines[0]);
    }

    #[test]
    fn drops_events_above_max_level() {
        let subscriber = PrintSubscriber::new(capture, Level::WARN);
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("watch app started");
            tracing::debug!(width = 8, "background image loaded");
            tracing::error!("flush failed");
        });
        let lines = take_lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("ERROR "), "{}", lines[0]);
    }

    #[test]
    fn long_lines_are_truncated() {
        let subscriber = PrintSubscriber::new(capture, Level::TRACE);
        let long = "x".repeat(LINE_CAP * 2);
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(value = %long, "tail");
        });
        let lines = take_lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].len() < 2 * LINE_CAP + 40, "{}", lines[0].len());
        assert!(lines[0].contains(": tail"));
    }
}
