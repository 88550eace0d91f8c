//! Event sinks

use std::sync::Mutex;

use super::event::{EventSeverity, RunEvent};

/// Receiver for run status events
pub trait EventSink: Send + Sync {
    fn emit(&self, event: RunEvent);
}

/// Renders each event as one log line at a level matching its severity
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl LogSink {
    pub fn level_for(severity: EventSeverity) -> log::Level {
        match severity {
            EventSeverity::Error => log::Level::Error,
            EventSeverity::Warning => log::Level::Warn,
            EventSeverity::Info => log::Level::Info,
            EventSeverity::Detail => log::Level::Debug,
        }
    }
}

impl EventSink for LogSink {
    fn emit(&self, event: RunEvent) {
        log::log!(Self::level_for(event.severity()), "{}", event);
    }
}

/// Keeps every event in memory, in emission order
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<RunEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RunEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: RunEvent) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event);
    }
}
