//! execution timeline recording

/// One recorded execution segment of a dispatched process.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionEvent {
    /// workload label, e.g. "compute"
    pub kind: String,
    /// process label, e.g. "P2"
    pub name: String,
    pub start_ms: f64,
    pub end_ms: f64,
}

/// Append-only log of execution segments for one scheduling run.
///
/// Segments stay in dispatch order and are never merged; Round Robin
/// legitimately produces several consecutive segments for one process.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Vec<ExecutionEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        EventLog { events: Vec::new() }
    }

    pub fn record(&mut self, kind: &str, name: &str, start_ms: f64, end_ms: f64) {
        self.events.push(ExecutionEvent {
            kind: kind.to_string(),
            name: name.to_string(),
            start_ms,
            end_ms,
        });
    }

    pub fn events(&self) -> &[ExecutionEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_keep_dispatch_order() {
        let mut log = EventLog::new();
        log.record("compute", "P1", 0.0, 2.0);
        log.record("console_echo", "P2", 2.0, 4.0);
        log.record("compute", "P1", 4.0, 6.0);

        let names: Vec<&str> = log.events().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["P1", "P2", "P1"]);
    }

    #[test]
    fn adjacent_segments_of_one_process_are_not_merged() {
        let mut log = EventLog::new();
        log.record("compute", "P1", 0.0, 2.0);
        log.record("compute", "P1", 2.0, 4.0);
        assert_eq!(log.len(), 2);
        assert_eq!(log.events()[0].end_ms, 2.0);
        assert_eq!(log.events()[1].start_ms, 2.0);
    }
}
