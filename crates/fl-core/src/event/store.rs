//! Append-only storage for [`TraceEvent`]s.
//!
//! Mirrors the event-sourcing split seen elsewhere in this workspace: a
//! minimal trait so the runner doesn't care whether events land in memory or
//! on disk, plus an in-memory implementation used by tests and a
//! line-delimited file sink used by the CLI.

use super::TraceEvent;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

pub trait TraceStore {
    fn append(&mut self, event: TraceEvent);
    fn list(&self, task_id: &str) -> Vec<TraceEvent>;
    fn all(&self) -> Vec<TraceEvent>;
}

#[derive(Default)]
pub struct InMemoryTraceStore {
    events: Vec<TraceEvent>,
}

impl InMemoryTraceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TraceStore for InMemoryTraceStore {
    fn append(&mut self, event: TraceEvent) {
        self.events.push(event);
    }

    fn list(&self, task_id: &str) -> Vec<TraceEvent> {
        self.events.iter().filter(|e| e.task_id == task_id).cloned().collect()
    }

    fn all(&self) -> Vec<TraceEvent> {
        self.events.clone()
    }
}

/// Line-delimited JSON file sink. Each `append` writes one record and
/// flushes immediately: a run is short-lived and crash-consistency across
/// steps matters more than batched throughput here.
pub struct FileTraceStore {
    writer: BufWriter<File>,
    events: Vec<TraceEvent>,
}

impl FileTraceStore {
    pub fn create(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).write(true).truncate(true).open(path)?;
        Ok(Self { writer: BufWriter::new(file), events: Vec::new() })
    }

    pub fn open_for_read(path: &Path) -> io::Result<Vec<TraceEvent>> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut out = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            if let Ok(ev) = serde_json::from_str::<TraceEvent>(&line) {
                out.push(ev);
            }
        }
        Ok(out)
    }
}

impl TraceStore for FileTraceStore {
    fn append(&mut self, event: TraceEvent) {
        if let Ok(line) = serde_json::to_string(&event) {
            let _ = writeln!(self.writer, "{line}");
            let _ = self.writer.flush();
        }
        self.events.push(event);
    }

    fn list(&self, task_id: &str) -> Vec<TraceEvent> {
        self.events.iter().filter(|e| e.task_id == task_id).cloned().collect()
    }

    fn all(&self) -> Vec<TraceEvent> {
        self.events.clone()
    }
}
