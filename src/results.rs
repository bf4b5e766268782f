//! Result sinks
//!
//! The orchestrator hands every finished `TrialRecord` to a sink. Sinks own
//! the data from then on; a failing sink is logged and the run continues.

use std::io::Write;

use crate::error::DrillError;
use crate::sim::TrialRecord;

/// Stable column order of the summary file
pub const CSV_HEADER: &str =
    "trialIndex,trialType,throwType,stance,audioTrial,hit,reactionTime,spawnTime,endTime,notes";

pub trait ResultSink {
    fn start_session(&mut self, label: &str) -> Result<(), DrillError>;
    fn log_trial(&mut self, record: &TrialRecord) -> Result<(), DrillError>;
    /// Flush and close the session
    fn finalize(&mut self) -> Result<(), DrillError>;
}

/// Make free text safe for a comma-separated line
pub fn sanitize(text: &str) -> String {
    text.chars()
        .filter(|c| *c != '\r')
        .map(|c| match c {
            ',' => ';',
            '\n' => ' ',
            other => other,
        })
        .collect()
}

/// One summary line (no trailing newline)
pub fn csv_line(r: &TrialRecord) -> String {
    format!(
        "{},{},{},{},{},{},{:.4},{:.4},{:.4},{}",
        r.trial_index,
        sanitize(&r.label),
        r.kind.as_str(),
        sanitize(r.stance_name()),
        r.audio_trial as u8,
        r.hit as u8,
        r.reaction_time,
        r.spawn_time,
        r.end_time,
        sanitize(&r.note),
    )
}

/// Comma-separated summary writer
pub struct CsvSink<W: Write> {
    out: W,
    rows: usize,
}

impl<W: Write> CsvSink<W> {
    pub fn new(out: W) -> Self {
        Self { out, rows: 0 }
    }

    /// Rows written in the current session
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ResultSink for CsvSink<W> {
    fn start_session(&mut self, label: &str) -> Result<(), DrillError> {
        log::info!("Starting result session '{}'", label);
        writeln!(self.out, "{}", CSV_HEADER)?;
        self.rows = 0;
        Ok(())
    }

    fn log_trial(&mut self, record: &TrialRecord) -> Result<(), DrillError> {
        writeln!(self.out, "{}", csv_line(record))?;
        self.rows += 1;
        Ok(())
    }

    fn finalize(&mut self) -> Result<(), DrillError> {
        self.out.flush()?;
        log::info!("Result session saved ({} trials)", self.rows);
        Ok(())
    }
}

/// One JSON object per line, full record including the throw config
pub struct JsonLinesSink<W: Write> {
    out: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ResultSink for JsonLinesSink<W> {
    fn start_session(&mut self, label: &str) -> Result<(), DrillError> {
        let header = serde_json::json!({ "session": label });
        writeln!(self.out, "{}", header)?;
        Ok(())
    }

    fn log_trial(&mut self, record: &TrialRecord) -> Result<(), DrillError> {
        let line = serde_json::to_string(record)?;
        writeln!(self.out, "{}", line)?;
        Ok(())
    }

    fn finalize(&mut self) -> Result<(), DrillError> {
        self.out.flush()?;
        Ok(())
    }
}

/// Keeps records in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    pub label: Option<String>,
    pub records: Vec<TrialRecord>,
    pub finalized: bool,
}

impl ResultSink for MemorySink {
    fn start_session(&mut self, label: &str) -> Result<(), DrillError> {
        self.label = Some(label.to_string());
        self.records.clear();
        self.finalized = false;
        Ok(())
    }

    fn log_trial(&mut self, record: &TrialRecord) -> Result<(), DrillError> {
        self.records.push(record.clone());
        Ok(())
    }

    fn finalize(&mut self) -> Result<(), DrillError> {
        self.finalized = true;
        Ok(())
    }
}
