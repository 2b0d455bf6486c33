//! Append-only audit trail of every load, correction, grading pass and save.
//!
//! Entries are kept in memory and, when a file is attached, appended to it
//! one line at a time as they happen. Nothing here ever reads the file back.

use chrono::{DateTime, Local, SecondsFormat};
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    Load,
    Correction,
    Edit,
    Grade,
    Merge,
    FirstRun,
    Save,
    Fatal,
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            AuditAction::Load => "load",
            AuditAction::Correction => "correction",
            AuditAction::Edit => "edit",
            AuditAction::Grade => "grade",
            AuditAction::Merge => "merge",
            AuditAction::FirstRun => "first-run",
            AuditAction::Save => "save",
            AuditAction::Fatal => "fatal",
        };
        f.write_str(tag)
    }
}

#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub at: DateTime<Local>,
    pub action: AuditAction,
    pub message: String,
}

impl AuditEntry {
    pub fn to_line(&self) -> String {
        format!(
            "{} [{}] {}",
            self.at.to_rfc3339_opts(SecondsFormat::Millis, false),
            self.action,
            self.message
        )
    }
}

#[derive(Debug, Default)]
pub struct AuditLog {
    entries: Vec<AuditEntry>,
    file: Option<File>,
}

impl AuditLog {
    /// Audit log that is never written to disk.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open (or create) an audit file for appending.
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            entries: Vec::new(),
            file: Some(file),
        })
    }

    pub fn record(&mut self, action: AuditAction, message: impl Into<String>) -> Result<()> {
        let entry = AuditEntry {
            at: Local::now(),
            action,
            message: message.into(),
        };
        tracing::info!(target: "mast::audit", action = %entry.action, "{}", entry.message);
        if let Some(file) = self.file.as_mut() {
            writeln!(file, "{}", entry.to_line())?;
        }
        self.entries.push(entry);
        Ok(())
    }

    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }

    /// Entries of one kind, oldest first.
    pub fn of_kind(&self, action: AuditAction) -> impl Iterator<Item = &AuditEntry> {
        self.entries.iter().filter(move |e| e.action == action)
    }
}
