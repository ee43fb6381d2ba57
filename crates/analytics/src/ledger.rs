use std::collections::VecDeque;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::warn;

use common::Transaction;

/// How many transactions stay queryable in memory. The durable log keeps the
/// full history; this queue is only the recent view shown to the user.
pub const MAX_RECENT_TRANSACTIONS: usize = 20;

/// Where confirmed transactions are durably appended, one CSV line each.
/// The ledger only ever calls `append`; file lifecycle belongs to the
/// implementation.
pub trait TransactionLog: Send + Sync {
    fn append(&mut self, line: &str) -> io::Result<()>;
}

/// Append-only CSV file. A prior run's file is truncated on construction and
/// the parent directory is created when missing. Each append reopens the
/// file, so a transient lock loses only that one line.
pub struct CsvFileLog {
    path: PathBuf,
}

impl CsvFileLog {
    pub fn create(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if let Err(e) = Self::reset(&path) {
            warn!(path = %path.display(), error = %e, "transaction log unavailable");
        }
        Self { path }
    }

    fn reset(path: &Path) -> io::Result<()> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)?;
            }
        }
        File::create(path)?;
        Ok(())
    }
}

impl TransactionLog for CsvFileLog {
    fn append(&mut self, line: &str) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)?;
        writeln!(file, "{line}")
    }
}

/// In-memory log, shareable across owners. Used by tests and dry runs where
/// no file should be touched.
#[derive(Debug, Clone, Default)]
pub struct MemoryLog {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }
}

impl TransactionLog for MemoryLog {
    fn append(&mut self, line: &str) -> io::Result<()> {
        let mut lines = self
            .lines
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log mutex poisoned"))?;
        lines.push(line.to_string());
        Ok(())
    }
}

/// The recent-transactions queue plus the durable log behind it. Every record
/// goes to both in the same order, so the queue is always a suffix of the
/// log; they differ only in retention.
pub struct TransactionLedger {
    recent: VecDeque<Transaction>,
    capacity: usize,
    log: Box<dyn TransactionLog>,
}

impl TransactionLedger {
    pub fn new(capacity: usize, log: Box<dyn TransactionLog>) -> Self {
        Self {
            recent: VecDeque::with_capacity(capacity),
            capacity,
            log,
        }
    }

    /// Record a transaction. Returns false when the durable append was
    /// skipped; the in-memory queue is updated either way.
    pub fn record(&mut self, transaction: Transaction) -> bool {
        if self.recent.len() >= self.capacity {
            self.recent.pop_front();
        }
        let line = transaction.csv_line();
        self.recent.push_back(transaction);

        match self.log.append(&line) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "transaction not written to the durable log");
                false
            }
        }
    }

    /// The most recent transactions, oldest first.
    pub fn recent(&self) -> Vec<Transaction> {
        self.recent.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.recent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recent.is_empty()
    }
}
