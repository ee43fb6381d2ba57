pub mod analyzer;
pub mod ledger;
pub mod window;

pub use analyzer::{Analyzer, MIN_TRADABLE_CASH};
pub use ledger::{CsvFileLog, MemoryLog, TransactionLedger, TransactionLog, MAX_RECENT_TRANSACTIONS};
pub use window::{SignalState, SymbolRecord};
