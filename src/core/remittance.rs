//! Per-(tenant, bank) remittance sequence counter, used to number emitted
//! CNAB files and build their filenames. Structurally the same discipline
//! as [`super::sequencer::NossoNumeroSequencer`] — a mutex keyed by
//! (tenant, bank) — but unbounded, since a remittance sequence has no
//! registered maximum to exhaust.

use std::collections::HashMap;
use std::sync::Mutex;

use super::sequencer::CounterKey;

/// Assigns monotonically increasing remittance sequence numbers per
/// (tenant, bank).
#[derive(Debug, Default)]
pub struct RemittanceSequencer {
    counters: Mutex<HashMap<CounterKey, u32>>,
}

impl RemittanceSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the next sequence number for `key`, starting at 1, and
    /// advance the counter.
    pub fn next(&self, key: CounterKey) -> u32 {
        let mut counters = self.counters.lock().unwrap();
        let entry = counters.entry(key).or_insert(0);
        *entry += 1;
        *entry
    }
}

/// Build the remittance filename convention: `CB` + `DDMM` + zero-padded
/// 4-digit sequence + `.REM`.
pub fn remittance_filename(generation_date: chrono::NaiveDate, sequence: u32) -> String {
    format!(
        "CB{}{sequence:04}.REM",
        generation_date.format("%d%m")
    )
}
