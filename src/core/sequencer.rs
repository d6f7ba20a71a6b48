//! Nosso-número sequencer (C4): atomic, bounded allocation from a
//! per-(tenant, bank) counter.

use std::collections::HashMap;
use std::sync::Mutex;

use super::error::ReceivablesError;

/// Identifies a single counter: one tenant's relationship with one bank.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CounterKey {
    pub tenant_cnpj: String,
    pub bank_code: &'static str,
}

impl CounterKey {
    pub fn new(tenant_cnpj: impl Into<String>, bank_code: &'static str) -> Self {
        Self {
            tenant_cnpj: tenant_cnpj.into(),
            bank_code,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Bounds {
    min: u64,
    max: u64,
    current: u64,
}

/// An in-process stand-in for the row-level database lock the contract
/// names as an acceptable discipline: one mutex over the counter table,
/// taken once per [`allocate`](NossoNumeroSequencer::allocate) call to read
/// `current` and advance it in the same critical section.
///
/// Advancing at allocate time rather than at commit time is what keeps two
/// concurrent callers from ever observing the same `current`: the
/// read-and-increment is one atomic step, not a read followed by a
/// separately-locked write. A caller may hold several uncommitted
/// [`Allocation`]s at once (one per group in a batch) without deadlocking,
/// since no lock is held between calls.
///
/// An allocation that is dropped without [`commit`](Allocation::commit)
/// rolls its value back only if nothing has advanced the counter further
/// since — i.e. it was still the most recently issued value for its key.
/// Otherwise the counter is left where it is: a gap rather than a reused
/// number, which keeps "no two non-void Boletos share a nosso-número" true
/// even when rollbacks interleave with other threads' commits.
#[derive(Debug, Default)]
pub struct NossoNumeroSequencer {
    counters: Mutex<HashMap<CounterKey, Bounds>>,
}

/// A pending allocation: the caller must [`commit`](Allocation::commit) it
/// once the enclosing business transaction (the boleto insert) succeeds.
pub struct Allocation<'s> {
    sequencer: &'s NossoNumeroSequencer,
    key: CounterKey,
    value: u64,
    committed: bool,
}

impl<'s> Allocation<'s> {
    /// The allocated nosso-número.
    pub fn value(&self) -> u64 {
        self.value
    }

    /// Mark this allocation as durable. The counter was already advanced
    /// when it was issued, so there is nothing left to write.
    pub fn commit(mut self) {
        self.committed = true;
    }
}

impl NossoNumeroSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or re-register) a bank profile's counter bounds. Call
    /// this once per (tenant, bank) before the first `allocate`, and again
    /// whenever the profile's bounds change out-of-band.
    pub fn register(&self, key: CounterKey, min: u64, max: u64, current: u64) {
        let mut counters = self.counters.lock().unwrap();
        counters.insert(key, Bounds { min, max, current });
    }

    /// Allocate the next nosso-número for `key`, returning a guard the
    /// caller must commit once the enclosing transaction succeeds.
    ///
    /// Fails with [`ReceivablesError::Exhausted`] when the pre-increment
    /// value would exceed the registered maximum; the counter is never
    /// advanced past `max + 1`. The read of `current` and its advance to
    /// `current + 1` happen under the same lock acquisition, so no two
    /// calls — on one thread or many — can ever be handed the same value.
    pub fn allocate(&self, key: CounterKey) -> Result<Allocation<'_>, ReceivablesError> {
        let mut counters = self.counters.lock().unwrap();
        let bounds = counters.get_mut(&key).ok_or_else(|| {
            ReceivablesError::MissingRequired(format!(
                "no counter registered for tenant {} / bank {}",
                key.tenant_cnpj, key.bank_code
            ))
        })?;
        if bounds.current > bounds.max {
            return Err(ReceivablesError::Exhausted(format!(
                "nosso-número counter for tenant {} / bank {} exhausted at {}",
                key.tenant_cnpj, key.bank_code, bounds.max
            )));
        }
        let value = bounds.current;
        debug_assert!(value >= bounds.min);
        bounds.current = value + 1;
        Ok(Allocation {
            sequencer: self,
            key,
            value,
            committed: false,
        })
    }
}

impl Drop for Allocation<'_> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        let mut counters = self.sequencer.counters.lock().unwrap();
        if let Some(bounds) = counters.get_mut(&self.key) {
            if bounds.current == self.value + 1 {
                bounds.current = self.value;
            }
        }
        tracing::debug!(
            tenant = %self.key.tenant_cnpj,
            bank = %self.key.bank_code,
            value = self.value,
            "nosso-número allocation dropped without commit; rolled back"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocates_monotonically_and_exhausts() {
        let seq = NossoNumeroSequencer::new();
        let key = CounterKey::new("11222333000181", "033");
        seq.register(key.clone(), 1, 1_000_001, 1_000_000);

        let a = seq.allocate(key.clone()).unwrap();
        assert_eq!(a.value(), 1_000_000);
        a.commit();

        let b = seq.allocate(key.clone()).unwrap();
        assert_eq!(b.value(), 1_000_001);
        b.commit();

        let err = seq.allocate(key.clone()).unwrap_err();
        assert!(matches!(err, ReceivablesError::Exhausted(_)));
    }

    #[test]
    fn dropped_allocation_rolls_back() {
        let seq = NossoNumeroSequencer::new();
        let key = CounterKey::new("11222333000181", "274");
        seq.register(key.clone(), 1, 100, 5);

        {
            let a = seq.allocate(key.clone()).unwrap();
            assert_eq!(a.value(), 5);
            // dropped without commit
        }

        let a = seq.allocate(key.clone()).unwrap();
        assert_eq!(a.value(), 5, "uncommitted allocation must roll back");
        a.commit();

        let b = seq.allocate(key.clone()).unwrap();
        assert_eq!(b.value(), 6);
        b.commit();
    }

    #[test]
    fn allocating_unregistered_key_is_missing_required() {
        let seq = NossoNumeroSequencer::new();
        let key = CounterKey::new("00000000000000", "033");
        assert!(seq.allocate(key).is_err());
    }

    #[test]
    fn multiple_outstanding_allocations_on_one_thread_get_distinct_values() {
        let seq = NossoNumeroSequencer::new();
        let key = CounterKey::new("11222333000181", "033");
        seq.register(key.clone(), 1, 100, 1);

        // Mirrors create_boleto_batch: allocate for every group before
        // committing any of them. Must not deadlock and must not repeat.
        let a = seq.allocate(key.clone()).unwrap();
        let b = seq.allocate(key.clone()).unwrap();
        let c = seq.allocate(key.clone()).unwrap();
        assert_eq!((a.value(), b.value(), c.value()), (1, 2, 3));
        a.commit();
        b.commit();
        c.commit();

        let d = seq.allocate(key).unwrap();
        assert_eq!(d.value(), 4);
    }

    #[test]
    fn concurrent_allocations_never_duplicate_a_value() {
        use std::sync::Arc;
        use std::thread;

        let seq = Arc::new(NossoNumeroSequencer::new());
        let key = CounterKey::new("11222333000181", "033");
        seq.register(key.clone(), 1, 1_000, 1);

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let seq = Arc::clone(&seq);
                let key = key.clone();
                thread::spawn(move || {
                    let mut values = Vec::new();
                    for _ in 0..10 {
                        let a = seq.allocate(key.clone()).unwrap();
                        values.push(a.value());
                        a.commit();
                    }
                    values
                })
            })
            .collect();

        let mut all_values: Vec<u64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        all_values.sort_unstable();

        let expected: Vec<u64> = (1..=160).collect();
        assert_eq!(all_values, expected, "every allocated value must be unique and gap-free");
    }
}
