//! Violation Ledger
//!
//! Ordered, append-only audit trail of violations with an exact running sum.
//! Owned by the session actor, which is the only writer.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::logic::violation::{Violation, ViolationClass};

#[cfg(test)]
mod tests;

#[derive(Debug, Error, PartialEq)]
pub enum LedgerError {
    #[error("ledger is sealed; {class} violation rejected")]
    Sealed { class: ViolationClass },
}

/// Consistent copy of the ledger at one point in time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub violations: Vec<Violation>,
    pub cumulative_weight: f64,
    pub counts: BTreeMap<ViolationClass, u32>,
}

impl LedgerSnapshot {
    pub fn latest(&self) -> Option<&Violation> {
        self.violations.last()
    }

    pub fn count(&self, class: ViolationClass) -> u32 {
        self.counts.get(&class).copied().unwrap_or(0)
    }
}

#[derive(Debug, Default)]
pub struct ViolationLedger {
    violations: Vec<Violation>,
    cumulative_weight: f64,
    counts: BTreeMap<ViolationClass, u32>,
    sealed: bool,
}

impl ViolationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append and return the new cumulative weight
    pub fn record(&mut self, violation: Violation) -> Result<f64, LedgerError> {
        if self.sealed {
            return Err(LedgerError::Sealed { class: violation.class });
        }

        self.cumulative_weight += violation.weight;
        *self.counts.entry(violation.class).or_insert(0) += 1;
        self.violations.push(violation);
        Ok(self.cumulative_weight)
    }

    pub fn cumulative_weight(&self) -> f64 {
        self.cumulative_weight
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn latest(&self) -> Option<&Violation> {
        self.violations.last()
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            violations: self.violations.clone(),
            cumulative_weight: self.cumulative_weight,
            counts: self.counts.clone(),
        }
    }

    /// Close the ledger at teardown; later appends are programming faults
    pub fn seal(&mut self) {
        self.sealed = true;
    }
}
