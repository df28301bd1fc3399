//! Ledger invariants: exact sum, monotonic weight, append-only order.

use super::*;
use crate::logic::config::MonitoringConfig;

fn mixed_sequence(config: &MonitoringConfig) -> Vec<Violation> {
    let classes = [
        ViolationClass::CopyPaste,
        ViolationClass::TabSwitch,
        ViolationClass::CopyPaste,
        ViolationClass::MultipleFaces,
        ViolationClass::FaceAbsent,
        ViolationClass::WindowBlur,
        ViolationClass::FullscreenExit,
        ViolationClass::TabSwitch,
    ];
    classes.iter().map(|c| config.violation(*c)).collect()
}

#[test]
fn test_cumulative_equals_sum_at_every_step() {
    let config = MonitoringConfig::reference();
    let mut ledger = ViolationLedger::new();
    let mut expected = 0.0;

    for v in mixed_sequence(&config) {
        expected += v.weight;
        let total = ledger.record(v).unwrap();
        assert_eq!(total, expected);

        let snap = ledger.snapshot();
        let summed: f64 = snap.violations.iter().map(|v| v.weight).sum();
        assert_eq!(snap.cumulative_weight, summed);
    }
    assert_eq!(ledger.cumulative_weight(), 12.5);
}

#[test]
fn test_weight_is_monotonic() {
    let config = MonitoringConfig::reference();
    let mut ledger = ViolationLedger::new();
    let mut last = 0.0;

    for v in mixed_sequence(&config) {
        let total = ledger.record(v).unwrap();
        assert!(total >= last);
        last = total;
    }
}

#[test]
fn test_zero_weight_class_still_recorded() {
    let mut config = MonitoringConfig::reference();
    config.weights.face_absent = 0.0;
    let mut ledger = ViolationLedger::new();

    ledger.record(config.violation(ViolationClass::FaceAbsent)).unwrap();
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger.cumulative_weight(), 0.0);
}

#[test]
fn test_no_deduplication_and_order_kept() {
    let config = MonitoringConfig::reference();
    let mut ledger = ViolationLedger::new();

    for _ in 0..3 {
        ledger.record(config.violation(ViolationClass::TabSwitch)).unwrap();
    }
    ledger.record(config.violation(ViolationClass::CopyPaste)).unwrap();

    let snap = ledger.snapshot();
    assert_eq!(snap.count(ViolationClass::TabSwitch), 3);
    assert_eq!(snap.count(ViolationClass::CopyPaste), 1);
    assert_eq!(snap.count(ViolationClass::FaceAbsent), 0);
    assert_eq!(snap.latest().map(|v| v.class), Some(ViolationClass::CopyPaste));
    assert_eq!(snap.violations[0].class, ViolationClass::TabSwitch);
    assert_eq!(snap.cumulative_weight, 6.5);
}

#[test]
fn test_sealed_ledger_rejects_appends() {
    let config = MonitoringConfig::reference();
    let mut ledger = ViolationLedger::new();
    ledger.record(config.violation(ViolationClass::TabSwitch)).unwrap();
    ledger.seal();

    let err = ledger.record(config.violation(ViolationClass::WindowBlur)).unwrap_err();
    assert_eq!(err, LedgerError::Sealed { class: ViolationClass::WindowBlur });
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger.cumulative_weight(), 2.0);
}

#[test]
fn test_snapshot_is_detached() {
    let config = MonitoringConfig::reference();
    let mut ledger = ViolationLedger::new();
    ledger.record(config.violation(ViolationClass::TabSwitch)).unwrap();

    let before = ledger.snapshot();
    ledger.record(config.violation(ViolationClass::MultipleFaces)).unwrap();

    assert_eq!(before.violations.len(), 1);
    assert_eq!(before.cumulative_weight, 2.0);
    assert_eq!(ledger.snapshot().cumulative_weight, 5.0);
}
