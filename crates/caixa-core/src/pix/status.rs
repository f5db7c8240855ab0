//! # Payment Status
//!
//! Whether a generated code has been paid is a fact owned by the payment
//! network (webhook, PSP API, bank statement). The core only defines the
//! seam: one request, one answer, caller-chosen timeout.
//!
//! ```text
//! CheckoutSession ──► check_payment_status(source, txid, timeout)
//!                            │
//!                            ▼
//!                  PaymentStatusSource::check_status
//!                            │ (PSP adapter, webhook cache, test fake)
//!                            ▼
//!                  PaymentStatusReport { Pending | Completed | Failed }
//! ```
//!
//! No retries, no polling loop, no randomness.

use std::collections::HashMap;
use std::time::Duration;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::PaymentStatusReport;

/// Answers "has this transaction settled?".
pub trait PaymentStatusSource {
    /// Single-shot lookup. Implementations must give up after `timeout` and
    /// report `PaymentStatusUnavailable`.
    fn check_status(&self, transaction_id: &str, timeout: Duration)
        -> CoreResult<PaymentStatusReport>;
}

/// Asks `source` once about `transaction_id`.
///
/// ## Errors
/// - `Validation` for an empty transaction id
/// - whatever the source reports (typically `PaymentStatusUnavailable`)
pub fn check_payment_status<S: PaymentStatusSource + ?Sized>(
    source: &S,
    transaction_id: &str,
    timeout: Duration,
) -> CoreResult<PaymentStatusReport> {
    let transaction_id = transaction_id.trim();
    if transaction_id.is_empty() {
        return Err(ValidationError::Required {
            field: "transaction_id".to_string(),
        }
        .into());
    }
    source.check_status(transaction_id, timeout)
}

/// Scripted source for demos and tests: returns the report registered for
/// a transaction id, or pending for unknown ids.
#[derive(Debug, Clone, Default)]
pub struct FixedStatusSource {
    reports: HashMap<String, PaymentStatusReport>,
    unreachable: bool,
}

impl FixedStatusSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the answer for `transaction_id`.
    pub fn with_report(mut self, transaction_id: impl Into<String>, report: PaymentStatusReport) -> Self {
        self.reports.insert(transaction_id.into(), report);
        self
    }

    /// A source that always times out.
    pub fn unreachable() -> Self {
        FixedStatusSource {
            reports: HashMap::new(),
            unreachable: true,
        }
    }
}

impl PaymentStatusSource for FixedStatusSource {
    fn check_status(
        &self,
        transaction_id: &str,
        timeout: Duration,
    ) -> CoreResult<PaymentStatusReport> {
        if self.unreachable {
            return Err(CoreError::PaymentStatusUnavailable {
                transaction_id: transaction_id.to_string(),
                reason: format!("no answer within {}ms", timeout.as_millis()),
            });
        }
        Ok(self
            .reports
            .get(transaction_id)
            .cloned()
            .unwrap_or_else(PaymentStatusReport::pending))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::types::PaymentStatus;
    use chrono::{TimeZone, Utc};
    use std::cell::Cell;

    /// Counts calls to prove there is no retry.
    struct CountingSource {
        calls: Cell<u32>,
    }

    impl PaymentStatusSource for CountingSource {
        fn check_status(&self, transaction_id: &str, _timeout: Duration) -> CoreResult<PaymentStatusReport> {
            self.calls.set(self.calls.get() + 1);
            Err(CoreError::PaymentStatusUnavailable {
                transaction_id: transaction_id.to_string(),
                reason: "offline".to_string(),
            })
        }
    }

    #[test]
    fn test_fixed_source_reports() {
        let settled = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let source = FixedStatusSource::new()
            .with_report("PAID1", PaymentStatusReport::completed(Money::from_cents(3218), settled))
            .with_report("FAIL1", PaymentStatusReport::failed());

        let paid = check_payment_status(&source, "PAID1", Duration::from_secs(1)).unwrap();
        assert_eq!(paid.status, PaymentStatus::Completed);
        assert_eq!(paid.amount, Some(Money::from_cents(3218)));
        assert_eq!(paid.settled_at, Some(settled));

        let failed = check_payment_status(&source, "FAIL1", Duration::from_secs(1)).unwrap();
        assert_eq!(failed.status, PaymentStatus::Failed);

        let unknown = check_payment_status(&source, "OTHER", Duration::from_secs(1)).unwrap();
        assert_eq!(unknown.status, PaymentStatus::Pending);
    }

    #[test]
    fn test_unreachable_source() {
        let err = check_payment_status(&FixedStatusSource::unreachable(), "TX", Duration::from_millis(250))
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::PaymentStatusUnavailable { transaction_id, reason }
                if transaction_id == "TX" && reason.contains("250ms")
        ));
    }

    #[test]
    fn test_single_shot() {
        let source = CountingSource { calls: Cell::new(0) };
        assert!(check_payment_status(&source, "TX", Duration::from_secs(5)).is_err());
        assert_eq!(source.calls.get(), 1);
    }

    #[test]
    fn test_empty_transaction_id() {
        let source = CountingSource { calls: Cell::new(0) };
        assert!(matches!(
            check_payment_status(&source, "  ", Duration::from_secs(5)),
            Err(CoreError::Validation(_))
        ));
        assert_eq!(source.calls.get(), 0);
    }
}
