use lql_criteria::StatusFilter;
use lql_types::{RecordState, RecordStatus, StoredRecord, TransactionId, UpdateEvent, VersionedRecord};

use crate::error::QueryResult;

/// One record entering or leaving the unconsumed set, as seen by a typed
/// subscriber.
#[derive(Clone, Debug)]
pub struct Notification<T> {
    pub record: VersionedRecord<T>,
    pub status: RecordStatus,
    pub transaction_id: TransactionId,
}

/// Translate a raw update into typed notifications for `T`.
///
/// Consumed records are reported unless `status` is `Unconsumed`; produced
/// records unless it is `Consumed`. Consumed notifications come first.
/// Records whose lineage does not include `T` are skipped.
pub fn translate<T: RecordState>(
    event: &UpdateEvent,
    status: StatusFilter,
) -> QueryResult<Vec<Notification<T>>> {
    let mut notifications = Vec::new();
    if status != StatusFilter::Unconsumed {
        collect(&mut notifications, &event.consumed, RecordStatus::Consumed, event)?;
    }
    if status != StatusFilter::Consumed {
        collect(&mut notifications, &event.produced, RecordStatus::Unconsumed, event)?;
    }
    Ok(notifications)
}

fn collect<T: RecordState>(
    out: &mut Vec<Notification<T>>,
    records: &[StoredRecord],
    status: RecordStatus,
    event: &UpdateEvent,
) -> QueryResult<()> {
    for record in records.iter().filter(|r| r.is_assignable_to(&T::RECORD_TYPE)) {
        out.push(Notification {
            record: record.decode()?,
            status,
            transaction_id: event.transaction_id,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{stored, Item, Other};
    use lql_types::AnyRecord;

    fn event() -> UpdateEvent {
        UpdateEvent {
            transaction_id: lql_types::TransactionId::from_bytes(b"translate"),
            consumed: vec![stored(0, &Item { amount: 1 })],
            produced: vec![
                stored(1, &Item { amount: 2 }),
                stored(2, &Other { label: "x".into() }),
            ],
        }
    }

    #[test]
    fn unconsumed_reports_only_produced() {
        let n = translate::<Item>(&event(), StatusFilter::Unconsumed).unwrap();
        assert_eq!(n.len(), 1);
        assert_eq!(n[0].status, RecordStatus::Unconsumed);
        assert_eq!(n[0].record.state.amount, 2);
    }

    #[test]
    fn consumed_reports_only_consumed() {
        let n = translate::<Item>(&event(), StatusFilter::Consumed).unwrap();
        assert_eq!(n.len(), 1);
        assert_eq!(n[0].status, RecordStatus::Consumed);
        assert_eq!(n[0].record.state.amount, 1);
    }

    #[test]
    fn all_reports_both_in_order() {
        let n = translate::<Item>(&event(), StatusFilter::All).unwrap();
        let statuses: Vec<_> = n.iter().map(|n| n.status).collect();
        assert_eq!(statuses, vec![RecordStatus::Consumed, RecordStatus::Unconsumed]);
    }

    #[test]
    fn mismatched_types_are_dropped() {
        let n = translate::<Other>(&event(), StatusFilter::All).unwrap();
        assert_eq!(n.len(), 1);
        assert_eq!(n[0].record.state.label, "x");

        let any = translate::<AnyRecord>(&event(), StatusFilter::All).unwrap();
        assert_eq!(any.len(), 3);
    }
}
