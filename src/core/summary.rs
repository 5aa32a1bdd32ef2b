use super::record::{Record, ServiceStatus};

/// Per-status record counts shown in the dashboard header cards.
///
/// Rebuilt from scratch on every snapshot; the collection is dashboard-scale,
/// so an O(n) pass beats maintaining the counts incrementally.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusSummary {
    counts: [usize; ServiceStatus::ALL.len()],
}

impl StatusSummary {
    pub fn from_records(records: &[Record]) -> Self {
        let mut summary = Self::default();
        for record in records {
            // Foreign status strings land in no bucket.
            if let Some(status) = record.status() {
                summary.counts[Self::index(status)] += 1;
            }
        }
        summary
    }

    pub fn count(&self, status: ServiceStatus) -> usize {
        self.counts[Self::index(status)]
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    fn index(status: ServiceStatus) -> usize {
        ServiceStatus::ALL
            .iter()
            .position(|s| *s == status)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(status: &str) -> Record {
        Record {
            id: String::new(),
            title: "KITAS".to_string(),
            passport_number: None,
            description: "Extension".to_string(),
            date_entered: None,
            status: status.to_string(),
            timestamp: None,
            created_by: String::new(),
        }
    }

    #[test]
    fn empty_list_is_all_zeroes() {
        let summary = StatusSummary::from_records(&[]);
        for status in ServiceStatus::ALL {
            assert_eq!(summary.count(*status), 0);
        }
    }

    #[test]
    fn buckets_match_statuses() {
        let records = vec![
            record("intake"),
            record("intake"),
            record("pending"),
            record("follow-up"),
            record("done"),
        ];
        let summary = StatusSummary::from_records(&records);
        assert_eq!(summary.count(ServiceStatus::Intake), 2);
        assert_eq!(summary.count(ServiceStatus::Verified), 0);
        assert_eq!(summary.count(ServiceStatus::Pending), 1);
        assert_eq!(summary.count(ServiceStatus::FollowUp), 1);
        assert_eq!(summary.count(ServiceStatus::Done), 1);
    }

    #[test]
    fn foreign_statuses_are_excluded_from_every_bucket() {
        let records = vec![record("intake"), record("archived"), record("INTAKE")];
        let summary = StatusSummary::from_records(&records);
        assert_eq!(summary.total(), 1);
    }

    #[test]
    fn bucket_sum_counts_only_known_statuses() {
        let records = vec![
            record("verified"),
            record("done"),
            record("bogus"),
            record("pending"),
        ];
        let summary = StatusSummary::from_records(&records);
        let known = records.iter().filter(|r| r.status().is_some()).count();
        assert_eq!(summary.total(), known);
    }
}
