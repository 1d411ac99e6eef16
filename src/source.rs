//! The seam between this crate and whatever produces policy rows.

use crate::record::PolicyRecord;
use anyhow::Result;

/// Contract for the tabular loader that feeds a portfolio.
///
/// File and wire formats live behind this seam; the crate never reads
/// delimited text itself. Implementations hand over every row in source
/// order, with the vehicle introduction date column left raw.
pub trait RecordSource {
    fn load(&mut self) -> Result<Vec<PolicyRecord>>;
}

/// Source backed by rows already in memory.
pub struct MemorySource {
    records: Vec<PolicyRecord>,
}

impl MemorySource {
    pub fn new(records: Vec<PolicyRecord>) -> Self {
        Self { records }
    }
}

impl RecordSource for MemorySource {
    fn load(&mut self) -> Result<Vec<PolicyRecord>> {
        Ok(std::mem::take(&mut self.records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Gender;

    #[test]
    fn memory_source_hands_over_its_rows() {
        let mut source = MemorySource::new(vec![PolicyRecord {
            province: "Gauteng".into(),
            gender: Gender::Male,
            vehicle_type: "Sedan".into(),
            total_premium: 1000.0,
            total_claims: 500.0,
            vehicle_intro_date: Some("6/2002".into()),
        }]);

        let records = source.load().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].province, "Gauteng");
    }

    #[test]
    fn rows_deserialize_the_way_a_loader_would_produce_them() {
        let raw = r#"[
            {
                "province": "Western Cape",
                "gender": "F",
                "vehicle_type": "SUV",
                "total_premium": 1200.0,
                "total_claims": 600.0,
                "vehicle_intro_date": "2020-06-15"
            },
            {
                "province": "Gauteng",
                "gender": "M",
                "vehicle_type": "Sedan",
                "total_premium": 1000.0,
                "total_claims": 500.0
            }
        ]"#;

        let records: Vec<PolicyRecord> = serde_json::from_str(raw).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].gender, Gender::Female);
        assert_eq!(records[1].vehicle_intro_date, None);
    }
}
