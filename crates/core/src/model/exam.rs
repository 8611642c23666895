use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::ExamRecordId;

/// Which kind of exam produced a history record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExamMode {
    Random,
    Sequential,
}

/// Immutable record appended once per submitted exam.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamRecord {
    pub id: ExamRecordId,
    #[serde(rename = "date", with = "chrono::serde::ts_milliseconds")]
    pub taken_at: DateTime<Utc>,
    pub score: u32,
    pub total: u32,
    pub mode: ExamMode,
}

impl ExamRecord {
    #[must_use]
    pub fn new(taken_at: DateTime<Utc>, score: u32, total: u32, mode: ExamMode) -> Self {
        Self {
            id: ExamRecordId::generate(),
            taken_at,
            score,
            total,
            mode,
        }
    }

    /// Score as a percentage of the total, rounded down.
    #[must_use]
    pub fn percent(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        self.score.saturating_mul(100) / self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn record_serializes_date_as_millis() {
        let record = ExamRecord::new(fixed_now(), 3, 4, ExamMode::Random);
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["date"], 1_700_000_000_000_i64);
        assert_eq!(value["mode"], "random");
        assert_eq!(record.percent(), 75);
    }
}
