use std::collections::HashMap;

use super::record::UNKNOWN_SERIES_DESCRIPTION;
use super::ObjectRecord;
use crate::error::AggregationError;

/// Frames sharing one series id, ordered by instance number.
#[derive(Debug, Clone)]
pub struct Series {
    series_id: String,
    description: String,
    records: Vec<ObjectRecord>,
}

impl Series {
    pub fn series_id(&self) -> &str {
        &self.series_id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn frames(&self) -> &[ObjectRecord] {
        &self.records
    }

    pub fn frame(&self, index: usize) -> Option<&ObjectRecord> {
        self.records.get(index)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// True when no frame in the series had a recognized layout.
    pub fn is_synthetic(&self) -> bool {
        self.records.iter().all(|record| !record.parsed())
    }
}

/// Groups records by series id in first-seen order and sorts each group by
/// instance number. Ties keep their input order.
pub fn aggregate(records: Vec<ObjectRecord>) -> Result<Vec<Series>, AggregationError> {
    if records.is_empty() {
        return Err(AggregationError::NoContent);
    }

    let total = records.len();
    let mut groups: Vec<Vec<ObjectRecord>> = Vec::new();
    let mut slots: HashMap<String, usize> = HashMap::new();

    for record in records {
        let slot = *slots
            .entry(record.series_id().to_string())
            .or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
        groups[slot].push(record);
    }

    let series: Vec<Series> = groups
        .into_iter()
        .map(|mut records| {
            let description = records
                .iter()
                .find(|record| record.has_description())
                .map(|record| record.series_description().to_string())
                .unwrap_or_else(|| UNKNOWN_SERIES_DESCRIPTION.to_string());
            let series_id = records[0].series_id().to_string();
            records.sort_by_key(|record| record.instance_number());
            Series {
                series_id,
                description,
                records,
            }
        })
        .collect();

    log::debug!("Aggregated {total} object(s) into {} series", series.len());
    Ok(series)
}
