use crate::domain::dataset::{Averages, DatasetSummary, EquipmentRecord};
use std::collections::BTreeMap;

/// Compute the stored summary for one upload: row count, three arithmetic
/// means, and the frequency distribution of the Type column.
///
/// Callers must reject empty input upstream; the validator guarantees at
/// least one row before this runs.
pub fn summarize(records: &[EquipmentRecord]) -> DatasetSummary {
    let count = records.len() as f64;

    let mut flow_sum = 0.0;
    let mut pressure_sum = 0.0;
    let mut temperature_sum = 0.0;
    let mut type_distribution: BTreeMap<String, i64> = BTreeMap::new();

    for record in records {
        flow_sum += record.flowrate;
        pressure_sum += record.pressure;
        temperature_sum += record.temperature;
        *type_distribution
            .entry(record.equipment_type.clone())
            .or_insert(0) += 1;
    }

    DatasetSummary {
        total_count: records.len() as i64,
        averages: Averages {
            flowrate: flow_sum / count,
            pressure: pressure_sum / count,
            temperature: temperature_sum / count,
        },
        type_distribution,
    }
}
