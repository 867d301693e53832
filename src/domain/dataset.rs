use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One typed equipment row, converted from the untyped CSV representation
/// right after column validation.
#[derive(Debug, Clone, PartialEq)]
pub struct EquipmentRecord {
    pub name: String,
    pub equipment_type: String,
    pub flowrate: f64,
    pub pressure: f64,
    pub temperature: f64,
}

/// Summary statistics computed from the typed rows of one upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetSummary {
    pub total_count: i64,
    pub averages: Averages,
    pub type_distribution: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Averages {
    pub flowrate: f64,
    pub pressure: f64,
    pub temperature: f64,
}

/// A stored upload: summary plus its child equipment rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub id: i64,
    pub filename: String,
    pub upload_date: DateTime<Utc>,
    pub total_count: i64,
    pub averages: Averages,
    pub type_distribution: BTreeMap<String, i64>,

    /// Retained raw upload on disk; internal bookkeeping, not part of the
    /// wire representation.
    #[serde(skip)]
    pub file_path: String,

    pub equipment_list: Vec<Equipment>,
}

/// A stored equipment row, owned by exactly one dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Equipment {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub equipment_type: String,
    pub flowrate: f64,
    pub pressure: f64,
    pub temperature: f64,
}
