use crate::utils::error::Result;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

/// One row of sensor data. Cells may be absent in the source file, so every
/// field is optional; the matcher reports absent fields per comparison.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorRecord {
    pub id: Option<i64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl SensorRecord {
    pub fn new(id: i64, latitude: f64, longitude: f64) -> Self {
        Self {
            id: Some(id),
            latitude: Some(latitude),
            longitude: Some(longitude),
        }
    }
}

/// Which of the two inputs a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dataset {
    SensorOne,
    SensorTwo,
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dataset::SensorOne => write!(f, "sensor one"),
            Dataset::SensorTwo => write!(f, "sensor two"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensorDatasets {
    pub sensor_one: Vec<SensorRecord>,
    pub sensor_two: Vec<SensorRecord>,
}

impl SensorDatasets {
    pub fn new(sensor_one: Vec<SensorRecord>, sensor_two: Vec<SensorRecord>) -> Self {
        Self {
            sensor_one,
            sensor_two,
        }
    }

    pub fn len(&self) -> usize {
        self.sensor_one.len() + self.sensor_two.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensor_one.is_empty() && self.sensor_two.is_empty()
    }
}

/// How many sensor-two records a single sensor-one record may claim.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "snake_case")]
pub enum MatchPolicy {
    /// Stop scanning sensor two at the first record under the threshold.
    /// Several ids accumulate under one key only when that id repeats in
    /// sensor one.
    #[default]
    #[serde(alias = "first-match")]
    FirstMatch,
    /// Record every sensor-two record under the threshold.
    #[serde(alias = "all-matches")]
    AllMatches,
}

impl fmt::Display for MatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchPolicy::FirstMatch => write!(f, "first_match"),
            MatchPolicy::AllMatches => write!(f, "all_matches"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum MatchValue {
    Single(i64),
    Multiple(Vec<i64>),
}

impl MatchValue {
    pub fn push(&mut self, id: i64) {
        match self {
            MatchValue::Single(first) => {
                let first = *first;
                *self = MatchValue::Multiple(vec![first, id]);
            }
            MatchValue::Multiple(ids) => ids.push(id),
        }
    }

    pub fn ids(&self) -> &[i64] {
        match self {
            MatchValue::Single(id) => std::slice::from_ref(id),
            MatchValue::Multiple(ids) => ids,
        }
    }
}

/// Sensor-one id to matched sensor-two id(s), kept in first-insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchResult {
    entries: Vec<(i64, MatchValue)>,
    positions: HashMap<i64, usize>,
}

impl MatchResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `sensor_two_id` under `sensor_one_id`, creating the entry as a
    /// single value or appending to an existing one.
    pub fn record(&mut self, sensor_one_id: i64, sensor_two_id: i64) {
        match self.positions.get(&sensor_one_id) {
            Some(&pos) => self.entries[pos].1.push(sensor_two_id),
            None => {
                self.positions.insert(sensor_one_id, self.entries.len());
                self.entries
                    .push((sensor_one_id, MatchValue::Single(sensor_two_id)));
            }
        }
    }

    pub fn get(&self, sensor_one_id: i64) -> Option<&MatchValue> {
        self.positions
            .get(&sensor_one_id)
            .map(|&pos| &self.entries[pos].1)
    }

    pub fn contains(&self, sensor_one_id: i64) -> bool {
        self.positions.contains_key(&sensor_one_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (i64, &MatchValue)> {
        self.entries.iter().map(|(id, value)| (*id, value))
    }

    pub fn keys(&self) -> impl Iterator<Item = i64> + '_ {
        self.entries.iter().map(|(id, _)| *id)
    }

    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }
}

impl Serialize for MatchResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (id, value) in &self.entries {
            map.serialize_entry(id, value)?;
        }
        map.end()
    }
}

/// A comparison abandoned because one of its records lacked a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedComparison {
    pub sensor_one_index: usize,
    pub sensor_two_index: usize,
    pub dataset: Dataset,
    pub field: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchOutcome {
    pub result: MatchResult,
    pub policy: MatchPolicy,
    pub comparisons: usize,
    pub matched_records: usize,
    pub skipped: Vec<SkippedComparison>,
}
