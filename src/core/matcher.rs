use crate::core::geo::GeoPoint;
use crate::domain::model::{
    Dataset, MatchOutcome, MatchPolicy, MatchResult, SensorRecord, SkippedComparison,
};
use crate::utils::error::SensorMatchError;

/// Two records closer than this are considered the same signal.
pub const MATCH_THRESHOLD_M: f64 = 100.0;

/// Matches sensor one against sensor two with the default first-match policy.
pub fn match_sensors(sensor_one: &[SensorRecord], sensor_two: &[SensorRecord]) -> MatchResult {
    Matcher::default().run(sensor_one, sensor_two).result
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Matcher {
    policy: MatchPolicy,
}

impl Matcher {
    pub fn new(policy: MatchPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    /// Scans every sensor-one record against sensor two in order. A
    /// comparison whose records lack a field is skipped and the scan moves on
    /// to the next sensor-two record.
    pub fn run(&self, sensor_one: &[SensorRecord], sensor_two: &[SensorRecord]) -> MatchOutcome {
        let mut result = MatchResult::new();
        let mut skipped = Vec::new();
        let mut comparisons = 0;
        let mut matched_records = 0;

        for (i, r1) in sensor_one.iter().enumerate() {
            let mut matched = false;

            for (j, r2) in sensor_two.iter().enumerate() {
                comparisons += 1;

                match compare(r1, i, r2, j) {
                    Ok(Some((id1, id2))) => {
                        tracing::trace!(sensor_one_id = id1, sensor_two_id = id2, "match");
                        result.record(id1, id2);
                        matched = true;
                        if self.policy == MatchPolicy::FirstMatch {
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(missing) => {
                        tracing::warn!(
                            "Skipping comparison ({}, {}): {}",
                            i,
                            j,
                            SensorMatchError::from(missing)
                        );
                        skipped.push(SkippedComparison {
                            sensor_one_index: i,
                            sensor_two_index: j,
                            dataset: missing.dataset,
                            field: missing.field,
                        });
                    }
                }
            }

            if matched {
                matched_records += 1;
            }
        }

        tracing::debug!(
            comparisons,
            matched_records,
            keys = result.len(),
            skipped = skipped.len(),
            policy = %self.policy,
            "matching pass complete"
        );

        MatchOutcome {
            result,
            policy: self.policy,
            comparisons,
            matched_records,
            skipped,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct MissingField {
    dataset: Dataset,
    index: usize,
    field: &'static str,
}

impl From<MissingField> for SensorMatchError {
    fn from(missing: MissingField) -> Self {
        SensorMatchError::MissingField {
            dataset: missing.dataset.to_string(),
            index: missing.index,
            field: missing.field,
        }
    }
}

/// Coordinates are read first; ids are only needed once the pair is known to
/// be within range.
fn compare(
    r1: &SensorRecord,
    i: usize,
    r2: &SensorRecord,
    j: usize,
) -> Result<Option<(i64, i64)>, MissingField> {
    let p1 = point(r1, Dataset::SensorOne, i)?;
    let p2 = point(r2, Dataset::SensorTwo, j)?;

    if p1.distance_to(&p2) >= MATCH_THRESHOLD_M {
        return Ok(None);
    }

    let id1 = require(r1.id, Dataset::SensorOne, i, "id")?;
    let id2 = require(r2.id, Dataset::SensorTwo, j, "id")?;
    Ok(Some((id1, id2)))
}

fn point(
    record: &SensorRecord,
    dataset: Dataset,
    index: usize,
) -> Result<GeoPoint, MissingField> {
    let lat = require(record.latitude, dataset, index, "latitude")?;
    let lon = require(record.longitude, dataset, index, "longitude")?;
    Ok(GeoPoint::new(lat, lon))
}

fn require<T>(
    value: Option<T>,
    dataset: Dataset,
    index: usize,
    field: &'static str,
) -> Result<T, MissingField> {
    value.ok_or(MissingField {
        dataset,
        index,
        field,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::MatchValue;

    #[test]
    fn test_empty_sensor_one_gives_empty_result() {
        let sensor_two = vec![SensorRecord::new(10, 0.0, 0.0)];
        assert!(match_sensors(&[], &sensor_two).is_empty());
    }

    #[test]
    fn test_no_pair_within_threshold() {
        let sensor_one = vec![SensorRecord::new(1, 0.0, 0.0), SensorRecord::new(2, 1.0, 1.0)];
        let sensor_two = vec![SensorRecord::new(10, 0.01, 0.0), SensorRecord::new(11, 2.0, 2.0)];
        assert!(match_sensors(&sensor_one, &sensor_two).is_empty());
    }

    #[test]
    fn test_first_qualifying_record_wins() {
        let sensor_one = vec![SensorRecord::new(1, 0.0, 0.0)];
        let sensor_two = vec![
            SensorRecord::new(10, 0.0, 0.0),
            SensorRecord::new(11, 0.0009, 0.0),
        ];
        let result = match_sensors(&sensor_one, &sensor_two);
        assert_eq!(result.len(), 1);
        assert_eq!(result.get(1), Some(&MatchValue::Single(10)));
    }

    #[test]
    fn test_scan_stops_at_first_match_even_if_later_is_closer() {
        let sensor_one = vec![SensorRecord::new(1, 0.0, 0.0)];
        let sensor_two = vec![
            SensorRecord::new(10, 0.0005, 0.0),
            SensorRecord::new(11, 0.0, 0.0),
        ];
        let outcome = Matcher::default().run(&sensor_one, &sensor_two);
        assert_eq!(outcome.result.get(1), Some(&MatchValue::Single(10)));
        assert_eq!(outcome.comparisons, 1);
    }

    #[test]
    fn test_threshold_is_strict() {
        // 100 m exactly along a meridian
        let dlat = (MATCH_THRESHOLD_M / crate::core::geo::EARTH_RADIUS_M).to_degrees();
        let sensor_one = vec![SensorRecord::new(1, 0.0, 0.0)];
        let just_outside = vec![SensorRecord::new(10, dlat * 1.0001, 0.0)];
        let just_inside = vec![SensorRecord::new(11, dlat * 0.9999, 0.0)];
        assert!(match_sensors(&sensor_one, &just_outside).is_empty());
        assert_eq!(match_sensors(&sensor_one, &just_inside).len(), 1);
    }

    #[test]
    fn test_repeated_sensor_one_id_accumulates() {
        let sensor_one = vec![SensorRecord::new(1, 0.0, 0.0), SensorRecord::new(1, 0.0, 0.0)];
        let sensor_two = vec![
            SensorRecord::new(10, 0.0, 0.0),
            SensorRecord::new(11, 0.0005, 0.0),
        ];
        let result = match_sensors(&sensor_one, &sensor_two);
        assert_eq!(result.len(), 1);
        assert_eq!(result.get(1), Some(&MatchValue::Multiple(vec![10, 10])));
    }

    #[test]
    fn test_all_matches_policy_collects_every_neighbour() {
        let sensor_one = vec![SensorRecord::new(1, 0.0, 0.0), SensorRecord::new(2, 5.0, 5.0)];
        let sensor_two = vec![
            SensorRecord::new(10, 0.0, 0.0),
            SensorRecord::new(11, 0.0005, 0.0),
            SensorRecord::new(12, 0.5, 0.0),
        ];
        let outcome = Matcher::new(MatchPolicy::AllMatches).run(&sensor_one, &sensor_two);
        assert_eq!(outcome.result.get(1), Some(&MatchValue::Multiple(vec![10, 11])));
        assert!(!outcome.result.contains(2));
        assert_eq!(outcome.comparisons, 6);
        assert_eq!(outcome.matched_records, 1);
    }

    #[test]
    fn test_sensor_two_record_can_be_claimed_twice() {
        let sensor_one = vec![SensorRecord::new(1, 0.0, 0.0), SensorRecord::new(2, 0.0001, 0.0)];
        let sensor_two = vec![SensorRecord::new(10, 0.0, 0.0)];
        let result = match_sensors(&sensor_one, &sensor_two);
        assert_eq!(result.get(1), Some(&MatchValue::Single(10)));
        assert_eq!(result.get(2), Some(&MatchValue::Single(10)));
        assert_eq!(result.keys().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_missing_field_skips_only_that_comparison() {
        let sensor_one = vec![SensorRecord::new(1, 0.0, 0.0)];
        let sensor_two = vec![
            SensorRecord {
                id: Some(10),
                latitude: None,
                longitude: Some(0.0),
            },
            SensorRecord::new(11, 0.0, 0.0),
        ];
        let outcome = Matcher::default().run(&sensor_one, &sensor_two);
        assert_eq!(outcome.result.get(1), Some(&MatchValue::Single(11)));
        assert_eq!(
            outcome.skipped,
            vec![SkippedComparison {
                sensor_one_index: 0,
                sensor_two_index: 0,
                dataset: Dataset::SensorTwo,
                field: "latitude",
            }]
        );
    }

    #[test]
    fn test_missing_id_only_matters_for_close_pairs() {
        let sensor_one = vec![SensorRecord {
            id: None,
            latitude: Some(0.0),
            longitude: Some(0.0),
        }];
        let sensor_two = vec![
            SensorRecord::new(10, 3.0, 3.0),
            SensorRecord::new(11, 0.0, 0.0),
        ];
        let outcome = Matcher::default().run(&sensor_one, &sensor_two);
        assert!(outcome.result.is_empty());
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].sensor_two_index, 1);
        assert_eq!(outcome.skipped[0].field, "id");
        assert_eq!(outcome.skipped[0].dataset, Dataset::SensorOne);
    }
}
