//! Reshapes grouped time series from the reporting API into one record per
//! date, ready to be stacked in an area chart.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::warn;

/// A grouped time series as returned by `/reports/reservations/series`.
///
/// The API has shipped several encodings of the same data, all accepted here:
/// a keyed object (`{"Studio A": [{date, value}], ...}`), a list of named
/// groups (`{"series": [{key, points}]}`) and flat rows (`{"rows": [{date, key,
/// value}]}` or a bare array of rows).
///
/// The `series` and `rows` envelopes only match objects with no other fields,
/// so a keyed response that happens to have a group called `rows` still
/// decodes as keyed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawSeriesResponse {
    Grouped(SeriesEnvelope),
    Rows(RowsEnvelope),
    RowList(Vec<Value>),
    Keyed(Map<String, Value>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeriesEnvelope {
    pub series: Vec<RawSeriesGroup>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RowsEnvelope {
    pub rows: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSeriesGroup {
    #[serde(alias = "name")]
    pub key: String,
    #[serde(default)]
    pub points: Vec<Value>,
}

impl Default for RawSeriesResponse {
    fn default() -> Self {
        Self::Keyed(Map::new())
    }
}

impl RawSeriesResponse {
    /// Flattens any encoding into `(key, date, value)` observations, in wire
    /// order. Records without a usable date or key are dropped.
    pub fn observations(&self) -> Vec<(String, String, f64)> {
        let mut out = Vec::new();
        match self {
            Self::Grouped(SeriesEnvelope { series }) => {
                for group in series {
                    for point in &group.points {
                        if let Some((date, value)) = read_point(point) {
                            out.push((group.key.clone(), date, value));
                        }
                    }
                }
            }
            Self::Rows(RowsEnvelope { rows }) | Self::RowList(rows) => {
                for row in rows {
                    let key = row
                        .get("key")
                        .or_else(|| row.get("group"))
                        .and_then(Value::as_str);
                    if let (Some(key), Some((date, value))) = (key, read_point(row)) {
                        out.push((key.to_string(), date, value));
                    }
                }
            }
            Self::Keyed(groups) => {
                for (key, points) in groups {
                    let Some(points) = points.as_array() else {
                        continue;
                    };
                    for point in points {
                        if let Some((date, value)) = read_point(point) {
                            out.push((key.clone(), date, value));
                        }
                    }
                }
            }
        }
        out
    }
}

fn read_point(point: &Value) -> Option<(String, f64)> {
    let date = point.get("date").and_then(Value::as_str)?.trim();
    if date.is_empty() {
        return None;
    }
    let value = ["value", "count", "total"]
        .iter()
        .find_map(|field| point.get(*field).and_then(Value::as_f64))
        .unwrap_or(0.0);
    Some((date.to_string(), value))
}

/// Field holding the date in a serialized [`ChartPoint`]. A series may not use it as its key.
pub const DATE_FIELD: &str = "name";

/// One date's values across every series key of a response.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartPoint {
    pub name: String,
    pub values: Vec<(String, f64)>,
}

impl ChartPoint {
    pub fn get(&self, key: &str) -> Option<f64> {
        self.values
            .iter()
            .find(|(candidate, _)| candidate == key)
            .map(|(_, value)| *value)
    }
}

impl Serialize for ChartPoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len() + 1))?;
        map.serialize_entry(DATE_FIELD, &self.name)?;
        for (key, value) in &self.values {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

pub fn transform(raw: &RawSeriesResponse) -> Vec<ChartPoint> {
    let mut keys: Vec<String> = Vec::new();
    let mut key_index: HashMap<String, usize> = HashMap::new();
    let mut by_date: BTreeMap<String, HashMap<usize, f64>> = BTreeMap::new();

    for (key, date, value) in raw.observations() {
        if key == DATE_FIELD {
            warn!(%date, "dropping series whose key collides with the date field");
            continue;
        }
        let next = keys.len();
        let index = *key_index.entry(key.clone()).or_insert_with(|| {
            keys.push(key);
            next
        });
        *by_date.entry(date).or_default().entry(index).or_insert(0.0) += value;
    }

    by_date
        .into_iter()
        .map(|(date, values)| ChartPoint {
            name: date,
            values: keys
                .iter()
                .enumerate()
                .map(|(index, key)| (key.clone(), values.get(&index).copied().unwrap_or(0.0)))
                .collect(),
        })
        .collect()
}

/// Distinct series keys in first-seen order. Colors are assigned by position
/// in this list, so the order must not change between renders.
pub fn series_keys(points: &[ChartPoint]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut keys = Vec::new();
    for point in points {
        for (key, _) in &point.values {
            if seen.insert(key.as_str()) {
                keys.push(key.clone());
            }
        }
    }
    keys
}
