use serde_json::{Map, Value};
use std::collections::HashMap;
use std::str::FromStr;

use crate::placement::{ItemArray, ItemCode};
use crate::{Result, SpoilerError};

/// Reads an integer out of a JSON value, accepting integral floats.
fn integral(value: &Value) -> Option<i64> {
    if let Some(n) = value.as_i64() {
        return Some(n);
    }
    value
        .as_f64()
        .filter(|f| f.is_finite() && f.fract() == 0.0)
        .map(|f| f as i64)
}

fn parse_object(kind: &'static str, text: &str) -> Result<Map<String, Value>> {
    match serde_json::from_str::<Value>(text)? {
        Value::Object(map) => Ok(map),
        other => Err(SpoilerError::InvalidInput(format!(
            "{kind} must be a JSON object, got {}",
            json_type_name(&other)
        ))),
    }
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Name-keyed table that remembers the order entries were listed in.
#[derive(Debug, Clone, Default)]
struct OrderedTable<T> {
    entries: Vec<(String, T)>,
    index: HashMap<String, usize>,
}

impl<T> OrderedTable<T> {
    fn insert(&mut self, name: String, value: T) {
        if let Some(&pos) = self.index.get(&name) {
            self.entries[pos].1 = value;
        } else {
            self.index.insert(name.clone(), self.entries.len());
            self.entries.push((name, value));
        }
    }

    fn get(&self, name: &str) -> Option<&T> {
        self.index.get(name).map(|&pos| &self.entries[pos].1)
    }

    fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// One row of the item table. The whole upstream value is kept, even when it
/// is not an object, so that rewriting the table never loses rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemRecord {
    value: Value,
}

impl ItemRecord {
    pub fn new(value: Value) -> Self {
        Self { value }
    }

    /// Numeric item id; `None` when missing, not a number, or the row is
    /// not an object.
    pub fn id(&self) -> Option<i64> {
        self.value.get("id").and_then(integral)
    }

    pub fn long_name(&self) -> Option<&str> {
        self.value.get("longName").and_then(Value::as_str)
    }

    pub fn is_object(&self) -> bool {
        self.value.is_object()
    }

    pub fn value(&self) -> &Value {
        &self.value
    }
}

/// Item name (without the copy marker) to item record.
#[derive(Debug, Clone, Default)]
pub struct ItemTable {
    items: OrderedTable<ItemRecord>,
}

impl ItemTable {
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(Self::from_map(parse_object("item table", text)?))
    }

    /// Every row is kept. Rows that are not objects never match a lookup.
    pub fn from_map(map: Map<String, Value>) -> Self {
        let mut items = OrderedTable::default();
        for (name, value) in map {
            if !value.is_object() {
                tracing::debug!(
                    "item table entry {name:?} is {}, not an object; it will not match lookups",
                    json_type_name(&value)
                );
            }
            items.insert(name, ItemRecord::new(value));
        }
        Self { items }
    }

    pub fn get(&self, name: &str) -> Option<&ItemRecord> {
        self.items.get(name).filter(|record| record.is_object())
    }

    /// Number of rows, including rows that never match a lookup.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.len() == 0
    }

    /// Entries ordered by ascending id. Records without an id go last;
    /// ties keep their listed order.
    pub fn sorted_by_id(&self) -> Vec<(&str, &ItemRecord)> {
        let mut sorted: Vec<_> = self.items.iter().collect();
        sorted.sort_by_key(|(_, record)| (record.id().is_none(), record.id()));
        sorted
    }

    /// Pretty JSON of the table in ascending id order.
    pub fn to_json_pretty(&self) -> Result<String> {
        let mut out = Map::new();
        for (name, record) in self.sorted_by_id() {
            out.insert(name.to_string(), record.value().clone());
        }
        Ok(serde_json::to_string_pretty(&Value::Object(out))?)
    }

    /// Display name of the item whose code matches, or `"Unknown Item"`.
    pub fn name_for_code(&self, code: &str) -> &str {
        self.items
            .iter()
            .find(|(_, record)| {
                record
                    .id()
                    .is_some_and(|id| ItemCode::from_id(Some(id)).as_str() == code)
            })
            .and_then(|(_, record)| record.long_name())
            .unwrap_or("Unknown Item")
    }
}

impl FromStr for ItemTable {
    type Err = SpoilerError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_json_str(s)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LocationRecord {
    /// Position in the item array. Signed and optional so that bad upstream
    /// values reach the encoder's bound check instead of failing the parse.
    pub canonical_index: Option<i64>,
}

/// Spoiler-log location name (without the copy marker) to canonical index.
#[derive(Debug, Clone, Default)]
pub struct LocationTable {
    locations: OrderedTable<LocationRecord>,
}

impl LocationTable {
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(Self::from_map(parse_object("location table", text)?))
    }

    pub fn from_map(map: Map<String, Value>) -> Self {
        let mut locations = OrderedTable::default();
        for (name, value) in map {
            match value {
                Value::Object(fields) => {
                    let canonical_index = fields.get("detailedMapValue").and_then(integral);
                    locations.insert(name, LocationRecord { canonical_index });
                }
                other => tracing::debug!(
                    "ignoring location table entry {name:?}: expected object, got {}",
                    json_type_name(&other)
                ),
            }
        }
        Self { locations }
    }

    pub fn insert(&mut self, name: impl Into<String>, canonical_index: i64) {
        self.locations.insert(
            name.into(),
            LocationRecord {
                canonical_index: Some(canonical_index),
            },
        );
    }

    pub fn get(&self, name: &str) -> Option<&LocationRecord> {
        self.locations.get(name)
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.len() == 0
    }

    /// First listed location name that maps to `index`.
    pub fn name_for_index(&self, index: usize) -> String {
        self.locations
            .iter()
            .find(|(_, record)| record.canonical_index == i64::try_from(index).ok())
            .map(|(name, _)| name.to_string())
            .unwrap_or_else(|| format!("Unknown Location {index}"))
    }
}

impl FromStr for LocationTable {
    type Err = SpoilerError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_json_str(s)
    }
}

/// Canonical index to a human-readable label. Diagnostics only.
#[derive(Debug, Clone, Default)]
pub struct CanonicalIndexTable {
    labels: HashMap<String, String>,
}

impl CanonicalIndexTable {
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(Self::from_map(parse_object("canonical index table", text)?))
    }

    /// Upstream ships this table in either orientation: `index -> label`
    /// or `label -> index`. Numeric values are inverted, string values are
    /// taken as labels. When several labels share an index the last wins.
    pub fn from_map(map: Map<String, Value>) -> Self {
        let mut labels = HashMap::new();
        for (key, value) in map {
            if let Some(label) = value.as_str() {
                labels.insert(key, label.to_string());
            } else if let Some(index) = integral(&value) {
                labels.insert(index.to_string(), key);
            } else {
                tracing::debug!(
                    "ignoring canonical index entry {key:?}: got {}",
                    json_type_name(&value)
                );
            }
        }
        Self { labels }
    }

    pub fn insert(&mut self, index: usize, label: impl Into<String>) {
        self.labels.insert(index.to_string(), label.into());
    }

    pub fn label(&self, index: usize) -> Option<&str> {
        self.labels.get(&index.to_string()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl FromStr for CanonicalIndexTable {
    type Err = SpoilerError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_json_str(s)
    }
}

/// What sits at one canonical index after encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationDetails {
    pub index: usize,
    pub location_name: String,
    pub item_code: Option<String>,
    pub item_name: String,
}

pub fn describe_location(
    index: usize,
    array: &ItemArray,
    items: &ItemTable,
    locations: &LocationTable,
) -> LocationDetails {
    let item_code = array.get(index).map(|code| code.as_str().to_string());
    let item_name = match item_code.as_deref() {
        Some(code) => items.name_for_code(code).to_string(),
        None => "Unknown Item".to_string(),
    };

    LocationDetails {
        index,
        location_name: locations.name_for_index(index),
        item_code,
        item_name,
    }
}
