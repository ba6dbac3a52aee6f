//! Item placement encoding.
//!
//! Folds every placement section of a spoiler log through the location and
//! item tables into a fixed array of 3-digit item codes indexed by canonical
//! location index. Lookup misses never abort a run; they are collected as
//! [`LookupWarning`]s and the entry is skipped.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

use crate::names::{has_separator, strip_suffix};
use crate::spoiler::SpoilerLog;
use crate::tables::{CanonicalIndexTable, ItemTable, LocationTable};

/// Number of canonical locations the game client knows about.
pub const SLOT_COUNT: usize = 226;

/// 3-character zero-padded decimal form of an item id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemCode(String);

impl ItemCode {
    /// Written when a placement resolves to no usable item id.
    pub const NO_ITEM: &'static str = "000";

    /// Missing, negative (the table's `-1` "no item"), and zero ids all
    /// collapse to [`ItemCode::NO_ITEM`].
    pub fn from_id(id: Option<i64>) -> Self {
        match id {
            Some(id) if id > 0 => Self(format!("{id:03}")),
            _ => Self(Self::NO_ITEM.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How an unfilled slot is rendered. The two downstream consumers disagree,
/// so each deployment picks one and sticks with it.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentinel {
    /// Numeric `-1`, used by the file artifacts.
    #[default]
    Numeric,
    /// The string `"000"`, used by the in-memory client.
    Zeros,
}

impl Sentinel {
    pub fn render(self) -> Value {
        match self {
            Sentinel::Numeric => Value::from(-1),
            Sentinel::Zeros => Value::from(ItemCode::NO_ITEM),
        }
    }
}

/// Exactly [`SLOT_COUNT`] slots, each an item code or unfilled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemArray {
    slots: Vec<Option<ItemCode>>,
    sentinel: Sentinel,
}

impl ItemArray {
    pub fn new(sentinel: Sentinel) -> Self {
        Self {
            slots: vec![None; SLOT_COUNT],
            sentinel,
        }
    }

    pub fn sentinel(&self) -> Sentinel {
        self.sentinel
    }

    /// Writes `code` at `index`, returning the code it replaced. Out of range
    /// writes are ignored.
    pub fn set(&mut self, index: usize, code: ItemCode) -> Option<ItemCode> {
        self.slots.get_mut(index).and_then(|slot| slot.replace(code))
    }

    pub fn get(&self, index: usize) -> Option<&ItemCode> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// A slot counts as unfilled when its rendered value equals the sentinel,
    /// so under [`Sentinel::Zeros`] an explicit no-item code is unfilled too.
    pub fn is_unfilled(&self, index: usize) -> bool {
        match self.slots.get(index) {
            Some(None) => true,
            Some(Some(code)) => {
                self.sentinel == Sentinel::Zeros && code.as_str() == ItemCode::NO_ITEM
            }
            None => false,
        }
    }

    pub fn unfilled_indices(&self) -> Vec<usize> {
        (0..self.slots.len())
            .filter(|&i| self.is_unfilled(i))
            .collect()
    }

    pub fn placed_count(&self) -> usize {
        self.slots.len() - self.unfilled_indices().len()
    }

    /// Item codes by how often they were placed, most frequent first.
    pub fn distribution(&self) -> Vec<(ItemCode, usize)> {
        let mut counts: HashMap<&ItemCode, usize> = HashMap::new();
        for (i, slot) in self.slots.iter().enumerate() {
            if let Some(code) = slot {
                if !self.is_unfilled(i) {
                    *counts.entry(code).or_default() += 1;
                }
            }
        }

        let mut out: Vec<_> = counts
            .into_iter()
            .map(|(code, n)| (code.clone(), n))
            .collect();
        out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        out
    }

    /// The array as the client consumes it: code strings, with unfilled
    /// slots rendered as the sentinel.
    pub fn to_json_value(&self) -> Value {
        Value::Array(
            self.slots
                .iter()
                .map(|slot| match slot {
                    Some(code) => Value::from(code.as_str()),
                    None => self.sentinel.render(),
                })
                .collect(),
        )
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    LocationNotFound,
    ItemNotFound,
    IndexOutOfRange,
}

/// A spoiler entry that could not be placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupWarning {
    #[serde(rename = "type")]
    pub kind: WarningKind,
    pub location_name: String,
    pub original_location_name: String,
    pub item_name: String,
    pub section: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<i64>,
    pub message: String,
}

/// Output of [`encode`].
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub items: ItemArray,
    pub warnings: Vec<LookupWarning>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnmappedSummary {
    pub total_indices: usize,
    pub unmapped_count: usize,
    pub mapped_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnmappedLocation {
    pub index: usize,
    pub detailed_map_name: String,
    pub note: String,
}

/// Canonical indices no spoiler entry filled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnmappedReport {
    pub summary: UnmappedSummary,
    pub unmapped_locations: Vec<UnmappedLocation>,
}

impl Placement {
    pub fn unmapped_report(&self, canonical: Option<&CanonicalIndexTable>) -> UnmappedReport {
        let unmapped_locations: Vec<_> = self
            .items
            .unfilled_indices()
            .into_iter()
            .map(|index| UnmappedLocation {
                index,
                detailed_map_name: canonical
                    .and_then(|table| table.label(index))
                    .unwrap_or("Unknown")
                    .to_string(),
                note: "No item placed at this location in spoiler log".to_string(),
            })
            .collect();

        UnmappedReport {
            summary: UnmappedSummary {
                total_indices: self.items.len(),
                unmapped_count: unmapped_locations.len(),
                mapped_count: self.items.len() - unmapped_locations.len(),
            },
            unmapped_locations,
        }
    }
}

/// Places every item of `log` at its canonical index.
///
/// Sections are visited in log order and entries in section order; when two
/// entries resolve to the same index the later one wins.
pub fn encode(
    log: &SpoilerLog,
    items: &ItemTable,
    locations: &LocationTable,
    sentinel: Sentinel,
) -> Placement {
    let mut array = ItemArray::new(sentinel);
    let mut warnings = Vec::new();

    for (section, body) in log.placement_sections() {
        tracing::debug!(section, entries = body.len(), "encoding section");

        for (raw_location, value) in body {
            // Boss names and other markers have no separator.
            let Some(raw_item) = value.as_str().filter(|v| has_separator(v)) else {
                continue;
            };

            let location_name = strip_suffix(raw_location);
            let item_name = strip_suffix(raw_item);
            let mut miss = |kind, index, message: String| {
                tracing::warn!(section, "{message}");
                warnings.push(LookupWarning {
                    kind,
                    location_name: location_name.to_string(),
                    original_location_name: raw_location.clone(),
                    item_name: item_name.to_string(),
                    section: section.to_string(),
                    index,
                    message,
                });
            };

            let Some(location) = locations.get(location_name) else {
                miss(
                    WarningKind::LocationNotFound,
                    None,
                    format!("Warning: Location \"{location_name}\" not found in mapping"),
                );
                continue;
            };

            let Some(item) = items.get(item_name) else {
                miss(
                    WarningKind::ItemNotFound,
                    location.canonical_index,
                    format!("Warning: Item \"{item_name}\" not found in mapping"),
                );
                continue;
            };

            let slot = location
                .canonical_index
                .and_then(|i| usize::try_from(i).ok())
                .filter(|&i| i < SLOT_COUNT);
            let Some(slot) = slot else {
                let shown = location
                    .canonical_index
                    .map_or_else(|| "missing".to_string(), |i| i.to_string());
                miss(
                    WarningKind::IndexOutOfRange,
                    location.canonical_index,
                    format!(
                        "Warning: Invalid location index {shown} for location \"{location_name}\""
                    ),
                );
                continue;
            };

            let code = ItemCode::from_id(item.id());
            if let Some(previous) = array.set(slot, code.clone()) {
                tracing::warn!(
                    section,
                    index = slot,
                    "location \"{location_name}\" overwrites item {previous} with {code}"
                );
            }
        }
    }

    Placement {
        items: array,
        warnings,
    }
}
