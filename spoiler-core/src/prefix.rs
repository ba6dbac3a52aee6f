use serde_json::{Map, Value};
use std::fmt;
use std::ops::Deref;

use crate::names::strip_suffix;
use crate::spoiler::SpoilerLog;
use crate::{Result, SpoilerError};

pub const PREFIX_LEN: usize = 40;

/// Seed/version segment the client expects in characters 0..20. It is not
/// derived from the log.
pub const SEED_PLACEHOLDER: &str = "000001xXJAo0A0ebe3WP";

const SETTINGS_LEN: usize = 11;

type Enumeration = &'static [(&'static str, char)];

const ITEM_PLACEMENT: Enumeration = &[("basic", '0'), ("advanced", '1')];
const DUNGEON_ITEMS: Enumeration = &[("standard", '0'), ("mc", '1'), ("mcs", '2'), ("full", '3')];
const ACCESSIBILITY: Enumeration = &[("items", '0'), ("locations", '1'), ("none", '2')];
const GOAL: Enumeration = &[
    ("ganon", '0'),
    ("dungeons", '1'),
    ("pedestal", '2'),
    ("triforce", '3'),
    ("fast_ganon", '4'),
];
const MODE: Enumeration = &[("standard", '0'), ("open", '1'), ("inverted", '2')];
const ENEMIZER: Enumeration = &[("none", '0'), ("simple", '1'), ("full", '2'), ("random", '3')];
const WEAPONS: Enumeration = &[
    ("randomized", '0'),
    ("assured", '1'),
    ("vanilla", '2'),
    ("swordless", '3'),
];
const MEDALLION: Enumeration = &[("bombos", '0'), ("ether", '1'), ("quake", '2')];

const MISERY_MIRE_MEDALLION: &str = "Misery Mire Medallion";
const TURTLE_ROCK_MEDALLION: &str = "Turtle Rock Medallion";

/// The 40-character settings prefix handed to the client.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SettingsPrefix(String);

impl SettingsPrefix {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Characters 20..31, one per encoded setting.
    pub fn settings(&self) -> &str {
        &self.0[SEED_PLACEHOLDER.len()..SEED_PLACEHOLDER.len() + SETTINGS_LEN]
    }
}

impl Deref for SettingsPrefix {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SettingsPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Non-empty text of a meta field. Numbers are accepted and printed.
fn field_text(section: &Map<String, Value>, field: &str) -> Option<String> {
    match section.get(field)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn lookup(table: Enumeration, value: &str) -> Option<char> {
    table
        .iter()
        .find(|(name, _)| *name == value)
        .map(|&(_, digit)| digit)
}

fn category_or_zero(meta: &Map<String, Value>, field: &str, table: Enumeration) -> char {
    field_text(meta, field)
        .and_then(|value| lookup(table, &value))
        .unwrap_or('0')
}

fn verbatim_digit(meta: &Map<String, Value>, field: &str) -> Result<char> {
    let Some(value) = field_text(meta, field) else {
        return Ok('0');
    };

    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_digit() => Ok(c),
        _ => Err(SpoilerError::InvalidInput(format!(
            "meta field {field} must be a single digit, got {value:?}"
        ))),
    }
}

fn enemizer(meta: &Map<String, Value>) -> Result<char> {
    let value = field_text(meta, "enemizer").unwrap_or_else(|| "none".to_string());
    lookup(ENEMIZER, &value).ok_or(SpoilerError::UnmappedCategory {
        field: "enemizer",
        value,
    })
}

/// Medallion choice from the `Special` section. Keys and values carry the
/// copy marker; values read like `"Ether Medallion"`.
fn medallion(special: Option<&Map<String, Value>>, key: &str) -> char {
    let value = special.and_then(|section| {
        section
            .iter()
            .find(|(k, _)| strip_suffix(k) == key)
            .and_then(|(_, v)| v.as_str())
    });

    let Some(value) = value else {
        return '0';
    };

    let name = strip_suffix(value).to_lowercase();
    let name = name.strip_suffix(" medallion").unwrap_or(&name);
    lookup(MEDALLION, name).unwrap_or('0')
}

/// Encodes the log's game settings into the fixed-width prefix.
///
/// Fails when the log has no `meta` section, when a verbatim crystal count is
/// not a single digit, or when `enemizer` holds a value the client does not
/// know.
pub fn encode_prefix(log: &SpoilerLog) -> Result<SettingsPrefix> {
    let meta = log.meta().ok_or_else(|| {
        SpoilerError::InvalidInput("Invalid spoiler log: missing meta section".to_string())
    })?;
    let special = log.special();

    let settings: [char; SETTINGS_LEN] = [
        category_or_zero(meta, "item_placement", ITEM_PLACEMENT),
        category_or_zero(meta, "dungeon_items", DUNGEON_ITEMS),
        category_or_zero(meta, "accessibility", ACCESSIBILITY),
        category_or_zero(meta, "goal", GOAL),
        verbatim_digit(meta, "entry_crystals_tower")?,
        verbatim_digit(meta, "entry_crystals_ganon")?,
        category_or_zero(meta, "mode", MODE),
        enemizer(meta)?,
        category_or_zero(meta, "weapons", WEAPONS),
        medallion(special, MISERY_MIRE_MEDALLION),
        medallion(special, TURTLE_ROCK_MEDALLION),
    ];

    let mut prefix = String::with_capacity(PREFIX_LEN);
    prefix.push_str(SEED_PLACEHOLDER);
    prefix.extend(settings);
    while prefix.len() < PREFIX_LEN {
        prefix.push('0');
    }
    debug_assert_eq!(prefix.len(), PREFIX_LEN);

    tracing::debug!(settings = %settings.iter().collect::<String>(), "encoded settings prefix");
    Ok(SettingsPrefix(prefix))
}
