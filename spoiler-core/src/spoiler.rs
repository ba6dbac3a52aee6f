use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;

use crate::tables::json_type_name;
use crate::{Result, SpoilerError};

/// Sections that never hold item placements.
pub const RESERVED_SECTIONS: [&str; 5] = ["meta", "Bosses", "playthrough", "Shops", "Equipped"];

pub const META_SECTION: &str = "meta";
pub const SPECIAL_SECTION: &str = "Special";

/// A parsed spoiler log: section name to section body, in the order the
/// log lists them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpoilerLog {
    sections: Map<String, Value>,
}

impl SpoilerLog {
    pub fn from_json_str(text: &str) -> Result<Self> {
        match serde_json::from_str::<Value>(text)? {
            Value::Object(sections) => Ok(Self { sections }),
            other => Err(SpoilerError::InvalidInput(format!(
                "spoiler log must be a JSON object, got {}",
                json_type_name(&other)
            ))),
        }
    }

    pub fn section(&self, name: &str) -> Option<&Map<String, Value>> {
        self.sections.get(name).and_then(Value::as_object)
    }

    pub fn meta(&self) -> Option<&Map<String, Value>> {
        self.section(META_SECTION)
    }

    pub fn special(&self) -> Option<&Map<String, Value>> {
        self.section(SPECIAL_SECTION)
    }

    /// Sections that may carry item placements. Reserved names are skipped,
    /// and so is any section whose body is not an object.
    pub fn placement_sections(&self) -> impl Iterator<Item = (&str, &Map<String, Value>)> {
        self.sections
            .iter()
            .filter(|(name, _)| !RESERVED_SECTIONS.contains(&name.as_str()))
            .filter_map(|(name, body)| body.as_object().map(|body| (name.as_str(), body)))
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

impl FromStr for SpoilerLog {
    type Err = SpoilerError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_json_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn skips_reserved_and_malformed_sections() {
        let log = SpoilerLog::from_json_str(
            &json!({
                "meta": { "mode": "open" },
                "Light World": { "Link's House:1": "Bow:1" },
                "Bosses": { "Eastern Palace": "Armos Knights" },
                "Broken": [1, 2, 3],
                "Nothing": null,
                "playthrough": {},
                "Shops": {},
                "Equipped": {},
                "Dark World": { "Pyramid:1": "Bombs (3):1" }
            })
            .to_string(),
        )
        .unwrap();

        let names: Vec<_> = log.placement_sections().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["Light World", "Dark World"]);
        assert_eq!(log.meta().unwrap()["mode"], json!("open"));
        assert!(log.special().is_none());
    }

    #[test]
    fn keeps_listed_section_order() {
        let text = r#"{"Zeta": {}, "Alpha": {}, "Mid": {}}"#;
        let log: SpoilerLog = text.parse().unwrap();
        let names: Vec<_> = log.placement_sections().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["Zeta", "Alpha", "Mid"]);
    }

    #[test]
    fn rejects_non_object_log() {
        assert!(matches!(
            SpoilerLog::from_json_str("\"log\""),
            Err(SpoilerError::InvalidInput(_))
        ));
        assert!(matches!(
            SpoilerLog::from_json_str("not json"),
            Err(SpoilerError::Json(_))
        ));
    }
}
