/// Character that separates an item name from its copy count in spoiler
/// values, e.g. `"Progressive Sword:1"`.
pub const SEPARATOR: char = ':';

const COPY_SUFFIX: &str = ":1";

/// Removes a single trailing `:1` copy marker.
///
/// Spoiler logs tag every location and item with the marker while the lookup
/// tables are keyed without it. Only one literal trailing marker is removed;
/// anything else comes back unchanged.
pub fn strip_suffix(name: &str) -> &str {
    name.strip_suffix(COPY_SUFFIX).unwrap_or(name)
}

/// True when a raw spoiler value looks like an item placement rather than a
/// boss name or other marker.
pub fn has_separator(value: &str) -> bool {
    value.contains(SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::{has_separator, strip_suffix};

    #[test]
    fn strips_single_trailing_marker() {
        assert_eq!(strip_suffix("Foo:1"), "Foo");
        assert_eq!(strip_suffix("Foo"), "Foo");
        assert_eq!(strip_suffix("Foo:1:1"), "Foo:1");
    }

    #[test]
    fn leaves_other_counts_alone() {
        assert_eq!(strip_suffix("Foo:2"), "Foo:2");
        assert_eq!(strip_suffix("Foo:11"), "Foo:11");
        assert_eq!(strip_suffix("Foo:1 "), "Foo:1 ");
        assert_eq!(strip_suffix(""), "");
    }

    #[test]
    fn separator_marks_item_values() {
        assert!(has_separator("Bow:1"));
        assert!(!has_separator("Armos Knights"));
    }
}
