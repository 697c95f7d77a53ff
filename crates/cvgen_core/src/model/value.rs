//! Helpers over loosely-typed structured values.
//!
//! Document content is heterogeneous: the same attribute may hold text, a
//! number, or a nested list depending on who wrote the file. These helpers
//! give the rest of core one consistent reading of such values.

use serde_yaml::Value;

/// Returns the text form of a scalar value.
///
/// Strings, numbers and booleans are scalars. `null`, sequences and
/// mappings are not and yield `None`.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Tagged(tagged) => scalar_text(&tagged.value),
        Value::Null | Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

/// Returns a stable shape name used in error messages.
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged",
    }
}

/// Loose truthiness used for hand-written flags such as `left: yes`.
///
/// Empty strings, zero, empty collections and `null` are false.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().map_or(true, |n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Sequence(items) => !items.is_empty(),
        Value::Mapping(entries) => !entries.is_empty(),
        Value::Tagged(tagged) => is_truthy(&tagged.value),
    }
}

/// Returns whether the value carries no renderable content.
///
/// `null` and whitespace-only text are blank; everything else is not.
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.trim().is_empty(),
        Value::Tagged(tagged) => is_blank(&tagged.value),
        _ => false,
    }
}

/// Converts a snake_case key into a human label.
///
/// Underscores become spaces and every word is title-cased:
/// `skills_used` -> `Skills Used`, `work_EXPERIENCE` -> `Work Experience`.
pub fn humanize_key(key: &str) -> String {
    let spaced = key.replace('_', " ");
    let mut label = String::with_capacity(spaced.len());
    let mut previous_cased = false;
    for ch in spaced.chars() {
        if ch.is_alphabetic() {
            if previous_cased {
                label.extend(ch.to_lowercase());
            } else {
                label.extend(ch.to_uppercase());
            }
            previous_cased = true;
        } else {
            label.push(ch);
            previous_cased = false;
        }
    }
    label
}

#[cfg(test)]
mod tests {
    use super::{humanize_key, is_blank, is_truthy, scalar_text, value_kind};
    use serde_yaml::Value;

    fn yaml(text: &str) -> Value {
        serde_yaml::from_str(text).expect("test yaml should parse")
    }

    #[test]
    fn scalar_text_reads_strings_numbers_and_bools() {
        assert_eq!(scalar_text(&yaml("hello")).as_deref(), Some("hello"));
        assert_eq!(scalar_text(&yaml("2021")).as_deref(), Some("2021"));
        assert_eq!(scalar_text(&yaml("true")).as_deref(), Some("true"));
        assert_eq!(scalar_text(&yaml("[a, b]")), None);
        assert_eq!(scalar_text(&Value::Null), None);
    }

    #[test]
    fn truthiness_follows_loose_flag_semantics() {
        assert!(is_truthy(&yaml("true")));
        assert!(is_truthy(&yaml("yes please")));
        assert!(is_truthy(&yaml("1")));
        assert!(!is_truthy(&yaml("false")));
        assert!(!is_truthy(&yaml("0")));
        assert!(!is_truthy(&yaml("''")));
        assert!(!is_truthy(&Value::Null));
    }

    #[test]
    fn blank_detects_null_and_whitespace() {
        assert!(is_blank(&Value::Null));
        assert!(is_blank(&yaml("'   '")));
        assert!(!is_blank(&yaml("0")));
        assert!(!is_blank(&yaml("[]")));
    }

    #[test]
    fn humanize_key_title_cases_each_word() {
        assert_eq!(humanize_key("skills_used"), "Skills Used");
        assert_eq!(humanize_key("work_EXPERIENCE"), "Work Experience");
        assert_eq!(humanize_key("c++_and_go"), "C++ And Go");
        assert_eq!(humanize_key("o'reilly"), "O'Reilly");
    }

    #[test]
    fn value_kind_names_every_shape() {
        assert_eq!(value_kind(&yaml("{a: 1}")), "mapping");
        assert_eq!(value_kind(&yaml("[1]")), "sequence");
        assert_eq!(value_kind(&yaml("x")), "string");
    }
}
