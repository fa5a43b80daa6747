//! Generic JSON record to inventory entity mapping
//!
//! | JSON value                  | Properties written                          |
//! |-----------------------------|---------------------------------------------|
//! | scalar                      | `Key`                                       |
//! | `null`                      | `Key = -`                                   |
//! | object                      | `Key.Leaf` per member (deeper levels as `Inner_Leaf`) |
//! | array of scalars            | `Key` joined with `, `                      |
//! | array of objects            | repeated `Key` groups, one per element      |
//! | empty array                 | `Key = -`                                   |
//!
//! Member names are turned into XML names (`@odata.*` annotations are skipped).
//! Properties follow the member order of the record as received.

use serde_json::{Map, Value};

use invcollect_inventory::property::is_xml_name;
use invcollect_inventory::xml::strip_invalid_chars;
use invcollect_inventory::{DEFAULT_VALUE, EntityAccumulator, InventoryError, PropertyKey};

/// Separator for flattened scalar arrays
const LIST_SEPARATOR: &str = ", ";

/// Why a single record could not be mapped.
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("record is not a JSON object (found {0})")]
    NotAnObject(&'static str),

    #[error(transparent)]
    Inventory(#[from] InventoryError),
}

/// Map one JSON record into a new entity named `entity_name`.
///
/// On error the partially written entity is left in place; the caller
/// decides whether to discard it.
pub fn map_record(
    acc: &mut EntityAccumulator,
    entity_name: &str,
    record: &Value,
) -> Result<(), MapError> {
    let Value::Object(members) = record else {
        return Err(MapError::NotAnObject(json_type(record)));
    };

    acc.start_entity(entity_name);
    for (raw_key, value) in members {
        let Some(key) = xml_member_name(raw_key) else {
            continue;
        };
        match value {
            Value::Object(inner) => map_group(acc, &key, inner)?,
            Value::Array(items) if !items.is_empty() && items.iter().all(Value::is_object) => {
                map_repeated_groups(acc, &key, items)?;
            }
            other => add(acc, key, scalar_text(other))?,
        }
    }
    Ok(())
}

/// Object member: one `Key.Leaf` per member.
fn map_group(
    acc: &mut EntityAccumulator,
    group: &str,
    members: &Map<String, Value>,
) -> Result<(), MapError> {
    for (leaf, value) in flatten(members) {
        add(acc, format!("{group}.{leaf}"), value)?;
    }
    Ok(())
}

/// Array of objects: every element writes the same leaf set (missing leaves as
/// `-`), so the first leaf repeats and each element opens its own group.
fn map_repeated_groups(
    acc: &mut EntityAccumulator,
    group: &str,
    items: &[Value],
) -> Result<(), MapError> {
    let rows: Vec<Vec<(String, String)>> = items
        .iter()
        .filter_map(Value::as_object)
        .map(flatten)
        .collect();

    let mut leaves: Vec<&str> = Vec::new();
    for (leaf, _) in rows.iter().flatten() {
        if !leaves.contains(&leaf.as_str()) {
            leaves.push(leaf);
        }
    }

    for row in &rows {
        for leaf in &leaves {
            let value = row
                .iter()
                .find(|(name, _)| name == leaf)
                .map_or_else(|| DEFAULT_VALUE.to_owned(), |(_, v)| v.clone());
            add(acc, format!("{group}.{leaf}"), value)?;
        }
    }
    Ok(())
}

/// Flatten an object into `(leaf, text)` pairs; nested objects become `Outer_Inner`.
fn flatten(members: &Map<String, Value>) -> Vec<(String, String)> {
    let mut out = Vec::new();
    flatten_into(members, None, &mut out);
    out
}

fn flatten_into(members: &Map<String, Value>, prefix: Option<&str>, out: &mut Vec<(String, String)>) {
    for (raw_key, value) in members {
        let Some(key) = xml_member_name(raw_key) else {
            continue;
        };
        let name = match prefix {
            Some(prefix) => format!("{prefix}_{key}"),
            None => key,
        };
        match value {
            Value::Object(inner) => flatten_into(inner, Some(&name), out),
            other => out.push((name, scalar_text(other))),
        }
    }
}

fn add(acc: &mut EntityAccumulator, key: String, value: String) -> Result<(), MapError> {
    PropertyKey::parse(&key)?;
    acc.add_property(key, value)?;
    Ok(())
}

/// Text for a non-object value.
fn scalar_text(value: &Value) -> String {
    let text = match value {
        Value::Null => return DEFAULT_VALUE.to_owned(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) if items.is_empty() => return DEFAULT_VALUE.to_owned(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                Value::Null => DEFAULT_VALUE.to_owned(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(LIST_SEPARATOR),
        Value::Object(_) => value.to_string(),
    };
    strip_invalid_chars(&text).into_owned()
}

/// Turn a JSON member name into an XML element name.
///
/// Returns `None` for names that should not be mapped (empty, `@` annotations).
pub fn xml_member_name(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() || raw.starts_with('@') {
        return None;
    }
    let mut name: String = raw
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if !name.starts_with(|c: char| c.is_alphabetic() || c == '_') {
        name.insert(0, '_');
    }
    is_xml_name(&name).then_some(name)
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entries(acc: &EntityAccumulator) -> Vec<(String, String)> {
        acc.current()
            .unwrap()
            .entries()
            .iter()
            .map(|e| (e.key.clone(), e.value.clone()))
            .collect()
    }

    fn pair(k: &str, v: &str) -> (String, String) {
        (k.to_owned(), v.to_owned())
    }

    #[test]
    fn scalars_become_direct_properties() {
        let mut acc = EntityAccumulator::new();
        let record = json!({
            "displayName": "PC1",
            "enabled": true,
            "cores": 8,
            "notes": null,
            "@odata.type": "#microsoft.graph.device"
        });
        map_record(&mut acc, "Device", &record).unwrap();

        assert_eq!(acc.current().unwrap().name(), "Device");
        assert_eq!(
            entries(&acc),
            vec![
                pair("displayName", "PC1"),
                pair("enabled", "true"),
                pair("cores", "8"),
                pair("notes", "-"),
            ]
        );
    }

    #[test]
    fn nested_object_becomes_group() {
        let mut acc = EntityAccumulator::new();
        let record = json!({
            "os": { "name": "Windows 11", "build": { "major": 22, "minor": 631 } }
        });
        map_record(&mut acc, "Device", &record).unwrap();
        assert_eq!(
            entries(&acc),
            vec![
                pair("os.name", "Windows 11"),
                pair("os.build_major", "22"),
                pair("os.build_minor", "631"),
            ]
        );
    }

    #[test]
    fn object_arrays_repeat_with_uniform_leaves() {
        let mut acc = EntityAccumulator::new();
        let record = json!({
            "apps": [
                { "name": "Editor", "version": "1.2" },
                { "name": "Browser" }
            ]
        });
        map_record(&mut acc, "Device", &record).unwrap();
        assert_eq!(
            entries(&acc),
            vec![
                pair("apps.name", "Editor"),
                pair("apps.version", "1.2"),
                pair("apps.name", "Browser"),
                pair("apps.version", "-"),
            ]
        );
    }

    #[test]
    fn scalar_arrays_are_joined() {
        let mut acc = EntityAccumulator::new();
        let record = json!({ "tags": ["a", 1, null], "empty": [] });
        map_record(&mut acc, "Device", &record).unwrap();
        assert_eq!(
            entries(&acc),
            vec![pair("tags", "a, 1, -"), pair("empty", "-")]
        );
    }

    #[test]
    fn member_order_follows_the_record() {
        let mut acc = EntityAccumulator::new();
        let record: Value =
            serde_json::from_str(r#"{"zeta": 1, "alpha": 2, "mid": {"y": 3, "b": 4}}"#).unwrap();
        map_record(&mut acc, "Device", &record).unwrap();
        assert_eq!(
            entries(&acc),
            vec![
                pair("zeta", "1"),
                pair("alpha", "2"),
                pair("mid.y", "3"),
                pair("mid.b", "4"),
            ]
        );
    }

    #[test]
    fn non_object_record_is_rejected_without_entity() {
        let mut acc = EntityAccumulator::new();
        let err = map_record(&mut acc, "Device", &json!("oops")).unwrap_err();
        assert!(matches!(err, MapError::NotAnObject("string")));
        assert!(acc.is_empty());
    }

    #[test]
    fn member_names_are_made_xml_safe() {
        assert_eq!(xml_member_name("serial number").as_deref(), Some("serial_number"));
        assert_eq!(xml_member_name("os.name").as_deref(), Some("os_name"));
        assert_eq!(xml_member_name("1st").as_deref(), Some("_1st"));
        assert_eq!(xml_member_name("{x:y}").as_deref(), Some("_x_y_"));
        assert_eq!(xml_member_name("@odata.etag"), None);
        assert_eq!(xml_member_name("  "), None);
    }

    #[test]
    fn control_characters_are_removed() {
        assert_eq!(scalar_text(&json!("a\u{0}b\tc")), "ab\tc");
    }
}
