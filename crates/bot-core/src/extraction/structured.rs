//! Tier 1: repair "almost JSON" and read pairs out of its records

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};

use super::PairSet;
use crate::types::{value_to_string, CredentialPair};

const UID_KEYS: [&str; 4] = ["uid", "user", "user_id", "id"];
const PASSWORD_KEYS: [&str; 3] = ["password", "pass", "pwd"];

lazy_static! {
    static ref TRAILING_COMMA: Regex =
        Regex::new(r",\s*([}\]])").expect("Failed to compile trailing comma regex");
}

/// Returns `None` when the repaired text is not JSON or no record yields a
/// complete pair.
pub(crate) fn parse(text: &str) -> Option<Vec<CredentialPair>> {
    let records = parse_records(text)?;

    let mut pairs = PairSet::default();
    for record in &records {
        if let Some(pair) = pair_from_record(record) {
            pairs.insert(pair);
        }
    }
    pairs.into_non_empty()
}

fn parse_records(text: &str) -> Option<Vec<Map<String, Value>>> {
    let repaired = TRAILING_COMMA.replace_all(text.trim(), "$1");
    let wrapped = if repaired.starts_with('{') {
        format!("[{}]", repaired)
    } else {
        repaired.into_owned()
    };

    match serde_json::from_str::<Value>(&wrapped) {
        Ok(Value::Object(record)) => Some(vec![record]),
        Ok(Value::Array(items)) => Some(
            items
                .into_iter()
                .filter_map(|item| match item {
                    Value::Object(record) => Some(record),
                    _ => None,
                })
                .collect(),
        ),
        Ok(_) => None,
        Err(e) => {
            log::debug!("Structured parse failed, falling back: {}", e);
            None
        }
    }
}

fn pair_from_record(record: &Map<String, Value>) -> Option<CredentialPair> {
    let mut uid = None;
    let mut password = None;

    // Later keys overwrite earlier ones.
    for (key, value) in record {
        let key = key.to_lowercase();
        if UID_KEYS.contains(&key.as_str()) {
            uid = Some(value_to_string(value));
        }
        if PASSWORD_KEYS.contains(&key.as_str()) {
            password = Some(value_to_string(value));
        }
    }

    CredentialPair::from_untrimmed(uid?, password?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_object_is_wrapped() {
        let pairs = parse(r#"{"uid": "1", "password": "a"}"#).unwrap();
        assert_eq!(pairs, vec![CredentialPair::new("1", "a")]);
    }

    #[test]
    fn test_trailing_commas_are_repaired() {
        let text = r#"[{"uid": 1, "password": "a",}, {"uid": 2, "password": "b",},]"#;
        let pairs = parse(text).unwrap();
        assert_eq!(
            pairs,
            vec![CredentialPair::new("1", "a"), CredentialPair::new("2", "b")]
        );
    }

    #[test]
    fn test_comma_separated_objects_are_wrapped() {
        let text = "{\"uid\": 1, \"pass\": \"a\"},\n{\"uid\": 2, \"pass\": \"b\"}";
        assert_eq!(parse(text).unwrap().len(), 2);
    }

    #[test]
    fn test_key_aliases_are_case_insensitive() {
        let text = r#"[{"User_ID": 9, "PWD": "x"}, {"ID": "7", "Pass": "y"}]"#;
        let pairs = parse(text).unwrap();
        assert_eq!(
            pairs,
            vec![CredentialPair::new("9", "x"), CredentialPair::new("7", "y")]
        );
    }

    #[test]
    fn test_non_record_elements_are_dropped() {
        let text = r#"[1, "two", null, {"uid": "3", "password": "c"}]"#;
        assert_eq!(parse(text).unwrap(), vec![CredentialPair::new("3", "c")]);
    }

    #[test]
    fn test_incomplete_and_blank_records_are_ignored() {
        let text = r#"[{"uid": "1"}, {"password": "p"}, {"uid": "  ", "password": "p"}]"#;
        assert_eq!(parse(text), None);
    }

    #[test]
    fn test_values_are_kept_verbatim() {
        let pairs = parse(r#"[{"uid": "1", "password": " secret "}]"#).unwrap();
        assert_eq!(pairs, vec![CredentialPair::new("1", " secret ")]);
    }

    #[test]
    fn test_big_numeric_uid_is_not_rounded() {
        let pairs = parse(r#"[{"uid": 123456789012345678901, "password": "a"}]"#).unwrap();
        assert_eq!(
            pairs,
            vec![CredentialPair::new("123456789012345678901", "a")]
        );
    }

    #[test]
    fn test_malformed_text_is_no_match() {
        assert_eq!(parse("{uid: 1, password: b}"), None);
        assert_eq!(parse("just words"), None);
        assert_eq!(parse("42"), None);
    }
}
