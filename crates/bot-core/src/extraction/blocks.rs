//! Tier 2: regex scan of `{...},{...}` blocks for text no parser accepts

use lazy_static::lazy_static;
use regex::Regex;

use super::PairSet;
use crate::types::CredentialPair;

lazy_static! {
    static ref TRAILING_COMMA: Regex =
        Regex::new(r",\s*\}").expect("Failed to compile trailing comma regex");
    static ref BLOCK_SEPARATOR: Regex =
        Regex::new(r"\}\s*,\s*\{").expect("Failed to compile block separator regex");
    static ref UID: Regex = Regex::new(r#"(?i)"?\buid\b"?\s*:\s*(?P<val>"[^"]*"|[0-9]+)"#)
        .expect("Failed to compile uid regex");
    static ref PASSWORD: Regex =
        Regex::new(r#"(?i)"?\bpass(?:word)?\b"?\s*:\s*(?P<val>"[^"]*"|[^,}\n]+)"#)
            .expect("Failed to compile password regex");
}

/// Returns `None` when no block holds both a uid and a password.
pub(crate) fn parse(text: &str) -> Option<Vec<CredentialPair>> {
    let normalized = text.replace("\r\n", "\n");
    let cleaned = TRAILING_COMMA.replace_all(normalized.trim(), "}");

    let mut pairs = PairSet::default();
    for part in BLOCK_SEPARATOR.split(&cleaned) {
        let block = rewrap(part);
        if let Some(pair) = pair_from_block(&block) {
            pairs.insert(pair);
        }
    }
    pairs.into_non_empty()
}

fn rewrap(part: &str) -> String {
    let part = part.trim();
    let mut block = String::with_capacity(part.len() + 2);
    if !part.starts_with('{') {
        block.push('{');
    }
    block.push_str(part);
    if !block.ends_with('}') {
        block.push('}');
    }
    block
}

fn pair_from_block(block: &str) -> Option<CredentialPair> {
    let uid = capture_value(&UID, block)?;
    let password = capture_value(&PASSWORD, block)?;
    CredentialPair::from_parts(uid, password)
}

fn capture_value<'a>(pattern: &Regex, block: &'a str) -> Option<&'a str> {
    let value = pattern.captures(block)?.name("val")?.as_str();
    Some(value.trim().trim_matches('"'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mixed_quoting_blocks() {
        let pairs = parse(r#"{"uid":1,"pass":"a"},{uid:2, password:b}"#).unwrap();
        assert_eq!(
            pairs,
            vec![CredentialPair::new("1", "a"), CredentialPair::new("2", "b")]
        );
    }

    #[test]
    fn test_crlf_and_trailing_commas() {
        let text = "{\r\n  UID: 10,\r\n  Password: hunter2,\r\n},\r\n{\r\n  uid: \"11\",\r\n  pass: \"s3cret\",\r\n}";
        let pairs = parse(text).unwrap();
        assert_eq!(
            pairs,
            vec![
                CredentialPair::new("10", "hunter2"),
                CredentialPair::new("11", "s3cret")
            ]
        );
    }

    #[test]
    fn test_block_without_password_is_skipped() {
        let pairs = parse("{uid: 1},{uid: 2, password: x}").unwrap();
        assert_eq!(pairs, vec![CredentialPair::new("2", "x")]);
    }

    #[test]
    fn test_uid_must_be_a_whole_word() {
        assert_eq!(parse("{useruid: 1, password: x}"), None);
    }

    #[test]
    fn test_duplicates_collapse() {
        let pairs = parse("{uid: 1, pass: x},{uid: 1, pass: x},{uid: 1, pass: y}").unwrap();
        assert_eq!(
            pairs,
            vec![CredentialPair::new("1", "x"), CredentialPair::new("1", "y")]
        );
    }

    #[test]
    fn test_no_tokens_is_no_match() {
        assert_eq!(parse("hello there, nothing to see"), None);
        assert_eq!(parse(""), None);
    }
}
