//! Pulls a JSON object out of free-form model text.
//!
//! Two stages, tried in order: a fenced block labelled `json`, then the span
//! from the first `{` to the last `}`. "Nothing found" and "found but not
//! valid JSON" are different outcomes and callers branch on them separately.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

static FENCED_JSON_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```json\s*([\s\S]*?)\s*```").unwrap());

static BRACED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{[\s\S]*\}").unwrap());

#[derive(Debug)]
pub enum Extraction {
    Parsed(Value),
    /// No JSON-looking span at all; carries the full text unchanged.
    RawText(String),
    /// A span was located but did not parse.
    Malformed(serde_json::Error),
}

pub fn extract_json(text: &str) -> Extraction {
    let candidate = FENCED_JSON_RE
        .captures(text)
        .and_then(|captures| captures.get(1))
        .or_else(|| BRACED_RE.find(text));

    match candidate {
        Some(span) => match serde_json::from_str(span.as_str()) {
            Ok(value) => Extraction::Parsed(value),
            Err(error) => Extraction::Malformed(error),
        },
        None => Extraction::RawText(text.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fenced_block_wins_over_surrounding_prose() {
        let text = "Sure! Here is the entry:\n```json\n{\"word\": \"ubiquitous\", \"phonetic\": \"/juːˈbɪk.wɪ.təs/\"}\n```\nLet me know {if} you need more.";
        match extract_json(text) {
            Extraction::Parsed(value) => {
                assert_eq!(
                    value,
                    json!({"word": "ubiquitous", "phonetic": "/juːˈbɪk.wɪ.təs/"})
                )
            }
            other => panic!("expected parsed value, got {other:?}"),
        }
    }

    #[test]
    fn bare_object_is_found_without_fence() {
        let text = "The answer is {\"word\": \"break a leg\", \"definitions\": [{\"meaning\": \"good luck\"}]} as requested.";
        match extract_json(text) {
            Extraction::Parsed(value) => {
                assert_eq!(value["word"], "break a leg");
                assert_eq!(value["definitions"][0]["meaning"], "good luck");
            }
            other => panic!("expected parsed value, got {other:?}"),
        }
    }

    #[test]
    fn text_without_braces_is_passed_through() {
        let text = "I could not produce structured output for this phrase.";
        match extract_json(text) {
            Extraction::RawText(raw) => assert_eq!(raw, text),
            other => panic!("expected raw text, got {other:?}"),
        }
    }

    #[test]
    fn located_but_invalid_json_is_malformed() {
        assert!(matches!(
            extract_json("```json\n{\"word\": }\n```"),
            Extraction::Malformed(_)
        ));
        assert!(matches!(
            extract_json("here {word: unquoted} there"),
            Extraction::Malformed(_)
        ));
    }

    #[test]
    fn unlabelled_fence_falls_back_to_braces() {
        let text = "```\n{\"word\": \"plain\"}\n```";
        match extract_json(text) {
            Extraction::Parsed(value) => assert_eq!(value, json!({"word": "plain"})),
            other => panic!("expected parsed value, got {other:?}"),
        }
    }
}
