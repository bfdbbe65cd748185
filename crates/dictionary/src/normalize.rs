use std::collections::HashSet;

use crate::dictionary::Word;
use crate::result::{Definition, LookupResult};

pub const DEFAULT_PART_OF_SPEECH: &str = "word";
pub const NO_DEFINITION_PLACEHOLDER: &str = "No definition available";
pub const MAX_SYNONYMS: usize = 10;

/// Converts a dictionary entry into a [`LookupResult`].
///
/// Returns `None` when the entry has no headword, which callers treat as a
/// miss rather than an error.
pub fn normalize(entry: &Word) -> Option<LookupResult> {
    if entry.word.trim().is_empty() {
        return None;
    }

    let phonetic = entry
        .phonetic
        .as_deref()
        .filter(|text| !text.is_empty())
        .or_else(|| {
            entry
                .phonetics
                .first()
                .and_then(|phonetic| phonetic.text.as_deref())
        })
        .unwrap_or_default()
        .to_string();

    let audio_url = entry
        .phonetics
        .iter()
        .filter_map(|phonetic| phonetic.audio.as_deref())
        .find(|audio| !audio.is_empty())
        .map(absolute_audio_url);

    let part_of_speech = entry
        .meanings
        .first()
        .and_then(|meaning| meaning.part_of_speech.as_ref())
        .map(|tag| tag.to_string())
        .unwrap_or_else(|| DEFAULT_PART_OF_SPEECH.to_string());

    let mut definitions = entry
        .meanings
        .iter()
        .flat_map(|meaning| meaning.definitions.iter())
        .map(|definition| Definition {
            meaning: definition.definition.clone(),
            example: definition.example.clone().unwrap_or_default(),
            translation: String::new(),
        })
        .collect::<Vec<Definition>>();
    if definitions.is_empty() {
        definitions.push(Definition {
            meaning: NO_DEFINITION_PLACEHOLDER.to_string(),
            example: String::new(),
            translation: String::new(),
        });
    }

    let synonyms = dedup_synonyms(
        entry
            .meanings
            .iter()
            .flat_map(|meaning| meaning.definitions.iter())
            .flat_map(|definition| definition.synonyms.iter()),
    );

    Some(LookupResult {
        word: entry.word.clone(),
        phonetic,
        part_of_speech,
        definitions,
        synonyms,
        usage: entry.origin.clone().unwrap_or_default(),
        audio_url,
    })
}

/// The service hands out protocol-relative audio links (`//ssl.gstatic.com/...`).
pub fn absolute_audio_url(audio: &str) -> String {
    if audio.starts_with("http") {
        audio.to_string()
    } else {
        format!("https:{audio}")
    }
}

/// First occurrence wins, at most [`MAX_SYNONYMS`] kept.
fn dedup_synonyms<'a>(synonyms: impl Iterator<Item = &'a String>) -> Vec<String> {
    let mut seen = HashSet::new();
    synonyms
        .filter(|synonym| seen.insert(synonym.as_str()))
        .take(MAX_SYNONYMS)
        .cloned()
        .collect()
}
