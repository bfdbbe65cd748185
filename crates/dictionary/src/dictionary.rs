use std::fmt;

use serde::Deserialize;

/// One entry as returned by the free dictionary service.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Word {
    pub word: String,
    pub phonetic: Option<String>,
    pub phonetics: Vec<Phonetic>,
    pub origin: Option<String>,
    pub meanings: Vec<WordMeaning>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Phonetic {
    pub text: Option<String>,
    pub audio: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WordMeaning {
    pub part_of_speech: Option<PartOfSpeech>,
    pub definitions: Vec<WordDefinition>,
    pub synonyms: Vec<String>,
    pub antonyms: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum PartOfSpeech {
    Noun,
    Pronoun,
    Verb,
    Adjective,
    Adverb,
    Preposition,
    Conjunction,
    Interjection,
    /// Tags the service uses outside the classic eight, e.g. "exclamation".
    Other(String),
}

impl PartOfSpeech {
    pub fn as_str(&self) -> &str {
        match self {
            PartOfSpeech::Noun => "noun",
            PartOfSpeech::Pronoun => "pronoun",
            PartOfSpeech::Verb => "verb",
            PartOfSpeech::Adjective => "adjective",
            PartOfSpeech::Adverb => "adverb",
            PartOfSpeech::Preposition => "preposition",
            PartOfSpeech::Conjunction => "conjunction",
            PartOfSpeech::Interjection => "interjection",
            PartOfSpeech::Other(tag) => tag,
        }
    }
}

impl From<String> for PartOfSpeech {
    fn from(tag: String) -> Self {
        match &tag[..] {
            "noun" => PartOfSpeech::Noun,
            "pronoun" => PartOfSpeech::Pronoun,
            "verb" => PartOfSpeech::Verb,
            "adjective" => PartOfSpeech::Adjective,
            "adverb" => PartOfSpeech::Adverb,
            "preposition" => PartOfSpeech::Preposition,
            "conjunction" => PartOfSpeech::Conjunction,
            "interjection" => PartOfSpeech::Interjection,
            _ => PartOfSpeech::Other(tag),
        }
    }
}

impl fmt::Display for PartOfSpeech {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WordDefinition {
    pub definition: String,
    pub example: Option<String>,
    pub synonyms: Vec<String>,
    pub antonyms: Vec<String>,
}

/// The service answers with either a bare entry or a list of entries.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum EntryBody {
    Many(Vec<Word>),
    One(Word),
}

impl EntryBody {
    pub(crate) fn into_first(self) -> Option<Word> {
        match self {
            EntryBody::Many(words) => words.into_iter().next(),
            EntryBody::One(word) => Some(word),
        }
    }
}

/// Body of a 404 answer.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NotFoundError {
    pub title: String,
    pub message: String,
}
