use crate::models::field::FieldKey;

// (word, state) pairs per boolean field; words are compared lowercased.
const CONTACT_WORDS: &[(&str, bool)] = &[
    ("offen", true),
    ("open", true),
    ("geschlossen", false),
    ("closed", false),
];

const WET_WORDS: &[(&str, bool)] = &[
    ("feucht", true),
    ("nass", true),
    ("wet", true),
    ("trocken", false),
    ("dry", false),
];

// `true` means the battery is low.
const BATTERY_WORDS: &[(&str, bool)] = &[
    ("schwach", true),
    ("leer", true),
    ("low", true),
    ("gut", false),
    ("voll", false),
    ("ok", false),
    ("good", false),
    ("full", false),
];

/// Maps a state word to its boolean for `key`. Unknown words (or keys that
/// are not boolean) give `None`.
pub fn state_for(key: FieldKey, word: &str) -> Option<bool> {
    let table = match key {
        FieldKey::Contact => CONTACT_WORDS,
        FieldKey::Wet => WET_WORDS,
        FieldKey::Battery => BATTERY_WORDS,
        _ => return None,
    };

    let word = word.trim().to_lowercase();
    table
        .iter()
        .find(|(candidate, _)| *candidate == word)
        .map(|(_, state)| *state)
}
