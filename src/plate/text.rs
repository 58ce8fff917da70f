use std::fmt;

/// Number of characters on a plate.
pub const PLATE_LEN: usize = 7;

/// Letters that OCR commonly confuses with digits, and the digit they stand for.
pub const CHAR_TO_INT: [(char, char); 6] = [
    ('O', '0'),
    ('I', '1'),
    ('J', '3'),
    ('A', '4'),
    ('G', '6'),
    ('S', '5'),
];

/// Digits that OCR commonly confuses with letters, and the letter they stand for.
pub const INT_TO_CHAR: [(char, char); 6] = [
    ('0', 'O'),
    ('1', 'I'),
    ('3', 'J'),
    ('4', 'A'),
    ('6', 'G'),
    ('5', 'S'),
];

/// Character class required at a plate position.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CharClass {
    Letter,
    Digit,
}

/// Plate layout: two letters, two digits, three letters (e.g. `AB12CDE`).
pub const LAYOUT: [CharClass; PLATE_LEN] = [
    CharClass::Letter,
    CharClass::Letter,
    CharClass::Digit,
    CharClass::Digit,
    CharClass::Letter,
    CharClass::Letter,
    CharClass::Letter,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlateText {
    Valid(String),
    Invalid,
}

impl PlateText {
    #[inline]
    pub fn is_valid(&self) -> bool {
        matches!(self, PlateText::Valid(_))
    }

    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PlateText::Valid(text) => Some(text.as_str()),
            PlateText::Invalid => None,
        }
    }
}

impl fmt::Display for PlateText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlateText::Valid(text) => f.write_str(text),
            PlateText::Invalid => f.write_str("invalid"),
        }
    }
}

/// A raw text reading of one plate crop, as returned by the OCR engine.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrCandidate {
    pub text: String,
    pub confidence: f32,
}

impl OcrCandidate {
    pub fn new<S: Into<String>>(text: S, confidence: f32) -> Self {
        Self {
            text: text.into(),
            confidence,
        }
    }
}

#[inline]
fn lookup(table: &[(char, char)], c: char) -> Option<char> {
    table.iter().find(|&&(from, _)| from == c).map(|&(_, to)| to)
}

impl CharClass {
    /// Resolve `c` into this class, directly or through a look-alike substitution.
    pub fn resolve(self, c: char) -> Option<char> {
        match self {
            CharClass::Letter if c.is_ascii_uppercase() => Some(c),
            CharClass::Letter => lookup(&INT_TO_CHAR, c),
            CharClass::Digit if c.is_ascii_digit() => Some(c),
            CharClass::Digit => lookup(&CHAR_TO_INT, c),
        }
    }
}

/// Upper-case an OCR reading and drop all whitespace.
pub fn normalize_candidate(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

/// Check that every position of `text` resolves to the class the layout requires.
pub fn complies_format(text: &str) -> bool {
    text.chars().count() == PLATE_LEN
        && text
            .chars()
            .zip(LAYOUT.iter())
            .all(|(c, class)| class.resolve(c).is_some())
}

/// Rewrite look-alike characters into the class each position requires.
///
/// Returns `PlateText::Invalid` for any text that does not comply with the layout.
pub fn format_license(text: &str) -> PlateText {
    if text.chars().count() != PLATE_LEN {
        return PlateText::Invalid;
    }

    text.chars()
        .zip(LAYOUT.iter())
        .map(|(c, class)| class.resolve(c))
        .collect::<Option<String>>()
        .map_or(PlateText::Invalid, PlateText::Valid)
}

/// Pick the first OCR candidate that forms a valid plate.
///
/// Candidates are tried in the order the OCR engine returned them; the
/// confidence of the chosen candidate is passed through unchanged.
pub fn read_license_plate(candidates: &[OcrCandidate]) -> Option<(String, f32)> {
    pick_candidate(candidates).map(|(candidate, text)| (text, candidate.confidence))
}

/// Like [`read_license_plate`], but also hands back the accepted raw candidate.
pub fn pick_candidate(candidates: &[OcrCandidate]) -> Option<(&OcrCandidate, String)> {
    candidates.iter().find_map(|candidate| {
        match format_license(&normalize_candidate(&candidate.text)) {
            PlateText::Valid(text) => Some((candidate, text)),
            PlateText::Invalid => None,
        }
    })
}
