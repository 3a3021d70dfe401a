//! Text normalization, tokenization and stemming for indexing and queries.

use rust_stemmers::{Algorithm, Stemmer};
use std::fmt::{self, Debug, Formatter};
use std::ops::Range;
use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

/// Tokens shorter than this (in characters) are discarded.
const MIN_TOKEN_LENGTH: usize = 2;

/// Common English stop words to filter out from indexing.
/// These high-frequency words add little value to search relevance.
pub(crate) const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "he", "in", "is", "it",
    "its", "of", "on", "or", "that", "the", "this", "to", "was", "will", "with",
];

/// A single token extracted from source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Stemmed index term.
    pub term: String,
    /// Lower-cased, diacritic-free word before stemming.
    pub surface: String,
    /// Byte range of the word in the original text.
    pub span: Range<usize>,
    /// Ordinal of the word within the text. Sub-words share their word's position.
    pub position: u32,
}

/// Turns raw text into normalized, stemmed index terms.
///
/// Deterministic and side-effect free; the same input always yields the same tokens.
pub struct Tokenizer {
    stemmer: Stemmer,
}

impl Debug for Tokenizer {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tokenizer")
            .field("algorithm", &"english")
            .finish()
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self {
            stemmer: Stemmer::create(Algorithm::English),
        }
    }
}

impl Tokenizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index terms of `text`, in order of appearance.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        self.tokens(text).into_iter().map(|t| t.term).collect()
    }

    /// Full token records of `text`, in order of appearance.
    ///
    /// Words are maximal runs of alphanumeric characters. A CamelCase word yields each
    /// component followed by the whole word: "HttpServer" → ["http", "server", "httpserver"].
    pub fn tokens(&self, text: &str) -> Vec<Token> {
        let mut tokens = vec![];
        let mut position = 0u32;

        let mut word_start: Option<usize> = None;
        let mut subword_starts: Vec<usize> = vec![];
        let mut last_lower = false;

        for (i, c) in text.char_indices() {
            if is_word_char(c) {
                if word_start.is_none() {
                    word_start = Some(i);
                    subword_starts.clear();
                    subword_starts.push(i);
                } else if last_lower && c.is_uppercase() {
                    // CamelCase boundary: lowercase → uppercase
                    subword_starts.push(i);
                }
                if !is_combining_mark(c) {
                    last_lower = c.is_lowercase();
                }
            } else if let Some(start) = word_start.take() {
                self.emit_word(text, start..i, &subword_starts, position, &mut tokens);
                position += 1;
                last_lower = false;
            }
        }

        if let Some(start) = word_start {
            self.emit_word(text, start..text.len(), &subword_starts, position, &mut tokens);
        }

        tokens
    }

    /// Stem an already-normalized word.
    pub fn stem(&self, surface: &str) -> String {
        self.stemmer.stem(surface).into_owned()
    }

    fn emit_word(
        &self,
        text: &str,
        word: Range<usize>,
        subword_starts: &[usize],
        position: u32,
        tokens: &mut Vec<Token>,
    ) {
        if subword_starts.len() > 1 {
            for (idx, &start) in subword_starts.iter().enumerate() {
                let end = subword_starts.get(idx + 1).copied().unwrap_or(word.end);
                self.emit_token(text, start..end, position, tokens);
            }
        }
        self.emit_token(text, word, position, tokens);
    }

    /// Normalize, filter and stem one token.
    fn emit_token(&self, text: &str, span: Range<usize>, position: u32, tokens: &mut Vec<Token>) {
        let surface = normalize(&text[span.clone()]);

        if surface.chars().count() < MIN_TOKEN_LENGTH {
            return;
        }

        // Skip stop words
        if STOP_WORDS.contains(&surface.as_str()) {
            return;
        }

        tokens.push(Token {
            term: self.stem(&surface),
            surface,
            span,
            position,
        });
    }
}

/// Lower-case `value` and strip diacritics: "Café" → "cafe".
pub fn normalize(value: &str) -> String {
    value
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || is_combining_mark(c)
}
