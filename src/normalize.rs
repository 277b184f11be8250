// src/normalize.rs
//! Text normalization: lowercase → word tokens → alphabetic filter →
//! ё-folding → lemmatization → stopword removal.
//!
//! Normalization never fails on content: any input, including text with no
//! alphabetic token at all, degrades to an empty lemma sequence.

use std::collections::HashSet;

use once_cell::sync::Lazy;

use crate::morph::MorphDict;

/// Filler words the static list does not cover.
const CUSTOM_STOPWORDS: [&str; 4] = ["такой", "это", "всё", "весь"];

/// Static language stopword list plus the custom fillers, all ё-folded so
/// membership checks see the same spelling the pipeline produces.
static STOPWORDS: Lazy<HashSet<String>> = Lazy::new(|| {
    let raw = include_str!("../assets/stopwords_ru.txt");
    let mut set: HashSet<String> = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(fold_yo)
        .collect();
    set.extend(CUSTOM_STOPWORDS.iter().copied().map(fold_yo));
    set
});

/// Collapse the ё spelling variant to е, so forms that differ only by the
/// diacritic hit the same dictionary and vocabulary entries.
fn fold_yo(s: &str) -> String {
    s.replace('ё', "е")
}

/// Word tokens: maximal alphanumeric runs, lowercased.
fn tokenize(s: &str) -> impl Iterator<Item = String> + '_ {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
}

#[derive(Debug)]
pub struct Normalizer {
    morph: MorphDict,
}

impl Normalizer {
    pub fn new(morph: MorphDict) -> Self {
        Self { morph }
    }

    /// Raw text → ordered lemma sequence.
    ///
    /// Tokens containing anything but alphabetic characters are discarded
    /// before lemmatization; lemmas found in the stopword set are dropped
    /// afterwards.
    pub fn lemmas(&self, text: &str) -> Vec<String> {
        tokenize(text)
            .filter(|t| t.chars().all(char::is_alphabetic))
            .map(|t| fold_yo(&t))
            .map(|t| self.morph.normal_form(&t))
            .filter(|lemma| !STOPWORDS.contains(lemma.as_str()))
            .collect()
    }
}
