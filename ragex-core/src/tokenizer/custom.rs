//! Rule-based tokenizer built on Unicode text segmentation (UAX #29).

use tracing::trace;
use unicode_segmentation::UnicodeSegmentation;

use super::{Language, Tokenizer};
use crate::types::Granularity;

/// Default tokenizer. Detects English or German, then segments by granularity.
#[derive(Debug, Clone, Default)]
pub struct CustomTokenizer;

impl CustomTokenizer {
    pub fn new() -> Self {
        Self
    }

    fn words(text: &str, lang: Language) -> Vec<String> {
        text.unicode_words()
            .filter(|w| !lang.is_stop_word(w))
            .map(str::trim)
            .filter(|w| !w.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn paragraphs(text: &str) -> Vec<String> {
        let mut seen = Vec::<String>::new();
        for line in text.split('\n') {
            let line = line.trim();
            if !line.is_empty() && !seen.iter().any(|p| p == line) {
                seen.push(line.to_string());
            }
        }
        seen
    }

    fn sentences(text: &str) -> Vec<String> {
        Self::paragraphs(text)
            .iter()
            .flat_map(|p| p.unicode_sentences())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Maximal runs of content words. Stop-words, punctuation and line
    /// breaks end a run; hyphens and apostrophes inside a run are kept.
    fn phrases(text: &str, lang: Language) -> Vec<String> {
        let mut phrases = Vec::new();
        let mut start: Option<usize> = None;
        let mut end = 0;

        let mut flush = |start: &mut Option<usize>, end: usize| {
            if let Some(s) = start.take() {
                let phrase = text[s..end].trim();
                if !phrase.is_empty() {
                    phrases.push(phrase.to_string());
                }
            }
        };

        for (idx, segment) in text.split_word_bound_indices() {
            if segment.chars().any(char::is_alphanumeric) {
                if lang.is_stop_word(segment) {
                    flush(&mut start, end);
                    continue;
                }
                start.get_or_insert(idx);
                end = idx + segment.len();
            } else if start.is_some() && (is_inline_space(segment) || is_joiner(segment)) {
                continue;
            } else {
                flush(&mut start, end);
            }
        }
        flush(&mut start, end);
        phrases
    }
}

fn is_inline_space(segment: &str) -> bool {
    segment
        .chars()
        .all(|c| c.is_whitespace() && c != '\n' && c != '\r')
}

fn is_joiner(segment: &str) -> bool {
    matches!(segment, "-" | "'" | "\u{2019}")
}

impl Tokenizer for CustomTokenizer {
    fn name(&self) -> &str {
        "custom_tokenizer"
    }

    fn tokenize(&self, text: &str, granularity: Granularity) -> Vec<String> {
        let lang = Language::detect(text);
        let features = match granularity {
            Granularity::Word => Self::words(text, lang),
            Granularity::Sentence => Self::sentences(text),
            Granularity::Paragraph => Self::paragraphs(text),
            Granularity::Phrase => Self::phrases(text, lang),
        };
        trace!(
            granularity = %granularity,
            language = ?lang,
            features = features.len(),
            "Tokenized text"
        );
        features
    }
}
