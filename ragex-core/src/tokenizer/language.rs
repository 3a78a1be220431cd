//! Input language detection and per-language stop-word lists.

use std::collections::HashSet;
use std::sync::LazyLock;

use whatlang::{Detector, Lang};

/// Languages with dedicated segmentation rules. Anything else falls back to English.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Language {
    #[default]
    English,
    German,
}

static DETECTOR: LazyLock<Detector> =
    LazyLock::new(|| Detector::with_allowlist(vec![Lang::Eng, Lang::Deu]));

static ENGLISH_STOP_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "a", "about", "above", "across", "after", "again", "against", "all", "almost", "along",
        "already", "also", "although", "always", "am", "among", "an", "and", "another", "any",
        "are", "around", "as", "at", "be", "because", "been", "before", "behind", "being",
        "below", "beside", "between", "beyond", "both", "but", "by", "can", "cannot", "could",
        "did", "do", "does", "doing", "done", "down", "during", "each", "either", "else",
        "even", "ever", "every", "few", "for", "from", "further", "had", "has", "have",
        "having", "he", "hence", "her", "here", "hers", "herself", "him", "himself", "his",
        "how", "however", "i", "if", "in", "into", "is", "it", "its", "itself", "just", "may",
        "me", "might", "more", "most", "much", "must", "my", "myself", "neither", "never",
        "no", "nor", "not", "now", "of", "off", "often", "on", "once", "only", "onto", "or",
        "other", "our", "ours", "ourselves", "out", "over", "own", "per", "quite", "rather",
        "really", "same", "shall", "she", "should", "since", "so", "some", "still", "such",
        "than", "that", "the", "their", "theirs", "them", "themselves", "then", "there",
        "therefore", "these", "they", "this", "those", "though", "through", "thus", "to",
        "too", "toward", "towards", "under", "unless", "until", "up", "upon", "us", "very",
        "via", "was", "we", "were", "what", "whatever", "when", "whenever", "where",
        "wherever", "whether", "which", "while", "who", "whoever", "whom", "whose", "why",
        "will", "with", "within", "without", "would", "yet", "you", "your", "yours",
        "yourself", "yourselves", "many",
    ]
    .into_iter()
    .collect()
});

static GERMAN_STOP_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "aber", "alle", "allem", "allen", "aller", "alles", "als", "also", "am", "an", "auch",
        "auf", "aus", "bei", "bin", "bis", "bist", "da", "damit", "dann", "das", "dass", "dein",
        "dem", "den", "denn", "der", "des", "dich", "die", "dies", "diese", "dieser", "dieses",
        "dir", "doch", "dort", "du", "durch", "ein", "eine", "einem", "einen", "einer",
        "eines", "er", "es", "etwa", "euch", "euer", "für", "gegen", "hat", "hatte", "hatten",
        "haben", "hier", "hinter", "ich", "ihm", "ihn", "ihnen", "ihr", "ihre", "im", "in",
        "ins", "ist", "ja", "jede", "jeder", "jedes", "jener", "kann", "kein", "keine",
        "können", "man", "mehr", "mein", "meine", "mich", "mir", "mit", "muss", "müssen",
        "nach", "nein", "nicht", "noch", "nur", "ob", "oder", "ohne", "schon", "sehr", "sein",
        "seine", "sich", "sie", "sind", "so", "soll", "sollen", "sondern", "über", "um", "und",
        "uns", "unser", "unter", "viel", "viele", "vom", "von", "vor", "war", "waren", "warum",
        "was", "weil", "welche", "welcher", "welches", "wenn", "wer", "werden", "wie", "will",
        "wir", "wird", "wo", "wollen", "wurde", "wurden", "zu", "zum", "zur", "zwischen",
    ]
    .into_iter()
    .collect()
});

impl Language {
    /// Detect English or German, defaulting to English when unsure.
    pub fn detect(text: &str) -> Self {
        match DETECTOR.detect_lang(text) {
            Some(Lang::Deu) => Language::German,
            _ => Language::English,
        }
    }

    pub fn is_stop_word(&self, word: &str) -> bool {
        let lower = word.to_lowercase();
        let list = match self {
            Language::English => &*ENGLISH_STOP_WORDS,
            Language::German => &*GERMAN_STOP_WORDS,
        };
        list.contains(lower.as_str())
    }
}
