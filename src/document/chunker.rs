//! Sentence-based text chunking with character budgets and overlap.

use regex::Regex;
use std::sync::OnceLock;

fn whitespace() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid whitespace regex"))
}

fn sentence_boundary() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[.!?]\s+[A-Z]").expect("valid boundary regex"))
}

/// Whether the period at byte `end` closes a short capitalised
/// abbreviation such as `Dr.` or `Mr.`.
fn is_abbreviation(text: &str, end: usize) -> bool {
    let before: Vec<char> = text[..end].chars().rev().take(3).collect();
    match before.as_slice() {
        [lower, upper] => upper.is_ascii_uppercase() && lower.is_ascii_lowercase(),
        [lower, upper, prev] => {
            upper.is_ascii_uppercase() && lower.is_ascii_lowercase() && !prev.is_alphanumeric()
        }
        _ => false,
    }
}

/// Split whitespace-normalised text into sentences.
///
/// A boundary is sentence punctuation followed by whitespace and an
/// uppercase letter, unless the punctuation ends a short abbreviation.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0;

    for m in sentence_boundary().find_iter(text) {
        let punct_end = m.start() + 1;
        if &text[m.start()..punct_end] == "." && is_abbreviation(text, m.start()) {
            continue;
        }
        let sentence = text[start..punct_end].trim();
        if !sentence.is_empty() {
            sentences.push(sentence.to_string());
        }
        // Next sentence begins at the uppercase letter.
        start = m.end() - 1;
    }

    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail.to_string());
    }
    sentences
}

/// Packs sentences into chunks of at most `chunk_size` characters,
/// carrying up to `chunk_overlap` characters of trailing sentences into
/// the next chunk. A single sentence longer than the budget becomes its
/// own chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextChunker {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl TextChunker {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
        }
    }

    /// Chunk free text.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let normalized = whitespace().replace_all(text.trim(), " ");
        let sentences = split_sentences(&normalized);

        let mut chunks = Vec::new();
        let mut i = 0;

        while i < sentences.len() {
            let mut size = 0;
            let mut end = i;
            while end < sentences.len() {
                let addition = sentences[end].chars().count() + usize::from(end > i);
                if end > i && size + addition > self.chunk_size {
                    break;
                }
                size += addition;
                end += 1;
            }

            chunks.push(sentences[i..end].join(" "));
            if end >= sentences.len() {
                break;
            }

            let overlap = self.overlap_sentences(&sentences[i..end]);
            i = (end - overlap).max(i + 1);
        }

        chunks
    }

    /// Number of trailing sentences of `chunk` that fit in the overlap budget.
    fn overlap_sentences(&self, chunk: &[String]) -> usize {
        let mut size = 0;
        let mut count = 0;
        for (k, sentence) in chunk.iter().enumerate().rev() {
            let len = sentence.chars().count() + usize::from(k + 1 < chunk.len());
            if size + len > self.chunk_overlap {
                break;
            }
            size += len;
            count += 1;
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_sentences() {
        let sentences = split_sentences("First one. Second one! Third one? fourth stays.");
        assert_eq!(sentences, vec!["First one.", "Second one!", "Third one? fourth stays."]);
    }

    #[test]
    fn test_split_keeps_abbreviations() {
        let sentences = split_sentences("Taught by Dr. Smith today. Then Mr. Jones.");
        assert_eq!(sentences, vec!["Taught by Dr. Smith today.", "Then Mr. Jones."]);
    }

    #[test]
    fn test_chunk_edge_cases() {
        let chunker = TextChunker::new(200, 50);
        assert!(chunker.chunk("").is_empty());
        assert_eq!(chunker.chunk("Word"), vec!["Word"]);
        assert_eq!(chunker.chunk("Short text."), vec!["Short text."]);

        let chunks = chunker.chunk("Word1    Word2 \n\n    Word3.");
        assert_eq!(chunks, vec!["Word1 Word2 Word3."]);
    }

    #[test]
    fn test_chunks_respect_size() {
        let chunker = TextChunker::new(200, 50);
        let text = (0..40)
            .map(|i| format!("This is sentence number {}.", i))
            .collect::<Vec<_>>()
            .join(" ");

        let chunks = chunker.chunk(&text);
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.chars().count() <= 200));
        assert!(chunks.last().unwrap().ends_with("sentence number 39."));
    }

    #[test]
    fn test_chunks_overlap() {
        let chunker = TextChunker::new(100, 30);
        let text = "This is the first sentence. This is the second sentence. \
                    This is the third sentence. This is the fourth sentence.";

        let chunks = chunker.chunk(text);
        assert!(chunks.len() >= 2);
        // The third sentence fits the 30-char overlap budget.
        let last_of_first = split_sentences(&chunks[0]).pop().unwrap();
        assert!(chunks[1].starts_with(&last_of_first));
    }

    #[test]
    fn test_oversized_sentence_is_kept_whole() {
        let chunker = TextChunker::new(10, 0);
        let chunks = chunker.chunk("A sentence far longer than ten characters. Next.");
        assert_eq!(chunks, vec!["A sentence far longer than ten characters.", "Next."]);
    }
}
