use std::str::SplitWhitespace;

/// Default upper bound, in characters, of a single model invocation.
pub const DEFAULT_MAX_CHUNK_LENGTH: usize = 400;

/// A bounded segment of text; `index` is its position in the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    pub index: usize,
    pub text: String,
}

/// Greedy word-wrap over whitespace-delimited tokens.
///
/// Tokens are joined by a single space and a segment is closed as soon as the
/// next token would push it past `max_length` characters. A token that is
/// longer than `max_length` on its own is emitted alone, never cut.
///
/// The iterator is lazy and `Clone`, so a sequence can be replayed from any point.
pub fn chunk(text: &str, max_length: usize) -> Chunks<'_> {
    Chunks {
        tokens: text.split_whitespace(),
        pending: None,
        max_length,
        next_index: 0,
    }
}

/// Collects [`chunk`] into a vector.
pub fn chunk_text(text: &str, max_length: usize) -> Vec<TextChunk> {
    chunk(text, max_length).collect()
}

#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    tokens: SplitWhitespace<'a>,
    pending: Option<&'a str>,
    max_length: usize,
    next_index: usize,
}

impl<'a> Iterator for Chunks<'a> {
    type Item = TextChunk;

    fn next(&mut self) -> Option<Self::Item> {
        let mut text = String::new();
        let mut length = 0;

        while let Some(token) = self.pending.take().or_else(|| self.tokens.next()) {
            let token_length = token.chars().count();
            if text.is_empty() {
                text.push_str(token);
                length = token_length;
                continue;
            }
            if length + 1 + token_length > self.max_length {
                self.pending = Some(token);
                break;
            }
            text.push(' ');
            text.push_str(token);
            length += 1 + token_length;
        }

        if text.is_empty() {
            return None;
        }

        let index = self.next_index;
        self.next_index += 1;
        Some(TextChunk { index, text })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_yields_nothing() {
        assert!(chunk_text("", 400).is_empty());
        assert!(chunk_text("  \n\t ", 400).is_empty());
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        let chunks = chunk_text("Bonjour le monde", 400);
        assert_eq!(
            chunks,
            vec![TextChunk {
                index: 0,
                text: "Bonjour le monde".to_string()
            }]
        );
    }

    #[test]
    fn test_greedy_wrap_respects_limit() {
        let text = "aaaa bbbb cccc dddd eeee";
        let chunks = chunk_text(text, 9);
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["aaaa bbbb", "cccc dddd", "eeee"]);
        assert!(chunks.iter().all(|c| c.text.chars().count() <= 9));
    }

    #[test]
    fn test_long_token_stands_alone() {
        let chunks = chunk_text("hi abcdefghijklmnop there", 5);
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["hi", "abcdefghijklmnop", "there"]);
    }

    #[test]
    fn test_tokens_are_preserved_in_order() {
        let text = "Le traducteur découpe le texte\nen segments\n\nde taille bornée, puis les réassemble.";
        for max_length in [1, 7, 16, 40, 400] {
            let chunks = chunk_text(text, max_length);
            let rejoined = chunks
                .iter()
                .map(|c| c.text.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            let original: Vec<&str> = text.split_whitespace().collect();
            let wrapped: Vec<&str> = rejoined.split_whitespace().collect();
            assert_eq!(original, wrapped, "max_length = {}", max_length);

            for c in &chunks {
                let single_token = !c.text.contains(' ');
                assert!(c.text.chars().count() <= max_length || single_token);
            }
        }
    }

    #[test]
    fn test_indices_are_sequential() {
        let chunks = chunk_text("one two three four five six", 8);
        for (position, c) in chunks.iter().enumerate() {
            assert_eq!(c.index, position);
        }
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        // "éééé" is 4 characters but 8 bytes
        let chunks = chunk_text("éééé éééé", 9);
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn test_sequence_is_restartable() {
        let mut chunks = chunk("alpha beta gamma delta", 10);
        let first = chunks.next().unwrap();
        let replay = chunks.clone();
        let rest: Vec<TextChunk> = chunks.collect();
        let replayed: Vec<TextChunk> = replay.collect();
        assert_eq!(first.text, "alpha beta");
        assert_eq!(rest, replayed);
    }
}
