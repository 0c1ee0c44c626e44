//! Word-boundary-aware sliding window chunker (spec §4.2).

/// Chunking knobs. Defaults match the reference behavior: 1200-char windows,
/// a 400-char minimum before a word-boundary cut is accepted, 200-char
/// overlap between consecutive windows, capped at 40 chunks per document.
#[derive(Debug, Clone, Copy)]
pub struct ChunkConfig {
    pub max_chars: usize,
    pub min_chars: usize,
    pub overlap: usize,
    pub max_chunks: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            max_chars: 1200,
            min_chars: 400,
            overlap: 200,
            max_chunks: 40,
        }
    }
}

/// One emitted chunk, indexed in emission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub index: i32,
    pub content: String,
}

/// Split `body` into overlapping, word-boundary-aligned chunks.
///
/// Short bodies (shorter than `max_chars` once trimmed) come back as a single
/// chunk. Longer bodies are walked window by window: each window reaches for
/// `max_chars`, then backs up to the nearest whitespace at or after
/// `min_chars` so it doesn't split mid-word. Empty or whitespace-only chunks
/// are dropped and never counted against `max_chunks`.
pub fn chunk_body(body: &str, config: &ChunkConfig) -> Vec<Chunk> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    if trimmed.chars().count() <= config.max_chars {
        return vec![Chunk {
            index: 0,
            content: trimmed.to_string(),
        }];
    }

    let chars: Vec<char> = trimmed.chars().collect();
    let len = chars.len();

    let mut chunks = Vec::new();
    let mut start = 0usize;

    while start < len && chunks.len() < config.max_chunks {
        let ideal_end = (start + config.max_chars).min(len);
        let end = if ideal_end >= len {
            len
        } else {
            find_word_boundary(&chars, start, ideal_end, config.min_chars)
        };

        let slice: String = chars[start..end].iter().collect();
        let trimmed_slice = slice.trim();
        if !trimmed_slice.is_empty() {
            chunks.push(Chunk {
                index: chunks.len() as i32,
                content: trimmed_slice.to_string(),
            });
        }

        if end >= len {
            break;
        }

        let next_start = end.saturating_sub(config.overlap);
        // Never regress and never stall: the next window starts strictly
        // between `start` and `end`.
        start = next_start.max(start + 1).min(end);
    }

    chunks
}

/// Walk backward from `ideal_end` toward `start + min_chars` looking for the
/// most recent whitespace character to cut on. Falls back to `ideal_end`
/// verbatim if no boundary is found in range.
fn find_word_boundary(chars: &[char], start: usize, ideal_end: usize, min_chars: usize) -> usize {
    let floor = (start + min_chars).min(ideal_end);
    let mut cursor = ideal_end;
    while cursor > floor {
        if chars[cursor - 1].is_whitespace() {
            return cursor;
        }
        cursor -= 1;
    }
    ideal_end
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_body_is_a_single_chunk() {
        let chunks = chunk_body("hello world", &ChunkConfig::default());
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].index, 0);
        assert_eq!(chunks[0].content, "hello world");
    }

    #[test]
    fn empty_body_yields_no_chunks() {
        assert!(chunk_body("   \n  ", &ChunkConfig::default()).is_empty());
    }

    #[test]
    fn long_body_produces_dense_indices_and_bounded_sizes() {
        let word = "lorem ";
        let body: String = word.repeat(600); // ~3600 chars
        let chunks = chunk_body(&body, &ChunkConfig::default());
        assert!(chunks.len() >= 2);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, i as i32);
            assert!(chunk.content.chars().count() <= 1200);
            assert!(!chunk.content.trim().is_empty());
        }
    }

    #[test]
    fn three_thousand_char_body_yields_two_or_three_overlapping_chunks() {
        let body: String = "word ".repeat(600);
        let chunks = chunk_body(&body, &ChunkConfig::default());
        assert!(chunks.len() == 2 || chunks.len() == 3);
    }

    #[test]
    fn respects_max_chunks_cap() {
        let body: String = "x ".repeat(100_000);
        let config = ChunkConfig {
            max_chunks: 5,
            ..ChunkConfig::default()
        };
        let chunks = chunk_body(&body, &config);
        assert!(chunks.len() <= 5);
    }
}
