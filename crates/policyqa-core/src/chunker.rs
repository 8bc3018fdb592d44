//! Fixed-size overlapping character windows over page text.
//!
//! Chunk `i` starts at character offset `i * (chunk_len - overlap)`. The end
//! of a window snaps backward to the nearest whitespace within the overlap
//! region so words are not split; because the snap distance never exceeds
//! the overlap, consecutive windows still cover the whole input.

/// Collapse whitespace runs to single spaces and trim the ends.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split text into overlapping windows, returning `(chunk, start, end)`
/// triples with character offsets into the input.
pub fn sliding_window(text: &str, chunk_len: usize, overlap: usize) -> Vec<(String, usize, usize)> {
    let chars: Vec<char> = text.chars().collect();
    let total = chars.len();

    if total == 0 || chunk_len == 0 {
        return Vec::new();
    }

    // Text shorter than one window is a single chunk
    if total <= chunk_len {
        let chunk: String = chars.iter().collect();
        let trimmed = chunk.trim().to_string();
        if trimmed.is_empty() {
            return Vec::new();
        }
        return vec![(trimmed, 0, total)];
    }

    let step = chunk_len.saturating_sub(overlap).max(1);
    let mut chunks = Vec::new();
    let mut start = 0;

    loop {
        let nominal_end = (start + chunk_len).min(total);

        let end = if nominal_end < total && splits_word(&chars, nominal_end) {
            snap_to_whitespace(&chars, start, nominal_end, overlap).unwrap_or(nominal_end)
        } else {
            nominal_end
        };

        let chunk: String = chars[start..end].iter().collect();
        let trimmed = chunk.trim().to_string();
        if !trimmed.is_empty() {
            chunks.push((trimmed, start, end));
        }

        if nominal_end >= total {
            break;
        }
        start += step;
    }

    chunks
}

/// Split text into overlapping chunk strings.
pub fn split_text(text: &str, chunk_len: usize, overlap: usize) -> Vec<String> {
    sliding_window(text, chunk_len, overlap)
        .into_iter()
        .map(|(chunk, _, _)| chunk)
        .collect()
}

/// True when cutting at `pos` would land in the middle of a word.
fn splits_word(chars: &[char], pos: usize) -> bool {
    pos > 0 && !chars[pos - 1].is_whitespace() && !chars[pos].is_whitespace()
}

/// Find a whitespace cut point within `overlap` characters before `end`.
/// Bounding the search by the overlap keeps the next window's fixed start
/// inside the current chunk's coverage.
fn snap_to_whitespace(chars: &[char], start: usize, end: usize, overlap: usize) -> Option<usize> {
    let radius = overlap.min(end - start - 1);
    (end - radius..end).rev().find(|&p| chars[p].is_whitespace())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn offset_stepping_without_whitespace() {
        // step = chunk_len - overlap = 3
        assert_eq!(split_text("ABCDEFGHIJ", 4, 1), vec!["ABCD", "DEFG", "GHIJ"]);
    }

    #[test]
    fn empty_text_yields_no_chunks() {
        assert!(split_text("", 100, 10).is_empty());
        assert!(split_text("   ", 100, 10).is_empty());
    }

    #[test]
    fn short_text_yields_one_whole_chunk() {
        let chunks = split_text("grace period", 100, 10);
        assert_eq!(chunks, vec!["grace period"]);
    }

    #[test]
    fn text_exactly_one_window_long() {
        assert_eq!(split_text("ABCD", 4, 1), vec!["ABCD"]);
    }

    #[test]
    fn snaps_to_whitespace_instead_of_splitting_words() {
        let text = "the grace period for premium payment is thirty days";
        for (chunk, _, _) in sliding_window(text, 20, 8) {
            // A snapped cut never leaves a partial word at the chunk edge
            assert!(text.contains(&chunk), "chunk {:?} not a substring", chunk);
            for word in chunk.split_whitespace() {
                assert!(
                    text.split_whitespace().any(|w| w == word),
                    "word {:?} was split",
                    word
                );
            }
        }
    }

    #[test]
    fn no_chunk_is_empty() {
        let text = "a  b  c  d  e  f  g  h  i  j  k  l  m  n";
        for chunk in split_text(text, 6, 2) {
            assert!(!chunk.is_empty());
        }
    }

    #[test]
    fn normalize_collapses_runs() {
        assert_eq!(
            normalize_whitespace("a\n\n b\t\tc   d "),
            "a b c d".to_string()
        );
    }

    proptest! {
        /// Every non-whitespace character of the input is covered by the
        /// span of at least one chunk.
        #[test]
        fn windows_cover_the_input(
            text in "[ a-zA-Z0-9]{0,300}",
            chunk_len in 2usize..60,
            overlap_frac in 0usize..100,
        ) {
            let overlap = overlap_frac * (chunk_len - 1) / 100;
            let spans = sliding_window(&text, chunk_len, overlap);
            let chars: Vec<char> = text.chars().collect();

            for (pos, c) in chars.iter().enumerate() {
                if c.is_whitespace() {
                    continue;
                }
                prop_assert!(
                    spans.iter().any(|(_, start, end)| *start <= pos && pos < *end),
                    "char at {} not covered", pos
                );
            }
        }

        /// Concatenating chunks while skipping overlap regions reconstructs
        /// the input (modulo boundary whitespace dropped by trimming).
        #[test]
        fn concatenation_reconstructs_text(
            text in "[a-z]{1,200}",
            chunk_len in 2usize..40,
        ) {
            // No whitespace in the input, so no snapping happens and spans
            // are exact.
            let overlap = chunk_len / 4;
            let spans = sliding_window(&text, chunk_len, overlap);
            let chars: Vec<char> = text.chars().collect();

            let mut rebuilt = String::new();
            let mut covered = 0usize;
            for (chunk, start, end) in &spans {
                let fresh = covered.max(*start);
                let skip = fresh - start;
                rebuilt.extend(chunk.chars().skip(skip));
                covered = covered.max(*end);
            }
            prop_assert_eq!(rebuilt, chars.iter().collect::<String>());
        }
    }
}
