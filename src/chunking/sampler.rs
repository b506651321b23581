//! Head and tail sampling for whole-document analyses.
//!
//! Topics are framed at the start (introduction) and end (recap) of spoken
//! content, so a long transcription is represented by its first and last
//! `sample_size` characters instead of being chunked.

use std::borrow::Cow;

/// Marker placed between the head and the tail of a sample.
pub const SAMPLE_SEPARATOR: &str = "\n...\n";

/// Build a head+tail sample of at most `2 * sample_size` characters plus the separator.
///
/// Text of up to `2 * sample_size` characters is returned unchanged.
pub fn sample_head_tail(text: &str, sample_size: usize) -> Cow<'_, str> {
    let total = text.chars().count();
    if total <= sample_size.saturating_mul(2) {
        return Cow::Borrowed(text);
    }

    let head_end = byte_offset(text, sample_size);
    let tail_start = byte_offset(text, total - sample_size);

    let mut sample = String::with_capacity(head_end + SAMPLE_SEPARATOR.len() + text.len() - tail_start);
    sample.push_str(&text[..head_end]);
    sample.push_str(SAMPLE_SEPARATOR);
    sample.push_str(&text[tail_start..]);
    Cow::Owned(sample)
}

/// Byte offset of the `char_index`-th character.
fn byte_offset(text: &str, char_index: usize) -> usize {
    text.char_indices()
        .nth(char_index)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_is_borrowed_unchanged() {
        let text = "x".repeat(20);
        let sample = sample_head_tail(&text, 10);
        assert!(matches!(sample, Cow::Borrowed(_)));
        assert_eq!(sample, text);
    }

    #[test]
    fn test_long_text_keeps_head_and_tail() {
        let text = format!("{}{}{}", "H".repeat(10), "m".repeat(30), "T".repeat(10));
        let sample = sample_head_tail(&text, 10);

        assert_eq!(sample, format!("{}{}{}", "H".repeat(10), SAMPLE_SEPARATOR, "T".repeat(10)));
        assert!(sample.chars().count() <= 2 * 10 + SAMPLE_SEPARATOR.chars().count());
    }

    #[test]
    fn test_one_over_the_limit_is_sampled() {
        let text = "abcdefghijk";
        let sample = sample_head_tail(text, 5);
        assert_eq!(sample, format!("abcde{}ghijk", SAMPLE_SEPARATOR));
    }

    #[test]
    fn test_multibyte_text() {
        let text = "áéíóú".repeat(10);
        let sample = sample_head_tail(&text, 5);
        assert_eq!(sample, format!("áéíóú{}áéíóú", SAMPLE_SEPARATOR));
    }
}
