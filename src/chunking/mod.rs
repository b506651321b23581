//! Word-aligned chunking for context-limited generation calls.
//!
//! Long transcriptions are split into chunks of at most `max_size`
//! characters so each one fits a single prompt. Chunks break only on
//! whitespace; a word is never split, so a word longer than `max_size`
//! ends up alone in an oversized chunk.
//!
//! ```text
//! max_size = 12
//!
//! "the quick brown fox jumps"
//!
//! Chunk 0: "the quick"      (4 + 6 = 10, adding "brown " would make 16)
//! Chunk 1: "brown fox"
//! Chunk 2: "jumps"
//! ```
//!
//! Sizes are counted in characters, not tokens.

mod sampler;

pub use sampler::{sample_head_tail, SAMPLE_SEPARATOR};

use std::borrow::Cow;
use std::str::SplitWhitespace;

/// Split `text` into word-aligned chunks of at most `max_size` characters.
///
/// Text that already fits is yielded unchanged as a single chunk. Otherwise
/// words are joined with single spaces, so whitespace runs and line breaks
/// inside the text are not preserved.
///
/// The returned iterator is lazy and can be cloned to restart it.
pub fn chunk_text(text: &str, max_size: usize) -> Chunks<'_> {
    let state = if text.chars().count() <= max_size {
        State::Whole(Some(text))
    } else {
        State::Words {
            words: text.split_whitespace(),
            pending: None,
        }
    };

    Chunks { max_size, state }
}

/// Iterator over the chunks of a text. See [`chunk_text`].
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    max_size: usize,
    state: State<'a>,
}

#[derive(Debug, Clone)]
enum State<'a> {
    Whole(Option<&'a str>),
    Words {
        words: SplitWhitespace<'a>,
        pending: Option<&'a str>,
    },
}

impl<'a> Iterator for Chunks<'a> {
    type Item = Cow<'a, str>;

    fn next(&mut self) -> Option<Self::Item> {
        let max_size = self.max_size;

        match &mut self.state {
            State::Whole(text) => text.take().map(Cow::Borrowed),
            State::Words { words, pending } => {
                let mut chunk = String::new();
                // Each word costs its length plus one separating space.
                let mut cost = 0usize;

                while let Some(word) = pending.take().or_else(|| words.next()) {
                    let word_cost = word.chars().count() + 1;
                    if !chunk.is_empty() && cost + word_cost > max_size {
                        *pending = Some(word);
                        break;
                    }
                    if !chunk.is_empty() {
                        chunk.push(' ');
                    }
                    chunk.push_str(word);
                    cost += word_cost;
                }

                if chunk.is_empty() {
                    None
                } else {
                    Some(Cow::Owned(chunk))
                }
            }
        }
    }
}
