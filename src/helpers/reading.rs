//! Reading-time estimates

/// Reading speed used when none is configured
pub const WORDS_PER_MINUTE: usize = 250;

/// Whitespace-separated words in a text
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Minutes needed to read `words`, at least one
pub fn read_time(words: usize, words_per_minute: usize) -> usize {
    words.div_ceil(words_per_minute.max(1)).max(1)
}
