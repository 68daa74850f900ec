// Copyright 2024 Karpeles Lab Inc.
// Dictionary tracking for ring-placed blocks

use std::ops::Range;

use crate::constants::WINDOW_SIZE;

/// Ring regions that make up the dictionary for the next block
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Dictionary {
    /// No history yet
    Empty,
    /// One contiguous region of the ring
    Contiguous(Range<usize>),
    /// Tail of the segment before the last wraparound, followed by the
    /// bytes written since
    Split {
        external: Range<usize>,
        prefix: Range<usize>,
    },
}

impl Dictionary {
    pub(crate) fn len(&self) -> usize {
        match self {
            Dictionary::Empty => 0,
            Dictionary::Contiguous(r) => r.len(),
            Dictionary::Split { external, prefix } => external.len() + prefix.len(),
        }
    }
}

/// Running dictionary state of one codec context
///
/// `prefix` is the contiguous run of ring bytes ending with the last block.
/// When a block is placed anywhere other than directly after `prefix` (a
/// wraparound), the old prefix becomes `external` history. Regions are
/// clipped so they never overlap the block being coded, because the encoder
/// writes that block into the ring before compressing it and the decoder
/// writes into it while reading the dictionary.
#[derive(Debug, Clone, Default)]
pub(crate) struct History {
    prefix: Range<usize>,
    external: Range<usize>,
}

impl History {
    pub(crate) fn new() -> Self {
        History::default()
    }

    /// Dictionary available to a block about to occupy `block`
    pub(crate) fn dictionary_for(&self, block: &Range<usize>) -> Dictionary {
        if block.start == self.prefix.end {
            let prefix = tail(self.prefix.clone(), WINDOW_SIZE);
            let room = WINDOW_SIZE - prefix.len();
            let external = tail(clip_after(self.external.clone(), block.end), room);
            match (external.is_empty(), prefix.is_empty()) {
                (true, true) => Dictionary::Empty,
                (true, false) => Dictionary::Contiguous(prefix),
                (false, true) => Dictionary::Contiguous(external),
                (false, false) => Dictionary::Split { external, prefix },
            }
        } else {
            let previous = tail(clip_after(self.prefix.clone(), block.end), WINDOW_SIZE);
            if previous.is_empty() {
                Dictionary::Empty
            } else {
                Dictionary::Contiguous(previous)
            }
        }
    }

    /// Record that `block` now holds the most recently coded bytes
    pub(crate) fn commit(&mut self, block: Range<usize>) {
        if block.start == self.prefix.end {
            self.prefix.end = block.end;
            self.external = clip_after(self.external.clone(), block.end);
        } else {
            self.external = tail(clip_after(self.prefix.clone(), block.end), WINDOW_SIZE);
            self.prefix = block;
        }
        if self.prefix.len() >= WINDOW_SIZE {
            self.external = 0..0;
        }
    }
}

/// Last `max` bytes of `range`
fn tail(range: Range<usize>, max: usize) -> Range<usize> {
    if range.len() > max {
        range.end - max..range.end
    } else {
        range
    }
}

/// Part of `range` that lies at or beyond `limit`
fn clip_after(range: Range<usize>, limit: usize) -> Range<usize> {
    if range.end <= limit {
        return 0..0;
    }
    range.start.max(limit)..range.end
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_block_has_no_dictionary() {
        let history = History::new();
        assert_eq!(history.dictionary_for(&(0..100)), Dictionary::Empty);
    }

    #[test]
    fn test_contiguous_blocks_extend_prefix() {
        let mut history = History::new();
        history.commit(0..100);
        assert_eq!(
            history.dictionary_for(&(100..200)),
            Dictionary::Contiguous(0..100)
        );
        history.commit(100..200);
        assert_eq!(
            history.dictionary_for(&(200..250)),
            Dictionary::Contiguous(0..200)
        );
    }

    #[test]
    fn test_prefix_limited_to_window() {
        let mut history = History::new();
        history.commit(0..WINDOW_SIZE);
        history.commit(WINDOW_SIZE..WINDOW_SIZE + 10);
        let block = WINDOW_SIZE + 10..WINDOW_SIZE + 20;
        assert_eq!(
            history.dictionary_for(&block),
            Dictionary::Contiguous(10..WINDOW_SIZE + 10)
        );
    }

    #[test]
    fn test_wraparound_uses_previous_segment() {
        let mut history = History::new();
        history.commit(0..1000);
        history.commit(1000..3000);

        // wrapped block at the start of the ring
        let block = 0..500;
        assert_eq!(
            history.dictionary_for(&block),
            Dictionary::Contiguous(500..3000)
        );

        history.commit(block);
        assert_eq!(
            history.dictionary_for(&(500..800)),
            Dictionary::Split {
                external: 800..3000,
                prefix: 0..500,
            }
        );
    }

    #[test]
    fn test_external_history_consumed_by_new_writes() {
        let mut history = History::new();
        history.commit(0..1000);
        history.commit(0..400);
        history.commit(400..1000);
        assert_eq!(
            history.dictionary_for(&(1000..1100)),
            Dictionary::Contiguous(0..1000)
        );
    }

    #[test]
    fn test_split_respects_window() {
        let mut history = History::new();
        history.commit(100_000..100_000 + WINDOW_SIZE);
        history.commit(0..1000);
        let dict = history.dictionary_for(&(1000..2000));
        assert_eq!(dict.len(), WINDOW_SIZE);
        assert_eq!(
            dict,
            Dictionary::Split {
                external: 100_000 + 1000..100_000 + WINDOW_SIZE,
                prefix: 0..1000,
            }
        );
    }
}
