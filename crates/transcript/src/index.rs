use crate::types::{CharacterIndexEntry, TranscriptSegment};

/// Build the character-position → word index.
///
/// Walks segments, then words, then characters, assigning `global_char_index`
/// `0..N`. Pure; callers that resolve repeatedly against the same segments
/// should keep a [`WordIndex`] instead.
pub fn build(segments: &[TranscriptSegment]) -> Vec<CharacterIndexEntry<'_>> {
    let mut entries = Vec::with_capacity(total_chars(segments));
    let mut global_char_index = 0;

    for (segment_index, segment) in segments.iter().enumerate() {
        for (word_index, word) in segment.words.iter().enumerate() {
            for character in word.text.chars() {
                entries.push(CharacterIndexEntry {
                    character,
                    global_char_index,
                    word,
                    segment_index,
                    word_index,
                });
                global_char_index += 1;
            }
        }
    }

    entries
}

fn total_chars(segments: &[TranscriptSegment]) -> usize {
    segments
        .iter()
        .flat_map(|s| &s.words)
        .map(|w| w.text.chars().count())
        .sum()
}

/// Result of looking up a character position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IndexHit<'a> {
    Exact(CharacterIndexEntry<'a>),
    /// The position lies past the indexed text; this is the last entry.
    Fallback(CharacterIndexEntry<'a>),
}

impl<'a> IndexHit<'a> {
    pub fn entry(&self) -> &CharacterIndexEntry<'a> {
        match self {
            Self::Exact(entry) | Self::Fallback(entry) => entry,
        }
    }

    pub fn is_exact(&self) -> bool {
        matches!(self, Self::Exact(_))
    }
}

/// Memoized character index over one segment set.
#[derive(Debug, Clone)]
pub struct WordIndex<'a> {
    entries: Vec<CharacterIndexEntry<'a>>,
}

impl<'a> WordIndex<'a> {
    pub fn new(segments: &'a [TranscriptSegment]) -> Self {
        Self {
            entries: build(segments),
        }
    }

    pub fn entries(&self) -> &[CharacterIndexEntry<'a>] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry at `position`, else the last entry before it.
    ///
    /// Positions are contiguous from 0, so only a position past the end falls
    /// back. Returns `None` only for an empty index.
    pub fn lookup(&self, position: usize) -> Option<IndexHit<'a>> {
        let after = self
            .entries
            .partition_point(|e| e.global_char_index <= position);

        let entry = *self.entries.get(after.checked_sub(1)?)?;
        if entry.global_char_index == position {
            Some(IndexHit::Exact(entry))
        } else {
            Some(IndexHit::Fallback(entry))
        }
    }

    /// The concatenated word text the index positions refer to.
    pub fn text(&self) -> String {
        self.entries.iter().map(|e| e.character).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TranscribedWord;

    fn segment(id: i64, words: &[&str]) -> TranscriptSegment {
        TranscriptSegment {
            id,
            start_time: 0.0,
            end_time: 0.0,
            text: words.concat(),
            words: words
                .iter()
                .enumerate()
                .map(|(i, w)| TranscribedWord::new(*w, i as f64, i as f64 + 1.0))
                .collect(),
        }
    }

    #[test]
    fn build_walks_segments_then_words_then_chars() {
        let segments = vec![segment(0, &["ab", "c"]), segment(1, &["de"])];
        let entries = build(&segments);

        let summary: Vec<_> = entries
            .iter()
            .map(|e| (e.character, e.global_char_index, e.segment_index, e.word_index))
            .collect();
        assert_eq!(
            summary,
            vec![
                ('a', 0, 0, 0),
                ('b', 1, 0, 0),
                ('c', 2, 0, 1),
                ('d', 3, 1, 0),
                ('e', 4, 1, 0),
            ]
        );
        assert_eq!(entries[3].word.text, "de");
    }

    #[test]
    fn build_counts_chars_not_bytes() {
        let segments = vec![segment(0, &["你好", "世界"])];
        let index = WordIndex::new(&segments);
        assert_eq!(index.len(), 4);
        assert_eq!(index.text(), "你好世界");
        assert_eq!(index.entries()[2].word.text, "世界");
    }

    #[test]
    fn lookup_exact_and_fallback() {
        let segments = vec![segment(0, &["ab", "cd"])];
        let index = WordIndex::new(&segments);

        let hit = index.lookup(2).unwrap();
        assert!(hit.is_exact());
        assert_eq!(hit.entry().word.text, "cd");

        let hit = index.lookup(40).unwrap();
        assert!(!hit.is_exact());
        assert_eq!(hit.entry().global_char_index, 3);
    }

    #[test]
    fn lookup_on_empty_index() {
        let segments = vec![segment(0, &[])];
        assert!(WordIndex::new(&segments).lookup(0).is_none());
        assert!(build(&[]).is_empty());
    }

    #[derive(Debug, Clone)]
    struct Segments(Vec<TranscriptSegment>);

    impl quickcheck::Arbitrary for Segments {
        fn arbitrary(g: &mut quickcheck::Gen) -> Self {
            let count = usize::arbitrary(g) % 5;
            let segments = (0..count)
                .map(|i| {
                    let words: Vec<String> = Vec::arbitrary(g);
                    let refs: Vec<&str> = words.iter().map(String::as_str).collect();
                    segment(i as i64, &refs)
                })
                .collect();
            Segments(segments)
        }
    }

    use quickcheck::Arbitrary;

    #[quickcheck_macros::quickcheck]
    fn prop_index_is_complete_and_gapless(segments: Segments) -> bool {
        let expected: usize = segments
            .0
            .iter()
            .flat_map(|s| &s.words)
            .map(|w| w.text.chars().count())
            .sum();
        let entries = build(&segments.0);

        entries.len() == expected
            && entries
                .iter()
                .enumerate()
                .all(|(i, e)| e.global_char_index == i)
    }

    #[quickcheck_macros::quickcheck]
    fn prop_only_positions_past_the_end_fall_back(segments: Segments, position: usize) -> bool {
        let index = WordIndex::new(&segments.0);
        let position = position % (index.len() + 3);

        match index.lookup(position) {
            None => index.is_empty(),
            Some(hit) => hit.is_exact() == (position < index.len()),
        }
    }
}
