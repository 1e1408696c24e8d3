//! Transcript excerpts around confusion timestamps.
//!
//! Each timestamp `t` becomes the window `[t - buffer, t + buffer]`, and the
//! excerpt is whatever the [`PhraseStore`] returns for that window. Excerpts
//! are produced lazily, one per timestamp, in input order.

use crate::error::Result;
use crate::transcription::PhraseStore;
use serde::Serialize;

/// Seconds of transcript taken on each side of a confusion timestamp.
pub const DEFAULT_BUFFER_SECONDS: f64 = 5.0;

/// Transcript text surrounding one confusion timestamp.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptExcerpt {
    /// The confusion timestamp this excerpt was cut around.
    pub timestamp: f64,
    pub window_start: f64,
    pub window_end: f64,
    pub text: String,
}

/// One-shot iterator over the excerpts for a list of timestamps.
///
/// Yields exactly one item per timestamp. Lookup failures are reported per
/// item so the caller decides whether to skip the segment or abort.
#[derive(Debug)]
pub struct Segments<'a> {
    store: &'a PhraseStore,
    timestamps: std::vec::IntoIter<f64>,
    buffer: f64,
}

impl Iterator for Segments<'_> {
    type Item = Result<TranscriptExcerpt>;

    fn next(&mut self) -> Option<Self::Item> {
        let timestamp = self.timestamps.next()?;
        let window_start = timestamp - self.buffer;
        let window_end = timestamp + self.buffer;

        Some(self.store.text_from(window_start, window_end).map(|text| TranscriptExcerpt {
            timestamp,
            window_start,
            window_end,
            text,
        }))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.timestamps.size_hint()
    }
}

impl ExactSizeIterator for Segments<'_> {}

/// Cut an excerpt around every timestamp, in order.
pub fn segments_from(store: &PhraseStore, timestamps: Vec<f64>, buffer: f64) -> Segments<'_> {
    Segments {
        store,
        timestamps: timestamps.into_iter(),
        buffer,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PersonaLearnError;
    use crate::transcription::Phrase;

    fn store() -> PhraseStore {
        let phrases = (0..10)
            .map(|i| {
                let start = i as f64 * 4.0;
                Phrase::new(start, start + 4.0, format!("s{}", i)).unwrap()
            })
            .collect();
        PhraseStore::new("Lecture", phrases).unwrap()
    }

    #[test]
    fn test_excerpts_follow_input_order() {
        let store = store();
        let excerpts: Vec<TranscriptExcerpt> = segments_from(&store, vec![30.0, 2.0, 17.0], 5.0)
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(excerpts.len(), 3);
        assert_eq!(excerpts[0].timestamp, 30.0);
        assert_eq!(excerpts[0].text, "s6 s7 s8");
        // 2 - 5 = -3 misses the transcript, so the window starts at the first phrase.
        assert_eq!(excerpts[1].text, "s0 s1");
        assert_eq!(excerpts[2].window_start, 12.0);
        assert_eq!(excerpts[2].window_end, 22.0);
        assert_eq!(excerpts[2].text, "s3 s4 s5");
    }

    #[test]
    fn test_default_buffer() {
        let store = store();
        let excerpt = segments_from(&store, vec![20.0], DEFAULT_BUFFER_SECONDS)
            .next()
            .unwrap()
            .unwrap();
        assert_eq!((excerpt.window_start, excerpt.window_end), (15.0, 25.0));
        assert_eq!(excerpt.text, "s3 s4 s5 s6");
    }

    #[test]
    fn test_errors_are_reported_per_item() {
        let store = store();
        let results: Vec<_> = segments_from(&store, vec![500.0, 10.0], 5.0).collect();

        assert!(matches!(results[0], Err(PersonaLearnError::OutOfRange { .. })));
        assert_eq!(results[1].as_ref().unwrap().text, "s1 s2 s3");
    }

    #[test]
    fn test_negative_buffer_inverts_every_window() {
        let store = store();
        let mut segments = segments_from(&store, vec![10.0], -1.0);
        assert!(matches!(
            segments.next(),
            Some(Err(PersonaLearnError::InvalidRange { .. }))
        ));
        assert!(segments.next().is_none());
    }

    #[test]
    fn test_len_matches_timestamps() {
        let store = store();
        let segments = segments_from(&store, vec![1.0, 2.0, 3.0], 5.0);
        assert_eq!(segments.len(), 3);
        assert_eq!(segments_from(&store, Vec::new(), 5.0).count(), 0);
    }
}
