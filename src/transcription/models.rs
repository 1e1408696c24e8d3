//! Phrase-level transcript model with time-range lookup.

use crate::error::{PersonaLearnError, Result};
use serde::{Deserialize, Serialize};

/// A single timed unit of transcript text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phrase {
    start: f64,
    end: f64,
    text: String,
}

impl Phrase {
    /// Create a phrase. `start` must be strictly before `end`.
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Result<Self> {
        if !(start < end) {
            return Err(PersonaLearnError::InvalidPhrase(format!(
                "start {}s must be before end {}s",
                start, end
            )));
        }

        Ok(Self {
            start,
            end,
            text: text.into(),
        })
    }

    /// Start time in seconds.
    pub fn start(&self) -> f64 {
        self.start
    }

    /// End time in seconds.
    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether `time` falls inside `[start, end)`.
    pub fn contains(&self, time: f64) -> bool {
        self.start <= time && time < self.end
    }

    /// Duration of this phrase in seconds.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// The ordered phrases of one video's transcript.
///
/// Phrases are sorted by start time and never overlap, which is what makes the
/// binary search in [`PhraseStore::text_from`] sound. The store is immutable
/// after construction and can be shared freely between readers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhraseStore {
    title: String,
    phrases: Vec<Phrase>,
}

impl PhraseStore {
    /// Build a store, rejecting unsorted or overlapping phrases.
    pub fn new(title: impl Into<String>, phrases: Vec<Phrase>) -> Result<Self> {
        for (i, pair) in phrases.windows(2).enumerate() {
            let (current, next) = (&pair[0], &pair[1]);
            if current.end > next.start {
                return Err(PersonaLearnError::InvalidTranscript(format!(
                    "phrase {} ({}s..{}s) overlaps or precedes phrase {} ({}s..{}s)",
                    i + 1,
                    next.start,
                    next.end,
                    i,
                    current.start,
                    current.end
                )));
            }
        }

        Ok(Self {
            title: title.into(),
            phrases,
        })
    }

    /// Title of the transcribed video.
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn phrases(&self) -> &[Phrase] {
        &self.phrases
    }

    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }

    /// End of the last phrase, or zero for an empty transcript.
    pub fn duration(&self) -> f64 {
        self.phrases.last().map(|p| p.end).unwrap_or(0.0)
    }

    /// All phrase texts joined by single spaces.
    pub fn full_text(&self) -> String {
        join_texts(&self.phrases)
    }

    /// Index of the phrase containing `time`, or `None` when `time` falls
    /// before the first phrase, after the last one, or in a gap.
    fn locate(&self, time: f64) -> Option<usize> {
        // Number of phrases starting at or before `time`.
        let candidates = self.phrases.partition_point(|p| p.start <= time);
        let idx = candidates.checked_sub(1)?;
        self.phrases[idx].contains(time).then_some(idx)
    }

    /// Text spoken between `start` and `end`.
    ///
    /// Both bounds are located by binary search. When only `start` misses every
    /// phrase the lookup starts from the first phrase; when only `end` misses,
    /// it runs through the last phrase. When both miss the range is rejected.
    pub fn text_from(&self, start: f64, end: f64) -> Result<String> {
        if start.is_nan() || end.is_nan() || start > end {
            return Err(PersonaLearnError::InvalidRange { start, end });
        }

        let (first, last) = match (self.locate(start), self.locate(end)) {
            (None, None) => return Err(PersonaLearnError::OutOfRange { start, end }),
            (Some(first), Some(last)) => (first, last),
            (None, Some(last)) => (0, last),
            (Some(first), None) => (first, self.phrases.len() - 1),
        };

        Ok(join_texts(&self.phrases[first..=last]))
    }
}

fn join_texts(phrases: &[Phrase]) -> String {
    phrases
        .iter()
        .map(|p| p.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Format seconds as MM:SS or HH:MM:SS.
pub fn format_timestamp(seconds: f64) -> String {
    let total_seconds = seconds.max(0.0) as u32;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}
