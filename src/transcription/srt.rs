//! SubRip (SRT) reading and writing.
//!
//! Cached transcriptions are stored as sentence-level SRT files:
//!
//! ```text
//! 1
//! 00:00:00,000 --> 00:00:02,500
//! Hello world.
//!
//! ```

use super::Phrase;
use crate::error::{PersonaLearnError, Result};
use tracing::warn;

/// Parse SRT content into ordered phrases.
///
/// Multi-line cue text is joined with single spaces. Cues whose end does not
/// come after their start are skipped.
pub fn parse_srt(content: &str) -> Result<Vec<Phrase>> {
    let mut phrases = Vec::new();
    let mut lines = content.lines().enumerate().peekable();

    while let Some((line_no, line)) = lines.next() {
        let trimmed = line.trim().trim_start_matches('\u{feff}');
        if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }

        let (timing_no, timing) = lines.next().ok_or_else(|| PersonaLearnError::SubtitleParse {
            line: line_no + 1,
            reason: format!("cue {} has no timing line", trimmed),
        })?;

        let (start, end) = parse_timing(timing).map_err(|reason| PersonaLearnError::SubtitleParse {
            line: timing_no + 1,
            reason,
        })?;

        let mut text_lines = Vec::new();
        while let Some((_, text)) = lines.peek() {
            if text.trim().is_empty() {
                break;
            }
            text_lines.push(text.trim().to_string());
            lines.next();
        }

        match Phrase::new(start, end, text_lines.join(" ")) {
            Ok(phrase) => phrases.push(phrase),
            Err(e) => warn!("Skipping subtitle cue {}: {}", trimmed, e),
        }
    }

    Ok(phrases)
}

/// Render phrases as SRT.
pub fn to_srt(phrases: &[Phrase]) -> String {
    let mut output = String::new();

    for (i, phrase) in phrases.iter().enumerate() {
        output.push_str(&format!("{}\n", i + 1));
        output.push_str(&format!(
            "{} --> {}\n",
            format_srt_timestamp(phrase.start()),
            format_srt_timestamp(phrase.end())
        ));
        output.push_str(phrase.text());
        output.push_str("\n\n");
    }

    output
}

fn parse_timing(line: &str) -> std::result::Result<(f64, f64), String> {
    let (start, end) = line
        .split_once("-->")
        .ok_or_else(|| format!("expected 'start --> end', got '{}'", line.trim()))?;

    Ok((parse_srt_timestamp(start)?, parse_srt_timestamp(end)?))
}

/// Parse `HH:MM:SS,mmm` into fractional seconds.
pub fn parse_srt_timestamp(timestamp: &str) -> std::result::Result<f64, String> {
    let timestamp = timestamp.trim();
    let invalid = || format!("invalid timestamp '{}'", timestamp);

    let mut parts = timestamp.splitn(3, ':');
    let (hours, minutes, rest) = match (parts.next(), parts.next(), parts.next()) {
        (Some(h), Some(m), Some(rest)) => (h, m, rest),
        _ => return Err(invalid()),
    };
    let (seconds, millis) = rest
        .split_once(',')
        .or_else(|| rest.split_once('.'))
        .ok_or_else(invalid)?;

    let number = |s: &str| s.parse::<u64>().map_err(|_| invalid());

    Ok(number(hours)? as f64 * 3600.0
        + number(minutes)? as f64 * 60.0
        + number(seconds)? as f64
        + number(millis)? as f64 / 1000.0)
}

/// Format timestamp for SRT (00:00:00,000).
pub fn format_srt_timestamp(seconds: f64) -> String {
    let total_ms = srt_millis(seconds);
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let secs = (total_ms % 60_000) / 1000;
    let ms = total_ms % 1000;

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, ms)
}

/// Whole milliseconds a timestamp is written with.
pub(crate) fn srt_millis(seconds: f64) -> u64 {
    (seconds.max(0.0) * 1000.0).round() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "1\n00:00:00,000 --> 00:00:02,500\nHello world.\n\n2\n00:00:02,500 --> 00:00:05,000\nThis is\na test.\n\n";

    #[test]
    fn test_parse_srt() {
        let phrases = parse_srt(SAMPLE).unwrap();
        assert_eq!(phrases.len(), 2);
        assert_eq!(phrases[0].text(), "Hello world.");
        assert_eq!(phrases[0].end(), 2.5);
        assert_eq!(phrases[1].text(), "This is a test.");
        assert_eq!(phrases[1].start(), 2.5);
    }

    #[test]
    fn test_write_then_read_srt() {
        let phrases = parse_srt(SAMPLE).unwrap();
        let rendered = to_srt(&phrases);
        assert!(rendered.starts_with("1\n00:00:00,000 --> 00:00:02,500\nHello world.\n\n"));
        assert_eq!(parse_srt(&rendered).unwrap(), phrases);
    }

    #[test]
    fn test_parse_tolerates_crlf_and_bom() {
        let content = "\u{feff}1\r\n00:00:01,000 --> 00:00:02,000\r\nHi\r\n\r\n";
        let phrases = parse_srt(content).unwrap();
        assert_eq!(phrases.len(), 1);
        assert_eq!(phrases[0].text(), "Hi");
        assert_eq!(phrases[0].start(), 1.0);
    }

    #[test]
    fn test_zero_length_cue_is_skipped() {
        let content = "1\n00:00:01,000 --> 00:00:01,000\nblip\n\n2\n00:00:01,000 --> 00:00:02,000\nkept\n";
        let phrases = parse_srt(content).unwrap();
        assert_eq!(phrases.len(), 1);
        assert_eq!(phrases[0].text(), "kept");
    }

    #[test]
    fn test_malformed_timing_reports_line() {
        let content = "1\nnot a timing line\ntext\n";
        match parse_srt(content) {
            Err(PersonaLearnError::SubtitleParse { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_srt_timestamp() {
        assert_eq!(parse_srt_timestamp("00:00:00,000").unwrap(), 0.0);
        assert_eq!(parse_srt_timestamp("01:01:01,500").unwrap(), 3661.5);
        assert_eq!(parse_srt_timestamp(" 00:02:03.250 ").unwrap(), 123.25);
        assert!(parse_srt_timestamp("00:00").is_err());
        assert!(parse_srt_timestamp("aa:00:00,000").is_err());
    }

    #[test]
    fn test_srt_timestamp() {
        assert_eq!(format_srt_timestamp(0.0), "00:00:00,000");
        assert_eq!(format_srt_timestamp(61.5), "00:01:01,500");
        assert_eq!(format_srt_timestamp(3661.123), "01:01:01,123");
    }
}
