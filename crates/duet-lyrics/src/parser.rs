//! Parser for `[mm:ss.xx]text` timestamped lyrics.

use crate::LyricLine;
use tracing::trace;

/// Parse line-oriented timestamp markup into lyric lines.
///
/// Lines without a leading `[mm:ss.xx]` stamp are dropped. A stamp followed by
/// no text still yields a row. Source order is preserved.
pub fn parse_lrc(text: &str) -> Vec<LyricLine> {
    let mut lines = Vec::new();

    for raw in text.lines() {
        match parse_line(raw) {
            Some(line) => lines.push(line),
            None => trace!("Skipping unstamped lyric line: {raw:?}"),
        }
    }

    lines
}

fn parse_line(raw: &str) -> Option<LyricLine> {
    let rest = raw.strip_prefix('[')?;
    let (stamp, text) = rest.split_once(']')?;
    let time = parse_stamp(stamp)?;

    Some(LyricLine::new(time, text.trim()))
}

/// Parse `mm:ss.fff` into seconds. The fraction is required, may have one to
/// three digits and is normalized to milliseconds. Stamps whose whole seconds
/// overflow are rejected.
fn parse_stamp(stamp: &str) -> Option<f64> {
    let (minutes, rest) = stamp.split_once(':')?;
    let (seconds, fraction) = rest.split_once('.')?;

    let minutes = parse_digits(minutes)?;
    let seconds = parse_digits(seconds)?;
    let millis = parse_fraction(fraction)?;
    let whole = minutes.checked_mul(60)?.checked_add(seconds)?;

    #[allow(clippy::cast_precision_loss)]
    let time = whole as f64 + millis as f64 / 1000.0;
    Some(time)
}

fn parse_digits(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

fn parse_fraction(s: &str) -> Option<u64> {
    if s.is_empty() || s.len() > 3 {
        return None;
    }
    let padded = format!("{s:0<3}");
    parse_digits(&padded)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn times(lines: &[LyricLine]) -> Vec<f64> {
        lines.iter().map(|l| l.time).collect()
    }

    #[test]
    fn test_parse_mixed_input() {
        let lines = parse_lrc("[00:10.00] line one\n[00:15.5]line two\ngarbage\n[01:00.000]last");
        assert_eq!(lines.len(), 3);
        assert_eq!(times(&lines), vec![10.0, 15.5, 60.0]);
        assert_eq!(lines[0].text, "line one");
        assert_eq!(lines[1].text, "line two");
        assert_eq!(lines[2].text, "last");
    }

    #[test]
    fn test_empty_text_kept_as_row() {
        let lines = parse_lrc("[00:00.00]\n[00:04.20]  \n[00:05.10]Hello");
        assert_eq!(lines.len(), 3);
        assert!(lines[0].text.is_empty());
        assert!(lines[1].text.is_empty());
    }

    #[test]
    fn test_fraction_normalized_to_millis() {
        let lines = parse_lrc("[02:03.45]a\n[02:03.456]b\n[00:07.5]c");
        assert!((lines[0].time - 123.45).abs() < 1e-9);
        assert!((lines[1].time - 123.456).abs() < 1e-9);
        assert!((lines[2].time - 7.5).abs() < 1e-9);
    }

    #[test]
    fn test_rejects_malformed_stamps() {
        let input = concat!(
            "[ar:Some Artist]\n[00:-1.00]neg\n[00:01.1234]too precise\n",
            "[0a:01.00]x\nno bracket [00:01.00]\n[00:07]no fraction\n[00:07.]empty fraction",
        );
        assert!(parse_lrc(input).is_empty());
    }

    #[test]
    fn test_overflowing_minutes_are_skipped() {
        let lines =
            parse_lrc("[307445734561825862:00.00]x\n[99999999999999999999:00.00]y\n[00:01.00]ok");
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "ok");
        assert!((lines[0].time - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_source_order_preserved() {
        let lines = parse_lrc("[00:20.00]b\n[00:10.00]a\r\n[00:10.00]a2");
        assert_eq!(times(&lines), vec![20.0, 10.0, 10.0]);
        assert_eq!(lines[2].text, "a2");
    }
}
