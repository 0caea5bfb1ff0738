//! Candidate time slot parsing for the creation dialog.

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use convene_types::error::DialogError;

/// Accepted input format for a candidate time, e.g. `2025-11-10 15:00`.
pub const SLOT_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Parse newline-delimited candidate times into (start, end) pairs.
///
/// Blank lines are ignored. Each slot gets a fixed one-hour duration. Any
/// malformed line fails the whole input so the dialog can re-prompt with the
/// offending text; zero usable lines fails with `NoTimeSlots`.
pub fn parse_time_slots(text: &str) -> Result<Vec<(DateTime<Utc>, DateTime<Utc>)>, DialogError> {
    let mut slots = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let start = NaiveDateTime::parse_from_str(line, SLOT_FORMAT)
            .map_err(|_| DialogError::InvalidTimeSlot {
                line: line.to_string(),
                reason: "expected YYYY-MM-DD HH:MM".to_string(),
            })?
            .and_utc();
        slots.push((start, start + Duration::hours(1)));
    }

    if slots.is_empty() {
        return Err(DialogError::NoTimeSlots);
    }
    Ok(slots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_parses_multiple_lines_with_blanks() {
        let slots = parse_time_slots("2025-11-10 15:00\n\n  2025-11-11 14:30  \n").unwrap();
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0].0.hour(), 15);
        assert_eq!(slots[1].0.minute(), 30);
        for (start, end) in slots {
            assert_eq!(end - start, Duration::hours(1));
        }
    }

    #[test]
    fn test_rejects_malformed_line() {
        let err = parse_time_slots("2025-11-10 15:00\nnext tuesday").unwrap_err();
        match err {
            DialogError::InvalidTimeSlot { line, .. } => assert_eq!(line, "next tuesday"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_rejects_empty_input() {
        assert!(matches!(
            parse_time_slots("\n  \n"),
            Err(DialogError::NoTimeSlots)
        ));
    }
}
