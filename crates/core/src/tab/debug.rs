use std::collections::VecDeque;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// Maximum number of lines kept in the trail.
pub const DEBUG_TRAIL_CAPACITY: usize = 20;

/// Timestamped diagnostic lines, most recent first.
///
/// Serialized as a plain JSON array of strings so it can be mirrored into tab
/// storage and survive the redirect round trip.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DebugTrail {
    lines: VecDeque<String>,
}

impl DebugTrail {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore a trail from storage. Unreadable input yields an empty trail.
    pub fn from_json(raw: &str) -> Self {
        let mut trail: Self = serde_json::from_str(raw).unwrap_or_default();
        trail.lines.truncate(DEBUG_TRAIL_CAPACITY);
        trail
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "[]".to_string())
    }

    /// Prepend `"{HH:MM:SS} - {message}"`, dropping the oldest line past capacity.
    pub fn push(&mut self, at: NaiveTime, message: impl AsRef<str>) {
        self.lines
            .push_front(format!("{} - {}", at.format("%H:%M:%S"), message.as_ref()));
        self.lines.truncate(DEBUG_TRAIL_CAPACITY);
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: u32) -> NaiveTime {
        NaiveTime::from_num_seconds_from_midnight_opt(secs, 0).unwrap()
    }

    #[test]
    fn push_prepends_formatted_line() {
        let mut trail = DebugTrail::new();
        trail.push(at(3600 + 2 * 60 + 3), "Page loaded");
        trail.push(at(3600 + 2 * 60 + 4), "Google button clicked");

        let lines: Vec<&str> = trail.lines().collect();
        assert_eq!(
            lines,
            vec![
                "01:02:04 - Google button clicked",
                "01:02:03 - Page loaded"
            ]
        );
    }

    #[test]
    fn never_exceeds_capacity() {
        let mut trail = DebugTrail::new();
        for i in 0..45 {
            trail.push(at(i), format!("line {i}"));
        }

        assert_eq!(trail.len(), DEBUG_TRAIL_CAPACITY);
        assert_eq!(trail.lines().next(), Some("00:00:44 - line 44"));
        assert_eq!(trail.lines().last(), Some("00:00:25 - line 25"));
    }

    #[test]
    fn order_survives_storage_round_trip() {
        let mut trail = DebugTrail::new();
        trail.push(at(1), "first");
        trail.push(at(2), "second");

        let restored = DebugTrail::from_json(&trail.to_json());
        assert_eq!(restored, trail);
        assert_eq!(restored.lines().next(), Some("00:00:02 - second"));
    }

    #[test]
    fn unreadable_json_is_empty() {
        assert!(DebugTrail::from_json("{not json").is_empty());
        assert!(DebugTrail::from_json("").is_empty());
    }

    #[test]
    fn oversized_stored_trail_is_truncated() {
        let raw = serde_json::to_string(&(0..30).map(|i| i.to_string()).collect::<Vec<_>>())
            .unwrap();
        let trail = DebugTrail::from_json(&raw);
        assert_eq!(trail.len(), DEBUG_TRAIL_CAPACITY);
        assert_eq!(trail.lines().next(), Some("0"));
    }
}
