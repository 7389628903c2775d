//! Time window for historical queries.

use thiserror::Error;

/// Errors constructing a [`HistoryWindow`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WindowError {
    /// The start of the window lies after its end.
    #[error("window start {start_ts} is after end {end_ts}")]
    Inverted {
        /// Requested start (epoch ms).
        start_ts: i64,
        /// Requested end (epoch ms).
        end_ts: i64,
    },
}

/// An inclusive `[start_ts, end_ts]` range in epoch milliseconds.
///
/// The constructor guarantees `start_ts <= end_ts`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct HistoryWindow {
    start_ts: i64,
    end_ts: i64,
}

impl HistoryWindow {
    /// Create a window, rejecting inverted ranges.
    pub fn new(start_ts: i64, end_ts: i64) -> Result<Self, WindowError> {
        if start_ts > end_ts {
            return Err(WindowError::Inverted { start_ts, end_ts });
        }
        Ok(Self { start_ts, end_ts })
    }

    /// Start of the window (epoch ms, inclusive).
    pub fn start_ts(&self) -> i64 {
        self.start_ts
    }

    /// End of the window (epoch ms, inclusive).
    pub fn end_ts(&self) -> i64 {
        self.end_ts
    }

    /// Check if a timestamp falls inside the window.
    pub fn contains(&self, ts: i64) -> bool {
        (self.start_ts..=self.end_ts).contains(&ts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_rejects_inverted() {
        assert_eq!(
            HistoryWindow::new(10, 5),
            Err(WindowError::Inverted {
                start_ts: 10,
                end_ts: 5
            })
        );
    }

    #[test]
    fn test_window_single_instant() {
        let window = HistoryWindow::new(7, 7).unwrap();
        assert!(window.contains(7));
        assert!(!window.contains(8));
    }
}
