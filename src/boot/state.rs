use std::time::Duration;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

pub const UNSTARTED_TIMESTAMP: &str = "--:--:--";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BootStep {
    pub id: u32,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum BootStatus {
    Pending,
    Running,
    Ok,
    /// Representable for renderers; no transition produces it yet.
    Failed,
}

impl Default for BootStatus {
    fn default() -> Self {
        BootStatus::Pending
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootAdvance {
    Stepped(usize),
    Completed,
    /// Already completed; nothing changed.
    Finished,
}

/// Cursor over the boot script. `None` means no step has started yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BootState {
    pub cursor: Option<usize>,
    pub completed: bool,
}

impl BootState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves to the next step. Landing on the last step completes the
    /// sequence; the cursor never moves past it or backwards.
    ///
    /// The last step goes straight from pending to ok, with no running frame.
    pub fn advance(&mut self, step_count: usize) -> BootAdvance {
        if self.completed {
            return BootAdvance::Finished;
        }
        let Some(last) = step_count.checked_sub(1) else {
            self.completed = true;
            return BootAdvance::Completed;
        };

        let next = self.cursor.map_or(0, |cursor| cursor + 1).min(last);
        self.cursor = Some(next);
        if next == last {
            self.completed = true;
            BootAdvance::Completed
        } else {
            BootAdvance::Stepped(next)
        }
    }

    pub fn status_of(&self, index: usize) -> BootStatus {
        match self.cursor {
            Some(cursor) if index < cursor => BootStatus::Ok,
            Some(cursor) if index == cursor => {
                if self.completed {
                    BootStatus::Ok
                } else {
                    BootStatus::Running
                }
            }
            _ => BootStatus::Pending,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RenderedBootStep {
    pub step: BootStep,
    pub status: BootStatus,
    pub timestamp: String,
}

/// Projects the boot script into its display rows.
pub fn render_boot_steps(
    steps: &[BootStep],
    state: &BootState,
    boot_started_at: DateTime<Local>,
    interval: Duration,
) -> Vec<RenderedBootStep> {
    steps
        .iter()
        .enumerate()
        .map(|(index, step)| {
            let timestamp = match state.cursor {
                Some(cursor) if index <= cursor => {
                    let offset = interval * index.min(cursor) as u32;
                    let at = boot_started_at
                        + chrono::Duration::from_std(offset).unwrap_or_else(|_| chrono::Duration::zero());
                    at.format("%H:%M:%S").to_string()
                }
                _ => UNSTARTED_TIMESTAMP.to_string(),
            };

            RenderedBootStep {
                step: step.clone(),
                status: state.status_of(index),
                timestamp,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn steps(n: u32) -> Vec<BootStep> {
        (1..=n)
            .map(|id| BootStep {
                id,
                label: format!("step {id}"),
                detail: None,
            })
            .collect()
    }

    fn start() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn advance_walks_every_step_then_completes() {
        let mut state = BootState::new();
        assert_eq!(state.cursor, None);

        assert_eq!(state.advance(3), BootAdvance::Stepped(0));
        assert_eq!(state.advance(3), BootAdvance::Stepped(1));
        assert!(!state.completed);
        assert_eq!(state.status_of(1), BootStatus::Running);

        assert_eq!(state.advance(3), BootAdvance::Completed);
        assert!(state.completed);
        assert_eq!(state.cursor, Some(2));

        assert_eq!(state.advance(3), BootAdvance::Finished);
        assert_eq!(state.cursor, Some(2));
    }

    #[test]
    fn exactly_one_running_step_while_booting() {
        let mut state = BootState::new();
        for k in 0..3 {
            state.advance(4);
            let statuses: Vec<_> = (0..4).map(|i| state.status_of(i)).collect();
            let running = statuses.iter().filter(|s| **s == BootStatus::Running).count();
            assert_eq!(running, 1);
            assert_eq!(statuses[k], BootStatus::Running);
            assert!(statuses[..k].iter().all(|s| *s == BootStatus::Ok));
            assert!(statuses[k + 1..].iter().all(|s| *s == BootStatus::Pending));
        }

        assert_eq!(state.advance(4), BootAdvance::Completed);
        assert!((0..4).all(|i| state.status_of(i) == BootStatus::Ok));
    }

    #[test]
    fn empty_script_completes_on_first_tick() {
        let mut state = BootState::new();
        assert_eq!(state.advance(0), BootAdvance::Completed);
        assert_eq!(state.cursor, None);
    }

    #[test]
    fn completed_boot_renders_all_ok() {
        let mut state = BootState::new();
        for _ in 0..2 {
            state.advance(2);
        }
        let rows = render_boot_steps(&steps(2), &state, start(), Duration::from_millis(600));
        assert!(rows.iter().all(|row| row.status == BootStatus::Ok));
    }

    #[test]
    fn unstarted_boot_renders_placeholders() {
        let rows = render_boot_steps(
            &steps(3),
            &BootState::new(),
            start(),
            Duration::from_millis(600),
        );
        assert!(rows.iter().all(|row| row.timestamp == UNSTARTED_TIMESTAMP));
        assert!(rows.iter().all(|row| row.status == BootStatus::Pending));
    }

    #[test]
    fn timestamps_offset_by_step_interval() {
        let state = BootState {
            cursor: Some(2),
            completed: false,
        };
        let rows = render_boot_steps(&steps(4), &state, start(), Duration::from_secs(1));
        let stamps: Vec<_> = rows.iter().map(|row| row.timestamp.as_str()).collect();
        assert_eq!(stamps, ["09:00:00", "09:00:01", "09:00:02", "--:--:--"]);
    }

    #[test]
    fn failed_status_serializes() {
        assert_eq!(
            serde_json::to_string(&BootStatus::Failed).unwrap(),
            "\"failed\""
        );
    }
}
