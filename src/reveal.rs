//! Staged reveal of an already-final structured answer.
//!
//! The answer itself never changes here. `RevealSchedule::plan` derives a
//! deterministic, timestamped event sequence from a response, and
//! `RevealPlayer` plays it against the tokio clock. Restarting a reveal just
//! means planning again: same response, same schedule.

use crate::chat::StructuredResponse;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Cadence of the character-by-character intro.
pub const CHAR_INTERVAL: Duration = Duration::from_millis(10);
/// Pause between the last intro character and the section reveal.
pub const SECTION_PAUSE: Duration = Duration::from_millis(200);
/// Offset of the related-card stage after sections appear.
pub const RELATED_DELAY: Duration = Duration::from_millis(300);
/// Offset of the follow-up suggestion stage after sections appear.
pub const SUGGESTIONS_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum RevealEvent {
    /// One more character of the intro is visible
    Char { ch: char },
    /// Detail sections become visible
    SectionsRevealed,
    /// Related-content cards fade in
    RelatedRevealed,
    /// Follow-up suggestions fade in
    SuggestionsRevealed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimedEvent {
    /// Offset from the start of playback.
    pub at: Duration,
    pub event: RevealEvent,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RevealSchedule {
    events: Vec<TimedEvent>,
}

impl RevealSchedule {
    /// Derive the reveal sequence for a response. Pure: no clock, no
    /// randomness, so replanning the same response reproduces the identical
    /// event order and timing.
    pub fn plan(response: &StructuredResponse) -> Self {
        let mut events = Vec::new();

        let mut at = Duration::ZERO;
        for ch in response.intro.chars() {
            at += CHAR_INTERVAL;
            events.push(TimedEvent {
                at,
                event: RevealEvent::Char { ch },
            });
        }

        let sections_at = at + SECTION_PAUSE;
        events.push(TimedEvent {
            at: sections_at,
            event: RevealEvent::SectionsRevealed,
        });

        if !response.related.is_empty() {
            events.push(TimedEvent {
                at: sections_at + RELATED_DELAY,
                event: RevealEvent::RelatedRevealed,
            });
        }

        if !response.suggestions.is_empty() {
            events.push(TimedEvent {
                at: sections_at + SUGGESTIONS_DELAY,
                event: RevealEvent::SuggestionsRevealed,
            });
        }

        Self { events }
    }

    pub fn events(&self) -> &[TimedEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Cancellation handle for a playback. Cloneable so the session registry can
/// keep one while the stream driver holds the player.
#[derive(Debug, Clone)]
pub struct RevealHandle {
    cancelled: Arc<AtomicBool>,
}

impl RevealHandle {
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Plays a schedule against the tokio clock. Dropping the player drops any
/// pending sleep with it, so teardown can never leave a timer behind.
pub struct RevealPlayer {
    events: std::vec::IntoIter<TimedEvent>,
    origin: Option<Instant>,
    cancelled: Arc<AtomicBool>,
}

impl RevealPlayer {
    pub fn new(schedule: RevealSchedule) -> (Self, RevealHandle) {
        let cancelled = Arc::new(AtomicBool::new(false));
        let player = Self {
            events: schedule.events.into_iter(),
            origin: None,
            cancelled: cancelled.clone(),
        };
        (player, RevealHandle { cancelled })
    }

    /// Yield the next event once its offset has elapsed. Returns `None` when
    /// the schedule is exhausted or the handle was cancelled; cancellation is
    /// terminal, so no event is ever yielded after it.
    pub async fn next_event(&mut self) -> Option<RevealEvent> {
        if self.cancelled.load(Ordering::Relaxed) {
            return None;
        }

        let timed = self.events.next()?;
        let origin = *self.origin.get_or_insert_with(Instant::now);
        tokio::time::sleep_until(origin + timed.at).await;

        if self.cancelled.load(Ordering::Relaxed) {
            return None;
        }
        Some(timed.event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fallback;

    fn sample() -> StructuredResponse {
        fallback::select("tell me about your company")
    }

    #[test]
    fn planning_is_deterministic() {
        let response = sample();
        assert_eq!(RevealSchedule::plan(&response), RevealSchedule::plan(&response));
    }

    #[test]
    fn schedule_is_ordered_and_staged() {
        let schedule = RevealSchedule::plan(&sample());

        let mut last = Duration::ZERO;
        for timed in schedule.events() {
            assert!(timed.at >= last);
            last = timed.at;
        }

        let stages: Vec<_> = schedule
            .events()
            .iter()
            .filter(|t| !matches!(t.event, RevealEvent::Char { .. }))
            .map(|t| t.event.clone())
            .collect();
        assert_eq!(
            stages,
            vec![
                RevealEvent::SectionsRevealed,
                RevealEvent::RelatedRevealed,
                RevealEvent::SuggestionsRevealed,
            ]
        );
    }

    #[test]
    fn empty_groups_emit_no_stage_events() {
        let response = StructuredResponse {
            intro: "Hi".to_string(),
            sections: vec![],
            related: vec![],
            suggestions: vec![],
        };
        let schedule = RevealSchedule::plan(&response);
        assert_eq!(schedule.len(), 3); // two chars + sections marker
        assert_eq!(
            schedule.events().last().unwrap().event,
            RevealEvent::SectionsRevealed
        );
    }

    #[tokio::test(start_paused = true)]
    async fn playback_emits_the_full_intro_exactly_once() {
        let response = sample();
        let (mut player, _handle) = RevealPlayer::new(RevealSchedule::plan(&response));

        let mut intro = String::new();
        let mut sections_markers = 0;
        while let Some(event) = player.next_event().await {
            match event {
                RevealEvent::Char { ch } => intro.push(ch),
                RevealEvent::SectionsRevealed => sections_markers += 1,
                _ => {}
            }
        }

        assert_eq!(intro, response.intro);
        assert_eq!(sections_markers, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_stops_playback_immediately() {
        let (mut player, handle) = RevealPlayer::new(RevealSchedule::plan(&sample()));

        for _ in 0..5 {
            assert!(player.next_event().await.is_some());
        }

        handle.cancel();
        assert_eq!(player.next_event().await, None);
        assert_eq!(player.next_event().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn events_arrive_at_their_planned_offsets() {
        let response = StructuredResponse {
            intro: "ab".to_string(),
            sections: vec![],
            related: vec![],
            suggestions: vec![],
        };
        let (mut player, _handle) = RevealPlayer::new(RevealSchedule::plan(&response));

        let start = Instant::now();
        player.next_event().await;
        player.next_event().await;
        assert_eq!(start.elapsed(), CHAR_INTERVAL * 2);

        player.next_event().await;
        assert_eq!(start.elapsed(), CHAR_INTERVAL * 2 + SECTION_PAUSE);
    }
}
