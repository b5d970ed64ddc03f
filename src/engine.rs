//! The tracking engine
//!
//! [`Tracker`] is the one instance that owns every piece of mutable state for
//! a page load: session identity, presence, visibility, timers and in-flight
//! requests. The host feeds it discrete signals (interaction, visibility
//! change, timer firing, network response, teardown) and each handler runs to
//! completion before the next, so no locking is involved.
//!
//! # Example
//!
//! ```rust
//! use phantom_track::{ManualScheduler, PageContext, Tracker, TrackerConfig, Visibility};
//! # use phantom_track::{PostRequest, RequestId, Transport};
//! # #[derive(Default)]
//! # struct NullTransport(u64);
//! # impl Transport for NullTransport {
//! #     fn send_beacon(&mut self, _: &str, _: &str) -> phantom_track::Result<bool> { Ok(true) }
//! #     fn post(&mut self, _: PostRequest) -> phantom_track::Result<RequestId> {
//! #         self.0 += 1;
//! #         Ok(RequestId(self.0))
//! #     }
//! # }
//!
//! let config = TrackerConfig::new("track_abcdefghij0123456789", "https://collector.example/track").unwrap();
//! let page = PageContext::new("https://example.com/", "", None, Some((1280, 720)));
//! let mut tracker = Tracker::new(
//!     config,
//!     page,
//!     Visibility::Visible,
//!     0,
//!     ManualScheduler::new(0),
//!     NullTransport::default(),
//! );
//!
//! tracker.start();
//! tracker.advance_to(5_000);
//! tracker.on_activity(5_000);
//! tracker.advance_to(8_000);
//! tracker.on_activity(8_000);
//! assert_eq!(tracker.presence().active_ms(), 3_000);
//! ```

use crate::activity::{InactivityTimer, PresenceChange, PresenceState, Visibility};
use crate::config::{Timing, TrackerConfig};
use crate::delivery::{
    CustomEvent, DeliveryPipeline, EventFields, EventType, RequestId, ResponseDisposition,
    ResponseOutcome, RetryAttempt, RetryPolicy, SendOutcome, Transport,
};
use crate::error::Result;
use crate::heartbeat::HeartbeatScheduler;
use crate::page::PageContext;
use crate::scheduler::{FiredTimer, ManualScheduler, Scheduler, TimerTask};
use crate::session::Session;
use crate::Millis;
use serde::Serialize;
use tracing::debug;

/// What a timer firing led to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerOutcome {
    Presence(PresenceChange),
    Sent(SendOutcome),
    /// Heartbeat suppressed because the page is hidden
    Skipped,
}

/// Sends made by the one-time teardown
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finalization {
    pub timespent: u64,
    pub pageview_end: SendOutcome,
    pub leave: SendOutcome,
}

/// Session activity and delivery engine
#[derive(Debug)]
pub struct Tracker<S: Scheduler, T: Transport> {
    session: Session,
    page: PageContext,
    timing: Timing,
    presence: PresenceState,
    visibility: Visibility,
    inactivity: InactivityTimer,
    heartbeat: HeartbeatScheduler,
    pipeline: DeliveryPipeline,
    scheduler: S,
    transport: T,
    started: bool,
    finalized: bool,
}

impl<S: Scheduler, T: Transport> Tracker<S, T> {
    /// Build the engine for one page load. `now` is the load time.
    pub fn new(
        config: TrackerConfig,
        page: PageContext,
        visibility: Visibility,
        now: Millis,
        scheduler: S,
        transport: T,
    ) -> Self {
        let timing = config.timing;

        Self {
            session: Session::new(&config, now),
            page,
            timing,
            presence: PresenceState::new(timing.inactivity_threshold_ms),
            visibility,
            inactivity: InactivityTimer::new(timing.inactivity_threshold_ms),
            heartbeat: HeartbeatScheduler::new(&timing),
            pipeline: DeliveryPipeline::new(RetryPolicy::from_timing(&timing)),
            scheduler,
            transport,
            started: false,
            finalized: false,
        }
    }

    /// Report the page view and start the timers. Returns `None` when
    /// already started.
    pub fn start(&mut self) -> Option<SendOutcome> {
        if self.started {
            return None;
        }
        self.started = true;

        let outcome = self.send(EventType::Pageview, EventFields::None);
        self.inactivity.rearm(&mut self.scheduler);
        self.heartbeat.start(&mut self.scheduler);
        self.heartbeat.schedule_initial(&mut self.scheduler);
        debug!(session_id = %self.session.session_id(), "tracker started");
        Some(outcome)
    }

    /// An interaction signal fired
    pub fn on_activity(&mut self, now: Millis) -> PresenceChange {
        let change = self.presence.record_activity(now, self.visibility);
        self.inactivity.rearm(&mut self.scheduler);
        if change == PresenceChange::BecameActive {
            debug!(now, "presence active");
        }
        change
    }

    /// `document.visibilityState` changed
    pub fn on_visibility_change(&mut self, visibility: Visibility, now: Millis) -> PresenceChange {
        match visibility {
            Visibility::Hidden => {
                // The interval up to now was still visible
                self.presence.flush(now, self.visibility);
                self.visibility = Visibility::Hidden;
                let change = InactivityTimer::expire(&mut self.presence, now, self.visibility);
                self.heartbeat.stop(&mut self.scheduler);
                debug!(now, active_ms = self.presence.active_ms(), "page hidden");
                change
            }
            Visibility::Visible => {
                self.visibility = Visibility::Visible;
                let change = self.on_activity(now);
                self.heartbeat.start(&mut self.scheduler);
                debug!(now, "page visible");
                change
            }
        }
    }

    /// A scheduled task came due
    pub fn on_timer(&mut self, task: TimerTask, now: Millis) -> TimerOutcome {
        match task {
            TimerTask::Inactivity => {
                let change = self.inactivity.on_fired(&mut self.presence, now, self.visibility);
                if change == PresenceChange::BecameInactive {
                    debug!(now, active_ms = self.presence.active_ms(), "presence inactive");
                }
                TimerOutcome::Presence(change)
            }
            TimerTask::Heartbeat | TimerTask::InitialHeartbeat => self.send_heartbeat(),
            TimerTask::Retry(attempt) => TimerOutcome::Sent(self.send_attempt(attempt)),
        }
    }

    /// A request issued by the transport completed
    pub fn on_response(&mut self, id: RequestId, outcome: ResponseOutcome) -> ResponseDisposition {
        self.pipeline.on_response(id, outcome, &mut self.scheduler)
    }

    /// One-time teardown: flush, then `pageview_end` and `leave`. Later calls
    /// return `None`.
    pub fn teardown(&mut self, now: Millis) -> Option<Finalization> {
        if self.finalized {
            return None;
        }
        self.finalized = true;

        self.presence.flush(now, self.visibility);
        let timespent = self.presence.active_seconds();
        debug!(now, timespent, "page teardown");

        let pageview_end = self.send(EventType::PageviewEnd, EventFields::PageviewEnd { timespent });
        let leave = self.send(EventType::Leave, EventFields::None);

        Some(Finalization {
            timespent,
            pageview_end,
            leave,
        })
    }

    /// Emit a custom event with a serializable property bag
    pub fn track<P: Serialize + ?Sized>(&mut self, name: &str, properties: &P) -> Result<SendOutcome> {
        let event = CustomEvent::new(name, properties)?;
        Ok(self.send(EventType::CustomEvent, event.into_fields()))
    }

    /// Emit a custom event whose properties were serialized by the host
    pub fn track_json(&mut self, name: &str, properties_json: String) -> Result<SendOutcome> {
        let event = CustomEvent::from_json(name, properties_json)?;
        Ok(self.send(EventType::CustomEvent, event.into_fields()))
    }

    /// Replace the page context used by subsequent sends
    pub fn set_page_context(&mut self, page: PageContext) {
        self.page = page;
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_id(&self) -> &str {
        self.session.session_id()
    }

    pub fn presence(&self) -> &PresenceState {
        &self.presence
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn timing(&self) -> &Timing {
        &self.timing
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn is_heartbeat_running(&self) -> bool {
        self.heartbeat.is_running()
    }

    pub fn in_flight(&self) -> usize {
        self.pipeline.in_flight()
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    fn send_heartbeat(&mut self) -> TimerOutcome {
        if !self.visibility.is_visible() {
            return TimerOutcome::Skipped;
        }
        let is_active = self.presence.is_active();
        TimerOutcome::Sent(self.send(EventType::Heartbeat, EventFields::Heartbeat { is_active }))
    }

    fn send(&mut self, event_type: EventType, fields: EventFields) -> SendOutcome {
        self.send_attempt(RetryAttempt::first(event_type, fields))
    }

    fn send_attempt(&mut self, attempt: RetryAttempt) -> SendOutcome {
        self.pipeline
            .send(&self.session, &self.page, attempt, &mut self.transport)
    }
}

impl<T: Transport> Tracker<ManualScheduler, T> {
    /// Fire every timer due up to `now` in order, then move the clock to `now`
    pub fn advance_to(&mut self, now: Millis) -> Vec<(FiredTimer, TimerOutcome)> {
        let mut fired = Vec::new();
        while let Some(timer) = self.scheduler.pop_due(now) {
            let outcome = self.on_timer(timer.task.clone(), timer.at);
            fired.push((timer, outcome));
        }
        self.scheduler.set_now(now);
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::PostRequest;

    #[derive(Debug, Default)]
    struct CountingTransport {
        posts: Vec<PostRequest>,
        beacons: usize,
    }

    impl Transport for CountingTransport {
        fn send_beacon(&mut self, _endpoint: &str, _body: &str) -> Result<bool> {
            self.beacons += 1;
            Ok(true)
        }

        fn post(&mut self, request: PostRequest) -> Result<RequestId> {
            self.posts.push(request);
            Ok(RequestId(self.posts.len() as u64))
        }
    }

    fn tracker() -> Tracker<ManualScheduler, CountingTransport> {
        let config = TrackerConfig::new("track_abcdefghij0123456789", "https://c.example/track").unwrap();
        let page = PageContext::new("https://example.com/", "", None, None);
        Tracker::new(
            config,
            page,
            Visibility::Visible,
            0,
            ManualScheduler::new(0),
            CountingTransport::default(),
        )
    }

    #[test]
    fn test_start_once() {
        let mut tracker = tracker();
        assert!(matches!(tracker.start(), Some(SendOutcome::InFlight(_))));
        assert!(tracker.start().is_none());
        assert_eq!(tracker.transport().posts.len(), 1);
        assert!(tracker.is_heartbeat_running());
        // inactivity + recurring heartbeat + initial heartbeat
        assert_eq!(tracker.scheduler().pending(), 3);
    }

    #[test]
    fn test_inactivity_expires() {
        let mut tracker = tracker();
        tracker.start();
        tracker.on_activity(0);
        tracker.advance_to(10_000);
        tracker.on_activity(10_000);

        tracker.advance_to(39_999);
        assert!(tracker.presence().is_active());
        tracker.advance_to(40_000);
        assert!(!tracker.presence().is_active());
        assert_eq!(tracker.presence().active_ms(), 10_000);
    }

    #[test]
    fn test_hidden_suppresses_heartbeat() {
        let mut tracker = tracker();
        tracker.start();
        tracker.on_visibility_change(Visibility::Hidden, 500);

        let fired = tracker.advance_to(120_000);
        assert!(fired
            .iter()
            .all(|(timer, _)| timer.task != TimerTask::Heartbeat));
        // Initial heartbeat still fires but is skipped while hidden
        assert!(fired
            .iter()
            .any(|(timer, outcome)| timer.task == TimerTask::InitialHeartbeat
                && *outcome == TimerOutcome::Skipped));
        assert_eq!(tracker.transport().posts.len(), 1);
    }

    #[test]
    fn test_visible_restarts() {
        let mut tracker = tracker();
        tracker.start();
        tracker.on_visibility_change(Visibility::Hidden, 1_500);
        assert!(!tracker.is_heartbeat_running());
        assert!(!tracker.presence().is_active());

        tracker.advance_to(60_000);
        assert_eq!(
            tracker.on_visibility_change(Visibility::Visible, 60_000),
            PresenceChange::BecameActive
        );
        assert!(tracker.is_heartbeat_running());
        assert_eq!(tracker.scheduler().next_due(), Some(90_000));
    }

    #[test]
    fn test_teardown_latch() {
        let mut tracker = tracker();
        tracker.start();
        let first = tracker.teardown(1_000).unwrap();
        assert_eq!(first.pageview_end, SendOutcome::Beaconed);
        assert_eq!(first.leave, SendOutcome::Beaconed);
        assert!(tracker.teardown(1_001).is_none());
        assert_eq!(tracker.transport().beacons, 2);
    }

    #[test]
    fn test_track_rejects_oversized() {
        let mut tracker = tracker();
        let big = serde_json::json!({ "blob": "a".repeat(20_000) });
        assert!(tracker.track("upload", &big).is_err());
        assert!(tracker.transport().posts.is_empty());

        assert!(matches!(
            tracker.track("signup", &serde_json::json!({"plan": "pro"})),
            Ok(SendOutcome::InFlight(_))
        ));
    }
}
