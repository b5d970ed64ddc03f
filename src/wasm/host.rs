//! Browser implementations of the engine seams
//!
//! `BrowserScheduler` maps tasks onto `gloo_timers` timeouts and intervals,
//! `BrowserTransport` onto `navigator.sendBeacon` and `fetch`. Callbacks
//! re-enter the engine through the single tracker slot in `bindings`.

use super::bindings::with_tracker;
use super::utils::{js_error, now_ms};
use crate::activity::Visibility;
use crate::delivery::{PostRequest, RequestId, ResponseOutcome, Transport};
use crate::error::{Result, TrackError};
use crate::page::PageContext;
use crate::scheduler::{Scheduler, TimerId, TimerTask};
use crate::Millis;
use gloo_timers::callback::{Interval, Timeout};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Headers, RequestInit, Response, VisibilityState};

// Held only for their drop, which clears the browser timer
#[allow(dead_code)]
enum TimerHandle {
    Timeout(Timeout),
    Interval(Interval),
}

/// Scheduler over `gloo_timers` callbacks; dropping a handle clears the timer
#[derive(Default)]
pub struct BrowserScheduler {
    next_id: u64,
    handles: HashMap<TimerId, TimerHandle>,
    // Timeouts that already ran, pruned outside their own callback
    fired: Rc<RefCell<Vec<TimerId>>>,
}

impl std::fmt::Debug for BrowserScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrowserScheduler")
            .field("next_id", &self.next_id)
            .field("pending", &self.handles.len())
            .finish()
    }
}

impl BrowserScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self) -> TimerId {
        for id in self.fired.borrow_mut().drain(..) {
            self.handles.remove(&id);
        }
        self.next_id += 1;
        TimerId(self.next_id)
    }
}

fn clamp_delay(delay: Millis) -> u32 {
    u32::try_from(delay).unwrap_or(u32::MAX)
}

fn fire(task: TimerTask) {
    with_tracker(|tracker| {
        tracker.set_page_context(collect_page_context());
        tracker.on_timer(task, now_ms());
    });
}

impl Scheduler for BrowserScheduler {
    fn schedule_after(&mut self, delay_ms: Millis, task: TimerTask) -> TimerId {
        let id = self.allocate();
        let fired = Rc::clone(&self.fired);
        let timeout = Timeout::new(clamp_delay(delay_ms), move || {
            fire(task);
            fired.borrow_mut().push(id);
        });
        self.handles.insert(id, TimerHandle::Timeout(timeout));
        id
    }

    fn schedule_repeating(&mut self, interval_ms: Millis, task: TimerTask) -> TimerId {
        let id = self.allocate();
        let interval = Interval::new(clamp_delay(interval_ms), move || fire(task.clone()));
        self.handles.insert(id, TimerHandle::Interval(interval));
        id
    }

    fn cancel(&mut self, id: TimerId) {
        self.handles.remove(&id);
    }
}

/// `sendBeacon` + `fetch` transport
#[derive(Debug, Default)]
pub struct BrowserTransport {
    next_id: u64,
}

impl Transport for BrowserTransport {
    fn send_beacon(&mut self, endpoint: &str, body: &str) -> Result<bool> {
        let window = web_sys::window().ok_or_else(|| TrackError::Environment("no window".into()))?;

        // A string body goes out as text/plain, which avoids a preflight
        window
            .navigator()
            .send_beacon_with_opt_str(endpoint, Some(body))
            .map_err(|e| TrackError::Environment(js_error(e)))
    }

    fn post(&mut self, request: PostRequest) -> Result<RequestId> {
        let window = web_sys::window().ok_or_else(|| TrackError::Environment("no window".into()))?;

        let headers = Headers::new().map_err(|e| TrackError::Transport(js_error(e)))?;
        headers
            .set("Content-Type", request.content_type)
            .map_err(|e| TrackError::Transport(js_error(e)))?;

        let init = RequestInit::new();
        init.set_method("POST");
        init.set_headers(headers.as_ref());
        init.set_body(&JsValue::from_str(&request.body));
        init.set_keepalive(request.keepalive);

        let promise = window.fetch_with_str_and_init(&request.endpoint, &init);

        self.next_id += 1;
        let id = RequestId(self.next_id);

        wasm_bindgen_futures::spawn_local(async move {
            let outcome = match JsFuture::from(promise).await {
                Ok(value) => match value.dyn_into::<Response>() {
                    Ok(response) => ResponseOutcome::Status(response.status()),
                    Err(_) => ResponseOutcome::NetworkError("fetch resolved to a non-Response".into()),
                },
                Err(e) => ResponseOutcome::NetworkError(js_error(e)),
            };
            with_tracker(|tracker| tracker.on_response(id, outcome));
        });

        Ok(id)
    }
}

/// Snapshot the page for outbound events
pub fn collect_page_context() -> PageContext {
    let Some(window) = web_sys::window() else {
        return PageContext::new("", "", None, None);
    };

    let href = window.location().href().unwrap_or_default();
    let referrer = window.document().map(|d| d.referrer()).unwrap_or_default();
    let user_agent = window.navigator().user_agent().ok();
    let screen = window.screen().ok().and_then(|screen| {
        let width = u32::try_from(screen.width().ok()?).ok()?;
        let height = u32::try_from(screen.height().ok()?).ok()?;
        Some((width, height))
    });

    PageContext::new(&href, &referrer, user_agent.as_deref(), screen)
}

/// Current `document.visibilityState`; a missing document counts as hidden
pub fn current_visibility() -> Visibility {
    match web_sys::window().and_then(|w| w.document()).map(|d| d.visibility_state()) {
        Some(VisibilityState::Visible) => Visibility::Visible,
        _ => Visibility::Hidden,
    }
}
