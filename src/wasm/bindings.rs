//! JavaScript bindings for the tracker
//!
//! The page gets exactly one tracker, held in a thread-local slot. This is
//! the only global in the crate: browser callbacks (DOM listeners, timers,
//! fetch completions) have no other way back to the engine. Every exported
//! function is non-throwing; failures are dropped and only logged in debug
//! mode.

use super::host::{collect_page_context, current_visibility, BrowserScheduler, BrowserTransport};
use super::utils::{init_panic_hook, js_error, now_ms, set_debug};
use crate::activity::{Visibility, ACTIVITY_EVENTS};
use crate::config::{ScriptParams, TrackerConfig};
use crate::debug_log;
use crate::engine::Tracker;
use gloo_timers::callback::Timeout;
use std::cell::{Cell, RefCell};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{AddEventListenerOptions, Document, Event, HtmlScriptElement};

type BrowserTracker = Tracker<BrowserScheduler, BrowserTransport>;

thread_local! {
    static TRACKER: RefCell<Option<BrowserTracker>> = const { RefCell::new(None) };
    static INITIALIZED: Cell<bool> = const { Cell::new(false) };
}

/// Run `f` against the page's tracker. `None` when tracking is disabled or
/// the slot is busy.
pub(crate) fn with_tracker<R>(f: impl FnOnce(&mut BrowserTracker) -> R) -> Option<R> {
    TRACKER.with(|slot| {
        let mut slot = slot.try_borrow_mut().ok()?;
        slot.as_mut().map(f)
    })
}

#[wasm_bindgen(start)]
fn auto_start() {
    init();
}

/// Configure and start tracking. Safe to call more than once.
#[wasm_bindgen]
pub fn init() {
    if INITIALIZED.with(|flag| flag.replace(true)) {
        return;
    }
    init_panic_hook();

    let Some(window) = web_sys::window() else {
        return;
    };
    let Some(document) = window.document() else {
        return;
    };

    let params = discover_script_params(&document).unwrap_or_default();
    set_debug(params.debug);

    let hostname = window.location().hostname().unwrap_or_default();
    let config = match TrackerConfig::from_script(&params, &hostname) {
        Ok(config) => config,
        Err(e) => {
            debug_log!("tracking disabled: {}", e);
            return;
        }
    };

    let tracker = Tracker::new(
        config,
        collect_page_context(),
        current_visibility(),
        now_ms(),
        BrowserScheduler::new(),
        BrowserTransport::default(),
    );
    TRACKER.with(|slot| *slot.borrow_mut() = Some(tracker));

    if document.ready_state() == "loading" {
        let on_ready = Closure::once_into_js(boot);
        if let Err(e) = document.add_event_listener_with_callback("DOMContentLoaded", on_ready.unchecked_ref()) {
            debug_log!("DOMContentLoaded listener failed: {}", js_error(e));
        }
    } else {
        Timeout::new(0, boot).forget();
    }
}

/// Emit a custom event. `properties` is any JSON-serializable value.
#[wasm_bindgen]
pub fn track(name: JsValue, properties: JsValue) {
    let Some(name) = name.as_string() else {
        return;
    };

    let properties_json = if properties.is_falsy() {
        "{}".to_string()
    } else {
        match js_sys::JSON::stringify(&properties).ok().and_then(|s| s.as_string()) {
            Some(json) => json,
            None => {
                debug_log!("event '{}' dropped: properties not serializable", name);
                return;
            }
        }
    };

    with_tracker(|tracker| {
        tracker.set_page_context(collect_page_context());
        if let Err(e) = tracker.track_json(&name, properties_json) {
            debug_log!("event '{}' dropped: {}", name, e);
        }
    });
}

/// Alias of `track`
#[wasm_bindgen(js_name = event)]
pub fn event(name: JsValue, properties: JsValue) {
    track(name, properties);
}

#[wasm_bindgen(js_name = getSessionId)]
pub fn get_session_id() -> Option<String> {
    with_tracker(|tracker| tracker.session_id().to_string())
}

#[wasm_bindgen]
pub fn version() -> String {
    crate::VERSION.to_string()
}

fn discover_script_params(document: &Document) -> Option<ScriptParams> {
    let current = document
        .current_script()
        .and_then(|el| el.dyn_into::<HtmlScriptElement>().ok())
        .map(|script| script.src());

    let scripts = document.get_elements_by_tag_name("script");
    let srcs: Vec<String> = (0..scripts.length())
        .filter_map(|i| scripts.item(i))
        .filter_map(|el| el.dyn_into::<HtmlScriptElement>().ok())
        .map(|script| script.src())
        .filter(|src| !src.is_empty())
        .collect();

    ScriptParams::discover(current.as_deref(), srcs.iter().map(String::as_str))
}

/// Send the page view, start timers and attach DOM listeners
fn boot() {
    let started = with_tracker(|tracker| {
        tracker.set_page_context(collect_page_context());
        tracker.start()
    });
    if started.flatten().is_none() {
        return;
    }

    if let Err(e) = attach_listeners() {
        debug_log!("listener setup failed: {}", js_error(e));
    }
}

fn attach_listeners() -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let document = window.document().ok_or_else(|| JsValue::from_str("no document"))?;

    let passive = AddEventListenerOptions::new();
    passive.set_passive(true);

    let on_activity = Closure::<dyn FnMut(Event)>::new(|_: Event| {
        with_tracker(|tracker| tracker.on_activity(now_ms()));
    });
    for name in ACTIVITY_EVENTS {
        document.add_event_listener_with_callback_and_add_event_listener_options(
            name,
            on_activity.as_ref().unchecked_ref(),
            &passive,
        )?;
    }
    on_activity.forget();

    let on_visibility = Closure::<dyn FnMut(Event)>::new(|_: Event| {
        let visibility = current_visibility();
        with_tracker(|tracker| {
            if visibility == Visibility::Visible {
                tracker.set_page_context(collect_page_context());
            }
            tracker.on_visibility_change(visibility, now_ms())
        });
    });
    document.add_event_listener_with_callback_and_add_event_listener_options(
        "visibilitychange",
        on_visibility.as_ref().unchecked_ref(),
        &passive,
    )?;
    on_visibility.forget();

    // beforeunload and pagehide can both fire; the tracker latches teardown
    let on_leave = Closure::<dyn FnMut(Event)>::new(|_: Event| {
        with_tracker(|tracker| {
            tracker.set_page_context(collect_page_context());
            tracker.teardown(now_ms())
        });
    });
    window.add_event_listener_with_callback_and_bool("beforeunload", on_leave.as_ref().unchecked_ref(), true)?;
    window.add_event_listener_with_callback_and_add_event_listener_options(
        "pagehide",
        on_leave.as_ref().unchecked_ref(),
        &passive,
    )?;
    on_leave.forget();

    Ok(())
}
