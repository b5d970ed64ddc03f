//! WASM utility functions

use crate::Millis;
use std::cell::Cell;
use wasm_bindgen::prelude::*;

thread_local! {
    static DEBUG: Cell<bool> = const { Cell::new(false) };
}

/// Initialize panic hook for better error messages in browser
#[wasm_bindgen]
pub fn init_panic_hook() {
    #[cfg(feature = "wasm")]
    console_error_panic_hook::set_once();
}

/// Log a message to the browser console
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = console)]
    pub fn log(s: &str);
}

/// Macro for console.log from Rust
#[macro_export]
macro_rules! console_log {
    ($($t:tt)*) => {
        $crate::wasm::utils::log(&format_args!($($t)*).to_string())
    }
}

/// console.log only when the script reference asked for `debug=1`
#[macro_export]
macro_rules! debug_log {
    ($($t:tt)*) => {
        if $crate::wasm::utils::debug_enabled() {
            $crate::console_log!("[phantom] {}", format_args!($($t)*));
        }
    }
}

pub fn set_debug(enabled: bool) {
    DEBUG.with(|d| d.set(enabled));
}

pub fn debug_enabled() -> bool {
    DEBUG.with(|d| d.get())
}

/// Wall-clock time in milliseconds
pub fn now_ms() -> Millis {
    js_sys::Date::now() as Millis
}

/// Render a thrown JS value for logs and errors
pub fn js_error(value: JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}
