//! khalti_interop.rs
//!
//! Custom Yew hook to load the Khalti checkout SDK at runtime (no inline JS).
//!
//! # Overview
//! This hook, `use_khaltijs()`, injects a single
//! `<script id="khalti-checkout-sdk" src="..." defer>`
//! into `<head>` on first use, returns `false` until the
//! script’s `load` event fires, then returns `true`
//! on every subsequent call.
//!
//! # Usage
//! ```rust,ignore
//! use yew::prelude::*;
//! use yew_khalti::use_khaltijs;
//!
//! #[function_component(App)]
//! fn app() -> Html {
//!     let khalti_ready = use_khaltijs();
//!     html! {
//!         if khalti_ready {
//!             <p>{"Khalti loaded"}</p>
//!         } else {
//!             <p>{"Loading Khalti..."}</p>
//!         }
//!     }
//! }
//! ```

use wasm_bindgen::{prelude::Closure, JsCast, JsValue};
use web_sys::js_sys::Reflect;
use web_sys::HtmlScriptElement;
use yew::functional::hook;
use yew::prelude::*;

/// Where the SDK is served from.
pub const KHALTI_SDK_URL: &str =
    "https://khalti.s3.ap-south-1.amazonaws.com/KPG/dist/2020.12.17.0.0.0/khalti-checkout.iffe.js";
const SCRIPT_ID: &str = "khalti-checkout-sdk";

/// `true` once `window.KhaltiCheckout` exists.
pub fn khalti_loaded() -> bool {
    web_sys::window()
        .and_then(|win| Reflect::has(&win, &JsValue::from_str("KhaltiCheckout")).ok())
        .unwrap_or(false)
}

/// Custom hook: load the Khalti SDK exactly once and track readiness.
///
/// # Returns
/// - `false` while the `<script>` is being fetched & parsed.
/// - `true` once `window.KhaltiCheckout` exists.
#[hook]
pub fn use_khaltijs() -> bool {
    let loaded = use_state(khalti_loaded);

    {
        let loaded = loaded.clone();
        use_effect_with((), move |_| {
            if !*loaded {
                if let Err(e) = inject_script(loaded) {
                    log::error!(
                        "Could not load Khalti SDK: {}",
                        crate::error::js_error_message(&e)
                    );
                }
            }
            || ()
        });
    }

    *loaded
}

fn inject_script(loaded: UseStateHandle<bool>) -> Result<(), JsValue> {
    let document = crate::dom::document().ok_or_else(|| JsValue::from_str("no document"))?;

    if let Some(existing) = document.get_element_by_id(SCRIPT_ID) {
        if khalti_loaded() {
            loaded.set(true);
            return Ok(());
        }
        // Another component inserted it and it is still loading.
        let on_load = Closure::wrap(Box::new(move || {
            loaded.set(true);
        }) as Box<dyn Fn()>);
        existing.add_event_listener_with_callback("load", on_load.as_ref().unchecked_ref())?;
        on_load.forget();
        return Ok(());
    }

    let script: HtmlScriptElement = document.create_element("script")?.dyn_into()?;
    script.set_id(SCRIPT_ID);
    script.set_src(KHALTI_SDK_URL);
    script.set_defer(true);

    let onload_closure = Closure::wrap(Box::new(move || {
        loaded.set(true);
    }) as Box<dyn Fn()>);
    script.set_onload(Some(onload_closure.as_ref().unchecked_ref()));
    onload_closure.forget(); // Leak so it lives until load event

    document
        .head()
        .ok_or_else(|| JsValue::from_str("head missing"))?
        .append_child(&script)?;
    Ok(())
}
