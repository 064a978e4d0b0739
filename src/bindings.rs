//! Low‐level wasm-bindgen bindings to the Khalti checkout SDK and the async
//! Clipboard API.
//!
//! Higher-level wrappers live in `client.rs` (widget) and `dom.rs` (clipboard).

use wasm_bindgen::prelude::*;
use web_sys::js_sys::Promise;

#[wasm_bindgen]
extern "C" {
    //------------------------------------------------------------------------------
    // Khalti checkout widget
    //------------------------------------------------------------------------------

    /// Raw `KhaltiCheckout` handle.
    #[wasm_bindgen(js_name = KhaltiCheckout)]
    #[derive(Debug, Clone)]
    pub type JsKhaltiCheckout;

    /// `new KhaltiCheckout(config)`
    ///
    /// ```js
    ///   const checkout = new KhaltiCheckout({ publicKey, productIdentity, ..., eventHandler });
    /// ```
    #[wasm_bindgen(constructor, catch, js_class = "KhaltiCheckout")]
    pub fn new(config: &JsValue) -> Result<JsKhaltiCheckout, JsValue>;

    /// `checkout.show({ amount })`, amount in paisa.
    #[wasm_bindgen(method, catch, js_name = show)]
    pub fn show(this: &JsKhaltiCheckout, options: &JsValue) -> Result<(), JsValue>;

    //------------------------------------------------------------------------------
    // Clipboard
    //------------------------------------------------------------------------------

    /// `navigator.clipboard.writeText(text)` → JS `Promise`
    ///
    /// Throws synchronously when `navigator.clipboard` is missing
    /// (insecure context), which surfaces as `Err`.
    #[wasm_bindgen(catch, js_namespace = ["navigator", "clipboard"], js_name = writeText)]
    pub fn clipboard_write_text(text: &str) -> Result<Promise, JsValue>;
}
