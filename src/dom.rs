//! Thin wrappers over the page: alerts, loading buttons, clipboard, ripple and
//! confetti effects, order-table filtering and gateway form submission.
//!
//! Every function takes the element it works on. Timers never cancel, so each
//! delayed callback checks `is_connected()` before touching its element.

use gloo_timers::callback::Timeout;
use serde::Serialize;
use wasm_bindgen::{prelude::Closure, JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::js_sys::{Function, Math, Reflect};
use web_sys::{
    Document, Element, HtmlButtonElement, HtmlElement, HtmlFormElement, HtmlInputElement,
};

use crate::bindings::clipboard_write_text;
use crate::config::CheckoutConfig;
use crate::error::{js_error_message, CheckoutError};
use crate::verify::{CheckoutUi, OrderId, OrderStatus};

const SPINNER_HTML: &str =
    "<span class=\"spinner-border spinner-border-sm me-2\"></span>Processing...";
const COPIED_LABEL: &str = "Copied!";
const COPY_ORIGINAL_KEY: &str = "copyOriginal";
const COPY_SEQ_KEY: &str = "copySeq";
const CONFETTI_COLORS: [&str; 7] = [
    "#ff6b6b", "#4ecdc4", "#45b7d1", "#96ceb4", "#feca57", "#ff9ff3", "#54a0ff",
];

/// Bootstrap contextual alert flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    Success,
    Info,
    Warning,
    Danger,
}

impl AlertKind {
    pub fn css_class(self) -> &'static str {
        match self {
            AlertKind::Success => "alert-success",
            AlertKind::Info => "alert-info",
            AlertKind::Warning => "alert-warning",
            AlertKind::Danger => "alert-danger",
        }
    }
}

pub(crate) fn document() -> Option<Document> {
    web_sys::window().and_then(|w| w.document())
}

/// First element matching `selector`, if any.
pub fn query(selector: &str) -> Option<Element> {
    document()?.query_selector(selector).ok().flatten()
}

/// Like [`query`], narrowed to `HtmlElement`.
pub fn query_html(selector: &str) -> Option<HtmlElement> {
    query(selector).and_then(|el| el.dyn_into::<HtmlElement>().ok())
}

/// All elements matching `selector`.
pub fn query_all(root: &Element, selector: &str) -> Vec<Element> {
    let Ok(list) = root.query_selector_all(selector) else {
        return Vec::new();
    };
    (0..list.length())
        .filter_map(|i| list.item(i))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect()
}

/// Run `f` once after `ms` milliseconds. The timer cannot be cancelled; hold a
/// [`Timeout`] instead when a later call must replace an earlier one.
pub fn set_timeout(ms: u32, f: impl FnOnce() + 'static) {
    Timeout::new(ms, f).forget();
}

//------------------------------------------------------------------------------
// Alerts
//------------------------------------------------------------------------------

/// Prepend a dismissible alert to `.alert-container`, `.container` or `<body>`
/// and dismiss it after `dismiss_ms`.
pub fn show_alert(message: &str, kind: AlertKind, dismiss_ms: u32) {
    let Some(doc) = document() else {
        log::error!("No document for alert: {}", message);
        return;
    };
    let container = query(".alert-container")
        .or_else(|| query(".container"))
        .or_else(|| doc.body().map(Element::from));
    let Some(container) = container else {
        log::error!("No container found for alert message: {}", message);
        return;
    };

    let alert = match build_alert(&doc, message, kind) {
        Ok(el) => el,
        Err(e) => {
            log::error!("Could not build alert: {}", js_error_message(&e));
            return;
        }
    };
    if let Err(e) = container.insert_before(&alert, container.first_child().as_ref()) {
        log::error!("Could not insert alert: {}", js_error_message(&e));
        return;
    }

    set_timeout(dismiss_ms, move || dismiss_alert(&alert));
}

fn build_alert(doc: &Document, message: &str, kind: AlertKind) -> Result<Element, JsValue> {
    let alert = doc.create_element("div")?;
    alert.set_class_name(&format!(
        "alert {} alert-dismissible fade show",
        kind.css_class()
    ));
    alert.set_attribute("role", "alert")?;

    let text = doc.create_element("span")?;
    text.set_text_content(Some(message));
    alert.append_child(&text)?;

    let close = doc.create_element("button")?;
    close.set_attribute("type", "button")?;
    close.set_class_name("btn-close");
    close.set_attribute("data-bs-dismiss", "alert")?;
    close.set_attribute("aria-label", "Close")?;
    alert.append_child(&close)?;
    Ok(alert)
}

/// Close an alert through Bootstrap when present, else just remove it.
pub fn dismiss_alert(alert: &Element) {
    if !alert.is_connected() {
        return;
    }
    if close_with_bootstrap(alert).is_err() {
        alert.remove();
    }
}

fn close_with_bootstrap(alert: &Element) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or(JsValue::NULL)?;
    let bootstrap = Reflect::get(&window, &JsValue::from_str("bootstrap"))?;
    let ctor = Reflect::get(&bootstrap, &JsValue::from_str("Alert"))?.dyn_into::<Function>()?;
    let args = web_sys::js_sys::Array::of1(alert);
    let instance = Reflect::construct(&ctor, &args)?;
    let close = Reflect::get(&instance, &JsValue::from_str("close"))?.dyn_into::<Function>()?;
    close.call0(&instance)?;
    Ok(())
}

/// Dismiss every success/info alert already on the page.
pub fn dismiss_flash_alerts() {
    let Some(doc) = document() else { return };
    let Some(root) = doc.document_element() else { return };
    for alert in query_all(&root, ".alert") {
        let classes = alert.class_list();
        if classes.contains("alert-success") || classes.contains("alert-info") {
            dismiss_alert(&alert);
        }
    }
}

//------------------------------------------------------------------------------
// Loading state
//------------------------------------------------------------------------------

/// Swap a button's label for a spinner and disable it. The original label is
/// kept in `data-original-text`; a second call keeps the first label.
pub fn show_loading(element: &HtmlElement) {
    stash_label(element, "originalText");
    element.set_inner_html(SPINNER_HTML);
    set_disabled(element, true);
}

/// Undo [`show_loading`].
pub fn hide_loading(element: &HtmlElement) {
    restore_label(element, "originalText");
    set_disabled(element, false);
}

fn set_disabled(element: &HtmlElement, disabled: bool) {
    if let Some(button) = element.dyn_ref::<HtmlButtonElement>() {
        button.set_disabled(disabled);
    } else if disabled {
        let _ = element.set_attribute("disabled", "");
    } else {
        let _ = element.remove_attribute("disabled");
    }
}

fn stash_label(element: &HtmlElement, key: &str) {
    let data = element.dataset();
    let current = element.inner_html();
    let original = stashed_or_current(data.get(key), &current);
    let _ = data.set(key, &original);
}

fn restore_label(element: &HtmlElement, key: &str) {
    let data = element.dataset();
    if let Some(original) = data.get(key) {
        element.set_inner_html(&original);
        data.delete(key);
    }
}

/// The label to restore later: an already stashed one wins over whatever the
/// element shows now (which may be our own temporary label).
pub(crate) fn stashed_or_current(stashed: Option<String>, current: &str) -> String {
    stashed.unwrap_or_else(|| current.to_string())
}

//------------------------------------------------------------------------------
// Clipboard
//------------------------------------------------------------------------------

/// `navigator.clipboard.writeText`, with the rejection reason as text.
pub async fn write_clipboard(text: &str) -> Result<(), String> {
    let promise = clipboard_write_text(text).map_err(|e| js_error_message(&e))?;
    JsFuture::from(promise)
        .await
        .map(|_| ())
        .map_err(|e| js_error_message(&e))
}

/// The parts of a copy button the acknowledgment touches.
pub(crate) trait CopyTarget {
    fn data(&self, key: &str) -> Option<String>;
    fn set_data(&self, key: &str, value: &str);
    fn remove_data(&self, key: &str);
    fn label(&self) -> String;
    fn set_label(&self, label: &str);
    fn set_copied(&self, copied: bool);
}

impl CopyTarget for HtmlElement {
    fn data(&self, key: &str) -> Option<String> {
        self.dataset().get(key)
    }

    fn set_data(&self, key: &str, value: &str) {
        let _ = self.dataset().set(key, value);
    }

    fn remove_data(&self, key: &str) {
        self.dataset().delete(key);
    }

    fn label(&self) -> String {
        self.inner_html()
    }

    fn set_label(&self, label: &str) {
        self.set_inner_html(label);
    }

    fn set_copied(&self, copied: bool) {
        let classes = self.class_list();
        let _ = if copied {
            classes.add_1("btn-success")
        } else {
            classes.remove_1("btn-success")
        };
    }
}

/// Show "Copied!" on `target` and return the generation its revert timer
/// must carry. The first label seen is kept across overlapping copies.
pub(crate) fn mark_copied(target: &impl CopyTarget) -> u32 {
    let original = stashed_or_current(target.data(COPY_ORIGINAL_KEY), &target.label());
    target.set_data(COPY_ORIGINAL_KEY, &original);
    let seq = copy_generation(target).unwrap_or(0).wrapping_add(1);
    target.set_data(COPY_SEQ_KEY, &seq.to_string());
    target.set_label(COPIED_LABEL);
    target.set_copied(true);
    seq
}

/// Put the original label back, unless a later copy has superseded `seq`.
///
/// # Returns
/// Whether the label was restored.
pub(crate) fn revert_copied(target: &impl CopyTarget, seq: u32) -> bool {
    if copy_generation(target) != Some(seq) {
        return false;
    }
    if let Some(original) = target.data(COPY_ORIGINAL_KEY) {
        target.set_label(&original);
    }
    target.remove_data(COPY_ORIGINAL_KEY);
    target.remove_data(COPY_SEQ_KEY);
    target.set_copied(false);
    true
}

fn copy_generation(target: &impl CopyTarget) -> Option<u32> {
    target.data(COPY_SEQ_KEY).and_then(|s| s.parse().ok())
}

/// Apply the outcome of a clipboard write to `target`.
///
/// A rejected write is logged and alerted and leaves the label alone.
pub(crate) fn acknowledge_copy<T, U>(outcome: Result<(), String>, target: &T, ui: &U) -> Option<u32>
where
    T: CopyTarget,
    U: CheckoutUi,
{
    match outcome {
        Ok(()) => Some(mark_copied(target)),
        Err(e) => {
            log::error!("Failed to copy text: {}", e);
            ui.notify("Failed to copy to clipboard", AlertKind::Danger);
            None
        }
    }
}

/// Copy `text` and flash "Copied!" on `element` for `config.copy_feedback_ms`.
///
/// Each acknowledgment lasts the full delay; an earlier timer never cuts a
/// later one short. A rejected write is logged and alerted; it never panics.
pub async fn copy_to_clipboard(text: &str, element: &HtmlElement, config: &CheckoutConfig) -> bool {
    let outcome = write_clipboard(text).await;
    let ui = BrowserUi::new(config);
    let Some(seq) = acknowledge_copy(outcome, element, &ui) else {
        return false;
    };

    let element = element.clone();
    set_timeout(config.copy_feedback_ms, move || {
        if element.is_connected() {
            revert_copied(&element, seq);
        }
    });
    true
}

/// Copy an order id and confirm with an alert.
pub async fn copy_order_id(order_id: &OrderId, config: &CheckoutConfig) -> bool {
    match write_clipboard(order_id.as_str()).await {
        Ok(()) => {
            show_alert(
                "Order ID copied to clipboard!",
                AlertKind::Success,
                config.alert_dismiss_ms,
            );
            true
        }
        Err(e) => {
            log::error!("Failed to copy order id: {}", e);
            show_alert("Failed to copy Order ID", AlertKind::Danger, config.alert_dismiss_ms);
            false
        }
    }
}

//------------------------------------------------------------------------------
// Effects
//------------------------------------------------------------------------------

/// Spawn a `.ripple` span centred on the pointer position.
pub fn create_ripple(element: &HtmlElement, client_x: f64, client_y: f64, lifetime_ms: u32) {
    let Some(doc) = document() else { return };
    let Ok(ripple) = doc.create_element("span") else { return };
    let Ok(ripple) = ripple.dyn_into::<HtmlElement>() else { return };

    let rect = element.get_bounding_client_rect();
    let size = rect.width().max(rect.height());
    let style = ripple.style();
    let _ = style.set_property("width", &format!("{}px", size));
    let _ = style.set_property("height", &format!("{}px", size));
    let _ = style.set_property("left", &format!("{}px", client_x - rect.left() - size / 2.0));
    let _ = style.set_property("top", &format!("{}px", client_y - rect.top() - size / 2.0));
    let _ = ripple.class_list().add_1("ripple");

    if element.append_child(&ripple).is_err() {
        return;
    }
    set_timeout(lifetime_ms, move || {
        if ripple.is_connected() {
            ripple.remove();
        }
    });
}

#[derive(Serialize)]
struct Keyframe {
    transform: String,
    opacity: f64,
}

#[derive(Serialize)]
struct AnimationOptions {
    duration: f64,
    easing: &'static str,
}

/// Drop `pieces` coloured dots from the top of the viewport.
pub fn confetti(pieces: u32) {
    let Some(doc) = document() else { return };
    let Some(body) = doc.body() else { return };
    for _ in 0..pieces {
        if let Err(e) = confetti_piece(&doc, &body) {
            log::debug!("Skipping confetti piece: {}", js_error_message(&e));
        }
    }
}

fn confetti_piece(doc: &Document, body: &HtmlElement) -> Result<(), JsValue> {
    let piece = doc.create_element("div")?.dyn_into::<HtmlElement>()?;
    let pick = (Math::random() * CONFETTI_COLORS.len() as f64) as usize;
    let color = CONFETTI_COLORS[pick % CONFETTI_COLORS.len()];
    let style = piece.style();
    style.set_property("position", "fixed")?;
    style.set_property("width", "10px")?;
    style.set_property("height", "10px")?;
    style.set_property("background-color", color)?;
    style.set_property("left", &format!("{}vw", Math::random() * 100.0))?;
    style.set_property("top", "-10px")?;
    style.set_property("z-index", "9999")?;
    style.set_property("border-radius", "50%")?;
    body.append_child(&piece)?;

    let keyframes = serde_wasm_bindgen::to_value(&[
        Keyframe {
            transform: "translateY(0) rotate(0deg)".to_string(),
            opacity: 1.0,
        },
        Keyframe {
            transform: format!("translateY(100vh) rotate({}deg)", Math::random() * 360.0),
            opacity: 0.0,
        },
    ])?;
    let options = serde_wasm_bindgen::to_value(&AnimationOptions {
        duration: Math::random() * 2000.0 + 1000.0,
        easing: "ease-out",
    })?;

    let animate = Reflect::get(&piece, &JsValue::from_str("animate"))?.dyn_into::<Function>()?;
    let animation = animate.call2(&piece, &keyframes, &options)?;
    let done = piece.clone();
    let on_finish = Closure::once_into_js(move || {
        if done.is_connected() {
            done.remove();
        }
    });
    Reflect::set(&animation, &JsValue::from_str("onfinish"), &on_finish)?;
    Ok(())
}

//------------------------------------------------------------------------------
// Orders page & gateway forms
//------------------------------------------------------------------------------

/// Show only rows of `table` whose `data-order-status` equals `filter`
/// (`"all"` shows everything).
pub fn filter_orders(table: &Element, filter: &str) {
    for row in query_all(table, "tbody tr") {
        let Ok(row) = row.dyn_into::<HtmlElement>() else { continue };
        let visible =
            filter == "all" || row.get_attribute("data-order-status").as_deref() == Some(filter);
        let _ = row
            .style()
            .set_property("display", if visible { "" } else { "none" });
    }
}

/// Reload the orders page.
pub fn refresh_orders() {
    if let Some(window) = web_sys::window() {
        let _ = window.location().reload();
    }
}

/// Orders export is not offered yet; tell the user so.
pub fn export_orders(config: &CheckoutConfig) {
    show_alert("Export functionality coming soon!", AlertKind::Info, config.alert_dismiss_ms);
}

/// Put `button` (or the form's own submit button) into the loading state and
/// submit `#{gateway}-form` after `config.submit_delay_ms`.
pub fn submit_payment_form(
    gateway: &str,
    button: Option<&HtmlElement>,
    config: &CheckoutConfig,
) -> Result<(), CheckoutError> {
    let form_id = format!("{}-form", gateway);
    let form = document()
        .and_then(|d| d.get_element_by_id(&form_id))
        .and_then(|el| el.dyn_into::<HtmlFormElement>().ok())
        .ok_or_else(|| CheckoutError::MissingElement(format!("#{}", form_id)))?;

    let fallback = form
        .query_selector("button[type=\"submit\"]")
        .ok()
        .flatten()
        .and_then(|el| el.dyn_into::<HtmlElement>().ok());
    if let Some(button) = button.cloned().or(fallback) {
        show_loading(&button);
    }

    set_timeout(config.submit_delay_ms, move || {
        if let Err(e) = form.submit() {
            log::error!("Submitting {} failed: {}", form.id(), js_error_message(&e));
        }
    });
    Ok(())
}

//------------------------------------------------------------------------------
// CheckoutUi for the live page
//------------------------------------------------------------------------------

/// [`CheckoutUi`] backed by the current document.
#[derive(Debug, Clone)]
pub struct BrowserUi {
    config: CheckoutConfig,
}

impl BrowserUi {
    pub fn new(config: &CheckoutConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }
}

impl CheckoutUi for BrowserUi {
    fn navigate(&self, url: &str) {
        let Some(window) = web_sys::window() else { return };
        if let Err(e) = window.location().set_href(url) {
            log::error!("Navigation to {} failed: {}", url, js_error_message(&e));
        }
    }

    fn notify(&self, message: &str, kind: AlertKind) {
        show_alert(message, kind, self.config.alert_dismiss_ms);
    }

    fn show_status(&self, order_id: &OrderId, status: OrderStatus) -> Result<(), CheckoutError> {
        let selector = format!("[data-order-status=\"{}\"]", order_id);
        let element = query(&selector).ok_or(CheckoutError::MissingElement(selector))?;
        element.set_inner_html(&format!(
            "<span class=\"{}\">{}</span>",
            status.badge_class(),
            status.label()
        ));
        Ok(())
    }

    fn csrf_token(&self) -> String {
        query(&format!("[name={}]", self.config.csrf_field))
            .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
            .map(|input| input.value())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    struct FakeButton {
        label: RefCell<String>,
        data: RefCell<HashMap<String, String>>,
        copied: RefCell<bool>,
    }

    impl FakeButton {
        fn labelled(label: &str) -> Self {
            Self {
                label: RefCell::new(label.to_string()),
                data: RefCell::new(HashMap::new()),
                copied: RefCell::new(false),
            }
        }

        fn shown(&self) -> String {
            self.label.borrow().clone()
        }
    }

    impl CopyTarget for FakeButton {
        fn data(&self, key: &str) -> Option<String> {
            self.data.borrow().get(key).cloned()
        }

        fn set_data(&self, key: &str, value: &str) {
            self.data.borrow_mut().insert(key.to_string(), value.to_string());
        }

        fn remove_data(&self, key: &str) {
            self.data.borrow_mut().remove(key);
        }

        fn label(&self) -> String {
            self.shown()
        }

        fn set_label(&self, label: &str) {
            *self.label.borrow_mut() = label.to_string();
        }

        fn set_copied(&self, copied: bool) {
            *self.copied.borrow_mut() = copied;
        }
    }

    #[derive(Default)]
    struct AlertLog {
        alerts: RefCell<Vec<(String, AlertKind)>>,
    }

    impl CheckoutUi for AlertLog {
        fn navigate(&self, _url: &str) {}

        fn notify(&self, message: &str, kind: AlertKind) {
            self.alerts.borrow_mut().push((message.to_string(), kind));
        }

        fn show_status(
            &self,
            _order_id: &OrderId,
            _status: OrderStatus,
        ) -> Result<(), CheckoutError> {
            Ok(())
        }

        fn csrf_token(&self) -> String {
            String::new()
        }
    }

    #[test]
    fn alert_classes() {
        assert_eq!(AlertKind::Danger.css_class(), "alert-danger");
        assert_eq!(AlertKind::Success.css_class(), "alert-success");
    }

    #[test]
    fn stashed_label_wins_over_current() {
        assert_eq!(stashed_or_current(None, "Copy link"), "Copy link");
        assert_eq!(
            stashed_or_current(Some("Copy link".into()), COPIED_LABEL),
            "Copy link"
        );
    }

    #[test]
    fn copy_shows_ack_then_reverts() {
        let button = FakeButton::labelled("Copy link");
        let ui = AlertLog::default();

        let seq = acknowledge_copy(Ok(()), &button, &ui).unwrap();
        assert_eq!(button.shown(), COPIED_LABEL);
        assert!(*button.copied.borrow());

        assert!(revert_copied(&button, seq));
        assert_eq!(button.shown(), "Copy link");
        assert!(!*button.copied.borrow());
        assert!(button.data.borrow().is_empty());
        assert!(ui.alerts.borrow().is_empty());
    }

    #[test]
    fn earlier_timer_does_not_cut_later_ack_short() {
        let button = FakeButton::labelled("Copy link");
        let ui = AlertLog::default();

        let first = acknowledge_copy(Ok(()), &button, &ui).unwrap();
        let second = acknowledge_copy(Ok(()), &button, &ui).unwrap();
        assert_ne!(first, second);

        // first timer fires while the second acknowledgment is showing
        assert!(!revert_copied(&button, first));
        assert_eq!(button.shown(), COPIED_LABEL);
        assert!(*button.copied.borrow());

        // second timer restores the label seen before either copy
        assert!(revert_copied(&button, second));
        assert_eq!(button.shown(), "Copy link");
        assert!(!*button.copied.borrow());
    }

    #[test]
    fn rejected_write_alerts_and_keeps_label() {
        let button = FakeButton::labelled("Copy link");
        let ui = AlertLog::default();

        let seq = acknowledge_copy(Err("NotAllowedError".into()), &button, &ui);
        assert_eq!(seq, None);
        assert_eq!(button.shown(), "Copy link");
        assert!(!*button.copied.borrow());
        assert_eq!(
            *ui.alerts.borrow(),
            vec![("Failed to copy to clipboard".to_string(), AlertKind::Danger)]
        );
    }

    #[test]
    fn rejection_during_ack_leaves_pending_revert_intact() {
        let button = FakeButton::labelled("Copy link");
        let ui = AlertLog::default();

        let seq = acknowledge_copy(Ok(()), &button, &ui).unwrap();
        assert_eq!(acknowledge_copy(Err("denied".into()), &button, &ui), None);
        assert!(revert_copied(&button, seq));
        assert_eq!(button.shown(), "Copy link");
    }
}
