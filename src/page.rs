//! Wiring for server-rendered pages that do not mount Yew components.
//!
//! [`init_page`] finds the elements the Django templates mark with data
//! attributes and binds each one explicitly:
//!
//! | markup                                         | behaviour                          |
//! |------------------------------------------------|------------------------------------|
//! | `[data-order-id]`                              | one status poll per order          |
//! | `input[data-amount-field]` (`data-min`, `data-max`) | per-field amount validation   |
//! | `form.needs-validation`                        | native validity + `was-validated`  |
//! | `.payment-gateway-card`                        | single selection + ripple          |
//! | `[data-gateway]` buttons                       | `submit_payment_form`              |
//! | `[data-khalti-order]` (`data-amount`, `data-public-key`) | Khalti checkout          |
//! | `[data-copy-text]`, `[data-copy-order-id]`      | clipboard helpers                  |
//! | `[data-order-filter]`                          | filters `#ordersTable`             |
//! | `[data-orders-refresh]`, `[data-orders-export]` | reload / export notice           |
//! | `[data-original-text]` after back navigation   | loading state cleared              |

use wasm_bindgen::{prelude::Closure, JsCast};
use wasm_bindgen_futures::spawn_local;
use web_sys::js_sys::Function;
use web_sys::{Element, Event, HtmlElement, HtmlFormElement, HtmlInputElement, MouseEvent};

use crate::amount::{validate_amount, AmountBounds};
use crate::checkout_component::initiate_khalti_payment;
use crate::config::CheckoutConfig;
use crate::dom::{
    confetti, copy_order_id, copy_to_clipboard, create_ripple, dismiss_flash_alerts, document,
    export_orders, filter_orders, hide_loading, query_all, query_html, refresh_orders, set_timeout,
    submit_payment_form,
};
use crate::error::js_error_message;
use crate::progress::{set_progress, CheckoutStep};
use crate::verify::{check_payment_status, HttpApi, OrderId};

/// Attach a page-lifetime listener.
fn listen(target: &Element, event: &str, handler: impl FnMut(Event) + 'static) {
    let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
    let callback: &Function = closure.as_ref().unchecked_ref();
    if let Err(e) = target.add_event_listener_with_callback(event, callback) {
        log::warn!("Could not bind {} listener: {}", event, js_error_message(&e));
        return;
    }
    closure.forget();
}

/// Bind everything on the current page. Each piece that fails to find its
/// markup is skipped.
pub fn init_page(config: &CheckoutConfig) {
    let Some(root) = document().and_then(|d| d.document_element()) else {
        log::error!("Error initializing page: no document");
        return;
    };

    init_progress(config);
    poll_order_statuses(&root, config);

    for input in query_all(&root, "input[data-amount-field]") {
        if let Ok(input) = input.dyn_into::<HtmlInputElement>() {
            let bounds = field_bounds(&input, &config.amount);
            bind_amount_validation(&input, bounds);
        }
    }
    for form in query_all(&root, "form.needs-validation") {
        if let Ok(form) = form.dyn_into::<HtmlFormElement>() {
            bind_form_validation(&form);
        }
    }

    bind_gateway_cards(&root, config);
    bind_gateway_buttons(&root, config);
    bind_khalti_buttons(&root, config);
    bind_copy_buttons(&root, config);
    bind_order_filters(&root, config);
    reset_loading_on_return();

    set_timeout(config.alert_dismiss_ms, dismiss_flash_alerts);
}

/// Progress bar and, on the success page, confetti.
fn init_progress(config: &CheckoutConfig) {
    let Some(path) = web_sys::window().and_then(|w| w.location().pathname().ok()) else {
        return;
    };
    let Some(step) = CheckoutStep::from_path(&path) else {
        return;
    };
    match query_html(".progress-bar") {
        Some(bar) => set_progress(&bar, step),
        None => log::warn!("Progress bar element not found"),
    }
    if step == CheckoutStep::Success {
        confetti(config.confetti_pieces);
    }
}

fn poll_order_statuses(root: &Element, config: &CheckoutConfig) {
    for element in query_all(root, "[data-order-id]") {
        let Some(id) = element.get_attribute("data-order-id").filter(|id| !id.is_empty()) else {
            continue;
        };
        let order_id = OrderId::new(id);
        let api = HttpApi::new(config);
        let ui = crate::dom::BrowserUi::new(config);
        spawn_local(async move {
            check_payment_status(&api, &ui, &order_id).await;
        });
    }
}

/// Bounds for one field: page defaults overridden by `data-min` / `data-max`.
fn field_bounds(input: &HtmlInputElement, defaults: &AmountBounds) -> AmountBounds {
    let read = |name: &str| {
        input
            .get_attribute(name)
            .and_then(|v| v.trim().parse::<f64>().ok())
    };
    AmountBounds {
        min: read("data-min").unwrap_or(defaults.min),
        max: read("data-max").unwrap_or(defaults.max),
        currency_label: input
            .get_attribute("data-currency")
            .unwrap_or_else(|| defaults.currency_label.clone()),
    }
}

/// Validate `input` on every keystroke, writing the message into the
/// following `.invalid-feedback` sibling.
pub fn bind_amount_validation(input: &HtmlInputElement, bounds: AmountBounds) {
    let field = input.clone();
    listen(input, "input", move |_| {
        let classes = field.class_list();
        match validate_amount(&field.value(), &bounds) {
            Ok(_) => {
                let _ = classes.remove_1("is-invalid");
                let _ = classes.add_1("is-valid");
            }
            Err(err) => {
                let _ = classes.remove_1("is-valid");
                let _ = classes.add_1("is-invalid");
                if let Some(feedback) = field
                    .next_element_sibling()
                    .filter(|f| f.class_list().contains("invalid-feedback"))
                {
                    feedback.set_text_content(Some(&err.to_string()));
                }
            }
        }
    });
}

/// Block submission of an invalid form and mark it `was-validated`.
pub fn bind_form_validation(form: &HtmlFormElement) {
    let target = form.clone();
    listen(form, "submit", move |event| {
        if !target.check_validity() {
            event.prevent_default();
            event.stop_propagation();
        }
        let _ = target.class_list().add_1("was-validated");
    });
}

fn bind_gateway_cards(root: &Element, config: &CheckoutConfig) {
    let cards = query_all(root, ".payment-gateway-card");
    for card in &cards {
        let all = cards.clone();
        let this = card.clone();
        let ripple_ms = config.ripple_ms;
        listen(card, "click", move |event| {
            for other in &all {
                let _ = other.class_list().remove_1("selected");
            }
            let _ = this.class_list().add_1("selected");
            if let (Some(mouse), Ok(el)) = (
                event.dyn_ref::<MouseEvent>(),
                this.clone().dyn_into::<HtmlElement>(),
            ) {
                create_ripple(&el, mouse.client_x() as f64, mouse.client_y() as f64, ripple_ms);
            }
        });
    }
}

fn bind_gateway_buttons(root: &Element, config: &CheckoutConfig) {
    for button in query_all(root, "[data-gateway]") {
        let Some(gateway) = button.get_attribute("data-gateway") else { continue };
        let Ok(this) = button.clone().dyn_into::<HtmlElement>() else { continue };
        let config = config.clone();
        listen(&button, "click", move |event| {
            event.prevent_default();
            if let Err(e) = submit_payment_form(&gateway, Some(&this), &config) {
                log::error!("{}", e);
            }
        });
    }
}

fn bind_khalti_buttons(root: &Element, config: &CheckoutConfig) {
    for button in query_all(root, "[data-khalti-order]") {
        let order = button.get_attribute("data-khalti-order").unwrap_or_default();
        let key = button.get_attribute("data-public-key").unwrap_or_default();
        let amount = button
            .get_attribute("data-amount")
            .and_then(|a| a.trim().parse::<f64>().ok());
        let Some(amount) = amount else {
            log::warn!("Khalti button for order {} has no usable data-amount", order);
            continue;
        };
        let config = config.clone();
        listen(&button, "click", move |event| {
            event.prevent_default();
            let order_id = OrderId::new(order.clone());
            let key = key.clone();
            let config = config.clone();
            spawn_local(async move {
                let _ = initiate_khalti_payment(&key, &order_id, amount, &config).await;
            });
        });
    }
}

fn bind_copy_buttons(root: &Element, config: &CheckoutConfig) {
    for button in query_all(root, "[data-copy-text]") {
        let text = button.get_attribute("data-copy-text").unwrap_or_default();
        let Ok(this) = button.clone().dyn_into::<HtmlElement>() else { continue };
        let config = config.clone();
        listen(&button, "click", move |_| {
            let text = text.clone();
            let this = this.clone();
            let config = config.clone();
            spawn_local(async move {
                copy_to_clipboard(&text, &this, &config).await;
            });
        });
    }
    for button in query_all(root, "[data-copy-order-id]") {
        let id = OrderId::new(button.get_attribute("data-copy-order-id").unwrap_or_default());
        let config = config.clone();
        listen(&button, "click", move |_| {
            let id = id.clone();
            let config = config.clone();
            spawn_local(async move {
                copy_order_id(&id, &config).await;
            });
        });
    }
}

fn bind_order_filters(root: &Element, config: &CheckoutConfig) {
    for button in query_all(root, "[data-order-filter]") {
        let filter = button.get_attribute("data-order-filter").unwrap_or_else(|| "all".into());
        listen(&button, "click", move |_| {
            match document().and_then(|d| d.get_element_by_id("ordersTable")) {
                Some(table) => filter_orders(&table, &filter),
                None => log::warn!("#ordersTable not found"),
            }
        });
    }
    for button in query_all(root, "[data-orders-refresh]") {
        listen(&button, "click", |_| refresh_orders());
    }
    for button in query_all(root, "[data-orders-export]") {
        let config = config.clone();
        listen(&button, "click", move |_| export_orders(&config));
    }
}

/// A gateway form submit leaves its button spinning; when the browser
/// restores the page from the back/forward cache, put the label back.
fn reset_loading_on_return() {
    let Some(window) = web_sys::window() else { return };
    let closure = Closure::wrap(Box::new(move |_: Event| {
        let Some(root) = document().and_then(|d| d.document_element()) else { return };
        for el in query_all(&root, "[data-original-text]") {
            if let Ok(el) = el.dyn_into::<HtmlElement>() {
                hide_loading(&el);
            }
        }
    }) as Box<dyn FnMut(Event)>);
    if window
        .add_event_listener_with_callback("pageshow", closure.as_ref().unchecked_ref())
        .is_ok()
    {
        closure.forget();
    }
}
