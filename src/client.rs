//! yew_khalti/src/client.rs
//!
//! High-level Rust API over the Khalti checkout widget.
//!
//! This module provides:
//! - `KhaltiConfig` mirroring the `new KhaltiCheckout({...})` options.
//! - `PaymentPreference` for the instruments offered inside the widget.
//! - `open_checkout()` which opens the widget and resolves with the payment
//!   token, or a typed [`WidgetError`] when the user cancels or the widget fails.
//!
//! The widget is callback based (`onSuccess`, `onError`, `onClose`). All three
//! callbacks settle one JS `Promise`, so the first one to fire wins and later
//! calls (the widget fires `onClose` after a successful payment too) are no-ops.
//!
//! # Example Usage
//! ```rust,ignore
//! use yew_khalti::{open_checkout, KhaltiConfig, CheckoutConfig};
//!
//! let cfg = CheckoutConfig::default();
//! let widget = KhaltiConfig::new("test_public_key_xxx", "ORD1", &cfg);
//! wasm_bindgen_futures::spawn_local(async move {
//!     match open_checkout(&widget, 250.0).await {
//!         Ok(token) => log::info!("got token {}", token),
//!         Err(err) => log::warn!("widget closed: {}", err),
//!     }
//! });
//! ```

use gloo_utils::format::JsValueSerdeExt;
use serde::{Deserialize, Serialize};
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::js_sys::{Function, Object, Promise, Reflect};

use crate::amount::to_minor_units;
use crate::bindings::JsKhaltiCheckout;
use crate::config::CheckoutConfig;
use crate::error::{js_error_message, WidgetError};

/// Payment instruments the widget may offer.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentPreference {
    Khalti,
    Ebanking,
    MobileBanking,
    ConnectIps,
    Sct,
}

impl PaymentPreference {
    pub fn all() -> &'static [PaymentPreference] {
        &[
            PaymentPreference::Khalti,
            PaymentPreference::Ebanking,
            PaymentPreference::MobileBanking,
            PaymentPreference::ConnectIps,
            PaymentPreference::Sct,
        ]
    }
}

/// Options for `new KhaltiCheckout(...)`, minus the `eventHandler` which
/// [`open_checkout`] attaches itself.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct KhaltiConfig {
    /// Merchant public key.
    pub public_key: String,
    /// The order the payment is for; echoed back to the server on verify.
    pub product_identity: String,
    pub product_name: String,
    pub product_url: String,
    pub payment_preference: Vec<PaymentPreference>,
}

impl KhaltiConfig {
    /// Build widget options for one order using page configuration.
    pub fn new(public_key: &str, order_id: &str, config: &CheckoutConfig) -> Self {
        let product_url = web_sys::window()
            .and_then(|w| w.location().origin().ok())
            .unwrap_or_default();
        Self {
            public_key: public_key.to_string(),
            product_identity: order_id.to_string(),
            product_name: config.product_name.clone(),
            product_url,
            payment_preference: config.payment_preference.clone(),
        }
    }
}

/// The fields of the `onSuccess` payload we care about.
#[derive(Deserialize, Debug)]
struct SuccessPayload {
    #[serde(default)]
    token: String,
    #[serde(default)]
    idx: Option<String>,
    #[serde(default)]
    amount: Option<u64>,
}

#[derive(Serialize)]
struct ShowOptions {
    amount: u64,
}

/// How a rejected widget promise is encoded on the JS side.
#[derive(Serialize, Deserialize, Debug)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum Rejection {
    Cancelled,
    Failed { message: String },
}

impl From<Rejection> for WidgetError {
    fn from(r: Rejection) -> Self {
        match r {
            Rejection::Cancelled => WidgetError::Cancelled,
            Rejection::Failed { message } => WidgetError::Failed(message),
        }
    }
}

/// Open the Khalti widget for `amount` rupees and wait for the outcome.
///
/// `amount` is in major units; it is converted to paisa here and nowhere else.
///
/// # Returns
/// The opaque payment token on success. It is untrusted until the server has
/// verified it with [`crate::verify::verify_payment`].
pub async fn open_checkout(config: &KhaltiConfig, amount: f64) -> Result<String, WidgetError> {
    let options = to_value(config).map_err(|e| WidgetError::Unavailable(e.to_string()))?;
    let handler = Object::new();

    let mut executor = |resolve: Function, reject: Function| {
        let reject_on_error = reject.clone();

        let on_success = Closure::wrap(Box::new(move |payload: JsValue| {
            let token = match payload.into_serde::<SuccessPayload>() {
                Ok(p) => {
                    log::debug!("Khalti onSuccess (idx {:?}, {:?} paisa)", p.idx, p.amount);
                    p.token
                }
                Err(e) => {
                    log::warn!("Unexpected Khalti success payload: {}", e);
                    String::new()
                }
            };
            let _ = resolve.call1(&JsValue::NULL, &JsValue::from_str(&token));
        }) as Box<dyn FnMut(JsValue)>);

        let on_error = Closure::wrap(Box::new(move |error: JsValue| {
            let message = js_error_message(&error);
            log::warn!("Khalti onError: {}", message);
            settle(&reject_on_error, Rejection::Failed { message });
        }) as Box<dyn FnMut(JsValue)>);

        let on_close = Closure::wrap(Box::new(move || {
            log::debug!("Payment widget closed");
            settle(&reject, Rejection::Cancelled);
        }) as Box<dyn FnMut()>);

        let _ = Reflect::set(&handler, &JsValue::from_str("onSuccess"), on_success.as_ref());
        let _ = Reflect::set(&handler, &JsValue::from_str("onError"), on_error.as_ref());
        let _ = Reflect::set(&handler, &JsValue::from_str("onClose"), on_close.as_ref());

        // Leaked once per open. The widget holds these past settlement (it
        // fires onClose after onSuccess) and calling a dropped closure throws.
        on_success.forget();
        on_error.forget();
        on_close.forget();
    };
    let promise = Promise::new(&mut executor);

    Reflect::set(&options, &JsValue::from_str("eventHandler"), &handler)
        .map_err(|e| WidgetError::Unavailable(js_error_message(&e)))?;

    let checkout = JsKhaltiCheckout::new(&options)
        .map_err(|e| WidgetError::Unavailable(js_error_message(&e)))?;
    let show = to_value(&ShowOptions {
        amount: to_minor_units(amount),
    })
    .map_err(|e| WidgetError::Unavailable(e.to_string()))?;
    checkout
        .show(&show)
        .map_err(|e| WidgetError::Unavailable(js_error_message(&e)))?;

    match JsFuture::from(promise).await {
        Ok(token) => Ok(token.as_string().unwrap_or_default()),
        Err(reason) => Err(from_value::<Rejection>(reason.clone())
            .map(WidgetError::from)
            .unwrap_or_else(|_| WidgetError::Failed(js_error_message(&reason)))),
    }
}

fn settle(reject: &Function, rejection: Rejection) {
    match to_value(&rejection) {
        Ok(value) => {
            let _ = reject.call1(&JsValue::NULL, &value);
        }
        Err(e) => log::error!("Could not encode widget rejection: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_serializes_with_widget_field_names() {
        let cfg = KhaltiConfig {
            public_key: "test_public_key".into(),
            product_identity: "ORD1".into(),
            product_name: "Order Payment".into(),
            product_url: "http://127.0.0.1:8000".into(),
            payment_preference: PaymentPreference::all().to_vec(),
        };
        let json = serde_json::to_value(&cfg).unwrap();
        assert_eq!(json["publicKey"], "test_public_key");
        assert_eq!(json["productIdentity"], "ORD1");
        assert_eq!(
            json["paymentPreference"],
            serde_json::json!(["KHALTI", "EBANKING", "MOBILE_BANKING", "CONNECT_IPS", "SCT"])
        );
    }

    #[test]
    fn success_payload_tolerates_extra_fields() {
        let p: SuccessPayload = serde_json::from_str(
            r#"{
                "token": "QUao9cqFzxPgvWJNi9aKac",
                "idx": "8xmeJnNXfoVjCvJcfiXBxD",
                "amount": 1000,
                "mobile": "98XXXXX969"
            }"#,
        )
        .unwrap();
        assert_eq!(p.token, "QUao9cqFzxPgvWJNi9aKac");
        assert_eq!(p.amount, Some(1000));
    }

    #[test]
    fn widget_constructor_is_associated_with_handle() {
        let ctor: fn(&JsValue) -> Result<JsKhaltiCheckout, JsValue> = JsKhaltiCheckout::new;
        let _ = ctor;
    }

    #[test]
    fn rejection_maps_to_widget_error() {
        let r: Rejection = serde_json::from_str(r#"{"kind":"cancelled"}"#).unwrap();
        assert_eq!(WidgetError::from(r), WidgetError::Cancelled);
        let r: Rejection =
            serde_json::from_str(r#"{"kind":"failed","message":"insufficient balance"}"#).unwrap();
        assert_eq!(
            WidgetError::from(r),
            WidgetError::Failed("insufficient balance".into())
        );
    }
}
