//! Error types for the checkout flow.
//!
//! Every failure is caught where the async operation was issued. Transport,
//! decode, business and widget failures are shown to the user as a transient
//! alert; a missing DOM element is only logged.

use thiserror::Error;
use wasm_bindgen::JsValue;

/// Why the Khalti widget did not hand back a token.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WidgetError {
    /// The user closed the widget before completing payment.
    #[error("Payment was cancelled")]
    Cancelled,
    /// The widget reported an error through `onError`.
    #[error("Payment failed: {0}")]
    Failed(String),
    /// `KhaltiCheckout` could not be constructed or shown.
    #[error("Payment widget unavailable: {0}")]
    Unavailable(String),
}

/// Everything that can go wrong between clicking "Pay" and landing on the
/// order-success page.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CheckoutError {
    /// The request never produced a response (offline, CORS, aborted).
    #[error("Network error: {0}")]
    Network(String),
    /// The server answered with a non-2xx status.
    #[error("Server error: {0}")]
    Status(u16),
    /// The body was not the JSON we expected.
    #[error("Bad JSON: {0}")]
    Decode(String),
    /// The server looked at the token and said no.
    #[error("Payment verification failed: {0}")]
    Rejected(String),
    /// A selector from the server-rendered markup matched nothing.
    #[error("Element not found: {0}")]
    MissingElement(String),
    /// The widget did not produce a token.
    #[error(transparent)]
    Widget(#[from] WidgetError),
    /// The widget produced an empty token.
    #[error("Payment token is empty")]
    EmptyToken,
}

impl CheckoutError {
    /// The text shown in the alert for this failure.
    ///
    /// `None` means the failure is logged only.
    pub fn user_message(&self) -> Option<String> {
        match self {
            CheckoutError::MissingElement(_) => None,
            CheckoutError::Rejected(reason) if !reason.is_empty() => Some(reason.clone()),
            CheckoutError::Rejected(_) => {
                Some("Payment verification failed. Please contact support.".to_string())
            }
            CheckoutError::Widget(WidgetError::Cancelled) => {
                Some("Payment was cancelled.".to_string())
            }
            CheckoutError::Widget(_) => Some("Payment failed. Please try again.".to_string()),
            CheckoutError::Network(_)
            | CheckoutError::Status(_)
            | CheckoutError::Decode(_)
            | CheckoutError::EmptyToken => {
                Some("An error occurred during payment verification.".to_string())
            }
        }
    }
}

impl From<gloo_net::Error> for CheckoutError {
    fn from(err: gloo_net::Error) -> Self {
        match err {
            gloo_net::Error::SerdeError(e) => CheckoutError::Decode(e.to_string()),
            other => CheckoutError::Network(other.to_string()),
        }
    }
}

/// Best-effort text for a caught `JsValue`.
pub(crate) fn js_error_message(value: &JsValue) -> String {
    if let Some(s) = value.as_string() {
        return s;
    }
    web_sys::js_sys::Reflect::get(value, &JsValue::from_str("message"))
        .ok()
        .and_then(|m| m.as_string())
        .unwrap_or_else(|| format!("{:?}", value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_element_is_not_shown_to_user() {
        let err = CheckoutError::MissingElement("[data-order-status=\"7\"]".into());
        assert_eq!(err.user_message(), None);
    }

    #[test]
    fn rejection_without_reason_uses_support_message() {
        let err = CheckoutError::Rejected(String::new());
        assert_eq!(
            err.user_message().as_deref(),
            Some("Payment verification failed. Please contact support.")
        );
    }

    #[test]
    fn widget_errors_convert() {
        let err: CheckoutError = WidgetError::Failed("declined".into()).into();
        assert_eq!(err.to_string(), "Payment failed: declined");
        assert_eq!(
            err.user_message().as_deref(),
            Some("Payment failed. Please try again.")
        );
    }
}
