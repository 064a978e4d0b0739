//! Page-level configuration.
//!
//! Server-rendered pages can embed overrides as JSON:
//!
//! ```html
//! <script type="application/json" id="checkout-config">
//!   { "verify_url": "/payment/khalti-verify/", "amount": { "min": 10, "max": 100000 } }
//! </script>
//! ```
//!
//! Missing fields fall back to [`CheckoutConfig::default`].

use serde::{Deserialize, Serialize};

use crate::amount::AmountBounds;
use crate::client::PaymentPreference;

/// Element id of the embedded JSON configuration block.
pub const CONFIG_ELEMENT_ID: &str = "checkout-config";

/// Endpoints, bounds and timings used by the checkout flow.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct CheckoutConfig {
    /// `POST` target for token verification.
    pub verify_url: String,
    /// Prefix for `GET {status_url}{orderId}/`.
    pub status_url: String,
    /// Prefix for the order-success redirect `{success_url}{orderId}/`.
    pub success_url: String,
    /// Name of the hidden input carrying the CSRF token.
    pub csrf_field: String,
    /// Accepted amount range for amount inputs.
    pub amount: AmountBounds,
    /// Product name shown inside the widget.
    pub product_name: String,
    /// Payment instruments offered by the widget.
    pub payment_preference: Vec<PaymentPreference>,
    /// Alert lifetime in milliseconds.
    pub alert_dismiss_ms: u32,
    /// How long "Copied!" stays before the label reverts.
    pub copy_feedback_ms: u32,
    /// Ripple lifetime in milliseconds.
    pub ripple_ms: u32,
    /// Delay between showing the spinner and submitting a gateway form.
    pub submit_delay_ms: u32,
    /// Particles spawned on the success page.
    pub confetti_pieces: u32,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            verify_url: "/payment/khalti-verify/".to_string(),
            status_url: "/payment/payment-status/".to_string(),
            success_url: "/payment/order-success/".to_string(),
            csrf_field: "csrfmiddlewaretoken".to_string(),
            amount: AmountBounds::default(),
            product_name: "Order Payment".to_string(),
            payment_preference: PaymentPreference::all().to_vec(),
            alert_dismiss_ms: 5_000,
            copy_feedback_ms: 2_000,
            ripple_ms: 600,
            submit_delay_ms: 1_000,
            confetti_pieces: 50,
        }
    }
}

impl CheckoutConfig {
    /// Parse a JSON override block; absent keys keep their defaults.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Read `#checkout-config` from the current document, falling back to
    /// defaults when it is absent or malformed.
    pub fn from_document() -> Self {
        let raw = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(CONFIG_ELEMENT_ID))
            .and_then(|el| el.text_content());
        match raw {
            Some(raw) => Self::from_json(&raw).unwrap_or_else(|e| {
                log::warn!("Ignoring malformed #{}: {}", CONFIG_ELEMENT_ID, e);
                Self::default()
            }),
            None => Self::default(),
        }
    }

    /// `/payment/payment-status/{order_id}/`
    pub fn status_endpoint(&self, order_id: &str) -> String {
        join_id(&self.status_url, order_id)
    }

    /// `/payment/order-success/{order_id}/`
    pub fn success_endpoint(&self, order_id: &str) -> String {
        join_id(&self.success_url, order_id)
    }
}

fn join_id(prefix: &str, id: &str) -> String {
    format!("{}/{}/", prefix.trim_end_matches('/'), id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_follow_server_routes() {
        let cfg = CheckoutConfig::default();
        assert_eq!(cfg.status_endpoint("42"), "/payment/payment-status/42/");
        assert_eq!(cfg.success_endpoint("ORD1"), "/payment/order-success/ORD1/");
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = CheckoutConfig::from_json(
            r#"{ "verify_url": "/pay/verify/", "amount": { "min": 50 } }"#,
        )
        .unwrap();
        assert_eq!(cfg.verify_url, "/pay/verify/");
        assert_eq!(cfg.amount.min, 50.0);
        assert_eq!(cfg.amount.max, 100_000.0);
        assert_eq!(cfg.alert_dismiss_ms, 5_000);
        assert_eq!(cfg.payment_preference.len(), 5);
    }

    #[test]
    fn prefix_without_trailing_slash() {
        let cfg = CheckoutConfig {
            success_url: "/done".into(),
            ..CheckoutConfig::default()
        };
        assert_eq!(cfg.success_endpoint("9"), "/done/9/");
    }
}
