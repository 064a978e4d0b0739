pub mod amount;
pub mod bindings;
pub mod checkout_component;
pub mod client;
pub mod components;
pub mod config;
pub mod dom;
pub mod error;
pub mod interop;
pub mod logging;
pub mod page;
pub mod progress;
pub mod verify;

pub use amount::{format_currency, to_minor_units, validate_amount, AmountBounds, InvalidAmount};
pub use checkout_component::*;
pub use client::{open_checkout, KhaltiConfig, PaymentPreference};
pub use components::*;
pub use config::CheckoutConfig;
pub use dom::{AlertKind, BrowserUi};
pub use error::{CheckoutError, WidgetError};
pub use interop::*;
pub use page::init_page;
pub use progress::{update_progress, CheckoutStep};
pub use verify::{
    check_payment_status, verify_payment, CheckoutUi, HttpApi, OrderId, OrderStatus, PaymentApi,
    VerificationRequest, VerificationResponse, VerifyOutcome,
};
