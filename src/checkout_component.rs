//! A high-level Yew Khalti checkout button for your app to drop in.
//!
//! This component loads the Khalti SDK, opens the widget for one order,
//! sends the resulting token to the server for verification and then either
//! navigates to the order-success page or shows an alert.

use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use crate::amount::format_currency;
use crate::client::{open_checkout, KhaltiConfig};
use crate::components::LoadingButton;
use crate::config::CheckoutConfig;
use crate::dom::{AlertKind, BrowserUi};
use crate::error::{CheckoutError, WidgetError};
use crate::interop::use_khaltijs;
use crate::verify::{verify_payment, CheckoutUi, HttpApi, OrderId, VerifyOutcome};

/// Open the widget for one order and verify the token it returns.
///
/// Widget cancellation and failure are alerted here; verification failures
/// are alerted by [`verify_payment`]. Either way the caller gets the error
/// back after exactly one alert.
///
/// # Returns
/// The URL navigation was requested to.
pub async fn initiate_khalti_payment(
    public_key: &str,
    order_id: &OrderId,
    amount: f64,
    config: &CheckoutConfig,
) -> Result<String, CheckoutError> {
    let ui = BrowserUi::new(config);
    let widget = KhaltiConfig::new(public_key, order_id.as_str(), config);

    let token = match open_checkout(&widget, amount).await {
        Ok(token) => token,
        Err(err) => {
            let kind = match err {
                WidgetError::Cancelled => AlertKind::Warning,
                _ => AlertKind::Danger,
            };
            let err = CheckoutError::from(err);
            log::warn!("Khalti widget for order {}: {}", order_id, err);
            if let Some(msg) = err.user_message() {
                ui.notify(&msg, kind);
            }
            return Err(err);
        }
    };

    let api = HttpApi::new(config);
    match verify_payment(&api, &ui, config, &token, order_id).await {
        VerifyOutcome::Redirected(url) => Ok(url),
        VerifyOutcome::Failed(err) => Err(err),
    }
}

/// Properties for the [`KhaltiCheckout`] component.
///
/// # Fields
///
/// * `public_key` – Khalti merchant public key.
/// * `order_id` – The order being paid; sent back to the server with the token.
/// * `amount` – Amount in rupees. Converted to paisa exactly once, inside the adapter.
/// * `config` – Endpoints and timings; defaults match the Django routes.
/// * `on_verified` – Called with the redirect URL once navigation has been requested.
/// * `on_error` – Called with the [`CheckoutError`] after its alert is shown.
/// * `button_label` – Override the button text (default: `"Pay with Khalti"`).
/// * `children` – Extra nodes (e.g. order summary) rendered above the button.
#[derive(Properties, PartialEq, Clone)]
pub struct KhaltiCheckoutProps {
    pub public_key: String,
    pub order_id: OrderId,
    pub amount: f64,
    #[prop_or_default]
    pub config: CheckoutConfig,
    #[prop_or_default]
    pub on_verified: Callback<String>,
    #[prop_or_default]
    pub on_error: Callback<CheckoutError>,
    #[prop_or_default]
    pub button_label: Option<String>,
    #[prop_or_default]
    pub children: Children,
}

/// Yew function component rendering a Khalti pay button.
///
/// # Example
///
/// ```rust,ignore
/// use yew::prelude::*;
/// use yew_khalti::{KhaltiCheckout, OrderId};
///
/// #[function_component(App)]
/// fn app() -> Html {
///     html! {
///         <KhaltiCheckout
///             public_key="test_public_key_dc74e0fd57cb46cd93832aee0a390234"
///             order_id={OrderId::new("ORD1")}
///             amount={250.0}
///         >
///             <p>{ "Order ORD1" }</p>
///         </KhaltiCheckout>
///     }
/// }
/// ```
///
/// # Errors
///
/// Widget cancellation, widget failure and every verification failure end in
/// one alert and an `on_error` emit. The order is left for the user to retry.
#[function_component(KhaltiCheckout)]
pub fn khalti_checkout(props: &KhaltiCheckoutProps) -> Html {
    let khalti_ready = use_khaltijs();
    let loading = use_state(|| false);

    let on_click = {
        let loading = loading.clone();
        let props = props.clone();

        Callback::from(move |_: MouseEvent| {
            if *loading {
                return;
            }
            loading.set(true);

            let loading = loading.clone();
            let props = props.clone();
            spawn_local(async move {
                let result = initiate_khalti_payment(
                    &props.public_key,
                    &props.order_id,
                    props.amount,
                    &props.config,
                )
                .await;
                match result {
                    Ok(url) => props.on_verified.emit(url),
                    Err(err) => props.on_error.emit(err),
                }

                loading.set(false);
            });
        })
    };

    let label = props
        .button_label
        .clone()
        .unwrap_or_else(|| "Pay with Khalti".to_string());

    html! {
        <div class="khalti-checkout d-flex flex-column gap-3">
            { for props.children.iter() }
            <p class="mb-0 fw-semibold">{ format_currency(props.amount) }</p>
            <LoadingButton
                label={label}
                onclick={on_click}
                loading={*loading}
                disabled={!khalti_ready}
                class={classes!("btn", "btn-khalti")}
            />
        </div>
    }
}
