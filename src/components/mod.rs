use gloo_timers::callback::Timeout;
use wasm_bindgen_futures::spawn_local;
use web_sys::HtmlInputElement;
use yew::prelude::*;

use crate::amount::{validate_amount, AmountBounds};
use crate::config::CheckoutConfig;
use crate::dom::{show_alert, write_clipboard, AlertKind};
use crate::progress::CheckoutStep;
use crate::verify::{HttpApi, OrderId, OrderStatus, PaymentApi};

/// A button that swaps its label for a spinner while `loading`.
#[derive(Properties, PartialEq)]
pub struct LoadingButtonProps {
    /// Button label text
    pub label: String,
    /// Click handler
    pub onclick: Callback<MouseEvent>,
    #[prop_or_default]
    pub loading: bool,
    #[prop_or_default]
    pub disabled: bool,
    #[prop_or(classes!("btn", "btn-primary"))]
    pub class: Classes,
}

#[function_component(LoadingButton)]
pub fn loading_button(props: &LoadingButtonProps) -> Html {
    html! {
        <button
            type="button"
            onclick={props.onclick.clone()}
            disabled={props.disabled || props.loading}
            class={props.class.clone()}
        >
            if props.loading {
                <span class="spinner-border spinner-border-sm me-2"></span>
                { "Processing..." }
            } else {
                { props.label.clone() }
            }
        </button>
    }
}

/// Amount field validated on every keystroke against explicit bounds.
#[derive(Properties, PartialEq)]
pub struct AmountInputProps {
    /// Current value
    pub value: String,
    /// Emits the raw value on each keystroke
    pub oninput: Callback<String>,
    /// Emits the parsed amount, or `None` while the value is invalid
    #[prop_or_default]
    pub onvalid: Callback<Option<f64>>,
    #[prop_or_default]
    pub bounds: AmountBounds,
    #[prop_or_else(|| "amount".to_string())]
    pub name: String,
    #[prop_or_default]
    pub placeholder: String,
}

#[function_component(AmountInput)]
pub fn amount_input(props: &AmountInputProps) -> Html {
    // Untouched fields show neither state.
    let touched = use_state(|| false);
    let verdict = validate_amount(&props.value, &props.bounds);

    let oninput = {
        let touched = touched.clone();
        let on_raw = props.oninput.clone();
        let on_valid = props.onvalid.clone();
        let bounds = props.bounds.clone();
        Callback::from(move |e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            let value = input.value();
            touched.set(true);
            on_valid.emit(validate_amount(&value, &bounds).ok());
            on_raw.emit(value);
        })
    };

    let state_class = match (*touched, &verdict) {
        (false, _) => None,
        (true, Ok(_)) => Some("is-valid"),
        (true, Err(_)) => Some("is-invalid"),
    };

    html! {
        <>
            <input
                type="number"
                step="any"
                name={props.name.clone()}
                class={classes!("form-control", state_class)}
                value={props.value.clone()}
                placeholder={props.placeholder.clone()}
                {oninput}
            />
            <div class="invalid-feedback">
                { verdict.err().map(|e| e.to_string()).unwrap_or_default() }
            </div>
        </>
    }
}

/// Bootstrap progress bar for the checkout sequence.
#[derive(Properties, PartialEq)]
pub struct ProgressBarProps {
    pub step: CheckoutStep,
}

#[function_component(ProgressBar)]
pub fn progress_bar(props: &ProgressBarProps) -> Html {
    let pct = props.step.percent();
    html! {
        <div class="progress">
            <div
                class="progress-bar"
                role="progressbar"
                style={format!("width: {}%", pct)}
                aria-valuenow={pct.to_string()}
                aria-valuemin="0"
                aria-valuemax="100"
            />
        </div>
    }
}

/// Badge showing an order's status, refreshed once from the server on mount.
#[derive(Properties, PartialEq)]
pub struct OrderStatusBadgeProps {
    pub order_id: OrderId,
    #[prop_or(OrderStatus::Pending)]
    pub initial: OrderStatus,
    #[prop_or_default]
    pub config: CheckoutConfig,
}

#[function_component(OrderStatusBadge)]
pub fn order_status_badge(props: &OrderStatusBadgeProps) -> Html {
    let status = use_state(|| props.initial);

    {
        let status = status.clone();
        let api = HttpApi::new(&props.config);
        use_effect_with(props.order_id.clone(), move |order_id| {
            let order_id = order_id.clone();
            spawn_local(async move {
                match api.status(&order_id).await {
                    Ok(resp) => {
                        if let Some(s) = resp.order_status() {
                            status.set(s);
                        }
                    }
                    Err(e) => log::error!("Error checking payment status for {}: {}", order_id, e),
                }
            });
            || ()
        });
    }

    html! {
        <span data-order-status={props.order_id.to_string()}>
            <span class={status.badge_class()}>{ status.label() }</span>
        </span>
    }
}

/// Button copying `text` and briefly acknowledging with "Copied!".
#[derive(Properties, PartialEq)]
pub struct CopyButtonProps {
    pub text: String,
    #[prop_or_else(|| "Copy".to_string())]
    pub label: String,
    #[prop_or_default]
    pub config: CheckoutConfig,
}

#[function_component(CopyButton)]
pub fn copy_button(props: &CopyButtonProps) -> Html {
    // The label lives in props, so reverting never depends on what the
    // button currently shows.
    let copied = use_state(|| false);
    // Replacing the pending revert drops (and so cancels) the previous one;
    // unmounting drops it too.
    let revert = use_mut_ref(|| None::<Timeout>);

    let onclick = {
        let copied = copied.clone();
        let revert = revert.clone();
        let text = props.text.clone();
        let config = props.config.clone();
        Callback::from(move |_: MouseEvent| {
            let copied = copied.clone();
            let revert = revert.clone();
            let text = text.clone();
            let config = config.clone();
            spawn_local(async move {
                match write_clipboard(&text).await {
                    Ok(()) => {
                        copied.set(true);
                        let timeout =
                            Timeout::new(config.copy_feedback_ms, move || copied.set(false));
                        *revert.borrow_mut() = Some(timeout);
                    }
                    Err(e) => {
                        log::error!("Failed to copy text: {}", e);
                        show_alert(
                            "Failed to copy to clipboard",
                            AlertKind::Danger,
                            config.alert_dismiss_ms,
                        );
                    }
                }
            });
        })
    };

    let copied = *copied;
    html! {
        <button
            type="button"
            class={classes!(
                "btn",
                "btn-sm",
                if copied { "btn-success" } else { "btn-outline-secondary" }
            )}
            {onclick}
        >
            { if copied { "Copied!" } else { props.label.as_str() } }
        </button>
    }
}
