// src/lib.rs
use wasm_bindgen::prelude::*;
use yew::prelude::*;
use yew_khalti::{
    init_page, logging, validate_amount, AmountInput, CheckoutConfig, CheckoutError, CheckoutStep,
    CopyButton, KhaltiCheckout, OrderId, OrderStatusBadge, ProgressBar,
};

// Test key from the Khalti sandbox docs; replace with your own.
const PUBLIC_KEY: &str = "test_public_key_dc74e0fd57cb46cd93832aee0a390234";

#[wasm_bindgen(start)]
pub fn start() {
    logging::init(log::LevelFilter::Debug);

    // Server-rendered bits (status badges, gateway cards, alerts) first.
    let config = CheckoutConfig::from_document();
    init_page(&config);

    let root = web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.get_element_by_id("app"));
    match root {
        Some(root) => {
            yew::Renderer::<OrderCheckout>::with_root_and_props(root, OrderCheckoutProps { config })
                .render();
        }
        None => log::info!("No #app element; running without the Yew checkout"),
    }
}

#[derive(Properties, PartialEq)]
struct OrderCheckoutProps {
    config: CheckoutConfig,
}

#[function_component(OrderCheckout)]
fn order_checkout(props: &OrderCheckoutProps) -> Html {
    let order_id = OrderId::new("ORD1");
    let raw_amount = use_state(|| "250".to_string());
    let amount = validate_amount(&raw_amount, &props.config.amount).ok();

    let on_amount = {
        let raw_amount = raw_amount.clone();
        Callback::from(move |value: String| raw_amount.set(value))
    };
    let on_error = Callback::from(|err: CheckoutError| {
        log::warn!("Checkout did not complete: {}", err);
    });

    html! {
        <div class="container py-4">
            <div class="alert-container"></div>
            <ProgressBar step={CheckoutStep::Payment} />

            <h1 class="h4 mt-4">
                { format!("Order {} ", order_id) }
                <OrderStatusBadge order_id={order_id.clone()} config={props.config.clone()} />
            </h1>
            <CopyButton
                text={order_id.to_string()}
                label="Copy order id"
                config={props.config.clone()}
            />

            <div class="my-3">
                <label for="amount" class="form-label">{ "Amount (Rs.)" }</label>
                <AmountInput
                    value={(*raw_amount).clone()}
                    oninput={on_amount}
                    bounds={props.config.amount.clone()}
                />
            </div>

            {
                match amount {
                    Some(amount) => html! {
                        <KhaltiCheckout
                            public_key={PUBLIC_KEY}
                            order_id={order_id.clone()}
                            amount={amount}
                            config={props.config.clone()}
                            on_error={on_error}
                        />
                    },
                    None => html! { <p class="text-muted">{ "Enter a valid amount to pay." }</p> },
                }
            }
        </div>
    }
}
