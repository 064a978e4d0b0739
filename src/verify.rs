//! Server-side confirmation of widget tokens, and the order status poll.
//!
//! Both operations are single request/response cycles with no retry. The
//! transport ([`PaymentApi`]) and the page ([`CheckoutUi`]) are passed in, so
//! the flow can run against [`HttpApi`] and [`crate::dom::BrowserUi`] in the
//! browser and against mocks in tests.

use std::fmt;

use gloo_net::http::Request;
use serde::{Deserialize, Serialize};

use crate::config::CheckoutConfig;
use crate::dom::AlertKind;
use crate::error::CheckoutError;

/// Server-owned order identifier. Opaque to the client.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OrderId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Order state as far as this client can see it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Pending,
    Paid,
    Failed,
}

impl OrderStatus {
    pub fn label(self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Paid => "Paid",
            OrderStatus::Failed => "Failed",
        }
    }

    /// Bootstrap badge class for this status.
    pub fn badge_class(self) -> &'static str {
        match self {
            OrderStatus::Pending => "badge bg-warning",
            OrderStatus::Paid => "badge bg-success",
            OrderStatus::Failed => "badge bg-danger",
        }
    }
}

/// Body of `POST /payment/khalti-verify/`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct VerificationRequest {
    pub token: String,
    pub order_id: OrderId,
}

/// Server verdict on a token.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct VerificationResponse {
    pub success: bool,
    /// Where to send the user on success; defaults to the order-success page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
    /// Failure reason, if the server gave one.
    #[serde(default, alias = "error", skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Body of `GET /payment/payment-status/{id}/`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct StatusResponse {
    pub status: String,
    #[serde(default)]
    pub is_paid: bool,
}

impl StatusResponse {
    /// `None` unless the lookup itself reported `"success"`.
    pub fn order_status(&self) -> Option<OrderStatus> {
        if self.status != "success" {
            return None;
        }
        Some(if self.is_paid {
            OrderStatus::Paid
        } else {
            OrderStatus::Pending
        })
    }
}

/// What a verification attempt ended in.
#[derive(Debug, Clone, PartialEq)]
pub enum VerifyOutcome {
    /// Navigation to this URL was requested.
    Redirected(String),
    /// An alert was shown for this error.
    Failed(CheckoutError),
}

/// The two server endpoints the checkout talks to.
#[allow(async_fn_in_trait)]
pub trait PaymentApi {
    async fn verify(
        &self,
        request: &VerificationRequest,
        csrf_token: &str,
    ) -> Result<VerificationResponse, CheckoutError>;

    async fn status(&self, order_id: &OrderId) -> Result<StatusResponse, CheckoutError>;
}

/// The page side effects the checkout needs.
pub trait CheckoutUi {
    /// Leave the page.
    fn navigate(&self, url: &str);
    /// Show a transient, auto-dismissing alert.
    fn notify(&self, message: &str, kind: AlertKind);
    /// Reflect an order's status in its `data-order-status` element.
    fn show_status(&self, order_id: &OrderId, status: OrderStatus) -> Result<(), CheckoutError>;
    /// Current CSRF token, empty when the page has none.
    fn csrf_token(&self) -> String;
}

/// [`PaymentApi`] over `fetch`, using the endpoints from [`CheckoutConfig`].
#[derive(Debug, Clone)]
pub struct HttpApi {
    config: CheckoutConfig,
}

impl HttpApi {
    pub fn new(config: &CheckoutConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }
}

impl PaymentApi for HttpApi {
    async fn verify(
        &self,
        request: &VerificationRequest,
        csrf_token: &str,
    ) -> Result<VerificationResponse, CheckoutError> {
        let resp = Request::post(&self.config.verify_url)
            .header("X-CSRFToken", csrf_token)
            .json(request)?
            .send()
            .await?;
        if !resp.ok() {
            return Err(CheckoutError::Status(resp.status()));
        }
        Ok(resp.json::<VerificationResponse>().await?)
    }

    async fn status(&self, order_id: &OrderId) -> Result<StatusResponse, CheckoutError> {
        let url = self.config.status_endpoint(order_id.as_str());
        let resp = Request::get(&url).send().await?;
        if !resp.ok() {
            return Err(CheckoutError::Status(resp.status()));
        }
        Ok(resp.json::<StatusResponse>().await?)
    }
}

/// Exchange a widget token for the server's verdict.
///
/// Issues exactly one request. On success the UI is navigated once, to the
/// server-provided `redirect_url` or `/payment/order-success/{id}/`. Every
/// failure shows exactly one alert and leaves the page where it is.
pub async fn verify_payment<A, U>(
    api: &A,
    ui: &U,
    config: &CheckoutConfig,
    token: &str,
    order_id: &OrderId,
) -> VerifyOutcome
where
    A: PaymentApi,
    U: CheckoutUi,
{
    match exchange(api, ui, token, order_id).await {
        Ok(response) => {
            let url = response
                .redirect_url
                .filter(|u| !u.is_empty())
                .unwrap_or_else(|| config.success_endpoint(order_id.as_str()));
            log::info!("Order {} verified, redirecting to {}", order_id, url);
            ui.navigate(&url);
            VerifyOutcome::Redirected(url)
        }
        Err(err) => {
            log::error!("Verification of order {} failed: {}", order_id, err);
            if let Some(msg) = err.user_message() {
                ui.notify(&msg, AlertKind::Danger);
            }
            VerifyOutcome::Failed(err)
        }
    }
}

async fn exchange<A, U>(
    api: &A,
    ui: &U,
    token: &str,
    order_id: &OrderId,
) -> Result<VerificationResponse, CheckoutError>
where
    A: PaymentApi,
    U: CheckoutUi,
{
    if token.trim().is_empty() {
        return Err(CheckoutError::EmptyToken);
    }
    let csrf = ui.csrf_token();
    if csrf.is_empty() {
        log::warn!("No CSRF token on page; verification will likely be refused");
    }
    let request = VerificationRequest {
        token: token.to_string(),
        order_id: order_id.clone(),
    };
    let response = api.verify(&request, &csrf).await?;
    if response.success {
        Ok(response)
    } else {
        Err(CheckoutError::Rejected(response.message.unwrap_or_default()))
    }
}

/// Poll an order's status once and reflect it on the page.
///
/// Only a `"success"` lookup touches the page. Errors are logged, never shown.
pub async fn check_payment_status<A, U>(api: &A, ui: &U, order_id: &OrderId) -> Option<OrderStatus>
where
    A: PaymentApi,
    U: CheckoutUi,
{
    let response = match api.status(order_id).await {
        Ok(r) => r,
        Err(e) => {
            log::error!("Error checking payment status for {}: {}", order_id, e);
            return None;
        }
    };
    let status = response.order_status()?;
    if let Err(e) = ui.show_status(order_id, status) {
        log::warn!("Status element not found for order {}: {}", order_id, e);
        return None;
    }
    Some(status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct MockApi {
        verify_reply: RefCell<Option<Result<VerificationResponse, CheckoutError>>>,
        status_reply: RefCell<Option<Result<StatusResponse, CheckoutError>>>,
        verify_calls: RefCell<Vec<(VerificationRequest, String)>>,
        status_calls: RefCell<Vec<OrderId>>,
    }

    impl MockApi {
        fn verifying(reply: Result<VerificationResponse, CheckoutError>) -> Self {
            let api = Self::default();
            *api.verify_reply.borrow_mut() = Some(reply);
            api
        }

        fn reporting(reply: Result<StatusResponse, CheckoutError>) -> Self {
            let api = Self::default();
            *api.status_reply.borrow_mut() = Some(reply);
            api
        }
    }

    impl PaymentApi for MockApi {
        async fn verify(
            &self,
            request: &VerificationRequest,
            csrf_token: &str,
        ) -> Result<VerificationResponse, CheckoutError> {
            self.verify_calls
                .borrow_mut()
                .push((request.clone(), csrf_token.to_string()));
            self.verify_reply
                .borrow_mut()
                .take()
                .unwrap_or_else(|| Err(CheckoutError::Network("no reply queued".into())))
        }

        async fn status(&self, order_id: &OrderId) -> Result<StatusResponse, CheckoutError> {
            self.status_calls.borrow_mut().push(order_id.clone());
            self.status_reply
                .borrow_mut()
                .take()
                .unwrap_or_else(|| Err(CheckoutError::Network("no reply queued".into())))
        }
    }

    struct MockUi {
        csrf: String,
        has_status_element: bool,
        navigations: RefCell<Vec<String>>,
        alerts: RefCell<Vec<(String, AlertKind)>>,
        statuses: RefCell<Vec<(OrderId, OrderStatus)>>,
    }

    impl MockUi {
        fn new() -> Self {
            Self {
                csrf: "csrf-abc".into(),
                has_status_element: true,
                navigations: RefCell::default(),
                alerts: RefCell::default(),
                statuses: RefCell::default(),
            }
        }
    }

    impl CheckoutUi for MockUi {
        fn navigate(&self, url: &str) {
            self.navigations.borrow_mut().push(url.to_string());
        }

        fn notify(&self, message: &str, kind: AlertKind) {
            self.alerts.borrow_mut().push((message.to_string(), kind));
        }

        fn show_status(
            &self,
            order_id: &OrderId,
            status: OrderStatus,
        ) -> Result<(), CheckoutError> {
            if !self.has_status_element {
                return Err(CheckoutError::MissingElement(format!(
                    "[data-order-status=\"{}\"]",
                    order_id
                )));
            }
            self.statuses.borrow_mut().push((order_id.clone(), status));
            Ok(())
        }

        fn csrf_token(&self) -> String {
            self.csrf.clone()
        }
    }

    fn ok(success: bool) -> Result<VerificationResponse, CheckoutError> {
        Ok(VerificationResponse {
            success,
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn success_redirects_exactly_once() {
        let api = MockApi::verifying(ok(true));
        let ui = MockUi::new();
        let order = OrderId::from("ORD1");

        let outcome =
            verify_payment(&api, &ui, &CheckoutConfig::default(), "tok123", &order).await;

        assert_eq!(
            outcome,
            VerifyOutcome::Redirected("/payment/order-success/ORD1/".into())
        );
        assert_eq!(*ui.navigations.borrow(), vec!["/payment/order-success/ORD1/"]);
        assert!(ui.alerts.borrow().is_empty());

        let calls = api.verify_calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0.token, "tok123");
        assert_eq!(calls[0].0.order_id, order);
        assert_eq!(calls[0].1, "csrf-abc");
    }

    #[tokio::test]
    async fn server_redirect_target_wins() {
        let api = MockApi::verifying(Ok(VerificationResponse {
            success: true,
            redirect_url: Some("/thanks/ORD1/".into()),
            message: None,
        }));
        let ui = MockUi::new();

        verify_payment(&api, &ui, &CheckoutConfig::default(), "tok", &"ORD1".into()).await;

        assert_eq!(*ui.navigations.borrow(), vec!["/thanks/ORD1/"]);
    }

    #[tokio::test]
    async fn rejection_shows_one_error_and_stays() {
        let api = MockApi::verifying(ok(false));
        let ui = MockUi::new();

        let outcome =
            verify_payment(&api, &ui, &CheckoutConfig::default(), "tok123", &"ORD1".into()).await;

        assert!(matches!(outcome, VerifyOutcome::Failed(CheckoutError::Rejected(_))));
        assert!(ui.navigations.borrow().is_empty());
        let alerts = ui.alerts.borrow();
        assert_eq!(alerts.len(), 1);
        assert_eq!(
            alerts[0],
            (
                "Payment verification failed. Please contact support.".to_string(),
                AlertKind::Danger
            )
        );
        assert_eq!(api.verify_calls.borrow().len(), 1);
    }

    #[tokio::test]
    async fn transport_failures_alert_without_retry() {
        for err in [
            CheckoutError::Network("offline".into()),
            CheckoutError::Status(500),
            CheckoutError::Decode("expected value at line 1".into()),
        ] {
            let api = MockApi::verifying(Err(err.clone()));
            let ui = MockUi::new();

            let outcome =
                verify_payment(&api, &ui, &CheckoutConfig::default(), "tok", &"7".into()).await;

            assert_eq!(outcome, VerifyOutcome::Failed(err));
            assert_eq!(api.verify_calls.borrow().len(), 1);
            assert!(ui.navigations.borrow().is_empty());
            assert_eq!(
                ui.alerts.borrow()[0].0,
                "An error occurred during payment verification."
            );
        }
    }

    #[tokio::test]
    async fn empty_token_never_reaches_server() {
        let api = MockApi::verifying(ok(true));
        let ui = MockUi::new();

        let outcome =
            verify_payment(&api, &ui, &CheckoutConfig::default(), "  ", &"7".into()).await;

        assert_eq!(outcome, VerifyOutcome::Failed(CheckoutError::EmptyToken));
        assert!(api.verify_calls.borrow().is_empty());
        assert_eq!(ui.alerts.borrow().len(), 1);
    }

    #[tokio::test]
    async fn status_paid_and_pending() {
        for (is_paid, expected) in [(true, OrderStatus::Paid), (false, OrderStatus::Pending)] {
            let api = MockApi::reporting(Ok(StatusResponse {
                status: "success".into(),
                is_paid,
            }));
            let ui = MockUi::new();

            let shown = check_payment_status(&api, &ui, &"42".into()).await;

            assert_eq!(shown, Some(expected));
            assert_eq!(*ui.statuses.borrow(), vec![(OrderId::from("42"), expected)]);
        }
        assert_eq!(OrderStatus::Paid.label(), "Paid");
        assert_eq!(OrderStatus::Pending.label(), "Pending");
    }

    #[tokio::test]
    async fn status_other_than_success_is_ignored() {
        let api = MockApi::reporting(Ok(StatusResponse {
            status: "error".into(),
            is_paid: true,
        }));
        let ui = MockUi::new();

        assert_eq!(check_payment_status(&api, &ui, &"42".into()).await, None);
        assert!(ui.statuses.borrow().is_empty());
        assert!(ui.alerts.borrow().is_empty());
    }

    #[tokio::test]
    async fn status_errors_are_silent() {
        let api = MockApi::reporting(Err(CheckoutError::Decode("eof".into())));
        let ui = MockUi::new();
        assert_eq!(check_payment_status(&api, &ui, &"42".into()).await, None);
        assert!(ui.alerts.borrow().is_empty());

        let api = MockApi::reporting(Ok(StatusResponse {
            status: "success".into(),
            is_paid: true,
        }));
        let ui = MockUi {
            has_status_element: false,
            ..MockUi::new()
        };
        assert_eq!(check_payment_status(&api, &ui, &"42".into()).await, None);
        assert!(ui.alerts.borrow().is_empty());
        assert_eq!(api.status_calls.borrow().len(), 1);
    }

    #[test]
    fn wire_formats() {
        let req = VerificationRequest {
            token: "tok123".into(),
            order_id: "ORD1".into(),
        };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            serde_json::json!({ "token": "tok123", "order_id": "ORD1" })
        );

        let resp: VerificationResponse =
            serde_json::from_str(r#"{"success":false,"error":"bad token"}"#).unwrap();
        assert!(!resp.success);
        assert_eq!(resp.message.as_deref(), Some("bad token"));

        let status: StatusResponse = serde_json::from_str(r#"{"status":"not_found"}"#).unwrap();
        assert_eq!(status.order_status(), None);
    }
}
