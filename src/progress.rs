//! The three-step checkout progress indicator.

use web_sys::HtmlElement;

/// Steps of the checkout sequence, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutStep {
    Order,
    Payment,
    Success,
}

impl CheckoutStep {
    pub const ALL: [CheckoutStep; 3] = [
        CheckoutStep::Order,
        CheckoutStep::Payment,
        CheckoutStep::Success,
    ];

    pub fn parse(step: &str) -> Option<Self> {
        match step {
            "order" => Some(CheckoutStep::Order),
            "payment" => Some(CheckoutStep::Payment),
            "success" => Some(CheckoutStep::Success),
            _ => None,
        }
    }

    /// Which step a page URL path belongs to, if any.
    pub fn from_path(path: &str) -> Option<Self> {
        if path.contains("checkout") {
            Some(CheckoutStep::Payment)
        } else if path.contains("success") {
            Some(CheckoutStep::Success)
        } else if path.contains("order-list") {
            Some(CheckoutStep::Order)
        } else {
            None
        }
    }

    fn index(self) -> usize {
        match self {
            CheckoutStep::Order => 0,
            CheckoutStep::Payment => 1,
            CheckoutStep::Success => 2,
        }
    }

    /// Completion percentage once this step is reached.
    pub fn percent(self) -> f64 {
        (self.index() + 1) as f64 / Self::ALL.len() as f64 * 100.0
    }
}

/// Set width and `aria-valuenow` on a progress bar.
pub fn set_progress(bar: &HtmlElement, step: CheckoutStep) {
    let pct = step.percent();
    if let Err(e) = bar.style().set_property("width", &format!("{}%", pct)) {
        log::warn!("Could not set progress width: {:?}", e);
    }
    let _ = bar.set_attribute("aria-valuenow", &pct.to_string());
}

/// Update the page's `.progress-bar` for a step name. Unknown step names are
/// ignored; a missing bar is logged.
pub fn update_progress(step: &str) {
    let Some(step) = CheckoutStep::parse(step) else {
        return;
    };
    match crate::dom::query_html(".progress-bar") {
        Some(bar) => set_progress(&bar, step),
        None => log::warn!("Progress bar element not found"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_is_two_thirds() {
        let pct = CheckoutStep::parse("payment").unwrap().percent();
        assert!((pct - 66.666_666).abs() < 0.01);
    }

    #[test]
    fn order_and_success_bounds() {
        assert!((CheckoutStep::Order.percent() - 33.333_333).abs() < 0.01);
        assert_eq!(CheckoutStep::Success.percent(), 100.0);
        assert_eq!(CheckoutStep::parse("shipping"), None);
    }

    #[test]
    fn path_mapping() {
        assert_eq!(
            CheckoutStep::from_path("/payment/order-checkout/3/"),
            Some(CheckoutStep::Payment)
        );
        assert_eq!(
            CheckoutStep::from_path("/payment/order-success/3/"),
            Some(CheckoutStep::Success)
        );
        assert_eq!(
            CheckoutStep::from_path("/payment/order-list/"),
            Some(CheckoutStep::Order)
        );
        assert_eq!(CheckoutStep::from_path("/about/"), None);
    }
}
