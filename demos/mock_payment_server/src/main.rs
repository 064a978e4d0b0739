use std::collections::HashSet;
use std::env;
use std::io::Read;

use serde::Deserialize;
use serde_json::json;
use tiny_http::{Header, Method, Request, Response, Server};

/// Body of `POST /payment/khalti-verify/`.
#[derive(Deserialize)]
struct VerifyBody {
    token: String,
    order_id: serde_json::Value,
}

fn order_key(id: &serde_json::Value) -> String {
    match id {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn cors_headers() -> Vec<Header> {
    vec![
        Header::from_bytes("Access-Control-Allow-Origin", "*").unwrap(),
        Header::from_bytes("Access-Control-Allow-Methods", "GET, POST, OPTIONS").unwrap(),
        Header::from_bytes("Access-Control-Allow-Headers", "Content-Type, X-CSRFToken").unwrap(),
    ]
}

fn respond_json(request: Request, status: u16, body: serde_json::Value) -> std::io::Result<()> {
    let mut resp = Response::from_string(body.to_string())
        .with_status_code(status)
        .with_header(Header::from_bytes("Content-Type", "application/json").unwrap());
    for h in cors_headers() {
        resp.add_header(h);
    }
    request.respond(resp)
}

fn has_csrf(request: &Request) -> bool {
    request
        .headers()
        .iter()
        .any(|h| h.field.equiv("X-CSRFToken") && !h.value.as_str().is_empty())
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let port = env::var("MOCK_PAYMENT_SERVER_PORT").unwrap_or_else(|_| "8000".to_string());
    let addr = format!("127.0.0.1:{}", port);
    let server = Server::http(&addr)?;
    println!("Running on http://{}", addr);

    let mut paid: HashSet<String> = HashSet::new();

    for mut request in server.incoming_requests() {
        // 1) Preflight
        if request.method() == &Method::Options {
            let mut resp = Response::empty(204);
            for h in cors_headers() {
                resp.add_header(h);
            }
            request.respond(resp)?;
            continue;
        }

        let url = request.url().to_string();
        let method = request.method().clone();

        // 2) Routes
        match (&method, url.as_str()) {
            (Method::Post, "/payment/khalti-verify/") => {
                if !has_csrf(&request) {
                    let body = json!({ "success": false, "message": "CSRF token missing" });
                    respond_json(request, 403, body)?;
                    continue;
                }
                let mut body = String::new();
                request.as_reader().read_to_string(&mut body)?;
                match serde_json::from_str::<VerifyBody>(&body) {
                    // "fail" lets the demo page exercise the rejection path.
                    Ok(v) if !v.token.is_empty() && v.token != "fail" => {
                        let order = order_key(&v.order_id);
                        println!("Verified token for order {}", order);
                        paid.insert(order);
                        respond_json(request, 200, json!({ "success": true }))?;
                    }
                    Ok(_) => {
                        let body = json!({ "success": false, "message": "Invalid token" });
                        respond_json(request, 200, body)?;
                    }
                    Err(e) => {
                        let body = json!({ "success": false, "message": e.to_string() });
                        respond_json(request, 400, body)?;
                    }
                }
            }

            (Method::Get, path) if path.starts_with("/payment/payment-status/") => {
                let id = path
                    .trim_start_matches("/payment/payment-status/")
                    .trim_end_matches('/');
                if id.is_empty() {
                    let body = json!({ "status": "error", "message": "Order not found" });
                    respond_json(request, 404, body)?;
                } else {
                    let is_paid = paid.contains(id);
                    respond_json(request, 200, json!({ "status": "success", "is_paid": is_paid }))?;
                }
            }

            (Method::Get, path) if path.starts_with("/payment/order-success/") => {
                let id = path
                    .trim_start_matches("/payment/order-success/")
                    .trim_end_matches('/');
                let html = format!("<h1>Order {} paid</h1>", id);
                let resp = Response::from_string(html)
                    .with_header(Header::from_bytes("Content-Type", "text/html").unwrap());
                request.respond(resp)?;
            }

            // 404 fallback
            _ => {
                let mut resp = Response::from_string("Not Found").with_status_code(404);
                for h in cors_headers() {
                    resp.add_header(h);
                }
                request.respond(resp)?;
            }
        }
    }

    Ok(())
}
