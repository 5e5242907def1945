use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use ecoshop_common::Secret;
use ecoshop_engine::{
    db_types::{OrderStatusType, PaymentStatusType},
    events::EventProducers,
    traits::GatewayStatus,
    OrderFlowApi,
};
use serde_json::Value;

use super::{
    helpers::{sample_order, send_request},
    mocks::{MockBackend, MockGateway},
};
use crate::{helpers::calculate_hmac, middleware::SignedCallbacks, routes::PaymentCallbackRoute};

const SECRET: &str = "rahasia-gateway";
const HEADER: &str = "X-Callback-Signature";
const PAYLOAD: &str = r#"{"order_id":"9b2f4c1e-0000-4000-8000-000000000001","transaction_status":"settlement"}"#;

fn configure(backend: MockBackend, gateway: MockGateway, hmac_checks: bool) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let api = OrderFlowApi::new(backend, gateway, EventProducers::default());
        cfg.service(
            web::scope("/payment")
                .wrap(SignedCallbacks::new(HEADER, Secret::new(SECRET.to_string()), hmac_checks))
                .service(PaymentCallbackRoute::<MockBackend, MockGateway>::new()),
        )
        .app_data(web::Data::new(api));
    }
}

fn callback_request(body: &str, signature: Option<&str>) -> TestRequest {
    let mut req = TestRequest::post().uri("/payment/callback").insert_header(("Content-Type", "application/json"));
    if let Some(signature) = signature {
        req = req.insert_header((HEADER, signature));
    }
    req.set_payload(body.to_string())
}

fn untouched_backend() -> MockBackend {
    let mut backend = MockBackend::new();
    backend.expect_fetch_order().never();
    backend.expect_confirm_payment().never();
    backend.expect_fail_payment().never();
    backend
}

#[actix_web::test]
async fn unsigned_callback_is_refused() {
    let _ = env_logger::try_init().ok();
    let req = callback_request(PAYLOAD, None);
    let err = send_request(req, configure(untouched_backend(), MockGateway::new(), true))
        .await
        .expect_err("Unsigned callbacks must be refused");
    assert_eq!(err, "No HMAC signature found.");
}

#[actix_web::test]
async fn forged_callback_is_refused() {
    let _ = env_logger::try_init().ok();
    let signature = calculate_hmac("not-the-secret", PAYLOAD.as_bytes());
    let req = callback_request(PAYLOAD, Some(&signature));
    let err = send_request(req, configure(untouched_backend(), MockGateway::new(), true))
        .await
        .expect_err("Forged callbacks must be refused");
    assert_eq!(err, "Invalid HMAC signature.");
}

#[actix_web::test]
async fn callback_body_altered_after_signing_is_refused() {
    let _ = env_logger::try_init().ok();
    let signature = calculate_hmac(SECRET, PAYLOAD.as_bytes());
    let altered = PAYLOAD.replace("settlement", "capture");
    for sig in [signature.as_str(), &signature[..signature.len() - 4]] {
        let req = callback_request(&altered, Some(sig));
        let err = send_request(req, configure(untouched_backend(), MockGateway::new(), true))
            .await
            .expect_err("Altered callbacks must be refused");
        assert_eq!(err, "Invalid HMAC signature.");
    }
}

#[actix_web::test]
async fn signed_callback_confirms_payment() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend.expect_fetch_order().returning(|_| Ok(Some(sample_order(PaymentStatusType::WaitingConfirmation))));
    backend.expect_confirm_payment().times(1).returning(|_| Ok(sample_order(PaymentStatusType::Confirmed)));
    backend.expect_fail_payment().never();
    let mut gateway = MockGateway::new();
    gateway.expect_check_status().times(1).returning(|_| {
        Ok(GatewayStatus {
            order_status: OrderStatusType::Processing,
            payment_status: PaymentStatusType::Confirmed,
        })
    });
    let signature = calculate_hmac(SECRET, PAYLOAD.as_bytes());
    let req = callback_request(PAYLOAD, Some(&signature));
    let (status, body) = send_request(req, configure(backend, gateway, true)).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let result: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(result["outcome"], "confirmed");
    assert_eq!(result["order"]["payment_status"], "Konfirmasi");
}

#[actix_web::test]
async fn repeated_callback_is_acknowledged_without_asking_the_gateway() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend.expect_fetch_order().returning(|_| Ok(Some(sample_order(PaymentStatusType::Confirmed))));
    backend.expect_confirm_payment().never();
    let mut gateway = MockGateway::new();
    gateway.expect_check_status().never();
    let signature = calculate_hmac(SECRET, PAYLOAD.as_bytes());
    let req = callback_request(PAYLOAD, Some(&signature));
    let (status, body) = send_request(req, configure(backend, gateway, true)).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let result: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(result["outcome"], "already_settled");
}

#[actix_web::test]
async fn callback_without_an_order_id() {
    let _ = env_logger::try_init().ok();
    let payload = r#"{"transaction_status":"settlement"}"#;
    let signature = calculate_hmac(SECRET, payload.as_bytes());
    let req = callback_request(payload, Some(&signature));
    let (status, body) =
        send_request(req, configure(untouched_backend(), MockGateway::new(), true)).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"payload callback tidak valid"}"#);
}

#[actix_web::test]
async fn callback_that_is_not_json() {
    let _ = env_logger::try_init().ok();
    let req = callback_request("order_id=123", None);
    let (status, body) =
        send_request(req, configure(untouched_backend(), MockGateway::new(), false)).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"payload callback tidak valid"}"#);
}

#[actix_web::test]
async fn pending_payment_leaves_the_order_alone() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend.expect_fetch_order().returning(|_| Ok(Some(sample_order(PaymentStatusType::WaitingConfirmation))));
    backend.expect_confirm_payment().never();
    backend.expect_fail_payment().never();
    let mut gateway = MockGateway::new();
    gateway.expect_check_status().returning(|_| {
        Ok(GatewayStatus {
            order_status: OrderStatusType::WaitingConfirmation,
            payment_status: PaymentStatusType::WaitingConfirmation,
        })
    });
    // signature checks disabled
    let req = callback_request(PAYLOAD, None);
    let (status, body) = send_request(req, configure(backend, gateway, false)).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let result: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(result["outcome"], "pending");
}
