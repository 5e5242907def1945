use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use chrono::Utc;
use ecoshop_engine::{
    db_types::{Address, OrderId, PaymentMethod, PaymentStatusType, Product, Rupiah},
    events::EventProducers,
    traits::{GatewayInstruction, StoreError},
    OrderFlowApi,
};
use serde_json::{json, Value};

use super::{
    helpers::{sample_order, send_request},
    mocks::{MockBackend, MockGateway},
};
use crate::routes::{
    CancelPaymentRoute,
    ConfirmPaymentRoute,
    CreateOrderRoute,
    OrderByIdRoute,
    UpdateOrderStatusRoute,
};

const ORDER_ID: &str = "9b2f4c1e-0000-4000-8000-000000000001";

fn configure(backend: MockBackend, gateway: MockGateway) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let api = OrderFlowApi::new(backend, gateway, EventProducers::default());
        cfg.service(
            web::scope("/api")
                .service(CreateOrderRoute::<MockBackend, MockGateway>::new())
                .service(OrderByIdRoute::<MockBackend, MockGateway>::new())
                .service(ConfirmPaymentRoute::<MockBackend, MockGateway>::new())
                .service(CancelPaymentRoute::<MockBackend, MockGateway>::new())
                .service(UpdateOrderStatusRoute::<MockBackend, MockGateway>::new()),
        )
        .app_data(web::Data::new(api));
    }
}

/// A backend that hands out fresh identifiers and knows address 3, which belongs to `owner`.
fn backend_with_address(owner: i64) -> MockBackend {
    let mut backend = MockBackend::new();
    backend.expect_order_id_exists().returning(|_| Ok(false));
    backend.expect_order_code_exists().returning(|_| Ok(false));
    backend.expect_fetch_address().returning(move |id| {
        Ok(Some(Address {
            id,
            user_id: owner,
            recipient_name: "Sari".into(),
            phone: "081234567890".into(),
            full_address: "Jl. Merdeka No. 1, Bandung".into(),
        }))
    });
    backend
}

fn order_body(method: &str) -> Value {
    json!({ "address_id": 3, "voucher_id": 0, "payment_method": method, "product_id": 5, "quantity": 2 })
}

#[actix_web::test]
async fn fetch_order() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend
        .expect_fetch_order()
        .withf(|id| id.as_str() == ORDER_ID)
        .returning(|_| Ok(Some(sample_order(PaymentStatusType::WaitingConfirmation))));
    let req = TestRequest::get().uri(&format!("/api/orders/{ORDER_ID}"));
    let (status, body) = send_request(req, configure(backend, MockGateway::new())).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let order: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(order["order_code"], "ECO-20240301-AB12CD");
    assert_eq!(order["total_amount_paid"], 36_000);
    assert_eq!(order["payment_status"], "Menunggu Konfirmasi");
}

#[actix_web::test]
async fn fetch_missing_order() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend.expect_fetch_order().returning(|_| Ok(None));
    let req = TestRequest::get().uri("/api/orders/does-not-exist");
    let (status, body) = send_request(req, configure(backend, MockGateway::new())).await.expect("Request failed");
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"pesanan tidak ditemukan"}"#);
}

#[actix_web::test]
async fn order_with_someone_elses_address() {
    let _ = env_logger::try_init().ok();
    let mut backend = backend_with_address(99);
    backend.expect_insert_order().never();
    let req = TestRequest::post().uri("/api/users/7/orders").set_json(order_body("whatsapp"));
    let (status, body) = send_request(req, configure(backend, MockGateway::new())).await.expect("Request failed");
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"alamat tidak ditemukan"}"#);
}

#[actix_web::test]
async fn order_with_invalid_payment_method() {
    let _ = env_logger::try_init().ok();
    let mut backend = backend_with_address(7);
    backend.expect_insert_order().never();
    let req = TestRequest::post().uri("/api/users/7/orders").set_json(order_body("cash"));
    let (status, body) = send_request(req, configure(backend, MockGateway::new())).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"jenis pembayaran tidak valid"}"#);
}

#[actix_web::test]
async fn gateway_order_returns_the_instruction() {
    let _ = env_logger::try_init().ok();
    let mut backend = backend_with_address(7);
    backend.expect_fetch_product().returning(|id| {
        Ok(Some(Product {
            id,
            name: "Sabun Batang".into(),
            price: Rupiah::from(5_000),
            discount: Rupiah::from(0),
            stock: 10,
            gram_plastic: 15,
            exp: 3,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }))
    });
    backend
        .expect_insert_order()
        .withf(|order| order.total_amount_paid() == Rupiah::from(36_000))
        .times(1)
        .returning(|_| Ok(sample_order(PaymentStatusType::WaitingConfirmation)));
    let mut gateway = MockGateway::new();
    gateway
        .expect_process()
        .withf(|amount, _, method| *amount == Rupiah::from(36_000) && *method == PaymentMethod::Qris)
        .times(1)
        .returning(|_, _, _| Ok(GatewayInstruction(json!({ "qr_string": "00020101021226" }))));
    let req = TestRequest::post().uri("/api/users/7/orders").set_json(order_body("qris"));
    let (status, body) = send_request(req, configure(backend, gateway)).await.expect("Request failed");
    assert_eq!(status, StatusCode::CREATED);
    let placement: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(placement["payment_flow"], "gateway");
    assert_eq!(placement["instruction"]["qr_string"], "00020101021226");
    assert_eq!(placement["order"]["order_id"], ORDER_ID);
}

#[actix_web::test]
async fn confirming_a_settled_payment() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend.expect_confirm_payment().returning(|id| {
        Err(StoreError::PaymentAlreadySettled(OrderId(id.as_str().to_string()), PaymentStatusType::Failed))
    });
    let req = TestRequest::post().uri(&format!("/api/orders/{ORDER_ID}/confirm"));
    let (status, body) = send_request(req, configure(backend, MockGateway::new())).await.expect("Request failed");
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body, r#"{"error":"status pembayaran pesanan sudah Gagal"}"#);
}

#[actix_web::test]
async fn cancel_payment() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend.expect_fail_payment().times(1).returning(|_| Ok(sample_order(PaymentStatusType::Failed)));
    let req = TestRequest::post().uri(&format!("/api/orders/{ORDER_ID}/cancel"));
    let (status, body) = send_request(req, configure(backend, MockGateway::new())).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let order: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(order["status"], "Gagal");
    assert_eq!(order["payment_status"], "Gagal");
}

#[actix_web::test]
async fn unknown_fulfilment_status_is_rejected() {
    let _ = env_logger::try_init().ok();
    // no expectations: the backend must not be touched
    let backend = MockBackend::new();
    let req =
        TestRequest::put().uri(&format!("/api/orders/{ORDER_ID}/status")).set_json(json!({ "status": "Dikemas" }));
    let (status, body) = send_request(req, configure(backend, MockGateway::new())).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"Status pengiriman tidak valid"}"#);
}

#[actix_web::test]
async fn skipping_a_fulfilment_step_is_rejected() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend.expect_fetch_order().returning(|_| Ok(Some(sample_order(PaymentStatusType::Confirmed))));
    backend.expect_update_order_status().never();
    let req =
        TestRequest::put().uri(&format!("/api/orders/{ORDER_ID}/status")).set_json(json!({ "status": "Selesai" }));
    let (status, body) = send_request(req, configure(backend, MockGateway::new())).await.expect("Request failed");
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body, r#"{"error":"status pesanan tidak dapat diubah dari Proses ke Selesai"}"#);
}
