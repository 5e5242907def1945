use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use chrono::Utc;
use ecoshop_engine::{
    db_types::{Notification, PaymentStatusType, Rank},
    NotificationApi,
    RetryPolicy,
};
use serde_json::{json, Value};

use super::{
    helpers::{sample_order, sample_user, send_request},
    mocks::MockBackend,
};
use crate::{
    routes::{NotifyOrderStatusRoute, NotifyPaymentStatusRoute},
    transport::LoggingTransport,
};

const ORDER_ID: &str = "9b2f4c1e-0000-4000-8000-000000000001";

fn configure(backend: MockBackend) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let api = NotificationApi::new(backend, LoggingTransport, RetryPolicy::default());
        cfg.service(
            web::scope("/api")
                .service(NotifyPaymentStatusRoute::<MockBackend, LoggingTransport>::new())
                .service(NotifyOrderStatusRoute::<MockBackend, LoggingTransport>::new()),
        )
        .app_data(web::Data::new(api));
    }
}

#[actix_web::test]
async fn invalid_payment_status() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend.expect_record_notification().never();
    let req = TestRequest::post()
        .uri(&format!("/api/orders/{ORDER_ID}/notifications/payment"))
        .set_json(json!({ "user_id": 7, "status": "Lunas" }));
    let (status, body) = send_request(req, configure(backend)).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"Status pesanan tidak valid"}"#);
}

#[actix_web::test]
async fn order_status_is_recorded() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend.expect_fetch_user().returning(|_| Ok(Some(sample_user(Rank::Bronze))));
    backend.expect_fetch_order().returning(|_| Ok(Some(sample_order(PaymentStatusType::Confirmed))));
    backend
        .expect_record_notification()
        .withf(|n| n.user_id == 7 && n.title == "Pesanan Dikirim" && n.body.contains("ECO-20240301-AB12CD"))
        .times(1)
        .returning(|n| {
            Ok(Notification {
                id: 31,
                order_id: n.order_id,
                user_id: n.user_id,
                title: n.title,
                body: n.body,
                created_at: Utc::now(),
            })
        });
    let req = TestRequest::post()
        .uri(&format!("/api/orders/{ORDER_ID}/notifications/order"))
        .set_json(json!({ "user_id": 7, "status": "Pengiriman" }));
    let (status, body) = send_request(req, configure(backend)).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let result: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(result["notification_id"], 31);
    // the sample user has no device token
    assert_eq!(result["delivered"], false);
}
