use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use chrono::Utc;
use ecoshop_engine::{
    db_types::{Rank, VoucherCategory, VoucherClaim},
    VoucherApi,
};
use serde_json::Value;

use super::{
    helpers::{sample_user, sample_voucher, send_request},
    mocks::MockBackend,
};
use crate::routes::{ClaimVoucherRoute, VoucherEligibilityRoute};

fn configure(backend: MockBackend) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.service(
            web::scope("/api")
                .service(ClaimVoucherRoute::<MockBackend>::new())
                .service(VoucherEligibilityRoute::<MockBackend>::new()),
        )
        .app_data(web::Data::new(VoucherApi::new(backend)));
    }
}

fn backend(level: Rank, category: VoucherCategory) -> MockBackend {
    let mut backend = MockBackend::new();
    backend.expect_fetch_voucher().returning(move |_| Ok(Some(sample_voucher(category))));
    backend.expect_fetch_user().returning(move |_| Ok(Some(sample_user(level))));
    backend
}

fn claim() -> VoucherClaim {
    VoucherClaim { id: 1, user_id: 7, voucher_id: 11, created_at: Utc::now() }
}

#[actix_web::test]
async fn claim_voucher() {
    let _ = env_logger::try_init().ok();
    let mut backend = backend(Rank::Silver, VoucherCategory::Silver);
    backend.expect_fetch_claim().returning(|_, _| Ok(None));
    backend.expect_claim_voucher().withf(|user, voucher, _| *user == 7 && *voucher == 11).times(1).returning(
        |_, _, _| Ok(claim()),
    );
    let req = TestRequest::post().uri("/api/users/7/vouchers/11/claim");
    let (status, body) = send_request(req, configure(backend)).await.expect("Request failed");
    assert_eq!(status, StatusCode::CREATED);
    let claim: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(claim["voucher_id"], 11);
}

#[actix_web::test]
async fn claim_voucher_twice() {
    let _ = env_logger::try_init().ok();
    let mut backend = backend(Rank::Gold, VoucherCategory::AllCustomer);
    backend.expect_fetch_claim().returning(|_, _| Ok(Some(claim())));
    backend.expect_claim_voucher().never();
    let req = TestRequest::post().uri("/api/users/7/vouchers/11/claim");
    let (status, body) = send_request(req, configure(backend)).await.expect("Request failed");
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body, r#"{"error":"kupon telah diklaim"}"#);
}

#[actix_web::test]
async fn claim_voucher_above_rank() {
    let _ = env_logger::try_init().ok();
    let mut backend = backend(Rank::Bronze, VoucherCategory::Gold);
    backend.expect_fetch_claim().returning(|_, _| Ok(None));
    backend.expect_claim_voucher().never();
    let req = TestRequest::post().uri("/api/users/7/vouchers/11/claim");
    let (status, body) = send_request(req, configure(backend)).await.expect("Request failed");
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, r#"{"error":"level anda masih belum mencukupi"}"#);
}

#[actix_web::test]
async fn eligibility() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::get().uri("/api/users/7/vouchers/11/eligibility");
    let (status, body) =
        send_request(req, configure(backend(Rank::Silver, VoucherCategory::Gold))).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"can_claim":false,"user_id":7,"voucher_id":11}"#);
}
