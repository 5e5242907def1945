use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use ecoshop_engine::{traits::StoreError, CartApi};
use serde_json::{json, Value};

use super::{
    helpers::{sample_cart, send_request},
    mocks::MockBackend,
};
use crate::routes::{AddCartItemRoute, DeleteCartItemRoute, MyCartRoute, ReduceCartItemRoute};

fn configure(backend: MockBackend) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.service(
            web::scope("/api")
                .service(MyCartRoute::<MockBackend>::new())
                .service(AddCartItemRoute::<MockBackend>::new())
                .service(ReduceCartItemRoute::<MockBackend>::new())
                .service(DeleteCartItemRoute::<MockBackend>::new()),
        )
        .app_data(web::Data::new(CartApi::new(backend)));
    }
}

#[actix_web::test]
async fn fetch_cart() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend.expect_fetch_cart().withf(|user| *user == 7).returning(|_| Ok(sample_cart()));
    let req = TestRequest::get().uri("/api/users/7/cart");
    let (status, body) = send_request(req, configure(backend)).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let cart: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(cart["grand_total"], 15_000);
    assert_eq!(cart["items"][0]["quantity"], 3);
}

#[actix_web::test]
async fn add_item() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend
        .expect_add_cart_item()
        .withf(|user, product, qty| (*user, *product, *qty) == (7, 5, 3))
        .times(1)
        .returning(|_, _, _| Ok(sample_cart()));
    let req = TestRequest::post().uri("/api/users/7/cart/items").set_json(json!({ "product_id": 5, "quantity": 3 }));
    let (status, _) = send_request(req, configure(backend)).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn reduce_by_nothing() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend.expect_reduce_cart_item().never();
    let req = TestRequest::post().uri("/api/users/7/cart/items/21/reduce").set_json(json!({ "quantity": 0 }));
    let (status, body) = send_request(req, configure(backend)).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"jumlah tidak valid"}"#);
}

#[actix_web::test]
async fn reduce_by_too_much() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend
        .expect_reduce_cart_item()
        .returning(|_, item_id, requested| Err(StoreError::CartQuantityExceeded { item_id, requested, available: 3 }));
    let req = TestRequest::post().uri("/api/users/7/cart/items/21/reduce").set_json(json!({ "quantity": 4 }));
    let (status, body) = send_request(req, configure(backend)).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"jumlah melebihi jumlah barang di keranjang"}"#);
}

#[actix_web::test]
async fn delete_missing_item() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend.expect_delete_cart_item().returning(|_, item_id| Err(StoreError::CartItemNotFound(item_id)));
    let req = TestRequest::delete().uri("/api/users/7/cart/items/404");
    let (status, body) = send_request(req, configure(backend)).await.expect("Request failed");
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"item keranjang tidak ditemukan"}"#);
}
