use actix_web::{
    body::MessageBody,
    http::StatusCode,
    test,
    test::TestRequest,
    web::ServiceConfig,
    App,
};
use chrono::{TimeZone, Utc};
use ecoshop_engine::db_types::{
    Cart,
    CartItem,
    Order,
    OrderCode,
    OrderId,
    OrderStatusType,
    PaymentMethod,
    PaymentStatusType,
    Rank,
    Rupiah,
    User,
    Voucher,
    VoucherCategory,
    VoucherStatus,
};
use log::debug;

/// Sends `req` to an app set up by `configure`, returning the status and body of the response. Errors raised by
/// middleware, before a handler could turn them into a response, come back as `Err`.
pub async fn send_request<F>(req: TestRequest, configure: F) -> Result<(StatusCode, String), String>
where F: FnOnce(&mut ServiceConfig) {
    let app = App::new().configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    let (_, res) = test::try_call_service(&service, req.to_request()).await.map_err(|e| e.to_string())?.into_parts();
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    Ok((status, body))
}

pub fn sample_order(payment_status: PaymentStatusType) -> Order {
    let status = match payment_status {
        PaymentStatusType::WaitingConfirmation => OrderStatusType::WaitingConfirmation,
        PaymentStatusType::Confirmed => OrderStatusType::Processing,
        PaymentStatusType::Failed => OrderStatusType::Failed,
    };
    let timestamp = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
    Order {
        id: 1,
        order_id: OrderId("9b2f4c1e-0000-4000-8000-000000000001".into()),
        order_code: OrderCode("ECO-20240301-AB12CD".into()),
        user_id: 7,
        address_id: 3,
        voucher_id: None,
        note: None,
        total_gram_plastic: 30,
        total_exp: 6,
        total_quantity: 2,
        grand_total_price: Rupiah::from(10_000),
        shipment_fee: Rupiah::from(24_000),
        admin_fee: Rupiah::from(2_000),
        total_discount: Rupiah::from(0),
        total_amount_paid: Rupiah::from(36_000),
        status,
        payment_status,
        payment_method: PaymentMethod::Qris,
        status_updated_at: timestamp,
        created_at: timestamp,
        details: vec![],
    }
}

pub fn sample_user(level: Rank) -> User {
    let timestamp = Utc.with_ymd_and_hms(2024, 1, 15, 8, 0, 0).unwrap();
    User {
        id: 7,
        name: "Sari".into(),
        email: "sari@ecoshop.test".into(),
        level,
        exp: 0,
        total_gram: 0,
        device_token: None,
        created_at: timestamp,
        updated_at: timestamp,
    }
}

pub fn sample_voucher(category: VoucherCategory) -> Voucher {
    let now = Utc::now();
    Voucher {
        id: 11,
        name: "Hemat Plastik".into(),
        discount: Rupiah::from(1_000),
        min_purchase: Rupiah::from(0),
        stock: 5,
        category,
        status: VoucherStatus::Active,
        start_date: now - chrono::Duration::days(1),
        end_date: now + chrono::Duration::days(1),
        created_at: now - chrono::Duration::days(2),
    }
}

pub fn sample_cart() -> Cart {
    Cart {
        id: 2,
        user_id: 7,
        grand_total: Rupiah::from(15_000),
        items: vec![CartItem { id: 21, cart_id: 2, product_id: 5, quantity: 3, total_price: Rupiah::from(15_000) }],
    }
}
