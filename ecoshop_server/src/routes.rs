//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Every handler here awaits the engine, which awaits the database and
//! the payment gateway, so none of them block.
//!
//! Authentication and authorization happen upstream of this server. Routes take the acting user's id from the path.
use actix_web::{get, web, HttpResponse, Responder};
use ecoshop_engine::{
    db_types::OrderId,
    order_objects::{CreateCartOrderRequest, CreateOrderRequest},
    parse_order_status,
    traits::{
        CartDatabase,
        NotificationDatabase,
        NotificationTransport,
        OrderFlowDatabase,
        PaymentGatewayAdapter,
        VoucherDatabase,
    },
    CartApi,
    NotificationApi,
    OrderFlowApi,
    OrderFlowError,
    VoucherApi,
};
use log::*;
use serde_json::{json, Value};

use crate::{
    data_objects::{
        AddCartItemRequest,
        JsonResponse,
        OrderStatusUpdateRequest,
        ReduceCartItemRequest,
        StatusNotificationRequest,
    },
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(create_order => Post "/users/{user_id}/orders" impl OrderFlowDatabase, PaymentGatewayAdapter);
/// Route handler for buying a single product directly.
///
/// The body is a [`CreateOrderRequest`]. A `voucher_id` of `0` (or none at all) means no voucher. Manual payment
/// methods (`whatsapp`, `telegram`) return the stored order straight away; gateway methods also return whatever the
/// gateway wants the customer to do next.
pub async fn create_order<B, G>(
    path: web::Path<i64>,
    body: web::Json<CreateOrderRequest>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderFlowDatabase,
    G: PaymentGatewayAdapter,
{
    let user_id = path.into_inner();
    debug!("💻️ POST order for user {user_id}");
    let placement = api.create_order(user_id, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(placement))
}

route!(create_cart_order => Post "/users/{user_id}/orders/cart" impl OrderFlowDatabase, PaymentGatewayAdapter);
/// Route handler for checking out a selection of cart items. The body is a [`CreateCartOrderRequest`].
pub async fn create_cart_order<B, G>(
    path: web::Path<i64>,
    body: web::Json<CreateCartOrderRequest>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderFlowDatabase,
    G: PaymentGatewayAdapter,
{
    let user_id = path.into_inner();
    debug!("💻️ POST cart checkout for user {user_id}");
    let placement = api.create_order_from_cart(user_id, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(placement))
}

route!(order_by_id => Get "/orders/{order_id}" impl OrderFlowDatabase, PaymentGatewayAdapter);
pub async fn order_by_id<B, G>(
    path: web::Path<String>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderFlowDatabase,
    G: PaymentGatewayAdapter,
{
    let order_id = parse_order_id(path.into_inner())?;
    trace!("💻️ GET order {order_id}");
    let order = api.fetch_order(&order_id).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(confirm_payment => Post "/orders/{order_id}/confirm" impl OrderFlowDatabase, PaymentGatewayAdapter);
/// Route handler for an admin confirming a manual payment. Only orders still waiting for payment can be confirmed.
pub async fn confirm_payment<B, G>(
    path: web::Path<String>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderFlowDatabase,
    G: PaymentGatewayAdapter,
{
    let order_id = parse_order_id(path.into_inner())?;
    info!("💻️ Confirming payment for order {order_id}");
    let order = api.confirm_payment(&order_id).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(cancel_payment => Post "/orders/{order_id}/cancel" impl OrderFlowDatabase, PaymentGatewayAdapter);
/// Route handler for cancelling an order that is still waiting for payment. The reserved stock is given back.
pub async fn cancel_payment<B, G>(
    path: web::Path<String>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderFlowDatabase,
    G: PaymentGatewayAdapter,
{
    let order_id = parse_order_id(path.into_inner())?;
    info!("💻️ Cancelling payment for order {order_id}");
    let order = api.cancel_payment(&order_id).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(update_order_status => Put "/orders/{order_id}/status" impl OrderFlowDatabase, PaymentGatewayAdapter);
pub async fn update_order_status<B, G>(
    path: web::Path<String>,
    body: web::Json<OrderStatusUpdateRequest>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderFlowDatabase,
    G: PaymentGatewayAdapter,
{
    let order_id = parse_order_id(path.into_inner())?;
    let status = parse_order_status(&body.status)?;
    info!("💻️ Moving order {order_id} to {status}");
    let order = api.update_order_status(&order_id, status).await?;
    Ok(HttpResponse::Ok().json(order))
}

//----------------------------------------------   Payment callback  --------------------------------------------------
route!(payment_callback => Post "/callback" impl OrderFlowDatabase, PaymentGatewayAdapter);
/// Route handler for the payment gateway's callback.
///
/// The signature is checked by the HMAC middleware before this handler runs. Only the `order_id` in the payload is
/// used; the payment status itself always comes from asking the gateway.
pub async fn payment_callback<B, G>(
    body: web::Bytes,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderFlowDatabase,
    G: PaymentGatewayAdapter,
{
    trace!("💻️ Received payment callback");
    let payload = serde_json::from_slice::<Value>(body.as_ref()).map_err(|e| {
        debug!("💻️ Payment callback body is not JSON. {e}");
        OrderFlowError::InvalidCallbackPayload(String::from_utf8_lossy(body.as_ref()).into_owned())
    })?;
    let result = api.callback(&payload).await?;
    info!("💻️ Payment callback for {} handled: {:?}", result.order.order_id, result.outcome);
    Ok(HttpResponse::Ok().json(result))
}

//----------------------------------------------   Vouchers  ----------------------------------------------------
route!(claim_voucher => Post "/users/{user_id}/vouchers/{voucher_id}/claim" impl VoucherDatabase);
pub async fn claim_voucher<B: VoucherDatabase>(
    path: web::Path<(i64, i64)>,
    api: web::Data<VoucherApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let (user_id, voucher_id) = path.into_inner();
    debug!("💻️ User {user_id} is claiming voucher {voucher_id}");
    let claim = api.claim_voucher(user_id, voucher_id).await?;
    Ok(HttpResponse::Created().json(claim))
}

route!(voucher_eligibility => Get "/users/{user_id}/vouchers/{voucher_id}/eligibility" impl VoucherDatabase);
pub async fn voucher_eligibility<B: VoucherDatabase>(
    path: web::Path<(i64, i64)>,
    api: web::Data<VoucherApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let (user_id, voucher_id) = path.into_inner();
    let can_claim = api.can_claim(user_id, voucher_id).await?;
    Ok(HttpResponse::Ok().json(json!({ "user_id": user_id, "voucher_id": voucher_id, "can_claim": can_claim })))
}

route!(my_vouchers => Get "/users/{user_id}/vouchers" impl VoucherDatabase);
pub async fn my_vouchers<B: VoucherDatabase>(
    path: web::Path<i64>,
    api: web::Data<VoucherApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let claims = api.fetch_claims_for_user(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(claims))
}

//----------------------------------------------   Cart  ----------------------------------------------------
route!(my_cart => Get "/users/{user_id}/cart" impl CartDatabase);
pub async fn my_cart<B: CartDatabase>(
    path: web::Path<i64>,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let cart = api.fetch_cart(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(cart))
}

route!(add_cart_item => Post "/users/{user_id}/cart/items" impl CartDatabase);
pub async fn add_cart_item<B: CartDatabase>(
    path: web::Path<i64>,
    body: web::Json<AddCartItemRequest>,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let user_id = path.into_inner();
    let AddCartItemRequest { product_id, quantity } = body.into_inner();
    debug!("💻️ Adding {quantity} of product {product_id} to the cart of user {user_id}");
    let cart = api.add_item(user_id, product_id, quantity).await?;
    Ok(HttpResponse::Ok().json(cart))
}

route!(reduce_cart_item => Post "/users/{user_id}/cart/items/{item_id}/reduce" impl CartDatabase);
pub async fn reduce_cart_item<B: CartDatabase>(
    path: web::Path<(i64, i64)>,
    body: web::Json<ReduceCartItemRequest>,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let (user_id, item_id) = path.into_inner();
    let cart = api.reduce_item(user_id, item_id, body.quantity).await?;
    Ok(HttpResponse::Ok().json(cart))
}

route!(delete_cart_item => Delete "/users/{user_id}/cart/items/{item_id}" impl CartDatabase);
pub async fn delete_cart_item<B: CartDatabase>(
    path: web::Path<(i64, i64)>,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let (user_id, item_id) = path.into_inner();
    let cart = api.delete_item(user_id, item_id).await?;
    Ok(HttpResponse::Ok().json(cart))
}

//----------------------------------------------   Notifications  ----------------------------------------------------
route!(my_notifications => Get "/users/{user_id}/notifications" impl NotificationDatabase, NotificationTransport);
pub async fn my_notifications<B, T>(
    path: web::Path<i64>,
    api: web::Data<NotificationApi<B, T>>,
) -> Result<HttpResponse, ServerError>
where
    B: NotificationDatabase,
    T: NotificationTransport,
{
    let notifications = api.fetch_notifications_for_user(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(notifications))
}

route!(notify_payment_status => Post "/orders/{order_id}/notifications/payment" impl NotificationDatabase, NotificationTransport);
/// Route handler for telling a customer about the payment status of an order. Unknown statuses are rejected with
/// `Status pesanan tidak valid` before anything is sent or stored.
pub async fn notify_payment_status<B, T>(
    path: web::Path<String>,
    body: web::Json<StatusNotificationRequest>,
    api: web::Data<NotificationApi<B, T>>,
) -> Result<HttpResponse, ServerError>
where
    B: NotificationDatabase,
    T: NotificationTransport,
{
    let order_id = parse_order_id(path.into_inner())?;
    let receipt = api.notify_payment_status(body.user_id, &order_id, &body.status).await?;
    Ok(HttpResponse::Ok().json(notification_result(receipt.delivered, receipt.notification.id)))
}

route!(notify_order_status => Post "/orders/{order_id}/notifications/order" impl NotificationDatabase, NotificationTransport);
/// Route handler for telling a customer about the fulfilment status of an order. Unknown statuses are rejected with
/// `Status pengiriman tidak valid` before anything is sent or stored.
pub async fn notify_order_status<B, T>(
    path: web::Path<String>,
    body: web::Json<StatusNotificationRequest>,
    api: web::Data<NotificationApi<B, T>>,
) -> Result<HttpResponse, ServerError>
where
    B: NotificationDatabase,
    T: NotificationTransport,
{
    let order_id = parse_order_id(path.into_inner())?;
    let receipt = api.notify_order_status(body.user_id, &order_id, &body.status).await?;
    Ok(HttpResponse::Ok().json(notification_result(receipt.delivered, receipt.notification.id)))
}

fn notification_result(delivered: bool, notification_id: i64) -> Value {
    let message = if delivered { "Notifikasi terkirim" } else { "Notifikasi disimpan" };
    json!({ "notification_id": notification_id, "delivered": delivered, "result": JsonResponse::success(message) })
}

fn parse_order_id(s: String) -> Result<OrderId, ServerError> {
    s.parse::<OrderId>().map_err(|e| ServerError::InvalidRequestPath(e.to_string()))
}
