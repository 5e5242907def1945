use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use ecoshop_engine::{
    events::EventProducers,
    CartApi,
    NotificationApi,
    OrderFlowApi,
    OrderFlowConfig,
    RetryPolicy,
    SqliteDatabase,
    VoucherApi,
};
use log::*;

use crate::{
    config::ServerConfig,
    errors::ServerError,
    gateway::SandboxGateway,
    integrations::notifications::create_notification_event_handlers,
    middleware::SignedCallbacks,
    routes::{
        health,
        AddCartItemRoute,
        CancelPaymentRoute,
        ClaimVoucherRoute,
        ConfirmPaymentRoute,
        CreateCartOrderRoute,
        CreateOrderRoute,
        DeleteCartItemRoute,
        MyCartRoute,
        MyNotificationsRoute,
        MyVouchersRoute,
        NotifyOrderStatusRoute,
        NotifyPaymentStatusRoute,
        OrderByIdRoute,
        PaymentCallbackRoute,
        ReduceCartItemRoute,
        UpdateOrderStatusRoute,
        VoucherEligibilityRoute,
    },
    transport::LoggingTransport,
};

const INITIAL_NOTIFICATION_BACKOFF: Duration = Duration::from_millis(250);

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, config.max_db_connections)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.run_migrations().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let gateway = SandboxGateway::new(config.gateway.sandbox_settlement);
    info!("💳️ Using the sandbox payment gateway. Payments settle as '{}'", config.gateway.sandbox_settlement);
    let notifier = NotificationApi::new(db.clone(), LoggingTransport, retry_policy(&config));
    let handlers = create_notification_event_handlers(notifier, config.event_buffer_size);
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let srv = create_server_instance(config, db, gateway, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    gateway: SandboxGateway,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let flow_config = OrderFlowConfig { gateway_timeout: config.gateway_timeout, ..OrderFlowConfig::default() };
    let retry = retry_policy(&config);
    let hmac_config = config.gateway.clone();
    let srv = HttpServer::new(move || {
        let orders_api = OrderFlowApi::new(db.clone(), gateway.clone(), producers.clone()).with_config(flow_config);
        let orders_api = web::Data::new(orders_api);
        let vouchers_api = VoucherApi::new(db.clone());
        let cart_api = CartApi::new(db.clone());
        let notification_api = NotificationApi::new(db.clone(), LoggingTransport, retry);
        let api_scope = web::scope("/api")
            .service(CreateOrderRoute::<SqliteDatabase, SandboxGateway>::new())
            .service(CreateCartOrderRoute::<SqliteDatabase, SandboxGateway>::new())
            .service(OrderByIdRoute::<SqliteDatabase, SandboxGateway>::new())
            .service(ConfirmPaymentRoute::<SqliteDatabase, SandboxGateway>::new())
            .service(CancelPaymentRoute::<SqliteDatabase, SandboxGateway>::new())
            .service(UpdateOrderStatusRoute::<SqliteDatabase, SandboxGateway>::new())
            .service(ClaimVoucherRoute::<SqliteDatabase>::new())
            .service(VoucherEligibilityRoute::<SqliteDatabase>::new())
            .service(MyVouchersRoute::<SqliteDatabase>::new())
            .service(MyCartRoute::<SqliteDatabase>::new())
            .service(AddCartItemRoute::<SqliteDatabase>::new())
            .service(ReduceCartItemRoute::<SqliteDatabase>::new())
            .service(DeleteCartItemRoute::<SqliteDatabase>::new())
            .service(MyNotificationsRoute::<SqliteDatabase, LoggingTransport>::new())
            .service(NotifyPaymentStatusRoute::<SqliteDatabase, LoggingTransport>::new())
            .service(NotifyOrderStatusRoute::<SqliteDatabase, LoggingTransport>::new());
        let payment_scope = web::scope("/payment")
            .wrap(SignedCallbacks::new(
                &hmac_config.hmac_header,
                hmac_config.hmac_secret.clone(),
                hmac_config.hmac_checks,
            ))
            .service(PaymentCallbackRoute::<SqliteDatabase, SandboxGateway>::new());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("ecoshop::access_log"))
            .app_data(orders_api)
            .app_data(web::Data::new(vouchers_api))
            .app_data(web::Data::new(cart_api))
            .app_data(web::Data::new(notification_api))
            .service(health)
            .service(api_scope)
            .service(payment_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

fn retry_policy(config: &ServerConfig) -> RetryPolicy {
    RetryPolicy::new(config.notification_retries, INITIAL_NOTIFICATION_BACKOFF)
}
