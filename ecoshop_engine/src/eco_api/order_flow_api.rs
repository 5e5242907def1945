use std::{fmt::Debug, time::Duration};

use chrono::Utc;
use log::*;
use serde_json::Value;

use crate::{
    db_types::{
        CartCleanup,
        NewOrder,
        Order,
        OrderCode,
        OrderId,
        OrderStatusType,
        PaymentMethod,
        PaymentStatusType,
        StatusUpdate,
        Voucher,
    },
    eco_api::{
        errors::OrderFlowError,
        order_objects::{
            CallbackOutcome,
            CallbackResult,
            CreateCartOrderRequest,
            CreateOrderRequest,
            OrderPlacement,
        },
    },
    events::{EventProducers, OrderCreatedEvent, OrderStatusChangedEvent},
    helpers::generate_order_code,
    traits::{OrderFlowDatabase, PaymentGatewayAdapter, StoreError},
};

#[derive(Debug, Clone, Copy)]
pub struct OrderFlowConfig {
    /// How long to wait for the payment gateway before giving up on a call.
    pub gateway_timeout: Duration,
    /// How many random order ids (and codes) to try before giving up on finding an unused one.
    pub max_id_attempts: usize,
}

impl Default for OrderFlowConfig {
    fn default() -> Self {
        Self { gateway_timeout: Duration::from_secs(30), max_id_attempts: 5 }
    }
}

/// `OrderFlowApi` is the primary API for placing orders and reconciling their payments.
///
/// Order placement validates the request, then hands a fully priced [`NewOrder`] to the backend, which stores it
/// together with the stock reservation, the cart cleanup and the voucher claim consumption as one unit of work. Only
/// after that unit has committed is the payment gateway involved.
///
/// Payment settlement (confirmation, cancellation and the gateway callback) only ever moves a payment out of
/// `Menunggu Konfirmasi`. A settled payment is never settled again, so loyalty points are accrued at most once and
/// stock is given back at most once.
pub struct OrderFlowApi<B, G> {
    db: B,
    gateway: G,
    producers: EventProducers,
    config: OrderFlowConfig,
}

impl<B, G> Debug for OrderFlowApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi ({:?})", self.config)
    }
}

impl<B, G> OrderFlowApi<B, G> {
    pub fn new(db: B, gateway: G, producers: EventProducers) -> Self {
        Self { db, gateway, producers, config: OrderFlowConfig::default() }
    }

    pub fn with_config(mut self, config: OrderFlowConfig) -> Self {
        self.config = config;
        self
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B, G> OrderFlowApi<B, G>
where
    B: OrderFlowDatabase,
    G: PaymentGatewayAdapter,
{
    /// Places an order for a single product on behalf of `user_id`.
    ///
    /// If the product is sitting in the user's cart, it is taken out of the cart as part of the same unit of work.
    pub async fn create_order(
        &self,
        user_id: i64,
        request: CreateOrderRequest,
    ) -> Result<OrderPlacement, OrderFlowError> {
        let (order_id, order_code) = self.new_identifiers().await?;
        self.check_address(user_id, request.address_id).await?;
        let voucher = self.fetch_voucher(request.voucher()).await?;
        let method = parse_payment_method(&request.payment_method)?;
        if request.quantity <= 0 {
            return Err(OrderFlowError::InvalidQuantity(request.quantity));
        }
        let product = self
            .db
            .fetch_product(request.product_id)
            .await
            .map_err(|e| OrderFlowError::from_store("gagal mengambil produk", e))?
            .ok_or(OrderFlowError::ProductNotFound(request.product_id))?;
        if product.stock < request.quantity {
            debug!("🛒 Product {} has {} in stock. {} requested", product.id, product.stock, request.quantity);
            return Err(OrderFlowError::InsufficientStock(product.id));
        }
        let mut order = NewOrder::new(order_id, order_code, user_id, request.address_id, method)
            .with_note(request.note)
            .with_cart_cleanup(CartCleanup::RemoveProduct(product.id));
        order.add_line(&product, request.quantity).ok_or(OrderFlowError::InvalidQuantity(request.quantity))?;
        self.place_order(order, voucher).await
    }

    /// Checks out the given items from the user's cart. Every item must be in the user's cart, and every one of them
    /// is removed from the cart as part of the same unit of work that stores the order.
    pub async fn create_order_from_cart(
        &self,
        user_id: i64,
        request: CreateCartOrderRequest,
    ) -> Result<OrderPlacement, OrderFlowError> {
        let item_ids = request.unique_item_ids();
        if item_ids.is_empty() {
            return Err(OrderFlowError::EmptyOrder);
        }
        let (order_id, order_code) = self.new_identifiers().await?;
        self.check_address(user_id, request.address_id).await?;
        let voucher = self.fetch_voucher(request.voucher()).await?;
        let method = parse_payment_method(&request.payment_method)?;
        let items = self
            .db
            .fetch_cart_items(user_id, &item_ids)
            .await
            .map_err(|e| OrderFlowError::from_store("gagal mengambil keranjang", e))?;
        let mut order = NewOrder::new(order_id, order_code, user_id, request.address_id, method)
            .with_note(request.note)
            .with_cart_cleanup(CartCleanup::ConsumeItems(item_ids));
        for item in items {
            let product = self
                .db
                .fetch_product(item.product_id)
                .await
                .map_err(|e| OrderFlowError::from_store("gagal mengambil produk", e))?
                .ok_or(OrderFlowError::ProductNotFound(item.product_id))?;
            if product.stock < item.quantity {
                debug!("🛒 Product {} has {} in stock. {} in cart", product.id, product.stock, item.quantity);
                return Err(OrderFlowError::InsufficientStock(product.id));
            }
            order.add_line(&product, item.quantity).ok_or(OrderFlowError::InvalidQuantity(item.quantity))?;
        }
        self.place_order(order, voucher).await
    }

    /// Fetches the order, including its detail lines.
    pub async fn fetch_order(&self, order_id: &OrderId) -> Result<Order, OrderFlowError> {
        self.db
            .fetch_order(order_id)
            .await
            .map_err(|e| OrderFlowError::from_store("gagal mengambil pesanan", e))?
            .ok_or_else(|| OrderFlowError::OrderNotFound(order_id.clone()))
    }

    /// Confirms the payment of an order that is still awaiting confirmation. This is how manual payments are settled.
    ///
    /// The order moves to `Proses`/`Konfirmasi`, and the user accrues the order's experience points and plastic
    /// offset.
    pub async fn confirm_payment(&self, order_id: &OrderId) -> Result<Order, OrderFlowError> {
        trace!("🛒 Confirming payment for order {order_id}");
        let order = self
            .db
            .confirm_payment(order_id)
            .await
            .map_err(|e| OrderFlowError::from_store("gagal mengonfirmasi pembayaran", e))?;
        info!("🛒 Payment for order {order_id} ({}) confirmed", order.order_code);
        self.publish_status_change(&order, StatusUpdate::Payment(PaymentStatusType::Confirmed)).await;
        Ok(order)
    }

    /// Fails the payment of an order that is still awaiting confirmation. The order moves to `Gagal`/`Gagal` and the
    /// reserved stock is given back.
    pub async fn cancel_payment(&self, order_id: &OrderId) -> Result<Order, OrderFlowError> {
        trace!("🛒 Cancelling payment for order {order_id}");
        let order = self
            .db
            .fail_payment(order_id)
            .await
            .map_err(|e| OrderFlowError::from_store("gagal membatalkan pembayaran", e))?;
        info!("🛒 Payment for order {order_id} ({}) cancelled", order.order_code);
        self.publish_status_change(&order, StatusUpdate::Payment(PaymentStatusType::Failed)).await;
        Ok(order)
    }

    /// Reconciles an order with the payment gateway after the gateway has told us something changed.
    ///
    /// The callback payload is not trusted beyond the `order_id` it names: the status is always fetched from the
    /// gateway. Gateways deliver callbacks at least once, so an order whose payment has already been settled is
    /// acknowledged without any further change.
    pub async fn callback(&self, payload: &Value) -> Result<CallbackResult, OrderFlowError> {
        let order_id = payload
            .get("order_id")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| OrderId(s.to_string()))
            .ok_or_else(|| OrderFlowError::InvalidCallbackPayload(payload.to_string()))?;
        let order = self.fetch_order(&order_id).await?;
        if order.payment_status.is_settled() {
            info!("🛒 Callback for {order_id} ignored. Payment is already {}", order.payment_status);
            return Ok(CallbackResult { outcome: CallbackOutcome::AlreadySettled, order });
        }
        let status = tokio::time::timeout(self.config.gateway_timeout, self.gateway.check_status(&order_id))
            .await
            .map_err(|_| OrderFlowError::GatewayTimeout(order_id.clone()))?
            .map_err(OrderFlowError::Gateway)?;
        debug!("🛒 Gateway reports {}/{} for order {order_id}", status.order_status, status.payment_status);
        let result = match status.payment_status {
            PaymentStatusType::WaitingConfirmation => CallbackResult { outcome: CallbackOutcome::Pending, order },
            PaymentStatusType::Confirmed => match self.db.confirm_payment(&order_id).await {
                Ok(order) => {
                    info!("🛒 Gateway confirmed payment for order {order_id} ({})", order.order_code);
                    self.publish_status_change(&order, StatusUpdate::Payment(PaymentStatusType::Confirmed)).await;
                    CallbackResult { outcome: CallbackOutcome::Confirmed, order }
                },
                Err(StoreError::PaymentAlreadySettled(..)) => self.settled_concurrently(&order_id).await?,
                Err(e) => return Err(OrderFlowError::from_store("gagal mengonfirmasi pembayaran", e)),
            },
            PaymentStatusType::Failed => match self.db.fail_payment(&order_id).await {
                Ok(order) => {
                    info!("🛒 Gateway failed payment for order {order_id} ({})", order.order_code);
                    self.publish_status_change(&order, StatusUpdate::Payment(PaymentStatusType::Failed)).await;
                    CallbackResult { outcome: CallbackOutcome::Failed, order }
                },
                Err(StoreError::PaymentAlreadySettled(..)) => self.settled_concurrently(&order_id).await?,
                Err(e) => return Err(OrderFlowError::from_store("gagal membatalkan pembayaran", e)),
            },
        };
        Ok(result)
    }

    /// Progresses fulfilment of a paid order: `Proses -> Pengiriman -> Selesai`. Any other transition is rejected.
    pub async fn update_order_status(
        &self,
        order_id: &OrderId,
        new_status: OrderStatusType,
    ) -> Result<Order, OrderFlowError> {
        let order = self.fetch_order(order_id).await?;
        if !order.status.can_progress_to(new_status) {
            debug!("🛒 Order {order_id} cannot move from {} to {new_status}", order.status);
            return Err(OrderFlowError::ForbiddenStatusChange { from: order.status, to: new_status });
        }
        let order = self
            .db
            .update_order_status(order_id, order.status, new_status)
            .await
            .map_err(|e| OrderFlowError::from_store("gagal memperbarui status pesanan", e))?;
        info!("🛒 Order {order_id} ({}) is now {new_status}", order.order_code);
        self.publish_status_change(&order, StatusUpdate::Order(new_status)).await;
        Ok(order)
    }

    async fn place_order(
        &self,
        mut order: NewOrder,
        voucher: Option<Voucher>,
    ) -> Result<OrderPlacement, OrderFlowError> {
        if let Some(voucher) = voucher {
            if order.apply_voucher(&voucher) {
                let claim = self
                    .db
                    .fetch_claim(order.user_id, voucher.id)
                    .await
                    .map_err(|e| OrderFlowError::from_store("gagal mengambil kupon", e))?;
                if claim.is_none() {
                    return Err(OrderFlowError::VoucherNotClaimed(voucher.id));
                }
                debug!("🛒 Voucher {} takes {} off order {}", voucher.id, order.voucher_discount(), order.order_id);
            } else {
                debug!(
                    "🛒 Order {} totals {}, below the {} minimum for voucher {}. Voucher not applied.",
                    order.order_id,
                    order.grand_total_price(),
                    voucher.min_purchase,
                    voucher.id
                );
            }
        }
        let order =
            self.db.insert_order(order).await.map_err(|e| OrderFlowError::from_store("gagal membuat pesanan", e))?;
        info!(
            "🛒 Order {} ({}) placed by user {} for {} via {}",
            order.order_id, order.order_code, order.user_id, order.total_amount_paid, order.payment_method
        );
        self.producers.publish_order_created(OrderCreatedEvent::new(order.clone())).await;
        if order.payment_method.is_manual() {
            return Ok(OrderPlacement::Manual { order });
        }
        let request = self.gateway.process(order.total_amount_paid, &order.order_id, order.payment_method);
        match tokio::time::timeout(self.config.gateway_timeout, request).await {
            Ok(Ok(instruction)) => Ok(OrderPlacement::Gateway { order, instruction }),
            Ok(Err(e)) => {
                warn!("🛒 The payment gateway rejected order {}: {e}. Cancelling the order.", order.order_id);
                self.compensate_rejected_order(&order.order_id).await;
                Err(OrderFlowError::Gateway(e))
            },
            Err(_) => {
                warn!(
                    "🛒 The payment gateway did not answer within {:?} for order {}. The order stays pending until the \
                     gateway calls back.",
                    self.config.gateway_timeout, order.order_id
                );
                Err(OrderFlowError::GatewayTimeout(order.order_id))
            },
        }
    }

    async fn compensate_rejected_order(&self, order_id: &OrderId) {
        match self.db.fail_payment(order_id).await {
            Ok(order) => {
                self.publish_status_change(&order, StatusUpdate::Payment(PaymentStatusType::Failed)).await;
            },
            Err(e) => {
                error!("🛒 Could not cancel order {order_id} after the gateway rejected it: {e}");
            },
        }
    }

    async fn settled_concurrently(&self, order_id: &OrderId) -> Result<CallbackResult, OrderFlowError> {
        info!("🛒 Order {order_id} was settled by a concurrent request. Callback ignored.");
        let order = self.fetch_order(order_id).await?;
        Ok(CallbackResult { outcome: CallbackOutcome::AlreadySettled, order })
    }

    async fn publish_status_change(&self, order: &Order, update: StatusUpdate) {
        self.producers.publish_status_changed(OrderStatusChangedEvent::new(order.clone(), update)).await;
    }

    async fn new_identifiers(&self) -> Result<(OrderId, OrderCode), OrderFlowError> {
        let order_id = self.unused_order_id().await?;
        let order_code = self.unused_order_code().await?;
        Ok((order_id, order_code))
    }

    async fn unused_order_id(&self) -> Result<OrderId, OrderFlowError> {
        let mut last_collision = None;
        for _ in 0..self.config.max_id_attempts {
            let id = OrderId::random();
            match self.db.order_id_exists(&id).await {
                Ok(false) => return Ok(id),
                Ok(true) => {
                    warn!("🛒 Order id {id} is already taken. Trying another.");
                    last_collision = Some(StoreError::OrderAlreadyExists(id));
                },
                Err(e) => return Err(OrderFlowError::OrderIdGeneration(e)),
            }
        }
        let e = last_collision.unwrap_or_else(|| StoreError::DatabaseError("no order id attempts were made".into()));
        Err(OrderFlowError::OrderIdGeneration(e))
    }

    async fn unused_order_code(&self) -> Result<OrderCode, OrderFlowError> {
        let mut last_collision = None;
        for _ in 0..self.config.max_id_attempts {
            let code = generate_order_code(Utc::now(), &mut rand::thread_rng());
            match self.db.order_code_exists(&code).await {
                Ok(false) => return Ok(code),
                Ok(true) => {
                    warn!("🛒 Order code {code} is already taken. Trying another.");
                    last_collision = Some(StoreError::DatabaseError(format!("order code {code} already exists")));
                },
                Err(e) => return Err(OrderFlowError::OrderCodeGeneration(e)),
            }
        }
        let e =
            last_collision.unwrap_or_else(|| StoreError::DatabaseError("no order code attempts were made".into()));
        Err(OrderFlowError::OrderCodeGeneration(e))
    }

    async fn check_address(&self, user_id: i64, address_id: i64) -> Result<(), OrderFlowError> {
        let address = self
            .db
            .fetch_address(address_id)
            .await
            .map_err(|e| OrderFlowError::from_store("gagal mengambil alamat", e))?;
        match address {
            Some(a) if a.user_id == user_id => Ok(()),
            Some(_) => {
                warn!("🛒 User {user_id} tried to use address {address_id}, which belongs to someone else");
                Err(OrderFlowError::AddressNotFound(address_id))
            },
            None => Err(OrderFlowError::AddressNotFound(address_id)),
        }
    }

    async fn fetch_voucher(&self, voucher_id: Option<i64>) -> Result<Option<Voucher>, OrderFlowError> {
        let Some(voucher_id) = voucher_id else {
            return Ok(None);
        };
        let voucher = self
            .db
            .fetch_voucher(voucher_id)
            .await
            .map_err(|e| OrderFlowError::from_store("gagal mengambil kupon", e))?
            .ok_or(OrderFlowError::VoucherNotFound(voucher_id))?;
        if !voucher.is_redeemable_at(Utc::now()) {
            return Err(OrderFlowError::VoucherNotRedeemable(voucher_id));
        }
        Ok(Some(voucher))
    }
}

fn parse_payment_method(method: &str) -> Result<PaymentMethod, OrderFlowError> {
    method.trim().parse().map_err(|_| OrderFlowError::InvalidPaymentMethod(method.to_string()))
}
