//! `SqliteDatabase` is a concrete implementation of an Ecoshop order engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module. Anything that touches more than one table runs inside a single transaction; dropping the transaction on an
//! early return rolls everything back.
use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;
use sqlx::{migrate, SqlitePool};

use super::db::{accounts, carts, db_url, new_pool, notifications, orders, products, vouchers};
use crate::{
    db_types::{
        Address,
        Cart,
        CartCleanup,
        CartItem,
        NewNotification,
        NewOrder,
        Notification,
        Order,
        OrderCode,
        OrderId,
        OrderStatusType,
        PaymentStatusType,
        Product,
        User,
        Voucher,
        VoucherClaim,
    },
    traits::{
        AddressLookup,
        CartManagement,
        EcoshopDatabase,
        NotificationStore,
        OrderManagement,
        ProductStock,
        StoreError,
        UserAccounts,
        VoucherManagement,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the URL in `ECOSHOP_DATABASE_URL`.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    /// Brings the schema up to date.
    pub async fn run_migrations(&self) -> Result<(), StoreError> {
        migrate!("./src/sqlite/migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::DatabaseError(format!("Migration failed. {e}")))?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn fetch_full_cart(&self, user_id: i64, conn: &mut sqlx::SqliteConnection) -> Result<Cart, StoreError> {
        carts::refresh_grand_total_for_user(user_id, &mut *conn).await?;
        carts::fetch_or_create_cart(user_id, conn).await
    }
}

impl EcoshopDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn close(&mut self) -> Result<(), StoreError> {
        self.pool.close().await;
        Ok(())
    }
}

impl ProductStock for SqliteDatabase {
    async fn fetch_product(&self, product_id: i64) -> Result<Option<Product>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let product = products::fetch_product(product_id, &mut conn).await?;
        Ok(product)
    }

    async fn reserve_stock(&self, product_id: i64, quantity: i64) -> Result<Product, StoreError> {
        let mut conn = self.pool.acquire().await?;
        products::reserve_stock(product_id, quantity, &mut conn).await
    }

    async fn restore_stock(&self, product_id: i64, quantity: i64) -> Result<Product, StoreError> {
        let mut conn = self.pool.acquire().await?;
        products::restore_stock(product_id, quantity, &mut conn).await
    }
}

impl UserAccounts for SqliteDatabase {
    async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let user = accounts::fetch_user(user_id, &mut conn).await?;
        Ok(user)
    }

    async fn accrue_loyalty(&self, user_id: i64, exp: i64, gram_plastic: i64) -> Result<User, StoreError> {
        let mut conn = self.pool.acquire().await?;
        accounts::accrue_loyalty(user_id, exp, gram_plastic, &mut conn).await
    }
}

impl AddressLookup for SqliteDatabase {
    async fn fetch_address(&self, address_id: i64) -> Result<Option<Address>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let address = accounts::fetch_address(address_id, &mut conn).await?;
        Ok(address)
    }
}

impl VoucherManagement for SqliteDatabase {
    async fn fetch_voucher(&self, voucher_id: i64) -> Result<Option<Voucher>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let voucher = vouchers::fetch_voucher(voucher_id, &mut conn).await?;
        Ok(voucher)
    }

    async fn fetch_claim(&self, user_id: i64, voucher_id: i64) -> Result<Option<VoucherClaim>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let claim = vouchers::fetch_claim(user_id, voucher_id, &mut conn).await?;
        Ok(claim)
    }

    async fn fetch_claims_for_user(&self, user_id: i64) -> Result<Vec<VoucherClaim>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let claims = vouchers::fetch_claims_for_user(user_id, &mut conn).await?;
        Ok(claims)
    }

    async fn claim_voucher(
        &self,
        user_id: i64,
        voucher_id: i64,
        claimed_at: DateTime<Utc>,
    ) -> Result<VoucherClaim, StoreError> {
        let mut tx = self.pool.begin().await?;
        let voucher = vouchers::take_stock(voucher_id, &mut tx).await?;
        let claim = vouchers::insert_claim(user_id, voucher_id, claimed_at, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ User {user_id} claimed voucher {voucher_id}. {} left", voucher.stock);
        Ok(claim)
    }
}

impl CartManagement for SqliteDatabase {
    async fn fetch_cart(&self, user_id: i64) -> Result<Cart, StoreError> {
        let mut tx = self.pool.begin().await?;
        let cart = carts::fetch_or_create_cart(user_id, &mut tx).await?;
        tx.commit().await?;
        Ok(cart)
    }

    async fn fetch_cart_items(&self, user_id: i64, item_ids: &[i64]) -> Result<Vec<CartItem>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let mut items = Vec::with_capacity(item_ids.len());
        for id in item_ids {
            let item =
                carts::fetch_item_for_user(user_id, *id, &mut conn).await?.ok_or(StoreError::CartItemNotFound(*id))?;
            items.push(item);
        }
        Ok(items)
    }

    async fn add_cart_item(&self, user_id: i64, product_id: i64, quantity: i64) -> Result<Cart, StoreError> {
        let mut tx = self.pool.begin().await?;
        let cart_id = carts::ensure_cart(user_id, &mut tx).await?;
        let product =
            products::fetch_product(product_id, &mut tx).await?.ok_or(StoreError::ProductNotFound(product_id))?;
        carts::add_item(cart_id, &product, quantity, &mut tx).await?;
        let cart = self.fetch_full_cart(user_id, &mut tx).await?;
        tx.commit().await?;
        Ok(cart)
    }

    async fn reduce_cart_item(&self, user_id: i64, item_id: i64, quantity: i64) -> Result<Cart, StoreError> {
        let mut tx = self.pool.begin().await?;
        carts::lock_cart(user_id, &mut tx).await?;
        let item =
            carts::fetch_item_for_user(user_id, item_id, &mut tx).await?.ok_or(StoreError::CartItemNotFound(item_id))?;
        let product = products::fetch_product(item.product_id, &mut tx)
            .await?
            .ok_or(StoreError::ProductNotFound(item.product_id))?;
        carts::reduce_item(&item, product.unit_price(), quantity, &mut tx).await?;
        let cart = self.fetch_full_cart(user_id, &mut tx).await?;
        tx.commit().await?;
        Ok(cart)
    }

    async fn delete_cart_item(&self, user_id: i64, item_id: i64) -> Result<Cart, StoreError> {
        let mut tx = self.pool.begin().await?;
        carts::take_item_for_user(user_id, item_id, &mut tx).await?.ok_or(StoreError::CartItemNotFound(item_id))?;
        let cart = self.fetch_full_cart(user_id, &mut tx).await?;
        tx.commit().await?;
        Ok(cart)
    }
}

impl OrderManagement for SqliteDatabase {
    async fn insert_order(&self, order: NewOrder) -> Result<Order, StoreError> {
        let mut tx = self.pool.begin().await?;
        match &order.cart_cleanup {
            CartCleanup::Nothing => {},
            CartCleanup::ConsumeItems(ids) => {
                for id in ids {
                    carts::take_item_for_user(order.user_id, *id, &mut tx)
                        .await?
                        .ok_or(StoreError::CartItemNotFound(*id))?;
                }
                carts::refresh_grand_total_for_user(order.user_id, &mut tx).await?;
            },
            CartCleanup::RemoveProduct(product_id) => {
                if carts::remove_product_for_user(order.user_id, *product_id, &mut tx).await? {
                    carts::refresh_grand_total_for_user(order.user_id, &mut tx).await?;
                }
            },
        }
        for line in &order.details {
            products::reserve_stock(line.product_id, line.quantity, &mut tx).await?;
        }
        let inserted = orders::insert_order(&order, &mut tx).await?;
        if let Some(voucher) = order.voucher {
            vouchers::consume_claim(order.user_id, voucher.voucher_id, &mut tx).await?;
        }
        tx.commit().await?;
        info!("🗃️ Order {} ({}) stored for user {}", inserted.order_id, inserted.order_code, inserted.user_id);
        Ok(inserted)
    }

    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_with_details(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn order_id_exists(&self, order_id: &OrderId) -> Result<bool, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let exists = orders::order_id_exists(order_id, &mut conn).await?;
        Ok(exists)
    }

    async fn order_code_exists(&self, code: &OrderCode) -> Result<bool, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let exists = orders::order_code_exists(code, &mut conn).await?;
        Ok(exists)
    }

    async fn confirm_payment(&self, order_id: &OrderId) -> Result<Order, StoreError> {
        let mut tx = self.pool.begin().await?;
        let mut order = settle(order_id, OrderStatusType::Processing, PaymentStatusType::Confirmed, &mut tx).await?;
        let user = accounts::accrue_loyalty(order.user_id, order.total_exp, order.total_gram_plastic, &mut tx).await?;
        order.details = orders::fetch_details(order_id, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Payment for {order_id} confirmed. User {} now has {} exp", user.id, user.exp);
        Ok(order)
    }

    async fn fail_payment(&self, order_id: &OrderId) -> Result<Order, StoreError> {
        let mut tx = self.pool.begin().await?;
        let mut order = settle(order_id, OrderStatusType::Failed, PaymentStatusType::Failed, &mut tx).await?;
        order.details = orders::fetch_details(order_id, &mut tx).await?;
        for line in &order.details {
            products::restore_stock(line.product_id, line.quantity, &mut tx).await?;
        }
        tx.commit().await?;
        debug!("🗃️ Payment for {order_id} failed. Stock restored for {} lines", order.details.len());
        Ok(order)
    }

    async fn update_order_status(
        &self,
        order_id: &OrderId,
        from: OrderStatusType,
        to: OrderStatusType,
    ) -> Result<Order, StoreError> {
        let mut tx = self.pool.begin().await?;
        let mut order = match orders::update_status(order_id, from, to, &mut tx).await? {
            Some(order) => order,
            None => {
                let current = orders::fetch_order_by_order_id(order_id, &mut tx)
                    .await?
                    .ok_or_else(|| StoreError::OrderNotFound(order_id.clone()))?;
                return Err(StoreError::ForbiddenStatusChange { order_id: order_id.clone(), from: current.status, to });
            },
        };
        order.details = orders::fetch_details(order_id, &mut tx).await?;
        tx.commit().await?;
        Ok(order)
    }
}

impl NotificationStore for SqliteDatabase {
    async fn record_notification(&self, notification: NewNotification) -> Result<Notification, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let notification = notifications::insert_notification(notification, &mut conn).await?;
        Ok(notification)
    }

    async fn fetch_notifications_for_user(&self, user_id: i64) -> Result<Vec<Notification>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let result = notifications::fetch_notifications_for_user(user_id, &mut conn).await?;
        Ok(result)
    }
}

/// Applies a payment settlement guarded on the payment still awaiting confirmation, telling apart a missing order
/// from one that was already settled.
async fn settle(
    order_id: &OrderId,
    status: OrderStatusType,
    payment_status: PaymentStatusType,
    conn: &mut sqlx::SqliteConnection,
) -> Result<Order, StoreError> {
    match orders::settle_payment(order_id, status, payment_status, &mut *conn).await? {
        Some(order) => Ok(order),
        None => {
            let current = orders::fetch_order_by_order_id(order_id, conn)
                .await?
                .ok_or_else(|| StoreError::OrderNotFound(order_id.clone()))?;
            Err(StoreError::PaymentAlreadySettled(order_id.clone(), current.payment_status))
        },
    }
}
