use chrono::{DateTime, Utc};
use ecoshop_engine::{
    db_types::{
        Address,
        Cart,
        CartItem,
        NewNotification,
        NewOrder,
        Notification,
        Order,
        OrderCode,
        OrderId,
        OrderStatusType,
        PaymentMethod,
        Product,
        Rupiah,
        User,
        Voucher,
        VoucherClaim,
    },
    traits::{
        AddressLookup,
        CartManagement,
        GatewayError,
        GatewayInstruction,
        GatewayStatus,
        NotificationStore,
        OrderManagement,
        PaymentGatewayAdapter,
        ProductStock,
        StoreError,
        UserAccounts,
        VoucherManagement,
    },
};
use mockall::mock;

mock! {
    pub Backend {}
    impl ProductStock for Backend {
        async fn fetch_product(&self, product_id: i64) -> Result<Option<Product>, StoreError>;
        async fn reserve_stock(&self, product_id: i64, quantity: i64) -> Result<Product, StoreError>;
        async fn restore_stock(&self, product_id: i64, quantity: i64) -> Result<Product, StoreError>;
    }
    impl UserAccounts for Backend {
        async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, StoreError>;
        async fn accrue_loyalty(&self, user_id: i64, exp: i64, gram_plastic: i64) -> Result<User, StoreError>;
    }
    impl AddressLookup for Backend {
        async fn fetch_address(&self, address_id: i64) -> Result<Option<Address>, StoreError>;
    }
    impl VoucherManagement for Backend {
        async fn fetch_voucher(&self, voucher_id: i64) -> Result<Option<Voucher>, StoreError>;
        async fn fetch_claim(&self, user_id: i64, voucher_id: i64) -> Result<Option<VoucherClaim>, StoreError>;
        async fn fetch_claims_for_user(&self, user_id: i64) -> Result<Vec<VoucherClaim>, StoreError>;
        async fn claim_voucher(
            &self,
            user_id: i64,
            voucher_id: i64,
            claimed_at: DateTime<Utc>,
        ) -> Result<VoucherClaim, StoreError>;
    }
    impl CartManagement for Backend {
        async fn fetch_cart(&self, user_id: i64) -> Result<Cart, StoreError>;
        async fn fetch_cart_items(&self, user_id: i64, item_ids: &[i64]) -> Result<Vec<CartItem>, StoreError>;
        async fn add_cart_item(&self, user_id: i64, product_id: i64, quantity: i64) -> Result<Cart, StoreError>;
        async fn reduce_cart_item(&self, user_id: i64, item_id: i64, quantity: i64) -> Result<Cart, StoreError>;
        async fn delete_cart_item(&self, user_id: i64, item_id: i64) -> Result<Cart, StoreError>;
    }
    impl OrderManagement for Backend {
        async fn insert_order(&self, order: NewOrder) -> Result<Order, StoreError>;
        async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, StoreError>;
        async fn order_id_exists(&self, order_id: &OrderId) -> Result<bool, StoreError>;
        async fn order_code_exists(&self, code: &OrderCode) -> Result<bool, StoreError>;
        async fn confirm_payment(&self, order_id: &OrderId) -> Result<Order, StoreError>;
        async fn fail_payment(&self, order_id: &OrderId) -> Result<Order, StoreError>;
        async fn update_order_status(
            &self,
            order_id: &OrderId,
            from: OrderStatusType,
            to: OrderStatusType,
        ) -> Result<Order, StoreError>;
    }
    impl NotificationStore for Backend {
        async fn record_notification(&self, notification: NewNotification) -> Result<Notification, StoreError>;
        async fn fetch_notifications_for_user(&self, user_id: i64) -> Result<Vec<Notification>, StoreError>;
    }
}

mock! {
    pub Gateway {}
    impl PaymentGatewayAdapter for Gateway {
        async fn process(
            &self,
            amount: Rupiah,
            order_id: &OrderId,
            method: PaymentMethod,
        ) -> Result<GatewayInstruction, GatewayError>;
        async fn check_status(&self, order_id: &OrderId) -> Result<GatewayStatus, GatewayError>;
    }
}
