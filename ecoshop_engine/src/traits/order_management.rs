use crate::{
    db_types::{NewOrder, Order, OrderCode, OrderId, OrderStatusType},
    traits::StoreError,
};

#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    /// Stores a new order as a single unit of work. In one transaction:
    /// * the cart is cleaned up as described by `order.cart_cleanup`, and its grand total recomputed,
    /// * stock is reserved for every detail line,
    /// * the order and its detail lines are inserted,
    /// * the user's claim on the applied voucher, if any, is consumed.
    ///
    /// If any step fails, none of them take effect.
    async fn insert_order(&self, order: NewOrder) -> Result<Order, StoreError>;

    /// Fetches the order, including its detail lines.
    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, StoreError>;

    async fn order_id_exists(&self, order_id: &OrderId) -> Result<bool, StoreError>;

    async fn order_code_exists(&self, code: &OrderCode) -> Result<bool, StoreError>;

    /// Moves the order to `Proses`/`Konfirmasi` and adds the order's experience points and plastic offset to the user,
    /// in one transaction. Only allowed while the payment is still `Menunggu Konfirmasi`; otherwise
    /// [`StoreError::PaymentAlreadySettled`] is returned and nothing changes.
    async fn confirm_payment(&self, order_id: &OrderId) -> Result<Order, StoreError>;

    /// Moves the order to `Gagal`/`Gagal` and gives the stock of every detail line back, in one transaction. Only
    /// allowed while the payment is still `Menunggu Konfirmasi`.
    async fn fail_payment(&self, order_id: &OrderId) -> Result<Order, StoreError>;

    /// Changes the fulfilment status, provided the order is currently in status `from`.
    async fn update_order_status(
        &self,
        order_id: &OrderId,
        from: OrderStatusType,
        to: OrderStatusType,
    ) -> Result<Order, StoreError>;
}
