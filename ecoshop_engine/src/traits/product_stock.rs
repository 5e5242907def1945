use crate::{db_types::Product, traits::StoreError};

/// Inventory access. Stock never goes negative: reservations are a single guarded update, never a read followed by a
/// write.
#[allow(async_fn_in_trait)]
pub trait ProductStock {
    async fn fetch_product(&self, product_id: i64) -> Result<Option<Product>, StoreError>;

    /// Decrements the stock of the product by `quantity`, provided at least that much is available.
    ///
    /// Returns [`StoreError::InsufficientStock`] if the guard fails and [`StoreError::ProductNotFound`] if there is no
    /// such product. The updated product is returned on success.
    async fn reserve_stock(&self, product_id: i64, quantity: i64) -> Result<Product, StoreError>;

    /// Unconditionally gives `quantity` units back to the product.
    async fn restore_stock(&self, product_id: i64, quantity: i64) -> Result<Product, StoreError>;
}
