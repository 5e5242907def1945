use crate::{
    db_types::{Cart, CartItem},
    traits::StoreError,
};

/// Cart mutation. Every method that changes a cart recomputes the cart's grand total in the same transaction, so
/// `grand_total` always equals the sum of the item totals.
#[allow(async_fn_in_trait)]
pub trait CartManagement {
    /// Fetches the user's cart, with its items, creating an empty cart if the user has none yet.
    async fn fetch_cart(&self, user_id: i64) -> Result<Cart, StoreError>;

    /// Resolves the given cart item ids against the user's cart. Every id must belong to the user's cart, otherwise
    /// [`StoreError::CartItemNotFound`] is returned.
    async fn fetch_cart_items(&self, user_id: i64, item_ids: &[i64]) -> Result<Vec<CartItem>, StoreError>;

    /// Adds `quantity` units of the product, merging with an existing line for the same product.
    async fn add_cart_item(&self, user_id: i64, product_id: i64, quantity: i64) -> Result<Cart, StoreError>;

    /// Takes `quantity` units off the line. The line is removed when it reaches zero.
    async fn reduce_cart_item(&self, user_id: i64, item_id: i64, quantity: i64) -> Result<Cart, StoreError>;

    async fn delete_cart_item(&self, user_id: i64, item_id: i64) -> Result<Cart, StoreError>;
}
