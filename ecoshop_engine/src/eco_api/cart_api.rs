use std::fmt::Debug;

use log::*;

use crate::{db_types::Cart, eco_api::errors::CartError, traits::CartDatabase};

/// Cart mutation. The backend recomputes the cart's grand total inside the same transaction as every change, so the
/// cart returned from each call is always consistent with its items.
pub struct CartApi<B> {
    db: B,
}

impl<B> Debug for CartApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CartApi")
    }
}

impl<B> CartApi<B>
where B: CartDatabase
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn fetch_cart(&self, user_id: i64) -> Result<Cart, CartError> {
        let cart = self.db.fetch_cart(user_id).await?;
        Ok(cart)
    }

    pub async fn add_item(&self, user_id: i64, product_id: i64, quantity: i64) -> Result<Cart, CartError> {
        if quantity <= 0 {
            return Err(CartError::InvalidQuantity(quantity));
        }
        let cart = self.db.add_cart_item(user_id, product_id, quantity).await?;
        debug!("🧺 User {user_id} added {quantity} of product {product_id}. Cart total is {}", cart.grand_total);
        Ok(cart)
    }

    pub async fn reduce_item(&self, user_id: i64, item_id: i64, quantity: i64) -> Result<Cart, CartError> {
        if quantity <= 0 {
            return Err(CartError::InvalidQuantity(quantity));
        }
        let cart = self.db.reduce_cart_item(user_id, item_id, quantity).await?;
        debug!("🧺 User {user_id} took {quantity} off cart item {item_id}. Cart total is {}", cart.grand_total);
        Ok(cart)
    }

    pub async fn delete_item(&self, user_id: i64, item_id: i64) -> Result<Cart, CartError> {
        let cart = self.db.delete_cart_item(user_id, item_id).await?;
        debug!("🧺 User {user_id} removed cart item {item_id}. Cart total is {}", cart.grand_total);
        Ok(cart)
    }
}
