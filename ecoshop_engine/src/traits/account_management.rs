use crate::{
    db_types::{Address, User},
    traits::StoreError,
};

#[allow(async_fn_in_trait)]
pub trait UserAccounts {
    async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, StoreError>;

    /// Adds the experience points and plastic offset of a paid order to the user's running totals.
    async fn accrue_loyalty(&self, user_id: i64, exp: i64, gram_plastic: i64) -> Result<User, StoreError>;
}

#[allow(async_fn_in_trait)]
pub trait AddressLookup {
    async fn fetch_address(&self, address_id: i64) -> Result<Option<Address>, StoreError>;
}
