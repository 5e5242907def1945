use chrono::{DateTime, Utc};

use crate::{
    db_types::{Voucher, VoucherClaim},
    traits::StoreError,
};

#[allow(async_fn_in_trait)]
pub trait VoucherManagement {
    async fn fetch_voucher(&self, voucher_id: i64) -> Result<Option<Voucher>, StoreError>;

    async fn fetch_claim(&self, user_id: i64, voucher_id: i64) -> Result<Option<VoucherClaim>, StoreError>;

    async fn fetch_claims_for_user(&self, user_id: i64) -> Result<Vec<VoucherClaim>, StoreError>;

    /// In a single transaction, takes one unit of stock from the voucher and records the claim for the user.
    ///
    /// Eligibility rules are the caller's concern; this method only guarantees that stock never goes negative
    /// ([`StoreError::VoucherOutOfStock`]) and that a user holds at most one claim per voucher
    /// ([`StoreError::VoucherAlreadyClaimed`]).
    async fn claim_voucher(
        &self,
        user_id: i64,
        voucher_id: i64,
        claimed_at: DateTime<Utc>,
    ) -> Result<VoucherClaim, StoreError>;
}
