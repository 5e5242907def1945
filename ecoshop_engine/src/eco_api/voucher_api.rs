use std::fmt::Debug;

use chrono::Utc;
use log::*;

use crate::{
    db_types::{User, Voucher, VoucherClaim},
    eco_api::errors::VoucherError,
    traits::VoucherDatabase,
};

/// Voucher eligibility and claims.
///
/// A user of rank R may claim any voucher whose category is at or below R (`Bronze < Silver < Gold`). `All Customer`
/// vouchers are open to everyone. Each user can hold at most one claim per voucher, and every claim takes one unit of
/// the voucher's stock.
pub struct VoucherApi<B> {
    db: B,
}

impl<B> Debug for VoucherApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "VoucherApi")
    }
}

impl<B> VoucherApi<B>
where B: VoucherDatabase
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn fetch_voucher(&self, voucher_id: i64) -> Result<Voucher, VoucherError> {
        self.db.fetch_voucher(voucher_id).await?.ok_or(VoucherError::VoucherNotFound(voucher_id))
    }

    pub async fn fetch_claims_for_user(&self, user_id: i64) -> Result<Vec<VoucherClaim>, VoucherError> {
        let claims = self.db.fetch_claims_for_user(user_id).await?;
        Ok(claims)
    }

    /// Whether the user's rank allows them to claim the voucher. Validity dates and stock are not considered.
    pub async fn can_claim(&self, user_id: i64, voucher_id: i64) -> Result<bool, VoucherError> {
        let voucher = self.fetch_voucher(voucher_id).await?;
        let user = self.fetch_user(user_id).await?;
        Ok(voucher.category.admits(user.level))
    }

    /// Claims the voucher for the user.
    ///
    /// The checks run in this order, and the first one to fail decides the error: the voucher must exist, be active and
    /// inside its validity window, have stock left, not already be claimed by this user, and be open to the user's
    /// rank. The stock decrement and the claim itself are then written together; if another request got there first,
    /// the same out-of-stock or already-claimed errors come back.
    pub async fn claim_voucher(&self, user_id: i64, voucher_id: i64) -> Result<VoucherClaim, VoucherError> {
        let voucher = self.fetch_voucher(voucher_id).await?;
        let user = self.fetch_user(user_id).await?;
        let now = Utc::now();
        if !voucher.is_redeemable_at(now) {
            let (from, until) = (voucher.start_date, voucher.end_date);
            debug!("🎟️ Voucher {voucher_id} is {:?} and valid {from} to {until}", voucher.status);
            return Err(VoucherError::NotRedeemable(voucher_id));
        }
        if voucher.stock <= 0 {
            return Err(VoucherError::OutOfStock(voucher_id));
        }
        if self.db.fetch_claim(user_id, voucher_id).await?.is_some() {
            return Err(VoucherError::AlreadyClaimed(voucher_id));
        }
        if !voucher.category.admits(user.level) {
            debug!("🎟️ User {user_id} is {} but voucher {voucher_id} needs {}", user.level, voucher.category);
            return Err(VoucherError::LevelTooLow { required: voucher.category, actual: user.level });
        }
        let claim = self.db.claim_voucher(user_id, voucher_id, now).await?;
        info!("🎟️ User {user_id} claimed voucher {voucher_id} ({})", voucher.name);
        Ok(claim)
    }

    async fn fetch_user(&self, user_id: i64) -> Result<User, VoucherError> {
        self.db.fetch_user(user_id).await?.ok_or(VoucherError::UserNotFound(user_id))
    }
}
