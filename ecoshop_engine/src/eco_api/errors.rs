//! Error types for the public API.
//!
//! The `Display` text of every variant is the stable, customer-facing message. Whatever caused the error is kept as
//! the error's `source`, so logs can show the full chain without leaking backend detail to customers.
use thiserror::Error;

use crate::{
    db_types::{OrderId, OrderStatusType, PaymentStatusType, Rank, VoucherCategory},
    traits::{GatewayError, StoreError},
};

#[derive(Debug, Error)]
pub enum OrderFlowError {
    #[error("gagal membuat id pesanan")]
    OrderIdGeneration(#[source] StoreError),
    #[error("gagal membuat id_order")]
    OrderCodeGeneration(#[source] StoreError),
    #[error("alamat tidak ditemukan")]
    AddressNotFound(i64),
    #[error("kupon tidak ditemukan")]
    VoucherNotFound(i64),
    #[error("kupon tidak berlaku")]
    VoucherNotRedeemable(i64),
    #[error("kupon belum diklaim")]
    VoucherNotClaimed(i64),
    #[error("produk tidak ditemukan")]
    ProductNotFound(i64),
    #[error("item keranjang tidak ditemukan")]
    CartItemNotFound(i64),
    #[error("pesanan tidak ditemukan")]
    OrderNotFound(OrderId),
    #[error("jenis pembayaran tidak valid")]
    InvalidPaymentMethod(String),
    #[error("jumlah pesanan tidak valid")]
    InvalidQuantity(i64),
    #[error("pesanan harus berisi minimal satu produk")]
    EmptyOrder,
    #[error("stok tidak mencukupi untuk pesanan ini")]
    InsufficientStock(i64),
    #[error("payload callback tidak valid")]
    InvalidCallbackPayload(String),
    #[error("status pembayaran pesanan sudah {1}")]
    PaymentAlreadySettled(OrderId, PaymentStatusType),
    #[error("status pesanan tidak dapat diubah dari {from} ke {to}")]
    ForbiddenStatusChange { from: OrderStatusType, to: OrderStatusType },
    #[error("gagal memproses pembayaran")]
    Gateway(#[source] GatewayError),
    #[error("gateway pembayaran tidak merespons")]
    GatewayTimeout(OrderId),
    #[error("{context}")]
    Backend {
        context: &'static str,
        #[source]
        source: StoreError,
    },
}

impl OrderFlowError {
    /// Maps a backend error onto the customer-facing error it represents. Backend failures with no domain meaning keep
    /// the given context as their message.
    pub fn from_store(context: &'static str, e: StoreError) -> Self {
        match e {
            StoreError::ProductNotFound(id) => Self::ProductNotFound(id),
            StoreError::InsufficientStock(id) => Self::InsufficientStock(id),
            StoreError::VoucherNotFound(id) => Self::VoucherNotFound(id),
            StoreError::VoucherNotClaimed { voucher_id, .. } => Self::VoucherNotClaimed(voucher_id),
            StoreError::CartItemNotFound(id) => Self::CartItemNotFound(id),
            StoreError::OrderNotFound(id) => Self::OrderNotFound(id),
            StoreError::PaymentAlreadySettled(id, status) => Self::PaymentAlreadySettled(id, status),
            StoreError::ForbiddenStatusChange { from, to, .. } => Self::ForbiddenStatusChange { from, to },
            source => Self::Backend { context, source },
        }
    }
}

#[derive(Debug, Error)]
pub enum VoucherError {
    #[error("kupon tidak ditemukan")]
    VoucherNotFound(i64),
    #[error("pengguna tidak ditemukan")]
    UserNotFound(i64),
    #[error("kupon tidak berlaku")]
    NotRedeemable(i64),
    #[error("stok kupon sudah habis")]
    OutOfStock(i64),
    #[error("kupon telah diklaim")]
    AlreadyClaimed(i64),
    #[error("level anda masih belum mencukupi")]
    LevelTooLow { required: VoucherCategory, actual: Rank },
    #[error("gagal mengklaim kupon")]
    Backend(#[source] StoreError),
}

impl From<StoreError> for VoucherError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::VoucherNotFound(id) => Self::VoucherNotFound(id),
            StoreError::VoucherOutOfStock(id) => Self::OutOfStock(id),
            StoreError::VoucherAlreadyClaimed { voucher_id, .. } => Self::AlreadyClaimed(voucher_id),
            StoreError::UserNotFound(id) => Self::UserNotFound(id),
            e => Self::Backend(e),
        }
    }
}

#[derive(Debug, Error)]
pub enum CartError {
    #[error("produk tidak ditemukan")]
    ProductNotFound(i64),
    #[error("item keranjang tidak ditemukan")]
    CartItemNotFound(i64),
    #[error("pengguna tidak ditemukan")]
    UserNotFound(i64),
    #[error("jumlah tidak valid")]
    InvalidQuantity(i64),
    #[error("jumlah melebihi jumlah barang di keranjang")]
    QuantityExceedsCart { requested: i64, available: i64 },
    #[error("stok produk tidak mencukupi")]
    InsufficientStock(i64),
    #[error("gagal memperbarui keranjang")]
    Backend(#[source] StoreError),
}

impl From<StoreError> for CartError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::ProductNotFound(id) => Self::ProductNotFound(id),
            StoreError::CartItemNotFound(id) => Self::CartItemNotFound(id),
            StoreError::UserNotFound(id) => Self::UserNotFound(id),
            StoreError::InsufficientStock(id) => Self::InsufficientStock(id),
            StoreError::LineTotalOutOfRange { quantity, .. } => Self::InvalidQuantity(quantity),
            StoreError::CartQuantityExceeded { requested, available, .. } => {
                Self::QuantityExceedsCart { requested, available }
            },
            e => Self::Backend(e),
        }
    }
}

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Status pesanan tidak valid")]
    InvalidPaymentStatus(String),
    #[error("Status pengiriman tidak valid")]
    InvalidOrderStatus(String),
    #[error("pengguna tidak ditemukan")]
    UserNotFound(i64),
    #[error("pesanan tidak ditemukan")]
    OrderNotFound(OrderId),
    #[error("gagal menyimpan notifikasi")]
    Backend(#[source] StoreError),
}

impl From<StoreError> for NotificationError {
    fn from(e: StoreError) -> Self {
        Self::Backend(e)
    }
}
