use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
pub use ecoshop_common::Rupiah;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;
use uuid::Uuid;

/// Flat shipment fee charged on every order.
pub const SHIPMENT_FEE: Rupiah = Rupiah::new(24_000);
/// Flat administration fee charged on every order.
pub const ADMIN_FEE: Rupiah = Rupiah::new(2_000);

#[derive(Debug, Clone, Error)]
#[error("Invalid {kind}: {value}")]
pub struct ConversionError {
    pub kind: &'static str,
    pub value: String,
}

impl ConversionError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self { kind, value: value.to_string() }
    }
}

//--------------------------------------        OrderId        ---------------------------------------------------------
/// The globally unique identifier of an order. This is the id the payment gateway sees.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl OrderId {
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for OrderId {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ConversionError::new("order id", s));
        }
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

//--------------------------------------       OrderCode       ---------------------------------------------------------
/// The human-readable order reference shown to customers, e.g. `ECO-20240301-7KQ2ZD`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderCode(pub String);

impl OrderCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for OrderCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
pub enum OrderStatusType {
    /// The order has been placed and is waiting for the payment to be confirmed.
    #[sqlx(rename = "Menunggu Konfirmasi")]
    #[serde(rename = "Menunggu Konfirmasi")]
    WaitingConfirmation,
    /// Payment is confirmed and the order is being prepared.
    #[sqlx(rename = "Proses")]
    #[serde(rename = "Proses")]
    Processing,
    /// The order has been handed to the courier.
    #[sqlx(rename = "Pengiriman")]
    #[serde(rename = "Pengiriman")]
    Shipping,
    /// The order has been delivered.
    #[sqlx(rename = "Selesai")]
    #[serde(rename = "Selesai")]
    Completed,
    /// The order failed or was cancelled.
    #[sqlx(rename = "Gagal")]
    #[serde(rename = "Gagal")]
    Failed,
}

impl OrderStatusType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WaitingConfirmation => "Menunggu Konfirmasi",
            Self::Processing => "Proses",
            Self::Shipping => "Pengiriman",
            Self::Completed => "Selesai",
            Self::Failed => "Gagal",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Fulfilment progression after payment: `Proses -> Pengiriman -> Selesai`.
    pub fn can_progress_to(&self, next: OrderStatusType) -> bool {
        matches!((self, next), (Self::Processing, Self::Shipping) | (Self::Shipping, Self::Completed))
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Menunggu Konfirmasi" => Ok(Self::WaitingConfirmation),
            "Proses" => Ok(Self::Processing),
            "Pengiriman" => Ok(Self::Shipping),
            "Selesai" => Ok(Self::Completed),
            "Gagal" => Ok(Self::Failed),
            s => Err(ConversionError::new("order status", s)),
        }
    }
}

//--------------------------------------  PaymentStatusType    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
pub enum PaymentStatusType {
    #[sqlx(rename = "Menunggu Konfirmasi")]
    #[serde(rename = "Menunggu Konfirmasi")]
    WaitingConfirmation,
    #[sqlx(rename = "Konfirmasi")]
    #[serde(rename = "Konfirmasi")]
    Confirmed,
    #[sqlx(rename = "Gagal")]
    #[serde(rename = "Gagal")]
    Failed,
}

impl PaymentStatusType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WaitingConfirmation => "Menunggu Konfirmasi",
            Self::Confirmed => "Konfirmasi",
            Self::Failed => "Gagal",
        }
    }

    /// Once a payment is confirmed or failed, no further payment transition is allowed.
    pub fn is_settled(&self) -> bool {
        !matches!(self, Self::WaitingConfirmation)
    }
}

impl Display for PaymentStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Menunggu Konfirmasi" => Ok(Self::WaitingConfirmation),
            "Konfirmasi" => Ok(Self::Confirmed),
            "Gagal" => Ok(Self::Failed),
            s => Err(ConversionError::new("payment status", s)),
        }
    }
}

//--------------------------------------     StatusUpdate      ---------------------------------------------------------
/// A status change that customers are told about. Payment and fulfilment statuses share some labels, so the kind is
/// kept alongside the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "status", rename_all = "snake_case")]
pub enum StatusUpdate {
    Payment(PaymentStatusType),
    Order(OrderStatusType),
}

impl Display for StatusUpdate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatusUpdate::Payment(s) => write!(f, "payment:{s}"),
            StatusUpdate::Order(s) => write!(f, "order:{s}"),
        }
    }
}

//--------------------------------------    PaymentMethod      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Whatsapp,
    Telegram,
    Qris,
    BankTransfer,
    Gopay,
    Shopepay,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 6] =
        [Self::Whatsapp, Self::Telegram, Self::Qris, Self::BankTransfer, Self::Gopay, Self::Shopepay];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Whatsapp => "whatsapp",
            Self::Telegram => "telegram",
            Self::Qris => "qris",
            Self::BankTransfer => "bank_transfer",
            Self::Gopay => "gopay",
            Self::Shopepay => "shopepay",
        }
    }

    /// Manual methods are confirmed by an admin after the customer sends proof of payment over chat.
    pub fn is_manual(&self) -> bool {
        matches!(self, Self::Whatsapp | Self::Telegram)
    }

    pub fn is_gateway(&self) -> bool {
        !self.is_manual()
    }
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|m| m.as_str() == s).ok_or_else(|| ConversionError::new("payment method", s))
    }
}

//--------------------------------------         Rank          ---------------------------------------------------------
/// Customer loyalty level. The declaration order is the rank order: `Bronze < Silver < Gold`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Type, Serialize, Deserialize)]
pub enum Rank {
    Bronze,
    Silver,
    Gold,
}

impl Display for Rank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rank::Bronze => write!(f, "Bronze"),
            Rank::Silver => write!(f, "Silver"),
            Rank::Gold => write!(f, "Gold"),
        }
    }
}

//--------------------------------------   VoucherCategory     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
pub enum VoucherCategory {
    Bronze,
    Silver,
    Gold,
    #[sqlx(rename = "All Customer")]
    #[serde(rename = "All Customer")]
    AllCustomer,
}

impl VoucherCategory {
    /// The minimum rank needed to claim a voucher of this category. `None` means anyone may claim it.
    pub fn required_rank(&self) -> Option<Rank> {
        match self {
            Self::Bronze => Some(Rank::Bronze),
            Self::Silver => Some(Rank::Silver),
            Self::Gold => Some(Rank::Gold),
            Self::AllCustomer => None,
        }
    }

    pub fn admits(&self, level: Rank) -> bool {
        self.required_rank().map_or(true, |required| level >= required)
    }
}

impl Display for VoucherCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AllCustomer => write!(f, "All Customer"),
            Self::Bronze => write!(f, "Bronze"),
            Self::Silver => write!(f, "Silver"),
            Self::Gold => write!(f, "Gold"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum VoucherStatus {
    #[sqlx(rename = "Aktif")]
    #[serde(rename = "Aktif")]
    Active,
    #[sqlx(rename = "Nonaktif")]
    #[serde(rename = "Nonaktif")]
    Inactive,
}

//--------------------------------------        Product        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    /// Unit price before the product discount.
    pub price: Rupiah,
    /// Discount per unit.
    pub discount: Rupiah,
    pub stock: i64,
    /// Grams of plastic offset per unit.
    pub gram_plastic: i64,
    /// Experience points per unit.
    pub exp: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn unit_price(&self) -> Rupiah {
        self.price - self.discount
    }
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub price: Rupiah,
    pub discount: Rupiah,
    pub stock: i64,
    pub gram_plastic: i64,
    pub exp: i64,
}

impl NewProduct {
    pub fn new<S: Into<String>>(name: S, price: Rupiah, stock: i64) -> Self {
        Self { name: name.into(), price, discount: Rupiah::default(), stock, gram_plastic: 0, exp: 0 }
    }

    pub fn with_discount(mut self, discount: Rupiah) -> Self {
        self.discount = discount;
        self
    }

    pub fn with_rewards(mut self, gram_plastic: i64, exp: i64) -> Self {
        self.gram_plastic = gram_plastic;
        self.exp = exp;
        self
    }
}

//--------------------------------------        Voucher        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Voucher {
    pub id: i64,
    pub name: String,
    pub discount: Rupiah,
    pub min_purchase: Rupiah,
    /// How many more times this voucher can be claimed.
    pub stock: i64,
    pub category: VoucherCategory,
    pub status: VoucherStatus,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Voucher {
    pub fn is_redeemable_at(&self, now: DateTime<Utc>) -> bool {
        self.status == VoucherStatus::Active && self.start_date <= now && now <= self.end_date
    }
}

#[derive(Debug, Clone)]
pub struct NewVoucher {
    pub name: String,
    pub discount: Rupiah,
    pub min_purchase: Rupiah,
    pub stock: i64,
    pub category: VoucherCategory,
    pub status: VoucherStatus,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct VoucherClaim {
    pub id: i64,
    pub user_id: i64,
    pub voucher_id: i64,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------      User / Address      ------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub level: Rank,
    /// Experience points. Only ever increases, and only when a payment is confirmed.
    pub exp: i64,
    /// Cumulative grams of plastic offset by this user's paid orders.
    pub total_gram: i64,
    #[serde(skip_serializing)]
    pub device_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub level: Rank,
    pub device_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Address {
    pub id: i64,
    pub user_id: i64,
    pub recipient_name: String,
    pub phone: String,
    pub full_address: String,
}

#[derive(Debug, Clone)]
pub struct NewAddress {
    pub user_id: i64,
    pub recipient_name: String,
    pub phone: String,
    pub full_address: String,
}

//--------------------------------------       Cart            ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Cart {
    pub id: i64,
    pub user_id: i64,
    /// Always equal to the sum of `items[].total_price`.
    pub grand_total: Rupiah,
    #[sqlx(skip)]
    pub items: Vec<CartItem>,
}

impl Cart {
    pub fn items_total(&self) -> Rupiah {
        self.items.iter().map(|i| i.total_price).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct CartItem {
    pub id: i64,
    pub cart_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub total_price: Rupiah,
}

//--------------------------------------        Order          ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub order_id: OrderId,
    pub order_code: OrderCode,
    pub user_id: i64,
    pub address_id: i64,
    /// Only set when the voucher discount was actually applied to this order.
    pub voucher_id: Option<i64>,
    pub note: Option<String>,
    pub total_gram_plastic: i64,
    pub total_exp: i64,
    pub total_quantity: i64,
    /// Sum of all line totals, before fees and the voucher discount.
    pub grand_total_price: Rupiah,
    pub shipment_fee: Rupiah,
    pub admin_fee: Rupiah,
    /// The voucher discount deducted from this order.
    pub total_discount: Rupiah,
    pub total_amount_paid: Rupiah,
    pub status: OrderStatusType,
    pub payment_status: PaymentStatusType,
    pub payment_method: PaymentMethod,
    pub status_updated_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    #[sqlx(skip)]
    pub details: Vec<OrderDetail>,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct OrderDetail {
    pub id: i64,
    pub order_id: OrderId,
    pub product_id: i64,
    pub quantity: i64,
    pub total_gram_plastic: i64,
    pub total_exp: i64,
    pub total_price: Rupiah,
    pub total_discount: Rupiah,
}

//--------------------------------------      NewOrderDetail   ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderDetail {
    pub product_id: i64,
    pub quantity: i64,
    pub total_gram_plastic: i64,
    pub total_exp: i64,
    pub total_price: Rupiah,
    pub total_discount: Rupiah,
}

impl NewOrderDetail {
    /// Prices a single order line from the current product record. `None` if any line total does not fit.
    pub fn for_product(product: &Product, quantity: i64) -> Option<Self> {
        Some(Self {
            product_id: product.id,
            quantity,
            total_gram_plastic: product.gram_plastic.checked_mul(quantity)?,
            total_exp: product.exp.checked_mul(quantity)?,
            total_price: product.unit_price().checked_mul(quantity)?,
            total_discount: product.discount.checked_mul(quantity)?,
        })
    }
}

/// A voucher whose discount has been applied to a new order. The user's claim is consumed when the order is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedVoucher {
    pub voucher_id: i64,
    pub discount: Rupiah,
}

/// What should happen to the user's cart when the order is stored.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CartCleanup {
    #[default]
    Nothing,
    /// The order was built from these cart items. Every one of them must be deleted.
    ConsumeItems(Vec<i64>),
    /// The order was for a single product; drop it from the cart if it happens to be there.
    RemoveProduct(i64),
}

//--------------------------------------        NewOrder       ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_id: OrderId,
    pub order_code: OrderCode,
    pub user_id: i64,
    pub address_id: i64,
    pub note: Option<String>,
    pub payment_method: PaymentMethod,
    pub details: Vec<NewOrderDetail>,
    pub voucher: Option<AppliedVoucher>,
    pub cart_cleanup: CartCleanup,
    pub shipment_fee: Rupiah,
    pub admin_fee: Rupiah,
}

impl NewOrder {
    pub fn new(
        order_id: OrderId,
        order_code: OrderCode,
        user_id: i64,
        address_id: i64,
        payment_method: PaymentMethod,
    ) -> Self {
        Self {
            order_id,
            order_code,
            user_id,
            address_id,
            note: None,
            payment_method,
            details: Vec::new(),
            voucher: None,
            cart_cleanup: CartCleanup::Nothing,
            shipment_fee: SHIPMENT_FEE,
            admin_fee: ADMIN_FEE,
        }
    }

    pub fn with_note(mut self, note: Option<String>) -> Self {
        self.note = note.filter(|n| !n.trim().is_empty());
        self
    }

    pub fn with_cart_cleanup(mut self, cleanup: CartCleanup) -> Self {
        self.cart_cleanup = cleanup;
        self
    }

    /// Adds a priced line for `product`. Returns `None`, leaving the order untouched, if the line cannot be priced.
    pub fn add_line(&mut self, product: &Product, quantity: i64) -> Option<&NewOrderDetail> {
        let line = NewOrderDetail::for_product(product, quantity)?;
        self.details.push(line);
        self.details.last()
    }

    /// Applies the voucher discount if the order qualifies for it. Returns whether the voucher was applied.
    ///
    /// A qualifying order gets the voucher's full discount.
    pub fn apply_voucher(&mut self, voucher: &Voucher) -> bool {
        let grand_total = self.grand_total_price();
        if grand_total < voucher.min_purchase {
            self.voucher = None;
            return false;
        }
        self.voucher = Some(AppliedVoucher { voucher_id: voucher.id, discount: voucher.discount });
        true
    }

    pub fn grand_total_price(&self) -> Rupiah {
        self.details.iter().map(|d| d.total_price).sum()
    }

    pub fn total_quantity(&self) -> i64 {
        self.details.iter().map(|d| d.quantity).sum()
    }

    pub fn total_exp(&self) -> i64 {
        self.details.iter().map(|d| d.total_exp).sum()
    }

    pub fn total_gram_plastic(&self) -> i64 {
        self.details.iter().map(|d| d.total_gram_plastic).sum()
    }

    pub fn voucher_discount(&self) -> Rupiah {
        self.voucher.map(|v| v.discount).unwrap_or_default()
    }

    pub fn total_amount_paid(&self) -> Rupiah {
        self.grand_total_price() + self.admin_fee + self.shipment_fee - self.voucher_discount()
    }
}

//--------------------------------------     Notification      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub order_id: OrderId,
    pub user_id: i64,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub order_id: OrderId,
    pub user_id: i64,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}
