use chrono::{Duration, Utc};
use ecoshop_engine::{
    db_types::{
        Address,
        NewAddress,
        NewProduct,
        NewUser,
        NewVoucher,
        Product,
        Rank,
        Rupiah,
        User,
        Voucher,
        VoucherCategory,
        VoucherStatus,
    },
    sqlite::db::{accounts, products, vouchers},
    traits::VoucherManagement,
    SqliteDatabase,
};

pub async fn seed_user(db: &SqliteDatabase, name: &str, level: Rank, device_token: Option<&str>) -> User {
    let mut conn = db.pool().acquire().await.unwrap();
    let user = NewUser {
        name: name.to_string(),
        email: format!("{}@ecoshop.test", name.to_lowercase()),
        level,
        device_token: device_token.map(String::from),
    };
    accounts::insert_user(user, &mut conn).await.unwrap()
}

pub async fn seed_address(db: &SqliteDatabase, user_id: i64) -> Address {
    let mut conn = db.pool().acquire().await.unwrap();
    let address = NewAddress {
        user_id,
        recipient_name: "Penerima".into(),
        phone: "081234567890".into(),
        full_address: "Jl. Merdeka No. 1, Bandung".into(),
    };
    accounts::insert_address(address, &mut conn).await.unwrap()
}

pub async fn seed_product(db: &SqliteDatabase, name: &str, price: i64, discount: i64, stock: i64) -> Product {
    let mut conn = db.pool().acquire().await.unwrap();
    let product =
        NewProduct::new(name, Rupiah::from(price), stock).with_discount(Rupiah::from(discount)).with_rewards(15, 3);
    products::insert_product(product, &mut conn).await.unwrap()
}

pub fn new_voucher(discount: i64, min_purchase: i64, stock: i64, category: VoucherCategory) -> NewVoucher {
    let now = Utc::now();
    NewVoucher {
        name: format!("Voucher {discount}"),
        discount: Rupiah::from(discount),
        min_purchase: Rupiah::from(min_purchase),
        stock,
        category,
        status: VoucherStatus::Active,
        start_date: now - Duration::days(1),
        end_date: now + Duration::days(7),
    }
}

pub async fn insert_voucher(db: &SqliteDatabase, voucher: NewVoucher) -> Voucher {
    let mut conn = db.pool().acquire().await.unwrap();
    vouchers::insert_voucher(voucher, &mut conn).await.unwrap()
}

pub async fn seed_voucher(db: &SqliteDatabase, discount: i64, min_purchase: i64, stock: i64) -> Voucher {
    insert_voucher(db, new_voucher(discount, min_purchase, stock, VoucherCategory::AllCustomer)).await
}

/// Seeds a voucher and a claim on it for the user.
pub async fn seed_claimed_voucher(db: &SqliteDatabase, user_id: i64, discount: i64, min_purchase: i64) -> Voucher {
    let voucher = seed_voucher(db, discount, min_purchase, 10).await;
    db.claim_voucher(user_id, voucher.id, Utc::now()).await.unwrap();
    voucher
}

/// A user with an address, ready to place orders.
pub struct Customer {
    pub user: User,
    pub address: Address,
}

pub async fn seed_customer(db: &SqliteDatabase, name: &str, level: Rank) -> Customer {
    let user = seed_user(db, name, level, Some("device-token")).await;
    let address = seed_address(db, user.id).await;
    Customer { user, address }
}
