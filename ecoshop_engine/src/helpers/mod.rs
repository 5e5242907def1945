mod order_code;

pub use order_code::{generate_order_code, ORDER_CODE_PREFIX};
