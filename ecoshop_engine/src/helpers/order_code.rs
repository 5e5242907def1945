use chrono::{DateTime, Utc};
use rand::{distributions::Alphanumeric, Rng};

use crate::db_types::OrderCode;

pub const ORDER_CODE_PREFIX: &str = "ECO";
const SUFFIX_LEN: usize = 6;

/// Generates a human-readable order code of the form `ECO-YYYYMMDD-XXXXXX`, where the suffix is six random
/// upper-case alphanumerics. Codes are not guaranteed unique; the caller checks for collisions.
pub fn generate_order_code<R: Rng + ?Sized>(now: DateTime<Utc>, rng: &mut R) -> OrderCode {
    let suffix = rng
        .sample_iter(&Alphanumeric)
        .take(SUFFIX_LEN)
        .map(|c| (c as char).to_ascii_uppercase())
        .collect::<String>();
    OrderCode(format!("{ORDER_CODE_PREFIX}-{}-{suffix}", now.format("%Y%m%d")))
}
