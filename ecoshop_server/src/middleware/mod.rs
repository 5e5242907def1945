mod hmac;

pub use hmac::{SignedCallbacks, SignedCallbacksService};
