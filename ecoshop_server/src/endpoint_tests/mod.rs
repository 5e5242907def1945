mod callback;
mod carts;
mod helpers;
mod mocks;
mod notifications;
mod orders;
mod vouchers;
