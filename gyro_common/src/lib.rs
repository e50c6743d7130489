pub mod helpers;
mod quantity;
mod secret;

pub use quantity::{Quantity, QuantityError, MAX_QUANTITY};
pub use secret::Secret;
