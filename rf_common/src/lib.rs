mod address;
mod secret;

pub use address::{AddressError, WalletAddress};
pub use secret::Secret;
