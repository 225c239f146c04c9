mod connect;
mod error;
mod hex;
mod logging;
mod tx;

pub use connect::*;
pub use error::*;
pub use hex::*;
pub use logging::*;
pub use tx::*;
