pub mod config;
pub mod dns;
pub mod error;
pub mod notify;
pub mod zone;

pub use dns::DNSPacket;
pub use error::{NotifyError, Result};
pub use notify::NotifyOut;
