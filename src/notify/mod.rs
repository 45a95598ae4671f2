//! Outbound DNS NOTIFY sender (RFC 1996): slave discovery, the per-zone
//! retry state machine, the dispatcher event loop, and the public
//! controller that ties them together.

mod controller;
pub mod discovery;
mod dispatcher;
pub mod socket;
pub mod state;

pub use controller::NotifyOut;
pub use discovery::{get_notify_slaves_from_ns, init_notify_out, NotifyTarget};
pub use socket::{NotifySocket, UdpNotifySocket};
pub use state::{ReplyClassification, ZoneNotifyInfo};
