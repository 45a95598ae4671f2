pub mod common;
pub mod enums;
pub mod error;
pub mod header;
pub mod packet;
pub mod question;
pub mod resource;

pub use common::PacketComponent;
pub use error::ParseError;
pub use header::DNSHeader;
pub use packet::DNSPacket;
pub use question::DNSQuestion;
pub use resource::DNSResource;
