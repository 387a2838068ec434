//! Host/client synchronization over UDP

pub mod mailbox;
pub mod protocol;
pub mod transport;

pub use mailbox::Mailbox;
pub use protocol::{InputMessage, NetMessage, ProtocolError, StateMessage};
pub use transport::{resolve_host, NetError, NetSync, Role};
