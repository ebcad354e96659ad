pub mod websocket;

// Re-exports for convenience
pub use loghell_core::transport::{Connector, Link};
pub use websocket::{WsConnector, WsLink};
