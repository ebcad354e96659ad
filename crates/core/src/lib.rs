pub mod buffer;
pub mod config;
pub mod error;
pub mod notice;
pub mod scheduler;
pub mod transport;
pub mod viewer;

pub use buffer::{LogItem, RenderBuffer};
pub use error::CoreError;
pub use notice::{ErrorNotice, NoticeBoard, NoticeId};
pub use scheduler::{TaskKey, TransientScheduler};
pub use transport::{
    ChannelEvent, ChannelState, CloseFrame, ConnectionId, Connector, Endpoint, EventSender, Link,
    Signal, TransportChannel, TransportEvent,
};
pub use viewer::{Timings, Viewer};

#[cfg(test)]
pub(crate) mod tests_common;
