pub mod error;
pub mod event;
pub mod ports;
pub mod service;

pub use error::DomainError;
pub use event::{Event, DEFAULT_TOPIC};
pub use ports::{EventPublisher, PublishError};
pub use service::BridgeService;
