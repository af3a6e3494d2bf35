// Chat-facing half of the bot: request dispatcher and transports

pub mod dispatcher;
pub mod telegram;
pub mod transport;

pub use dispatcher::{DispatchSettings, RequestDispatcher, DEFAULT_MAX_CONCURRENT_REQUESTS};
pub use telegram::TelegramTransport;
pub use transport::{ChatTransport, Choice, InboundEvent, MediaUpload, TransportError};
