pub mod chat;
pub mod stream_event;

pub use chat::*;
pub use stream_event::StreamEvent;
