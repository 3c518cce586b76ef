pub mod sse;

pub use sse::{create_sse_comment, create_sse_event};
