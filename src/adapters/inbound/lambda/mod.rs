pub mod dto;
pub mod handler;

pub use dto::InvocationPayloadDto;
pub use handler::{InvocationHandler, DEFAULT_DEADLINE_MARGIN};
