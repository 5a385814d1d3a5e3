pub mod config;
pub mod entities;
pub mod error;
pub mod event;
pub mod message;
pub mod secret;

pub use entities::*;
pub use error::{Error, Result};
pub use event::Event;
pub use message::{Message, Role};
