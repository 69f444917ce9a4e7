//! Domain events and the inline command execution helper.

pub mod envelope;
pub mod event;
pub mod handler;

pub use envelope::{EventEnvelope, StreamPosition};
pub use event::Event;
pub use handler::execute;
