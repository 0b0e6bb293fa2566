//! Terminal-side consumer of the relay stream.

pub mod client;
pub mod render;
pub mod session;

pub use client::{consume_stream, ClientError, RelayClient};
pub use render::TranscriptRenderer;
pub use session::{ChatSession, Phase, PendingTurn};
