//! HTTP Handlers

mod ping;
mod playback;
mod selection;
mod query;
mod websocket;

pub use ping::*;
pub use playback::*;
pub use selection::*;
pub use query::*;
pub use websocket::*;
