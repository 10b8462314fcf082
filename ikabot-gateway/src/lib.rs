pub mod api;
pub mod assets;
pub mod commands;
pub mod discord;
pub mod notify;
pub mod payload;
pub mod render;
pub mod state;

pub use api::{ApiClient, Endpoint, ScheduleSource};
pub use notify::{Job, MessageSink, Notifier, SinkError, TickOutcome};
pub use payload::{Payload, PayloadContext, PayloadError};
pub use state::AppState;
