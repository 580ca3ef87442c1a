//! Durable dispatch queue: approved drafts waiting to be sent, and the
//! dispatcher that drains them.

mod dispatcher;
pub mod repository;
mod types;

pub use dispatcher::{Dispatcher, TickOutcome};
pub use types::{QueueItem, QueueStatus};
