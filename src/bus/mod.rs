//! The dispatcher: event table plus publish-to-task translation.

mod dispatcher;
mod handler;
mod registry;

pub use self::dispatcher::EventBus;
pub use self::handler::{Payload, SubscriptionId};
