pub mod orders;
pub mod transitions;
pub mod webhook_events;
