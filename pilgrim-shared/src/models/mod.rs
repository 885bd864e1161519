pub mod errors;
pub mod notifications;
pub mod push;
pub mod queue;
