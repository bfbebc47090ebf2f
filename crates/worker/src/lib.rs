pub mod poller;
pub mod queue;
pub mod scheduler;
