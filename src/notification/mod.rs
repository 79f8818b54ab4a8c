//! Delivery of notification events to subscribers.
//!
//! The service actor never calls subscribers directly. It queues events on
//! the [`dispatcher`], which drains one FIFO per subscriber on its own task.
pub mod dispatcher;
pub mod logging_subscriber;
