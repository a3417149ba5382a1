// Notification transports
// Adapters that implement the NotificationRepository port

pub mod in_memory;
pub mod tracing_sink;

pub use in_memory::InMemoryNotificationRepository;
pub use tracing_sink::TracingNotificationRepository;
