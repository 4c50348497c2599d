pub mod gateway;
pub mod scheduler;
pub mod store;

pub use gateway::NotificationGateway;
pub use scheduler::ReminderScheduler;
pub use store::NotificationStore;
