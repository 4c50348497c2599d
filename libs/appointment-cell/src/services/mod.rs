pub mod booking;
pub mod directory;
pub mod lifecycle;
pub mod reference;
pub mod refresh;
pub mod store;

pub use booking::AppointmentBookingService;
pub use directory::DirectoryService;
pub use lifecycle::AppointmentLifecycleService;
pub use store::AppointmentStore;
