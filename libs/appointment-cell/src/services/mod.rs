pub mod booking;
pub mod lifecycle;
pub mod management;
pub mod quota;
pub mod slots;
pub mod store;

pub use booking::AppointmentBookingService;
pub use lifecycle::AppointmentLifecycleService;
pub use management::AppointmentManagementService;
pub use quota::QuotaEvaluator;
pub use slots::SlotService;
pub use store::AppointmentStore;
