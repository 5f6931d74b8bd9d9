pub mod consumer_status;
pub mod payment_type;
pub mod role;
pub mod work_priority;

pub use consumer_status::{ConsumerStatus, DashboardTab, StageFamily};
pub use payment_type::PaymentType;
pub use role::Role;
pub use work_priority::WorkPriority;
