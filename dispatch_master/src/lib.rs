pub mod dispatcher;
pub mod registration;
pub mod submission;
pub mod supervisor;
pub mod utilization;

pub use supervisor::Supervisor;
