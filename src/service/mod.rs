//! Time service and the directory it is published in

pub mod directory;
pub mod time_service;

pub use directory::ServiceDirectory;
pub use time_service::TimeService;
