//! Collaborator interfaces: lifecycle listeners and gate admission

pub mod admission;
pub mod listener;

pub use admission::{AdmissionCheck, AdmitAll};
pub use listener::{dispatch_lifecycle, CabinListener};
