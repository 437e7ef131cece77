//! Gate admission interface
//!
//! Whether a person may pass the station gate is decided outside the
//! control core (skipass validation). Stations only consult the answer.

use crate::data::Person;

/// Admission decision for a station gate
pub trait AdmissionCheck: Send + Sync {
    /// Whether this person may enter the waiting area
    fn admits(&self, person: &Person) -> bool;
}

/// Gate that lets everyone through
#[derive(Debug, Clone, Copy, Default)]
pub struct AdmitAll;

impl AdmissionCheck for AdmitAll {
    fn admits(&self, _person: &Person) -> bool {
        true
    }
}

impl<F> AdmissionCheck for F
where
    F: Fn(&Person) -> bool + Send + Sync,
{
    fn admits(&self, person: &Person) -> bool {
        self(person)
    }
}
