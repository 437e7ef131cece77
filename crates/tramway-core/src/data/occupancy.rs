//! Passengers and bounded passenger sets

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use uuid::Uuid;

use crate::error::FaultResult;
use crate::fault::Fault;

/// Unique passenger identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PersonId(Uuid);

impl PersonId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P({})", &self.0.to_string()[..8])
    }
}

/// A passenger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    /// Identity used by [`Occupancy::remove`]
    pub id: PersonId,
    /// Display name
    pub name: String,
    /// Weight in kilograms
    pub weight: f64,
}

impl Person {
    /// Create a passenger with a fresh id
    pub fn new(name: impl Into<String>, weight: f64) -> Self {
        Self {
            id: PersonId::new(),
            name: name.into(),
            weight,
        }
    }
}

/// Bounded multiset of passengers
///
/// Enumeration follows insertion order. The same person may be added twice;
/// only the count is bounded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Occupancy {
    people: Vec<Person>,
    capacity: usize,
}

impl Occupancy {
    /// Create an empty set; a zero capacity is a configuration fault
    pub fn new(capacity: usize) -> FaultResult<Self> {
        if capacity == 0 {
            return Err(Fault::config("Passenger capacity must be at least one"));
        }
        Ok(Self {
            people: Vec::with_capacity(capacity),
            capacity,
        })
    }

    /// Add a passenger, failing when the set is full
    pub fn add(&mut self, person: Person) -> FaultResult<()> {
        self.ensure_room()?;
        self.people.push(person);
        Ok(())
    }

    /// Fail with an occupancy fault if no room is left
    pub fn ensure_room(&self) -> FaultResult<()> {
        if self.is_full() {
            return Err(Fault::occupancy(self.people.len(), self.capacity));
        }
        Ok(())
    }

    /// Remove the first entry for this person; returns it, or `None` if absent
    pub fn remove(&mut self, id: PersonId) -> Option<Person> {
        let index = self.people.iter().position(|p| p.id == id)?;
        Some(self.people.remove(index))
    }

    /// Move people from the front of `line` to the back of the set until it is full
    ///
    /// Whoever does not fit stays in `line`.
    pub fn fill_from(&mut self, line: &mut VecDeque<Person>) {
        let take = self.free().min(line.len());
        self.people.extend(line.drain(..take));
    }

    /// Move people from the front of `line` ahead of everyone already in the
    /// set, keeping their order, until it is full
    ///
    /// Whoever does not fit stays in `line`.
    pub fn prepend_from(&mut self, line: &mut VecDeque<Person>) {
        let take = self.free().min(line.len());
        let mut head: Vec<Person> = line.drain(..take).collect();
        head.append(&mut self.people);
        self.people = head;
    }

    /// Empty the set
    pub fn clear(&mut self) {
        self.people.clear();
    }

    /// Take every passenger out, in insertion order
    pub fn drain(&mut self) -> Vec<Person> {
        std::mem::take(&mut self.people)
    }

    /// Sum of passenger weights, 0 when empty
    pub fn total_weight(&self) -> f64 {
        self.people.iter().map(|p| p.weight).sum()
    }

    /// Passengers in insertion order
    pub fn people(&self) -> &[Person] {
        &self.people
    }

    /// Number of passengers
    pub fn len(&self) -> usize {
        self.people.len()
    }

    /// Maximum number of passengers
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Free places left
    pub fn free(&self) -> usize {
        self.capacity - self.people.len()
    }

    /// Whether no passenger is present
    pub fn is_empty(&self) -> bool {
        self.people.is_empty()
    }

    /// Whether the set is at capacity
    pub fn is_full(&self) -> bool {
        self.people.len() >= self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fault::{FaultKind, Severity};

    #[test]
    fn test_zero_capacity_rejected() {
        let err = Occupancy::new(0).unwrap_err();
        assert_eq!(err.kind, FaultKind::Config);
    }

    #[test]
    fn test_add_until_full() {
        let mut set = Occupancy::new(2).unwrap();
        set.add(Person::new("Anna", 60.0)).unwrap();
        set.add(Person::new("Bruno", 85.5)).unwrap();
        assert!(set.is_full());

        let err = set.add(Person::new("Carla", 70.0)).unwrap_err();
        assert_eq!(err.kind, FaultKind::Occupancy);
        assert_eq!(err.severity, Severity::Warning);
        assert_eq!(set.len(), 2);
        assert_eq!(set.total_weight(), 145.5);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut set = Occupancy::new(3).unwrap();
        let anna = Person::new("Anna", 60.0);
        let stranger = Person::new("Stranger", 90.0);
        set.add(anna.clone()).unwrap();

        assert!(set.remove(stranger.id).is_none());
        assert_eq!(set.len(), 1);
        assert_eq!(set.remove(anna.id), Some(anna));
        assert!(set.is_empty());
        assert_eq!(set.total_weight(), 0.0);
    }

    #[test]
    fn test_duplicates_allowed() {
        let mut set = Occupancy::new(3).unwrap();
        let anna = Person::new("Anna", 60.0);
        set.add(anna.clone()).unwrap();
        set.add(anna.clone()).unwrap();
        assert_eq!(set.len(), 2);

        set.remove(anna.id);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_drain_keeps_order() {
        let mut set = Occupancy::new(3).unwrap();
        set.add(Person::new("A", 1.0)).unwrap();
        set.add(Person::new("B", 2.0)).unwrap();
        let names: Vec<String> = set.drain().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert!(set.is_empty());
        assert_eq!(set.free(), 3);
    }

    fn names(set: &Occupancy) -> Vec<&str> {
        set.people().iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn test_fill_from_stops_at_capacity() {
        let mut set = Occupancy::new(2).unwrap();
        set.add(Person::new("A", 1.0)).unwrap();
        let mut line: VecDeque<Person> =
            vec![Person::new("B", 2.0), Person::new("C", 3.0)].into();

        set.fill_from(&mut line);
        assert_eq!(names(&set), vec!["A", "B"]);
        assert_eq!(line.len(), 1);
        assert_eq!(line[0].name, "C");
    }

    #[test]
    fn test_prepend_from_goes_ahead_of_the_set() {
        let mut set = Occupancy::new(3).unwrap();
        set.add(Person::new("Late", 1.0)).unwrap();
        let mut line: VecDeque<Person> = vec![
            Person::new("First", 2.0),
            Person::new("Second", 3.0),
            Person::new("Third", 4.0),
        ]
        .into();

        set.prepend_from(&mut line);
        assert_eq!(names(&set), vec!["First", "Second", "Late"]);
        assert_eq!(line.len(), 1);
        assert_eq!(line[0].name, "Third");
    }
}
