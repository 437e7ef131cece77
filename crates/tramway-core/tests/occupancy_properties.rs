//! Capacity invariant of passenger sets under arbitrary operation sequences

use proptest::prelude::*;
use tramway_core::{FaultKind, Occupancy, Person};

#[derive(Debug, Clone)]
enum Op {
    Add(f64),
    RemoveAt(usize),
    RemoveStranger,
    Clear,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (30.0f64..150.0).prop_map(Op::Add),
        2 => (0usize..16).prop_map(Op::RemoveAt),
        1 => Just(Op::RemoveStranger),
        1 => Just(Op::Clear),
    ]
}

proptest! {
    #[test]
    fn capacity_never_exceeded(capacity in 1usize..8, ops in prop::collection::vec(op(), 0..64)) {
        let mut set = Occupancy::new(capacity).unwrap();

        for op in ops {
            match op {
                Op::Add(weight) => {
                    let was_full = set.is_full();
                    let before = set.len();
                    match set.add(Person::new("rider", weight)) {
                        Ok(()) => prop_assert_eq!(set.len(), before + 1),
                        Err(fault) => {
                            prop_assert!(was_full);
                            prop_assert_eq!(fault.kind, FaultKind::Occupancy);
                            prop_assert_eq!(set.len(), before);
                        }
                    }
                }
                Op::RemoveAt(index) => {
                    if let Some(id) = set.people().get(index).map(|p| p.id) {
                        prop_assert!(set.remove(id).is_some());
                    }
                }
                Op::RemoveStranger => {
                    let before = set.len();
                    prop_assert!(set.remove(Person::new("stranger", 80.0).id).is_none());
                    prop_assert_eq!(set.len(), before);
                }
                Op::Clear => set.clear(),
            }

            prop_assert!(set.len() <= set.capacity());
            let sum: f64 = set.people().iter().map(|p| p.weight).sum();
            prop_assert!((set.total_weight() - sum).abs() < 1e-9);
        }
    }
}
