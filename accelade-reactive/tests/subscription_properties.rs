//! Property tests for subscription bookkeeping

use accelade_reactive::{KeyedSubscribers, SubscriberList, Unsubscribe};
use proptest::prelude::*;
use std::cell::Cell;
use std::rc::Rc;

proptest! {
    /// Unsubscribing a handle any number of times removes exactly its own
    /// registration
    #[test]
    fn prop_unsubscribe_is_idempotent(
        total in 1usize..12,
        removals in prop::collection::vec((0usize..12, 1usize..4), 0..20),
    ) {
        let list: SubscriberList<dyn Fn()> = SubscriberList::new();
        let hits: Vec<Rc<Cell<u32>>> = (0..total).map(|_| Rc::new(Cell::new(0))).collect();
        let handles: Vec<Unsubscribe> = hits
            .iter()
            .map(|hit| {
                let hit = hit.clone();
                list.add(Rc::new(move || hit.set(hit.get() + 1)))
            })
            .collect();

        let mut removed = vec![false; total];
        for (index, times) in removals {
            let index = index % total;
            for _ in 0..times {
                handles[index].unsubscribe();
            }
            removed[index] = true;
        }

        list.notify(|f| f());

        let remaining = removed.iter().filter(|r| !**r).count();
        prop_assert_eq!(list.len(), remaining);
        for (hit, was_removed) in hits.iter().zip(&removed) {
            prop_assert_eq!(hit.get(), if *was_removed { 0 } else { 1 });
        }
    }

    /// Keyed registrations never leave empty key sets behind
    #[test]
    fn prop_keyed_sets_do_not_grow(keys in prop::collection::vec("[a-c]", 1..16)) {
        let keyed: KeyedSubscribers<dyn Fn()> = KeyedSubscribers::new();
        let handles: Vec<Unsubscribe> = keys
            .iter()
            .map(|key| keyed.add(key, Rc::new(|| {})))
            .collect();

        for handle in &handles {
            handle.unsubscribe();
            handle.unsubscribe();
        }
        prop_assert_eq!(keyed.key_count(), 0);
    }
}
