use series_reconciler_domain::{Entity, Occurrence, ScopedChange, ID};
use std::sync::{Mutex, MutexGuard};

/// Useful functions for creating inmemory repositories

/// A poisoned lock only means another test thread panicked while holding it
pub fn lock<T>(collection: &Mutex<Vec<T>>) -> MutexGuard<'_, Vec<T>> {
    collection.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub fn find<T: Clone + Entity>(val_id: &ID, collection: &Mutex<Vec<T>>) -> Option<T> {
    lock(collection).iter().find(|item| item.id() == val_id).cloned()
}

pub fn find_by<T: Clone, F: FnMut(&T) -> bool>(collection: &Mutex<Vec<T>>, mut compare: F) -> Vec<T> {
    lock(collection)
        .iter()
        .filter(|item| compare(*item))
        .cloned()
        .collect()
}

/// Writes a planned change into an already locked collection. Upserts
/// replace records with the same id in place, new records are appended.
pub fn apply_change(change: &ScopedChange, collection: &mut Vec<Occurrence>) {
    collection.retain(|o| !change.removals.contains(&o.id));
    for upsert in &change.upserts {
        match collection.iter_mut().find(|o| o.id == upsert.id) {
            Some(existing) => *existing = upsert.clone(),
            None => collection.push(upsert.clone()),
        }
    }
}
