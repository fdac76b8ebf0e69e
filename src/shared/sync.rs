use std::sync::{Mutex, MutexGuard, PoisonError};

/// Locks a std mutex, recovering the data if a previous holder panicked.
///
/// Only used for short, non-async critical sections (listener tables,
/// outbound sender slots).
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
