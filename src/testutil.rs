use std::sync::{Mutex, MutexGuard, OnceLock};

/// Serializes tests that touch process-global state: environment variables
/// and signal subscriptions.
pub(crate) fn process_lock() -> MutexGuard<'static, ()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}
