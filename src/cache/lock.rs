//! Poison-tolerant lock acquisition for the in-process backend.
//!
//! A panic while a guard is held leaves the data structurally valid (every
//! mutation is a single map call), so the poison flag is cleared and logged.

use std::sync::{LockResult, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::warn;

fn recover<G>(
    result: LockResult<G>,
    owner: &'static str,
    op: &'static str,
    kind: &'static str,
) -> G {
    result.unwrap_or_else(|poisoned| {
        warn!(
            op,
            owner,
            lock_kind = kind,
            result = "poisoned_recovered",
            "Recovered from poisoned cache lock"
        );
        poisoned.into_inner()
    })
}

pub(crate) fn read<'a, T>(
    lock: &'a RwLock<T>,
    owner: &'static str,
    op: &'static str,
) -> RwLockReadGuard<'a, T> {
    recover(lock.read(), owner, op, "rwlock.read")
}

pub(crate) fn write<'a, T>(
    lock: &'a RwLock<T>,
    owner: &'static str,
    op: &'static str,
) -> RwLockWriteGuard<'a, T> {
    recover(lock.write(), owner, op, "rwlock.write")
}

pub(crate) fn exclusive<'a, T>(
    lock: &'a Mutex<T>,
    owner: &'static str,
    op: &'static str,
) -> MutexGuard<'a, T> {
    recover(lock.lock(), owner, op, "mutex")
}
