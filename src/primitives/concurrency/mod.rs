use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::{Mutex, MutexGuard};

use crate::error::{IndexError, Result};

static NEXT_LOCK_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a [`WriteLock`].
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct LockId(u64);

impl fmt::Display for LockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lock#{}", self.0)
    }
}

/// Single-writer lock serializing structural updates.
///
/// Readers never touch this lock. Writers hold a [`WritePermit`] for the whole
/// sequence of mutations that make up one logical change, and every mutating
/// index operation demands that permit as an argument.
pub struct WriteLock {
    id: LockId,
    mutex: Mutex<()>,
}

/// Proof that the holder owns a [`WriteLock`]; released on drop.
pub struct WritePermit<'a> {
    owner: LockId,
    _guard: MutexGuard<'a, ()>,
}

impl WriteLock {
    /// Creates a lock with a fresh identity.
    pub fn new() -> Self {
        Self {
            id: LockId(NEXT_LOCK_ID.fetch_add(1, Ordering::Relaxed)),
            mutex: Mutex::new(()),
        }
    }

    /// Returns the identity permits issued by this lock carry.
    pub fn id(&self) -> LockId {
        self.id
    }

    /// Acquires the lock, blocking until the current writer releases it.
    pub fn acquire(&self) -> WritePermit<'_> {
        WritePermit {
            owner: self.id,
            _guard: self.mutex.lock(),
        }
    }

    /// Attempts to acquire the lock without blocking.
    pub fn try_acquire(&self) -> Option<WritePermit<'_>> {
        self.mutex.try_lock().map(|guard| WritePermit {
            owner: self.id,
            _guard: guard,
        })
    }

    /// Returns whether a writer currently holds the lock.
    pub fn is_held(&self) -> bool {
        self.mutex.is_locked()
    }
}

impl Default for WriteLock {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for WriteLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriteLock")
            .field("id", &self.id)
            .field("held", &self.is_held())
            .finish()
    }
}

impl WritePermit<'_> {
    /// Identity of the lock that issued this permit.
    pub fn owner(&self) -> LockId {
        self.owner
    }

    /// Fails with [`IndexError::ForeignPermit`] unless this permit was issued by `owner`.
    pub fn check(&self, owner: LockId) -> Result<()> {
        if self.owner == owner {
            Ok(())
        } else {
            Err(IndexError::ForeignPermit)
        }
    }
}

/// A value published by reference swap.
///
/// [`Published::load`] is lock-free and always yields a complete snapshot.
/// [`Published::write`] serializes writers and stages changes on a private
/// copy, which is swapped in when the guard drops.
pub struct Published<V> {
    current: ArcSwap<V>,
    lock: WriteLock,
}

/// Staged write against a [`Published`] value.
pub struct PublishGuard<'a, V: Clone> {
    _permit: WritePermit<'a>,
    target: &'a ArcSwap<V>,
    staged: Arc<V>,
    dirty: bool,
}

impl<V> Published<V> {
    /// Publishes `value` as the initial snapshot.
    pub fn new(value: V) -> Self {
        Self {
            current: ArcSwap::from_pointee(value),
            lock: WriteLock::new(),
        }
    }

    /// Returns the current snapshot without locking.
    pub fn load(&self) -> Arc<V> {
        self.current.load_full()
    }

    /// Acquires the writer lock and stages changes on top of the current snapshot.
    pub fn write(&self) -> PublishGuard<'_, V>
    where
        V: Clone,
    {
        let permit = self.lock.acquire();
        PublishGuard {
            _permit: permit,
            target: &self.current,
            staged: self.current.load_full(),
            dirty: false,
        }
    }
}

impl<V: Default> Default for Published<V> {
    fn default() -> Self {
        Self::new(V::default())
    }
}

impl<V: Clone> PublishGuard<'_, V> {
    /// Publishes the staged value now instead of at drop.
    pub fn publish(self) {}

    /// Drops the staged changes; readers keep seeing the previous snapshot.
    pub fn discard(mut self) {
        self.dirty = false;
    }
}

impl<V: Clone> Deref for PublishGuard<'_, V> {
    type Target = V;

    fn deref(&self) -> &V {
        &self.staged
    }
}

impl<V: Clone> DerefMut for PublishGuard<'_, V> {
    fn deref_mut(&mut self) -> &mut V {
        self.dirty = true;
        // Clones once while the published snapshot still shares the value;
        // later calls find it unique and mutate in place.
        Arc::make_mut(&mut self.staged)
    }
}

impl<V: Clone> Drop for PublishGuard<'_, V> {
    fn drop(&mut self) {
        if self.dirty {
            self.target.store(Arc::clone(&self.staged));
        }
    }
}
