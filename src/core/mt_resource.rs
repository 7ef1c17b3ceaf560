use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A thread-safe, reference-counted resource container with read-write locking.
///
/// `MtResource` is the handle used for state that producer threads and the
/// scheduler both touch: the quantizer's palette slot, the in-memory world and
/// the recording collaborators. Cloning the handle shares the same value.
///
/// A poisoned lock is recovered rather than propagated: a producer thread that
/// panicked mid-draw must not take the scheduler down with it.
///
/// # Examples
///
/// ```
/// use voxel_placer::core::MtResource;
///
/// let counter = MtResource::new(0);
/// let shared = counter.clone();
///
/// std::thread::spawn(move || *shared.get_mut() += 1)
///     .join()
///     .unwrap();
///
/// assert_eq!(*counter.get(), 1);
/// ```
pub struct MtResource<T: Send + Sync> {
    resource: Arc<RwLock<T>>,
}

impl<T: Send + Sync + 'static> MtResource<T> {
    /// Creates a new `MtResource` containing the given value.
    pub fn new(resource: T) -> Self {
        Self {
            resource: Arc::new(RwLock::new(resource)),
        }
    }

    /// Returns a read guard over the contained value.
    ///
    /// Concurrent readers do not block each other.
    pub fn get(&self) -> RwLockReadGuard<'_, T> {
        self.resource.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns an exclusive guard over the contained value.
    pub fn get_mut(&self) -> RwLockWriteGuard<'_, T> {
        self.resource.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Send + Sync> Clone for MtResource<T> {
    fn clone(&self) -> Self {
        Self {
            resource: self.resource.clone(),
        }
    }
}

impl<T: Send + Sync + Default + 'static> Default for MtResource<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poisoned_lock_is_recovered() {
        let resource = MtResource::new(1);
        let shared = resource.clone();
        let _ = std::thread::spawn(move || {
            let _guard = shared.get_mut();
            panic!("poison the lock");
        })
        .join();

        *resource.get_mut() += 1;
        assert_eq!(*resource.get(), 2);
    }
}
