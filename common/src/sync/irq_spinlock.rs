use core::{
    cell::UnsafeCell,
    marker::PhantomData,
    sync::atomic::{AtomicBool, Ordering},
};

use super::irq::IrqControl;

/// IRQ-safe spinlock.
///
/// - Disables interrupts on lock
/// - Spins until acquired
/// - Restores interrupt state on drop
///
/// Safe to use from:
/// - interrupt handlers
/// - thread mode (the main loop)
///
/// On a single core the spin never contends: whoever holds the lock has
/// interrupts masked, so no handler can run until the guard is dropped.
///
/// Not fair. Not reentrant.
pub struct IrqSpinLock<T, I: IrqControl> {
    locked: AtomicBool,
    data: UnsafeCell<T>,
    _irq: PhantomData<I>,
}

unsafe impl<T: Send, I: IrqControl> Send for IrqSpinLock<T, I> {}
unsafe impl<T: Send, I: IrqControl> Sync for IrqSpinLock<T, I> {}

impl<T, I: IrqControl> IrqSpinLock<T, I> {
    /// Create a new IRQ-safe spinlock.
    pub const fn new(data: T) -> Self {
        Self {
            locked: AtomicBool::new(false),
            data: UnsafeCell::new(data),
            _irq: PhantomData,
        }
    }

    /// Acquire the lock with interrupts disabled.
    pub fn lock(&self) -> IrqSpinLockGuard<'_, T, I> {
        let irq_state = I::disable();

        while self
            .locked
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            core::hint::spin_loop();
        }

        IrqSpinLockGuard {
            lock: self,
            irq_state,
        }
    }

    /// Try to acquire the lock once.
    ///
    /// Interrupts are left untouched when the lock is already held.
    pub fn try_lock(&self) -> Option<IrqSpinLockGuard<'_, T, I>> {
        let irq_state = I::disable();

        if self
            .locked
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
        {
            Some(IrqSpinLockGuard {
                lock: self,
                irq_state,
            })
        } else {
            I::restore(irq_state);
            None
        }
    }

    /// Run `f` with exclusive access to the protected data.
    pub fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut guard = self.lock();
        f(&mut guard)
    }
}

/// Guard returned by `IrqSpinLock::lock`.
///
/// Restores interrupt state on drop.
pub struct IrqSpinLockGuard<'a, T, I: IrqControl> {
    lock: &'a IrqSpinLock<T, I>,
    irq_state: I::State,
}

impl<T, I: IrqControl> core::ops::Deref for IrqSpinLockGuard<'_, T, I> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        // SAFETY: The lock is held, so we have exclusive access
        unsafe { &*self.lock.data.get() }
    }
}

impl<T, I: IrqControl> core::ops::DerefMut for IrqSpinLockGuard<'_, T, I> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        // SAFETY: The lock is held, so we have exclusive access
        unsafe { &mut *self.lock.data.get() }
    }
}

impl<T, I: IrqControl> Drop for IrqSpinLockGuard<'_, T, I> {
    fn drop(&mut self) {
        // Release lock first
        self.lock.locked.store(false, Ordering::Release);

        I::restore(self.irq_state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::AtomicUsize;

    static MASKED: AtomicBool = AtomicBool::new(false);
    static RESTORES: AtomicUsize = AtomicUsize::new(0);

    /// Host stand-in for PRIMASK.
    struct HostIrq;

    impl IrqControl for HostIrq {
        type State = bool;

        fn disable() -> bool {
            !MASKED.swap(true, Ordering::SeqCst)
        }

        fn restore(prev_enabled: bool) {
            RESTORES.fetch_add(1, Ordering::SeqCst);
            if prev_enabled {
                MASKED.store(false, Ordering::SeqCst);
            }
        }
    }

    // One test owns the global HostIrq state so the assertions cannot race.
    #[test]
    fn guard_masks_and_restores_interrupts() {
        let lock: IrqSpinLock<u32, HostIrq> = IrqSpinLock::new(7);

        {
            let mut guard = lock.lock();
            assert!(MASKED.load(Ordering::SeqCst));
            *guard += 1;

            assert!(lock.try_lock().is_none());
            // A failed try_lock must not unmask while the guard is alive.
            assert!(MASKED.load(Ordering::SeqCst));
        }
        assert!(!MASKED.load(Ordering::SeqCst));

        assert_eq!(lock.with(|value| *value), 8);
        assert!(!MASKED.load(Ordering::SeqCst));
        assert!(RESTORES.load(Ordering::SeqCst) >= 3);

        let guard = lock.try_lock();
        assert_eq!(guard.as_deref(), Some(&8));
    }
}
