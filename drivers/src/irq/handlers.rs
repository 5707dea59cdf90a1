//! Per-line callback table.

use super::line::{LINE_COUNT, Line};

/// Code run when an external interrupt line fires.
///
/// Implemented for every `Fn() + Sync` closure, so a plain function or a
/// closure capturing atomics can be registered directly.
pub trait LineHandler: Sync {
    /// Called from interrupt context, after the line's pending flag was
    /// cleared.
    fn fired(&self);
}

impl<F: Fn() + Sync> LineHandler for F {
    fn fired(&self) {
        self()
    }
}

/// Maps each of the 16 lines to an optional handler.
///
/// Written during setup, read from interrupt context.
pub struct LineRegistry<'a> {
    slots: [Option<&'a dyn LineHandler>; LINE_COUNT],
}

impl<'a> LineRegistry<'a> {
    pub const fn new() -> Self {
        Self {
            slots: [None; LINE_COUNT],
        }
    }

    /// Bind `handler` to `line`, returning the handler it replaces.
    pub fn register(
        &mut self,
        line: Line,
        handler: &'a dyn LineHandler,
    ) -> Option<&'a dyn LineHandler> {
        self.slots[line.index()].replace(handler)
    }

    /// Whether a handler is bound to `line`.
    pub fn is_registered(&self, line: Line) -> bool {
        self.slots[line.index()].is_some()
    }

    /// Invoke the handler bound to `line`, if any.
    ///
    /// Returns whether a handler ran.
    pub fn dispatch(&self, line: Line) -> bool {
        match self.slots[line.index()] {
            Some(handler) => {
                handler.fired();
                true
            }
            None => {
                log::trace!("EXTI line {} fired with no handler", line.number());
                false
            }
        }
    }
}

impl Default for LineRegistry<'_> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::{AtomicU32, Ordering};

    fn line(n: u8) -> Line {
        Line::new(n).unwrap()
    }

    #[test]
    fn dispatch_runs_registered_handler_once_per_call() {
        for n in 0..LINE_COUNT as u8 {
            let hits = AtomicU32::new(0);
            let handler = || {
                hits.fetch_add(1, Ordering::SeqCst);
            };
            let mut registry = LineRegistry::new();
            registry.register(line(n), &handler);

            assert!(registry.dispatch(line(n)));
            assert_eq!(hits.load(Ordering::SeqCst), 1);
            assert!(registry.dispatch(line(n)));
            assert_eq!(hits.load(Ordering::SeqCst), 2);
        }
    }

    #[test]
    fn latest_registration_wins() {
        let first = AtomicU32::new(0);
        let second = AtomicU32::new(0);
        let on_first = || {
            first.fetch_add(1, Ordering::SeqCst);
        };
        let on_second = || {
            second.fetch_add(1, Ordering::SeqCst);
        };

        let mut registry = LineRegistry::new();
        assert!(registry.register(line(3), &on_first).is_none());
        assert!(registry.register(line(3), &on_second).is_some());
        registry.dispatch(line(3));

        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn empty_slot_is_a_no_op() {
        let hits = AtomicU32::new(0);
        let handler = || {
            hits.fetch_add(1, Ordering::SeqCst);
        };
        let mut registry = LineRegistry::new();
        registry.register(line(4), &handler);

        assert!(!registry.dispatch(line(5)));
        assert!(!registry.is_registered(line(5)));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn struct_handlers_are_accepted() {
        struct Counter(AtomicU32);

        impl LineHandler for Counter {
            fn fired(&self) {
                self.0.fetch_add(10, Ordering::SeqCst);
            }
        }

        let counter = Counter(AtomicU32::new(0));
        let mut registry = LineRegistry::new();
        registry.register(line(12), &counter);
        registry.dispatch(line(12));
        assert_eq!(counter.0.load(Ordering::SeqCst), 10);
    }
}
