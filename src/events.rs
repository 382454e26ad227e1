//! Synchronous change notifications
//!
//! Single-threaded observer channel used by the settings root. Handlers run on
//! the thread that made the change, in subscription order, before the mutator
//! returns. A handler may mutate the settings again or (un)subscribe while it
//! runs; only the mutators' "unchanged value" checks stop notification loops.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// Handle returned by [`Event::subscribe`], used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionToken(u64);

type Handler<T> = Rc<dyn Fn(&T)>;

pub struct Event<T> {
    next_token: Cell<u64>,
    handlers: RefCell<Vec<(SubscriptionToken, Handler<T>)>>,
}

impl<T> Event<T> {
    pub fn new() -> Self {
        Self {
            next_token: Cell::new(0),
            handlers: RefCell::new(Vec::new()),
        }
    }

    pub fn subscribe<F>(&self, handler: F) -> SubscriptionToken
    where
        F: Fn(&T) + 'static,
    {
        let token = SubscriptionToken(self.next_token.get());
        self.next_token.set(token.0 + 1);
        self.handlers.borrow_mut().push((token, Rc::new(handler)));
        token
    }

    /// Returns false if the token was already removed
    pub fn unsubscribe(&self, token: SubscriptionToken) -> bool {
        let mut handlers = self.handlers.borrow_mut();
        let before = handlers.len();
        handlers.retain(|(t, _)| *t != token);
        handlers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.handlers.borrow().len()
    }

    pub fn emit(&self, value: &T) {
        // Snapshot so handlers can subscribe or unsubscribe while running
        let handlers: Vec<Handler<T>> = self
            .handlers
            .borrow()
            .iter()
            .map(|(_, handler)| Rc::clone(handler))
            .collect();

        for handler in handlers {
            handler(value);
        }
    }
}

impl<T> Default for Event<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Event<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
