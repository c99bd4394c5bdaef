// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Lifecycle hooks for custom layers.

use std::collections::HashMap;

/// Lifecycle step of a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    Load,
    Remove,
    Open,
    Close,
}

/// Arguments passed to custom layer hooks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomLayerEvent {
    pub event: LifecycleEvent,
    pub layer_id: String,
    pub node_id: String,
}

type Handler<A> = Box<dyn FnMut(&A)>;

/// Callback registry keyed by lifecycle event.
///
/// Handlers run in registration order.
pub struct Hooks<A> {
    handlers: HashMap<LifecycleEvent, Vec<Handler<A>>>,
}

impl<A> std::fmt::Debug for Hooks<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let counts: HashMap<_, _> = self
            .handlers
            .iter()
            .map(|(event, handlers)| (*event, handlers.len()))
            .collect();
        f.debug_struct("Hooks").field("handlers", &counts).finish()
    }
}

impl<A> Default for Hooks<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> Hooks<A> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a handler for an event.
    pub fn on(&mut self, event: LifecycleEvent, handler: impl FnMut(&A) + 'static) {
        self.handlers.entry(event).or_default().push(Box::new(handler));
    }

    /// Run every handler registered for `event`; returns how many ran.
    pub fn emit(&mut self, event: LifecycleEvent, args: &A) -> usize {
        let Some(handlers) = self.handlers.get_mut(&event) else {
            return 0;
        };
        for handler in handlers.iter_mut() {
            handler(args);
        }
        handlers.len()
    }

    #[must_use]
    pub fn handler_count(&self, event: LifecycleEvent) -> usize {
        self.handlers.get(&event).map_or(0, Vec::len)
    }

    pub fn clear(&mut self) {
        self.handlers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_emit_runs_handlers_in_order() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut hooks: Hooks<u32> = Hooks::new();

        let first = Rc::clone(&seen);
        hooks.on(LifecycleEvent::Load, move |n| first.borrow_mut().push(("first", *n)));
        let second = Rc::clone(&seen);
        hooks.on(LifecycleEvent::Load, move |n| second.borrow_mut().push(("second", *n)));

        assert_eq!(hooks.emit(LifecycleEvent::Load, &7), 2);
        assert_eq!(*seen.borrow(), [("first", 7), ("second", 7)]);
    }

    #[test]
    fn test_emit_without_handlers() {
        let mut hooks: Hooks<()> = Hooks::new();
        assert_eq!(hooks.emit(LifecycleEvent::Close, &()), 0);
        hooks.on(LifecycleEvent::Open, |_| {});
        assert_eq!(hooks.handler_count(LifecycleEvent::Open), 1);
        assert_eq!(hooks.handler_count(LifecycleEvent::Close), 0);
        hooks.clear();
        assert_eq!(hooks.handler_count(LifecycleEvent::Open), 0);
    }
}
