//! Per-thread active-queue stacks.
//!
//! Each thread owns one [`ActiveQueueStack`] per queue manager. Stacks live in
//! thread-local storage and are never visible to other threads, so push, pop
//! and peek need no synchronization. A thread that never pushed has no stack
//! entry at all; one is created on the first push.

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{DevQueueError, Result};
use crate::queue::Queue;

/// LIFO sequence of activated queues.
#[derive(Debug, Default, Clone)]
pub struct ActiveQueueStack {
    entries: Vec<Queue>,
}

impl ActiveQueueStack {
    /// Create an empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Activate `queue`.
    pub fn push(&mut self, queue: Queue) {
        self.entries.push(queue);
    }

    /// Deactivate and return the top queue.
    pub fn pop(&mut self) -> Result<Queue> {
        self.entries.pop().ok_or(DevQueueError::EmptyStack)
    }

    /// Deactivate every queue above the first `len`. Returns how many were removed.
    pub fn truncate(&mut self, len: usize) -> usize {
        let removed = self.entries.len().saturating_sub(len);
        self.entries.truncate(len);
        removed
    }

    /// Top queue, if any.
    pub fn top(&self) -> Option<&Queue> {
        self.entries.last()
    }

    /// Number of activated queues.
    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is activated.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Activated queues, bottom first.
    pub fn iter(&self) -> impl Iterator<Item = &Queue> {
        self.entries.iter()
    }
}

/// Identifies the owner of a family of per-thread stacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StackOwner(u64);

impl StackOwner {
    /// Allocate a process-unique owner id.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

thread_local! {
    static ACTIVE_STACKS: RefCell<HashMap<StackOwner, ActiveQueueStack>> =
        RefCell::new(HashMap::new());
}

/// Push `queue` on the calling thread's stack for `owner`. Returns the new depth.
pub(crate) fn push(owner: StackOwner, queue: Queue) -> usize {
    ACTIVE_STACKS.with(|stacks| {
        let mut stacks = stacks.borrow_mut();
        let stack = stacks.entry(owner).or_default();
        stack.push(queue);
        stack.depth()
    })
}

/// Pop the calling thread's top queue for `owner`.
pub(crate) fn pop(owner: StackOwner) -> Result<Queue> {
    ACTIVE_STACKS.with(|stacks| {
        let mut stacks = stacks.borrow_mut();
        let stack = stacks.get_mut(&owner).ok_or(DevQueueError::EmptyStack)?;
        let queue = stack.pop()?;
        if stack.is_empty() {
            stacks.remove(&owner);
        }
        Ok(queue)
    })
}

/// Shrink the calling thread's stack for `owner` to `len` entries. Returns how
/// many queues were removed.
pub(crate) fn truncate(owner: StackOwner, len: usize) -> usize {
    ACTIVE_STACKS.with(|stacks| {
        let mut stacks = stacks.borrow_mut();
        let Some(stack) = stacks.get_mut(&owner) else {
            return 0;
        };
        let removed = stack.truncate(len);
        if stack.is_empty() {
            stacks.remove(&owner);
        }
        removed
    })
}

/// Top of the calling thread's stack for `owner`.
pub(crate) fn top(owner: StackOwner) -> Option<Queue> {
    ACTIVE_STACKS.with(|stacks| stacks.borrow().get(&owner).and_then(|s| s.top().cloned()))
}

/// Depth of the calling thread's stack for `owner`.
pub(crate) fn depth(owner: StackOwner) -> usize {
    ACTIVE_STACKS.with(|stacks| stacks.borrow().get(&owner).map_or(0, ActiveQueueStack::depth))
}

/// Copy of the calling thread's stack for `owner`.
pub(crate) fn snapshot(owner: StackOwner) -> ActiveQueueStack {
    ACTIVE_STACKS.with(|stacks| stacks.borrow().get(&owner).cloned().unwrap_or_default())
}

/// Drop the calling thread's stack for `owner`.
pub(crate) fn discard(owner: StackOwner) {
    // try_with: the manager may be dropped during thread-local teardown.
    let _ = ACTIVE_STACKS.try_with(|stacks| {
        if let Ok(mut stacks) = stacks.try_borrow_mut() {
            stacks.remove(&owner);
        }
    });
}
