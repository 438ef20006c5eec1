// Copyright (c) 2025 vivo Mobile Communication Co., Ltd.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//       http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Bounded FIFO of threads, linked through fields of the thread records
//! themselves. A thread is in at most one queue at a time; the `in_queue`
//! flag on the record enforces it.
//!
//! A queue optionally carries an *owner slot*: an indirection to the record
//! of whichever thread is currently responsible for the resource the queue
//! guards (a lock's holder, a join target, the holder of a cv's lock). The
//! slot is read through the owning structure on every query, so the observed
//! owner tracks handover without the queue being updated. The deadlock
//! detector walks these back-references.

use crate::{
    error::{code, Error},
    thread::{Thread, Tid},
};
use core::cell::Cell;
use core::ptr::NonNull;

/// The target of a queue's owner back-reference: a cell holding the thread
/// that currently owns the guarded resource.
pub(crate) type OwnerSlot = Cell<Option<NonNull<Thread>>>;

#[derive(Debug)]
pub struct WaitQueue {
    capacity: usize,
    len: Cell<usize>,
    head: Cell<Option<NonNull<Thread>>>,
    tail: Cell<Option<NonNull<Thread>>>,
    owner: Cell<Option<NonNull<OwnerSlot>>>,
}

impl WaitQueue {
    /// A queue able to hold up to `capacity` threads, or `None` when
    /// `capacity` is zero.
    pub fn new(capacity: usize) -> Option<WaitQueue> {
        if capacity == 0 {
            return None;
        }
        Some(WaitQueue {
            capacity,
            len: Cell::new(0),
            head: Cell::new(None),
            tail: Cell::new(None),
            owner: Cell::new(None),
        })
    }

    pub fn count(&self) -> usize {
        self.len.get()
    }

    pub(crate) fn set_owner(&self, slot: Option<NonNull<OwnerSlot>>) {
        self.owner.set(slot);
    }

    /// The thread currently responsible for this queue, read through the
    /// owner slot. `None` when no slot is attached or the slot is empty.
    pub(crate) fn owner_thread(&self) -> Option<NonNull<Thread>> {
        self.owner.get().and_then(|slot| unsafe { slot.as_ref() }.get())
    }

    /// Append `node`. Fails with `NOMORE` at capacity; a node that is
    /// already queued somewhere is a caller bug and crashes.
    pub(crate) fn push(&self, node: NonNull<Thread>) -> Result<(), Error> {
        let t = unsafe { node.as_ref() };
        assert!(!t.in_queue.get(), "thread {} is already in a queue", t.id);
        if self.len.get() == self.capacity {
            return Err(code::NOMORE);
        }
        t.qprev.set(self.tail.get());
        t.qnext.set(None);
        match self.tail.get() {
            Some(tail) => unsafe { tail.as_ref() }.qnext.set(Some(node)),
            None => self.head.set(Some(node)),
        }
        self.tail.set(Some(node));
        self.len.set(self.len.get() + 1);
        t.in_queue.set(true);
        Ok(())
    }

    /// Remove and return the first thread, or `None` if empty.
    pub(crate) fn pop(&self) -> Option<NonNull<Thread>> {
        let node = self.head.get()?;
        self.unlink(node);
        Some(node)
    }

    /// Peek at the first thread without removing it.
    pub(crate) fn top(&self) -> Option<NonNull<Thread>> {
        self.head.get()
    }

    /// Remove the thread with identifier `id`, preserving the relative order
    /// of the rest. O(n) scan; ids within a queue are unique.
    pub(crate) fn remove(&self, id: Tid) -> Option<NonNull<Thread>> {
        let mut cursor = self.head.get();
        while let Some(node) = cursor {
            let t = unsafe { node.as_ref() };
            if t.id == id {
                self.unlink(node);
                return Some(node);
            }
            cursor = t.qnext.get();
        }
        None
    }

    fn unlink(&self, node: NonNull<Thread>) {
        let t = unsafe { node.as_ref() };
        debug_assert!(t.in_queue.get());
        match t.qprev.get() {
            Some(prev) => unsafe { prev.as_ref() }.qnext.set(t.qnext.get()),
            None => self.head.set(t.qnext.get()),
        }
        match t.qnext.get() {
            Some(next) => unsafe { next.as_ref() }.qprev.set(t.qprev.get()),
            None => self.tail.set(t.qprev.get()),
        }
        t.qnext.set(None);
        t.qprev.set(None);
        t.in_queue.set(false);
        self.len.set(self.len.get() - 1);
    }
}

impl Drop for WaitQueue {
    fn drop(&mut self) {
        assert_eq!(self.count(), 0, "wait queue destroyed while not empty");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nodes(n: usize) -> Vec<Box<Thread>> {
        (0..n).map(|i| Thread::bare(i as Tid)).collect()
    }

    fn nn(t: &Box<Thread>) -> NonNull<Thread> {
        NonNull::from(&**t)
    }

    fn drain(q: &WaitQueue) {
        while q.pop().is_some() {}
    }

    #[test]
    fn zero_capacity_rejected() {
        assert!(WaitQueue::new(0).is_none());
    }

    #[test]
    fn fifo_order() {
        let ts = nodes(3);
        let q = WaitQueue::new(8).unwrap();
        for t in &ts {
            q.push(nn(t)).unwrap();
        }
        assert_eq!(q.count(), 3);
        assert_eq!(q.top(), Some(nn(&ts[0])));
        assert_eq!(q.pop(), Some(nn(&ts[0])));
        assert_eq!(q.pop(), Some(nn(&ts[1])));
        assert_eq!(q.pop(), Some(nn(&ts[2])));
        assert_eq!(q.pop(), None);
    }

    #[test]
    fn push_at_capacity_fails() {
        let ts = nodes(2);
        let q = WaitQueue::new(1).unwrap();
        q.push(nn(&ts[0])).unwrap();
        assert_eq!(q.push(nn(&ts[1])), Err(code::NOMORE));
        drain(&q);
    }

    #[test]
    fn remove_keeps_relative_order() {
        let ts = nodes(4);
        let q = WaitQueue::new(8).unwrap();
        for t in &ts {
            q.push(nn(t)).unwrap();
        }
        assert_eq!(q.remove(2), Some(nn(&ts[2])));
        assert_eq!(q.remove(2), None);
        assert!(!ts[2].in_queue.get());
        assert_eq!(q.pop(), Some(nn(&ts[0])));
        assert_eq!(q.pop(), Some(nn(&ts[1])));
        assert_eq!(q.pop(), Some(nn(&ts[3])));
    }

    #[test]
    fn remove_head_and_tail() {
        let ts = nodes(3);
        let q = WaitQueue::new(8).unwrap();
        for t in &ts {
            q.push(nn(t)).unwrap();
        }
        assert_eq!(q.remove(0), Some(nn(&ts[0])));
        assert_eq!(q.remove(2), Some(nn(&ts[2])));
        assert_eq!(q.pop(), Some(nn(&ts[1])));
        assert_eq!(q.count(), 0);
    }

    #[test]
    fn requeue_after_pop() {
        let ts = nodes(1);
        let q = WaitQueue::new(2).unwrap();
        q.push(nn(&ts[0])).unwrap();
        assert_eq!(q.pop(), Some(nn(&ts[0])));
        q.push(nn(&ts[0])).unwrap();
        assert_eq!(q.count(), 1);
        drain(&q);
    }

    #[test]
    #[should_panic(expected = "already in a queue")]
    fn double_push_crashes() {
        let ts = nodes(1);
        // ManuallyDrop: the queue is non-empty when the panic unwinds past it.
        let q = core::mem::ManuallyDrop::new(WaitQueue::new(4).unwrap());
        q.push(nn(&ts[0])).unwrap();
        let _ = q.push(nn(&ts[0]));
    }

    #[test]
    fn owner_tracks_slot_updates() {
        let ts = nodes(2);
        let q = WaitQueue::new(4).unwrap();
        assert_eq!(q.owner_thread(), None);

        let slot: OwnerSlot = Cell::new(Some(nn(&ts[0])));
        q.set_owner(Some(NonNull::from(&slot)));
        assert_eq!(q.owner_thread(), Some(nn(&ts[0])));

        // Handover at the source is visible without touching the queue.
        slot.set(Some(nn(&ts[1])));
        assert_eq!(q.owner_thread(), Some(nn(&ts[1])));
        slot.set(None);
        assert_eq!(q.owner_thread(), None);
    }
}
