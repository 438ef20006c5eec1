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

use crate::{
    config::MAX_THREADS,
    error::Error,
    irq::IrqGuard,
    scheduler::wait_queue::{OwnerSlot, WaitQueue},
    thread,
};
use core::cell::Cell;
use core::ptr::NonNull;

/// Blocking lock with first-come first-served handoff.
///
/// Contenders park in a FIFO wait queue whose owner slot aliases `holder`,
/// so the deadlock detector sees queued acquirers as waiting on whichever
/// thread holds the lock right now.
///
/// Dropping a lock that is held, contended, or still referenced by a
/// condition variable crashes the process.
pub struct Lock {
    // Boxed so the holder slot and queue keep their addresses when the
    // handle moves between owners.
    pub(crate) inner: Box<LockInner>,
}

pub(crate) struct LockInner {
    pub(crate) holder: OwnerSlot,
    pending: WaitQueue,
    pub(crate) cv_refs: Cell<u32>,
}

impl LockInner {
    /// Acquire with interrupts already masked. Loops over sleeps: a wakeup
    /// only means the previous holder released, not that the lock is ours.
    pub(crate) fn acquire_locked(&self) -> Result<(), Error> {
        while self.holder.get().is_some() {
            thread::sleep(&self.pending)?;
        }
        debug_assert!(self.holder.get().is_none());
        self.holder.set(Some(thread::current()));
        Ok(())
    }

    pub(crate) fn release_locked(&self) {
        assert!(
            self.holder.get() == Some(thread::current()),
            "lock released by a thread that does not hold it"
        );
        self.holder.set(None);
        thread::wakeup(&self.pending, false);
    }
}

impl Lock {
    /// A new, available lock.
    pub fn new() -> Lock {
        let _irq = IrqGuard::new();
        let inner = Box::new(LockInner {
            holder: Cell::new(None),
            pending: WaitQueue::new(MAX_THREADS).expect("lock wait queue"),
            cv_refs: Cell::new(0),
        });
        inner.pending.set_owner(Some(NonNull::from(&inner.holder)));
        Lock { inner }
    }

    /// Acquire the lock, parking FIFO behind earlier contenders.
    ///
    /// `DEADLOCK` when blocking would close a wait cycle, `NONE` when the
    /// lock is taken and nothing else can run; the lock is not acquired in
    /// either case.
    pub fn acquire(&self) -> Result<(), Error> {
        let _irq = IrqGuard::new();
        self.inner.acquire_locked()
    }

    /// Release the lock and wake the longest-waiting contender, if any.
    /// Crashes unless the caller is the holder.
    pub fn release(&self) {
        let _irq = IrqGuard::new();
        self.inner.release_locked();
    }
}

impl Default for Lock {
    fn default() -> Self {
        Lock::new()
    }
}

impl Drop for Lock {
    fn drop(&mut self) {
        let _irq = IrqGuard::new();
        assert!(
            self.inner.holder.get().is_none(),
            "lock destroyed while held"
        );
        assert_eq!(
            self.inner.cv_refs.get(),
            0,
            "lock destroyed with condition variables attached"
        );
        assert_eq!(
            self.inner.pending.count(),
            0,
            "lock destroyed with waiters pending"
        );
    }
}
