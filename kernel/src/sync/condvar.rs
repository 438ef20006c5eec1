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

use super::lock::{Lock, LockInner};
use crate::{config::MAX_THREADS, error::Error, irq::IrqGuard, scheduler::WaitQueue, thread};
use core::ptr::NonNull;

/// Condition variable with first-come first-served wakeup, bound to one
/// lock for its whole lifetime.
///
/// The wait queue's owner slot aliases the *lock's* holder slot, not
/// anything of the cv itself: a thread parked here is, for deadlock
/// analysis, waiting on whoever holds the lock at the moment of the check,
/// even as the holder changes.
///
/// The associated lock must outlive the cv; `Lock` enforces that by
/// refusing to drop while condition variables are attached. Dropping a cv
/// with waiters still parked crashes the process.
pub struct Cv {
    inner: Box<CvInner>,
}

struct CvInner {
    lock: NonNull<LockInner>,
    pending: WaitQueue,
}

impl Cv {
    pub fn new(lock: &Lock) -> Cv {
        let _irq = IrqGuard::new();
        let lock_inner = NonNull::from(&*lock.inner);
        let inner = Box::new(CvInner {
            lock: lock_inner,
            pending: WaitQueue::new(MAX_THREADS).expect("cv wait queue"),
        });
        inner
            .pending
            .set_owner(Some(NonNull::from(unsafe { &lock_inner.as_ref().holder })));
        lock.inner.cv_refs.set(lock.inner.cv_refs.get() + 1);
        Cv { inner }
    }

    /// Atomically release the lock and park on the cv; re-acquire the lock
    /// before returning. Atomic because both halves run under the mask with
    /// no suspension between them other than the sleep itself.
    ///
    /// Crashes unless the caller holds the associated lock. When the sleep
    /// itself fails (`DEADLOCK`, `NONE`) the error propagates and the lock
    /// is *not* re-acquired; a failure while re-acquiring propagates too.
    pub fn wait(&self) -> Result<(), Error> {
        let _irq = IrqGuard::new();
        let lock = unsafe { self.inner.lock.as_ref() };
        assert!(
            lock.holder.get() == Some(thread::current()),
            "cv_wait without holding the associated lock"
        );
        lock.release_locked();
        thread::sleep(&self.inner.pending)?;
        lock.acquire_locked()
    }

    /// Wake the longest-waiting thread, if any.
    pub fn signal(&self) {
        let _irq = IrqGuard::new();
        thread::wakeup(&self.inner.pending, false);
    }

    /// Wake every waiting thread.
    pub fn broadcast(&self) {
        let _irq = IrqGuard::new();
        thread::wakeup(&self.inner.pending, true);
    }
}

impl Drop for Cv {
    fn drop(&mut self) {
        let _irq = IrqGuard::new();
        assert_eq!(
            self.inner.pending.count(),
            0,
            "cv destroyed with waiters pending"
        );
        let lock = unsafe { self.inner.lock.as_ref() };
        lock.cv_refs.set(lock.cv_refs.get() - 1);
    }
}
