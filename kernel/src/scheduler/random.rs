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

//! Randomized dispatch: `dequeue` picks a uniformly random ready thread.
//! Useful for shaking out ordering assumptions in tests.

use super::Scheduler;
use crate::{
    config::MAX_THREADS,
    error::{code, Error},
    thread::{Thread, Tid},
};
use core::ptr::NonNull;

pub(crate) struct Random {
    ready: Vec<NonNull<Thread>>,
}

impl Random {
    pub fn new() -> Self {
        Random {
            // Reserved up front so enqueue never allocates on a hot path.
            ready: Vec::with_capacity(MAX_THREADS),
        }
    }
}

impl Scheduler for Random {
    fn enqueue(&mut self, thread: NonNull<Thread>) -> Result<(), Error> {
        if self.ready.len() == MAX_THREADS {
            return Err(code::NOMORE);
        }
        self.ready.push(thread);
        Ok(())
    }

    fn dequeue(&mut self) -> Option<NonNull<Thread>> {
        if self.ready.is_empty() {
            return None;
        }
        let pick = unsafe { libc::rand() } as usize % self.ready.len();
        Some(self.ready.swap_remove(pick))
    }

    fn remove(&mut self, tid: Tid) -> Option<NonNull<Thread>> {
        let pos = self
            .ready
            .iter()
            .position(|t| unsafe { t.as_ref() }.id == tid)?;
        Some(self.ready.swap_remove(pos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn dequeues_every_ready_thread_once() {
        let ts: Vec<_> = (0..8).map(|i| Thread::bare(i as Tid)).collect();
        let mut sched = Random::new();
        for t in &ts {
            sched.enqueue(NonNull::from(&**t)).unwrap();
        }
        let mut seen = HashSet::new();
        while let Some(t) = sched.dequeue() {
            assert!(seen.insert(unsafe { t.as_ref() }.id));
        }
        assert_eq!(seen.len(), 8);
    }

    #[test]
    fn remove_by_id() {
        let ts: Vec<_> = (0..3).map(|i| Thread::bare(i as Tid)).collect();
        let mut sched = Random::new();
        for t in &ts {
            sched.enqueue(NonNull::from(&**t)).unwrap();
        }
        assert_eq!(sched.remove(1), Some(NonNull::from(&*ts[1])));
        assert_eq!(sched.remove(1), None);
        assert_eq!(sched.remove(7), None);
    }
}
