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

//! First-come first-served dispatch: a thin wrapper over the wait queue.
//! Under preemption the periodic yield turns this into round-robin.

use super::{Scheduler, WaitQueue};
use crate::{
    config::MAX_THREADS,
    error::Error,
    thread::{Thread, Tid},
};
use core::ptr::NonNull;

pub(crate) struct Fcfs {
    ready: WaitQueue,
}

impl Fcfs {
    pub fn new() -> Self {
        Fcfs {
            ready: WaitQueue::new(MAX_THREADS).expect("ready queue"),
        }
    }
}

impl Scheduler for Fcfs {
    fn enqueue(&mut self, thread: NonNull<Thread>) -> Result<(), Error> {
        self.ready.push(thread)
    }

    fn dequeue(&mut self) -> Option<NonNull<Thread>> {
        self.ready.pop()
    }

    fn remove(&mut self, tid: Tid) -> Option<NonNull<Thread>> {
        self.ready.remove(tid)
    }
}
