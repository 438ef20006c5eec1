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

//! The dispatcher, pluggable at startup. The installed policy holds only
//! runnable threads; the running thread is never in it.

mod fcfs;
mod random;
pub(crate) mod wait_queue;

pub use wait_queue::WaitQueue;

use crate::{
    error::{code, Error},
    thread::{Thread, Tid},
};
use core::ptr::NonNull;

pub(crate) trait Scheduler {
    fn enqueue(&mut self, thread: NonNull<Thread>) -> Result<(), Error>;
    fn dequeue(&mut self) -> Option<NonNull<Thread>>;
    fn remove(&mut self, tid: Tid) -> Option<NonNull<Thread>>;
}

static mut SCHEDULER: Option<Box<dyn Scheduler>> = None;

/// Install the dispatch policy selected by name. `"fcfs"` or `"rand"`.
pub(crate) fn init(sched_name: &str) -> Result<(), Error> {
    let policy: Box<dyn Scheduler> = match sched_name {
        "fcfs" => Box::new(fcfs::Fcfs::new()),
        "rand" => Box::new(random::Random::new()),
        _ => return Err(code::INVALID),
    };
    unsafe {
        *(&raw mut SCHEDULER) = Some(policy);
    }
    Ok(())
}

/// Drop the installed policy. Policies assert their ready set is empty.
pub(crate) fn destroy() {
    unsafe {
        *(&raw mut SCHEDULER) = None;
    }
}

fn active() -> &'static mut dyn Scheduler {
    unsafe {
        (*(&raw mut SCHEDULER))
            .as_deref_mut()
            .expect("scheduler not initialized")
    }
}

pub(crate) fn enqueue(thread: NonNull<Thread>) -> Result<(), Error> {
    active().enqueue(thread)
}

pub(crate) fn dequeue() -> Option<NonNull<Thread>> {
    active().dequeue()
}

pub(crate) fn remove(tid: Tid) -> Option<NonNull<Thread>> {
    active().remove(tid)
}
