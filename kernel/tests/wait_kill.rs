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

//! A blocked joiner is killed by the thread it joins: the kill lifts it out
//! of the join queue, it exits `KILLED` at its next resume, and the killer
//! then reaps it.

mod common;

use common::{Case, Expect};
use green_kernel::{code, masked_println, startup, thread, Config, Tid};
use std::time::Duration;

fn killer_body(parent: Tid) -> i32 {
    // Only two threads exist; once nothing else is runnable the parent has
    // blocked in its join on us.
    while thread::yield_to(thread::ANY) != Err(code::NONE) {}

    assert_eq!(thread::kill(parent), Ok(parent));
    let exit_code = thread::wait(parent).expect("join killed parent");
    assert_eq!(exit_code, code::KILLED.to_errno());
    masked_println!("wait_kill test done");
    0
}

fn wait_kill() -> i32 {
    startup::start(&Config {
        sched_name: "rand",
        preemptive: true,
        verbose: false,
    })
    .expect("runtime start");

    let parent = thread::current_id();
    let child = thread::spawn(move || killer_body(parent)).expect("spawn child");
    let _ = thread::wait(child);
    unreachable!("the child kills us while we join it");
}

fn main() {
    let cases = [Case {
        name: "Child kills joining parent",
        func: wait_kill,
        expect: Expect::Code(0),
    }];
    common::run_suite("wait_kill", &cases, Duration::from_secs(10));
}
