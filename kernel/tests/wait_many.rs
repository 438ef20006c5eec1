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

//! Many joiners on one exiting thread: every queued joiner observes the exit
//! code, and a joiner arriving after the exit finds the slot consumed.

mod common;

use common::{Case, Expect};
use green_kernel::{code, irq, masked_println, startup, thread, Config, Tid};
use std::sync::atomic::{AtomicUsize, Ordering::SeqCst};
use std::time::Duration;

const NTHREADS: usize = 64;
const SECRET: i32 = 42;

static READY: AtomicUsize = AtomicUsize::new(0);
static DONE: AtomicUsize = AtomicUsize::new(0);

fn joiner_body(parent: Tid) -> i32 {
    // The increment and the join must be one atomic step, or the parent
    // could exit between them.
    irq::off();
    READY.fetch_add(1, SeqCst);
    let ret = thread::wait(parent);
    // The join must hand back the mask state it was entered with.
    assert!(!irq::enabled());
    irq::on();

    match ret {
        Ok(exit_code) => {
            assert_eq!(exit_code, SECRET);
            masked_println!("{}: thread woken, parent exit {}", thread::current_id(), exit_code);
        }
        Err(err) => {
            // Only the late joiner, after the exit was already consumed.
            assert_eq!(err, code::INVALID);
            masked_println!("{}: parent gone or waited for", thread::current_id());
        }
    }

    if DONE.fetch_add(1, SeqCst) == NTHREADS {
        masked_println!("wait_many test done");
    }
    0
}

fn wait_many() -> i32 {
    startup::start(&Config {
        sched_name: "rand",
        preemptive: true,
        verbose: false,
    })
    .expect("runtime start");

    let parent = thread::current_id();
    for _ in 0..NTHREADS {
        thread::spawn(move || joiner_body(parent)).expect("spawn joiner");
    }

    // Make sure every joiner is queued before we exit. With preemption the
    // yield may find nothing runnable once they all block.
    while READY.load(SeqCst) < NTHREADS {
        match thread::yield_to(thread::ANY) {
            Ok(_) => {}
            Err(err) => assert_eq!(err, code::NONE),
        }
    }

    // Spawned with the mask closed so it cannot run before our exit: this
    // joiner misses the train and must see INVALID.
    irq::off();
    thread::spawn(move || joiner_body(parent)).expect("spawn late joiner");
    thread::exit(SECRET)
}

fn main() {
    let cases = [Case {
        name: "64 joiners + 1 late joiner",
        func: wait_many,
        expect: Expect::Code(0),
    }];
    common::run_suite("wait_many", &cases, Duration::from_secs(20));
}
