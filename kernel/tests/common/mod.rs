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

//! Scenario driver for the threading tests.
//!
//! Every case forks: the child brings up its own runtime, signal handler and
//! interval timer, so cases cannot contaminate each other, and a wedged
//! scheduler shows up as a timeout instead of hanging the suite. Crash cases
//! expect the child to die abnormally.

use std::io::Write;
use std::time::{Duration, Instant};

#[allow(dead_code)] // not every suite has crash cases
#[derive(Debug)]
pub enum Expect {
    /// Child exits with this status.
    Code(i32),
    /// Child dies by panic, abort or signal.
    Crash,
}

pub struct Case {
    pub name: &'static str,
    pub func: fn() -> i32,
    pub expect: Expect,
}

#[derive(Debug)]
enum Outcome {
    Exited(i32),
    Signaled(i32),
    TimedOut,
}

pub fn run_suite(suite: &str, cases: &[Case], timeout: Duration) -> ! {
    println!("starting {} test", suite);
    let mut failures = 0;

    for (index, case) in cases.iter().enumerate() {
        print!("Case {}: {} ... ", index + 1, case.name);
        std::io::stdout().flush().unwrap();

        match unsafe { libc::fork() } {
            -1 => panic!("fork() failed"),
            0 => {
                let exit_code = (case.func)();
                std::process::exit(exit_code);
            }
            child => {
                let outcome = wait_with_timeout(child, timeout);
                let passed = match (&case.expect, &outcome) {
                    (Expect::Code(want), Outcome::Exited(got)) => want == got,
                    (Expect::Crash, Outcome::Exited(got)) => *got != 0,
                    (Expect::Crash, Outcome::Signaled(_)) => true,
                    _ => false,
                };
                if passed {
                    println!("PASSED");
                } else {
                    failures += 1;
                    match outcome {
                        Outcome::Exited(got) => println!("FAILED (exit {})", got),
                        Outcome::Signaled(signum) => println!("FAILED (signal {})", signum),
                        Outcome::TimedOut => println!("TIMEOUT"),
                    }
                }
            }
        }
    }

    if failures == 0 {
        println!("{} test done", suite);
    }
    std::process::exit(failures)
}

fn wait_with_timeout(child: libc::pid_t, timeout: Duration) -> Outcome {
    let start = Instant::now();
    loop {
        let mut status: libc::c_int = 0;
        let ret = unsafe { libc::waitpid(child, &mut status, libc::WNOHANG) };
        if ret == child {
            if libc::WIFEXITED(status) {
                return Outcome::Exited(libc::WEXITSTATUS(status));
            }
            if libc::WIFSIGNALED(status) {
                return Outcome::Signaled(libc::WTERMSIG(status));
            }
            continue;
        }
        assert!(ret == 0, "waitpid failed");

        if start.elapsed() >= timeout {
            unsafe {
                libc::kill(child, libc::SIGKILL);
                libc::waitpid(child, &mut status, 0);
            }
            return Outcome::TimedOut;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
}
