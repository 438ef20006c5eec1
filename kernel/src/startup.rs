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

//! Bring-up and tear-down of the runtime singletons.

use crate::{
    clock,
    error::Error,
    irq, logger, scheduler, thread,
};

/// Startup options.
#[derive(Debug, Clone)]
pub struct Config {
    /// Dispatch policy: `"fcfs"` (round-robin under preemption) or `"rand"`.
    pub sched_name: &'static str,
    /// Arm the periodic preemption interrupt.
    pub preemptive: bool,
    /// Raise the log level and print interrupt-delivery diagnostics.
    pub verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            sched_name: "fcfs",
            preemptive: false,
            verbose: false,
        }
    }
}

/// Initialize the runtime on the calling thread, which becomes thread 0.
///
/// Subsystems come up in order: interrupt mask (closed), dispatch policy,
/// thread registry, and finally the interrupt source when preemptive.
/// Interrupts are enabled on return. Fails with `INVALID` for an unknown
/// policy name; must not be called twice.
pub fn start(config: &Config) -> Result<(), Error> {
    clock::init();
    logger::init(config.verbose);

    irq::init(config.verbose);
    if let Err(err) = scheduler::init(config.sched_name) {
        irq::end();
        return Err(err);
    }
    thread::init();
    if config.preemptive {
        irq::start_preemption();
    }
    irq::on();

    log::debug!(
        "runtime started (sched={}, preemptive={})",
        config.sched_name,
        config.preemptive
    );
    Ok(())
}

/// Process-level exit hook, reached when the last thread exits. Unwinds the
/// subsystems in reverse order and leaves with the dying thread's exit code.
pub(crate) fn terminate(exit_code: i32) -> ! {
    irq::off();
    green_arch::arch::Arch::stop_interval_timer();
    log::debug!("last thread exited, unloading runtime");
    thread::end();
    scheduler::destroy();
    irq::end();
    std::process::exit(exit_code)
}
