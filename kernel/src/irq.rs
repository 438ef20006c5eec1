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

//! The interrupt mask, the runtime's only critical-section mechanism.
//!
//! Every entry point that touches the registry, the scheduler or a wait queue
//! masks interrupts first and restores the saved state on the way out. The
//! preemption source re-enters [`crate::thread::yield_to`] from the interrupt
//! handler; a delivery that lands while the mask is closed stays pending
//! until the mask opens again, so masked regions are never preempted.

use crate::{
    config::TIMER_INTERVAL_US,
    thread::{self, ANY},
};
use core::sync::atomic::{AtomicBool, Ordering};
use green_arch::arch::Arch;
use libc::c_int;

static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Mask interrupt delivery. Returns whether interrupts were enabled before.
pub fn off() -> bool {
    Arch::disable_interrupts()
}

/// Unmask interrupt delivery. Returns whether interrupts were enabled before.
pub fn on() -> bool {
    Arch::enable_interrupts()
}

/// Restore a state previously returned by [`off`], [`on`] or [`set`].
pub fn set(enabled: bool) -> bool {
    Arch::restore_interrupts(enabled)
}

pub fn enabled() -> bool {
    Arch::is_interrupts_active()
}

/// Masks interrupts on construction, restores the saved state on drop. When
/// the guarded region suspends, the restore happens on the resumption path of
/// the owning thread because the guard lives on that thread's stack.
pub struct IrqGuard(bool);

impl IrqGuard {
    pub fn new() -> Self {
        IrqGuard(off())
    }
}

impl Default for IrqGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for IrqGuard {
    fn drop(&mut self) {
        set(self.0);
    }
}

/// Preemption is indistinguishable from a voluntary yield: the handler
/// re-enters the scheduler and the interrupted thread resumes here later,
/// returning through the kernel's signal frame. Nothing on this path may
/// allocate, hence the fixed-byte diagnostic.
extern "C" fn preempt_handler(_signum: c_int) {
    if VERBOSE.load(Ordering::Relaxed) {
        Arch::raw_diag_write(b"green_kernel: preemption tick\n");
    }
    let _ = thread::yield_to(ANY);
}

/// Install the handler with interrupts masked. [`crate::startup::start`]
/// opens the mask once the rest of the runtime is up.
pub(crate) fn init(verbose: bool) {
    VERBOSE.store(verbose, Ordering::Relaxed);
    off();
    Arch::install_interrupt_handler(preempt_handler);
}

pub(crate) fn start_preemption() {
    Arch::start_interval_timer(TIMER_INTERVAL_US);
}

/// Tear down the interrupt source. Leaves interrupts masked: with the
/// disposition back at default, one stray pending delivery would kill the
/// process.
pub(crate) fn end() {
    off();
    Arch::stop_interval_timer();
    Arch::remove_interrupt_handler();
}
