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

//! Interrupt masking and the periodic interrupt source.
//!
//! The "interrupt line" is `SIGALRM`: masking interrupts blocks the signal
//! with `sigprocmask`, unmasking unblocks it, and the kernel keeps a blocked
//! delivery pending until the mask opens again. The interrupt source is the
//! real-time interval timer.

use super::Arch;
use core::{mem, ptr};
use libc::{c_int, itimerval, sigaction, sigset_t, timeval};

/// Signal used to model interrupt delivery.
pub const INTR_SIGNAL: c_int = libc::SIGALRM;

pub type SignalHandlerFn = extern "C" fn(c_int);

fn intr_sigset() -> sigset_t {
    unsafe {
        let mut set: sigset_t = mem::zeroed();
        libc::sigemptyset(&mut set);
        libc::sigaddset(&mut set, INTR_SIGNAL);
        set
    }
}

impl Arch {
    /// Mask interrupt delivery. Returns whether interrupts were previously
    /// enabled so the caller can restore the state it found.
    pub fn disable_interrupts() -> bool {
        let set = intr_sigset();
        unsafe {
            let mut old: sigset_t = mem::zeroed();
            let rc = libc::sigprocmask(libc::SIG_BLOCK, &set, &mut old);
            assert_eq!(rc, 0, "sigprocmask(SIG_BLOCK) failed");
            libc::sigismember(&old, INTR_SIGNAL) == 0
        }
    }

    /// Unmask interrupt delivery. Returns the previous state, mirroring
    /// [`Arch::disable_interrupts`]. A delivery that arrived while masked is
    /// raised by the kernel as soon as this returns.
    pub fn enable_interrupts() -> bool {
        let set = intr_sigset();
        unsafe {
            let mut old: sigset_t = mem::zeroed();
            let rc = libc::sigprocmask(libc::SIG_UNBLOCK, &set, &mut old);
            assert_eq!(rc, 0, "sigprocmask(SIG_UNBLOCK) failed");
            libc::sigismember(&old, INTR_SIGNAL) == 0
        }
    }

    pub fn restore_interrupts(enabled: bool) -> bool {
        if enabled {
            Self::enable_interrupts()
        } else {
            Self::disable_interrupts()
        }
    }

    pub fn is_interrupts_active() -> bool {
        unsafe {
            let mut cur: sigset_t = mem::zeroed();
            let rc = libc::sigprocmask(libc::SIG_SETMASK, ptr::null(), &mut cur);
            assert_eq!(rc, 0, "sigprocmask(query) failed");
            libc::sigismember(&cur, INTR_SIGNAL) == 0
        }
    }

    /// Install `handler` for the interrupt signal. The signal itself is part
    /// of `sa_mask`, so a handler entered by delivery runs with interrupts
    /// masked until it unmasks them or returns.
    pub fn install_interrupt_handler(handler: SignalHandlerFn) {
        unsafe {
            let mut sa: sigaction = mem::zeroed();
            sa.sa_sigaction = handler as usize;
            libc::sigemptyset(&mut sa.sa_mask);
            libc::sigaddset(&mut sa.sa_mask, INTR_SIGNAL);
            sa.sa_flags = 0;
            let rc = libc::sigaction(INTR_SIGNAL, &sa, ptr::null_mut());
            assert_eq!(rc, 0, "sigaction(install) failed");
        }
    }

    pub fn remove_interrupt_handler() {
        unsafe {
            let mut sa: sigaction = mem::zeroed();
            sa.sa_sigaction = libc::SIG_DFL;
            libc::sigemptyset(&mut sa.sa_mask);
            let rc = libc::sigaction(INTR_SIGNAL, &sa, ptr::null_mut());
            assert_eq!(rc, 0, "sigaction(remove) failed");
        }
    }

    /// Arm the periodic interrupt source with the given period.
    pub fn start_interval_timer(period_us: u64) {
        let period = timeval {
            tv_sec: (period_us / 1_000_000) as libc::time_t,
            tv_usec: (period_us % 1_000_000) as libc::suseconds_t,
        };
        let timer = itimerval {
            it_interval: period,
            it_value: period,
        };
        let rc = unsafe { libc::setitimer(libc::ITIMER_REAL, &timer, ptr::null_mut()) };
        assert_eq!(rc, 0, "setitimer(arm) failed");
    }

    pub fn stop_interval_timer() {
        let zero = timeval {
            tv_sec: 0,
            tv_usec: 0,
        };
        let timer = itimerval {
            it_interval: zero,
            it_value: zero,
        };
        let rc = unsafe { libc::setitimer(libc::ITIMER_REAL, &timer, ptr::null_mut()) };
        assert_eq!(rc, 0, "setitimer(disarm) failed");
    }

    /// Async-signal-safe write of a fixed diagnostic message. Usable from the
    /// interrupt handler where the formatting machinery is off-limits.
    pub fn raw_diag_write(msg: &[u8]) {
        unsafe {
            libc::write(
                libc::STDERR_FILENO,
                msg.as_ptr() as *const libc::c_void,
                msg.len(),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_save_restore() {
        let initial = Arch::is_interrupts_active();

        let was = Arch::disable_interrupts();
        assert_eq!(was, initial);
        assert!(!Arch::is_interrupts_active());

        // Nested disable observes the masked state.
        assert!(!Arch::disable_interrupts());
        assert!(!Arch::is_interrupts_active());

        Arch::restore_interrupts(true);
        assert!(Arch::is_interrupts_active());

        Arch::restore_interrupts(initial);
    }
}
