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

//! Machine-context initialization and the context-swap primitive.

use super::Arch;
use core::{mem, ptr};

/// Saved machine context of a thread: registers, stack and signal mask.
pub type Context = libc::ucontext_t;

impl Arch {
    /// A zeroed context, to be filled by the first swap that saves into it.
    pub fn empty_context() -> Context {
        unsafe { mem::zeroed() }
    }

    /// Initialize `ctx` so that the first switch into it enters `entry` on
    /// the given stack. `entry` must never return; a return would land in a
    /// torn-down frame because no successor context is linked.
    ///
    /// # Safety
    ///
    /// `stack_bottom..stack_bottom + stack_size` must stay valid and unused
    /// by anything else for as long as the context may run.
    pub unsafe fn init_thread_context(
        ctx: *mut Context,
        stack_bottom: *mut u8,
        stack_size: usize,
        entry: extern "C" fn(),
    ) {
        let rc = libc::getcontext(ctx);
        assert_eq!(rc, 0, "getcontext failed");
        (*ctx).uc_link = ptr::null_mut();
        (*ctx).uc_stack.ss_sp = stack_bottom as *mut libc::c_void;
        (*ctx).uc_stack.ss_size = stack_size;
        (*ctx).uc_stack.ss_flags = 0;
        libc::makecontext(ctx, entry, 0);
    }

    /// Save the running context into `save` and resume `load`. Returns when
    /// some later swap loads `save` again; the signal mask captured in
    /// `load` is restored as part of the swap.
    ///
    /// # Safety
    ///
    /// `load` must have been filled by [`Arch::init_thread_context`] or by a
    /// previous save, and its stack must still be alive.
    pub unsafe fn context_switch(save: *mut Context, load: *const Context) {
        let rc = libc::swapcontext(save, load);
        assert_eq!(rc, 0, "swapcontext failed");
    }
}
