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

use crate::config::STACK_ALIGN;
use core::ptr::NonNull;
use std::alloc::{self, Layout};

/// Heap-allocated execution stack, owned by exactly one thread and freed
/// exactly once: either by the first context switch that observes the owner
/// as a zombie, or by the reaper tearing the thread down.
#[derive(Debug)]
pub(crate) struct Stack {
    bottom: NonNull<u8>,
    size: usize,
}

impl Stack {
    /// Allocate a stack of `size` bytes. `None` when the allocator fails,
    /// which the caller reports as an out-of-memory error.
    pub fn alloc(size: usize) -> Option<Stack> {
        let layout = Layout::from_size_align(size, STACK_ALIGN).ok()?;
        let ptr = unsafe { alloc::alloc(layout) };
        NonNull::new(ptr).map(|bottom| Stack { bottom, size })
    }

    /// Pointer to the lowest address of the stack.
    pub fn bottom_ptr(&self) -> *mut u8 {
        self.bottom.as_ptr()
    }

    pub fn size(&self) -> usize {
        self.size
    }
}

impl Drop for Stack {
    fn drop(&mut self) {
        let layout = Layout::from_size_align(self.size, STACK_ALIGN).expect("stack layout");
        unsafe { alloc::dealloc(self.bottom.as_ptr(), layout) };
    }
}
