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

//! Hosted "machine" layer for the threading runtime.
//!
//! Interrupt delivery is modeled with a per-process signal mask, the periodic
//! timer with `setitimer`, and the machine-context switch with the ucontext
//! family. Everything architecture- or OS-specific lives behind [`arch::Arch`]
//! so the runtime above stays platform-agnostic.

cfg_if::cfg_if! {
    if #[cfg(all(target_os = "linux", target_env = "gnu"))] {
        pub mod linux_gnu;
        pub use crate::linux_gnu as arch;
    } else {
        compile_error!("green_arch requires a glibc Linux target (ucontext + setitimer)");
    }
}
