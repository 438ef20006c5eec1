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

/// Maximum number of live thread identifiers, including the bootstrap thread.
pub const MAX_THREADS: usize = 1024;

/// Minimum per-thread execution stack. Smaller requests are rounded up; the
/// stack must hold every frame of the thread including the exit path.
pub const MIN_STACK: usize = 32 << 10;

/// Period of the preemption interrupt.
pub const TIMER_INTERVAL_US: u64 = 200;

/// Alignment of heap-allocated stacks.
pub const STACK_ALIGN: usize = 16;
