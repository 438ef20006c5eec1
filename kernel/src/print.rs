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

/// Print a line with interrupts masked, so preemption cannot interleave the
/// output of two threads. The usual diagnostic helper inside and around
/// critical regions.
#[macro_export]
macro_rules! masked_println {
    ($($arg:tt)*) => {{
        let _irq = $crate::irq::IrqGuard::new();
        println!($($arg)*);
    }};
}

/// [`masked_println!`] for standard error.
#[macro_export]
macro_rules! masked_eprintln {
    ($($arg:tt)*) => {{
        let _irq = $crate::irq::IrqGuard::new();
        eprintln!($($arg)*);
    }};
}
