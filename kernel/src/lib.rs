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

//! Cooperative user-level threading with optional timer preemption.
//!
//! All threads share one OS execution context; the runtime multiplexes them
//! with explicit machine-context switches. A process-wide interrupt mask is
//! the sole critical-section mechanism: with it closed, nothing can preempt,
//! and the periodic preemption signal stays pending until it opens again.
//!
//! Call [`startup::start`] once; the calling thread becomes thread 0. Then
//! spawn threads, yield, join, and synchronize through [`sync::Lock`] and
//! [`sync::Cv`], both FIFO-fair and deadlock-detecting.

pub mod clock;
pub mod config;
pub mod error;
pub mod irq;
mod logger;
mod print;
pub mod scheduler;
mod stack;
pub mod startup;
pub mod sync;
pub mod thread;

pub use error::{code, Error};
pub use scheduler::WaitQueue;
pub use startup::{start, Config};
pub use thread::{Tid, ANY};
