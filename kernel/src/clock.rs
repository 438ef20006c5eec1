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

use std::sync::OnceLock;
use std::time::{Duration, Instant};

static ORIGIN: OnceLock<Instant> = OnceLock::new();

pub(crate) fn init() {
    let _ = ORIGIN.set(Instant::now());
}

/// Milliseconds since the runtime was started. 0 before startup.
pub fn uptime_ms() -> u64 {
    ORIGIN
        .get()
        .map(|origin| origin.elapsed().as_millis() as u64)
        .unwrap_or(0)
}

/// Waste CPU cycles for `usecs` microseconds. Preemption can still strike in
/// the middle of the loop; this only guarantees that much wall-clock time has
/// passed before the caller continues.
pub fn spin(usecs: u64) {
    let deadline = Instant::now() + Duration::from_micros(usecs);
    while Instant::now() < deadline {
        std::hint::spin_loop();
    }
}
