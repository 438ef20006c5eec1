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

use core::fmt;

/// Negative sentinel codes of the threading runtime. The numeric values are
/// part of the public contract: a thread's exit code can carry one of them
/// (e.g. a killed thread exits with `KILLED`).
pub mod code {
    pub const OK: super::Error = super::Error(0);
    pub const INVALID: super::Error = super::Error(-1);
    pub const NONE: super::Error = super::Error(-3);
    pub const NOMORE: super::Error = super::Error(-4);
    pub const NOMEMORY: super::Error = super::Error(-5);
    pub const DEADLOCK: super::Error = super::Error(-6);
    pub const KILLED: super::Error = super::Error(-9);
}

const OK_STR: &str = "ok";
const INVALID_STR: &str = "invalid thread or argument";
const NONE_STR: &str = "no runnable threads";
const NOMORE_STR: &str = "thread limit reached";
const NOMEMORY_STR: &str = "out of memory";
const DEADLOCK_STR: &str = "deadlock detected";
const KILLED_STR: &str = "thread killed";
const UNKNOWN_STR: &str = "unknown error";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct Error(i32);

impl Error {
    pub fn from_errno(errno: i32) -> Error {
        Error(errno)
    }

    pub fn to_errno(self) -> i32 {
        self.0
    }

    pub fn name(&self) -> &'static str {
        match *self {
            code::OK => OK_STR,
            code::INVALID => INVALID_STR,
            code::NONE => NONE_STR,
            code::NOMORE => NOMORE_STR,
            code::NOMEMORY => NOMEMORY_STR,
            code::DEADLOCK => DEADLOCK_STR,
            code::KILLED => KILLED_STR,
            _ => UNKNOWN_STR,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errno_round_trip() {
        assert_eq!(Error::from_errno(-6), code::DEADLOCK);
        assert_eq!(code::KILLED.to_errno(), -9);
        assert_eq!(code::INVALID.to_errno(), -1);
    }

    #[test]
    fn names() {
        assert_eq!(code::DEADLOCK.name(), "deadlock detected");
        assert_eq!(Error::from_errno(-100).name(), "unknown error");
    }
}
