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

use crate::{clock, thread};
use log::{LevelFilter, Metadata, Record};
use std::sync::Once;

struct Logger;

static LOGGER: Logger = Logger;
static LOGGER_ONCE: Once = Once::new();

pub(crate) fn init(verbose: bool) {
    LOGGER_ONCE.call_once(|| {
        log::set_logger(&LOGGER).expect("logger already installed");
    });
    log::set_max_level(if verbose {
        LevelFilter::Trace
    } else {
        LevelFilter::Warn
    });
}

impl log::Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let timestamp = clock::uptime_ms();
        let tid = thread::try_current_id().unwrap_or(-1);
        crate::masked_eprintln!(
            "[T:{:06} TH:{}][{}] {}",
            timestamp,
            tid,
            record.level(),
            record.args()
        );
    }

    fn flush(&self) {}
}
