// Copyright 2024 xjoy Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

mod device;
mod ioctl;
mod reader;

pub use self::device::{DeviceInfo, JsDevice};
pub use self::reader::{spawn_reader, ReaderHandle, ReaderState, StopReason, READ_TIMEOUT_MS};
