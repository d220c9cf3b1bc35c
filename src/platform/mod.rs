// Copyright 2024 xjoy Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Module which exports the platform-specific types.
//!
//! Only Linux joystick interface (`/dev/input/js*`) and hidraw are supported. The backend has to
//! provide:
//!
//! * A `JsDevice` (opened device node with its `DeviceInfo`)
//! * A `ReaderHandle` and `spawn_reader` running the event loop on a background thread

pub use self::platform::*;

#[cfg(target_os = "linux")]
#[path = "linux/mod.rs"]
mod platform;

#[cfg(not(target_os = "linux"))]
compile_error!("xjoy only supports Linux joystick and hidraw devices");
