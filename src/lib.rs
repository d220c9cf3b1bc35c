// Copyright 2024 xjoy Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! xjoy - Xbox joystick for Linux
//! ==============================
//!
//! xjoy reads a Linux joystick device (`/dev/input/js*`) on a background thread and keeps a
//! snapshot of named, calibrated axes and buttons. Rumble commands are sent directly to the raw
//! HID node of the same controller (`/dev/hidraw*`), so trigger motors work too.
//!
//! Example
//! -------
//!
//! ```no_run
//! use xjoy::{Config, XboxJoystick};
//!
//! let config = Config::new("/dev/input/js0", "/dev/hidraw2");
//! let mut js = XboxJoystick::new(config).unwrap();
//! js.open().unwrap();
//!
//! let state = js.state();
//! if state.button_a {
//!     println!("Left stick: {:.2} {:.2}", state.left_horizontal, state.left_vertical);
//!     js.rumble().unwrap();
//! }
//!
//! js.close().unwrap();
//! ```
//!
//! Controller layout
//! -----------------
//!
//! Raw indices are translated to logical controls by an [`InputMap`]. The default map follows
//! `xpad` driver: axes 0–7 are left stick X/Y, left trigger, right stick X/Y, right trigger and
//! D-pad X/Y; buttons 0–10 are A, B, X, Y, LB, RB, Back, Start, Guide, left and right thumb. Other
//! layouts can be given in configuration, see [`config`].
//!
//! | Control      | Range       | Direction               |
//! |--------------|-------------|-------------------------|
//! | Sticks       | `[-1, 1]`   | right and up positive   |
//! | Triggers     | `[0, 1]`    | pressed is `1`          |
//! | D-pad        | `{-1, 0, 1}`| right and up positive   |
//! | Buttons      | `bool`      |                         |
//!
//! Permissions
//! -----------
//!
//! User needs read access to the joystick node and write access to the hidraw node. Hidraw nodes
//! are usually owned by root; set `fix_hid_permissions` to let xjoy run `sudo chmod`, provide
//! own [`PermissionPolicy`](ff::PermissionPolicy) or create a udev rule.

#[macro_use]
extern crate log;

mod joystick;
mod platform;
mod utils;

pub mod config;
pub mod error;
pub mod ev;
pub mod ff;
pub mod mapping;

pub use crate::config::{Config, ConfigError};
pub use crate::error::Error;
pub use crate::ev::{Axis, Button, Control, EventKind, JoystickState, RawEvent, SharedState};
pub use crate::ff::{HidRaw, RumbleCommand};
pub use crate::joystick::XboxJoystick;
pub use crate::mapping::{InputMap, MappingData};
pub use crate::platform::{
    spawn_reader, DeviceInfo, JsDevice, ReaderHandle, ReaderState, StopReason, READ_TIMEOUT_MS,
};
