// Copyright 2024 xjoy Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Joystick events, logical controls and the state they update.

pub mod normalize;
pub mod state;

use std::fmt::{Display, Formatter, Result as FmtResult};

pub use self::state::{JoystickState, SharedState};

/// Button pressed or released.
pub const JS_EVENT_BUTTON: u8 = 0x01;
/// Axis moved.
pub const JS_EVENT_AXIS: u8 = 0x02;
/// Synthetic event describing initial state of the device.
pub const JS_EVENT_INIT: u8 = 0x80;

/// Size of `struct js_event` as read from `/dev/input/js*`.
pub const RAW_EVENT_SIZE: usize = 8;

/// Type byte of a raw joystick event. May have `JS_EVENT_INIT` bit set.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct EventKind(u8);

impl EventKind {
    pub const AXIS: EventKind = EventKind(JS_EVENT_AXIS);
    pub const BUTTON: EventKind = EventKind(JS_EVENT_BUTTON);

    pub fn from_raw(raw: u8) -> Self {
        EventKind(raw)
    }

    pub fn into_raw(self) -> u8 {
        self.0
    }

    /// Returns `true` if this event was generated by the driver to report initial state.
    pub fn is_init(self) -> bool {
        self.0 & JS_EVENT_INIT != 0
    }

    /// Same kind with init flag cleared. Init and live events are handled identically.
    pub fn without_init(self) -> Self {
        EventKind(self.0 & !JS_EVENT_INIT)
    }

    /// Same kind with init flag set.
    pub fn with_init(self) -> Self {
        EventKind(self.0 | JS_EVENT_INIT)
    }

    pub fn is_axis(self) -> bool {
        self.without_init().0 == JS_EVENT_AXIS
    }

    pub fn is_button(self) -> bool {
        self.without_init().0 == JS_EVENT_BUTTON
    }
}

/// One record read from joystick device.
///
/// Layout on the wire is `struct js_event { u32 time; i16 value; u8 type; u8 number; }` in native
/// byte order.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RawEvent {
    /// Event timestamp in milliseconds. Not used by the state.
    pub time: u32,
    pub value: i16,
    pub kind: EventKind,
    /// Raw axis or button index.
    pub index: u8,
}

impl RawEvent {
    pub fn axis(index: u8, value: i16) -> Self {
        RawEvent {
            time: 0,
            value,
            kind: EventKind::AXIS,
            index,
        }
    }

    pub fn button(index: u8, value: i16) -> Self {
        RawEvent {
            time: 0,
            value,
            kind: EventKind::BUTTON,
            index,
        }
    }

    pub fn from_bytes(buf: [u8; RAW_EVENT_SIZE]) -> Self {
        RawEvent {
            time: u32::from_ne_bytes([buf[0], buf[1], buf[2], buf[3]]),
            value: i16::from_ne_bytes([buf[4], buf[5]]),
            kind: EventKind(buf[6]),
            index: buf[7],
        }
    }

    pub fn to_bytes(&self) -> [u8; RAW_EVENT_SIZE] {
        let time = self.time.to_ne_bytes();
        let value = self.value.to_ne_bytes();
        [
            time[0],
            time[1],
            time[2],
            time[3],
            value[0],
            value[1],
            self.kind.0,
            self.index,
        ]
    }
}

/// Logical axis of an Xbox-style controller.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Axis {
    /// Left stick, left [-1, 1] right.
    LeftHorizontal = 0,
    /// Left stick, down [-1, 1] up.
    LeftVertical = 1,
    /// Left trigger, free [0, 1] pressed.
    LeftTrigger = 2,
    RightHorizontal = 3,
    RightVertical = 4,
    RightTrigger = 5,
    /// D-pad, left {-1, 0, 1} right.
    HatHorizontal = 6,
    /// D-pad, down {-1, 0, 1} up.
    HatVertical = 7,
}

impl Axis {
    pub const ALL: [Axis; 8] = [
        Axis::LeftHorizontal,
        Axis::LeftVertical,
        Axis::LeftTrigger,
        Axis::RightHorizontal,
        Axis::RightVertical,
        Axis::RightTrigger,
        Axis::HatHorizontal,
        Axis::HatVertical,
    ];

    /// Key used for this axis in `axis_map` of the configuration file.
    pub fn config_key(self) -> &'static str {
        match self {
            Axis::LeftHorizontal => "X Axis",
            Axis::LeftVertical => "Y Axis",
            Axis::LeftTrigger => "Z Axis",
            Axis::RightHorizontal => "Rx Axis",
            Axis::RightVertical => "Ry Axis",
            Axis::RightTrigger => "Rz Axis",
            Axis::HatHorizontal => "Hat0X",
            Axis::HatVertical => "Hat0Y",
        }
    }

    pub fn from_config_key(key: &str) -> Option<Self> {
        Axis::ALL.iter().copied().find(|axis| axis.config_key() == key)
    }

    /// Short label used when printing state.
    pub fn label(self) -> &'static str {
        match self {
            Axis::LeftHorizontal => "X",
            Axis::LeftVertical => "Y",
            Axis::LeftTrigger => "Z",
            Axis::RightHorizontal => "Rx",
            Axis::RightVertical => "Ry",
            Axis::RightTrigger => "Rz",
            Axis::HatHorizontal => "Hat0X",
            Axis::HatVertical => "Hat0Y",
        }
    }

    /// Converts raw kernel value to calibrated value of this axis.
    pub fn normalize(self, raw: i16) -> f64 {
        use self::normalize::*;

        match self {
            Axis::LeftHorizontal | Axis::RightHorizontal => normalize_bidirectional(raw),
            // Kernel reports up as negative
            Axis::LeftVertical | Axis::RightVertical => normalize_bidirectional_inverted(raw),
            Axis::LeftTrigger | Axis::RightTrigger => normalize_trigger(raw),
            Axis::HatHorizontal => normalize_hat(raw),
            Axis::HatVertical => normalize_hat_inverted(raw),
        }
    }
}

impl Display for Axis {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.config_key())
    }
}

/// Logical button of an Xbox-style controller.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Button {
    A = 0,
    B = 1,
    X = 2,
    Y = 3,
    LeftBumper = 4,
    RightBumper = 5,
    Back = 6,
    Start = 7,
    Guide = 8,
    LeftThumb = 9,
    RightThumb = 10,
}

impl Button {
    pub const ALL: [Button; 11] = [
        Button::A,
        Button::B,
        Button::X,
        Button::Y,
        Button::LeftBumper,
        Button::RightBumper,
        Button::Back,
        Button::Start,
        Button::Guide,
        Button::LeftThumb,
        Button::RightThumb,
    ];

    /// Key used for this button in `button_map` of the configuration file.
    pub fn config_key(self) -> &'static str {
        match self {
            Button::A => "A",
            Button::B => "B",
            Button::X => "X",
            Button::Y => "Y",
            Button::LeftBumper => "LB",
            Button::RightBumper => "RB",
            Button::Back => "Back",
            Button::Start => "Start",
            Button::Guide => "Guide",
            Button::LeftThumb => "Left Thumb",
            Button::RightThumb => "Right Thumb",
        }
    }

    pub fn from_config_key(key: &str) -> Option<Self> {
        Button::ALL.iter().copied().find(|btn| btn.config_key() == key)
    }

    /// Short label used when printing state.
    pub fn label(self) -> &'static str {
        match self {
            Button::LeftThumb => "LT",
            Button::RightThumb => "RT",
            _ => self.config_key(),
        }
    }
}

impl Display for Button {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.config_key())
    }
}

/// Axis or button, as returned when an event changes state.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Control {
    Axis(Axis),
    Button(Button),
}
