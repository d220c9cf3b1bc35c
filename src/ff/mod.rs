// Copyright 2024 xjoy Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Force feedback module
//!
//! Xbox-compatible controllers accept rumble commands as a raw HID output report. This bypasses
//! the kernel force feedback API, so it also drives the trigger motors, which the input subsystem
//! does not expose.
//!
//! ```rust,no_run
//! use xjoy::ff::{HidRaw, Motor, NoRemediation, RumbleCommand};
//!
//! let mut hid = HidRaw::open("/dev/hidraw2", &NoRemediation).unwrap();
//! let mut cmd = RumbleCommand::default();
//! cmd.enable.toggle(Motor::Left);
//! cmd.strength.raise(Motor::Strong);
//! hid.send(&cmd).unwrap();
//! ```
//!
//! # Wire format
//!
//! Report is 9 bytes long and is always encoded explicitly, byte by byte:
//!
//! | byte | content                                                        |
//! |------|----------------------------------------------------------------|
//! | 0    | command, `0x03`                                                |
//! | 1    | enabled motors: bit 0 weak, bit 1 strong, bit 2 right, bit 3 left |
//! | 2–5  | strength of left, right, strong and weak motor, 0–100 %        |
//! | 6    | sustain, in 10 ms units                                        |
//! | 7    | release, in 10 ms units                                        |
//! | 8    | loop count                                                     |

pub mod hidraw;

pub use self::hidraw::{HidRaw, NoRemediation, PermissionPolicy, SudoChmod};

use crate::utils;

use std::error;
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Command byte of rumble report.
pub const RUMBLE_CMD: u8 = 0x03;
/// Size of encoded rumble report.
pub const RUMBLE_REPORT_SIZE: usize = 9;
/// Maximal motor strength, in percent.
pub const MAX_STRENGTH: u8 = 100;

const ENABLE_WEAK: u8 = 0;
const ENABLE_STRONG: u8 = 1;
const ENABLE_RIGHT: u8 = 2;
const ENABLE_LEFT: u8 = 3;
const ENABLE_MASK: u8 = 0x0f;

/// One of four rumble motors.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Motor {
    /// High frequency motor in right grip.
    Weak,
    /// Low frequency motor in left grip.
    Strong,
    /// Left trigger motor.
    Left,
    /// Right trigger motor.
    Right,
}

impl Motor {
    pub const ALL: [Motor; 4] = [Motor::Strong, Motor::Weak, Motor::Left, Motor::Right];

    fn enable_bit(self) -> u8 {
        match self {
            Motor::Weak => ENABLE_WEAK,
            Motor::Strong => ENABLE_STRONG,
            Motor::Right => ENABLE_RIGHT,
            Motor::Left => ENABLE_LEFT,
        }
    }
}

/// Which motors are driven by a command.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Motors {
    pub weak: bool,
    pub strong: bool,
    pub right: bool,
    pub left: bool,
}

impl Motors {
    pub fn all() -> Self {
        Motors {
            weak: true,
            strong: true,
            right: true,
            left: true,
        }
    }

    pub fn none() -> Self {
        Motors {
            weak: false,
            strong: false,
            right: false,
            left: false,
        }
    }

    pub fn is_enabled(&self, motor: Motor) -> bool {
        *self.flag(motor)
    }

    pub fn set(&mut self, motor: Motor, enabled: bool) {
        *self.flag_mut(motor) = enabled;
    }

    pub fn toggle(&mut self, motor: Motor) {
        let flag = self.flag_mut(motor);
        *flag = !*flag;
    }

    fn flag(&self, motor: Motor) -> &bool {
        match motor {
            Motor::Weak => &self.weak,
            Motor::Strong => &self.strong,
            Motor::Right => &self.right,
            Motor::Left => &self.left,
        }
    }

    fn flag_mut(&mut self, motor: Motor) -> &mut bool {
        match motor {
            Motor::Weak => &mut self.weak,
            Motor::Strong => &mut self.strong,
            Motor::Right => &mut self.right,
            Motor::Left => &mut self.left,
        }
    }

    fn to_byte(self) -> u8 {
        Motor::ALL
            .iter()
            .filter(|m| self.is_enabled(**m))
            .fold(0, |byte, m| byte | (1 << m.enable_bit()))
    }

    fn from_byte(byte: u8) -> Self {
        let mut motors = Motors::none();
        for motor in Motor::ALL.iter().copied() {
            motors.set(motor, utils::test_bit(motor.enable_bit(), byte));
        }
        motors
    }
}

impl Default for Motors {
    fn default() -> Self {
        Motors::all()
    }
}

/// Motor strengths in percent, `0..=100`.
///
/// The range is only enforced by [`set`](Strength::set), [`raise`](Strength::raise) and
/// [`lower`](Strength::lower). Fields are public and [`RumbleCommand::decode`] keeps any byte, so
/// a decoded `150` is encoded back as `150`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Strength {
    pub left: u8,
    pub right: u8,
    pub strong: u8,
    pub weak: u8,
}

impl Strength {
    pub fn get(&self, motor: Motor) -> u8 {
        match motor {
            Motor::Weak => self.weak,
            Motor::Strong => self.strong,
            Motor::Right => self.right,
            Motor::Left => self.left,
        }
    }

    /// Sets strength of `motor`, capped at [`MAX_STRENGTH`]. Returns the stored value.
    pub fn set(&mut self, motor: Motor, value: u8) -> u8 {
        let value = value.min(MAX_STRENGTH);
        match motor {
            Motor::Weak => self.weak = value,
            Motor::Strong => self.strong = value,
            Motor::Right => self.right = value,
            Motor::Left => self.left = value,
        }
        value
    }

    /// Increases strength by one percent, up to [`MAX_STRENGTH`].
    pub fn raise(&mut self, motor: Motor) {
        let value = self.get(motor).saturating_add(1);
        self.set(motor, value);
    }

    /// Decreases strength by one percent, down to zero.
    pub fn lower(&mut self, motor: Motor) {
        let value = self.get(motor).saturating_sub(1);
        self.set(motor, value);
    }
}

impl Default for Strength {
    fn default() -> Self {
        Strength {
            left: 20,
            right: 20,
            strong: 40,
            weak: 30,
        }
    }
}

/// Pulse shape. Durations are in 10 ms units.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Pulse {
    pub sustain_10ms: u8,
    pub release_10ms: u8,
    pub loop_count: u8,
}

impl Default for Pulse {
    fn default() -> Self {
        Pulse {
            sustain_10ms: 5,
            release_10ms: 5,
            loop_count: 1,
        }
    }
}

/// Editable parameter of [`Pulse`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PulseParam {
    Sustain,
    Release,
    Loop,
}

impl Pulse {
    pub fn get(&self, param: PulseParam) -> u8 {
        match param {
            PulseParam::Sustain => self.sustain_10ms,
            PulseParam::Release => self.release_10ms,
            PulseParam::Loop => self.loop_count,
        }
    }

    fn field_mut(&mut self, param: PulseParam) -> &mut u8 {
        match param {
            PulseParam::Sustain => &mut self.sustain_10ms,
            PulseParam::Release => &mut self.release_10ms,
            PulseParam::Loop => &mut self.loop_count,
        }
    }

    /// Increments `param`, saturating at 255.
    pub fn raise(&mut self, param: PulseParam) {
        let v = self.field_mut(param);
        *v = v.saturating_add(1);
    }

    pub fn lower(&mut self, param: PulseParam) {
        let v = self.field_mut(param);
        *v = v.saturating_sub(1);
    }
}

/// Rumble command for Xbox-compatible controllers.
///
/// Created with default values once per session, optionally edited, and sent with
/// [`HidRaw::send`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct RumbleCommand {
    pub enable: Motors,
    pub strength: Strength,
    pub pulse: Pulse,
}

impl RumbleCommand {
    /// Defaults of the interactive rumble console: same as `default()` but loops 3 times.
    pub fn console_default() -> Self {
        RumbleCommand {
            pulse: Pulse {
                loop_count: 3,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Encodes command as HID output report.
    pub fn encode(&self) -> [u8; RUMBLE_REPORT_SIZE] {
        [
            RUMBLE_CMD,
            self.enable.to_byte(),
            self.strength.left,
            self.strength.right,
            self.strength.strong,
            self.strength.weak,
            self.pulse.sustain_10ms,
            self.pulse.release_10ms,
            self.pulse.loop_count,
        ]
    }

    /// Decodes HID output report produced by [`encode`](Self::encode).
    ///
    /// Strength values are taken as is, even if they exceed [`MAX_STRENGTH`].
    pub fn decode(buf: &[u8]) -> Result<Self, DecodeError> {
        if buf.len() != RUMBLE_REPORT_SIZE {
            return Err(DecodeError::InvalidLength(buf.len()));
        }
        if buf[0] != RUMBLE_CMD {
            return Err(DecodeError::InvalidCommand(buf[0]));
        }
        if buf[1] & !ENABLE_MASK != 0 {
            return Err(DecodeError::ReservedBits(buf[1]));
        }

        Ok(RumbleCommand {
            enable: Motors::from_byte(buf[1]),
            strength: Strength {
                left: buf[2],
                right: buf[3],
                strong: buf[4],
                weak: buf[5],
            },
            pulse: Pulse {
                sustain_10ms: buf[6],
                release_10ms: buf[7],
                loop_count: buf[8],
            },
        })
    }
}

impl Display for RumbleCommand {
    /// One row in the layout of rumble console: command, enable flags (strong, weak, left,
    /// right), four unused columns, strengths, sustain, release and loop count.
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_fmt(format_args!(
            "{:02X}  {}   {}   {}   {}   0   0   0   0  {:03} {:03} {:03} {:03}  {:03} {:03}  {:03}",
            RUMBLE_CMD,
            self.enable.strong as u8,
            self.enable.weak as u8,
            self.enable.left as u8,
            self.enable.right as u8,
            self.strength.strong,
            self.strength.weak,
            self.strength.left,
            self.strength.right,
            self.pulse.sustain_10ms,
            self.pulse.release_10ms,
            self.pulse.loop_count
        ))
    }
}

/// Error returned by [`RumbleCommand::decode`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DecodeError {
    InvalidLength(usize),
    InvalidCommand(u8),
    ReservedBits(u8),
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match *self {
            DecodeError::InvalidLength(len) => f.write_fmt(format_args!(
                "rumble report must be {} bytes long, got {}",
                RUMBLE_REPORT_SIZE, len
            )),
            DecodeError::InvalidCommand(cmd) => {
                f.write_fmt(format_args!("unknown rumble command {:#04x}", cmd))
            }
            DecodeError::ReservedBits(byte) => {
                f.write_fmt(format_args!("reserved enable bits set in {:#010b}", byte))
            }
        }
    }
}

impl error::Error for DecodeError {}
