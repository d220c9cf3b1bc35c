// Copyright 2024 xjoy Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Conversions from raw `i16` kernel values to calibrated values.
//!
//! None of these functions clamp. Raw `-32768` is slightly outside of the documented ranges.

const AXIS_MAX: f64 = 32767.0;
const TRIGGER_SPAN: f64 = 65534.0;

/// `raw / 32767`, left/down is negative.
pub fn normalize_bidirectional(raw: i16) -> f64 {
    f64::from(raw) / AXIS_MAX
}

/// `-raw / 32767`, for axes where the kernel reports up as negative.
pub fn normalize_bidirectional_inverted(raw: i16) -> f64 {
    f64::from(-i32::from(raw)) / AXIS_MAX
}

/// Maps whole `i16` range to `[0, 1]`.
pub fn normalize_trigger(raw: i16) -> f64 {
    (f64::from(raw) + AXIS_MAX) / TRIGGER_SPAN
}

/// Sign of `raw` as one of `-1.0`, `0.0` or `1.0`.
pub fn normalize_hat(raw: i16) -> f64 {
    f64::from(raw.signum())
}

pub fn normalize_hat_inverted(raw: i16) -> f64 {
    f64::from(-raw.signum())
}

pub fn normalize_button(raw: i16) -> bool {
    raw != 0
}
