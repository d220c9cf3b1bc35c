// Copyright 2024 xjoy Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use super::normalize::normalize_button;
use super::{Axis, Button, Control, RawEvent};
use crate::mapping::InputMap;
use crate::utils;

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::io::{self, Write};
use std::sync::Mutex;

/// Calibrated state of all controls.
///
/// Fields that were never reported by the device keep their default value (`0.0` or `false`).
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct JoystickState {
    /// Left stick, left [-1, 1] right.
    pub left_horizontal: f64,
    /// Left stick, down [-1, 1] up.
    pub left_vertical: f64,
    /// Left trigger, free [0, 1] pressed.
    pub left_trigger: f64,
    pub right_horizontal: f64,
    pub right_vertical: f64,
    pub right_trigger: f64,
    /// D-pad, left {-1, 0, 1} right.
    pub hat_horizontal: f64,
    /// D-pad, down {-1, 0, 1} up.
    pub hat_vertical: f64,

    pub button_a: bool,
    pub button_b: bool,
    pub button_x: bool,
    pub button_y: bool,
    pub button_left_bumper: bool,
    pub button_right_bumper: bool,
    pub button_back: bool,
    pub button_start: bool,
    pub button_guide: bool,
    pub button_left_thumb: bool,
    pub button_right_thumb: bool,
}

impl JoystickState {
    pub fn axis(&self, axis: Axis) -> f64 {
        match axis {
            Axis::LeftHorizontal => self.left_horizontal,
            Axis::LeftVertical => self.left_vertical,
            Axis::LeftTrigger => self.left_trigger,
            Axis::RightHorizontal => self.right_horizontal,
            Axis::RightVertical => self.right_vertical,
            Axis::RightTrigger => self.right_trigger,
            Axis::HatHorizontal => self.hat_horizontal,
            Axis::HatVertical => self.hat_vertical,
        }
    }

    pub fn is_pressed(&self, btn: Button) -> bool {
        match btn {
            Button::A => self.button_a,
            Button::B => self.button_b,
            Button::X => self.button_x,
            Button::Y => self.button_y,
            Button::LeftBumper => self.button_left_bumper,
            Button::RightBumper => self.button_right_bumper,
            Button::Back => self.button_back,
            Button::Start => self.button_start,
            Button::Guide => self.button_guide,
            Button::LeftThumb => self.button_left_thumb,
            Button::RightThumb => self.button_right_thumb,
        }
    }

    pub fn set_axis(&mut self, axis: Axis, value: f64) {
        let field = match axis {
            Axis::LeftHorizontal => &mut self.left_horizontal,
            Axis::LeftVertical => &mut self.left_vertical,
            Axis::LeftTrigger => &mut self.left_trigger,
            Axis::RightHorizontal => &mut self.right_horizontal,
            Axis::RightVertical => &mut self.right_vertical,
            Axis::RightTrigger => &mut self.right_trigger,
            Axis::HatHorizontal => &mut self.hat_horizontal,
            Axis::HatVertical => &mut self.hat_vertical,
        };
        *field = value;
    }

    pub fn set_button(&mut self, btn: Button, pressed: bool) {
        let field = match btn {
            Button::A => &mut self.button_a,
            Button::B => &mut self.button_b,
            Button::X => &mut self.button_x,
            Button::Y => &mut self.button_y,
            Button::LeftBumper => &mut self.button_left_bumper,
            Button::RightBumper => &mut self.button_right_bumper,
            Button::Back => &mut self.button_back,
            Button::Start => &mut self.button_start,
            Button::Guide => &mut self.button_guide,
            Button::LeftThumb => &mut self.button_left_thumb,
            Button::RightThumb => &mut self.button_right_thumb,
        };
        *field = pressed;
    }

    /// Updates control mapped to `event.index`. Returns `None` and changes nothing when the index
    /// is not mapped or event is neither axis nor button.
    pub fn apply(&mut self, map: &InputMap, event: &RawEvent) -> Option<Control> {
        let control = map.control(event.kind, event.index)?;
        match control {
            Control::Axis(axis) => self.set_axis(axis, axis.normalize(event.value)),
            Control::Button(btn) => self.set_button(btn, normalize_button(event.value)),
        }

        Some(control)
    }
}

impl Display for JoystickState {
    /// Two lines, axes with 2 decimal places and buttons as `0`/`1`. No trailing newline.
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str("Axes:")?;
        for axis in Axis::ALL.iter().copied() {
            write!(f, " {}={:.2}", axis.label(), self.axis(axis))?;
        }
        f.write_str("\nBut:")?;
        for btn in Button::ALL.iter().copied() {
            write!(f, " {}={}", btn.label(), self.is_pressed(btn) as u8)?;
        }
        Ok(())
    }
}

#[derive(Debug)]
struct Inner {
    map: InputMap,
    state: JoystickState,
}

/// Joystick state shared between reader thread and its consumers.
///
/// One mutex guards both input map and state, so "lookup, normalize, store" of one event and
/// every snapshot are mutually exclusive. Events still update one field at a time; consumers can
/// see a state where only some of the controls moved together physically have been updated.
#[derive(Debug)]
pub struct SharedState {
    inner: Mutex<Inner>,
}

impl SharedState {
    pub fn new(map: InputMap) -> Self {
        SharedState {
            inner: Mutex::new(Inner {
                map,
                state: JoystickState::default(),
            }),
        }
    }

    /// Applies one raw event. Init flag is ignored; unmapped indices are no-ops.
    pub fn apply_raw_event(&self, event: &RawEvent) -> Option<Control> {
        let mut inner = utils::lock(&self.inner);
        let Inner { map, state } = &mut *inner;
        let control = state.apply(map, event);
        if control.is_none() {
            trace!("Ignoring unmapped event {:?}", event);
        }

        control
    }

    /// Returns copy of current state.
    pub fn snapshot(&self) -> JoystickState {
        utils::lock(&self.inner).state
    }

    /// Writes timestamp line followed by current state.
    pub fn print<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let state = self.snapshot();
        let now = chrono::Local::now();
        writeln!(out, "--- {}", now.format("%a %b %e %H:%M:%S %Y"))?;
        writeln!(out, "{}", state)?;
        out.flush()
    }

    /// Replaces whole input map at once. Events see either old or new map.
    pub fn set_input_map(&self, map: InputMap) {
        utils::lock(&self.inner).map = map;
    }

    pub fn input_map(&self) -> InputMap {
        utils::lock(&self.inner).map.clone()
    }
}

impl Default for SharedState {
    fn default() -> Self {
        SharedState::new(InputMap::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ev::EventKind;

    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn inverted_vertical() {
        let state = SharedState::default();
        assert_eq!(
            state.apply_raw_event(&RawEvent::axis(1, -32767)),
            Some(Control::Axis(Axis::LeftVertical))
        );
        assert_eq!(state.snapshot().left_vertical, 1.0);
    }

    #[test]
    fn button_press_release() {
        let state = SharedState::default();
        state.apply_raw_event(&RawEvent::button(0, 1));
        assert!(state.snapshot().button_a);
        state.apply_raw_event(&RawEvent::button(0, 0));
        assert!(!state.snapshot().button_a);
    }

    #[test]
    fn init_events_are_applied() {
        let state = SharedState::default();
        let mut ev = RawEvent::axis(5, 32767);
        ev.kind = ev.kind.with_init();
        state.apply_raw_event(&ev);
        assert_eq!(state.snapshot().right_trigger, 1.0);
    }

    #[test]
    fn unmapped_and_unknown_are_ignored() {
        let state = SharedState::default();
        assert_eq!(state.apply_raw_event(&RawEvent::axis(8, 1000)), None);
        assert_eq!(state.apply_raw_event(&RawEvent::button(200, 1)), None);
        let mut ev = RawEvent::button(0, 1);
        ev.kind = EventKind::from_raw(0x04);
        assert_eq!(state.apply_raw_event(&ev), None);
        assert_eq!(state.snapshot(), JoystickState::default());
    }

    #[test]
    fn applying_twice_is_idempotent() {
        let events = [
            RawEvent::axis(0, 1234),
            RawEvent::axis(2, -20000),
            RawEvent::axis(7, 1),
            RawEvent::button(9, 1),
        ];
        for ev in events.iter() {
            let once = SharedState::default();
            once.apply_raw_event(ev);
            let twice = SharedState::default();
            twice.apply_raw_event(ev);
            twice.apply_raw_event(ev);
            assert_eq!(once.snapshot(), twice.snapshot());
        }
    }

    #[test]
    fn every_default_index_reaches_its_field() {
        let state = SharedState::default();
        for idx in 0..8 {
            state.apply_raw_event(&RawEvent::axis(idx, 32767));
        }
        for idx in 0..11 {
            state.apply_raw_event(&RawEvent::button(idx, 1));
        }
        let s = state.snapshot();
        assert_eq!(s.left_horizontal, 1.0);
        assert_eq!(s.left_vertical, -1.0);
        assert_eq!(s.left_trigger, 1.0);
        assert_eq!(s.right_horizontal, 1.0);
        assert_eq!(s.right_vertical, -1.0);
        assert_eq!(s.right_trigger, 1.0);
        assert_eq!(s.hat_horizontal, 1.0);
        assert_eq!(s.hat_vertical, -1.0);
        for btn in Button::ALL.iter() {
            assert!(s.is_pressed(*btn), "{} not pressed", btn);
        }
    }

    #[test]
    fn reconfigure_replaces_map() {
        let state = SharedState::default();
        let mut map = InputMap::empty();
        map.set_button(3, Button::Guide);
        state.set_input_map(map.clone());
        assert_eq!(state.input_map(), map);

        assert_eq!(state.apply_raw_event(&RawEvent::button(0, 1)), None);
        state.apply_raw_event(&RawEvent::button(3, 1));
        let s = state.snapshot();
        assert!(s.button_guide);
        assert!(!s.button_y);
    }

    #[test]
    fn display_format() {
        let mut s = JoystickState::default();
        s.set_axis(Axis::LeftHorizontal, 0.5);
        s.set_axis(Axis::HatVertical, -1.0);
        s.set_button(Button::B, true);
        s.set_button(Button::RightThumb, true);
        assert_eq!(
            s.to_string(),
            "Axes: X=0.50 Y=0.00 Z=0.00 Rx=0.00 Ry=0.00 Rz=0.00 Hat0X=0.00 Hat0Y=-1.00\n\
             But: A=0 B=1 X=0 Y=0 LB=0 RB=0 Back=0 Start=0 Guide=0 LT=0 RT=1"
        );
    }

    #[test]
    fn print_has_timestamp_and_two_lines() {
        let state = SharedState::default();
        state.apply_raw_event(&RawEvent::axis(3, -32767));
        let mut out = Vec::new();
        state.print(&mut out).unwrap();
        let out = String::from_utf8(out).unwrap();
        let lines = out.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("--- "));
        assert!(lines[1].contains(" Rx=-1.00 "));
        assert!(lines[2].starts_with("But: A=0"));
    }

    #[test]
    fn concurrent_snapshots_see_whole_field_values() {
        let state = Arc::new(SharedState::default());
        let done = Arc::new(AtomicBool::new(false));

        let readers = (0..4)
            .map(|_| {
                let state = state.clone();
                let done = done.clone();
                thread::spawn(move || {
                    let mut seen = 0u64;
                    while !done.load(Ordering::Relaxed) {
                        let s = state.snapshot();
                        assert!([0.0, 1.0, -1.0].contains(&s.left_horizontal));
                        assert!([0.0, 1.0].contains(&s.right_trigger));
                        assert!([0.0, 1.0, -1.0].contains(&s.hat_vertical));
                        seen += 1;
                    }
                    seen
                })
            })
            .collect::<Vec<_>>();

        for i in 0..20_000i32 {
            let v = if i % 2 == 0 { 32767 } else { -32767 };
            state.apply_raw_event(&RawEvent::axis(0, v));
            state.apply_raw_event(&RawEvent::axis(5, v));
            state.apply_raw_event(&RawEvent::axis(7, v));
            state.apply_raw_event(&RawEvent::button(4, (i % 2) as i16));
        }
        done.store(true, Ordering::Relaxed);

        for reader in readers {
            reader.join().unwrap();
        }
        let s = state.snapshot();
        assert_eq!(s.left_horizontal, -1.0);
        assert_eq!(s.right_trigger, 0.0);
        assert!(s.button_left_bumper);
    }
}
