// Copyright 2024 xjoy Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Mapping from raw joystick indices to logical controls.

use crate::config::ConfigError;
use crate::ev::{Axis, Button, Control, EventKind};

use fnv::FnvHashMap;
use vec_map::VecMap;

use std::fmt::{Display, Formatter, Result as FmtResult};

/// Maps raw axis and button indices (`js_event.number`) to logical controls.
///
/// Each raw index maps to at most one control. Indices that are not in the map are ignored by
/// the state.
#[derive(Clone, Debug, PartialEq)]
pub struct InputMap {
    axes: VecMap<Axis>,
    btns: VecMap<Button>,
}

impl InputMap {
    /// Creates map with no entries. Every event is ignored.
    pub fn empty() -> Self {
        InputMap {
            axes: VecMap::new(),
            btns: VecMap::new(),
        }
    }

    /// Creates map from user supplied raw indices.
    ///
    /// Every one of 8 axis and 11 button keys must be present and fit in `u8`. When two controls
    /// share a raw index, the one declared later in [`Axis::ALL`]/[`Button::ALL`] wins and the
    /// other keeps its default value forever.
    pub fn from_data(data: &MappingData) -> Result<Self, ConfigError> {
        let mut mapping = InputMap::empty();

        for axis in Axis::ALL.iter().copied() {
            let idx = lookup(&data.axes, "axis_map", axis.config_key())?;
            if let Some(old) = mapping.axes.insert(idx as usize, axis) {
                warn!("Axis index {} is used by both {} and {}", idx, old, axis);
            }
        }

        for btn in Button::ALL.iter().copied() {
            let idx = lookup(&data.buttons, "button_map", btn.config_key())?;
            if let Some(old) = mapping.btns.insert(idx as usize, btn) {
                warn!("Button index {} is used by both {} and {}", idx, old, btn);
            }
        }

        for key in data.axes.keys() {
            if Axis::from_config_key(key).is_none() {
                warn!("Ignoring unknown axis_map entry {:?}", key);
            }
        }
        for key in data.buttons.keys() {
            if Button::from_config_key(key).is_none() {
                warn!("Ignoring unknown button_map entry {:?}", key);
            }
        }

        Ok(mapping)
    }

    /// Converts map back to its configuration form.
    pub fn to_data(&self) -> MappingData {
        let mut data = MappingData::default();
        for (idx, axis) in &self.axes {
            data.axes.insert(axis.config_key().to_owned(), idx as i64);
        }
        for (idx, btn) in &self.btns {
            data.buttons.insert(btn.config_key().to_owned(), idx as i64);
        }
        data
    }

    pub fn axis(&self, index: u8) -> Option<Axis> {
        self.axes.get(index as usize).copied()
    }

    pub fn button(&self, index: u8) -> Option<Button> {
        self.btns.get(index as usize).copied()
    }

    /// Looks up `index` in axis or button part of the map, depending on `kind`. Init flag is
    /// ignored.
    pub fn control(&self, kind: EventKind, index: u8) -> Option<Control> {
        if kind.is_axis() {
            self.axis(index).map(Control::Axis)
        } else if kind.is_button() {
            self.button(index).map(Control::Button)
        } else {
            None
        }
    }

    /// Returns raw index currently mapped to `axis`.
    pub fn axis_index(&self, axis: Axis) -> Option<u8> {
        self.axes
            .iter()
            .find(|&(_, &a)| a == axis)
            .map(|(idx, _)| idx as u8)
    }

    /// Returns raw index currently mapped to `btn`.
    pub fn button_index(&self, btn: Button) -> Option<u8> {
        self.btns
            .iter()
            .find(|&(_, &b)| b == btn)
            .map(|(idx, _)| idx as u8)
    }

    /// Maps `index` to `axis`, replacing previous entry for that index.
    pub fn set_axis(&mut self, index: u8, axis: Axis) -> Option<Axis> {
        self.axes.insert(index as usize, axis)
    }

    /// Maps `index` to `btn`, replacing previous entry for that index.
    pub fn set_button(&mut self, index: u8, btn: Button) -> Option<Button> {
        self.btns.insert(index as usize, btn)
    }
}

impl Default for InputMap {
    /// Layout of xpad driver: axes 0–7 and buttons 0–10 in declaration order.
    fn default() -> Self {
        let mut mapping = InputMap::empty();
        for axis in Axis::ALL.iter().copied() {
            mapping.axes.insert(axis as usize, axis);
        }
        for btn in Button::ALL.iter().copied() {
            mapping.btns.insert(btn as usize, btn);
        }
        mapping
    }
}

impl Display for InputMap {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        writeln!(f, "Axis input map")?;
        for (idx, axis) in &self.axes {
            writeln!(f, "Id: {} Axis: {}", idx, axis)?;
        }
        writeln!(f, "Button input map")?;
        for (idx, btn) in &self.btns {
            writeln!(f, "Id: {} Button: {}", idx, btn)?;
        }
        Ok(())
    }
}

/// User mapping as written in configuration: control name to raw index.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MappingData {
    /// `axis_map` table, keys are [`Axis::config_key`].
    pub axes: FnvHashMap<String, i64>,
    /// `button_map` table, keys are [`Button::config_key`].
    pub buttons: FnvHashMap<String, i64>,
}

fn lookup(
    table: &FnvHashMap<String, i64>,
    table_name: &'static str,
    key: &'static str,
) -> Result<u8, ConfigError> {
    let value = *table.get(key).ok_or(ConfigError::MissingKey {
        table: table_name,
        key,
    })?;

    u8::try_from(value).map_err(|_| ConfigError::InvalidIndex {
        table: table_name,
        key,
        value,
    })
}
