// Copyright 2024 xjoy Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Session configuration, usually loaded from a YAML file.
//!
//! ```yaml
//! device_path: /dev/input/js0
//! hid_path: /dev/hidraw2
//! debug: false
//! use_user_mapping: true
//! axis_map:
//!   X Axis: 0
//!   Y Axis: 1
//!   # ...
//! button_map:
//!   A: 0
//!   B: 1
//!   # ...
//! ```

use crate::ff::hidraw::{NoRemediation, PermissionPolicy, SudoChmod};
use crate::mapping::{InputMap, MappingData};

use fnv::FnvHashMap;
use serde::{Deserialize, Serialize};

use std::error;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Joystick device node, for example `/dev/input/js0`.
    #[serde(alias = "dev_path")]
    pub device_path: PathBuf,
    /// Raw HID node of the same controller, for example `/dev/hidraw2`.
    pub hid_path: PathBuf,
    /// Print state to stdout after every event.
    #[serde(default)]
    pub debug: bool,
    /// Build input map from `axis_map` and `button_map` instead of the default layout.
    #[serde(default)]
    pub use_user_mapping: bool,
    /// Try `sudo chmod 666` on `hid_path` when opening it is denied.
    #[serde(default)]
    pub fix_hid_permissions: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub axis_map: Option<FnvHashMap<String, i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub button_map: Option<FnvHashMap<String, i64>>,
}

impl Config {
    pub fn new<P: Into<PathBuf>, Q: Into<PathBuf>>(device_path: P, hid_path: Q) -> Self {
        Config {
            device_path: device_path.into(),
            hid_path: hid_path.into(),
            debug: false,
            use_user_mapping: false,
            fix_hid_permissions: false,
            axis_map: None,
            button_map: None,
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Loaded configuration from {}", path.display());

        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(contents).map_err(ConfigError::Parse)
    }

    pub fn to_yaml_string(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self).map_err(ConfigError::Parse)
    }

    /// Stores `map` as user mapping and enables it.
    pub fn set_user_mapping(&mut self, map: &InputMap) {
        let data = map.to_data();
        self.axis_map = Some(data.axes);
        self.button_map = Some(data.buttons);
        self.use_user_mapping = true;
    }

    /// Builds input map selected by this configuration.
    pub fn input_map(&self) -> Result<InputMap, ConfigError> {
        if !self.use_user_mapping {
            info!("Using default input map.");
            return Ok(InputMap::default());
        }

        info!("Reading user defined input map.");
        let data = MappingData {
            axes: self
                .axis_map
                .clone()
                .ok_or(ConfigError::MissingTable("axis_map"))?,
            buttons: self
                .button_map
                .clone()
                .ok_or(ConfigError::MissingTable("button_map"))?,
        };

        InputMap::from_data(&data)
    }

    pub fn permission_policy(&self) -> Box<dyn PermissionPolicy> {
        if self.fix_hid_permissions {
            Box::new(SudoChmod)
        } else {
            Box::new(NoRemediation)
        }
    }
}

/// Error produced while loading configuration or building input map from it.
#[derive(Debug)]
#[non_exhaustive]
pub enum ConfigError {
    Io { path: PathBuf, source: io::Error },
    Parse(serde_yaml::Error),
    /// `use_user_mapping` is set but one of the mapping tables is absent.
    MissingTable(&'static str),
    MissingKey {
        table: &'static str,
        key: &'static str,
    },
    /// Index does not fit in `u8`.
    InvalidIndex {
        table: &'static str,
        key: &'static str,
        value: i64,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ConfigError::Io { path, source } => f.write_fmt(format_args!(
                "failed to read {}: {}",
                path.display(),
                source
            )),
            ConfigError::Parse(e) => f.write_fmt(format_args!("malformed YAML: {}", e)),
            ConfigError::MissingTable(table) => {
                f.write_fmt(format_args!("user mapping enabled but `{}` is missing", table))
            }
            ConfigError::MissingKey { table, key } => {
                f.write_fmt(format_args!("`{}` has no entry for {:?}", table, key))
            }
            ConfigError::InvalidIndex { table, key, value } => f.write_fmt(format_args!(
                "`{}` entry {:?} has invalid index {}",
                table, key, value
            )),
        }
    }
}

impl error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Parse(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ev::{Axis, Button};

    const DEFAULT_MAPPING: &str = "
dev_path: /dev/input/js0
hid_path: /dev/hidraw2
debug: true
use_user_mapping: true
axis_map:
  X Axis: 0
  Y Axis: 1
  Z Axis: 2
  Rx Axis: 3
  Ry Axis: 4
  Rz Axis: 5
  Hat0X: 6
  Hat0Y: 7
button_map:
  A: 0
  B: 1
  X: 2
  Y: 3
  LB: 4
  RB: 5
  Back: 6
  Start: 7
  Guide: 8
  Left Thumb: 9
  Right Thumb: 10
";

    #[test]
    fn parse_full() {
        let config = Config::from_yaml_str(DEFAULT_MAPPING).unwrap();
        assert_eq!(config.device_path, Path::new("/dev/input/js0"));
        assert_eq!(config.hid_path, Path::new("/dev/hidraw2"));
        assert!(config.debug);
        assert!(config.use_user_mapping);
        assert!(!config.fix_hid_permissions);
        assert_eq!(config.input_map().unwrap(), InputMap::default());
    }

    #[test]
    fn defaults() {
        let config =
            Config::from_yaml_str("device_path: /dev/input/js1\nhid_path: /dev/hidraw0\n").unwrap();
        assert_eq!(config, Config::new("/dev/input/js1", "/dev/hidraw0"));
        assert_eq!(config.input_map().unwrap(), InputMap::default());
    }

    #[test]
    fn user_mapping_disabled_ignores_tables() {
        let yaml = DEFAULT_MAPPING.replace("use_user_mapping: true", "use_user_mapping: false");
        let yaml = yaml.replace("X Axis: 0", "X Axis: 900");
        let config = Config::from_yaml_str(&yaml).unwrap();
        assert_eq!(config.input_map().unwrap(), InputMap::default());
    }

    #[test]
    fn missing_table() {
        let config = Config::from_yaml_str(
            "device_path: /dev/input/js0\nhid_path: /dev/hidraw2\nuse_user_mapping: true\n",
        )
        .unwrap();
        match config.input_map() {
            Err(ConfigError::MissingTable("axis_map")) => (),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn missing_key() {
        let yaml = DEFAULT_MAPPING.replace("  Guide: 8\n", "");
        let config = Config::from_yaml_str(&yaml).unwrap();
        match config.input_map() {
            Err(ConfigError::MissingKey {
                table: "button_map",
                key: "Guide",
            }) => (),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn malformed() {
        assert!(matches!(
            Config::from_yaml_str("hid_path: [1, 2"),
            Err(ConfigError::Parse(_))
        ));
        // required key
        assert!(matches!(
            Config::from_yaml_str("device_path: /dev/input/js0\n"),
            Err(ConfigError::Parse(_))
        ));
        // index must be an integer
        let yaml = DEFAULT_MAPPING.replace("A: 0", "A: first");
        assert!(matches!(
            Config::from_yaml_str(&yaml),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn missing_file() {
        let err = Config::from_file("/nonexistent/xjoy.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/xjoy.yaml"));
    }

    #[test]
    fn yaml_round_trip_with_user_mapping() {
        let mut map = InputMap::default();
        map.set_axis(2, Axis::RightTrigger);
        map.set_axis(5, Axis::LeftTrigger);
        map.set_button(2, Button::Y);
        map.set_button(3, Button::X);

        let mut config = Config::new("/dev/input/js0", "/dev/hidraw3");
        config.set_user_mapping(&map);

        let yaml = config.to_yaml_string().unwrap();
        let parsed = Config::from_yaml_str(&yaml).unwrap();
        assert_eq!(parsed, config);
        assert_eq!(parsed.input_map().unwrap(), map);
    }
}
