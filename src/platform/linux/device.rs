// Copyright 2024 xjoy Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use super::ioctl;
use crate::error::Error;
use crate::utils;

use libc as c;

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::fs::{File, OpenOptions};
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::{AsRawFd, RawFd};
use std::path::{Path, PathBuf};

const NAME_LEN: usize = 512;
const DEFAULT_VERSION: u32 = 0x00_08_00;

/// Information reported by joystick driver.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceInfo {
    pub name: String,
    /// Driver version, `0xMMmmpp`.
    pub version: u32,
    pub axes: u8,
    pub buttons: u8,
}

impl DeviceInfo {
    /// Queries driver. Failed queries are logged and leave default values.
    fn query(fd: RawFd, path: &Path) -> Self {
        let mut info = DeviceInfo::default();

        let mut version = 0u32;
        match unsafe { ioctl::jsiocgversion(fd, &mut version) } {
            Ok(_) => info.version = version,
            Err(e) => warn!("Failed to get driver version of {}: {}", path.display(), e),
        }

        let mut axes = 0u8;
        match unsafe { ioctl::jsiocgaxes(fd, &mut axes) } {
            Ok(_) => info.axes = axes,
            Err(e) => warn!("Failed to get number of axes of {}: {}", path.display(), e),
        }

        let mut buttons = 0u8;
        match unsafe { ioctl::jsiocgbuttons(fd, &mut buttons) } {
            Ok(_) => info.buttons = buttons,
            Err(e) => warn!("Failed to get number of buttons of {}: {}", path.display(), e),
        }

        let mut name = [0u8; NAME_LEN];
        match unsafe { ioctl::jsiocgname(fd, &mut name) } {
            Ok(_) => info.name = utils::string_from_buf(&name),
            Err(e) => warn!("Failed to get name of {}: {}", path.display(), e),
        }

        info
    }

    /// Driver version as `major.minor.patch`.
    pub fn version_string(&self) -> String {
        format!(
            "{}.{}.{}",
            self.version >> 16,
            (self.version >> 8) & 0xff,
            self.version & 0xff
        )
    }
}

impl Default for DeviceInfo {
    fn default() -> Self {
        DeviceInfo {
            name: "Unknown".to_owned(),
            version: DEFAULT_VERSION,
            axes: 0,
            buttons: 0,
        }
    }
}

impl Display for DeviceInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_fmt(format_args!(
            "{} (driver {}, {} axes, {} buttons)",
            self.name,
            self.version_string(),
            self.axes,
            self.buttons
        ))
    }
}

/// Joystick device node opened for non-blocking reading.
#[derive(Debug)]
pub struct JsDevice {
    file: File,
    path: PathBuf,
    info: DeviceInfo,
}

impl JsDevice {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .custom_flags(c::O_NONBLOCK)
            .open(path)
            .map_err(|source| {
                error!("Failed to open joystick device {}", path.display());
                Error::DeviceOpen {
                    path: path.to_path_buf(),
                    source,
                }
            })?;

        let info = DeviceInfo::query(file.as_raw_fd(), path);
        info!("Joystick {} ({}) opened.", path.display(), info.name);
        info!("Driver version: {}", info.version_string());
        info!("Number of axes: {}", info.axes);
        info!("Number of buttons: {}", info.buttons);

        Ok(JsDevice {
            file,
            path: path.to_path_buf(),
            info,
        })
    }

    pub fn info(&self) -> &DeviceInfo {
        &self.info
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Gives up ownership of the device file, usually to the reader thread.
    pub fn into_file(self) -> File {
        self.file
    }
}
