// Copyright 2024 xjoy Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use crate::config::ConfigError;

use nix::errno::Errno;

use std::error;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::io;
use std::path::PathBuf;

/// Error type returned by session setup and rumble operations.
///
/// Errors raised inside the background reader never show up here; they stop the reader and
/// can be inspected with [`XboxJoystick::stop_reason`](crate::XboxJoystick::stop_reason).
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// Joystick device node could not be opened.
    DeviceOpen { path: PathBuf, source: io::Error },
    /// Raw HID node could not be opened, after the permission policy had its chance.
    HidOpen { path: PathBuf, source: io::Error },
    /// Configuration was missing, malformed or contained an invalid mapping.
    Config(ConfigError),
    /// Rumble report could not be written in a single call.
    Write(io::Error),
    /// Creating epoll or eventfd for the reader failed.
    Platform(Errno, &'static str),
    /// Reader thread could not be spawned.
    Spawn(io::Error),
    /// Operation requires an open session.
    NotOpen,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Error::DeviceOpen { path, source } => f.write_fmt(format_args!(
                "failed to open joystick device {}: {}",
                path.display(),
                source
            )),
            Error::HidOpen { path, source } => f.write_fmt(format_args!(
                "failed to open hidraw device {}: {}",
                path.display(),
                source
            )),
            Error::Config(e) => f.write_fmt(format_args!("invalid configuration: {}", e)),
            Error::Write(e) => f.write_fmt(format_args!("failed to write rumble report: {}", e)),
            Error::Platform(e, ctx) => f.write_fmt(format_args!("{} failed: {}", ctx, e)),
            Error::Spawn(e) => f.write_fmt(format_args!("failed to spawn reader thread: {}", e)),
            Error::NotOpen => f.write_str("joystick session is not open"),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::DeviceOpen { source, .. } | Error::HidOpen { source, .. } => Some(source),
            Error::Config(e) => Some(e),
            Error::Write(e) | Error::Spawn(e) => Some(e),
            Error::Platform(e, _) => Some(e),
            Error::NotOpen => None,
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

pub(crate) fn errno_to_error(errno: Errno, ctx: &'static str) -> Error {
    Error::Platform(errno, ctx)
}
