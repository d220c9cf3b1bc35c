// Copyright 2024 xjoy Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use super::RumbleCommand;
use crate::error::Error;

use std::fmt::Debug;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

/// What to do when opening hidraw node fails with `PermissionDenied`.
///
/// Hidraw nodes are usually owned by root. [`HidRaw::open`] asks the policy to fix that exactly
/// once and retries if it returns `Ok`.
pub trait PermissionPolicy: Debug {
    fn remediate(&self, path: &Path) -> io::Result<()>;
}

/// Gives up immediately.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoRemediation;

impl PermissionPolicy for NoRemediation {
    fn remediate(&self, _path: &Path) -> io::Result<()> {
        Err(io::Error::from(io::ErrorKind::PermissionDenied))
    }
}

/// Runs `sudo chmod 666 <path>`. Requires a terminal or passwordless sudo.
#[derive(Copy, Clone, Debug, Default)]
pub struct SudoChmod;

impl PermissionPolicy for SudoChmod {
    fn remediate(&self, path: &Path) -> io::Result<()> {
        warn!("Changing permissions of {} with sudo.", path.display());
        let status = Command::new("sudo")
            .arg("chmod")
            .arg("666")
            .arg(path)
            .status()?;

        if status.success() {
            Ok(())
        } else {
            Err(io::Error::new(
                io::ErrorKind::Other,
                format!("sudo chmod exited with {}", status),
            ))
        }
    }
}

/// Write-only handle to a raw HID node.
#[derive(Debug)]
pub struct HidRaw {
    file: File,
    path: PathBuf,
}

impl HidRaw {
    pub fn open<P: AsRef<Path>>(path: P, policy: &dyn PermissionPolicy) -> Result<Self, Error> {
        Self::open_with(path.as_ref(), policy, |p| {
            OpenOptions::new().write(true).open(p)
        })
    }

    /// Wraps already opened file. Used with nodes opened by other means, and in tests.
    pub fn from_file<P: Into<PathBuf>>(file: File, path: P) -> Self {
        HidRaw {
            file,
            path: path.into(),
        }
    }

    fn open_with<F>(path: &Path, policy: &dyn PermissionPolicy, open: F) -> Result<Self, Error>
    where
        F: Fn(&Path) -> io::Result<File>,
    {
        let file = match open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                error!("Error opening {}: {}", path.display(), e);
                if let Err(fix_err) = policy.remediate(path) {
                    debug!("Permission policy {:?} failed: {}", policy, fix_err);
                    return Err(Error::HidOpen {
                        path: path.to_path_buf(),
                        source: e,
                    });
                }
                open(path).map_err(|source| Error::HidOpen {
                    path: path.to_path_buf(),
                    source,
                })?
            }
            Err(source) => {
                return Err(Error::HidOpen {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        debug!("Opened hidraw device {}", path.display());

        Ok(HidRaw {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes encoded `cmd` with a single `write` call. Short writes are errors and nothing is
    /// retried.
    pub fn send(&mut self, cmd: &RumbleCommand) -> Result<(), Error> {
        let report = cmd.encode();
        let n = self.file.write(&report).map_err(Error::Write)?;
        if n != report.len() {
            return Err(Error::Write(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("wrote {} of {} bytes", n, report.len()),
            )));
        }
        trace!("Sent rumble report {:02x?} to {}", report, self.path.display());

        Ok(())
    }
}
