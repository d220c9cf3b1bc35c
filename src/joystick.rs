// Copyright 2024 xjoy Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use crate::config::Config;
use crate::error::Error;
use crate::ev::{JoystickState, SharedState};
use crate::ff::{HidRaw, PermissionPolicy, RumbleCommand};
use crate::mapping::InputMap;
use crate::platform::{self, DeviceInfo, JsDevice, ReaderHandle, ReaderState, StopReason};

use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

/// Xbox-compatible controller: joystick device node for input and raw HID node for rumble.
///
/// Created closed. [`open`](XboxJoystick::open) starts a background thread that keeps
/// [`state`](XboxJoystick::state) up to date until [`close`](XboxJoystick::close) is called or
/// the joystick is dropped.
#[derive(Debug)]
pub struct XboxJoystick {
    config: Config,
    map: InputMap,
    policy: Box<dyn PermissionPolicy>,
    state: Arc<SharedState>,
    info: Option<DeviceInfo>,
    hid: Option<HidRaw>,
    reader: Option<ReaderHandle>,
    rumble: RumbleCommand,
}

impl XboxJoystick {
    /// Builds input map selected by `config`. Mapping errors are reported here, before any
    /// device is touched.
    pub fn new(config: Config) -> Result<Self, Error> {
        let map = config.input_map()?;
        debug!("{}", map);
        let policy = config.permission_policy();

        Ok(XboxJoystick {
            state: Arc::new(SharedState::new(map.clone())),
            config,
            map,
            policy,
            info: None,
            hid: None,
            reader: None,
            rumble: RumbleCommand::default(),
        })
    }

    pub fn from_config_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        Self::new(Config::from_file(path)?)
    }

    /// Replaces permission policy chosen by configuration.
    pub fn with_permission_policy<P: PermissionPolicy + 'static>(mut self, policy: P) -> Self {
        self.policy = Box::new(policy);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Opens both device nodes and starts the reader thread. State starts from defaults.
    ///
    /// If session is already open, it is closed first.
    pub fn open(&mut self) -> Result<(), Error> {
        if self.is_open() {
            debug!("Reopening {}", self.config.device_path.display());
            self.close()?;
        }

        let device = JsDevice::open(&self.config.device_path)?;
        let hid = HidRaw::open(&self.config.hid_path, &*self.policy)?;
        let info = device.info().clone();

        let state = Arc::new(SharedState::new(self.map.clone()));
        let reader = platform::spawn_reader(device.into_file(), state.clone(), self.config.debug)?;

        self.state = state;
        self.info = Some(info);
        self.hid = Some(hid);
        self.reader = Some(reader);
        self.rumble = RumbleCommand::default();

        Ok(())
    }

    /// Stops the reader thread, waits for it and closes the HID node.
    ///
    /// Last state and reader status stay available.
    pub fn close(&mut self) -> Result<(), Error> {
        let reader = self.reader.as_mut().ok_or(Error::NotOpen)?;
        if self.hid.is_none() {
            return Err(Error::NotOpen);
        }

        reader.stop();
        self.hid = None;
        info!("Joystick {} closed.", self.config.device_path.display());

        Ok(())
    }

    /// `true` between successful `open` and `close`, even if the reader has stopped on its own.
    pub fn is_open(&self) -> bool {
        self.hid.is_some()
    }

    /// Information queried from driver by the last `open`.
    pub fn device_info(&self) -> Option<&DeviceInfo> {
        self.info.as_ref()
    }

    pub fn state(&self) -> JoystickState {
        self.state.snapshot()
    }

    pub fn shared_state(&self) -> Arc<SharedState> {
        self.state.clone()
    }

    pub fn print_state<W: Write>(&self, out: &mut W) -> io::Result<()> {
        self.state.print(out)
    }

    /// Replaces input map, also for a running reader.
    pub fn set_input_map(&mut self, map: InputMap) {
        self.state.set_input_map(map.clone());
        self.map = map;
    }

    pub fn input_map(&self) -> &InputMap {
        &self.map
    }

    /// Sends session's rumble command.
    pub fn rumble(&mut self) -> Result<(), Error> {
        let cmd = self.rumble;
        self.rumble_with(&cmd)
    }

    pub fn rumble_with(&mut self, cmd: &RumbleCommand) -> Result<(), Error> {
        self.hid.as_mut().ok_or(Error::NotOpen)?.send(cmd)
    }

    pub fn rumble_command(&self) -> &RumbleCommand {
        &self.rumble
    }

    /// Command used by [`rumble`](XboxJoystick::rumble). Reset to default on every `open`.
    pub fn rumble_command_mut(&mut self) -> &mut RumbleCommand {
        &mut self.rumble
    }

    pub fn reader_state(&self) -> ReaderState {
        self.reader
            .as_ref()
            .map(|r| r.state())
            .unwrap_or(ReaderState::Idle)
    }

    /// Why the reader thread stopped, `None` while it runs or before first `open`.
    pub fn stop_reason(&self) -> Option<StopReason> {
        self.reader.as_ref().and_then(|r| r.stop_reason())
    }
}

impl Drop for XboxJoystick {
    fn drop(&mut self) {
        if self.is_open() {
            if let Err(e) = self.close() {
                error!("Failed to close joystick: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;
    use crate::ev::RawEvent;
    use crate::ff::NoRemediation;

    use std::ffi::CString;
    use std::fs::{self, File, OpenOptions};
    use std::os::unix::ffi::OsStrExt;
    use std::path::PathBuf;
    use std::thread;
    use std::time::{Duration, Instant};

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("xjoy-{}-{}", name, std::process::id()))
    }

    #[test]
    fn mapping_error_is_reported_before_open() {
        let mut config = Config::new("/dev/input/js0", "/dev/hidraw0");
        config.use_user_mapping = true;
        match XboxJoystick::new(config) {
            Err(Error::Config(ConfigError::MissingTable("axis_map"))) => (),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn missing_device() {
        let mut js =
            XboxJoystick::new(Config::new("/nonexistent/js0", "/nonexistent/hidraw0")).unwrap();
        assert!(matches!(js.open(), Err(Error::DeviceOpen { .. })));
        assert!(!js.is_open());
        assert_eq!(js.reader_state(), ReaderState::Idle);
        assert!(js.device_info().is_none());
    }

    #[test]
    fn closed_session() {
        let mut js = XboxJoystick::new(Config::new("/dev/null", "/dev/null")).unwrap();
        assert!(matches!(js.rumble(), Err(Error::NotOpen)));
        assert!(matches!(js.close(), Err(Error::NotOpen)));
        assert_eq!(js.stop_reason(), None);
        assert_eq!(js.state(), JoystickState::default());
    }

    #[test]
    fn open_read_rumble_close() {
        let dev_path = temp_path("js-fifo");
        let hid_path = temp_path("hidraw");
        let _ = fs::remove_file(&dev_path);
        let c_path = CString::new(dev_path.as_os_str().as_bytes()).unwrap();
        assert_eq!(unsafe { libc::mkfifo(c_path.as_ptr(), 0o600) }, 0);
        File::create(&hid_path).unwrap();

        // Read-write end never blocks on open and keeps the pipe from hanging up.
        let mut writer = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&dev_path)
            .unwrap();

        let mut js = XboxJoystick::new(Config::new(&dev_path, &hid_path))
            .unwrap()
            .with_permission_policy(NoRemediation);
        js.open().unwrap();
        assert!(js.is_open());
        assert_eq!(js.device_info().map(|i| i.name.as_str()), Some("Unknown"));

        writer.write_all(&RawEvent::axis(1, -32767).to_bytes()).unwrap();
        writer.write_all(&RawEvent::button(8, 1).to_bytes()).unwrap();
        let start = Instant::now();
        while !js.state().button_guide {
            assert!(start.elapsed() < Duration::from_secs(5), "events not applied");
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(js.state().left_vertical, 1.0);

        js.rumble_command_mut().pulse.loop_count = 2;
        js.rumble().unwrap();
        assert_eq!(
            fs::read(&hid_path).unwrap(),
            vec![0x03, 0x0f, 20, 20, 40, 30, 5, 5, 2]
        );

        js.close().unwrap();
        assert!(!js.is_open());
        assert_eq!(js.reader_state(), ReaderState::Stopped);
        assert_eq!(js.stop_reason(), Some(StopReason::Cancelled));
        assert!(js.state().button_guide);
        assert!(matches!(js.rumble(), Err(Error::NotOpen)));

        drop(writer);
        fs::remove_file(&dev_path).unwrap();
        fs::remove_file(&hid_path).unwrap();
    }
}
