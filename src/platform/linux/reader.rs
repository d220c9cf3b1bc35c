// Copyright 2024 xjoy Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Background thread turning `js_event` records into state updates.

use crate::error::{errno_to_error, Error};
use crate::ev::{RawEvent, SharedState, RAW_EVENT_SIZE};
use crate::utils;

use nix::errno::Errno;
use nix::sys::epoll::{Epoll, EpollCreateFlags, EpollEvent, EpollFlags, EpollTimeout};
use nix::sys::eventfd::{EfdFlags, EventFd};

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::fs::File;
use std::io::{self, ErrorKind, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

/// How long one wait for device data may take before the loop checks for cancellation again.
pub const READ_TIMEOUT_MS: u16 = 1000;

const DEVICE_DATA: u64 = 0;
const STOP_DATA: u64 = 1;

/// What the reader thread is doing.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ReaderState {
    /// Thread not started yet.
    Idle,
    /// Waiting for device data or stop request.
    Polling,
    /// Applying an event to shared state.
    Dispatching,
    /// Last wait ended without data. Transient: the loop goes back to `Polling` right away, so
    /// observers rarely see it.
    TimedOut,
    Stopped,
}

/// Why the reader thread exited.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// Stop was requested.
    Cancelled,
    /// Read returned other number of bytes than one event record. `0` means end of file.
    ShortRead(usize),
    ReadFailed(ErrorKind),
    WaitFailed(Errno),
}

impl Display for StopReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            StopReason::Cancelled => f.write_str("cancelled"),
            StopReason::ShortRead(0) => f.write_str("end of device stream"),
            StopReason::ShortRead(n) => f.write_fmt(format_args!(
                "read {} bytes instead of {}",
                n, RAW_EVENT_SIZE
            )),
            StopReason::ReadFailed(kind) => f.write_fmt(format_args!("read failed: {}", kind)),
            StopReason::WaitFailed(e) => f.write_fmt(format_args!("epoll failed: {}", e)),
        }
    }
}

/// One-shot cancellation: a flag plus an eventfd that wakes up a blocked wait.
#[derive(Debug)]
struct StopSignal {
    fired: AtomicBool,
    event: EventFd,
}

impl StopSignal {
    fn new() -> Result<Self, Error> {
        let event = EventFd::from_value_and_flags(0, EfdFlags::EFD_NONBLOCK)
            .map_err(|e| errno_to_error(e, "creating eventfd"))?;

        Ok(StopSignal {
            fired: AtomicBool::new(false),
            event,
        })
    }

    /// Returns `false` if signal was already fired.
    fn fire(&self) -> bool {
        if self.fired.swap(true, Ordering::SeqCst) {
            return false;
        }

        if let Err(e) = self.event.write(1) {
            error!("Failed to wake up reader thread: {}", e);
        }

        true
    }

    fn is_fired(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
struct Status {
    state: ReaderState,
    stop_reason: Option<StopReason>,
    events: u64,
}

type SharedStatus = Arc<Mutex<Status>>;

fn set_state(status: &Mutex<Status>, state: ReaderState) {
    utils::lock(status).state = state;
}

/// Handle to a running (or finished) reader thread.
///
/// Dropping the handle stops the thread and waits for it.
#[derive(Debug)]
pub struct ReaderHandle {
    signal: Arc<StopSignal>,
    status: SharedStatus,
    thread: Option<JoinHandle<()>>,
}

impl ReaderHandle {
    pub fn state(&self) -> ReaderState {
        utils::lock(&self.status).state
    }

    /// `None` while the thread is running.
    pub fn stop_reason(&self) -> Option<StopReason> {
        utils::lock(&self.status).stop_reason.clone()
    }

    /// Number of complete records read from the device.
    pub fn events_read(&self) -> u64 {
        utils::lock(&self.status).events
    }

    pub fn is_running(&self) -> bool {
        self.thread.is_some() && self.state() != ReaderState::Stopped
    }

    /// Requests stop and joins the thread. Subsequent calls do nothing.
    pub fn stop(&mut self) {
        if self.signal.fire() {
            debug!("Stop requested for reader thread");
        }

        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("Reader thread panicked");
                let mut status = utils::lock(&self.status);
                status.state = ReaderState::Stopped;
            }
        }
    }
}

impl Drop for ReaderHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Starts a thread that reads `device` until it is stopped, the stream ends or reading fails.
///
/// `device` should be opened with `O_NONBLOCK`. Every complete record is applied to `state`;
/// with `debug` the state is also printed to stdout after each record.
pub fn spawn_reader(
    device: File,
    state: Arc<SharedState>,
    debug: bool,
) -> Result<ReaderHandle, Error> {
    let epoll = Epoll::new(EpollCreateFlags::EPOLL_CLOEXEC)
        .map_err(|e| errno_to_error(e, "creating epoll fd"))?;
    let signal = Arc::new(StopSignal::new()?);

    epoll
        .add(&device, EpollEvent::new(EpollFlags::EPOLLIN, DEVICE_DATA))
        .map_err(|e| errno_to_error(e, "adding joystick device to epoll"))?;
    epoll
        .add(&signal.event, EpollEvent::new(EpollFlags::EPOLLIN, STOP_DATA))
        .map_err(|e| errno_to_error(e, "adding eventfd to epoll"))?;

    let status = Arc::new(Mutex::new(Status {
        state: ReaderState::Idle,
        stop_reason: None,
        events: 0,
    }));

    let reader = Reader {
        device,
        epoll,
        signal: signal.clone(),
        status: status.clone(),
        state,
        debug,
    };

    let thread = thread::Builder::new()
        .name("xjoy-reader".to_owned())
        .spawn(move || reader.run())
        .map_err(Error::Spawn)?;

    Ok(ReaderHandle {
        signal,
        status,
        thread: Some(thread),
    })
}

struct Reader {
    device: File,
    epoll: Epoll,
    signal: Arc<StopSignal>,
    status: SharedStatus,
    state: Arc<SharedState>,
    debug: bool,
}

impl Reader {
    fn run(mut self) {
        debug!("Reader thread started");
        let reason = self.poll_loop();
        match reason {
            StopReason::Cancelled => info!("Reader thread stopped"),
            ref other => error!("Reader thread stopped: {}", other),
        }

        let mut status = utils::lock(&self.status);
        status.state = ReaderState::Stopped;
        status.stop_reason = Some(reason);
    }

    fn poll_loop(&mut self) -> StopReason {
        let mut events = [EpollEvent::new(EpollFlags::empty(), 0); 2];

        loop {
            if self.signal.is_fired() {
                return StopReason::Cancelled;
            }

            set_state(&self.status, ReaderState::Polling);
            let n = match self.epoll.wait(&mut events, EpollTimeout::from(READ_TIMEOUT_MS)) {
                Ok(n) => n,
                Err(Errno::EINTR) => continue,
                Err(e) => {
                    error!("epoll failed: {}", e);
                    return StopReason::WaitFailed(e);
                }
            };

            if n == 0 {
                set_state(&self.status, ReaderState::TimedOut);
                continue;
            }

            let mut readable = false;
            for event in &events[..n] {
                match event.data() {
                    STOP_DATA => return StopReason::Cancelled,
                    DEVICE_DATA => readable = true,
                    data => warn!("Unexpected epoll data {}", data),
                }
            }

            if readable {
                if let Some(reason) = self.read_event() {
                    return reason;
                }
            }
        }
    }

    /// Reads and applies one record. Returns reason to stop, if any.
    fn read_event(&mut self) -> Option<StopReason> {
        let mut buf = [0u8; RAW_EVENT_SIZE];
        match self.device.read(&mut buf) {
            Ok(RAW_EVENT_SIZE) => {
                set_state(&self.status, ReaderState::Dispatching);
                let event = RawEvent::from_bytes(buf);
                trace!("Read {:?}", event);
                self.state.apply_raw_event(&event);
                utils::lock(&self.status).events += 1;

                if self.debug {
                    let stdout = io::stdout();
                    if let Err(e) = self.state.print(&mut stdout.lock()) {
                        warn!("Failed to print joystick state: {}", e);
                    }
                }

                None
            }
            Ok(n) => Some(StopReason::ShortRead(n)),
            // Signal arrived before any data was copied
            Err(e) if e.kind() == ErrorKind::Interrupted => None,
            Err(e) => {
                error!("Failed to read joystick event: {}", e);
                Some(StopReason::ReadFailed(e.kind()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::InputMap;

    use std::io::Write;
    use std::os::fd::OwnedFd;
    use std::os::unix::net::UnixStream;
    use std::time::{Duration, Instant};

    fn device_pair() -> (UnixStream, File) {
        let (tx, rx) = UnixStream::pair().unwrap();
        rx.set_nonblocking(true).unwrap();
        (tx, File::from(OwnedFd::from(rx)))
    }

    fn wait_for<F: Fn() -> bool>(cond: F) {
        let start = Instant::now();
        while !cond() {
            assert!(start.elapsed() < Duration::from_secs(5), "condition not met in time");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn applies_events() {
        let (mut tx, rx) = device_pair();
        let state = Arc::new(SharedState::new(InputMap::default()));
        let mut reader = spawn_reader(rx, state.clone(), false).unwrap();

        tx.write_all(&RawEvent::axis(0, 32767).to_bytes()).unwrap();
        tx.write_all(&RawEvent::button(1, 1).to_bytes()).unwrap();
        wait_for(|| reader.events_read() == 2);

        let s = state.snapshot();
        assert_eq!(s.left_horizontal, 1.0);
        assert!(s.button_b);
        assert!(reader.is_running());

        reader.stop();
        assert_eq!(reader.state(), ReaderState::Stopped);
        assert_eq!(reader.stop_reason(), Some(StopReason::Cancelled));
    }

    #[test]
    fn short_read_stops_reader() {
        let (mut tx, rx) = device_pair();
        let state = Arc::new(SharedState::default());
        let reader = spawn_reader(rx, state.clone(), false).unwrap();

        tx.write_all(&RawEvent::button(0, 1).to_bytes()[..4]).unwrap();
        wait_for(|| reader.state() == ReaderState::Stopped);
        assert_eq!(reader.stop_reason(), Some(StopReason::ShortRead(4)));

        // Nobody reads anymore.
        let _ = tx.write_all(&RawEvent::button(0, 1).to_bytes());
        thread::sleep(Duration::from_millis(50));
        assert!(!state.snapshot().button_a);
        assert_eq!(reader.events_read(), 0);
        assert!(!reader.is_running());
    }

    #[test]
    fn end_of_stream_stops_reader() {
        let (tx, rx) = device_pair();
        let reader = spawn_reader(rx, Arc::new(SharedState::default()), false).unwrap();
        drop(tx);
        wait_for(|| reader.state() == ReaderState::Stopped);
        assert_eq!(reader.stop_reason(), Some(StopReason::ShortRead(0)));
    }

    #[test]
    fn stop_is_prompt_and_idempotent() {
        let (_tx, rx) = device_pair();
        let mut reader = spawn_reader(rx, Arc::new(SharedState::default()), false).unwrap();
        wait_for(|| reader.state() == ReaderState::Polling);

        let start = Instant::now();
        reader.stop();
        assert!(start.elapsed() < Duration::from_millis(READ_TIMEOUT_MS as u64));
        assert_eq!(reader.stop_reason(), Some(StopReason::Cancelled));

        reader.stop();
        assert_eq!(reader.state(), ReaderState::Stopped);
        assert_eq!(reader.stop_reason(), Some(StopReason::Cancelled));
    }

    fn reader_over(device: File, debug: bool) -> Reader {
        Reader {
            device,
            epoll: Epoll::new(EpollCreateFlags::empty()).unwrap(),
            signal: Arc::new(StopSignal::new().unwrap()),
            status: Arc::new(Mutex::new(Status {
                state: ReaderState::Idle,
                stop_reason: None,
                events: 0,
            })),
            state: Arc::new(SharedState::default()),
            debug,
        }
    }

    #[test]
    fn read_without_data_is_fatal() {
        let (_tx, rx) = device_pair();
        let mut reader = reader_over(rx, false);
        assert_eq!(
            reader.read_event(),
            Some(StopReason::ReadFailed(ErrorKind::WouldBlock))
        );
        assert_eq!(utils::lock(&reader.status).events, 0);
    }

    #[test]
    fn read_event_applies_one_record() {
        let (mut tx, rx) = device_pair();
        let mut reader = reader_over(rx, true);
        tx.write_all(&RawEvent::axis(2, 32767).to_bytes()).unwrap();

        assert_eq!(reader.read_event(), None);
        assert_eq!(reader.state.snapshot().left_trigger, 1.0);
        assert_eq!(utils::lock(&reader.status).events, 1);
        assert_eq!(
            reader.read_event(),
            Some(StopReason::ReadFailed(ErrorKind::WouldBlock))
        );
    }

    #[test]
    fn debug_mode_applies_and_stops() {
        let (mut tx, rx) = device_pair();
        let state = Arc::new(SharedState::default());
        let mut reader = spawn_reader(rx, state.clone(), true).unwrap();

        tx.write_all(&RawEvent::axis(2, 32767).to_bytes()).unwrap();
        tx.write_all(&RawEvent::button(3, 1).to_bytes()).unwrap();
        wait_for(|| reader.events_read() == 2);

        let s = state.snapshot();
        assert_eq!(s.left_trigger, 1.0);
        assert!(s.button_y);

        reader.stop();
        assert_eq!(reader.state(), ReaderState::Stopped);
        assert_eq!(reader.stop_reason(), Some(StopReason::Cancelled));
    }

    #[test]
    fn timeout_keeps_reader_running() {
        let (_tx, rx) = device_pair();
        let mut reader = spawn_reader(rx, Arc::new(SharedState::default()), false).unwrap();

        thread::sleep(Duration::from_millis(READ_TIMEOUT_MS as u64 + 300));
        assert!(reader.is_running());
        assert_eq!(reader.stop_reason(), None);
        let state = reader.state();
        assert!(
            state == ReaderState::Polling || state == ReaderState::TimedOut,
            "unexpected state {:?}",
            state
        );

        reader.stop();
        assert_eq!(reader.stop_reason(), Some(StopReason::Cancelled));
    }

    #[test]
    fn stop_reason_display() {
        assert_eq!(StopReason::ShortRead(0).to_string(), "end of device stream");
        assert_eq!(StopReason::ShortRead(3).to_string(), "read 3 bytes instead of 8");
    }
}
