// Copyright 2024 xjoy Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use std::ffi::CStr;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Returns true if nth bit of byte is 1.
pub fn test_bit(n: u8, byte: u8) -> bool {
    (byte >> n) & 1 != 0
}

/// Reads NUL-terminated string from buffer filled by the kernel. Whole buffer is used when
/// there is no NUL byte.
pub fn string_from_buf(buf: &[u8]) -> String {
    match CStr::from_bytes_until_nul(buf) {
        Ok(s) => s.to_string_lossy().into_owned(),
        Err(_) => String::from_utf8_lossy(buf).into_owned(),
    }
}

/// Locks mutex, recovering the guard if a previous holder panicked.
pub fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn t_test_bit() {
        let byte = 0b1001_0001u8;
        assert_eq!(test_bit(0, byte), true);
        assert_eq!(test_bit(3, byte), false);
        assert_eq!(test_bit(4, byte), true);
        assert_eq!(test_bit(7, byte), true);
    }

    #[test]
    fn t_string_from_buf() {
        assert_eq!(string_from_buf(b"Xbox Wireless Controller\0\0\0"), "Xbox Wireless Controller");
        assert_eq!(string_from_buf(b"no terminator"), "no terminator");
        assert_eq!(string_from_buf(b"\0junk"), "");
    }
}
