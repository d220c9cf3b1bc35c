// Copyright 2024 xjoy Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

// Joystick ioctls from linux/joystick.h. Numbers are the same on every architecture.

nix::ioctl_read! {
    /// `JSIOCGVERSION`, driver version as `0xMMmmpp`.
    jsiocgversion, b'j', 0x01, u32
}

nix::ioctl_read! {
    /// `JSIOCGAXES`
    jsiocgaxes, b'j', 0x11, u8
}

nix::ioctl_read! {
    /// `JSIOCGBUTTONS`
    jsiocgbuttons, b'j', 0x12, u8
}

nix::ioctl_read_buf! {
    /// `JSIOCGNAME(len)`, length is taken from the buffer.
    jsiocgname, b'j', 0x13, u8
}
