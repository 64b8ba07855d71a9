/*
 * SPDX-License-Identifier: BlueOak-1.0.0
 */

//! Console output contract.
//!
//! The kernel never talks to hardware: all diagnostic and `show` text
//! is emitted through a sink supplied by the platform at kernel
//! construction time. The kernel never reads from the console.

pub mod null_console;

//--------------------------------------------------------------------------------------------------
// Public Definitions
//--------------------------------------------------------------------------------------------------

/// Console interfaces.
pub mod interface {
    use core::fmt;

    /// Console write functions. Sinks take `&self`; implementations
    /// with mutable state use interior mutability.
    pub trait Write {
        /// Write a Rust format string.
        fn write_fmt(&self, args: fmt::Arguments) -> fmt::Result;

        /// Write a plain string.
        fn write_str(&self, s: &str) -> fmt::Result {
            self.write_fmt(format_args!("{}", s))
        }
    }
}

/// Emit formatted text on a sink, ignoring sink errors; the kernel has
/// no way to recover from a broken console.
macro_rules! cwrite {
    ($sink:expr, $($arg:tt)*) => {{
        let _ = $crate::console::interface::Write::write_fmt($sink, format_args!($($arg)*));
    }};
}

pub(crate) use cwrite;

//--------------------------------------------------------------------------------------------------
// Testing
//--------------------------------------------------------------------------------------------------

/// A sink that accumulates output in memory, for test assertions.
#[cfg(test)]
pub struct BufferConsole {
    buf: core::cell::RefCell<String>,
}

#[cfg(test)]
impl BufferConsole {
    pub fn new() -> Self {
        Self {
            buf: core::cell::RefCell::new(String::new()),
        }
    }

    pub fn take(&self) -> String {
        self.buf.take()
    }

    pub fn contents(&self) -> String {
        self.buf.borrow().clone()
    }
}

#[cfg(test)]
impl interface::Write for BufferConsole {
    fn write_fmt(&self, args: core::fmt::Arguments) -> core::fmt::Result {
        use core::fmt::Write;
        self.buf.borrow_mut().write_fmt(args)
    }
}
