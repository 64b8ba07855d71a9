/*
 * SPDX-License-Identifier: BlueOak-1.0.0
 */

//! Kernel error taxonomy.
//!
//! Every fallible kernel call returns `Result<T, BlocsError>`. The
//! display strings double as the human-readable error text used by the
//! parser diagnostics.

use snafu::Snafu;

#[derive(Debug, Snafu, Clone, Copy, PartialEq, Eq)]
pub enum BlocsError {
    #[snafu(display("operand out of range"))]
    Range,
    #[snafu(display("insufficient realtime memory"))]
    NoRtRam,
    #[snafu(display("insufficient metadata memory"))]
    NoMetaRam,
    #[snafu(display("component does not support personality"))]
    NoPersonality,
    #[snafu(display("name already exists"))]
    NameExists,
    #[snafu(display("type mismatch"))]
    TypeMismatch,
    #[snafu(display("already linked"))]
    AlreadyLinked,
    #[snafu(display("not found"))]
    NotFound,
    #[snafu(display("object too large"))]
    TooBig,
    #[snafu(display("signal cannot be 'raw'"))]
    RawSignal,
    #[snafu(display("internal data structure error"))]
    Internal,
}

pub type Result<T> = core::result::Result<T, BlocsError>;

cfg_if::cfg_if! {
    if #[cfg(feature = "halt-on-error")] {
        /// Funnel for every error the kernel raises. On the
        /// `halt-on-error` build there is nothing useful a caller
        /// could do, so spin instead of returning.
        #[inline]
        pub(crate) fn raise(e: BlocsError) -> BlocsError {
            let _ = e;
            loop {}
        }
    } else {
        /// Funnel for every error the kernel raises.
        #[inline]
        pub(crate) fn raise(e: BlocsError) -> BlocsError {
            e
        }
    }
}

/// Raise the given error variant and return from the calling function.
macro_rules! fail {
    ($variant:ident) => {
        return Err($crate::error::raise($crate::error::BlocsError::$variant))
    };
}

pub(crate) use fail;
