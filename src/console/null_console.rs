/*
 * SPDX-License-Identifier: BlueOak-1.0.0
 */

use crate::console::interface;

//--------------------------------------------------------------------------------------------------
// Public Definitions
//--------------------------------------------------------------------------------------------------

/// A dummy console that just ignores all output.
pub struct NullConsole;

//--------------------------------------------------------------------------------------------------
// Global instances
//--------------------------------------------------------------------------------------------------

pub static NULL_CONSOLE: NullConsole = NullConsole {};

//--------------------------------------------------------------------------------------------------
// Public Code
//--------------------------------------------------------------------------------------------------

impl interface::Write for NullConsole {
    fn write_fmt(&self, _args: core::fmt::Arguments) -> core::fmt::Result {
        Ok(())
    }

    fn write_str(&self, _s: &str) -> core::fmt::Result {
        Ok(())
    }
}
