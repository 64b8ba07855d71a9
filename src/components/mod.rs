/*
 * SPDX-License-Identifier: BlueOak-1.0.0
 */

//! Demo component library.
//!
//! A handful of small blocks exercising the component ABI: fixed pin
//! tables (`not`, `sum2`, `mux2`), a raw observation pin (`tap`) and a
//! personality-driven custom setup with dynamically named pins
//! (`mux`). Applications assemble their own table of the components
//! they use; [`LIBRARY`] is the table used by the examples and tests.

pub mod mux;
pub mod mux2;
pub mod not;
pub mod sum2;
pub mod tap;

use crate::comp::ComponentDef;

/// All demo components, in component-table form.
pub static LIBRARY: [&ComponentDef; 5] = [
    &not::DEF,
    &sum2::DEF,
    &mux2::DEF,
    &mux::DEF,
    &tap::DEF,
];
