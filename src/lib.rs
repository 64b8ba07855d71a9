/*
 * SPDX-License-Identifier: BlueOak-1.0.0
 */

//! EMBLOCS — embedded block-oriented control system.
//!
//! A runtime framework for assembling realtime control systems on
//! microcontrollers out of a library of statically defined components.
//! Components are instantiated as blocks, wired together with typed
//! signals, and their realtime functions are scheduled into periodic
//! threads. Assembly is driven either through the typed [`Kernel`] API
//! or through the declarative command language of [`Parser`].
//!
//! All state lives in two fixed-size memory pools inside the kernel
//! context; nothing is heap-allocated and nothing moves once created.

#![cfg_attr(not(test), no_std)]
#![allow(clippy::upper_case_acronyms)]

pub mod comp;
pub mod components;
pub mod config;
pub mod console;
pub mod error;
pub mod kernel;
mod name;
pub mod parse;
pub mod pool;
mod record;
mod show;
pub mod value;

pub use crate::{
    comp::{BlockData, ComponentDef, FunctionDef, Personality, PinDef, RtFn, SetupArgs, SetupFn},
    error::{BlocsError, Result},
    kernel::{BlockId, FunctionId, Kernel, PinId, SignalId, ThreadHandle, ThreadId},
    name::NameBuf,
    parse::Parser,
    value::{Dir, Floating, Type, Value},
};

/// Version string.
pub fn version() -> &'static str {
    concat!(
        env!("CARGO_PKG_NAME"),
        " version ",
        env!("CARGO_PKG_VERSION")
    )
}
