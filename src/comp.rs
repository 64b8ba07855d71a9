/*
 * SPDX-License-Identifier: BlueOak-1.0.0
 */

//! Component ABI.
//!
//! A component contributes exactly one immutable [`ComponentDef`] to
//! the binary; the application passes a slice of definition references
//! to [`Kernel::new`](crate::Kernel::new) and the `instance` command
//! looks components up in it by name.
//!
//! Realtime functions receive a [`BlockData`] view of their block's
//! realtime words plus the calling period in nanoseconds. Pin
//! accessors take the pin's byte offset inside the block data and
//! dereference the pin's pointer cell, so a function reads whatever
//! value cell the pin is currently bound to.

use {
    crate::{
        error::Result,
        kernel::{BlockId, Kernel},
        value::{Dir, Floating, Type},
    },
    core::cell::Cell,
};

//--------------------------------------------------------------------------------------------------
// Public Definitions
//--------------------------------------------------------------------------------------------------

/// Whether a component consumes a personality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Personality {
    /// The component has a fixed layout and refuses a personality.
    No,
    /// The component's custom setup requires a personality token.
    Required,
}

/// Defines one pin of a component. For fixed components an array of
/// these lives in the definition; custom setups may also build them on
/// the stack to create dynamically named pins. `data_offset` is the
/// byte offset of the pin's pointer cell inside the block data.
pub struct PinDef<'a> {
    pub name: &'a str,
    pub data_type: Type,
    pub dir: Dir,
    pub data_offset: usize,
}

/// A realtime function to be called from a thread.
pub type RtFn = for<'a> fn(BlockData<'a>, u32);

/// Defines one realtime function of a component.
pub struct FunctionDef {
    pub name: &'static str,
    pub floating: Floating,
    pub run: RtFn,
}

/// Component-specific setup callback. Setups parse the personality,
/// create the block (usually with a computed data size) and add pins
/// and functions through the same kernel helpers the default setup
/// uses.
pub type SetupFn = for<'k, 'a> fn(&'a Kernel<'k>, &'a SetupArgs<'a>) -> Result<BlockId>;

/// Immutable description of a component, typically a static.
pub struct ComponentDef {
    pub name: &'static str,
    /// Size of the per-block realtime data, in bytes. A custom setup
    /// may override it per block.
    pub data_size: usize,
    pub personality: Personality,
    pub pins: &'static [PinDef<'static>],
    pub functions: &'static [FunctionDef],
    /// `None` selects the default setup.
    pub setup: Option<SetupFn>,
}

/// Arguments handed to a custom setup callback.
pub struct SetupArgs<'a> {
    pub name: &'a str,
    pub comp_index: usize,
    pub def: &'a ComponentDef,
    pub personality: Option<&'a str>,
}

/// Typed view of one block's realtime data.
///
/// Offsets are in bytes from the block data base, matching the
/// offsets declared in pin definitions. The pin accessors follow the
/// pointer cell at the offset; [`word`](Self::word)/[`set_word`](Self::set_word)
/// touch block state words directly.
#[derive(Clone, Copy)]
pub struct BlockData<'a> {
    cells: &'a [Cell<u32>],
    base: usize,
}

//--------------------------------------------------------------------------------------------------
// Public Code
//--------------------------------------------------------------------------------------------------

impl<'a> BlockData<'a> {
    pub(crate) fn new(cells: &'a [Cell<u32>], base: usize) -> Self {
        Self { cells, base }
    }

    /// Index of the value cell the pin at `offset` is bound to.
    #[inline]
    fn target(&self, offset: usize) -> usize {
        debug_assert!(offset % 4 == 0);
        self.cells[self.base + offset / 4].get() as usize
    }

    #[inline]
    pub fn bit(&self, offset: usize) -> bool {
        self.cells[self.target(offset)].get() != 0
    }

    #[inline]
    pub fn set_bit(&self, offset: usize, v: bool) {
        self.cells[self.target(offset)].set(v as u32);
    }

    #[inline]
    pub fn float(&self, offset: usize) -> f32 {
        f32::from_bits(self.cells[self.target(offset)].get())
    }

    #[inline]
    pub fn set_float(&self, offset: usize, v: f32) {
        self.cells[self.target(offset)].set(v.to_bits());
    }

    #[inline]
    pub fn s32(&self, offset: usize) -> i32 {
        self.cells[self.target(offset)].get() as i32
    }

    #[inline]
    pub fn set_s32(&self, offset: usize, v: i32) {
        self.cells[self.target(offset)].set(v as u32);
    }

    #[inline]
    pub fn u32(&self, offset: usize) -> u32 {
        self.cells[self.target(offset)].get()
    }

    #[inline]
    pub fn set_u32(&self, offset: usize, v: u32) {
        self.cells[self.target(offset)].set(v);
    }

    /// Bare bits of the bound cell, for raw pins.
    #[inline]
    pub fn raw(&self, offset: usize) -> u32 {
        self.cells[self.target(offset)].get()
    }

    #[inline]
    pub fn set_raw(&self, offset: usize, v: u32) {
        self.cells[self.target(offset)].set(v);
    }

    /// Read a block state word (not a pin) at `offset` bytes.
    #[inline]
    pub fn word(&self, offset: usize) -> u32 {
        debug_assert!(offset % 4 == 0);
        self.cells[self.base + offset / 4].get()
    }

    #[inline]
    pub fn set_word(&self, offset: usize, v: u32) {
        debug_assert!(offset % 4 == 0);
        self.cells[self.base + offset / 4].set(v);
    }
}
