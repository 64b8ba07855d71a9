/*
 * SPDX-License-Identifier: BlueOak-1.0.0
 */

//! Compile-time configuration.
//!
//! Realtime data and object metadata live in two separate pools. Each
//! pool is an array of `u32` words, and metadata records store pool
//! addresses as word indices packed into bitfields. The widths of
//! those bitfields are derived here from the pool sizes; the asserts
//! below refuse to build a configuration whose indices would not fit.

use static_assertions::const_assert;

/// Size of the memory pool for realtime data, in bytes.
pub const RT_POOL_SIZE: usize = 2048;

/// Size of the memory pool for object metadata, in bytes.
pub const META_POOL_SIZE: usize = 4096;

/// Maximum length of object names.
pub const MAX_NAME_LEN: usize = 40;

/// Maximum length of a parser token.
pub const MAX_TOKEN_LEN: usize = 100;

/// Number of bits needed to store `n`.
pub const fn bits_to_store(n: u32) -> usize {
    (32 - n.leading_zeros()) as usize
}

pub const RT_POOL_WORDS: usize = RT_POOL_SIZE / 4;
pub const META_POOL_WORDS: usize = META_POOL_SIZE / 4;

pub const RT_INDEX_BITS: usize = bits_to_store((RT_POOL_WORDS - 1) as u32);
pub const META_INDEX_BITS: usize = bits_to_store((META_POOL_WORDS - 1) as u32);

pub const RT_INDEX_MASK: u32 = (1 << RT_INDEX_BITS) - 1;
pub const META_INDEX_MASK: u32 = (1 << META_INDEX_BITS) - 1;

/// Per-block realtime data size is stored in a bitfield.
pub const BLOCK_DATA_SIZE_BITS: usize = 10;
pub const BLOCK_DATA_MAX_SIZE: usize = 1 << BLOCK_DATA_SIZE_BITS;

/// Per-block pin count limit.
pub const PIN_COUNT_BITS: usize = 8;
pub const PIN_COUNT_MAX: usize = 1 << PIN_COUNT_BITS;

/// Per-component function count limit.
pub const FUNCTION_COUNT_BITS: usize = 3;
pub const FUNCTION_COUNT_MAX: usize = 1 << FUNCTION_COUNT_BITS;

/// Component table index limit.
pub const COMP_INDEX_BITS: usize = 8;
pub const COMP_COUNT_MAX: usize = 1 << COMP_INDEX_BITS;

/// Widths of the tag fields, from their enum cardinality.
pub const TYPE_BITS: usize = bits_to_store(crate::value::Type::Raw as u32);
pub const DIR_BITS: usize = bits_to_store(crate::value::Dir::InOut as u32);
pub const NOFP_BITS: usize = bits_to_store(crate::value::Floating::NoFp as u32);

/// Name references pack a meta-pool index and a byte length into one word.
pub const NAME_LEN_BITS: usize = bits_to_store(MAX_NAME_LEN as u32);

// Pool sizes must be whole words.
const_assert!(RT_POOL_SIZE % 4 == 0);
const_assert!(META_POOL_SIZE % 4 == 0);

// The derived index widths must be able to address the whole pool.
const_assert!((4 << RT_INDEX_BITS) >= RT_POOL_SIZE);
const_assert!((4 << META_INDEX_BITS) >= META_POOL_SIZE);

// Packed record words must fit in 32 bits.
const_assert!(RT_INDEX_BITS + BLOCK_DATA_SIZE_BITS <= 32); // block data word
const_assert!(RT_INDEX_BITS * 2 + TYPE_BITS + DIR_BITS <= 32); // pin word
const_assert!(RT_INDEX_BITS + NOFP_BITS <= 32); // function word
const_assert!(RT_INDEX_BITS + TYPE_BITS <= 32); // signal word
const_assert!(META_INDEX_BITS + NAME_LEN_BITS <= 32); // name reference
const_assert!(COMP_INDEX_BITS + FUNCTION_COUNT_BITS <= 32); // function ref

// Block data offsets share the size bitfield.
const_assert!(BLOCK_DATA_MAX_SIZE <= RT_POOL_SIZE);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_widths() {
        // 2048 byte pool -> 512 words -> 9 bit indices
        assert_eq!(RT_INDEX_BITS, 9);
        // 4096 byte pool -> 1024 words -> 10 bit indices
        assert_eq!(META_INDEX_BITS, 10);
        assert_eq!(bits_to_store(0), 0);
        assert_eq!(bits_to_store(1), 1);
        assert_eq!(bits_to_store(511), 9);
        assert_eq!(bits_to_store(512), 10);
    }
}
