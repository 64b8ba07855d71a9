/*
 * SPDX-License-Identifier: BlueOak-1.0.0
 */

//! Object names, owned by the metadata pool.
//!
//! Creation operations copy the incoming name's bytes into metadata
//! words; records carry a [`NameRef`] packing the word index and the
//! byte length into a single word. Callers may therefore hand in
//! transient strings (parser tokens, formatted pin names) without the
//! kernel holding on to their storage.

use {
    bit_field::BitField,
    core::{cmp::Ordering, fmt},
};

use crate::{
    config,
    error::{fail, Result},
    pool::MetaPool,
};

//--------------------------------------------------------------------------------------------------
// Public Definitions
//--------------------------------------------------------------------------------------------------

const IDX_RANGE: core::ops::Range<usize> = 0..config::META_INDEX_BITS;
const LEN_RANGE: core::ops::Range<usize> = 16..16 + config::NAME_LEN_BITS;

/// Packed reference to a name stored in the metadata pool.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct NameRef(u32);

/// Fixed scratch buffer for names, with a `fmt::Write` implementation
/// so dynamic names can be assembled with `write!`.
pub struct NameBuf {
    buf: [u8; config::MAX_NAME_LEN],
    len: usize,
}

//--------------------------------------------------------------------------------------------------
// Public Code
//--------------------------------------------------------------------------------------------------

impl NameRef {
    pub fn pack(word_index: u32, len: usize) -> NameRef {
        let mut w = 0u32;
        w.set_bits(IDX_RANGE, word_index);
        w.set_bits(LEN_RANGE, len as u32);
        NameRef(w)
    }

    pub fn from_word(w: u32) -> NameRef {
        NameRef(w)
    }

    pub fn word(self) -> u32 {
        self.0
    }

    pub fn index(self) -> u32 {
        self.0.get_bits(IDX_RANGE)
    }

    pub fn len(self) -> usize {
        self.0.get_bits(LEN_RANGE) as usize
    }
}

/// Copy a name into the metadata pool. The name must be 1 to
/// `MAX_NAME_LEN` bytes; anything longer would not fit the length
/// bitfield.
pub(crate) fn store(meta: &MetaPool, name: &str) -> Result<NameRef> {
    let len = name.len();
    if len == 0 || len > config::MAX_NAME_LEN {
        fail!(Range);
    }
    let idx = meta.alloc(len)?;
    for (i, b) in name.bytes().enumerate() {
        let word = meta.get_at(idx.raw(), i / 4);
        meta.set_at(idx.raw(), i / 4, word | ((b as u32) << (8 * (i % 4))));
    }
    Ok(NameRef::pack(idx.raw(), len))
}

/// The `i`th byte of a stored name.
#[inline]
pub(crate) fn byte(meta: &MetaPool, r: NameRef, i: usize) -> u8 {
    (meta.get_at(r.index(), i / 4) >> (8 * (i % 4))) as u8
}

/// Compare a stored name against a key, byte-wise.
pub(crate) fn cmp_str(meta: &MetaPool, r: NameRef, key: &str) -> Ordering {
    let kb = key.as_bytes();
    let n = r.len().min(kb.len());
    for i in 0..n {
        match byte(meta, r, i).cmp(&kb[i]) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    r.len().cmp(&kb.len())
}

pub(crate) fn eq_str(meta: &MetaPool, r: NameRef, key: &str) -> bool {
    cmp_str(meta, r, key) == Ordering::Equal
}

/// Copy a stored name into a scratch buffer.
pub(crate) fn read_into(meta: &MetaPool, r: NameRef, buf: &mut NameBuf) {
    buf.clear();
    for i in 0..r.len() {
        buf.push_byte(byte(meta, r, i));
    }
}

/// `Display` adapter for a stored name.
pub(crate) struct NameDisplay<'a> {
    pub meta: &'a MetaPool,
    pub name: NameRef,
}

impl fmt::Display for NameDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut buf = NameBuf::new();
        read_into(self.meta, self.name, &mut buf);
        f.pad(buf.as_str())
    }
}

impl NameBuf {
    pub const fn new() -> Self {
        Self {
            buf: [0; config::MAX_NAME_LEN],
            len: 0,
        }
    }

    pub fn from_str(s: &str) -> Self {
        let mut b = Self::new();
        let _ = fmt::Write::write_str(&mut b, s);
        b
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }

    fn push_byte(&mut self, b: u8) {
        if self.len < self.buf.len() {
            self.buf[self.len] = b;
            self.len += 1;
        }
    }

    pub fn as_str(&self) -> &str {
        // Only whole &str slices are ever appended, so the contents
        // are valid UTF-8.
        unsafe { core::str::from_utf8_unchecked(&self.buf[..self.len]) }
    }
}

impl Default for NameBuf {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Write for NameBuf {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let bytes = s.as_bytes();
        if self.len + bytes.len() > self.buf.len() {
            return Err(fmt::Error);
        }
        self.buf[self.len..self.len + bytes.len()].copy_from_slice(bytes);
        self.len += bytes.len();
        Ok(())
    }
}

//--------------------------------------------------------------------------------------------------
// Testing
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BlocsError;

    #[test]
    fn store_and_read_back() {
        let meta = MetaPool::new();
        let r = store(&meta, "motor_ctl").unwrap();
        assert_eq!(r.len(), 9);
        let mut buf = NameBuf::new();
        read_into(&meta, r, &mut buf);
        assert_eq!(buf.as_str(), "motor_ctl");
    }

    #[test]
    fn ordering_matches_str() {
        let meta = MetaPool::new();
        let r = store(&meta, "mid").unwrap();
        assert_eq!(cmp_str(&meta, r, "mid"), Ordering::Equal);
        assert_eq!(cmp_str(&meta, r, "midway"), Ordering::Less);
        assert_eq!(cmp_str(&meta, r, "m"), Ordering::Greater);
        assert_eq!(cmp_str(&meta, r, "zzz"), Ordering::Less);
        assert!(eq_str(&meta, r, "mid"));
    }

    #[test]
    fn length_limits() {
        let meta = MetaPool::new();
        assert_eq!(store(&meta, ""), Err(BlocsError::Range));
        let long = "x".repeat(config::MAX_NAME_LEN + 1);
        assert_eq!(store(&meta, &long), Err(BlocsError::Range));
        let max = "y".repeat(config::MAX_NAME_LEN);
        assert!(store(&meta, &max).is_ok());
    }

    #[test]
    fn name_buf_formatting() {
        use core::fmt::Write;
        let mut buf = NameBuf::new();
        write!(buf, "in{}", 7).unwrap();
        assert_eq!(buf.as_str(), "in7");
        // overflow is refused without partial writes
        let mut full = NameBuf::from_str(&"a".repeat(config::MAX_NAME_LEN));
        assert!(write!(full, "b").is_err());
        assert_eq!(full.as_str().len(), config::MAX_NAME_LEN);
    }
}
