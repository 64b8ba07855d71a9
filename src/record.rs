/*
 * SPDX-License-Identifier: BlueOak-1.0.0
 */

//! Metadata record layouts.
//!
//! The five record kinds live in the metadata pool as short runs of
//! `u32` words. Every kind starts with the same two words — the
//! owning-next link of its name-sorted list and the packed name
//! reference — so the list operations are generic over [`Node`]. The
//! remaining words pack pool indices and tag fields into bitfields;
//! `config` asserts that every packing fits.
//!
//! Records never move once allocated, so a record is represented by
//! the plain word index of its first word.

use {bit_field::BitField, core::cell::Cell, core::ops::Range};

use crate::{
    config,
    error::{fail, Result},
    name::{self, NameRef},
    pool::{MetaPool, PoolIndex, Rt},
    value::{Dir, Floating, Type},
};

const RT_BITS: usize = config::RT_INDEX_BITS;

/// Raw none-sentinel for metadata links.
pub(crate) const META_NONE: u32 = config::META_INDEX_MASK;
/// Raw none-sentinel for realtime links.
pub(crate) const RT_NONE: u32 = config::RT_INDEX_MASK;

//--------------------------------------------------------------------------------------------------
// Record kinds
//--------------------------------------------------------------------------------------------------

/// Block record: component instance. `data_index`/`data_size` describe
/// the block's realtime data; the pin and function lists are rooted in
/// the record itself.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct BlockRec(pub u32);

/// Pin record. `ptr_index` locates the pin's pointer cell inside the
/// block data, `dummy_index` the pin's private fallback cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct PinRec(pub u32);

/// Function record. `thread` holds the owning thread record's index,
/// or the none-sentinel while the function is unlinked.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct FunctionRec(pub u32);

/// Signal record.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct SignalRec(pub u32);

/// Thread record.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct ThreadRec(pub u32);

impl BlockRec {
    pub const WORDS: usize = 6;
    const DATA_IDX: Range<usize> = 0..RT_BITS;
    const DATA_SIZE: Range<usize> = RT_BITS..RT_BITS + config::BLOCK_DATA_SIZE_BITS;

    pub fn data_index(self, m: &MetaPool) -> PoolIndex<Rt> {
        PoolIndex::new(m.get_at(self.0, 2).get_bits(Self::DATA_IDX))
    }

    pub fn data_size(self, m: &MetaPool) -> usize {
        m.get_at(self.0, 2).get_bits(Self::DATA_SIZE) as usize
    }

    pub fn set_data(self, m: &MetaPool, index: PoolIndex<Rt>, size: usize) {
        let mut w = 0u32;
        w.set_bits(Self::DATA_IDX, index.raw());
        w.set_bits(Self::DATA_SIZE, size as u32);
        m.set_at(self.0, 2, w);
    }

    pub fn comp_index(self, m: &MetaPool) -> usize {
        m.get_at(self.0, 3) as usize
    }

    pub fn set_comp_index(self, m: &MetaPool, comp: usize) {
        m.set_at(self.0, 3, comp as u32);
    }

    pub fn pin_root<'p>(self, m: &'p MetaPool) -> &'p Cell<u32> {
        m.cell(self.0 + 4)
    }

    pub fn function_root<'p>(self, m: &'p MetaPool) -> &'p Cell<u32> {
        m.cell(self.0 + 5)
    }
}

impl PinRec {
    pub const WORDS: usize = 3;
    const PTR_IDX: Range<usize> = 0..RT_BITS;
    const DUMMY_IDX: Range<usize> = RT_BITS..RT_BITS * 2;
    const TYPE: Range<usize> = RT_BITS * 2..RT_BITS * 2 + config::TYPE_BITS;
    const DIR: Range<usize> =
        RT_BITS * 2 + config::TYPE_BITS..RT_BITS * 2 + config::TYPE_BITS + config::DIR_BITS;

    pub fn ptr_index(self, m: &MetaPool) -> PoolIndex<Rt> {
        PoolIndex::new(m.get_at(self.0, 2).get_bits(Self::PTR_IDX))
    }

    pub fn dummy_index(self, m: &MetaPool) -> PoolIndex<Rt> {
        PoolIndex::new(m.get_at(self.0, 2).get_bits(Self::DUMMY_IDX))
    }

    pub fn data_type(self, m: &MetaPool) -> Type {
        Type::from_raw(m.get_at(self.0, 2).get_bits(Self::TYPE))
    }

    pub fn dir_raw(self, m: &MetaPool) -> u32 {
        m.get_at(self.0, 2).get_bits(Self::DIR)
    }

    pub fn init(
        self,
        m: &MetaPool,
        ptr: PoolIndex<Rt>,
        dummy: PoolIndex<Rt>,
        ty: Type,
        dir: Dir,
    ) {
        let mut w = 0u32;
        w.set_bits(Self::PTR_IDX, ptr.raw());
        w.set_bits(Self::DUMMY_IDX, dummy.raw());
        w.set_bits(Self::TYPE, ty as u32);
        w.set_bits(Self::DIR, dir as u32);
        m.set_at(self.0, 2, w);
    }
}

impl FunctionRec {
    pub const WORDS: usize = 4;
    const RTDATA_IDX: Range<usize> = 0..RT_BITS;
    const NOFP: Range<usize> = RT_BITS..RT_BITS + config::NOFP_BITS;

    pub fn rtdata_index(self, m: &MetaPool) -> PoolIndex<Rt> {
        PoolIndex::new(m.get_at(self.0, 2).get_bits(Self::RTDATA_IDX))
    }

    pub fn floating(self, m: &MetaPool) -> Floating {
        Floating::from_raw(m.get_at(self.0, 2).get_bits(Self::NOFP))
    }

    pub fn init(self, m: &MetaPool, rtdata: PoolIndex<Rt>, fp: Floating) {
        let mut w = 0u32;
        w.set_bits(Self::RTDATA_IDX, rtdata.raw());
        w.set_bits(Self::NOFP, fp as u32);
        m.set_at(self.0, 2, w);
        m.set_at(self.0, 3, META_NONE);
    }

    /// Owning thread record index, or the none-sentinel.
    pub fn thread(self, m: &MetaPool) -> u32 {
        m.get_at(self.0, 3)
    }

    pub fn set_thread(self, m: &MetaPool, thread: u32) {
        m.set_at(self.0, 3, thread);
    }
}

impl SignalRec {
    pub const WORDS: usize = 3;
    const DATA_IDX: Range<usize> = 0..RT_BITS;
    const TYPE: Range<usize> = RT_BITS..RT_BITS + config::TYPE_BITS;

    pub fn data_index(self, m: &MetaPool) -> PoolIndex<Rt> {
        PoolIndex::new(m.get_at(self.0, 2).get_bits(Self::DATA_IDX))
    }

    pub fn data_type(self, m: &MetaPool) -> Type {
        Type::from_raw(m.get_at(self.0, 2).get_bits(Self::TYPE))
    }

    pub fn init(self, m: &MetaPool, data: PoolIndex<Rt>, ty: Type) {
        let mut w = 0u32;
        w.set_bits(Self::DATA_IDX, data.raw());
        w.set_bits(Self::TYPE, ty as u32);
        m.set_at(self.0, 2, w);
    }
}

impl ThreadRec {
    pub const WORDS: usize = 3;
    const DATA_IDX: Range<usize> = 0..RT_BITS;
    const NOFP: Range<usize> = RT_BITS..RT_BITS + config::NOFP_BITS;

    pub fn data_index(self, m: &MetaPool) -> PoolIndex<Rt> {
        PoolIndex::new(m.get_at(self.0, 2).get_bits(Self::DATA_IDX))
    }

    pub fn floating(self, m: &MetaPool) -> Floating {
        Floating::from_raw(m.get_at(self.0, 2).get_bits(Self::NOFP))
    }

    pub fn init(self, m: &MetaPool, data: PoolIndex<Rt>, fp: Floating) {
        let mut w = 0u32;
        w.set_bits(Self::DATA_IDX, data.raw());
        w.set_bits(Self::NOFP, fp as u32);
        m.set_at(self.0, 2, w);
    }
}

//--------------------------------------------------------------------------------------------------
// Name-sorted lists
//--------------------------------------------------------------------------------------------------

/// Common head shared by every record kind: word 0 is the list link,
/// word 1 the name reference.
pub(crate) trait Node: Copy {
    fn at(idx: u32) -> Self;
    fn idx(self) -> u32;

    fn next(self, m: &MetaPool) -> u32;
    fn set_next(self, m: &MetaPool, next: u32);
    fn name_ref(self, m: &MetaPool) -> NameRef;
    fn set_name_ref(self, m: &MetaPool, name: NameRef);
}

macro_rules! node_impl {
    ($($t:ty),*) => {$(
        impl Node for $t {
            fn at(idx: u32) -> Self {
                Self(idx)
            }
            fn idx(self) -> u32 {
                self.0
            }
            fn next(self, m: &MetaPool) -> u32 {
                m.get_at(self.0, 0)
            }
            fn set_next(self, m: &MetaPool, next: u32) {
                m.set_at(self.0, 0, next);
            }
            fn name_ref(self, m: &MetaPool) -> NameRef {
                NameRef::from_word(m.get_at(self.0, 1))
            }
            fn set_name_ref(self, m: &MetaPool, name: NameRef) {
                m.set_at(self.0, 1, name.word());
            }
        }
    )*};
}

node_impl!(BlockRec, PinRec, FunctionRec, SignalRec, ThreadRec);

/// Allocate a fresh record of `words` words and attach its name.
pub(crate) fn alloc_node<N: Node>(m: &MetaPool, words: usize, name: &str) -> Result<N> {
    let name_ref = name::store(m, name)?;
    let idx = m.alloc(words * 4)?;
    let node = N::at(idx.raw());
    node.set_next(m, META_NONE);
    node.set_name_ref(m, name_ref);
    Ok(node)
}

/// Splice a node into its list keeping names strictly ascending.
pub(crate) fn insert_sorted<N: Node>(m: &MetaPool, root: &Cell<u32>, node: N) -> Result<()> {
    let mut key = crate::name::NameBuf::new();
    name::read_into(m, node.name_ref(m), &mut key);

    let mut prev: Option<N> = None;
    let mut cur = root.get();
    while cur != META_NONE {
        let c = N::at(cur);
        match name::cmp_str(m, c.name_ref(m), key.as_str()) {
            core::cmp::Ordering::Less => {
                prev = Some(c);
                cur = c.next(m);
            }
            core::cmp::Ordering::Equal => fail!(NameExists),
            core::cmp::Ordering::Greater => break,
        }
    }
    node.set_next(m, cur);
    match prev {
        Some(p) => p.set_next(m, node.idx()),
        None => root.set(node.idx()),
    }
    Ok(())
}

/// Find a node by name.
pub(crate) fn find<N: Node>(m: &MetaPool, root: &Cell<u32>, key: &str) -> Option<N> {
    iter::<N>(m, root).find(|n| name::eq_str(m, n.name_ref(m), key))
}

pub(crate) fn iter<'m, N: Node>(m: &'m MetaPool, root: &Cell<u32>) -> ListIter<'m, N> {
    ListIter {
        m,
        cur: root.get(),
        _marker: core::marker::PhantomData,
    }
}

pub(crate) struct ListIter<'m, N: Node> {
    m: &'m MetaPool,
    cur: u32,
    _marker: core::marker::PhantomData<N>,
}

impl<N: Node> Iterator for ListIter<'_, N> {
    type Item = N;

    fn next(&mut self) -> Option<N> {
        if self.cur == META_NONE {
            return None;
        }
        let node = N::at(self.cur);
        self.cur = node.next(self.m);
        Some(node)
    }
}

//--------------------------------------------------------------------------------------------------
// Testing
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BlocsError;

    fn push(m: &MetaPool, root: &Cell<u32>, name: &str) -> Result<SignalRec> {
        let rec: SignalRec = alloc_node(m, SignalRec::WORDS, name)?;
        insert_sorted(m, root, rec)?;
        Ok(rec)
    }

    #[test]
    fn names_stay_strictly_ascending() {
        let m = MetaPool::new();
        let root = Cell::new(META_NONE);
        for n in ["delta", "alpha", "echo", "bravo", "charlie"] {
            push(&m, &root, n).unwrap();
        }
        let mut prev = crate::name::NameBuf::new();
        let mut count = 0;
        for rec in iter::<SignalRec>(&m, &root) {
            let mut cur = crate::name::NameBuf::new();
            name::read_into(&m, rec.name_ref(&m), &mut cur);
            if count > 0 {
                assert!(prev.as_str() < cur.as_str());
            }
            prev = cur;
            count += 1;
        }
        assert_eq!(count, 5);
    }

    #[test]
    fn duplicate_names_rejected() {
        let m = MetaPool::new();
        let root = Cell::new(META_NONE);
        push(&m, &root, "dup").unwrap();
        let rec: SignalRec = alloc_node(&m, SignalRec::WORDS, "dup").unwrap();
        assert_eq!(insert_sorted(&m, &root, rec), Err(BlocsError::NameExists));
        assert_eq!(iter::<SignalRec>(&m, &root).count(), 1);
    }

    #[test]
    fn find_by_name() {
        let m = MetaPool::new();
        let root = Cell::new(META_NONE);
        let b = push(&m, &root, "bbb").unwrap();
        push(&m, &root, "aaa").unwrap();
        assert_eq!(find::<SignalRec>(&m, &root, "bbb"), Some(b));
        assert!(find::<SignalRec>(&m, &root, "ccc").is_none());
    }

    #[test]
    fn pin_fields_round_trip() {
        let m = MetaPool::new();
        let rec: PinRec = alloc_node(&m, PinRec::WORDS, "in").unwrap();
        rec.init(
            &m,
            PoolIndex::new(17),
            PoolIndex::new(401),
            Type::S32,
            Dir::InOut,
        );
        assert_eq!(rec.ptr_index(&m).raw(), 17);
        assert_eq!(rec.dummy_index(&m).raw(), 401);
        assert_eq!(rec.data_type(&m), Type::S32);
        assert_eq!(rec.dir_raw(&m), Dir::InOut as u32);
    }
}
