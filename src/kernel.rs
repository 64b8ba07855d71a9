/*
 * SPDX-License-Identifier: BlueOak-1.0.0
 */

//! The kernel context.
//!
//! [`Kernel`] bundles everything that makes up one assembled system:
//! the two memory pools, the three object list roots, the component
//! table and the console sink. All operations take `&self`; mutation
//! goes through the pools' word cells, which is what lets realtime
//! functions write value cells while the scheduler walks the very same
//! pool.
//!
//! The kernel provides no mutual exclusion. Assembly is expected to be
//! complete before the first tick, and a thread must not be run from
//! two execution contexts at once.

use {bit_field::BitField, core::cell::Cell, core::ops::Range};

use crate::{
    comp::{BlockData, ComponentDef, FunctionDef, PinDef, SetupArgs},
    config,
    console::{interface, null_console::NULL_CONSOLE},
    error::{fail, raise, BlocsError, Result},
    name::NameDisplay,
    pool::{MetaPool, PoolIndex, RtPool},
    record::{
        alloc_node, find, insert_sorted, BlockRec, FunctionRec, Node, PinRec, SignalRec,
        ThreadRec, META_NONE, RT_NONE,
    },
    value::{Floating, Type, Value},
};

//--------------------------------------------------------------------------------------------------
// Public Definitions
//--------------------------------------------------------------------------------------------------

/// Handle to a block record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockId(pub(crate) u32);

/// Handle to a pin record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinId(pub(crate) u32);

/// Handle to a function record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionId(pub(crate) u32);

/// Handle to a signal record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalId(pub(crate) u32);

/// Handle to a thread record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadId(pub(crate) u32);

/// Realtime handle to a thread head, the only thing a tick needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadHandle(pub(crate) u32);

/// The kernel context.
pub struct Kernel<'k> {
    pub(crate) rt: RtPool,
    pub(crate) meta: MetaPool,
    pub(crate) comps: &'k [&'k ComponentDef],
    pub(crate) block_root: Cell<u32>,
    pub(crate) signal_root: Cell<u32>,
    pub(crate) thread_root: Cell<u32>,
    pub(crate) sink: &'k (dyn interface::Write + 'k),
}

// Function runtime records identify their callback as a packed
// {component index, function ordinal} word.
const FNREF_COMP: Range<usize> = 0..config::COMP_INDEX_BITS;
const FNREF_ORD: Range<usize> =
    config::COMP_INDEX_BITS..config::COMP_INDEX_BITS + config::FUNCTION_COUNT_BITS;

fn pack_fnref(comp: usize, ord: usize) -> u32 {
    let mut w = 0u32;
    w.set_bits(FNREF_COMP, comp as u32);
    w.set_bits(FNREF_ORD, ord as u32);
    w
}

fn unpack_fnref(w: u32) -> (usize, usize) {
    (
        w.get_bits(FNREF_COMP) as usize,
        w.get_bits(FNREF_ORD) as usize,
    )
}

//--------------------------------------------------------------------------------------------------
// Public Code
//--------------------------------------------------------------------------------------------------

impl<'k> Kernel<'k> {
    /// Create a kernel over the given component table, with output
    /// discarded.
    pub fn new(comps: &'k [&'k ComponentDef]) -> Self {
        Self::with_console(comps, &NULL_CONSOLE)
    }

    /// Create a kernel that emits diagnostics and `show` output on the
    /// given sink.
    pub fn with_console(
        comps: &'k [&'k ComponentDef],
        sink: &'k (dyn interface::Write + 'k),
    ) -> Self {
        assert!(comps.len() <= config::COMP_COUNT_MAX);
        for def in comps {
            assert!(def.pins.len() <= config::PIN_COUNT_MAX);
            assert!(def.functions.len() <= config::FUNCTION_COUNT_MAX);
        }
        Self {
            rt: RtPool::new(),
            meta: MetaPool::new(),
            comps,
            block_root: Cell::new(META_NONE),
            signal_root: Cell::new(META_NONE),
            thread_root: Cell::new(META_NONE),
            sink,
        }
    }

    pub(crate) fn sink(&self) -> &dyn interface::Write {
        self.sink
    }

    pub(crate) fn component(&self, index: usize) -> &'k ComponentDef {
        self.comps[index]
    }

    //----------------------------------------------------------------------------------------------
    // Lookups
    //----------------------------------------------------------------------------------------------

    pub(crate) fn comp_index(&self, name: &str) -> Option<usize> {
        self.comps.iter().position(|def| def.name == name)
    }

    pub(crate) fn lookup_block(&self, name: &str) -> Option<BlockId> {
        find::<BlockRec>(&self.meta, &self.block_root, name).map(|r| BlockId(r.0))
    }

    pub(crate) fn lookup_signal(&self, name: &str) -> Option<SignalId> {
        find::<SignalRec>(&self.meta, &self.signal_root, name).map(|r| SignalId(r.0))
    }

    pub(crate) fn lookup_thread(&self, name: &str) -> Option<ThreadId> {
        find::<ThreadRec>(&self.meta, &self.thread_root, name).map(|r| ThreadId(r.0))
    }

    pub(crate) fn lookup_pin(&self, blk: BlockId, name: &str) -> Option<PinId> {
        let root = BlockRec(blk.0).pin_root(&self.meta);
        find::<PinRec>(&self.meta, root, name).map(|r| PinId(r.0))
    }

    pub(crate) fn lookup_function(&self, blk: BlockId, name: &str) -> Option<FunctionId> {
        let root = BlockRec(blk.0).function_root(&self.meta);
        find::<FunctionRec>(&self.meta, root, name).map(|r| FunctionId(r.0))
    }

    /// Block, signal and thread names share one namespace.
    fn name_is_free(&self, name: &str) -> bool {
        self.lookup_block(name).is_none()
            && self.lookup_signal(name).is_none()
            && self.lookup_thread(name).is_none()
    }

    pub fn block_find(&self, name: &str) -> Result<BlockId> {
        self.lookup_block(name).ok_or_else(|| raise(BlocsError::NotFound))
    }

    pub fn signal_find(&self, name: &str) -> Result<SignalId> {
        self.lookup_signal(name).ok_or_else(|| raise(BlocsError::NotFound))
    }

    pub fn thread_find(&self, name: &str) -> Result<ThreadId> {
        self.lookup_thread(name).ok_or_else(|| raise(BlocsError::NotFound))
    }

    pub fn pin_find(&self, blk: BlockId, name: &str) -> Result<PinId> {
        self.lookup_pin(blk, name).ok_or_else(|| raise(BlocsError::NotFound))
    }

    pub fn function_find(&self, blk: BlockId, name: &str) -> Result<FunctionId> {
        self.lookup_function(blk, name)
            .ok_or_else(|| raise(BlocsError::NotFound))
    }

    //----------------------------------------------------------------------------------------------
    // Block creation
    //----------------------------------------------------------------------------------------------

    /// Instantiate a component as a new block. The component is looked
    /// up by name in the component table.
    pub fn block_new(
        &self,
        name: &str,
        comp: &str,
        personality: Option<&str>,
    ) -> Result<BlockId> {
        let ci = match self.comp_index(comp) {
            Some(ci) => ci,
            None => fail!(NotFound),
        };
        self.instantiate(ci, name, personality)
    }

    pub(crate) fn instantiate(
        &self,
        comp_index: usize,
        name: &str,
        personality: Option<&str>,
    ) -> Result<BlockId> {
        let def = self.comps[comp_index];
        match def.setup {
            Some(setup) => setup(
                self,
                &SetupArgs {
                    name,
                    comp_index,
                    def,
                    personality,
                },
            ),
            None => {
                // without a setup function there is nobody to consume
                // a personality
                if personality.is_some() {
                    fail!(NoPersonality);
                }
                self.default_setup(name, comp_index)
            }
        }
    }

    fn default_setup(&self, name: &str, comp_index: usize) -> Result<BlockId> {
        let def = self.comps[comp_index];
        let blk = self.block_create(name, comp_index, None)?;
        self.block_add_pins(blk, def)?;
        self.block_add_functions(blk, def)?;
        Ok(blk)
    }

    /// Create a block record and reserve its realtime data.
    /// `data_size` overrides the definition's size; custom setups use
    /// it to scale the block to their personality.
    pub fn block_create(
        &self,
        name: &str,
        comp_index: usize,
        data_size: Option<usize>,
    ) -> Result<BlockId> {
        if comp_index >= self.comps.len() {
            fail!(Range);
        }
        let def = self.comps[comp_index];
        let size = data_size.unwrap_or(def.data_size);
        if size >= config::BLOCK_DATA_MAX_SIZE {
            fail!(TooBig);
        }
        if !self.name_is_free(name) {
            fail!(NameExists);
        }
        let rec: BlockRec = alloc_node(&self.meta, BlockRec::WORDS, name)?;
        let data = self.rt.alloc(size)?;
        rec.set_data(&self.meta, data, size);
        rec.set_comp_index(&self.meta, comp_index);
        rec.pin_root(&self.meta).set(META_NONE);
        rec.function_root(&self.meta).set(META_NONE);
        insert_sorted(&self.meta, &self.block_root, rec)?;
        Ok(BlockId(rec.0))
    }

    /// Realtime data view of a block, for custom setups initialising
    /// state words.
    pub fn block_data(&self, blk: BlockId) -> BlockData {
        let rec = BlockRec(blk.0);
        BlockData::new(self.rt.cells(), rec.data_index(&self.meta).as_usize())
    }

    /// Add a pin to a block: metadata record plus a dummy value cell,
    /// with the pin's pointer cell bound to the dummy.
    pub fn block_add_pin(&self, blk: BlockId, def: &PinDef) -> Result<()> {
        let rec = BlockRec(blk.0);
        let off = def.data_offset;
        if off % 4 != 0 || off + 4 > rec.data_size(&self.meta) {
            fail!(Range);
        }
        if self.lookup_pin(blk, def.name).is_some() {
            fail!(NameExists);
        }
        let pin: PinRec = alloc_node(&self.meta, PinRec::WORDS, def.name)?;
        let dummy = self.rt.alloc(4)?;
        let ptr = PoolIndex::new(rec.data_index(&self.meta).raw() + (off / 4) as u32);
        self.rt.set(ptr, dummy.raw());
        pin.init(&self.meta, ptr, dummy, def.data_type, def.dir);
        insert_sorted(&self.meta, rec.pin_root(&self.meta), pin)?;
        Ok(())
    }

    /// Add every pin the component definition declares.
    pub fn block_add_pins(&self, blk: BlockId, def: &ComponentDef) -> Result<()> {
        for pin in def.pins {
            self.block_add_pin(blk, pin)?;
        }
        Ok(())
    }

    /// Add a function to a block: metadata record plus the runtime
    /// record the scheduler will walk. The definition must come from
    /// the block's component definition.
    pub fn block_add_function(&self, blk: BlockId, def: &FunctionDef) -> Result<()> {
        let rec = BlockRec(blk.0);
        let ci = rec.comp_index(&self.meta);
        let ord = match self.comps[ci].functions.iter().position(|f| f.name == def.name) {
            Some(ord) => ord,
            None => fail!(NotFound),
        };
        if self.lookup_function(blk, def.name).is_some() {
            fail!(NameExists);
        }
        let funct: FunctionRec = alloc_node(&self.meta, FunctionRec::WORDS, def.name)?;
        let rtdata = self.rt.alloc(12)?;
        self.rt.set_at(rtdata.raw(), 0, pack_fnref(ci, ord));
        self.rt
            .set_at(rtdata.raw(), 1, rec.data_index(&self.meta).raw());
        self.rt.set_at(rtdata.raw(), 2, RT_NONE);
        funct.init(&self.meta, rtdata, def.floating);
        insert_sorted(&self.meta, rec.function_root(&self.meta), funct)?;
        Ok(())
    }

    /// Add every function the component definition declares.
    pub fn block_add_functions(&self, blk: BlockId, def: &ComponentDef) -> Result<()> {
        for funct in def.functions {
            self.block_add_function(blk, funct)?;
        }
        Ok(())
    }

    //----------------------------------------------------------------------------------------------
    // Signal and thread creation
    //----------------------------------------------------------------------------------------------

    /// Create a signal with a zero-initialised value cell.
    pub fn signal_new(&self, name: &str, ty: Type) -> Result<SignalId> {
        if ty == Type::Raw {
            fail!(RawSignal);
        }
        if !self.name_is_free(name) {
            fail!(NameExists);
        }
        let rec: SignalRec = alloc_node(&self.meta, SignalRec::WORDS, name)?;
        let data = self.rt.alloc(4)?;
        rec.init(&self.meta, data, ty);
        insert_sorted(&self.meta, &self.signal_root, rec)?;
        Ok(SignalId(rec.0))
    }

    /// Create a thread with an empty function list.
    pub fn thread_new(&self, name: &str, period_ns: u32, fp: Floating) -> Result<ThreadId> {
        if !self.name_is_free(name) {
            fail!(NameExists);
        }
        let rec: ThreadRec = alloc_node(&self.meta, ThreadRec::WORDS, name)?;
        let data = self.rt.alloc(8)?;
        self.rt.set_at(data.raw(), 0, period_ns);
        self.rt.set_at(data.raw(), 1, RT_NONE);
        rec.init(&self.meta, data, fp);
        insert_sorted(&self.meta, &self.thread_root, rec)?;
        Ok(ThreadId(rec.0))
    }

    //----------------------------------------------------------------------------------------------
    // Linker
    //----------------------------------------------------------------------------------------------

    /// Bind a pin's pointer cell to a signal's value cell.
    pub fn link_pin(&self, pin: PinId, sig: SignalId) -> Result<()> {
        let p = PinRec(pin.0);
        let s = SignalRec(sig.0);
        let pin_ty = p.data_type(&self.meta);
        if pin_ty != s.data_type(&self.meta) && pin_ty != Type::Raw {
            fail!(TypeMismatch);
        }
        let ptr = p.ptr_index(&self.meta);
        #[cfg(not(feature = "implicit-unlink"))]
        {
            if self.rt.get(ptr) != p.dummy_index(&self.meta).raw() {
                fail!(AlreadyLinked);
            }
        }
        // rebinding the pointer cell undoes any previous linkage
        self.rt.set(ptr, s.data_index(&self.meta).raw());
        Ok(())
    }

    /// Rebind a pin to its dummy cell, preserving the last observed
    /// value so the block restarts deterministically.
    #[cfg(feature = "unlink")]
    pub fn unlink_pin(&self, pin: PinId) -> Result<()> {
        let p = PinRec(pin.0);
        let ptr = p.ptr_index(&self.meta);
        let dummy = p.dummy_index(&self.meta);
        let bound = self.rt.get(ptr);
        self.rt.set(dummy, self.rt.cell(bound).get());
        self.rt.set(ptr, dummy.raw());
        Ok(())
    }

    /// Append a function's runtime record to a thread's execution
    /// list.
    pub fn link_function(&self, funct: FunctionId, thread: ThreadId) -> Result<()> {
        let f = FunctionRec(funct.0);
        let t = ThreadRec(thread.0);
        if t.floating(&self.meta) == Floating::NoFp && f.floating(&self.meta) == Floating::HasFp
        {
            fail!(TypeMismatch);
        }
        if f.thread(&self.meta) != META_NONE {
            #[cfg(feature = "implicit-unlink")]
            self.unlink_function(funct)?;
            #[cfg(not(feature = "implicit-unlink"))]
            fail!(AlreadyLinked);
        }
        f.set_thread(&self.meta, thread.0);
        let f_rt = f.rtdata_index(&self.meta).raw();
        self.rt.set_at(f_rt, 2, RT_NONE);
        // walk to the list tail and append
        let mut slot = t.data_index(&self.meta).as_usize() + 1;
        loop {
            let cur = self.rt.cells()[slot].get();
            if cur == RT_NONE {
                self.rt.cells()[slot].set(f_rt);
                return Ok(());
            }
            slot = cur as usize + 2;
        }
    }

    /// Remove a function from its thread. Unlinking a function that is
    /// not in a thread is a no-op.
    #[cfg(feature = "unlink")]
    pub fn unlink_function(&self, funct: FunctionId) -> Result<()> {
        let f = FunctionRec(funct.0);
        let owner = f.thread(&self.meta);
        if owner == META_NONE {
            return Ok(());
        }
        let t = ThreadRec(owner);
        let f_rt = f.rtdata_index(&self.meta).raw();
        let mut slot = t.data_index(&self.meta).as_usize() + 1;
        loop {
            let cur = self.rt.cells()[slot].get();
            if cur == RT_NONE {
                // the back-reference said we were in this thread
                fail!(Internal);
            }
            if cur == f_rt {
                self.rt.cells()[slot].set(self.rt.get_at(f_rt, 2));
                f.set_thread(&self.meta, META_NONE);
                return Ok(());
            }
            slot = cur as usize + 2;
        }
    }

    //----------------------------------------------------------------------------------------------
    // Value access
    //----------------------------------------------------------------------------------------------

    /// Write a value into a signal's cell.
    pub fn signal_set(&self, sig: SignalId, value: Value) -> Result<()> {
        let s = SignalRec(sig.0);
        if value.ty() != s.data_type(&self.meta) {
            fail!(TypeMismatch);
        }
        self.rt.set(s.data_index(&self.meta), value.to_bits());
        Ok(())
    }

    /// Read a signal's cell.
    pub fn signal_get(&self, sig: SignalId) -> Result<Value> {
        let s = SignalRec(sig.0);
        let bits = self.rt.get(s.data_index(&self.meta));
        match Value::from_bits(s.data_type(&self.meta), bits) {
            Some(v) => Ok(v),
            None => fail!(Internal),
        }
    }

    /// Write a value through a pin into whatever cell it is currently
    /// bound to (a signal's, or the pin's own dummy). Raw pins accept
    /// any value and store its bare bits.
    pub fn pin_set(&self, pin: PinId, value: Value) -> Result<()> {
        let p = PinRec(pin.0);
        let ty = p.data_type(&self.meta);
        if ty != Type::Raw && value.ty() != ty {
            fail!(TypeMismatch);
        }
        let bound = self.rt.get(p.ptr_index(&self.meta));
        self.rt.cell(bound).set(value.to_bits());
        Ok(())
    }

    /// Read the cell a pin is currently bound to, under the pin's own
    /// type. Raw pins have no value representation.
    pub fn pin_get(&self, pin: PinId) -> Result<Value> {
        let p = PinRec(pin.0);
        let bound = self.rt.get(p.ptr_index(&self.meta));
        match Value::from_bits(p.data_type(&self.meta), self.rt.cell(bound).get()) {
            Some(v) => Ok(v),
            None => fail!(TypeMismatch),
        }
    }

    pub(crate) fn pin_type(&self, pin: PinId) -> Type {
        PinRec(pin.0).data_type(&self.meta)
    }

    pub(crate) fn signal_type(&self, sig: SignalId) -> Type {
        SignalRec(sig.0).data_type(&self.meta)
    }

    //----------------------------------------------------------------------------------------------
    // Scheduler
    //----------------------------------------------------------------------------------------------

    /// Obtain the realtime handle used to run a thread.
    pub fn thread_handle(&self, thread: ThreadId) -> ThreadHandle {
        ThreadHandle(ThreadRec(thread.0).data_index(&self.meta).raw())
    }

    /// The thread's nominal period in nanoseconds.
    pub fn thread_period_ns(&self, handle: ThreadHandle) -> u32 {
        self.rt.get_at(handle.0, 0)
    }

    /// Run every function of the thread once, in the order they were
    /// linked. Each function receives `period_override` if given, the
    /// thread's nominal period otherwise. The caller provides the
    /// cadence and must not run one thread from two contexts at once.
    pub fn run_thread(&self, handle: ThreadHandle, period_override: Option<u32>) {
        let cells = self.rt.cells();
        let period = period_override.unwrap_or_else(|| self.thread_period_ns(handle));
        let mut cur = self.rt.get_at(handle.0, 1);
        while cur != RT_NONE {
            let fnref = cells[cur as usize].get();
            let base = cells[cur as usize + 1].get();
            let next = cells[cur as usize + 2].get();
            let (ci, ord) = unpack_fnref(fnref);
            let run = self.comps[ci].functions[ord].run;
            run(BlockData::new(cells, base as usize), period);
            cur = next;
        }
    }

    //----------------------------------------------------------------------------------------------
    // Name display
    //----------------------------------------------------------------------------------------------

    pub(crate) fn node_name<N: Node>(&self, node: N) -> NameDisplay {
        NameDisplay {
            meta: &self.meta,
            name: node.name_ref(&self.meta),
        }
    }

    pub(crate) fn block_name(&self, blk: BlockId) -> NameDisplay {
        self.node_name(BlockRec(blk.0))
    }

    pub(crate) fn pin_name(&self, pin: PinId) -> NameDisplay {
        self.node_name(PinRec(pin.0))
    }

    pub(crate) fn function_name(&self, funct: FunctionId) -> NameDisplay {
        self.node_name(FunctionRec(funct.0))
    }

    pub(crate) fn signal_name(&self, sig: SignalId) -> NameDisplay {
        self.node_name(SignalRec(sig.0))
    }

    pub(crate) fn thread_name(&self, thread: ThreadId) -> NameDisplay {
        self.node_name(ThreadRec(thread.0))
    }
}

//--------------------------------------------------------------------------------------------------
// Testing
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{components, record::iter, value::Dir};

    fn kernel() -> Kernel<'static> {
        Kernel::new(&components::LIBRARY)
    }

    #[test]
    fn fresh_pins_point_at_zeroed_dummies() {
        let k = kernel();
        let blk = k.block_new("n1", "not", None).unwrap();
        let rec = BlockRec(blk.0);
        for pin in iter::<PinRec>(&k.meta, rec.pin_root(&k.meta)) {
            let ptr = pin.ptr_index(&k.meta);
            let dummy = pin.dummy_index(&k.meta);
            assert_eq!(k.rt.get(ptr), dummy.raw());
            assert_eq!(k.rt.get(dummy), 0);
        }
        assert_eq!(iter::<PinRec>(&k.meta, rec.pin_root(&k.meta)).count(), 2);
    }

    #[test]
    fn link_binds_pointer_cell_to_signal() {
        let k = kernel();
        let blk = k.block_new("n1", "not", None).unwrap();
        let sig = k.signal_new("s", Type::Bit).unwrap();
        let pin = k.pin_find(blk, "in").unwrap();
        k.link_pin(pin, sig).unwrap();
        let p = PinRec(pin.0);
        let s = SignalRec(sig.0);
        assert_eq!(k.rt.get(p.ptr_index(&k.meta)), s.data_index(&k.meta).raw());
    }

    #[test]
    fn type_mismatch_refused() {
        let k = kernel();
        let blk = k.block_new("n1", "not", None).unwrap();
        let sig = k.signal_new("s", Type::U32).unwrap();
        let pin = k.pin_find(blk, "in").unwrap();
        assert_eq!(k.link_pin(pin, sig), Err(BlocsError::TypeMismatch));
    }

    #[test]
    fn raw_signal_refused() {
        let k = kernel();
        assert_eq!(k.signal_new("s", Type::Raw), Err(BlocsError::RawSignal));
    }

    #[cfg(not(feature = "implicit-unlink"))]
    #[test]
    fn double_link_refused() {
        let k = kernel();
        let blk = k.block_new("n1", "not", None).unwrap();
        let a = k.signal_new("a", Type::Bit).unwrap();
        let b = k.signal_new("b", Type::Bit).unwrap();
        let pin = k.pin_find(blk, "in").unwrap();
        k.link_pin(pin, a).unwrap();
        assert_eq!(k.link_pin(pin, b), Err(BlocsError::AlreadyLinked));
    }

    #[test]
    fn inverter_network() {
        let k = kernel();
        let blk = k.block_new("n1", "not", None).unwrap();
        let s_in = k.signal_new("s_in", Type::Bit).unwrap();
        let s_out = k.signal_new("s_out", Type::Bit).unwrap();
        k.link_pin(k.pin_find(blk, "in").unwrap(), s_in).unwrap();
        k.link_pin(k.pin_find(blk, "out").unwrap(), s_out).unwrap();
        let t = k.thread_new("t", 1_000_000, Floating::HasFp).unwrap();
        k.link_function(k.function_find(blk, "update").unwrap(), t)
            .unwrap();
        let h = k.thread_handle(t);

        k.signal_set(s_in, Value::Bit(true)).unwrap();
        k.run_thread(h, None);
        assert_eq!(k.signal_get(s_out).unwrap(), Value::Bit(false));

        k.signal_set(s_in, Value::Bit(false)).unwrap();
        k.run_thread(h, None);
        assert_eq!(k.signal_get(s_out).unwrap(), Value::Bit(true));
    }

    #[test]
    fn sum_of_two() {
        let k = kernel();
        let blk = k.block_new("s", "sum2", None).unwrap();
        for (sig, pin) in [("a", "in0"), ("b", "in1"), ("c", "out")] {
            let s = k.signal_new(sig, Type::Float).unwrap();
            k.link_pin(k.pin_find(blk, pin).unwrap(), s).unwrap();
        }
        for (pin, v) in [("gain0", 1.0), ("gain1", 1.0), ("offset", 0.0)] {
            k.pin_set(k.pin_find(blk, pin).unwrap(), Value::Float(v))
                .unwrap();
        }
        k.signal_set(k.signal_find("a").unwrap(), Value::Float(1.5))
            .unwrap();
        k.signal_set(k.signal_find("b").unwrap(), Value::Float(2.25))
            .unwrap();
        let t = k.thread_new("t", 1_000_000, Floating::HasFp).unwrap();
        k.link_function(k.function_find(blk, "update").unwrap(), t)
            .unwrap();
        k.run_thread(k.thread_handle(t), None);
        assert_eq!(
            k.signal_get(k.signal_find("c").unwrap()).unwrap(),
            Value::Float(3.75)
        );
    }

    #[cfg(feature = "unlink")]
    #[test]
    fn unlink_preserves_last_value() {
        let k = kernel();
        let blk = k.block_new("s", "sum2", None).unwrap();
        let sig = k.signal_new("sig", Type::Float).unwrap();
        k.signal_set(sig, Value::Float(42.0)).unwrap();
        let pin = k.pin_find(blk, "in0").unwrap();
        k.link_pin(pin, sig).unwrap();
        assert_eq!(k.pin_get(pin).unwrap(), Value::Float(42.0));

        k.unlink_pin(pin).unwrap();
        k.signal_set(sig, Value::Float(0.0)).unwrap();
        // the dummy holds the value observed at unlink time
        assert_eq!(k.pin_get(pin).unwrap(), Value::Float(42.0));
        let p = PinRec(pin.0);
        assert_eq!(k.rt.get(p.ptr_index(&k.meta)), p.dummy_index(&k.meta).raw());
    }

    #[cfg(feature = "unlink")]
    #[test]
    fn relink_after_unlink_behaves_like_first_link() {
        let k = kernel();
        let blk = k.block_new("s", "sum2", None).unwrap();
        let sig = k.signal_new("sig", Type::Float).unwrap();
        let pin = k.pin_find(blk, "in0").unwrap();
        k.link_pin(pin, sig).unwrap();
        k.signal_set(sig, Value::Float(7.5)).unwrap();
        k.unlink_pin(pin).unwrap();
        k.link_pin(pin, sig).unwrap();
        let p = PinRec(pin.0);
        let s = SignalRec(sig.0);
        assert_eq!(k.rt.get(p.ptr_index(&k.meta)), s.data_index(&k.meta).raw());
        assert_eq!(k.pin_get(pin).unwrap(), Value::Float(7.5));
        // the dummy kept the value captured at unlink time
        assert_eq!(k.rt.get(p.dummy_index(&k.meta)), 7.5f32.to_bits());
    }

    #[test]
    fn name_collision_leaves_arena_accounting_intact() {
        let k = kernel();
        k.block_new("dup", "not", None).unwrap();
        let meta_free = k.meta.free_bytes();
        let rt_free = k.rt.free_bytes();
        assert_eq!(k.block_new("dup", "not", None), Err(BlocsError::NameExists));
        assert_eq!(k.meta.free_bytes(), meta_free);
        assert_eq!(k.rt.free_bytes(), rt_free);
    }

    #[test]
    fn names_are_global_across_kinds() {
        let k = kernel();
        k.signal_new("x", Type::Bit).unwrap();
        assert_eq!(k.block_new("x", "not", None), Err(BlocsError::NameExists));
        assert_eq!(
            k.thread_new("x", 1000, Floating::NoFp),
            Err(BlocsError::NameExists)
        );
    }

    #[test]
    fn fp_containment() {
        let k = kernel();
        let blk = k.block_new("s", "sum2", None).unwrap();
        let t = k.thread_new("t", 1_000_000, Floating::NoFp).unwrap();
        let f = k.function_find(blk, "update").unwrap();
        assert_eq!(k.link_function(f, t), Err(BlocsError::TypeMismatch));
        // the thread's list must remain empty
        let h = k.thread_handle(t);
        assert_eq!(k.rt.get_at(h.0, 1), RT_NONE);
        // and a nofp function is welcome in either kind of thread
        let n = k.block_new("n", "not", None).unwrap();
        k.link_function(k.function_find(n, "update").unwrap(), t)
            .unwrap();
    }

    #[test]
    fn function_membership_is_single_valued() {
        let k = kernel();
        let blk = k.block_new("n", "not", None).unwrap();
        let t1 = k.thread_new("t1", 1000, Floating::NoFp).unwrap();
        let t2 = k.thread_new("t2", 1000, Floating::NoFp).unwrap();
        let f = k.function_find(blk, "update").unwrap();
        k.link_function(f, t1).unwrap();
        #[cfg(feature = "implicit-unlink")]
        {
            k.link_function(f, t2).unwrap();
            // membership moved: t1 empty, t2 holds the record
            assert_eq!(k.rt.get_at(k.thread_handle(t1).0, 1), RT_NONE);
            let frec = FunctionRec(f.0);
            assert_eq!(frec.thread(&k.meta), t2.0);
        }
        #[cfg(not(feature = "implicit-unlink"))]
        {
            assert_eq!(k.link_function(f, t2), Err(BlocsError::AlreadyLinked));
            let frec = FunctionRec(f.0);
            assert_eq!(frec.thread(&k.meta), t1.0);
        }
    }

    #[cfg(feature = "unlink")]
    #[test]
    fn unlink_function_splices_the_list() {
        let k = kernel();
        let a = k.block_new("a", "not", None).unwrap();
        let b = k.block_new("b", "not", None).unwrap();
        let c = k.block_new("c", "not", None).unwrap();
        let t = k.thread_new("t", 1000, Floating::NoFp).unwrap();
        let fa = k.function_find(a, "update").unwrap();
        let fb = k.function_find(b, "update").unwrap();
        let fc = k.function_find(c, "update").unwrap();
        k.link_function(fa, t).unwrap();
        k.link_function(fb, t).unwrap();
        k.link_function(fc, t).unwrap();

        k.unlink_function(fb).unwrap();
        // the thread now runs a then c
        let h = k.thread_handle(t);
        let first = k.rt.get_at(h.0, 1);
        assert_eq!(first, FunctionRec(fa.0).rtdata_index(&k.meta).raw());
        let second = k.rt.get_at(first, 2);
        assert_eq!(second, FunctionRec(fc.0).rtdata_index(&k.meta).raw());
        assert_eq!(k.rt.get_at(second, 2), RT_NONE);
        // unlinking twice is a no-op
        k.unlink_function(fb).unwrap();
    }

    #[test]
    fn empty_thread_run_is_a_no_op() {
        let k = kernel();
        let sig = k.signal_new("s", Type::U32).unwrap();
        k.signal_set(sig, Value::U32(99)).unwrap();
        let t = k.thread_new("t", 1000, Floating::NoFp).unwrap();
        k.run_thread(k.thread_handle(t), None);
        assert_eq!(k.signal_get(sig).unwrap(), Value::U32(99));
    }

    #[test]
    fn set_through_linked_pin_reaches_signal() {
        let k = kernel();
        let blk = k.block_new("n", "not", None).unwrap();
        let sig = k.signal_new("s", Type::Bit).unwrap();
        let pin = k.pin_find(blk, "in").unwrap();
        k.link_pin(pin, sig).unwrap();
        k.pin_set(pin, Value::Bit(true)).unwrap();
        assert_eq!(k.signal_get(sig).unwrap(), Value::Bit(true));
    }

    #[test]
    fn execution_order_is_link_order() {
        // two inverters chained through a middle signal: if ordering
        // holds, one run propagates the input all the way through
        let k = kernel();
        let first = k.block_new("first", "not", None).unwrap();
        let second = k.block_new("second", "not", None).unwrap();
        let s_in = k.signal_new("s_in", Type::Bit).unwrap();
        let s_mid = k.signal_new("s_mid", Type::Bit).unwrap();
        let s_out = k.signal_new("s_out", Type::Bit).unwrap();
        k.link_pin(k.pin_find(first, "in").unwrap(), s_in).unwrap();
        k.link_pin(k.pin_find(first, "out").unwrap(), s_mid).unwrap();
        k.link_pin(k.pin_find(second, "in").unwrap(), s_mid).unwrap();
        k.link_pin(k.pin_find(second, "out").unwrap(), s_out)
            .unwrap();
        let t = k.thread_new("t", 1000, Floating::NoFp).unwrap();
        k.link_function(k.function_find(first, "update").unwrap(), t)
            .unwrap();
        k.link_function(k.function_find(second, "update").unwrap(), t)
            .unwrap();
        k.signal_set(s_in, Value::Bit(true)).unwrap();
        k.run_thread(k.thread_handle(t), None);
        assert_eq!(k.signal_get(s_out).unwrap(), Value::Bit(true));
    }

    #[test]
    fn raw_pin_links_to_any_type() {
        let k = kernel();
        let blk = k.block_new("probe", "tap", None).unwrap();
        let sig = k.signal_new("s", Type::Float).unwrap();
        let pin = k.pin_find(blk, "in").unwrap();
        assert_eq!(k.pin_type(pin), Type::Raw);
        k.link_pin(pin, sig).unwrap();
        k.signal_set(sig, Value::Float(1.0)).unwrap();
        // the raw pin sees the bare bits of the float cell
        let p = PinRec(pin.0);
        let bound = k.rt.get(p.ptr_index(&k.meta));
        assert_eq!(k.rt.cell(bound).get(), 1.0f32.to_bits());
    }

    #[test]
    fn block_names_sorted() {
        let k = kernel();
        for n in ["zulu", "alpha", "mike"] {
            k.block_new(n, "not", None).unwrap();
        }
        let names: Vec<String> = iter::<BlockRec>(&k.meta, &k.block_root)
            .map(|r| std::format!("{}", k.node_name(r)))
            .collect();
        assert_eq!(names, ["alpha", "mike", "zulu"]);
    }

    #[test]
    fn personality_refused_without_setup() {
        let k = kernel();
        assert_eq!(
            k.block_new("n", "not", Some("3")),
            Err(BlocsError::NoPersonality)
        );
    }

    #[test]
    fn unknown_component_not_found() {
        let k = kernel();
        assert_eq!(k.block_new("n", "bogus", None), Err(BlocsError::NotFound));
    }

    #[test]
    fn period_override() {
        // sum2's update ignores the period; use the tap block which
        // latches it
        let k = kernel();
        let blk = k.block_new("probe", "tap", None).unwrap();
        let t = k.thread_new("t", 5000, Floating::NoFp).unwrap();
        k.link_function(k.function_find(blk, "sample").unwrap(), t)
            .unwrap();
        let h = k.thread_handle(t);
        k.run_thread(h, None);
        assert_eq!(k.block_data(blk).word(tap_period_offset()), 5000);
        k.run_thread(h, Some(250));
        assert_eq!(k.block_data(blk).word(tap_period_offset()), 250);
    }

    fn tap_period_offset() -> usize {
        components::tap::PERIOD
    }

    #[test]
    fn block_data_too_big_refused() {
        let k = kernel();
        assert_eq!(
            k.block_create("big", 0, Some(config::BLOCK_DATA_MAX_SIZE)),
            Err(BlocsError::TooBig)
        );
    }

    #[test]
    fn pin_offset_out_of_range_refused() {
        let k = kernel();
        let blk = k.block_create("b", 0, None).unwrap();
        let def = PinDef {
            name: "beyond",
            data_type: Type::Bit,
            dir: Dir::In,
            data_offset: 64,
        };
        assert_eq!(k.block_add_pin(blk, &def), Err(BlocsError::Range));
    }
}
