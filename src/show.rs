/*
 * SPDX-License-Identifier: BlueOak-1.0.0
 */

//! Introspection: pretty-print the object graph and the realtime
//! values behind it. These walk the metadata but never mutate it.
//!
//! A pin's bound signal is recovered by comparing the pointer cell
//! against each signal's value cell; a signal's fanout is a full scan
//! over every block's pins. Diagnostic-time cost, kept out of the
//! tick path on purpose.

use crate::{
    console::cwrite,
    kernel::{BlockId, Kernel, SignalId, ThreadId},
    record::{iter, BlockRec, FunctionRec, PinRec, SignalRec, ThreadRec, META_NONE, RT_NONE},
    value::{Type, Value},
};

/// Pin-side direction arrows, indexed by the raw direction tag.
const DIRS_PS: [&str; 4] = ["xxx", "<==", "==>", "<=>"];
/// Signal-side direction arrows.
const DIRS_SP: [&str; 4] = ["xxx", "==>", "<==", "<=>"];

impl Kernel<'_> {
    /// Remaining capacity of both pools.
    pub fn show_memory_status(&self) {
        cwrite!(
            self.sink(),
            "RT pool:   {}/{}, {} free\n",
            self.rt.used_bytes(),
            self.rt.capacity_bytes(),
            self.rt.free_bytes()
        );
        cwrite!(
            self.sink(),
            "Meta pool: {}/{}, {} free\n",
            self.meta.used_bytes(),
            self.meta.capacity_bytes(),
            self.meta.free_bytes()
        );
    }

    /// One block with its pins and functions.
    pub fn show_block(&self, blk: BlockId) {
        let rec = BlockRec(blk.0);
        let def = self.component(rec.comp_index(&self.meta));
        cwrite!(
            self.sink(),
            "instance '{}' of component '{}'",
            self.node_name(rec),
            def.name
        );
        #[cfg(feature = "verbose-show")]
        cwrite!(
            self.sink(),
            " @ meta[{}], {} RT bytes @ [{}]",
            rec.0,
            rec.data_size(&self.meta),
            rec.data_index(&self.meta).raw()
        );
        cwrite!(self.sink(), "\n");
        let mut pins = 0;
        for pin in iter::<PinRec>(&self.meta, rec.pin_root(&self.meta)) {
            self.show_pin(pin);
            pins += 1;
        }
        cwrite!(self.sink(), "    {} pins\n", pins);
        let mut functs = 0;
        for funct in iter::<FunctionRec>(&self.meta, rec.function_root(&self.meta)) {
            self.show_function(funct);
            functs += 1;
        }
        cwrite!(self.sink(), "    {} functions\n", functs);
    }

    pub fn show_all_blocks(&self) {
        cwrite!(self.sink(), "List of all instances:\n");
        let mut total = 0;
        for rec in iter::<BlockRec>(&self.meta, &self.block_root) {
            self.show_block(BlockId(rec.0));
            total += 1;
        }
        cwrite!(self.sink(), "Total of {} instances\n", total);
    }

    fn show_pin(&self, pin: PinRec) {
        let bound = self.rt.get(pin.ptr_index(&self.meta));
        let arrow = DIRS_PS[pin.dir_raw(&self.meta) as usize];
        cwrite!(self.sink(), "  {:<12} {} ", self.node_name(pin), arrow);
        if bound == pin.dummy_index(&self.meta).raw() {
            cwrite!(self.sink(), "{:<12}", "");
        } else {
            match self.signal_by_cell(bound) {
                Some(sig) => cwrite!(self.sink(), "{:<12}", self.node_name(sig)),
                None => cwrite!(self.sink(), "{:<12}", "?"),
            }
        }
        let ty = pin.data_type(&self.meta);
        cwrite!(self.sink(), " = {:<5} : ", ty.label());
        self.show_cell(bound, ty);
        #[cfg(feature = "verbose-show")]
        cwrite!(
            self.sink(),
            " @ meta[{}] ptr[{}] dummy[{}]",
            pin.0,
            pin.ptr_index(&self.meta).raw(),
            pin.dummy_index(&self.meta).raw()
        );
        cwrite!(self.sink(), "\n");
    }

    fn show_function(&self, funct: FunctionRec) {
        cwrite!(self.sink(), "  {:<12} ", self.node_name(funct));
        let owner = funct.thread(&self.meta);
        if owner == META_NONE {
            cwrite!(self.sink(), " (no thread)");
        } else {
            cwrite!(self.sink(), " {}", self.node_name(ThreadRec(owner)));
        }
        #[cfg(feature = "verbose-show")]
        cwrite!(
            self.sink(),
            " @ meta[{}] rtdata[{}]",
            funct.0,
            funct.rtdata_index(&self.meta).raw()
        );
        cwrite!(self.sink(), "\n");
    }

    /// One signal with its current value and fanout.
    pub fn show_signal(&self, sig: SignalId) {
        let rec = SignalRec(sig.0);
        let ty = rec.data_type(&self.meta);
        cwrite!(
            self.sink(),
            "  {:<12} = {:<5} : ",
            self.node_name(rec),
            ty.label()
        );
        self.show_cell(rec.data_index(&self.meta).raw(), ty);
        #[cfg(feature = "verbose-show")]
        cwrite!(
            self.sink(),
            " @ meta[{}] data[{}]",
            rec.0,
            rec.data_index(&self.meta).raw()
        );
        cwrite!(self.sink(), "\n");
        // fanout: every pin bound to this signal's cell
        let cell = rec.data_index(&self.meta).raw();
        for blk in iter::<BlockRec>(&self.meta, &self.block_root) {
            for pin in iter::<PinRec>(&self.meta, blk.pin_root(&self.meta)) {
                if self.rt.get(pin.ptr_index(&self.meta)) == cell {
                    cwrite!(
                        self.sink(),
                        "    {} {}.{}\n",
                        DIRS_SP[pin.dir_raw(&self.meta) as usize],
                        self.node_name(blk),
                        self.node_name(pin)
                    );
                }
            }
        }
    }

    pub fn show_all_signals(&self) {
        cwrite!(self.sink(), "List of all signals:\n");
        let mut total = 0;
        for rec in iter::<SignalRec>(&self.meta, &self.signal_root) {
            self.show_signal(SignalId(rec.0));
            total += 1;
        }
        cwrite!(self.sink(), "Total of {} signals\n", total);
    }

    /// One thread and its functions in execution order.
    pub fn show_thread(&self, thread: ThreadId) {
        let rec = ThreadRec(thread.0);
        let head = rec.data_index(&self.meta).raw();
        cwrite!(
            self.sink(),
            "thread '{}': {}, period {} ns\n",
            self.node_name(rec),
            rec.floating(&self.meta).label(),
            self.rt.get_at(head, 0)
        );
        let mut total = 0;
        let mut cur = self.rt.get_at(head, 1);
        while cur != RT_NONE {
            match self.function_owner(cur) {
                Some((blk, funct)) => cwrite!(
                    self.sink(),
                    "    {}.{}\n",
                    self.node_name(blk),
                    self.node_name(funct)
                ),
                None => cwrite!(self.sink(), "    ?\n"),
            }
            total += 1;
            cur = self.rt.get_at(cur, 2);
        }
        cwrite!(self.sink(), "    {} functions\n", total);
    }

    pub fn show_all_threads(&self) {
        cwrite!(self.sink(), "List of all threads:\n");
        let mut total = 0;
        for rec in iter::<ThreadRec>(&self.meta, &self.thread_root) {
            self.show_thread(ThreadId(rec.0));
            total += 1;
        }
        cwrite!(self.sink(), "Total of {} threads\n", total);
    }

    /// Memory status plus every instance, signal and thread.
    pub fn show_all(&self) {
        self.show_memory_status();
        self.show_all_blocks();
        self.show_all_signals();
        self.show_all_threads();
    }

    fn show_cell(&self, cell: u32, ty: Type) {
        let bits = self.rt.cell(cell).get();
        match Value::from_bits(ty, bits) {
            Some(v) => cwrite!(self.sink(), "{}", v),
            None => cwrite!(self.sink(), "{:#010x}", bits),
        }
    }

    fn signal_by_cell(&self, cell: u32) -> Option<SignalRec> {
        iter::<SignalRec>(&self.meta, &self.signal_root)
            .find(|s| s.data_index(&self.meta).raw() == cell)
    }

    fn function_owner(&self, rtdata: u32) -> Option<(BlockRec, FunctionRec)> {
        for blk in iter::<BlockRec>(&self.meta, &self.block_root) {
            for funct in iter::<FunctionRec>(&self.meta, blk.function_root(&self.meta)) {
                if funct.rtdata_index(&self.meta).raw() == rtdata {
                    return Some((blk, funct));
                }
            }
        }
        None
    }
}

//--------------------------------------------------------------------------------------------------
// Testing
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use crate::{components, console::BufferConsole, value::Floating, Kernel, Type, Value};

    fn wired_kernel(sink: &BufferConsole) -> Kernel<'_> {
        let k = Kernel::with_console(&components::LIBRARY, sink);
        let blk = k.block_new("n1", "not", None).unwrap();
        let sig = k.signal_new("flag", Type::Bit).unwrap();
        k.link_pin(k.pin_find(blk, "in").unwrap(), sig).unwrap();
        let t = k.thread_new("fast", 500_000, Floating::NoFp).unwrap();
        k.link_function(k.function_find(blk, "update").unwrap(), t)
            .unwrap();
        k.signal_set(sig, Value::Bit(true)).unwrap();
        k
    }

    #[test]
    fn block_dump_names_component_pins_and_thread() {
        let sink = BufferConsole::new();
        let k = wired_kernel(&sink);
        k.show_block(k.block_find("n1").unwrap());
        let out = sink.take();
        assert!(out.contains("instance 'n1' of component 'not'"));
        assert!(out.contains("in"));
        assert!(out.contains("flag"));
        assert!(out.contains("2 pins"));
        assert!(out.contains("update"));
        assert!(out.contains("fast"));
        assert!(out.contains("1 functions"));
    }

    #[test]
    fn unlinked_function_reported() {
        let sink = BufferConsole::new();
        let k = Kernel::with_console(&components::LIBRARY, &sink);
        let blk = k.block_new("n1", "not", None).unwrap();
        k.show_block(blk);
        assert!(sink.take().contains("(no thread)"));
    }

    #[test]
    fn signal_dump_shows_value_and_fanout() {
        let sink = BufferConsole::new();
        let k = wired_kernel(&sink);
        k.show_signal(k.signal_find("flag").unwrap());
        let out = sink.take();
        assert!(out.contains("flag"));
        assert!(out.contains("bit"));
        assert!(out.contains(": 1"));
        assert!(out.contains("n1.in"));
    }

    #[test]
    fn thread_dump_lists_functions_in_order() {
        let sink = BufferConsole::new();
        let k = wired_kernel(&sink);
        k.show_thread(k.thread_find("fast").unwrap());
        let out = sink.take();
        assert!(out.contains("thread 'fast': nofp, period 500000 ns"));
        assert!(out.contains("n1.update"));
        assert!(out.contains("1 functions"));
    }

    #[test]
    fn memory_status_reports_both_pools() {
        let sink = BufferConsole::new();
        let k = Kernel::with_console(&components::LIBRARY, &sink);
        k.show_memory_status();
        let out = sink.take();
        assert!(out.contains("RT pool:   0/2048, 2048 free"));
        assert!(out.contains("Meta pool: 0/4096, 4096 free"));
    }

    #[test]
    fn show_all_covers_everything() {
        let sink = BufferConsole::new();
        let k = wired_kernel(&sink);
        k.show_all();
        let out = sink.take();
        assert!(out.contains("RT pool:"));
        assert!(out.contains("Total of 1 instances"));
        assert!(out.contains("Total of 1 signals"));
        assert!(out.contains("Total of 1 threads"));
    }
}
