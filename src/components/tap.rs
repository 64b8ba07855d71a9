/*
 * SPDX-License-Identifier: BlueOak-1.0.0
 */

//! Observation tap.
//!
//! A raw input pin that can be linked to a signal of any type; each
//! call latches the calling period and the bare bits seen through the
//! pin into block state words, where a supervisor can pick them up
//! without touching the wired network.

use crate::{
    comp::{BlockData, ComponentDef, FunctionDef, Personality, PinDef},
    value::{Dir, Floating, Type},
};

pub const IN: usize = 0;
/// Period of the most recent call, in nanoseconds.
pub const PERIOD: usize = 4;
/// Bits observed through the pin at the most recent call.
pub const VALUE: usize = 8;

static PINS: [PinDef<'static>; 1] = [PinDef {
    name: "in",
    data_type: Type::Raw,
    dir: Dir::In,
    data_offset: IN,
}];

static FUNCTIONS: [FunctionDef; 1] = [FunctionDef {
    name: "sample",
    floating: Floating::NoFp,
    run: sample,
}];

pub static DEF: ComponentDef = ComponentDef {
    name: "tap",
    data_size: 12,
    personality: Personality::No,
    pins: &PINS,
    functions: &FUNCTIONS,
    setup: None,
};

fn sample(d: BlockData, period_ns: u32) {
    d.set_word(PERIOD, period_ns);
    d.set_word(VALUE, d.raw(IN));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{components, Floating, Kernel, Value};

    #[test]
    fn latches_period_and_bits() {
        let k = Kernel::new(&components::LIBRARY);
        let blk = k.block_new("probe", "tap", None).unwrap();
        let sig = k.signal_new("speed", Type::Float).unwrap();
        k.link_pin(k.pin_find(blk, "in").unwrap(), sig).unwrap();
        k.signal_set(sig, Value::Float(2.5)).unwrap();
        let t = k.thread_new("t", 1_000, Floating::NoFp).unwrap();
        k.link_function(k.function_find(blk, "sample").unwrap(), t)
            .unwrap();
        k.run_thread(k.thread_handle(t), None);
        let d = k.block_data(blk);
        assert_eq!(d.word(PERIOD), 1_000);
        assert_eq!(d.word(VALUE), 2.5f32.to_bits());
    }
}
