/*
 * SPDX-License-Identifier: BlueOak-1.0.0
 */

//! Two-way selector: `out = sel ? in1 : in0`.

use crate::{
    comp::{BlockData, ComponentDef, FunctionDef, Personality, PinDef},
    value::{Dir, Floating, Type},
};

pub const IN0: usize = 0;
pub const IN1: usize = 4;
pub const SEL: usize = 8;
pub const OUT: usize = 12;

static PINS: [PinDef<'static>; 4] = [
    PinDef {
        name: "in0",
        data_type: Type::Float,
        dir: Dir::In,
        data_offset: IN0,
    },
    PinDef {
        name: "in1",
        data_type: Type::Float,
        dir: Dir::In,
        data_offset: IN1,
    },
    PinDef {
        name: "sel",
        data_type: Type::Bit,
        dir: Dir::In,
        data_offset: SEL,
    },
    PinDef {
        name: "out",
        data_type: Type::Float,
        dir: Dir::Out,
        data_offset: OUT,
    },
];

static FUNCTIONS: [FunctionDef; 1] = [FunctionDef {
    name: "update",
    floating: Floating::HasFp,
    run: update,
}];

pub static DEF: ComponentDef = ComponentDef {
    name: "mux2",
    data_size: 16,
    personality: Personality::No,
    pins: &PINS,
    functions: &FUNCTIONS,
    setup: None,
};

fn update(d: BlockData, _period_ns: u32) {
    let v = if d.bit(SEL) {
        d.float(IN1)
    } else {
        d.float(IN0)
    };
    d.set_float(OUT, v);
}

#[cfg(test)]
mod tests {
    use crate::{components, Floating, Kernel, Type, Value};

    #[test]
    fn selects_between_inputs() {
        let k = Kernel::new(&components::LIBRARY);
        let blk = k.block_new("m", "mux2", None).unwrap();
        let a = k.signal_new("a", Type::Float).unwrap();
        let b = k.signal_new("b", Type::Float).unwrap();
        let sel = k.signal_new("s", Type::Bit).unwrap();
        let out = k.signal_new("o", Type::Float).unwrap();
        k.link_pin(k.pin_find(blk, "in0").unwrap(), a).unwrap();
        k.link_pin(k.pin_find(blk, "in1").unwrap(), b).unwrap();
        k.link_pin(k.pin_find(blk, "sel").unwrap(), sel).unwrap();
        k.link_pin(k.pin_find(blk, "out").unwrap(), out).unwrap();
        let t = k.thread_new("t", 1000, Floating::HasFp).unwrap();
        k.link_function(k.function_find(blk, "update").unwrap(), t)
            .unwrap();
        k.signal_set(a, Value::Float(1.0)).unwrap();
        k.signal_set(b, Value::Float(2.0)).unwrap();

        k.run_thread(k.thread_handle(t), None);
        assert_eq!(k.signal_get(out).unwrap(), Value::Float(1.0));

        k.signal_set(sel, Value::Bit(true)).unwrap();
        k.run_thread(k.thread_handle(t), None);
        assert_eq!(k.signal_get(out).unwrap(), Value::Float(2.0));
    }
}
