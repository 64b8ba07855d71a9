/*
 * SPDX-License-Identifier: BlueOak-1.0.0
 */

//! Two-input summer: `out = in0 * gain0 + in1 * gain1 + offset`.

use crate::{
    comp::{BlockData, ComponentDef, FunctionDef, Personality, PinDef},
    value::{Dir, Floating, Type},
};

pub const IN0: usize = 0;
pub const GAIN0: usize = 4;
pub const IN1: usize = 8;
pub const GAIN1: usize = 12;
pub const OFFSET: usize = 16;
pub const OUT: usize = 20;

static PINS: [PinDef<'static>; 6] = [
    PinDef {
        name: "in0",
        data_type: Type::Float,
        dir: Dir::In,
        data_offset: IN0,
    },
    PinDef {
        name: "gain0",
        data_type: Type::Float,
        dir: Dir::In,
        data_offset: GAIN0,
    },
    PinDef {
        name: "in1",
        data_type: Type::Float,
        dir: Dir::In,
        data_offset: IN1,
    },
    PinDef {
        name: "gain1",
        data_type: Type::Float,
        dir: Dir::In,
        data_offset: GAIN1,
    },
    PinDef {
        name: "offset",
        data_type: Type::Float,
        dir: Dir::In,
        data_offset: OFFSET,
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
    name: "sum2",
    data_size: 24,
    personality: Personality::No,
    pins: &PINS,
    functions: &FUNCTIONS,
    setup: None,
};

fn update(d: BlockData, _period_ns: u32) {
    let sum = d.float(IN0) * d.float(GAIN0) + d.float(IN1) * d.float(GAIN1) + d.float(OFFSET);
    d.set_float(OUT, sum);
}
