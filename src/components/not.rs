/*
 * SPDX-License-Identifier: BlueOak-1.0.0
 */

//! Inverter.

use crate::{
    comp::{BlockData, ComponentDef, FunctionDef, Personality, PinDef},
    value::{Dir, Floating, Type},
};

pub const IN: usize = 0;
pub const OUT: usize = 4;

static PINS: [PinDef<'static>; 2] = [
    PinDef {
        name: "in",
        data_type: Type::Bit,
        dir: Dir::In,
        data_offset: IN,
    },
    PinDef {
        name: "out",
        data_type: Type::Bit,
        dir: Dir::Out,
        data_offset: OUT,
    },
];

static FUNCTIONS: [FunctionDef; 1] = [FunctionDef {
    name: "update",
    floating: Floating::NoFp,
    run: update,
}];

pub static DEF: ComponentDef = ComponentDef {
    name: "not",
    data_size: 8,
    personality: Personality::No,
    pins: &PINS,
    functions: &FUNCTIONS,
    setup: None,
};

fn update(d: BlockData, _period_ns: u32) {
    d.set_bit(OUT, !d.bit(IN));
}
