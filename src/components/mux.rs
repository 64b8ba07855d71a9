/*
 * SPDX-License-Identifier: BlueOak-1.0.0
 */

//! N-way selector with a personality-driven channel count.
//!
//! The personality token is the decimal number of inputs (2 to 8).
//! The custom setup sizes the block data to the channel count and
//! creates one float input pin per channel (`in0`, `in1`, ...), an
//! `s32` selector pin and the output pin. The channel count itself is
//! kept in a block state word for the realtime function.

use core::fmt::Write;

use crate::{
    comp::{BlockData, ComponentDef, FunctionDef, Personality, PinDef, SetupArgs},
    error::{fail, Result},
    kernel::{BlockId, Kernel},
    name::NameBuf,
    parse::num,
    value::{Dir, Floating, Type},
};

pub const MAX_INS: u32 = 8;

/// Channel count state word.
const COUNT: usize = 0;

const fn in_offset(i: usize) -> usize {
    4 * (1 + i)
}

const fn sel_offset(n: usize) -> usize {
    4 * (1 + n)
}

const fn out_offset(n: usize) -> usize {
    4 * (2 + n)
}

static FUNCTIONS: [FunctionDef; 1] = [FunctionDef {
    name: "update",
    floating: Floating::HasFp,
    run: update,
}];

pub static DEF: ComponentDef = ComponentDef {
    name: "mux",
    // minimum layout; setup sizes the block to its personality
    data_size: out_offset(2) + 4,
    personality: Personality::Required,
    pins: &[],
    functions: &FUNCTIONS,
    setup: Some(setup),
};

fn setup(k: &Kernel, args: &SetupArgs) -> Result<BlockId> {
    let n = match args.personality.and_then(num::parse_u32) {
        Some(n) if (2..=MAX_INS).contains(&n) => n as usize,
        _ => fail!(Range),
    };
    let blk = k.block_create(args.name, args.comp_index, Some(out_offset(n) + 4))?;
    k.block_data(blk).set_word(COUNT, n as u32);
    for i in 0..n {
        let mut name = NameBuf::new();
        let _ = write!(name, "in{}", i);
        let pin = PinDef {
            name: name.as_str(),
            data_type: Type::Float,
            dir: Dir::In,
            data_offset: in_offset(i),
        };
        k.block_add_pin(blk, &pin)?;
    }
    k.block_add_pin(
        blk,
        &PinDef {
            name: "sel",
            data_type: Type::S32,
            dir: Dir::In,
            data_offset: sel_offset(n),
        },
    )?;
    k.block_add_pin(
        blk,
        &PinDef {
            name: "out",
            data_type: Type::Float,
            dir: Dir::Out,
            data_offset: out_offset(n),
        },
    )?;
    k.block_add_functions(blk, args.def)?;
    Ok(blk)
}

fn update(d: BlockData, _period_ns: u32) {
    let n = d.word(COUNT) as usize;
    let sel = d.s32(sel_offset(n)).clamp(0, n as i32 - 1) as usize;
    d.set_float(out_offset(n), d.float(in_offset(sel)));
}
