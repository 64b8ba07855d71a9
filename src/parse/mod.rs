/*
 * SPDX-License-Identifier: BlueOak-1.0.0
 */

//! The assembly command language.
//!
//! A token-driven state machine: the caller hands in whitespace-free
//! tokens one at a time (or a token slice, or a whole line to split)
//! and the parser drives the kernel assembly operations. Commands
//! chain: after a command's terminal state a command keyword starts
//! the next command, and for the commands with an inner loop a plain
//! name continues the current one (more instance/pin or
//! instance/function pairs).
//!
//! Any syntactic or semantic failure resets the machine to idle,
//! returns `false`, and — with the `print-errors` feature — emits one
//! diagnostic line on the kernel's console sink. The offending token's
//! successor is then free to start a new command, so a batch reports
//! all of its errors in one pass.

pub mod num;

use {bitflags::bitflags, core::fmt, phf::phf_map};

use crate::{
    comp::Personality,
    config,
    console::cwrite,
    error::BlocsError,
    kernel::{BlockId, FunctionId, Kernel, PinId, SignalId, ThreadId},
    name::NameBuf,
    value::{Floating, Type},
};

//--------------------------------------------------------------------------------------------------
// Keywords
//--------------------------------------------------------------------------------------------------

bitflags! {
    /// A keyword can play several roles; `signal` is both a command
    /// and an object type for `show`.
    struct Class: u8 {
        const CMD = 0b0001;
        const OBJ = 0b0010;
        const DATA_TYPE = 0b0100;
        const THREAD_TYPE = 0b1000;
        const CMD_OBJ = Self::CMD.bits | Self::OBJ.bits;
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Cmd {
    None,
    Instance,
    Signal,
    Thread,
    Link,
    Unlink,
    Set,
    Show,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Obj {
    None,
    Instance,
    Signal,
    Thread,
    All,
}

struct Keyword {
    class: Class,
    cmd: Cmd,
    obj: Obj,
    data_type: Type,
    thread_type: Floating,
}

impl Keyword {
    const fn new(class: Class, cmd: Cmd, obj: Obj, data_type: Type, thread_type: Floating) -> Keyword {
        Keyword {
            class,
            cmd,
            obj,
            data_type,
            thread_type,
        }
    }

    const fn command(cmd: Cmd) -> Keyword {
        Self::new(Class::CMD, cmd, Obj::None, Type::Float, Floating::HasFp)
    }

    const fn command_obj(cmd: Cmd, obj: Obj) -> Keyword {
        Self::new(Class::CMD_OBJ, cmd, obj, Type::Float, Floating::HasFp)
    }

    const fn object(obj: Obj) -> Keyword {
        Self::new(Class::OBJ, Cmd::None, obj, Type::Float, Floating::HasFp)
    }

    const fn data_type(ty: Type) -> Keyword {
        Self::new(Class::DATA_TYPE, Cmd::None, Obj::None, ty, Floating::HasFp)
    }

    const fn thread_type(fp: Floating) -> Keyword {
        Self::new(Class::THREAD_TYPE, Cmd::None, Obj::None, Type::Float, fp)
    }
}

static KEYWORDS: phf::Map<&'static str, Keyword> = phf_map! {
    "instance" => Keyword::command_obj(Cmd::Instance, Obj::Instance),
    "signal" => Keyword::command_obj(Cmd::Signal, Obj::Signal),
    "thread" => Keyword::command_obj(Cmd::Thread, Obj::Thread),
    "link" => Keyword::command(Cmd::Link),
    "unlink" => Keyword::command(Cmd::Unlink),
    "set" => Keyword::command(Cmd::Set),
    "show" => Keyword::command(Cmd::Show),
    "bit" => Keyword::data_type(Type::Bit),
    "float" => Keyword::data_type(Type::Float),
    "s32" => Keyword::data_type(Type::S32),
    "u32" => Keyword::data_type(Type::U32),
    "fp" => Keyword::thread_type(Floating::HasFp),
    "nofp" => Keyword::thread_type(Floating::NoFp),
    "all" => Keyword::object(Obj::All),
};

fn lookup_keyword(token: &str) -> Option<&'static Keyword> {
    KEYWORDS.get(token)
}

/// A token must be 1 to `MAX_TOKEN_LEN` printable ASCII characters.
fn is_string(token: &str) -> bool {
    !token.is_empty()
        && token.len() <= config::MAX_TOKEN_LEN
        && token.bytes().all(|b| (0x21..=0x7E).contains(&b))
}

/// A name is a non-keyword token of at most `MAX_NAME_LEN` characters,
/// starting with a letter or underscore and continuing with letters,
/// digits and underscores.
fn is_name(token: &str) -> bool {
    if !is_string(token) || lookup_keyword(token).is_some() || token.len() > config::MAX_NAME_LEN
    {
        return false;
    }
    let mut bytes = token.bytes();
    match bytes.next() {
        Some(b) if b == b'_' || b.is_ascii_alphabetic() => {}
        _ => return false,
    }
    bytes.all(|b| b == b'_' || b.is_ascii_alphanumeric())
}

//--------------------------------------------------------------------------------------------------
// The state machine
//--------------------------------------------------------------------------------------------------

#[derive(Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    InstName,
    InstComp,
    InstPers,
    InstDone,
    SigName,
    SigTypeOrBlock,
    SigBlock,
    SigPin,
    SigDone,
    ThrName,
    ThrType,
    ThrPeriod,
    ThrBlock,
    ThrFunct,
    ThrDone,
    LinkBlock,
    LinkMember,
    LinkPinSig,
    LinkFunctThr,
    LinkDone,
    #[cfg(feature = "unlink")]
    UnlinkBlock,
    #[cfg(feature = "unlink")]
    UnlinkMember,
    #[cfg(feature = "unlink")]
    UnlinkDone,
    SetStart,
    SetPin,
    SetValue,
    SetDone,
    Show,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum SetTarget {
    None,
    Signal(SignalId),
    Pin(PinId),
}

/// Parser state: the current state plus scratch handles for the
/// objects under construction.
pub struct Parser {
    state: State,
    new_name: NameBuf,
    comp_index: usize,
    thread_type: Floating,
    blk: Option<BlockId>,
    sig: Option<SignalId>,
    thr: Option<ThreadId>,
    pin: Option<PinId>,
    funct: Option<FunctionId>,
    target: SetTarget,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

//--------------------------------------------------------------------------------------------------
// Diagnostics
//--------------------------------------------------------------------------------------------------

fn internal_error(k: &Kernel, state: &mut State) -> bool {
    *state = State::Idle;
    #[cfg(feature = "print-errors")]
    cwrite!(k.sink(), "ERROR: internal error\n");
    #[cfg(not(feature = "print-errors"))]
    let _ = k;
    false
}

fn expect_error(k: &Kernel, state: &mut State, what: &str, token: &str) -> bool {
    *state = State::Idle;
    #[cfg(feature = "print-errors")]
    cwrite!(k.sink(), "ERROR: expected {} found '{}'\n", what, token);
    #[cfg(not(feature = "print-errors"))]
    let _ = (k, what, token);
    false
}

fn api_error(k: &Kernel, state: &mut State, e: BlocsError, ctx: fmt::Arguments) -> bool {
    *state = State::Idle;
    #[cfg(feature = "print-errors")]
    cwrite!(k.sink(), "ERROR: {}: {}\n", ctx, e);
    #[cfg(not(feature = "print-errors"))]
    let _ = (k, e, ctx);
    false
}

//--------------------------------------------------------------------------------------------------
// Public Code
//--------------------------------------------------------------------------------------------------

impl Parser {
    pub fn new() -> Self {
        Self {
            state: State::Idle,
            new_name: NameBuf::new(),
            comp_index: 0,
            thread_type: Floating::HasFp,
            blk: None,
            sig: None,
            thr: None,
            pin: None,
            funct: None,
            target: SetTarget::None,
        }
    }

    /// Process one token. Returns `false` if the token was rejected;
    /// the parser is then back in its idle state.
    pub fn feed(&mut self, k: &Kernel, token: &str) -> bool {
        match self.state {
            State::Idle => self.st_idle(k, token),
            State::InstName => self.st_inst_name(k, token),
            State::InstComp => self.st_inst_comp(k, token),
            State::InstPers => self.st_inst_pers(k, token),
            State::InstDone => self.st_inst_done(k, token),
            State::SigName => self.st_sig_name(k, token),
            State::SigTypeOrBlock => self.st_sig_type_or_block(k, token),
            State::SigBlock => self.st_sig_block(k, token),
            State::SigPin => self.st_sig_pin(k, token),
            State::SigDone => self.st_sig_done(k, token),
            State::ThrName => self.st_thr_name(k, token),
            State::ThrType => self.st_thr_type(k, token),
            State::ThrPeriod => self.st_thr_period(k, token),
            State::ThrBlock => self.st_thr_block(k, token),
            State::ThrFunct => self.st_thr_funct(k, token),
            State::ThrDone => self.st_thr_done(k, token),
            State::LinkBlock => self.st_link_block(k, token),
            State::LinkMember => self.st_link_member(k, token),
            State::LinkPinSig => self.st_link_pin_sig(k, token),
            State::LinkFunctThr => self.st_link_funct_thr(k, token),
            State::LinkDone => self.st_link_done(k, token),
            #[cfg(feature = "unlink")]
            State::UnlinkBlock => self.st_unlink_block(k, token),
            #[cfg(feature = "unlink")]
            State::UnlinkMember => self.st_unlink_member(k, token),
            #[cfg(feature = "unlink")]
            State::UnlinkDone => self.st_unlink_done(k, token),
            State::SetStart => self.st_set_start(k, token),
            State::SetPin => self.st_set_pin(k, token),
            State::SetValue => self.st_set_value(k, token),
            State::SetDone => self.st_set_done(k, token),
            State::Show => self.st_show(k, token),
        }
    }

    /// Process a slice of tokens, reporting every error. Returns
    /// `true` only if every token was accepted.
    pub fn feed_tokens(&mut self, k: &Kernel, tokens: &[&str]) -> bool {
        let mut errors = 0u32;
        for token in tokens {
            if !self.feed(k, token) {
                errors += 1;
            }
        }
        errors == 0
    }

    /// Split a line on whitespace and process every token.
    pub fn feed_line(&mut self, k: &Kernel, line: &str) -> bool {
        let mut errors = 0u32;
        for token in line.split_ascii_whitespace() {
            if !self.feed(k, token) {
                errors += 1;
            }
        }
        errors == 0
    }

    fn is_new_name(&self, k: &Kernel, token: &str) -> bool {
        k.lookup_block(token).is_none()
            && k.lookup_signal(token).is_none()
            && k.lookup_thread(token).is_none()
    }

    /// Common handling for a command's terminal state: a command
    /// keyword chains to the next command, a non-keyword token
    /// re-enters the command at `restart`.
    fn chain_or_restart(&mut self, k: &Kernel, token: &str, restart: State) -> bool {
        if let Some(kw) = lookup_keyword(token) {
            if kw.class.contains(Class::CMD) {
                self.state = State::Idle;
                return self.feed(k, token);
            }
            return expect_error(k, &mut self.state, "command", token);
        }
        self.state = restart;
        self.feed(k, token)
    }

    //----------------------------------------------------------------------------------------------
    // idle
    //----------------------------------------------------------------------------------------------

    fn st_idle(&mut self, k: &Kernel, token: &str) -> bool {
        let kw = match lookup_keyword(token) {
            Some(kw) if kw.class.contains(Class::CMD) => kw,
            _ => return expect_error(k, &mut self.state, "command", token),
        };
        match kw.cmd {
            Cmd::Instance => self.state = State::InstName,
            Cmd::Signal => self.state = State::SigName,
            Cmd::Thread => self.state = State::ThrName,
            Cmd::Link => self.state = State::LinkBlock,
            Cmd::Unlink => {
                #[cfg(feature = "unlink")]
                {
                    self.state = State::UnlinkBlock;
                }
                #[cfg(not(feature = "unlink"))]
                return expect_error(k, &mut self.state, "command", token);
            }
            Cmd::Set => self.state = State::SetStart,
            Cmd::Show => self.state = State::Show,
            Cmd::None => return internal_error(k, &mut self.state),
        }
        true
    }

    //----------------------------------------------------------------------------------------------
    // instance NAME COMPONENT [PERSONALITY]
    //----------------------------------------------------------------------------------------------

    fn st_inst_name(&mut self, k: &Kernel, token: &str) -> bool {
        if is_name(token) && self.is_new_name(k, token) {
            self.new_name = NameBuf::from_str(token);
            self.state = State::InstComp;
            return true;
        }
        expect_error(k, &mut self.state, "new instance name", token)
    }

    fn st_inst_comp(&mut self, k: &Kernel, token: &str) -> bool {
        if is_name(token) {
            if let Some(ci) = k.comp_index(token) {
                if k.component(ci).personality == Personality::Required {
                    self.comp_index = ci;
                    self.state = State::InstPers;
                    return true;
                }
                return self.instantiate(k, ci, None);
            }
        }
        expect_error(k, &mut self.state, "component definition name", token)
    }

    fn st_inst_pers(&mut self, k: &Kernel, token: &str) -> bool {
        let ci = self.comp_index;
        self.instantiate(k, ci, Some(token))
    }

    fn instantiate(&mut self, k: &Kernel, ci: usize, personality: Option<&str>) -> bool {
        match k.instantiate(ci, self.new_name.as_str(), personality) {
            Ok(blk) => {
                self.blk = Some(blk);
                self.state = State::InstDone;
                true
            }
            Err(e) => api_error(
                k,
                &mut self.state,
                e,
                format_args!("creating instance '{}'", self.new_name.as_str()),
            ),
        }
    }

    fn st_inst_done(&mut self, k: &Kernel, token: &str) -> bool {
        // `instance` has no inner loop: only another command may follow
        if let Some(kw) = lookup_keyword(token) {
            if kw.class.contains(Class::CMD) {
                self.state = State::Idle;
                return self.feed(k, token);
            }
        }
        expect_error(k, &mut self.state, "command", token)
    }

    //----------------------------------------------------------------------------------------------
    // signal NAME TYPE | signal NAME [INST PIN]...
    //----------------------------------------------------------------------------------------------

    fn st_sig_name(&mut self, k: &Kernel, token: &str) -> bool {
        if is_name(token) {
            if let Some(sig) = k.lookup_signal(token) {
                self.sig = Some(sig);
                self.state = State::SigBlock;
                return true;
            }
            if self.is_new_name(k, token) {
                self.new_name = NameBuf::from_str(token);
                self.sig = None;
                self.state = State::SigTypeOrBlock;
                return true;
            }
        }
        expect_error(k, &mut self.state, "new or existing signal name", token)
    }

    fn st_sig_type_or_block(&mut self, k: &Kernel, token: &str) -> bool {
        if is_name(token) {
            if let Some(blk) = k.lookup_block(token) {
                self.blk = Some(blk);
                self.state = State::SigPin;
                return true;
            }
        } else if let Some(kw) = lookup_keyword(token) {
            if kw.class.contains(Class::DATA_TYPE) {
                return match k.signal_new(self.new_name.as_str(), kw.data_type) {
                    Ok(sig) => {
                        self.sig = Some(sig);
                        self.state = State::SigDone;
                        true
                    }
                    Err(e) => api_error(
                        k,
                        &mut self.state,
                        e,
                        format_args!("creating signal '{}'", self.new_name.as_str()),
                    ),
                };
            }
        }
        expect_error(k, &mut self.state, "instance name or data type", token)
    }

    fn st_sig_block(&mut self, k: &Kernel, token: &str) -> bool {
        if is_name(token) {
            if let Some(blk) = k.lookup_block(token) {
                self.blk = Some(blk);
                self.state = State::SigPin;
                return true;
            }
        }
        expect_error(k, &mut self.state, "instance name", token)
    }

    fn st_sig_pin(&mut self, k: &Kernel, token: &str) -> bool {
        let Some(blk) = self.blk else {
            return internal_error(k, &mut self.state);
        };
        if is_name(token) {
            if let Some(pin) = k.lookup_pin(blk, token) {
                let sig = match self.sig {
                    Some(sig) => sig,
                    // first pin fixes a fresh signal's type
                    None => match k.signal_new(self.new_name.as_str(), k.pin_type(pin)) {
                        Ok(sig) => {
                            self.sig = Some(sig);
                            sig
                        }
                        Err(e) => {
                            return api_error(
                                k,
                                &mut self.state,
                                e,
                                format_args!("creating signal '{}'", self.new_name.as_str()),
                            )
                        }
                    },
                };
                return match k.link_pin(pin, sig) {
                    Ok(()) => {
                        self.state = State::SigDone;
                        true
                    }
                    Err(e) => api_error(
                        k,
                        &mut self.state,
                        e,
                        format_args!(
                            "linking pin '{}.{}' to signal '{}'",
                            k.block_name(blk),
                            k.pin_name(pin),
                            k.signal_name(sig)
                        ),
                    ),
                };
            }
        }
        expect_error(k, &mut self.state, "pin name", token)
    }

    fn st_sig_done(&mut self, k: &Kernel, token: &str) -> bool {
        // inner loop: another instance/pin pair
        if is_name(token) {
            if let Some(blk) = k.lookup_block(token) {
                self.blk = Some(blk);
                self.state = State::SigPin;
                return true;
            }
        }
        self.chain_or_restart(k, token, State::SigName)
    }

    //----------------------------------------------------------------------------------------------
    // thread NAME (fp|nofp) PERIOD_NS | thread NAME [INST FUNCT]...
    //----------------------------------------------------------------------------------------------

    fn st_thr_name(&mut self, k: &Kernel, token: &str) -> bool {
        if is_name(token) {
            if let Some(thr) = k.lookup_thread(token) {
                self.thr = Some(thr);
                self.state = State::ThrBlock;
                return true;
            }
            if self.is_new_name(k, token) {
                self.new_name = NameBuf::from_str(token);
                self.state = State::ThrType;
                return true;
            }
        }
        expect_error(k, &mut self.state, "new or existing thread name", token)
    }

    fn st_thr_type(&mut self, k: &Kernel, token: &str) -> bool {
        if let Some(kw) = lookup_keyword(token) {
            if kw.class.contains(Class::THREAD_TYPE) {
                self.thread_type = kw.thread_type;
                self.state = State::ThrPeriod;
                return true;
            }
        }
        expect_error(k, &mut self.state, "thread type", token)
    }

    fn st_thr_period(&mut self, k: &Kernel, token: &str) -> bool {
        if let Some(period) = num::parse_u32(token) {
            return match k.thread_new(self.new_name.as_str(), period, self.thread_type) {
                Ok(thr) => {
                    self.thr = Some(thr);
                    self.state = State::ThrDone;
                    true
                }
                Err(e) => api_error(
                    k,
                    &mut self.state,
                    e,
                    format_args!("creating thread '{}'", self.new_name.as_str()),
                ),
            };
        }
        expect_error(k, &mut self.state, "thread period", token)
    }

    fn st_thr_block(&mut self, k: &Kernel, token: &str) -> bool {
        if is_name(token) {
            if let Some(blk) = k.lookup_block(token) {
                self.blk = Some(blk);
                self.state = State::ThrFunct;
                return true;
            }
        }
        expect_error(k, &mut self.state, "instance name", token)
    }

    fn st_thr_funct(&mut self, k: &Kernel, token: &str) -> bool {
        let (Some(blk), Some(thr)) = (self.blk, self.thr) else {
            return internal_error(k, &mut self.state);
        };
        if is_name(token) {
            if let Some(funct) = k.lookup_function(blk, token) {
                return match k.link_function(funct, thr) {
                    Ok(()) => {
                        self.state = State::ThrDone;
                        true
                    }
                    Err(e) => api_error(
                        k,
                        &mut self.state,
                        e,
                        format_args!(
                            "linking function '{}.{}' to thread '{}'",
                            k.block_name(blk),
                            k.function_name(funct),
                            k.thread_name(thr)
                        ),
                    ),
                };
            }
        }
        expect_error(k, &mut self.state, "function name", token)
    }

    fn st_thr_done(&mut self, k: &Kernel, token: &str) -> bool {
        // inner loop: another instance/function pair
        if is_name(token) {
            if let Some(blk) = k.lookup_block(token) {
                self.blk = Some(blk);
                self.state = State::ThrFunct;
                return true;
            }
        }
        self.chain_or_restart(k, token, State::ThrName)
    }

    //----------------------------------------------------------------------------------------------
    // link INST (PIN SIG | FUNCT THREAD)
    //----------------------------------------------------------------------------------------------

    fn st_link_block(&mut self, k: &Kernel, token: &str) -> bool {
        if is_name(token) {
            if let Some(blk) = k.lookup_block(token) {
                self.blk = Some(blk);
                self.state = State::LinkMember;
                return true;
            }
        }
        expect_error(k, &mut self.state, "instance name", token)
    }

    fn st_link_member(&mut self, k: &Kernel, token: &str) -> bool {
        let Some(blk) = self.blk else {
            return internal_error(k, &mut self.state);
        };
        if is_name(token) {
            if let Some(pin) = k.lookup_pin(blk, token) {
                self.pin = Some(pin);
                self.state = State::LinkPinSig;
                return true;
            }
            if let Some(funct) = k.lookup_function(blk, token) {
                self.funct = Some(funct);
                self.state = State::LinkFunctThr;
                return true;
            }
        }
        expect_error(k, &mut self.state, "pin or function name", token)
    }

    fn st_link_pin_sig(&mut self, k: &Kernel, token: &str) -> bool {
        let (Some(blk), Some(pin)) = (self.blk, self.pin) else {
            return internal_error(k, &mut self.state);
        };
        if is_name(token) {
            if let Some(sig) = k.lookup_signal(token) {
                return match k.link_pin(pin, sig) {
                    Ok(()) => {
                        self.state = State::LinkDone;
                        true
                    }
                    Err(e) => api_error(
                        k,
                        &mut self.state,
                        e,
                        format_args!(
                            "linking pin '{}.{}' to signal '{}'",
                            k.block_name(blk),
                            k.pin_name(pin),
                            k.signal_name(sig)
                        ),
                    ),
                };
            }
        }
        expect_error(k, &mut self.state, "signal name", token)
    }

    fn st_link_funct_thr(&mut self, k: &Kernel, token: &str) -> bool {
        let (Some(blk), Some(funct)) = (self.blk, self.funct) else {
            return internal_error(k, &mut self.state);
        };
        if is_name(token) {
            if let Some(thr) = k.lookup_thread(token) {
                return match k.link_function(funct, thr) {
                    Ok(()) => {
                        self.state = State::LinkDone;
                        true
                    }
                    Err(e) => api_error(
                        k,
                        &mut self.state,
                        e,
                        format_args!(
                            "linking function '{}.{}' to thread '{}'",
                            k.block_name(blk),
                            k.function_name(funct),
                            k.thread_name(thr)
                        ),
                    ),
                };
            }
        }
        expect_error(k, &mut self.state, "thread name", token)
    }

    fn st_link_done(&mut self, k: &Kernel, token: &str) -> bool {
        self.chain_or_restart(k, token, State::LinkBlock)
    }

    //----------------------------------------------------------------------------------------------
    // unlink INST (PIN | FUNCT)
    //----------------------------------------------------------------------------------------------

    #[cfg(feature = "unlink")]
    fn st_unlink_block(&mut self, k: &Kernel, token: &str) -> bool {
        if is_name(token) {
            if let Some(blk) = k.lookup_block(token) {
                self.blk = Some(blk);
                self.state = State::UnlinkMember;
                return true;
            }
        }
        expect_error(k, &mut self.state, "instance name", token)
    }

    #[cfg(feature = "unlink")]
    fn st_unlink_member(&mut self, k: &Kernel, token: &str) -> bool {
        let Some(blk) = self.blk else {
            return internal_error(k, &mut self.state);
        };
        if is_name(token) {
            if let Some(pin) = k.lookup_pin(blk, token) {
                return match k.unlink_pin(pin) {
                    Ok(()) => {
                        self.state = State::UnlinkDone;
                        true
                    }
                    Err(e) => api_error(
                        k,
                        &mut self.state,
                        e,
                        format_args!(
                            "unlinking pin '{}.{}'",
                            k.block_name(blk),
                            k.pin_name(pin)
                        ),
                    ),
                };
            }
            if let Some(funct) = k.lookup_function(blk, token) {
                return match k.unlink_function(funct) {
                    Ok(()) => {
                        self.state = State::UnlinkDone;
                        true
                    }
                    Err(e) => api_error(
                        k,
                        &mut self.state,
                        e,
                        format_args!(
                            "unlinking function '{}.{}'",
                            k.block_name(blk),
                            k.function_name(funct)
                        ),
                    ),
                };
            }
        }
        expect_error(k, &mut self.state, "pin or function name", token)
    }

    #[cfg(feature = "unlink")]
    fn st_unlink_done(&mut self, k: &Kernel, token: &str) -> bool {
        self.chain_or_restart(k, token, State::UnlinkBlock)
    }

    //----------------------------------------------------------------------------------------------
    // set (SIG | INST PIN) VALUE
    //----------------------------------------------------------------------------------------------

    fn st_set_start(&mut self, k: &Kernel, token: &str) -> bool {
        if is_name(token) {
            if let Some(sig) = k.lookup_signal(token) {
                self.target = SetTarget::Signal(sig);
                self.state = State::SetValue;
                return true;
            }
            if let Some(blk) = k.lookup_block(token) {
                self.blk = Some(blk);
                self.state = State::SetPin;
                return true;
            }
        }
        expect_error(k, &mut self.state, "signal or instance name", token)
    }

    fn st_set_pin(&mut self, k: &Kernel, token: &str) -> bool {
        let Some(blk) = self.blk else {
            return internal_error(k, &mut self.state);
        };
        if is_name(token) {
            if let Some(pin) = k.lookup_pin(blk, token) {
                self.target = SetTarget::Pin(pin);
                self.state = State::SetValue;
                return true;
            }
        }
        expect_error(k, &mut self.state, "pin name", token)
    }

    fn st_set_value(&mut self, k: &Kernel, token: &str) -> bool {
        let ty = match self.target {
            SetTarget::Signal(sig) => k.signal_type(sig),
            SetTarget::Pin(pin) => k.pin_type(pin),
            SetTarget::None => return internal_error(k, &mut self.state),
        };
        let what = match ty {
            Type::Bit => "bit value",
            Type::Float => "float value",
            Type::S32 => "s32 value",
            Type::U32 => "u32 value",
            Type::Raw => return internal_error(k, &mut self.state),
        };
        let Some(value) = num::parse_value(ty, token) else {
            return expect_error(k, &mut self.state, what, token);
        };
        let result = match self.target {
            SetTarget::Signal(sig) => k.signal_set(sig, value),
            SetTarget::Pin(pin) => k.pin_set(pin, value),
            SetTarget::None => return internal_error(k, &mut self.state),
        };
        match result {
            Ok(()) => {
                self.state = State::SetDone;
                true
            }
            Err(e) => api_error(
                k,
                &mut self.state,
                e,
                format_args!("setting value '{}'", token),
            ),
        }
    }

    fn st_set_done(&mut self, k: &Kernel, token: &str) -> bool {
        self.chain_or_restart(k, token, State::SetStart)
    }

    //----------------------------------------------------------------------------------------------
    // show (instance | signal | thread | all | NAME)
    //----------------------------------------------------------------------------------------------

    fn st_show(&mut self, k: &Kernel, token: &str) -> bool {
        if let Some(kw) = lookup_keyword(token) {
            if kw.class.contains(Class::OBJ) {
                match kw.obj {
                    Obj::Instance => k.show_all_blocks(),
                    Obj::Signal => k.show_all_signals(),
                    Obj::Thread => k.show_all_threads(),
                    Obj::All => k.show_all(),
                    Obj::None => return internal_error(k, &mut self.state),
                }
                return true;
            }
            if kw.class.contains(Class::CMD) {
                self.state = State::Idle;
                return self.feed(k, token);
            }
        }
        if is_name(token) {
            if let Some(blk) = k.lookup_block(token) {
                k.show_block(blk);
                return true;
            }
            if let Some(sig) = k.lookup_signal(token) {
                k.show_signal(sig);
                return true;
            }
            if let Some(thr) = k.lookup_thread(token) {
                k.show_thread(thr);
                return true;
            }
        }
        expect_error(
            k,
            &mut self.state,
            "object name, object type, or 'all'",
            token,
        )
    }
}

//--------------------------------------------------------------------------------------------------
// Testing
//--------------------------------------------------------------------------------------------------
