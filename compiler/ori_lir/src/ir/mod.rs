//! Low-level IR — the machine-shaped control-flow graph that backend
//! analyses (liveness, interference, spilling) read.
//!
//! # Architecture
//!
//! - **[`Code`]** — one compilation unit: blocks, temp counts, stack slots
//! - **[`Block`]** — ordered instructions plus successor/predecessor edges
//! - **[`Inst`]** — an opcode and its [`Operand`]s
//! - **[`Operand`]** — an [`Arg`] with a [`Role`] and a register [`Bank`]
//!
//! Blocks refer to each other by [`BlockId`], an index into the owning
//! `Code`. A `Code` is only produced by [`CodeBuilder::finish`], which
//! validates it, so every `Code` in circulation is well formed and frozen.

use std::fmt;

use smallvec::SmallVec;

mod builder;
mod error;

pub use builder::CodeBuilder;
pub use error::CodeError;

// ── Banks and registers ─────────────────────────────────────────────

/// Register class of a value.
///
/// Every operand carries a bank. Temporaries live in exactly one bank;
/// stack slots can hold values of either.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Bank {
    /// General-purpose (integer, pointer) registers.
    Gp,
    /// Floating-point registers.
    Fp,
}

impl Bank {
    /// Both banks, in index order.
    pub const ALL: [Bank; 2] = [Bank::Gp, Bank::Fp];

    /// Dense index of this bank, for per-bank tables.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Bank::Gp => 0,
            Bank::Fp => 1,
        }
    }
}

impl fmt::Display for Bank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bank::Gp => f.write_str("gp"),
            Bank::Fp => f.write_str("fp"),
        }
    }
}

/// Number of physical registers per bank on the target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RegisterFile {
    pub gp: u8,
    pub fp: u8,
}

impl RegisterFile {
    /// Register count for `bank`.
    #[inline]
    pub fn count(self, bank: Bank) -> u32 {
        match bank {
            Bank::Gp => u32::from(self.gp),
            Bank::Fp => u32::from(self.fp),
        }
    }
}

impl Default for RegisterFile {
    /// 32 registers in each bank.
    fn default() -> Self {
        RegisterFile { gp: 32, fp: 32 }
    }
}

/// A physical register.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Reg {
    bank: Bank,
    num: u8,
}

impl Reg {
    #[inline]
    pub fn new(bank: Bank, num: u8) -> Self {
        Reg { bank, num }
    }

    #[inline]
    pub fn bank(self) -> Bank {
        self.bank
    }

    /// Hardware number within the bank.
    #[inline]
    pub fn num(self) -> u8 {
        self.num
    }

    /// The number as `usize` (for indexing into `Vec`s).
    #[inline]
    pub fn index(self) -> usize {
        usize::from(self.num)
    }
}

// ── Temporaries ─────────────────────────────────────────────────────

/// A register-class temporary: a physical register or a virtual temp.
///
/// Virtual temps are numbered per bank starting from 0; `Tmp::gp(3)` and
/// `Tmp::fp(3)` are unrelated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Tmp {
    Reg(Reg),
    Virtual { bank: Bank, index: u32 },
}

impl Tmp {
    /// Virtual general-purpose temp number `index`.
    #[inline]
    pub fn gp(index: u32) -> Self {
        Tmp::Virtual {
            bank: Bank::Gp,
            index,
        }
    }

    /// Virtual floating-point temp number `index`.
    #[inline]
    pub fn fp(index: u32) -> Self {
        Tmp::Virtual {
            bank: Bank::Fp,
            index,
        }
    }

    /// Physical register `num` of `bank`.
    #[inline]
    pub fn reg(bank: Bank, num: u8) -> Self {
        Tmp::Reg(Reg::new(bank, num))
    }

    #[inline]
    pub fn bank(self) -> Bank {
        match self {
            Tmp::Reg(reg) => reg.bank(),
            Tmp::Virtual { bank, .. } => bank,
        }
    }

    #[inline]
    pub fn is_reg(self) -> bool {
        matches!(self, Tmp::Reg(_))
    }
}

impl fmt::Display for Tmp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Tmp::Reg(reg) => match reg.bank() {
                Bank::Gp => write!(f, "%r{}", reg.num()),
                Bank::Fp => write!(f, "%f{}", reg.num()),
            },
            Tmp::Virtual {
                bank: Bank::Gp,
                index,
            } => write!(f, "%tmp{index}"),
            Tmp::Virtual {
                bank: Bank::Fp,
                index,
            } => write!(f, "%ftmp{index}"),
        }
    }
}

// ── Stack slots ─────────────────────────────────────────────────────

/// Abstract stack slot, identified by its ordinal within a [`Code`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct StackSlotId(u32);

impl StackSlotId {
    #[inline]
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }

    /// Get the index as `usize` (for indexing into `Vec`s).
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for StackSlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stack{}", self.0)
    }
}

/// Who owns a stack slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StackSlotKind {
    /// Allocated by lowering (address taken, ABI area). Never coalesced.
    Locked,
    /// Created by the register allocator to hold a spilled temp.
    Spill,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StackSlotData {
    pub byte_size: u32,
    pub kind: StackSlotKind,
}

// ── Operands ────────────────────────────────────────────────────────

/// Operand payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Arg {
    Tmp(Tmp),
    Stack(StackSlotId),
    Imm(i64),
    /// Memory at `base + offset`. The base register is read before the
    /// access, whatever the operand's own role is.
    Addr { base: Tmp, offset: i32 },
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Tmp(tmp) => write!(f, "{tmp}"),
            Arg::Stack(slot) => write!(f, "({slot})"),
            Arg::Imm(value) => write!(f, "${value}"),
            Arg::Addr { base, offset } => write!(f, "{offset}({base})"),
        }
    }
}

/// When, relative to its instruction, an operand is read or written.
///
/// Liveness only looks at three derived facts: whether the operand is an
/// early use, a late use, or a def. The compound roles combine them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Role {
    /// Read before the instruction executes.
    EarlyUse,
    /// Read after the instruction's own defs have happened, so the value
    /// must survive the whole instruction.
    LateUse,
    /// Written by the instruction.
    Def,
    /// Read early, then written (read-modify-write).
    UseDef,
    /// Clobbered at any point during the instruction.
    Scratch,
}

impl Role {
    #[inline]
    pub fn is_early_use(self) -> bool {
        matches!(self, Role::EarlyUse | Role::UseDef)
    }

    #[inline]
    pub fn is_late_use(self) -> bool {
        matches!(self, Role::LateUse | Role::Scratch)
    }

    #[inline]
    pub fn is_def(self) -> bool {
        matches!(self, Role::Def | Role::UseDef | Role::Scratch)
    }
}

/// One operand of an instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Operand {
    pub arg: Arg,
    pub role: Role,
    /// Bank of the value the operand carries.
    pub bank: Bank,
}

impl Operand {
    #[inline]
    pub fn new(arg: Arg, role: Role, bank: Bank) -> Self {
        Operand { arg, role, bank }
    }

    /// A temp operand; the bank is the temp's own.
    #[inline]
    pub fn tmp(tmp: Tmp, role: Role) -> Self {
        Operand::new(Arg::Tmp(tmp), role, tmp.bank())
    }

    /// A stack slot holding a value of `bank`.
    #[inline]
    pub fn stack(slot: StackSlotId, role: Role, bank: Bank) -> Self {
        Operand::new(Arg::Stack(slot), role, bank)
    }

    #[inline]
    pub fn imm(value: i64) -> Self {
        Operand::new(Arg::Imm(value), Role::EarlyUse, Bank::Gp)
    }

    /// A memory operand at `base + offset` holding a value of `bank`.
    #[inline]
    pub fn addr(base: Tmp, offset: i32, role: Role, bank: Bank) -> Self {
        Operand::new(Arg::Addr { base, offset }, role, bank)
    }
}

// ── Instructions ────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Opcode {
    Nop,
    Move,
    Add,
    Sub,
    Mul,
    /// Exchange two operands in place.
    Swap,
    Load,
    Store,
    Call,
    /// Opaque instruction whose operand roles are given explicitly.
    Patch,
    Jump,
    Branch,
    Ret,
    /// Unreachable trap.
    Oops,
}

impl Opcode {
    /// Whether this opcode ends a block.
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Opcode::Jump | Opcode::Branch | Opcode::Ret | Opcode::Oops
        )
    }

    /// Number of successor edges a block ending in this opcode must have.
    /// `None` for non-terminals.
    #[inline]
    pub fn num_successors(self) -> Option<usize> {
        match self {
            Opcode::Jump => Some(1),
            Opcode::Branch => Some(2),
            Opcode::Ret | Opcode::Oops => Some(0),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Opcode::Nop => "nop",
            Opcode::Move => "move",
            Opcode::Add => "add",
            Opcode::Sub => "sub",
            Opcode::Mul => "mul",
            Opcode::Swap => "swap",
            Opcode::Load => "load",
            Opcode::Store => "store",
            Opcode::Call => "call",
            Opcode::Patch => "patch",
            Opcode::Jump => "jump",
            Opcode::Branch => "branch",
            Opcode::Ret => "ret",
            Opcode::Oops => "oops",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single instruction.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Inst {
    pub opcode: Opcode,
    pub args: SmallVec<[Operand; 3]>,
}

impl Inst {
    pub fn new(opcode: Opcode, args: impl IntoIterator<Item = Operand>) -> Self {
        Inst {
            opcode,
            args: args.into_iter().collect(),
        }
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.opcode.is_terminal()
    }

    /// Visit every temp this instruction mentions, with its role and bank.
    ///
    /// The base of an [`Arg::Addr`] is reported as an early use in its own
    /// bank.
    pub fn for_each_tmp(&self, mut f: impl FnMut(Tmp, Role, Bank)) {
        for operand in &self.args {
            match operand.arg {
                Arg::Tmp(tmp) => f(tmp, operand.role, operand.bank),
                Arg::Addr { base, .. } => f(base, Role::EarlyUse, base.bank()),
                Arg::Stack(_) | Arg::Imm(_) => {}
            }
        }
    }

    /// Visit every stack slot this instruction mentions, with its role and
    /// the bank of the value stored there.
    pub fn for_each_stack_slot(&self, mut f: impl FnMut(StackSlotId, Role, Bank)) {
        for operand in &self.args {
            if let Arg::Stack(slot) = operand.arg {
                f(slot, operand.role, operand.bank);
            }
        }
    }
}

impl fmt::Display for Inst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.opcode.name())?;
        for (i, operand) in self.args.iter().enumerate() {
            let sep = if i == 0 { " " } else { ", " };
            write!(f, "{sep}{}", operand.arg)?;
            match operand.role {
                Role::EarlyUse => {}
                Role::LateUse => f.write_str(":late")?,
                Role::Def => f.write_str(":def")?,
                Role::UseDef => f.write_str(":usedef")?,
                Role::Scratch => f.write_str(":scratch")?,
            }
        }
        Ok(())
    }
}

// ── Blocks ──────────────────────────────────────────────────────────

/// Basic block ID within a [`Code`]. Allocated sequentially from 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct BlockId(u32);

impl BlockId {
    #[inline]
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }

    /// Get the index as `usize` (for indexing into `Vec`s).
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A basic block. Its last instruction is its terminator.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Block {
    id: BlockId,
    insts: Vec<Inst>,
    successors: SmallVec<[BlockId; 2]>,
    /// Distinct predecessors, in order of first appearance.
    predecessors: SmallVec<[BlockId; 4]>,
}

impl Block {
    #[inline]
    pub fn id(&self) -> BlockId {
        self.id
    }

    #[inline]
    pub fn insts(&self) -> &[Inst] {
        &self.insts
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.insts.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.insts.is_empty()
    }

    #[inline]
    pub fn at(&self, index: usize) -> &Inst {
        &self.insts[index]
    }

    /// The terminator.
    pub fn last(&self) -> &Inst {
        match self.insts.last() {
            Some(inst) => inst,
            None => panic!("block {} has no terminator", self.id),
        }
    }

    #[inline]
    pub fn successors(&self) -> &[BlockId] {
        &self.successors
    }

    #[inline]
    pub fn predecessors(&self) -> &[BlockId] {
        &self.predecessors
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "BB{}:", self.id)?;
        if !self.predecessors.is_empty() {
            f.write_str("  predecessors:")?;
            for pred in &self.predecessors {
                write!(f, " {pred}")?;
            }
            writeln!(f)?;
        }
        for inst in &self.insts {
            writeln!(f, "    {inst}")?;
        }
        if !self.successors.is_empty() {
            f.write_str("  successors:")?;
            for succ in &self.successors {
                write!(f, " {succ}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

// ── Code ────────────────────────────────────────────────────────────

/// A frozen compilation unit.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Code {
    blocks: Vec<Block>,
    /// Virtual temp count, indexed by [`Bank::index`].
    num_tmps: [u32; 2],
    stack_slots: Vec<StackSlotData>,
    registers: RegisterFile,
}

impl Code {
    /// Blocks in stable index order; `blocks()[i].id().index() == i`.
    #[inline]
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    #[inline]
    pub fn block(&self, id: BlockId) -> &Block {
        &self.blocks[id.index()]
    }

    /// Number of blocks.
    #[inline]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Number of virtual temps in `bank`.
    #[inline]
    pub fn num_tmps(&self, bank: Bank) -> u32 {
        self.num_tmps[bank.index()]
    }

    /// Number of physical registers in `bank`.
    #[inline]
    pub fn num_regs(&self, bank: Bank) -> u32 {
        self.registers.count(bank)
    }

    #[inline]
    pub fn registers(&self) -> RegisterFile {
        self.registers
    }

    #[inline]
    pub fn stack_slots(&self) -> &[StackSlotData] {
        &self.stack_slots
    }

    #[inline]
    pub fn stack_slot(&self, id: StackSlotId) -> &StackSlotData {
        &self.stack_slots[id.index()]
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for block in &self.blocks {
            write!(f, "{block}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
