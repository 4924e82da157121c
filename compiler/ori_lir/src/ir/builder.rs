//! Incremental construction of a [`Code`].
//!
//! Lowering appends instructions to blocks in any order and records
//! successor edges; [`CodeBuilder::finish`] checks the result and derives
//! predecessor lists, so consumers never see a half-built graph.

use rustc_hash::FxHashSet;
use smallvec::SmallVec;

use super::{
    Arg, Bank, Block, BlockId, Code, CodeError, Inst, RegisterFile, StackSlotData, StackSlotId,
    StackSlotKind, Tmp,
};

/// In-progress basic block.
#[derive(Default)]
struct BlockBuilder {
    insts: Vec<Inst>,
    successors: SmallVec<[BlockId; 2]>,
}

/// Builder for a [`Code`].
#[derive(Default)]
pub struct CodeBuilder {
    registers: RegisterFile,
    blocks: Vec<BlockBuilder>,
    num_tmps: [u32; 2],
    stack_slots: Vec<StackSlotData>,
}

impl CodeBuilder {
    /// A builder targeting the default [`RegisterFile`].
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_registers(registers: RegisterFile) -> Self {
        CodeBuilder {
            registers,
            ..Self::default()
        }
    }

    /// Append an empty block and return its ID.
    pub fn add_block(&mut self) -> BlockId {
        let id = BlockId::new(
            u32::try_from(self.blocks.len())
                .unwrap_or_else(|_| panic!("block count exceeds u32::MAX")),
        );
        self.blocks.push(BlockBuilder::default());
        id
    }

    /// Allocate a fresh virtual temp in `bank`.
    pub fn new_tmp(&mut self, bank: Bank) -> Tmp {
        let count = &mut self.num_tmps[bank.index()];
        let index = *count;
        *count = count
            .checked_add(1)
            .unwrap_or_else(|| panic!("{bank} temp count exceeds u32::MAX"));
        Tmp::Virtual { bank, index }
    }

    pub fn add_stack_slot(&mut self, byte_size: u32, kind: StackSlotKind) -> StackSlotId {
        let id = StackSlotId::new(
            u32::try_from(self.stack_slots.len())
                .unwrap_or_else(|_| panic!("stack slot count exceeds u32::MAX")),
        );
        self.stack_slots.push(StackSlotData { byte_size, kind });
        id
    }

    /// Append `inst` to the end of `block`.
    pub fn push(&mut self, block: BlockId, inst: Inst) {
        self.blocks[block.index()].insts.push(inst);
    }

    /// Record a control-flow edge `from → to`. Edge order is kept; the
    /// target does not need to exist yet.
    pub fn add_successor(&mut self, from: BlockId, to: BlockId) {
        self.blocks[from.index()].successors.push(to);
    }

    /// Validate and freeze.
    ///
    /// Predecessor lists are deduplicated: a branch whose two arms target
    /// the same block contributes one predecessor entry.
    pub fn finish(self) -> Result<Code, CodeError> {
        let num_blocks = self.blocks.len();

        for (block_idx, block) in self.blocks.iter().enumerate() {
            self.check_block(block_id(block_idx), block, num_blocks)?;
        }

        let mut predecessors: Vec<SmallVec<[BlockId; 4]>> = vec![SmallVec::new(); num_blocks];
        for (block_idx, block) in self.blocks.iter().enumerate() {
            let mut seen = FxHashSet::default();
            for &succ in &block.successors {
                if seen.insert(succ) {
                    predecessors[succ.index()].push(block_id(block_idx));
                }
            }
        }

        let blocks: Vec<Block> = self
            .blocks
            .into_iter()
            .zip(predecessors)
            .enumerate()
            .map(|(block_idx, (block, predecessors))| Block {
                id: block_id(block_idx),
                insts: block.insts,
                successors: block.successors,
                predecessors,
            })
            .collect();

        tracing::trace!(
            num_blocks,
            gp_tmps = self.num_tmps[Bank::Gp.index()],
            fp_tmps = self.num_tmps[Bank::Fp.index()],
            stack_slots = self.stack_slots.len(),
            "code finished"
        );

        Ok(Code {
            blocks,
            num_tmps: self.num_tmps,
            stack_slots: self.stack_slots,
            registers: self.registers,
        })
    }

    fn check_block(
        &self,
        id: BlockId,
        block: &BlockBuilder,
        num_blocks: usize,
    ) -> Result<(), CodeError> {
        let Some(last) = block.insts.last() else {
            return Err(CodeError::EmptyBlock { block: id });
        };
        if !last.is_terminal() {
            return Err(CodeError::MissingTerminator {
                block: id,
                opcode: last.opcode,
            });
        }
        if let Some(expected) = last.opcode.num_successors() {
            if expected != block.successors.len() {
                return Err(CodeError::SuccessorCount {
                    block: id,
                    opcode: last.opcode,
                    expected,
                    found: block.successors.len(),
                });
            }
        }
        for &successor in &block.successors {
            if successor.index() >= num_blocks {
                return Err(CodeError::SuccessorOutOfRange {
                    block: id,
                    successor,
                    num_blocks,
                });
            }
        }

        for (inst_idx, inst) in block.insts.iter().enumerate() {
            if inst.is_terminal() && inst_idx + 1 != block.insts.len() {
                return Err(CodeError::TerminatorNotLast {
                    block: id,
                    inst: inst_idx,
                    opcode: inst.opcode,
                });
            }
            for operand in &inst.args {
                match operand.arg {
                    Arg::Tmp(tmp) => {
                        if tmp.bank() != operand.bank {
                            return Err(CodeError::BankMismatch {
                                block: id,
                                inst: inst_idx,
                                tmp,
                                operand_bank: operand.bank,
                            });
                        }
                        self.check_tmp(id, inst_idx, tmp)?;
                    }
                    Arg::Addr { base, .. } => {
                        if base.bank() != Bank::Gp {
                            return Err(CodeError::NonGpAddressBase {
                                block: id,
                                inst: inst_idx,
                                base,
                            });
                        }
                        self.check_tmp(id, inst_idx, base)?;
                    }
                    Arg::Stack(slot) => {
                        if slot.index() >= self.stack_slots.len() {
                            return Err(CodeError::StackSlotOutOfRange {
                                block: id,
                                inst: inst_idx,
                                slot,
                                count: self.stack_slots.len(),
                            });
                        }
                    }
                    Arg::Imm(_) => {}
                }
            }
        }
        Ok(())
    }

    fn check_tmp(&self, block: BlockId, inst: usize, tmp: Tmp) -> Result<(), CodeError> {
        match tmp {
            Tmp::Reg(reg) => {
                let count = self.registers.count(reg.bank());
                if u32::from(reg.num()) >= count {
                    return Err(CodeError::RegisterOutOfRange {
                        block,
                        inst,
                        tmp,
                        count,
                    });
                }
            }
            Tmp::Virtual { bank, index } => {
                let count = self.num_tmps[bank.index()];
                if index >= count {
                    return Err(CodeError::TmpOutOfRange {
                        block,
                        inst,
                        tmp,
                        count,
                    });
                }
            }
        }
        Ok(())
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "add_block caps the block count at u32::MAX"
)]
fn block_id(index: usize) -> BlockId {
    BlockId::new(index as u32)
}
