use super::{Bank, BlockId, Opcode, StackSlotId, Tmp};

/// Why a [`CodeBuilder`](super::CodeBuilder) refused to produce a [`Code`](super::Code).
///
/// Each variant names the block (and instruction, where there is one) that
/// is malformed. These indicate a bug in whatever lowered into this IR.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CodeError {
    #[error("block {block} has no instructions")]
    EmptyBlock { block: BlockId },

    #[error("block {block} does not end in a terminator (found `{opcode}`)")]
    MissingTerminator { block: BlockId, opcode: Opcode },

    #[error("block {block}: terminator `{opcode}` at {inst} is not the last instruction")]
    TerminatorNotLast {
        block: BlockId,
        inst: usize,
        opcode: Opcode,
    },

    #[error("block {block}: `{opcode}` expects {expected} successor(s), found {found}")]
    SuccessorCount {
        block: BlockId,
        opcode: Opcode,
        expected: usize,
        found: usize,
    },

    #[error("block {block} names successor {successor}, but there are only {num_blocks} blocks")]
    SuccessorOutOfRange {
        block: BlockId,
        successor: BlockId,
        num_blocks: usize,
    },

    #[error("block {block}, inst {inst}: {tmp} is in the {tmp_bank} bank but the operand is {operand_bank}", tmp_bank = .tmp.bank())]
    BankMismatch {
        block: BlockId,
        inst: usize,
        tmp: Tmp,
        operand_bank: Bank,
    },

    #[error("block {block}, inst {inst}: address base {base} is not a general-purpose temp")]
    NonGpAddressBase { block: BlockId, inst: usize, base: Tmp },

    #[error("block {block}, inst {inst}: {tmp} was never allocated ({count} {bank} temps)", bank = .tmp.bank())]
    TmpOutOfRange {
        block: BlockId,
        inst: usize,
        tmp: Tmp,
        count: u32,
    },

    #[error("block {block}, inst {inst}: {tmp} does not exist ({count} {bank} registers)", bank = .tmp.bank())]
    RegisterOutOfRange {
        block: BlockId,
        inst: usize,
        tmp: Tmp,
        count: u32,
    },

    #[error("block {block}, inst {inst}: {slot} was never allocated ({count} stack slots)")]
    StackSlotOutOfRange {
        block: BlockId,
        inst: usize,
        slot: StackSlotId,
        count: usize,
    },
}
