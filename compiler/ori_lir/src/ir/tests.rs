use pretty_assertions::assert_eq;

use super::*;
use crate::test_helpers::{build, def, early, late};

// ── Roles ───────────────────────────────────────────────────────

#[test]
fn role_predicates() {
    let cases = [
        (Role::EarlyUse, true, false, false),
        (Role::LateUse, false, true, false),
        (Role::Def, false, false, true),
        (Role::UseDef, true, false, true),
        (Role::Scratch, false, true, true),
    ];
    for (role, early_use, late_use, is_def) in cases {
        assert_eq!(role.is_early_use(), early_use, "{role:?}");
        assert_eq!(role.is_late_use(), late_use, "{role:?}");
        assert_eq!(role.is_def(), is_def, "{role:?}");
    }
}

// ── Operand iteration ───────────────────────────────────────────

#[test]
fn for_each_tmp_reports_address_base_as_early_use() {
    let inst = Inst::new(
        Opcode::Store,
        [
            Operand::tmp(Tmp::fp(0), Role::EarlyUse),
            Operand::addr(Tmp::gp(4), 8, Role::Def, Bank::Fp),
        ],
    );

    let mut seen = Vec::new();
    inst.for_each_tmp(|tmp, role, bank| seen.push((tmp, role, bank)));

    assert_eq!(
        seen,
        vec![
            (Tmp::fp(0), Role::EarlyUse, Bank::Fp),
            (Tmp::gp(4), Role::EarlyUse, Bank::Gp),
        ]
    );
}

#[test]
fn for_each_stack_slot_skips_temps_and_immediates() {
    let slot = StackSlotId::new(2);
    let inst = Inst::new(
        Opcode::Move,
        [
            Operand::imm(7),
            Operand::stack(slot, Role::Def, Bank::Fp),
            Operand::tmp(Tmp::gp(0), Role::EarlyUse),
        ],
    );

    let mut seen = Vec::new();
    inst.for_each_stack_slot(|slot, role, bank| seen.push((slot, role, bank)));

    assert_eq!(seen, vec![(slot, Role::Def, Bank::Fp)]);
}

// ── Display ─────────────────────────────────────────────────────

#[test]
fn inst_display() {
    let inst = Inst::new(
        Opcode::Add,
        [
            early(Tmp::gp(1)),
            Operand::imm(-3),
            late(Tmp::reg(Bank::Gp, 5)),
            def(Tmp::gp(2)),
        ],
    );
    assert_eq!(inst.to_string(), "add %tmp1, $-3, %r5:late, %tmp2:def");

    let load = Inst::new(
        Opcode::Load,
        [
            Operand::addr(Tmp::gp(0), -16, Role::EarlyUse, Bank::Fp),
            def(Tmp::fp(3)),
        ],
    );
    assert_eq!(load.to_string(), "load -16(%tmp0), %ftmp3:def");
}

#[test]
fn code_display_lists_edges() {
    let mut builder = CodeBuilder::new();
    let b0 = builder.add_block();
    let b1 = builder.add_block();
    builder.push(b0, Inst::new(Opcode::Jump, []));
    builder.add_successor(b0, b1);
    builder.push(b1, Inst::new(Opcode::Ret, []));
    let code = build(builder);

    assert_eq!(
        code.to_string(),
        "BB#0:\n    jump\n  successors: #1\nBB#1:\n  predecessors: #0\n    ret\n"
    );
}

// ── Builder ─────────────────────────────────────────────────────

#[test]
fn builder_allocates_per_bank_temps() {
    let mut builder = CodeBuilder::new();
    assert_eq!(builder.new_tmp(Bank::Gp), Tmp::gp(0));
    assert_eq!(builder.new_tmp(Bank::Fp), Tmp::fp(0));
    assert_eq!(builder.new_tmp(Bank::Gp), Tmp::gp(1));

    let b0 = builder.add_block();
    builder.push(b0, Inst::new(Opcode::Ret, []));
    let code = build(builder);

    assert_eq!(code.num_tmps(Bank::Gp), 2);
    assert_eq!(code.num_tmps(Bank::Fp), 1);
    assert_eq!(code.num_regs(Bank::Gp), 32);
}

#[test]
fn builder_deduplicates_predecessors() {
    // b0: branch to b1 on both arms
    // b1: ret
    let mut builder = CodeBuilder::new();
    let b0 = builder.add_block();
    let b1 = builder.add_block();
    builder.push(b0, Inst::new(Opcode::Branch, []));
    builder.add_successor(b0, b1);
    builder.add_successor(b0, b1);
    builder.push(b1, Inst::new(Opcode::Ret, []));
    let code = build(builder);

    assert_eq!(code.block(b0).successors(), &[b1, b1]);
    assert_eq!(code.block(b1).predecessors(), &[b0]);
    assert!(code.block(b0).predecessors().is_empty());
}

#[test]
fn builder_records_loop_predecessors_in_block_order() {
    // b0 → b1, b1 → {b1, b2}, b2: ret
    let mut builder = CodeBuilder::new();
    let b0 = builder.add_block();
    let b1 = builder.add_block();
    let b2 = builder.add_block();
    builder.push(b0, Inst::new(Opcode::Jump, []));
    builder.add_successor(b0, b1);
    builder.push(b1, Inst::new(Opcode::Branch, []));
    builder.add_successor(b1, b1);
    builder.add_successor(b1, b2);
    builder.push(b2, Inst::new(Opcode::Ret, []));
    let code = build(builder);

    assert_eq!(code.block(b1).predecessors(), &[b0, b1]);
    assert_eq!(code.block(b2).predecessors(), &[b1]);
}

#[test]
fn builder_rejects_empty_block() {
    let mut builder = CodeBuilder::new();
    let b0 = builder.add_block();
    assert_eq!(
        builder.finish(),
        Err(CodeError::EmptyBlock { block: b0 })
    );
}

#[test]
fn builder_rejects_missing_terminator() {
    let mut builder = CodeBuilder::new();
    let b0 = builder.add_block();
    builder.push(b0, Inst::new(Opcode::Nop, []));
    assert_eq!(
        builder.finish(),
        Err(CodeError::MissingTerminator {
            block: b0,
            opcode: Opcode::Nop,
        })
    );
}

#[test]
fn builder_rejects_terminator_in_middle() {
    let mut builder = CodeBuilder::new();
    let b0 = builder.add_block();
    builder.push(b0, Inst::new(Opcode::Oops, []));
    builder.push(b0, Inst::new(Opcode::Ret, []));
    assert_eq!(
        builder.finish(),
        Err(CodeError::TerminatorNotLast {
            block: b0,
            inst: 0,
            opcode: Opcode::Oops,
        })
    );
}

#[test]
fn builder_rejects_wrong_successor_count() {
    let mut builder = CodeBuilder::new();
    let b0 = builder.add_block();
    builder.push(b0, Inst::new(Opcode::Jump, []));
    assert_eq!(
        builder.finish(),
        Err(CodeError::SuccessorCount {
            block: b0,
            opcode: Opcode::Jump,
            expected: 1,
            found: 0,
        })
    );
}

#[test]
fn builder_rejects_dangling_successor() {
    let mut builder = CodeBuilder::new();
    let b0 = builder.add_block();
    builder.push(b0, Inst::new(Opcode::Jump, []));
    builder.add_successor(b0, BlockId::new(7));
    let err = builder.finish();
    assert_eq!(
        err,
        Err(CodeError::SuccessorOutOfRange {
            block: b0,
            successor: BlockId::new(7),
            num_blocks: 1,
        })
    );
}

#[test]
fn builder_rejects_unallocated_tmp() {
    let mut builder = CodeBuilder::new();
    let b0 = builder.add_block();
    builder.push(b0, Inst::new(Opcode::Ret, [early(Tmp::gp(0))]));
    assert_eq!(
        builder.finish(),
        Err(CodeError::TmpOutOfRange {
            block: b0,
            inst: 0,
            tmp: Tmp::gp(0),
            count: 0,
        })
    );
}

#[test]
fn builder_rejects_register_beyond_register_file() {
    let mut builder = CodeBuilder::with_registers(RegisterFile { gp: 4, fp: 2 });
    let b0 = builder.add_block();
    builder.push(b0, Inst::new(Opcode::Ret, [early(Tmp::reg(Bank::Fp, 2))]));
    assert_eq!(
        builder.finish(),
        Err(CodeError::RegisterOutOfRange {
            block: b0,
            inst: 0,
            tmp: Tmp::reg(Bank::Fp, 2),
            count: 2,
        })
    );
}

#[test]
fn builder_rejects_bank_mismatch() {
    let mut builder = CodeBuilder::new();
    let t = builder.new_tmp(Bank::Gp);
    let b0 = builder.add_block();
    builder.push(
        b0,
        Inst::new(
            Opcode::Ret,
            [Operand::new(Arg::Tmp(t), Role::EarlyUse, Bank::Fp)],
        ),
    );
    assert_eq!(
        builder.finish(),
        Err(CodeError::BankMismatch {
            block: b0,
            inst: 0,
            tmp: t,
            operand_bank: Bank::Fp,
        })
    );
}

#[test]
fn builder_rejects_fp_address_base() {
    let mut builder = CodeBuilder::new();
    let f = builder.new_tmp(Bank::Fp);
    let b0 = builder.add_block();
    builder.push(
        b0,
        Inst::new(Opcode::Ret, [Operand::addr(f, 0, Role::EarlyUse, Bank::Gp)]),
    );
    assert_eq!(
        builder.finish(),
        Err(CodeError::NonGpAddressBase {
            block: b0,
            inst: 0,
            base: f,
        })
    );
}

#[test]
fn builder_rejects_unallocated_stack_slot() {
    let mut builder = CodeBuilder::new();
    builder.add_stack_slot(8, StackSlotKind::Spill);
    let b0 = builder.add_block();
    builder.push(
        b0,
        Inst::new(
            Opcode::Ret,
            [Operand::stack(StackSlotId::new(1), Role::EarlyUse, Bank::Gp)],
        ),
    );
    assert_eq!(
        builder.finish(),
        Err(CodeError::StackSlotOutOfRange {
            block: b0,
            inst: 0,
            slot: StackSlotId::new(1),
            count: 1,
        })
    );
}

#[test]
fn code_error_messages() {
    let err = CodeError::SuccessorCount {
        block: BlockId::new(3),
        opcode: Opcode::Branch,
        expected: 2,
        found: 1,
    };
    assert_eq!(
        err.to_string(),
        "block #3: `branch` expects 2 successor(s), found 1"
    );

    let err = CodeError::TmpOutOfRange {
        block: BlockId::new(0),
        inst: 4,
        tmp: Tmp::fp(9),
        count: 2,
    };
    assert_eq!(
        err.to_string(),
        "block #0, inst 4: %ftmp9 was never allocated (2 fp temps)"
    );
}
