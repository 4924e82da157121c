//! Entity universes for liveness.
//!
//! A [`LivenessAdapter`] decides which operands an analysis tracks and maps
//! each tracked entity to a dense index in `[0, max_index)`. The fixpoint
//! in [`Liveness`](super::Liveness) only ever sees those indices.

use std::fmt;
use std::marker::PhantomData;

use crate::ir::{Bank, Code, Inst, Reg, Role, StackSlotId, Tmp};

/// Policy object defining one entity universe.
pub trait LivenessAdapter {
    /// The entity type tracked by this universe.
    type Thing: Copy + fmt::Debug;

    /// Short universe name for log output.
    const NAME: &'static str;

    fn new(code: &Code) -> Self;

    /// Number of addressable entities; every index is below this.
    fn max_index(&self) -> usize;

    /// Whether an operand of `bank` belongs to this universe.
    fn accepts_bank(&self, bank: Bank) -> bool;

    /// Dense index of `thing`. Panics if `thing` is outside the universe.
    fn value_to_index(&self, thing: Self::Thing) -> usize;

    /// Inverse of [`value_to_index`](Self::value_to_index).
    fn index_to_value(&self, index: usize) -> Self::Thing;

    /// Visit every entity of this kind that `inst` mentions, with its role
    /// and bank. Callers filter by [`accepts_bank`](Self::accepts_bank).
    fn for_each_thing(inst: &Inst, f: impl FnMut(Self::Thing, Role, Bank));
}

// ── Temporaries ─────────────────────────────────────────────────────

/// Type-level register bank, selecting a [`TmpLivenessAdapter`] universe.
pub trait BankKind {
    const BANK: Bank;
    const NAME: &'static str;
}

/// General-purpose bank marker.
pub struct GpBank;

/// Floating-point bank marker.
pub struct FpBank;

impl BankKind for GpBank {
    const BANK: Bank = Bank::Gp;
    const NAME: &'static str = "gp";
}

impl BankKind for FpBank {
    const BANK: Bank = Bank::Fp;
    const NAME: &'static str = "fp";
}

/// Temporaries of one bank.
///
/// Canonical numbering: physical registers take `[0, num_regs)`, virtual
/// temp `n` takes `num_regs + n`.
pub struct TmpLivenessAdapter<B> {
    num_regs: usize,
    max_index: usize,
    _bank: PhantomData<B>,
}

impl<B> fmt::Debug for TmpLivenessAdapter<B>
where
    B: BankKind,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TmpLivenessAdapter")
            .field("bank", &B::BANK)
            .field("num_regs", &self.num_regs)
            .field("max_index", &self.max_index)
            .finish()
    }
}

pub type GpTmpAdapter = TmpLivenessAdapter<GpBank>;
pub type FpTmpAdapter = TmpLivenessAdapter<FpBank>;

impl<B: BankKind> LivenessAdapter for TmpLivenessAdapter<B> {
    type Thing = Tmp;

    const NAME: &'static str = B::NAME;

    fn new(code: &Code) -> Self {
        let num_regs = code.num_regs(B::BANK) as usize;
        TmpLivenessAdapter {
            num_regs,
            max_index: num_regs + code.num_tmps(B::BANK) as usize,
            _bank: PhantomData,
        }
    }

    #[inline]
    fn max_index(&self) -> usize {
        self.max_index
    }

    #[inline]
    fn accepts_bank(&self, bank: Bank) -> bool {
        bank == B::BANK
    }

    fn value_to_index(&self, tmp: Tmp) -> usize {
        assert_eq!(
            tmp.bank(),
            B::BANK,
            "{tmp} does not belong to the {} liveness universe",
            B::NAME,
        );
        let index = match tmp {
            Tmp::Reg(reg) => {
                assert!(reg.index() < self.num_regs, "{tmp} is not a register");
                reg.index()
            }
            Tmp::Virtual { index, .. } => self.num_regs + index as usize,
        };
        assert!(
            index < self.max_index,
            "{tmp} is out of range ({} entities)",
            self.max_index,
        );
        index
    }

    fn index_to_value(&self, index: usize) -> Tmp {
        assert!(
            index < self.max_index,
            "index {index} is out of range ({} entities)",
            self.max_index,
        );
        if index < self.num_regs {
            #[expect(
                clippy::cast_possible_truncation,
                reason = "num_regs comes from a u8 register count"
            )]
            let num = index as u8;
            Tmp::Reg(Reg::new(B::BANK, num))
        } else {
            #[expect(
                clippy::cast_possible_truncation,
                reason = "virtual temp counts are u32"
            )]
            let index = (index - self.num_regs) as u32;
            Tmp::Virtual {
                bank: B::BANK,
                index,
            }
        }
    }

    #[inline]
    fn for_each_thing(inst: &Inst, f: impl FnMut(Tmp, Role, Bank)) {
        inst.for_each_tmp(f);
    }
}

// ── Stack slots ─────────────────────────────────────────────────────

/// Abstract stack slots, whatever bank the stored value has.
///
/// A slot's index is its own ordinal.
#[derive(Debug)]
pub struct StackSlotLivenessAdapter {
    num_slots: usize,
}

impl LivenessAdapter for StackSlotLivenessAdapter {
    type Thing = StackSlotId;

    const NAME: &'static str = "stack";

    fn new(code: &Code) -> Self {
        StackSlotLivenessAdapter {
            num_slots: code.stack_slots().len(),
        }
    }

    #[inline]
    fn max_index(&self) -> usize {
        self.num_slots
    }

    #[inline]
    fn accepts_bank(&self, _bank: Bank) -> bool {
        true
    }

    fn value_to_index(&self, slot: StackSlotId) -> usize {
        assert!(
            slot.index() < self.num_slots,
            "{slot} is out of range ({} stack slots)",
            self.num_slots,
        );
        slot.index()
    }

    fn index_to_value(&self, index: usize) -> StackSlotId {
        assert!(
            index < self.num_slots,
            "index {index} is out of range ({} stack slots)",
            self.num_slots,
        );
        #[expect(
            clippy::cast_possible_truncation,
            reason = "stack slot counts are u32"
        )]
        let raw = index as u32;
        StackSlotId::new(raw)
    }

    #[inline]
    fn for_each_thing(inst: &Inst, f: impl FnMut(StackSlotId, Role, Bank)) {
        inst.for_each_stack_slot(f);
    }
}
