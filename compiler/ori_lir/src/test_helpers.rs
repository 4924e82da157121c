//! Shared test utilities for the IR and liveness tests.
//!
//! Only compiled in test builds.

use std::sync::Once;

use crate::ir::{Code, CodeBuilder, Operand, Role, Tmp};

static TRACING_INIT: Once = Once::new();

/// Install a test-writer subscriber when `RUST_LOG` is set.
///
/// `RUST_LOG=ori_lir=trace cargo test -p ori_lir` shows every block visit.
pub(crate) fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let _ = tracing_subscriber::registry()
                .with(fmt::layer().with_test_writer().with_target(true))
                .with(EnvFilter::from_default_env())
                .try_init();
        }
    });
}

/// Finish `builder`, failing the test with the validation error.
pub(crate) fn build(builder: CodeBuilder) -> Code {
    match builder.finish() {
        Ok(code) => code,
        Err(err) => panic!("test code is malformed: {err}"),
    }
}

/// Shorthand for `Operand::tmp(tmp, Role::Def)`.
pub(crate) fn def(tmp: Tmp) -> Operand {
    Operand::tmp(tmp, Role::Def)
}

/// Shorthand for `Operand::tmp(tmp, Role::EarlyUse)`.
pub(crate) fn early(tmp: Tmp) -> Operand {
    Operand::tmp(tmp, Role::EarlyUse)
}

/// Shorthand for `Operand::tmp(tmp, Role::LateUse)`.
pub(crate) fn late(tmp: Tmp) -> Operand {
    Operand::tmp(tmp, Role::LateUse)
}

/// Collect and sort, so set comparisons don't depend on iteration order.
pub(crate) fn sorted<T: Ord>(items: impl IntoIterator<Item = T>) -> Vec<T> {
    let mut items: Vec<T> = items.into_iter().collect();
    items.sort();
    items
}
