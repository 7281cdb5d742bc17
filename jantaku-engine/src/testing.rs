//! Fixtures shared by test suites. Generating the shanten table takes a few
//! seconds, so every test in a process reuses one copy.

use std::sync::{Arc, OnceLock};

use crate::hand_evaluator::HandEvaluator;
use crate::shanten_table::ShantenTable;

static TABLE: OnceLock<Arc<ShantenTable>> = OnceLock::new();

pub fn shared_table() -> Arc<ShantenTable> {
    TABLE
        .get_or_init(|| Arc::new(ShantenTable::generate()))
        .clone()
}

pub fn shared_evaluator() -> HandEvaluator {
    HandEvaluator::new(shared_table())
}
