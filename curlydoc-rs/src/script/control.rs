//! Conditional-chain state.
//!
//! `if{..} and{..} or{..} then{..} else{..}` are ordinary sibling calls, so
//! the outcome of the chain so far has to live somewhere between them.  Each
//! nested chain gets its own [`ControlRecord`]; the interpreter pushes a fresh
//! record around every condition operand and every branch body so that a
//! chain used *inside* those cannot clobber the enclosing one.

/// State of one conditional chain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControlRecord {
    /// Outcome of the most recent condition.
    pub flag: bool,
    /// An `or` already saw a true chain; later `and`s must not run.
    pub true_before_or: bool,
}

/// Stack of [`ControlRecord`]s: the base record of the evaluation pass plus
/// one record per open nesting.
#[derive(Debug, Clone, Default)]
pub struct ControlStack {
    base: ControlRecord,
    nested: Vec<ControlRecord>,
}

impl ControlStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self) {
        self.nested.push(ControlRecord::default());
    }

    /// Pop the innermost record; the base record stays.
    pub fn pop(&mut self) {
        self.nested.pop();
    }

    #[cfg(test)]
    pub(crate) fn depth(&self) -> usize {
        self.nested.len() + 1
    }

    pub fn current(&self) -> ControlRecord {
        *self.nested.last().unwrap_or(&self.base)
    }

    fn current_mut(&mut self) -> &mut ControlRecord {
        self.nested.last_mut().unwrap_or(&mut self.base)
    }

    // ── Transitions ───────────────────────────────────────────────────────────

    /// `if`: start a new chain with the condition's truth.
    pub fn begin(&mut self, truth: bool) {
        *self.current_mut() = ControlRecord {
            flag: truth,
            true_before_or: false,
        };
    }

    /// Whether an `and` operand has to be evaluated.
    pub fn and_needs_operand(&self) -> bool {
        let r = self.current();
        r.flag && !r.true_before_or
    }

    /// Record the truth of an evaluated `and` or `or` operand.
    pub fn set_flag(&mut self, truth: bool) {
        self.current_mut().flag = truth;
    }

    /// Whether an `or` operand has to be evaluated.  When the chain is
    /// already true this marks it so following `and`s are skipped.
    pub fn or_needs_operand(&mut self) -> bool {
        let r = self.current_mut();
        if r.flag {
            r.true_before_or = true;
            false
        } else {
            true
        }
    }

    /// Whether a `then` branch runs.
    pub fn takes_then(&self) -> bool {
        self.current().flag
    }

    /// Whether an `else` branch runs.
    pub fn takes_else(&self) -> bool {
        !self.current().flag
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
