use crate::spec::step::FormSchema;

/// Linear step navigation state. Transitions are unconditional; validation is
/// deferred to submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepNavigator {
    index: usize,
    len: usize,
}

impl StepNavigator {
    /// Starts at the schema's default step, or step 0 when none is marked.
    pub fn new(schema: &FormSchema) -> Self {
        Self {
            index: schema.default_step_index(),
            len: schema.steps.len(),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_last(&self) -> bool {
        self.len == 0 || self.index + 1 == self.len
    }

    /// Advances one step; a no-op on the last step.
    pub fn go_next(&mut self) -> usize {
        if self.index + 1 < self.len {
            self.index += 1;
        }
        self.index
    }

    /// Steps back; a no-op on the first step.
    pub fn go_previous(&mut self) -> usize {
        if self.index > 0 {
            self.index -= 1;
        }
        self.index
    }

    /// Direct selection via step tabs; any in-range step is legal, no
    /// visited-step restriction. Out-of-range indices are ignored.
    pub fn jump_to(&mut self, index: usize) -> usize {
        if index < self.len {
            self.index = index;
        }
        self.index
    }
}
