use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Active,
    Done,
}

/// Cursor over `len` steps. Positions are 1-based.
#[derive(Debug, Clone)]
pub struct Flow {
    current: usize,
    statuses: Vec<StepStatus>,
}

impl Flow {
    pub fn new(len: usize) -> Self {
        let mut statuses = vec![StepStatus::Pending; len];
        if let Some(first) = statuses.first_mut() {
            *first = StepStatus::Active;
        }
        Self {
            current: 1,
            statuses,
        }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }

    pub fn is_last(&self) -> bool {
        self.current == self.len()
    }

    pub fn has_next(&self) -> bool {
        self.current < self.len()
    }

    pub fn has_previous(&self) -> bool {
        self.current > 1
    }

    pub fn status_at(&self, position: usize) -> StepStatus {
        position
            .checked_sub(1)
            .and_then(|index| self.statuses.get(index))
            .copied()
            .unwrap_or(StepStatus::Pending)
    }

    pub fn statuses(&self) -> &[StepStatus] {
        &self.statuses
    }

    pub fn complete_current(&mut self) {
        self.set_status(self.current, StepStatus::Done);
    }

    /// Marks the current step done and moves forward. Returns `false` at the last step.
    pub fn advance(&mut self) -> bool {
        if !self.has_next() {
            return false;
        }
        self.complete_current();
        self.current += 1;
        self.set_status(self.current, StepStatus::Active);
        true
    }

    /// Moves back one step. Steps already done stay done.
    pub fn retreat(&mut self) -> bool {
        if !self.has_previous() {
            return false;
        }
        if self.status_at(self.current) == StepStatus::Active {
            self.set_status(self.current, StepStatus::Pending);
        }
        self.current -= 1;
        if self.status_at(self.current) != StepStatus::Done {
            self.set_status(self.current, StepStatus::Active);
        }
        true
    }

    /// Jumps back to `position`. It becomes active and every later step pending.
    pub fn rewind_to(&mut self, position: usize) -> bool {
        if position == 0 || position > self.len() {
            return false;
        }
        self.current = position;
        for later in position + 1..=self.len() {
            self.set_status(later, StepStatus::Pending);
        }
        self.set_status(position, StepStatus::Active);
        true
    }

    fn set_status(&mut self, position: usize, status: StepStatus) {
        if let Some(slot) = position
            .checked_sub(1)
            .and_then(|index| self.statuses.get_mut(index))
        {
            *slot = status;
        }
    }
}
