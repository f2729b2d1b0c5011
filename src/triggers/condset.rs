//! Condition groups

use super::{Condition, ConditionType};

/// An ordered AND-group of conditions: the core group or one alt group
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConditionGroup {
    conditions: Vec<Condition>,
    /// Conditions evaluated in the pause pass: each PauseIf plus the
    /// combining conditions that lead into it
    pause_mask: Vec<bool>,
}

impl ConditionGroup {
    pub fn new(conditions: Vec<Condition>) -> Self {
        let mut pause_mask = vec![false; conditions.len()];
        let mut in_chain = false;
        for (i, cond) in conditions.iter().enumerate().rev() {
            if cond.condition_type == ConditionType::PauseIf {
                in_chain = true;
            } else if !cond.condition_type.is_combining() {
                in_chain = false;
            }
            pause_mask[i] = in_chain;
        }

        Self {
            conditions,
            pause_mask,
        }
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn get(&self, index: usize) -> Option<&Condition> {
        self.conditions.get(index)
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn has_pause(&self) -> bool {
        self.pause_mask.iter().any(|&p| p)
    }

    /// Range of the AddAddress conditions directly preceding `index`
    pub fn indirect_chain(&self, index: usize) -> std::ops::Range<usize> {
        let end = index.min(self.conditions.len());
        let start = self.conditions[..end]
            .iter()
            .rposition(|c| c.condition_type != ConditionType::AddAddress)
            .map_or(0, |i| i + 1);
        start..end
    }

    pub fn reset_hits(&mut self) {
        for cond in &mut self.conditions {
            cond.current_hits = 0;
        }
    }

    pub(crate) fn conditions_mut(&mut self) -> &mut [Condition] {
        &mut self.conditions
    }

    pub(crate) fn iter_mut_with_pause_mask(&mut self) -> impl Iterator<Item = (&mut Condition, bool)> {
        self.conditions
            .iter_mut()
            .zip(self.pause_mask.iter().copied())
    }
}
