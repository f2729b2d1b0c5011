//! Per-frame evaluation
//!
//! A group is evaluated as a left-to-right fold over its conditions. Combining
//! conditions (AddSource, AddHits, AndNext, ...) leave their result in a
//! [`Carry`] that the next condition consumes; everything else contributes to
//! the group outcome and clears the carry.

use super::{Condition, ConditionGroup, ConditionType, Operand, TypedValue};
use crate::memory::{decode_bcd, decode_float, invert, read_value, MemRefId, MemRefs, MemoryReader};
use super::types::MemoryKind;

/// Everything an evaluation needs from the outside world
pub struct EvaluationContext<'a> {
    pub reader: &'a dyn MemoryReader,
    pub memrefs: &'a mut MemRefs,
}

impl<'a> EvaluationContext<'a> {
    pub fn new(reader: &'a dyn MemoryReader, memrefs: &'a mut MemRefs) -> Self {
        Self { reader, memrefs }
    }

    /// Evaluate an operand. `base` is the resolved pointer for indirect reads.
    pub fn evaluate_operand(&mut self, operand: &Operand, slot: Option<MemRefId>, base: Option<u32>) -> TypedValue {
        let (kind, size, address) = match *operand {
            Operand::Value(v) => return TypedValue::Unsigned(v),
            Operand::Float(f) => return TypedValue::Float(f),
            Operand::Memory { kind, size, address } => (kind, size, address),
        };

        let tracked = match (slot, base) {
            (Some(id), Some(base)) => self.memrefs.update_indirect(id, self.reader, base),
            (Some(id), None) => self.memrefs.get(id),
            (None, _) => None,
        };

        let (value, delta, prior) = match tracked {
            Some(memref) => (memref.value, memref.delta, memref.prior),
            None => {
                // untracked operands have no history
                let raw = read_value(self.reader, address.wrapping_add(base.unwrap_or(0)), size);
                (raw, raw, raw)
            }
        };

        let raw = match kind {
            MemoryKind::Address | MemoryKind::Bcd | MemoryKind::Inverted => value,
            MemoryKind::Delta => delta,
            MemoryKind::Prior => prior,
        };

        if size.is_float() {
            return TypedValue::Float(decode_float(raw, size));
        }

        TypedValue::Unsigned(match kind {
            MemoryKind::Bcd => decode_bcd(raw, size),
            MemoryKind::Inverted => invert(raw, size),
            _ => raw,
        })
    }

    /// Evaluate both operands of a condition. Returns the source, the target
    /// and the source after any modifying operator.
    pub(crate) fn evaluate_operands(
        &mut self,
        cond: &Condition,
        base: Option<u32>,
    ) -> (TypedValue, Option<TypedValue>, TypedValue) {
        let source = self.evaluate_operand(&cond.source, cond.refs.source, base);
        let target = cond
            .target
            .as_ref()
            .map(|t| self.evaluate_operand(t, cond.refs.target, base));

        let modified = match target {
            Some(t) if cond.operator.is_modifying() => source.modify(cond.operator, t),
            _ => source,
        };
        (source, target, modified)
    }
}

/// Value tracked by a Measured condition
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub value: TypedValue,
    /// Hit target, or the comparison's right side; 0 when unbounded
    pub target: u32,
}

/// Which conditions a pass visits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Pass {
    /// Only PauseIf conditions and the combining conditions leading into them
    PauseChains,
    /// Everything else
    Main,
}

/// Result of evaluating one group for one frame
#[derive(Debug, Clone, Default)]
pub(crate) struct GroupOutcome {
    pub is_true: bool,
    pub is_primed: bool,
    pub is_paused: bool,
    pub was_reset: bool,
    pub measured: Option<Measurement>,
    /// A MeasuredIf failed this frame
    pub measure_blocked: bool,
}

/// State handed from a combining condition to the next one
#[derive(Debug, Default)]
struct Carry {
    add_value: Option<TypedValue>,
    add_address: Option<u32>,
    add_hits: Option<i64>,
    and_next: Option<bool>,
    or_next: Option<bool>,
    reset_next: bool,
}

/// Evaluate one group. Hits are updated in place.
pub(crate) fn evaluate_group(group: &mut ConditionGroup, ctx: &mut EvaluationContext<'_>, pass: Pass) -> GroupOutcome {
    let mut outcome = GroupOutcome {
        is_true: true,
        is_primed: true,
        ..Default::default()
    };
    let mut carry = Carry::default();
    let want_pause = pass == Pass::PauseChains;

    for (cond, in_pause_chain) in group.iter_mut_with_pause_mask() {
        if in_pause_chain != want_pause {
            continue;
        }

        let pointer = carry.add_address.take();
        let base = cond.refs.indirect.then(|| pointer.unwrap_or(0));
        let (source, target, modified) = ctx.evaluate_operands(cond, base);

        match cond.condition_type {
            ConditionType::AddSource => {
                carry.add_value = Some(carry.add_value.unwrap_or_default().wrapping_add(modified));
                continue;
            }
            ConditionType::SubSource => {
                carry.add_value = Some(carry.add_value.unwrap_or_default().wrapping_sub(modified));
                continue;
            }
            ConditionType::AddAddress => {
                carry.add_address = Some(modified.as_u32());
                continue;
            }
            _ => {}
        }

        let accumulated = carry.add_value.take();
        let (value, mut cond_true) = match target {
            Some(t) if cond.operator.is_comparison() => {
                let lhs = accumulated.map_or(source, |acc| acc.wrapping_add(source));
                (lhs, lhs.compare(cond.operator, t))
            }
            _ => {
                let v = accumulated.map_or(modified, |acc| acc.wrapping_add(modified));
                (v, v.is_truthy())
            }
        };

        if let Some(and_next) = carry.and_next.take() {
            cond_true &= and_next;
        }
        if let Some(or_next) = carry.or_next.take() {
            cond_true |= or_next;
        }

        if std::mem::take(&mut carry.reset_next) {
            cond.current_hits = 0;
            cond_true = false;
        } else if cond_true {
            if cond.required_hits == 0 {
                cond.current_hits = cond.current_hits.saturating_add(1);
            } else if cond.current_hits < cond.required_hits {
                cond.current_hits += 1;
                cond_true = cond.current_hits == cond.required_hits;
            }
        } else if cond.current_hits > 0 {
            // true in the past: holds if the target was reached
            cond_true = cond.required_hits > 0 && cond.current_hits == cond.required_hits;
        }

        match cond.condition_type {
            ConditionType::AddHits => {
                *carry.add_hits.get_or_insert(0) += cond.current_hits as i64;
                continue;
            }
            ConditionType::SubHits => {
                *carry.add_hits.get_or_insert(0) -= cond.current_hits as i64;
                continue;
            }
            ConditionType::ResetNextIf => {
                carry.reset_next = cond_true;
                continue;
            }
            ConditionType::AndNext => {
                carry.and_next = Some(cond_true);
                continue;
            }
            ConditionType::OrNext => {
                carry.or_next = Some(cond_true);
                continue;
            }
            _ => {}
        }

        let mut total_hits = cond.current_hits as i64;
        if let Some(add_hits) = carry.add_hits.take() {
            total_hits += add_hits;
            if cond.required_hits > 0 {
                cond_true = total_hits >= cond.required_hits as i64;
            }
        }

        match cond.condition_type {
            ConditionType::PauseIf => {
                if cond_true {
                    outcome.is_paused = true;
                    outcome.is_true = false;
                    return outcome;
                }
                if cond.required_hits == 0 {
                    cond.current_hits = 0;
                }
            }
            ConditionType::ResetIf => {
                if cond_true {
                    outcome.was_reset = true;
                    outcome.is_true = false;
                }
            }
            ConditionType::Trigger => {
                outcome.is_true &= cond_true;
            }
            ConditionType::Measured => {
                let measurement = if cond.required_hits > 0 {
                    Measurement {
                        value: TypedValue::Unsigned(total_hits.clamp(0, u32::MAX as i64) as u32),
                        target: cond.required_hits,
                    }
                } else {
                    Measurement {
                        value,
                        target: match target {
                            Some(t) if cond.operator.is_comparison() => t.as_u32(),
                            _ => 0,
                        },
                    }
                };
                outcome.measured = Some(measurement);
                outcome.is_true &= cond_true;
                outcome.is_primed &= cond_true;
            }
            ConditionType::MeasuredIf => {
                if !cond_true {
                    outcome.measure_blocked = true;
                }
                outcome.is_true &= cond_true;
                outcome.is_primed &= cond_true;
            }
            _ => {
                outcome.is_true &= cond_true;
                outcome.is_primed &= cond_true;
            }
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemSize, MemoryBlock};
    use crate::triggers::Operator;

    #[test]
    fn test_evaluate_operand_kinds() {
        let mut mem = MemoryBlock::new(4);
        let mut memrefs = MemRefs::new();
        let slot = memrefs.alloc(1, MemSize::EightBit);

        mem.write_u8(1, 0x21);
        memrefs.update(&mem);
        mem.write_u8(1, 0x0F);
        memrefs.update(&mem);

        let mut ctx = EvaluationContext::new(&mem, &mut memrefs);
        let op = |kind| Operand::memory(kind, MemSize::EightBit, 1);
        assert_eq!(ctx.evaluate_operand(&op(MemoryKind::Address), Some(slot), None), TypedValue::Unsigned(0x0F));
        assert_eq!(ctx.evaluate_operand(&op(MemoryKind::Delta), Some(slot), None), TypedValue::Unsigned(0x21));
        assert_eq!(ctx.evaluate_operand(&op(MemoryKind::Inverted), Some(slot), None), TypedValue::Unsigned(0xF0));
        assert_eq!(ctx.evaluate_operand(&Operand::Float(1.5), None, None), TypedValue::Float(1.5));
    }

    #[test]
    fn test_bcd_operand() {
        let mem = MemoryBlock::from_bytes(vec![0x00, 0x21]);
        let mut memrefs = MemRefs::new();
        let mut ctx = EvaluationContext::new(&mem, &mut memrefs);
        let op = Operand::memory(MemoryKind::Bcd, MemSize::EightBit, 1);
        assert_eq!(ctx.evaluate_operand(&op, None, None), TypedValue::Unsigned(21));
    }

    #[test]
    fn test_modifying_operator_feeds_value() {
        let mem = MemoryBlock::from_bytes(vec![0x00, 0x06]);
        let mut memrefs = MemRefs::new();
        let mut ctx = EvaluationContext::new(&mem, &mut memrefs);
        let cond = Condition::new(Operand::address(MemSize::EightBit, 1))
            .with_operator(Operator::Multiply, Operand::Value(3));
        let (source, target, modified) = ctx.evaluate_operands(&cond, None);
        assert_eq!(source, TypedValue::Unsigned(6));
        assert_eq!(target, Some(TypedValue::Unsigned(3)));
        assert_eq!(modified, TypedValue::Unsigned(18));
    }
}
