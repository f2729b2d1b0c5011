//! Indirect address resolution
//!
//! A run of AddAddress conditions forms a pointer chain. Each step reads its
//! operands relative to the pointer produced by the previous step, applies its
//! modifying operator, and yields the pointer for the next step. The final
//! pointer offsets every memory operand of the condition that follows.
//! Chains are re-resolved every frame because pointer targets move.

use super::evaluator::EvaluationContext;
use super::Condition;

/// Resolve a chain of AddAddress conditions to the pointer it produces.
/// An empty chain resolves to 0.
pub fn resolve_pointer(chain: &[Condition], ctx: &mut EvaluationContext<'_>) -> u32 {
    chain
        .iter()
        .fold(None, |pointer: Option<u32>, cond| {
            let base = cond.refs.indirect.then(|| pointer.unwrap_or(0));
            let (_, _, modified) = ctx.evaluate_operands(cond, base);
            Some(modified.as_u32())
        })
        .unwrap_or(0)
}

/// Effective address read by `cond` once `chain` has been resolved
pub fn resolve_address(chain: &[Condition], cond: &Condition, ctx: &mut EvaluationContext<'_>) -> Option<u32> {
    let offset = cond.source.memory_address()?;
    if chain.is_empty() {
        return Some(offset);
    }
    Some(offset.wrapping_add(resolve_pointer(chain, ctx)))
}
