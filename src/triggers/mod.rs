//! Achievement trigger logic
//!
//! A trigger is a core group of conditions plus optional alt groups, written
//! in a compact text format such as `0xH1234=5.3._R:0xH0010=0S0xH0020>d0xH0020`.
//! This module holds the model, the per-frame evaluator, and the text
//! parser and serializer.

mod condset;
mod evaluator;
mod indirect;
pub mod parser;
pub mod serializer;
mod trigger;
pub(crate) mod types;
mod value;

pub use condset::ConditionGroup;
pub use evaluator::{EvaluationContext, Measurement};
pub use indirect::{resolve_address, resolve_pointer};
pub use parser::{parse_condition, parse_operand, parse_trigger, parse_value, ParseMode};
pub use serializer::{serialize_condition, serialize_operand, serialize_trigger};
pub use trigger::{Trigger, TriggerResult};
pub use types::{Condition, ConditionType, MemoryKind, Operand, OperandKind, Operator};
pub use value::TypedValue;
