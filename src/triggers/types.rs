//! Condition and operand definitions

use crate::memory::{MemRefId, MemSize};
use crate::notes::CodeNoteLookup;

/// How a condition participates in its group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConditionType {
    #[default]
    Standard,
    PauseIf,
    ResetIf,
    ResetNextIf,
    AddSource,
    SubSource,
    AddHits,
    SubHits,
    AndNext,
    OrNext,
    Measured,
    MeasuredIf,
    AddAddress,
    Trigger,
}

impl ConditionType {
    pub const ALL: [ConditionType; 14] = [
        ConditionType::Standard,
        ConditionType::PauseIf,
        ConditionType::ResetIf,
        ConditionType::ResetNextIf,
        ConditionType::AddSource,
        ConditionType::SubSource,
        ConditionType::AddHits,
        ConditionType::SubHits,
        ConditionType::AndNext,
        ConditionType::OrNext,
        ConditionType::Measured,
        ConditionType::MeasuredIf,
        ConditionType::AddAddress,
        ConditionType::Trigger,
    ];

    /// Letter written before the `:` in the text format
    pub fn prefix(&self) -> Option<char> {
        match self {
            ConditionType::Standard => None,
            ConditionType::PauseIf => Some('P'),
            ConditionType::ResetIf => Some('R'),
            ConditionType::ResetNextIf => Some('Z'),
            ConditionType::AddSource => Some('A'),
            ConditionType::SubSource => Some('B'),
            ConditionType::AddHits => Some('C'),
            ConditionType::SubHits => Some('D'),
            ConditionType::AndNext => Some('N'),
            ConditionType::OrNext => Some('O'),
            ConditionType::Measured => Some('M'),
            ConditionType::MeasuredIf => Some('Q'),
            ConditionType::AddAddress => Some('I'),
            ConditionType::Trigger => Some('T'),
        }
    }

    pub fn from_prefix(c: char) -> Option<Self> {
        let t = match c.to_ascii_uppercase() {
            'P' => ConditionType::PauseIf,
            'R' => ConditionType::ResetIf,
            'Z' => ConditionType::ResetNextIf,
            'A' => ConditionType::AddSource,
            'B' => ConditionType::SubSource,
            'C' => ConditionType::AddHits,
            'D' => ConditionType::SubHits,
            'N' => ConditionType::AndNext,
            'O' => ConditionType::OrNext,
            'M' => ConditionType::Measured,
            'Q' => ConditionType::MeasuredIf,
            'I' => ConditionType::AddAddress,
            'T' => ConditionType::Trigger,
            _ => return None,
        };
        Some(t)
    }

    /// Whether conditions of this type track hits
    pub fn has_hits(&self) -> bool {
        !self.is_modifier()
    }

    /// Accumulators that only produce a value for the next condition
    pub fn is_modifier(&self) -> bool {
        matches!(
            self,
            ConditionType::AddSource | ConditionType::SubSource | ConditionType::AddAddress
        )
    }

    /// Types whose result feeds the next condition instead of the group
    pub fn is_combining(&self) -> bool {
        matches!(
            self,
            ConditionType::AddSource
                | ConditionType::SubSource
                | ConditionType::AddHits
                | ConditionType::SubHits
                | ConditionType::AndNext
                | ConditionType::OrNext
                | ConditionType::ResetNextIf
                | ConditionType::AddAddress
        )
    }

    pub fn description(&self) -> &'static str {
        match self {
            ConditionType::Standard => "",
            ConditionType::PauseIf => "Pause If",
            ConditionType::ResetIf => "Reset If",
            ConditionType::ResetNextIf => "Reset Next If",
            ConditionType::AddSource => "Add Source",
            ConditionType::SubSource => "Sub Source",
            ConditionType::AddHits => "Add Hits",
            ConditionType::SubHits => "Sub Hits",
            ConditionType::AndNext => "And Next",
            ConditionType::OrNext => "Or Next",
            ConditionType::Measured => "Measured",
            ConditionType::MeasuredIf => "Measured If",
            ConditionType::AddAddress => "Add Address",
            ConditionType::Trigger => "Trigger",
        }
    }
}

/// Operator between source and target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Operator {
    #[default]
    None,
    Equals,
    NotEquals,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    Multiply,
    Divide,
    BitwiseAnd,
}

impl Operator {
    pub const ALL: [Operator; 10] = [
        Operator::Equals,
        Operator::NotEquals,
        Operator::LessThan,
        Operator::LessThanOrEqual,
        Operator::GreaterThan,
        Operator::GreaterThanOrEqual,
        Operator::None,
        Operator::Multiply,
        Operator::Divide,
        Operator::BitwiseAnd,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::None => "",
            Operator::Equals => "=",
            Operator::NotEquals => "!=",
            Operator::LessThan => "<",
            Operator::LessThanOrEqual => "<=",
            Operator::GreaterThan => ">",
            Operator::GreaterThanOrEqual => ">=",
            Operator::Multiply => "*",
            Operator::Divide => "/",
            Operator::BitwiseAnd => "&",
        }
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            Operator::Equals
                | Operator::NotEquals
                | Operator::LessThan
                | Operator::LessThanOrEqual
                | Operator::GreaterThan
                | Operator::GreaterThanOrEqual
        )
    }

    pub fn is_modifying(&self) -> bool {
        matches!(self, Operator::Multiply | Operator::Divide | Operator::BitwiseAnd)
    }

    /// Compare two values. Non-comparison operators never hold.
    pub fn evaluate<T: PartialOrd>(&self, a: &T, b: &T) -> bool {
        match self {
            Operator::Equals => a == b,
            Operator::NotEquals => a != b,
            Operator::LessThan => a < b,
            Operator::LessThanOrEqual => a <= b,
            Operator::GreaterThan => a > b,
            Operator::GreaterThanOrEqual => a >= b,
            _ => false,
        }
    }
}

/// Which generation of a memory location an operand reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MemoryKind {
    #[default]
    Address,
    Delta,
    Prior,
    Bcd,
    Inverted,
}

impl MemoryKind {
    pub fn sigil(&self) -> &'static str {
        match self {
            MemoryKind::Address => "",
            MemoryKind::Delta => "d",
            MemoryKind::Prior => "p",
            MemoryKind::Bcd => "b",
            MemoryKind::Inverted => "~",
        }
    }
}

/// Operand kind, flattened for display and enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperandKind {
    Address,
    Delta,
    Prior,
    Bcd,
    Inverted,
    Value,
    Float,
}

/// A single typed value source
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operand {
    /// Memory read. `address` is an offset from the resolved pointer when the
    /// owning condition follows an AddAddress chain.
    Memory {
        kind: MemoryKind,
        size: MemSize,
        address: u32,
    },
    Value(u32),
    Float(f64),
}

impl Default for Operand {
    fn default() -> Self {
        Operand::Value(0)
    }
}

impl Operand {
    /// Current-frame read
    pub fn address(size: MemSize, address: u32) -> Self {
        Operand::Memory {
            kind: MemoryKind::Address,
            size,
            address,
        }
    }

    pub fn memory(kind: MemoryKind, size: MemSize, address: u32) -> Self {
        Operand::Memory { kind, size, address }
    }

    pub fn kind(&self) -> OperandKind {
        match self {
            Operand::Memory { kind, .. } => match kind {
                MemoryKind::Address => OperandKind::Address,
                MemoryKind::Delta => OperandKind::Delta,
                MemoryKind::Prior => OperandKind::Prior,
                MemoryKind::Bcd => OperandKind::Bcd,
                MemoryKind::Inverted => OperandKind::Inverted,
            },
            Operand::Value(_) => OperandKind::Value,
            Operand::Float(_) => OperandKind::Float,
        }
    }

    pub fn is_memory(&self) -> bool {
        matches!(self, Operand::Memory { .. })
    }

    pub fn size(&self) -> Option<MemSize> {
        match self {
            Operand::Memory { size, .. } => Some(*size),
            _ => None,
        }
    }

    pub fn memory_address(&self) -> Option<u32> {
        match self {
            Operand::Memory { address, .. } => Some(*address),
            _ => None,
        }
    }

    fn describe(&self, notes: Option<&dyn CodeNoteLookup>, indirect: bool) -> String {
        match self {
            Operand::Value(v) => v.to_string(),
            Operand::Float(f) => f.to_string(),
            Operand::Memory { kind, size, address } => {
                let prefix = match kind {
                    MemoryKind::Address => "",
                    MemoryKind::Delta => "delta ",
                    MemoryKind::Prior => "prior ",
                    MemoryKind::Bcd => "bcd ",
                    MemoryKind::Inverted => "inverted ",
                };
                let location = if indirect {
                    format!("[pointer + 0x{:x}]", address)
                } else {
                    format!("0x{:04x}", address)
                };
                let note = if indirect {
                    None
                } else {
                    notes.and_then(|n| n.find_note(*address, *size))
                };
                match note {
                    Some(note) => format!("{}{} {} ({})", prefix, size.description(), location, note),
                    None => format!("{}{} {}", prefix, size.description(), location),
                }
            }
        }
    }
}

/// Memory slots assigned to a condition's operands when its trigger is built
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct OperandRefs {
    pub source: Option<MemRefId>,
    pub target: Option<MemRefId>,
    /// Whether the operands are read relative to an AddAddress chain
    pub indirect: bool,
}

/// One clause of a trigger
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub condition_type: ConditionType,
    pub source: Operand,
    pub operator: Operator,
    /// Absent when `operator` is [`Operator::None`]
    pub target: Option<Operand>,
    /// 0 means no hit target
    pub required_hits: u32,
    pub current_hits: u32,
    pub(crate) refs: OperandRefs,
}

impl Condition {
    /// A standard condition reading `source` with no operator
    pub fn new(source: Operand) -> Self {
        Self {
            condition_type: ConditionType::Standard,
            source,
            operator: Operator::None,
            target: None,
            required_hits: 0,
            current_hits: 0,
            refs: OperandRefs::default(),
        }
    }

    pub fn with_type(mut self, condition_type: ConditionType) -> Self {
        self.condition_type = condition_type;
        self
    }

    /// Set the operator and target. [`Operator::None`] drops the target.
    pub fn with_operator(mut self, operator: Operator, target: Operand) -> Self {
        self.operator = operator;
        self.target = (operator != Operator::None).then_some(target);
        self
    }

    pub fn with_hits(mut self, required_hits: u32) -> Self {
        self.required_hits = required_hits;
        self
    }

    pub fn has_hits(&self) -> bool {
        self.condition_type.has_hits()
    }

    /// Whether the operands read relative to a preceding AddAddress chain
    pub fn is_indirect(&self) -> bool {
        self.refs.indirect
    }

    /// Human-readable rendering, naming code notes for memory operands
    pub fn describe(&self, notes: Option<&dyn CodeNoteLookup>) -> String {
        let indirect = self.refs.indirect;
        let mut text = String::new();
        if self.condition_type != ConditionType::Standard {
            text.push_str(self.condition_type.description());
            text.push_str(": ");
        }

        text.push_str(&self.source.describe(notes, indirect));
        if let Some(target) = &self.target {
            text.push(' ');
            text.push_str(self.operator.as_str());
            text.push(' ');
            text.push_str(&target.describe(notes, indirect));
        }

        if self.required_hits > 0 {
            text.push_str(&format!(" ({} hits)", self.required_hits));
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notes::CodeNotes;

    #[test]
    fn test_prefix_round_trip() {
        for t in ConditionType::ALL {
            match t.prefix() {
                Some(c) => assert_eq!(ConditionType::from_prefix(c), Some(t)),
                None => assert_eq!(t, ConditionType::Standard),
            }
        }
    }

    #[test]
    fn test_hit_carrying_types() {
        assert!(!ConditionType::AddSource.has_hits());
        assert!(!ConditionType::SubSource.has_hits());
        assert!(!ConditionType::AddAddress.has_hits());
        assert!(ConditionType::AddHits.has_hits());
        assert!(ConditionType::Trigger.has_hits());
    }

    #[test]
    fn test_operator_evaluate() {
        assert!(Operator::Equals.evaluate(&5, &5));
        assert!(!Operator::Equals.evaluate(&5, &6));
        assert!(Operator::LessThan.evaluate(&5, &6));
        assert!(Operator::GreaterThanOrEqual.evaluate(&5, &5));
        assert!(!Operator::Multiply.evaluate(&5, &5));
    }

    #[test]
    fn test_with_operator_none_drops_target() {
        let cond = Condition::new(Operand::address(MemSize::EightBit, 0x10))
            .with_operator(Operator::None, Operand::Value(3));
        assert!(cond.target.is_none());
    }

    #[test]
    fn test_describe_with_notes() {
        let mut notes = CodeNotes::new();
        notes.insert(0x1234, "Lives");

        let cond = Condition::new(Operand::address(MemSize::EightBit, 0x1234))
            .with_type(ConditionType::ResetIf)
            .with_operator(Operator::Equals, Operand::Value(0))
            .with_hits(2);

        assert_eq!(
            cond.describe(Some(&notes)),
            "Reset If: 8-bit 0x1234 (Lives) = 0 (2 hits)"
        );
        assert_eq!(cond.describe(None), "Reset If: 8-bit 0x1234 = 0 (2 hits)");
    }
}
