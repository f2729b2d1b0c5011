//! Text format serializer
//!
//! Produces the canonical form accepted by the parser, so that
//! serializing a parsed canonical definition reproduces it exactly.

use super::{Condition, ConditionGroup, Operand, Operator, Trigger};

/// Render a whole trigger or value. Every group is written, including empty
/// ones, separated by `S`.
pub fn serialize_trigger(trigger: &Trigger) -> String {
    let mut buffer = String::new();
    for (i, group) in trigger.groups().enumerate() {
        if i > 0 {
            buffer.push('S');
        }
        append_group(&mut buffer, group);
    }
    buffer
}

pub fn serialize_condition(cond: &Condition) -> String {
    let mut buffer = String::new();
    append_condition(&mut buffer, cond);
    buffer
}

pub fn serialize_operand(operand: &Operand) -> String {
    let mut buffer = String::new();
    append_operand(&mut buffer, operand);
    buffer
}

/// Lowercase hex with 4, 6 or 8 digits depending on magnitude
pub fn format_address(address: u32) -> String {
    if address < 0x1_0000 {
        format!("{:04x}", address)
    } else if address < 0x100_0000 {
        format!("{:06x}", address)
    } else {
        format!("{:08x}", address)
    }
}

/// Shortest decimal form that reads back as the same float, always with a
/// fractional part
pub fn format_float(value: f64) -> String {
    let mut text = (value as f32).to_string();
    if text.chars().all(|c| c.is_ascii_digit() || c == '-') {
        text.push_str(".0");
    }
    text
}

fn append_group(buffer: &mut String, group: &ConditionGroup) {
    for (i, cond) in group.conditions().iter().enumerate() {
        if i > 0 {
            buffer.push('_');
        }
        append_condition(buffer, cond);
    }
}

fn append_condition(buffer: &mut String, cond: &Condition) {
    if let Some(prefix) = cond.condition_type.prefix() {
        buffer.push(prefix);
        buffer.push(':');
    }

    append_operand(buffer, &cond.source);

    if let Some(target) = &cond.target {
        if cond.operator != Operator::None {
            buffer.push_str(cond.operator.as_str());
            append_operand(buffer, target);
        }
    }

    if cond.required_hits > 0 {
        buffer.push('.');
        buffer.push_str(&cond.required_hits.to_string());
        buffer.push('.');
    }
}

fn append_operand(buffer: &mut String, operand: &Operand) {
    match *operand {
        Operand::Value(v) => buffer.push_str(&v.to_string()),
        Operand::Float(f) => {
            buffer.push('f');
            buffer.push_str(&format_float(f));
        }
        Operand::Memory { kind, size, address } => {
            buffer.push_str(kind.sigil());
            if size.is_float() {
                buffer.push('f');
            } else {
                buffer.push_str("0x");
            }
            buffer.push(size.code());
            buffer.push_str(&format_address(address));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemSize;
    use crate::triggers::types::MemoryKind;
    use crate::triggers::ConditionType;

    #[test]
    fn test_format_address() {
        assert_eq!(format_address(0x12), "0012");
        assert_eq!(format_address(0x1234), "1234");
        assert_eq!(format_address(0x12345), "012345");
        assert_eq!(format_address(0x1234567), "01234567");
    }

    #[test]
    fn test_format_float() {
        assert_eq!(format_float(2.0), "2.0");
        assert_eq!(format_float(-1.5), "-1.5");
        assert_eq!(format_float(0.25), "0.25");
        assert_eq!(format_float(0.1f32 as f64), "0.1");
    }

    #[test]
    fn test_serialize_operand() {
        assert_eq!(serialize_operand(&Operand::address(MemSize::SixteenBit, 0x1234)), "0x 1234");
        assert_eq!(serialize_operand(&Operand::memory(MemoryKind::Prior, MemSize::Bit3, 0x10)), "p0xP0010");
        assert_eq!(serialize_operand(&Operand::memory(MemoryKind::Delta, MemSize::Mbf32Le, 0x10)), "dfL0010");
        assert_eq!(serialize_operand(&Operand::Float(3.0)), "f3.0");
        assert_eq!(serialize_operand(&Operand::Value(42)), "42");
    }

    #[test]
    fn test_serialize_condition() {
        let cond = Condition::new(Operand::address(MemSize::EightBit, 0x1234))
            .with_type(ConditionType::ResetIf)
            .with_operator(Operator::GreaterThanOrEqual, Operand::Value(5))
            .with_hits(100);
        assert_eq!(serialize_condition(&cond), "R:0xH1234>=5.100.");
    }

    #[test]
    fn test_serialize_empty_groups() {
        let trigger = Trigger::parse("S0xH0001=1S");
        assert_eq!(serialize_trigger(&trigger), "S0xH0001=1S");
    }
}
