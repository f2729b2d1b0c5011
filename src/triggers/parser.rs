//! Text format parser
//!
//! Grammar, informally:
//!
//! ```text
//! trigger   := group ('S' group)*
//! group     := [condition ('_' condition)*]
//! condition := [type ':'] operand [operator operand] [hits]
//! operand   := [d|p|b|~] ('0x' size hex | 'f' floatsize hex)
//!            | decimal | '-' decimal | 'h' hex | 'f' float
//! hits      := '.' decimal '.' | '(' decimal ')'
//! ```
//!
//! In [`ParseMode::Lenient`] (the default) malformed pieces are replaced
//! instead of rejected: a bad operand becomes `0`, an unknown size letter
//! becomes 8-bit, an unterminated hit count keeps its digits. Previously
//! authored content depends on this. A trigger that needed any such repair
//! is marked malformed and never reports true. [`ParseMode::Strict`] reports
//! the first problem with its byte position instead.

use std::cell::Cell;

use serde::{Deserialize, Serialize};

use super::types::MemoryKind;
use super::{Condition, ConditionGroup, ConditionType, Operand, Operator, Trigger};
use crate::error::{ParseError, ParseErrorKind};
use crate::memory::MemSize;

/// How malformed input is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseMode {
    #[default]
    Lenient,
    Strict,
}

/// Parse an achievement trigger
pub fn parse_trigger(text: &str, mode: ParseMode) -> Result<Trigger, ParseError> {
    let mut parser = Parser::new(text, mode);
    let mut groups = parser.parse_groups()?;
    let core = groups.remove(0);
    Ok(Trigger::new(core, groups).with_malformed(parser.recovered.get()))
}

/// Parse an achievement trigger, recovering from every error
pub(crate) fn parse_trigger_lenient(text: &str) -> Trigger {
    let mut parser = Parser::new(text, ParseMode::Lenient);
    let mut groups = parser.groups_lenient();
    let core = groups.remove(0);
    Trigger::new(core, groups).with_malformed(parser.recovered.get())
}

/// Parse a single condition
pub fn parse_condition(text: &str, mode: ParseMode) -> Result<Condition, ParseError> {
    let mut parser = Parser::new(text, mode);
    let cond = parser.parse_condition()?;
    parser.expect_end()?;
    Ok(cond)
}

/// Parse a single operand
pub fn parse_operand(text: &str, mode: ParseMode) -> Result<Operand, ParseError> {
    let mut parser = Parser::new(text, mode);
    let operand = parser.parse_operand()?;
    parser.expect_end()?;
    Ok(operand)
}

/// Parse a value expression.
///
/// Condition syntax (`M:0xH1234_...`) is used as-is; a group without a
/// Measured condition measures its last condition. Anything else is the
/// legacy form: `term_term...` with `term := operand['*' multiplier]`,
/// alternatives separated by `$`, largest alternative wins.
pub fn parse_value(text: &str, mode: ParseMode) -> Result<Trigger, ParseError> {
    let groups = if uses_condition_syntax(text) {
        Parser::new(text, mode).parse_groups()?
    } else {
        let mut groups = Vec::new();
        let mut offset = 0;
        for alternative in text.split('$') {
            groups.push(parse_legacy_value(alternative, offset, mode)?);
            offset += alternative.len() + 1;
        }
        groups
    };

    let mut groups: Vec<ConditionGroup> = groups.into_iter().map(ensure_measured).collect();
    let core = groups.remove(0);
    Ok(Trigger::new_value(core, groups))
}

fn uses_condition_syntax(text: &str) -> bool {
    let bytes = text.as_bytes();
    bytes.windows(2).enumerate().any(|(i, w)| {
        w[1] == b':'
            && w[0].is_ascii_alphabetic()
            && (i == 0 || matches!(bytes[i - 1], b'_' | b'S' | b's'))
    })
}

fn ensure_measured(group: ConditionGroup) -> ConditionGroup {
    if group.conditions().iter().any(|c| c.condition_type == ConditionType::Measured) {
        return group;
    }

    let mut conditions = group.conditions().to_vec();
    if let Some(last) = conditions
        .iter_mut()
        .rev()
        .find(|c| !c.condition_type.is_combining())
    {
        last.condition_type = ConditionType::Measured;
    }
    ConditionGroup::new(conditions)
}

/// Convert one legacy `$` alternative to AddSource/SubSource conditions
/// ending in a Measured one
fn parse_legacy_value(text: &str, offset: usize, mode: ParseMode) -> Result<ConditionGroup, ParseError> {
    let mut conditions = Vec::new();
    let mut term_start = offset;

    for term in text.split('_') {
        let (operand_text, multiplier_text) = match term.find('*') {
            Some(i) => (&term[..i], Some(&term[i + 1..])),
            None => (term, None),
        };

        let operand = parse_operand(operand_text, mode).map_err(|e| shift(e, term_start))?;
        let mut cond = Condition::new(operand).with_type(ConditionType::AddSource);

        if let Some(multiplier_text) = multiplier_text {
            let at = term_start + operand_text.len() + 1;
            let (negative, multiplier) = parse_legacy_multiplier(multiplier_text, at, mode)?;
            if negative {
                cond.condition_type = ConditionType::SubSource;
            }
            let is_one = matches!(multiplier, Operand::Value(1)) || multiplier == Operand::Float(1.0);
            if !is_one {
                cond = cond.with_operator(Operator::Multiply, multiplier);
            }
        }

        conditions.push(cond);
        term_start += term.len() + 1;
    }

    // the last term is the measured one; a subtracted last term measures 0
    match conditions.last_mut() {
        Some(last) if last.condition_type == ConditionType::AddSource => {
            last.condition_type = ConditionType::Measured;
        }
        _ => conditions.push(Condition::new(Operand::Value(0)).with_type(ConditionType::Measured)),
    }

    Ok(ConditionGroup::new(conditions))
}

fn parse_legacy_multiplier(text: &str, at: usize, mode: ParseMode) -> Result<(bool, Operand), ParseError> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };

    let parsed = if let Some(hex) = digits.strip_prefix('h').or_else(|| digits.strip_prefix('H')) {
        u32::from_str_radix(hex, 16).ok().map(Operand::Value)
    } else if digits.contains('.') {
        digits.parse::<f64>().ok().map(Operand::Float)
    } else {
        digits.parse::<u32>().ok().map(Operand::Value)
    };

    match parsed {
        Some(operand) => Ok((negative, operand)),
        None if mode == ParseMode::Strict => Err(ParseError::new(at, ParseErrorKind::InvalidOperand)),
        None => Ok((negative, Operand::Value(1))),
    }
}

fn shift(mut err: ParseError, offset: usize) -> ParseError {
    err.position += offset;
    err
}

/// Characters that end a malformed operand when skipping it
fn is_delimiter(b: u8) -> bool {
    matches!(
        b,
        b'=' | b'!' | b'<' | b'>' | b'*' | b'/' | b'&' | b'_' | b'.' | b'(' | b'S' | b's'
    )
}

struct Parser<'a> {
    bytes: &'a [u8],
    pos: usize,
    mode: ParseMode,
    /// Set once any lenient repair was made
    recovered: Cell<bool>,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str, mode: ParseMode) -> Self {
        Self {
            bytes: text.as_bytes(),
            pos: 0,
            mode,
            recovered: Cell::new(false),
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, ahead: usize) -> Option<u8> {
        self.bytes.get(self.pos + ahead).copied()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    /// Report a problem: an error in strict mode, the fallback otherwise
    fn recover<T>(&self, at: usize, kind: ParseErrorKind, fallback: T) -> Result<T, ParseError> {
        match self.mode {
            ParseMode::Strict => Err(ParseError::new(at, kind)),
            ParseMode::Lenient => {
                log::debug!("recovered from {} at position {}", kind.description(), at);
                self.recovered.set(true);
                Ok(fallback)
            }
        }
    }

    fn expect_end(&self) -> Result<(), ParseError> {
        if self.at_end() {
            Ok(())
        } else {
            self.recover(self.pos, ParseErrorKind::UnexpectedCharacter, ())
        }
    }

    fn groups_lenient(&mut self) -> Vec<ConditionGroup> {
        // lenient parsing recovers from every error
        self.parse_groups().unwrap_or_else(|_| {
            self.recovered.set(true);
            vec![ConditionGroup::default()]
        })
    }

    fn parse_groups(&mut self) -> Result<Vec<ConditionGroup>, ParseError> {
        let mut groups = Vec::new();
        loop {
            groups.push(ConditionGroup::new(self.parse_group()?));
            match self.peek() {
                Some(b'S') | Some(b's') => self.pos += 1,
                _ => break,
            }
        }
        Ok(groups)
    }

    fn parse_group(&mut self) -> Result<Vec<Condition>, ParseError> {
        let mut conditions = Vec::new();
        if matches!(self.peek(), None | Some(b'S') | Some(b's')) {
            return Ok(conditions);
        }

        loop {
            conditions.push(self.parse_condition()?);
            match self.peek() {
                Some(b'_') => self.pos += 1,
                None | Some(b'S') | Some(b's') => break,
                Some(_) => {
                    self.recover(self.pos, ParseErrorKind::UnexpectedCharacter, ())?;
                    while !matches!(self.peek(), None | Some(b'_') | Some(b'S') | Some(b's')) {
                        self.pos += 1;
                    }
                    if self.peek() == Some(b'_') {
                        self.pos += 1;
                    } else {
                        break;
                    }
                }
            }
        }
        Ok(conditions)
    }

    fn parse_condition(&mut self) -> Result<Condition, ParseError> {
        let mut condition_type = ConditionType::Standard;
        if let (Some(c), Some(b':')) = (self.peek(), self.peek_at(1)) {
            if c.is_ascii_alphabetic() {
                condition_type = match ConditionType::from_prefix(c as char) {
                    Some(t) => t,
                    None => self.recover(self.pos, ParseErrorKind::InvalidConditionType, ConditionType::Standard)?,
                };
                self.pos += 2;
            }
        }

        let source = self.parse_operand()?;
        let operator = self.parse_operator()?;
        let mut cond = Condition::new(source).with_type(condition_type);
        if operator != Operator::None {
            let target = self.parse_operand()?;
            cond = cond.with_operator(operator, target);
        }
        cond.required_hits = self.parse_hits()?;
        Ok(cond)
    }

    fn parse_operator(&mut self) -> Result<Operator, ParseError> {
        let (operator, len) = match (self.peek(), self.peek_at(1)) {
            (Some(b'='), Some(b'=')) => (Operator::Equals, 2),
            (Some(b'='), _) => (Operator::Equals, 1),
            (Some(b'!'), Some(b'=')) => (Operator::NotEquals, 2),
            (Some(b'!'), _) => {
                let op = self.recover(self.pos, ParseErrorKind::InvalidOperator, Operator::NotEquals)?;
                (op, 1)
            }
            (Some(b'<'), Some(b'=')) => (Operator::LessThanOrEqual, 2),
            (Some(b'<'), _) => (Operator::LessThan, 1),
            (Some(b'>'), Some(b'=')) => (Operator::GreaterThanOrEqual, 2),
            (Some(b'>'), _) => (Operator::GreaterThan, 1),
            (Some(b'*'), _) => (Operator::Multiply, 1),
            (Some(b'/'), _) => (Operator::Divide, 1),
            (Some(b'&'), _) => (Operator::BitwiseAnd, 1),
            _ => (Operator::None, 0),
        };
        self.pos += len;
        Ok(operator)
    }

    fn parse_hits(&mut self) -> Result<u32, ParseError> {
        let close = match self.peek() {
            Some(b'.') => b'.',
            Some(b'(') => b')',
            _ => return Ok(0),
        };
        self.pos += 1;

        let start = self.pos;
        let hits = self.take_number(10);
        let hits = match hits {
            Some(n) if n <= u32::MAX as u64 => n as u32,
            Some(_) => self.recover(start, ParseErrorKind::InvalidHitCount, u32::MAX)?,
            None => self.recover(start, ParseErrorKind::InvalidHitCount, 0)?,
        };

        if self.peek() == Some(close) {
            self.pos += 1;
            Ok(hits)
        } else {
            self.recover(self.pos, ParseErrorKind::UnterminatedHitCount, hits)
        }
    }

    /// Consume digits in `radix`, `None` if there were none
    fn take_number(&mut self, radix: u32) -> Option<u64> {
        let start = self.pos;
        let mut value: u64 = 0;
        while let Some(d) = self.peek().and_then(|b| (b as char).to_digit(radix)) {
            value = value.saturating_mul(radix as u64).saturating_add(d as u64);
            self.pos += 1;
        }
        (self.pos > start).then_some(value)
    }

    fn skip_operand(&mut self) {
        while let Some(b) = self.peek() {
            if is_delimiter(b) {
                break;
            }
            self.pos += 1;
        }
    }

    fn invalid_operand(&mut self, at: usize) -> Result<Operand, ParseError> {
        let operand = self.recover(at, ParseErrorKind::InvalidOperand, Operand::Value(0))?;
        self.skip_operand();
        Ok(operand)
    }

    fn parse_operand(&mut self) -> Result<Operand, ParseError> {
        let start = self.pos;
        let kind = match self.peek() {
            Some(b'd') | Some(b'D') => Some(MemoryKind::Delta),
            Some(b'p') | Some(b'P') => Some(MemoryKind::Prior),
            Some(b'b') | Some(b'B') => Some(MemoryKind::Bcd),
            Some(b'~') => Some(MemoryKind::Inverted),
            _ => None,
        };
        if kind.is_some() {
            self.pos += 1;
        }
        let kind_or_address = kind.unwrap_or(MemoryKind::Address);

        match (self.peek(), self.peek_at(1)) {
            (Some(b'0'), Some(b'x')) | (Some(b'0'), Some(b'X')) => {
                self.pos += 2;
                let size = self.parse_size()?;
                let address = self.parse_address()?;
                Ok(Operand::memory(kind_or_address, size, address))
            }
            (Some(b'f'), Some(c)) | (Some(b'F'), Some(c)) if MemSize::from_float_code((c as char).to_ascii_uppercase()).is_some() => {
                self.pos += 2;
                let size = MemSize::from_float_code((c as char).to_ascii_uppercase()).unwrap_or(MemSize::Float);
                let address = self.parse_address()?;
                Ok(Operand::memory(kind_or_address, size, address))
            }
            _ if kind.is_some() => self.invalid_operand(start),
            (Some(b'f'), _) | (Some(b'F'), _) => {
                self.pos += 1;
                self.parse_float(start)
            }
            (Some(b'h'), _) | (Some(b'H'), _) => {
                self.pos += 1;
                if matches!((self.peek(), self.peek_at(1)), (Some(b'0'), Some(b'x' | b'X'))) {
                    self.pos += 2;
                }
                match self.take_number(16) {
                    Some(n) if n <= u32::MAX as u64 => Ok(Operand::Value(n as u32)),
                    Some(_) => self.recover(start, ParseErrorKind::InvalidOperand, Operand::Value(u32::MAX)),
                    None => self.invalid_operand(start),
                }
            }
            (Some(b'-'), _) => {
                self.pos += 1;
                match self.take_number(10) {
                    Some(n) => Ok(Operand::Value(0u32.wrapping_sub(n.min(u32::MAX as u64) as u32))),
                    None => self.invalid_operand(start),
                }
            }
            (Some(b'+'), _) | (Some(b'0'..=b'9'), _) => {
                if self.peek() == Some(b'+') {
                    self.pos += 1;
                }
                match self.take_number(10) {
                    Some(n) => Ok(Operand::Value(n.min(u32::MAX as u64) as u32)),
                    None => self.invalid_operand(start),
                }
            }
            _ => self.invalid_operand(start),
        }
    }

    fn parse_float(&mut self, start: usize) -> Result<Operand, ParseError> {
        let number_start = self.pos;
        if matches!(self.peek(), Some(b'-') | Some(b'+')) {
            self.pos += 1;
        }
        let int_digits = self.take_number(10).is_some();
        if self.peek() == Some(b'.') && self.peek_at(1).map_or(false, |b| b.is_ascii_digit()) {
            self.pos += 1;
            self.take_number(10);
        } else if !int_digits {
            return self.invalid_operand(start);
        }

        let text = std::str::from_utf8(&self.bytes[number_start..self.pos]).unwrap_or("");
        // float memory is single precision; constants are kept at the same precision
        match text.parse::<f32>() {
            Ok(f) if f.is_finite() => Ok(Operand::Float(f as f64)),
            Ok(_) => self.invalid_operand(start),
            Err(_) => self.invalid_operand(start),
        }
    }

    fn parse_size(&mut self) -> Result<MemSize, ParseError> {
        match self.peek() {
            Some(b) if b.is_ascii_hexdigit() => Ok(MemSize::SixteenBit),
            Some(b) => match MemSize::from_code(b as char) {
                Some(size) => {
                    self.pos += 1;
                    Ok(size)
                }
                None => {
                    let size = self.recover(self.pos, ParseErrorKind::InvalidMemorySize, MemSize::EightBit)?;
                    if !is_delimiter(b) {
                        self.pos += 1;
                    }
                    Ok(size)
                }
            },
            None => self.recover(self.pos, ParseErrorKind::InvalidMemorySize, MemSize::EightBit),
        }
    }

    fn parse_address(&mut self) -> Result<u32, ParseError> {
        let start = self.pos;
        match self.take_number(16) {
            Some(n) if n <= u32::MAX as u64 => Ok(n as u32),
            Some(_) => self.recover(start, ParseErrorKind::InvalidAddress, u32::MAX),
            None => self.recover(start, ParseErrorKind::InvalidAddress, 0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::triggers::OperandKind;

    fn strict(text: &str) -> Result<Trigger, ParseError> {
        parse_trigger(text, ParseMode::Strict)
    }

    #[test]
    fn test_parse_simple_condition() {
        let cond = parse_condition("0xH1234=5.3.", ParseMode::Strict).unwrap();
        assert_eq!(cond.condition_type, ConditionType::Standard);
        assert_eq!(cond.source, Operand::address(MemSize::EightBit, 0x1234));
        assert_eq!(cond.operator, Operator::Equals);
        assert_eq!(cond.target, Some(Operand::Value(5)));
        assert_eq!(cond.required_hits, 3);
    }

    #[test]
    fn test_parse_operand_forms() {
        let op = |s| parse_operand(s, ParseMode::Strict).unwrap();
        assert_eq!(op("0x1234"), Operand::address(MemSize::SixteenBit, 0x1234));
        assert_eq!(op("0x 1234"), Operand::address(MemSize::SixteenBit, 0x1234));
        assert_eq!(op("0xh00ff"), Operand::address(MemSize::EightBit, 0xff));
        assert_eq!(op("d0xX10").kind(), OperandKind::Delta);
        assert_eq!(op("P0xX10").kind(), OperandKind::Prior);
        assert_eq!(op("~0xH10").kind(), OperandKind::Inverted);
        assert_eq!(op("fF1234"), Operand::memory(MemoryKind::Address, MemSize::Float, 0x1234));
        assert_eq!(op("bfM10"), Operand::memory(MemoryKind::Bcd, MemSize::Mbf32, 0x10));
        assert_eq!(op("f1.5"), Operand::Float(1.5));
        assert_eq!(op("f-2"), Operand::Float(-2.0));
        assert_eq!(op("h1A"), Operand::Value(0x1A));
        assert_eq!(op("-1"), Operand::Value(0xFFFF_FFFF));
        assert_eq!(op("4294967296"), Operand::Value(0xFFFF_FFFF));
    }

    #[test]
    fn test_parse_alternate_syntax() {
        let cond = parse_condition("0xH1234==5(3)", ParseMode::Strict).unwrap();
        assert_eq!(cond.operator, Operator::Equals);
        assert_eq!(cond.required_hits, 3);

        let trigger = strict("0xH0001=1s0xH0002=2").unwrap();
        assert_eq!(trigger.alts().len(), 1);
    }

    #[test]
    fn test_parse_groups() {
        let trigger = strict("0xH0001=1_0xH0002=2S0xH0003=3SR:0xH0004=4").unwrap();
        assert_eq!(trigger.core().len(), 2);
        assert_eq!(trigger.alts().len(), 2);
        assert_eq!(trigger.alts()[1].conditions()[0].condition_type, ConditionType::ResetIf);

        let trigger = strict("").unwrap();
        assert!(trigger.core().is_empty());
        assert!(trigger.alts().is_empty());
    }

    #[test]
    fn test_lenient_bad_target_becomes_zero() {
        let trigger = Trigger::parse("0xH1234!=zz");
        let cond = &trigger.core().conditions()[0];
        assert_eq!(cond.operator, Operator::NotEquals);
        assert_eq!(cond.target, Some(Operand::Value(0)));
        assert_eq!(trigger.to_string(), "0xH1234!=0");
        assert!(trigger.is_malformed());
    }

    #[test]
    fn test_well_formed_input_is_not_malformed() {
        for text in ["0xH1234=5.3._R:0xH0010=0S0xH0020>d0xH0020", "0xh1234==5(3)", "", "S0xH0001=1"] {
            assert!(!Trigger::parse(text).is_malformed(), "{:?}", text);
        }
    }

    #[test]
    fn test_lenient_unknown_size_is_eight_bit() {
        let trigger = Trigger::parse("0xZ1234=1");
        assert_eq!(
            trigger.core().conditions()[0].source,
            Operand::address(MemSize::EightBit, 0x1234)
        );
    }

    #[test]
    fn test_lenient_unterminated_hits() {
        let trigger = Trigger::parse("0xH1234=1.12");
        assert_eq!(trigger.core().conditions()[0].required_hits, 12);
    }

    #[test]
    fn test_strict_errors() {
        let err = strict("0xH1234!=zz").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidOperand);
        assert_eq!(err.position, 9);

        let err = strict("0xZ1234=1").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidMemorySize);
        assert_eq!(err.position, 2);

        let err = strict("0xH1234=1.12").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnterminatedHitCount);

        let err = strict("X:0xH1234=1").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidConditionType);
        assert_eq!(err.position, 0);

        let err = strict("0xH=1").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidAddress);
    }

    #[test]
    fn test_parse_value_condition_syntax() {
        let value = parse_value("A:0xH0001*2_M:0xH0002", ParseMode::Strict).unwrap();
        assert!(!value.requires_comparison());
        assert_eq!(value.core().len(), 2);

        // a group without Measured measures its last condition
        let value = parse_value("A:0xH0001_0xH0002", ParseMode::Strict).unwrap();
        assert_eq!(value.core().conditions()[1].condition_type, ConditionType::Measured);
    }

    #[test]
    fn test_parse_legacy_value() {
        let value = parse_value("0xH0001*2_0xH0002*-1_0xH0003$0xH0004", ParseMode::Strict).unwrap();
        let core = value.core().conditions();
        assert_eq!(core.len(), 3);
        assert_eq!(core[0].condition_type, ConditionType::AddSource);
        assert_eq!(core[0].operator, Operator::Multiply);
        assert_eq!(core[0].target, Some(Operand::Value(2)));
        assert_eq!(core[1].condition_type, ConditionType::SubSource);
        assert_eq!(core[1].operator, Operator::None);
        assert_eq!(core[2].condition_type, ConditionType::Measured);
        assert_eq!(value.alts().len(), 1);

        let value = parse_value("0xH0001*0.5", ParseMode::Strict).unwrap();
        assert_eq!(value.core().conditions()[0].target, Some(Operand::Float(0.5)));

        // a subtracted last term measures zero after the subtraction
        let value = parse_value("0xH0001_0xH0002*-1", ParseMode::Strict).unwrap();
        let core = value.core().conditions();
        assert_eq!(core.len(), 3);
        assert_eq!(core[2].source, Operand::Value(0));
    }

    #[test]
    fn test_legacy_value_error_position() {
        let err = parse_value("0xH0001$0xH0002*x", ParseMode::Strict).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidOperand);
        assert_eq!(err.position, 16);
    }
}
