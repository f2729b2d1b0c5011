//! Typed values produced by operands

use super::Operator;

/// Result of evaluating an operand
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TypedValue {
    Unsigned(u32),
    Float(f64),
}

impl Default for TypedValue {
    fn default() -> Self {
        TypedValue::Unsigned(0)
    }
}

impl TypedValue {
    pub fn is_float(&self) -> bool {
        matches!(self, TypedValue::Float(_))
    }

    pub fn as_f64(&self) -> f64 {
        match *self {
            TypedValue::Unsigned(v) => v as f64,
            TypedValue::Float(f) => f,
        }
    }

    /// Truncate to 32 bits. Negative floats wrap like a signed cast.
    pub fn as_u32(&self) -> u32 {
        match *self {
            TypedValue::Unsigned(v) => v,
            TypedValue::Float(f) if f < 0.0 => (f as i64) as u32,
            TypedValue::Float(f) => f as u32,
        }
    }

    pub fn is_truthy(&self) -> bool {
        match *self {
            TypedValue::Unsigned(v) => v != 0,
            TypedValue::Float(f) => f != 0.0,
        }
    }

    /// Wrapping addition, promoted to float when either side is float
    pub fn wrapping_add(self, rhs: TypedValue) -> TypedValue {
        match (self, rhs) {
            (TypedValue::Unsigned(a), TypedValue::Unsigned(b)) => TypedValue::Unsigned(a.wrapping_add(b)),
            _ => TypedValue::Float(self.as_f64() + rhs.as_f64()),
        }
    }

    /// Wrapping subtraction, promoted to float when either side is float
    pub fn wrapping_sub(self, rhs: TypedValue) -> TypedValue {
        match (self, rhs) {
            (TypedValue::Unsigned(a), TypedValue::Unsigned(b)) => TypedValue::Unsigned(a.wrapping_sub(b)),
            _ => TypedValue::Float(self.as_f64() - rhs.as_f64()),
        }
    }

    /// Apply a modifying operator (`*`, `/`, `&`). Any other operator
    /// leaves the value unchanged. Division by zero yields zero.
    pub fn modify(self, op: Operator, rhs: TypedValue) -> TypedValue {
        match op {
            Operator::Multiply => match (self, rhs) {
                (TypedValue::Unsigned(a), TypedValue::Unsigned(b)) => TypedValue::Unsigned(a.wrapping_mul(b)),
                _ => TypedValue::Float(self.as_f64() * rhs.as_f64()),
            },
            Operator::Divide => match (self, rhs) {
                (_, rhs) if !rhs.is_truthy() => {
                    if self.is_float() || rhs.is_float() {
                        TypedValue::Float(0.0)
                    } else {
                        TypedValue::Unsigned(0)
                    }
                }
                (TypedValue::Unsigned(a), TypedValue::Unsigned(b)) => TypedValue::Unsigned(a / b),
                _ => TypedValue::Float(self.as_f64() / rhs.as_f64()),
            },
            Operator::BitwiseAnd => TypedValue::Unsigned(self.as_u32() & rhs.as_u32()),
            _ => self,
        }
    }

    /// Apply a comparison operator. Mixed operands compare as single
    /// precision floats, the precision of float memory.
    pub fn compare(self, op: Operator, rhs: TypedValue) -> bool {
        match (self, rhs) {
            (TypedValue::Unsigned(a), TypedValue::Unsigned(b)) => op.evaluate(&a, &b),
            _ => op.evaluate(&(self.as_f64() as f32), &(rhs.as_f64() as f32)),
        }
    }
}

impl From<u32> for TypedValue {
    fn from(v: u32) -> Self {
        TypedValue::Unsigned(v)
    }
}

impl From<f64> for TypedValue {
    fn from(v: f64) -> Self {
        TypedValue::Float(v)
    }
}
