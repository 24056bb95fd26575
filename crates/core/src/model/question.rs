use std::fmt;

use thiserror::Error;

/// Largest operand a question may use. Operands are single gestures.
pub const MAX_OPERAND: u8 = 9;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("operand {0} is outside 0..=9")]
    OperandOutOfRange(u8),
}

//
// ─── OPERATOR ──────────────────────────────────────────────────────────────────
//

/// Arithmetic operation shown to the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    /// Floored integer division. The right operand is never zero.
    Divide,
}

impl Operator {
    /// All operators, in the order the generator draws from.
    pub const ALL: [Operator; 4] = [
        Operator::Add,
        Operator::Subtract,
        Operator::Multiply,
        Operator::Divide,
    ];

    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Subtract => "-",
            Operator::Multiply => "*",
            Operator::Divide => "/",
        }
    }

    fn apply(self, left: u8, right: u8) -> i64 {
        let (l, r) = (i64::from(left), i64::from(right));
        match self {
            Operator::Add => l + r,
            Operator::Subtract => l - r,
            Operator::Multiply => l * r,
            // `right` is coerced to >= 1 before we get here.
            Operator::Divide => l.div_euclid(r),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A single arithmetic problem with its precomputed answer.
///
/// The answer is derived once at construction and cannot change afterwards.
/// Division by zero is impossible: a zero divisor is raised to one, so the
/// distribution of the right operand is skewed toward 1 for `Divide`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    left: u8,
    operator: Operator,
    right: u8,
    correct_answer: i64,
}

impl Question {
    /// Builds a question from two operands in `0..=9`.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::OperandOutOfRange` if either operand exceeds 9.
    pub fn new(left: u8, operator: Operator, right: u8) -> Result<Self, QuestionError> {
        for operand in [left, right] {
            if operand > MAX_OPERAND {
                return Err(QuestionError::OperandOutOfRange(operand));
            }
        }

        Ok(Self::from_operands(left, operator, right))
    }

    /// Builds a question from operands already known to be in range.
    pub(crate) fn from_operands(left: u8, operator: Operator, right: u8) -> Self {
        let right = if operator == Operator::Divide && right == 0 {
            1
        } else {
            right
        };

        Self {
            left,
            operator,
            right,
            correct_answer: operator.apply(left, right),
        }
    }

    #[must_use]
    pub fn left(&self) -> u8 {
        self.left
    }

    #[must_use]
    pub fn operator(&self) -> Operator {
        self.operator
    }

    #[must_use]
    pub fn right(&self) -> u8 {
        self.right
    }

    #[must_use]
    pub fn correct_answer(&self) -> i64 {
        self.correct_answer
    }

    /// Number of characters the player has to sign.
    ///
    /// A negative answer counts its minus sign, which no gesture produces.
    #[must_use]
    pub fn target_len(&self) -> usize {
        self.correct_answer.to_string().len()
    }

    /// Text stored alongside each result, e.g. `"5 + 3"`.
    #[must_use]
    pub fn text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.left, self.operator, self.right)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(left: u8, op: Operator, right: u8) -> i64 {
        let (l, r) = (f64::from(left), f64::from(right));
        match op {
            Operator::Add => i64::from(left) + i64::from(right),
            Operator::Subtract => i64::from(left) - i64::from(right),
            Operator::Multiply => i64::from(left) * i64::from(right),
            #[allow(clippy::cast_possible_truncation)]
            Operator::Divide => (l / r.max(1.0)).floor() as i64,
        }
    }

    #[test]
    fn answers_match_direct_evaluation_for_every_operand_pair() {
        for op in Operator::ALL {
            for left in 0..=MAX_OPERAND {
                for right in 0..=MAX_OPERAND {
                    let q = Question::new(left, op, right).unwrap();
                    assert_eq!(q.correct_answer(), reference(left, op, right), "{q}");
                }
            }
        }
    }

    #[test]
    fn zero_divisor_is_forced_to_one() {
        let q = Question::new(2, Operator::Divide, 0).unwrap();
        assert_eq!(q.right(), 1);
        assert_eq!(q.correct_answer(), 2);
        assert_eq!(q.text(), "2 / 1");
    }

    #[test]
    fn zero_right_operand_is_kept_for_other_operators() {
        let q = Question::new(4, Operator::Multiply, 0).unwrap();
        assert_eq!(q.right(), 0);
        assert_eq!(q.correct_answer(), 0);
    }

    #[test]
    fn division_floors() {
        let q = Question::new(7, Operator::Divide, 2).unwrap();
        assert_eq!(q.correct_answer(), 3);
    }

    #[test]
    fn target_len_counts_digits_and_sign() {
        assert_eq!(Question::new(5, Operator::Add, 3).unwrap().target_len(), 1);
        assert_eq!(Question::new(9, Operator::Multiply, 9).unwrap().target_len(), 2);
        assert_eq!(Question::new(1, Operator::Subtract, 8).unwrap().target_len(), 2);
    }

    #[test]
    fn rejects_operands_above_nine() {
        let err = Question::new(10, Operator::Add, 1).unwrap_err();
        assert_eq!(err, QuestionError::OperandOutOfRange(10));
    }
}
