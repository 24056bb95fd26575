use rand::Rng;
use rand::seq::IndexedRandom;

use crate::model::{MAX_OPERAND, Operator, Question};

/// Draw a random question using the thread-local generator.
#[must_use]
pub fn generate() -> Question {
    generate_with(&mut rand::rng())
}

/// Draw a random question from `rng`.
///
/// The operator is uniform over the four operations and both operands are
/// uniform over `0..=9`; a zero divisor is lifted to one.
pub fn generate_with<R: Rng + ?Sized>(rng: &mut R) -> Question {
    let operator = *Operator::ALL.choose(rng).unwrap_or(&Operator::Add);
    let left = rng.random_range(0..=MAX_OPERAND);
    let right = rng.random_range(0..=MAX_OPERAND);

    Question::from_operands(left, operator, right)
}
