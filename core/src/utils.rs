use core::cmp::Ordering;
use core::ops::{Div, Rem};
use primitive_types::U256;

/// `usize::MAX` as a word.
pub const USIZE_MAX: U256 = U256([usize::MAX as u64, 0, 0, 0]);

/// Sign of a two's complement word. Variants are declared in ascending
/// order so the derived `Ord` ranks negatives first.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug)]
pub enum Sign {
	Minus,
	Zero,
	Plus,
}

/// Magnitude of the most negative word, `2^255`.
const MIN_MAGNITUDE: U256 = U256([0, 0, 0, 0x8000_0000_0000_0000]);

/// A word read as a signed integer, kept as sign and magnitude.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct I256(pub Sign, pub U256);

impl I256 {
	pub const fn zero() -> Self {
		Self(Sign::Zero, U256::zero())
	}

	/// `-2^255`.
	pub const fn min_value() -> Self {
		Self(Sign::Minus, MIN_MAGNITUDE)
	}

	fn is_negative(&self) -> bool {
		self.0 == Sign::Minus
	}

	/// Build from a magnitude, normalizing zero.
	fn signed(negative: bool, magnitude: U256) -> Self {
		if magnitude.is_zero() {
			Self::zero()
		} else if negative {
			Self(Sign::Minus, magnitude)
		} else {
			Self(Sign::Plus, magnitude)
		}
	}
}

impl Ord for I256 {
	fn cmp(&self, other: &Self) -> Ordering {
		self.0.cmp(&other.0).then_with(|| match self.0 {
			Sign::Minus => other.1.cmp(&self.1),
			_ => self.1.cmp(&other.1),
		})
	}
}

impl PartialOrd for I256 {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl Default for I256 {
	fn default() -> Self {
		Self::zero()
	}
}

impl From<U256> for I256 {
	fn from(word: U256) -> Self {
		if word.bit(255) {
			Self::signed(true, (!word).overflowing_add(U256::one()).0)
		} else {
			Self::signed(false, word)
		}
	}
}

impl From<I256> for U256 {
	fn from(value: I256) -> Self {
		match value.0 {
			Sign::Zero => U256::zero(),
			Sign::Plus => value.1,
			Sign::Minus => (!value.1).overflowing_add(U256::one()).0,
		}
	}
}

/// `SDIV` semantics: truncation toward zero, zero on a zero divisor, and
/// `-2^255 / -1` wrapping back to `-2^255`.
impl Div for I256 {
	type Output = Self;

	fn div(self, other: Self) -> Self {
		if other.1.is_zero() {
			return Self::zero();
		}
		if self == Self::min_value() && other.1 == U256::one() {
			return Self::min_value();
		}

		Self::signed(self.is_negative() != other.is_negative(), self.1 / other.1)
	}
}

/// `SMOD` semantics: the result takes the sign of the dividend.
impl Rem for I256 {
	type Output = Self;

	fn rem(self, other: Self) -> Self {
		if other.1.is_zero() {
			return Self::zero();
		}

		Self::signed(self.is_negative(), self.1 % other.1)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn int(value: i64) -> I256 {
		let magnitude = U256::from(value.unsigned_abs());
		if value < 0 {
			I256::from(U256::zero().overflowing_sub(magnitude).0)
		} else {
			I256::from(magnitude)
		}
	}

	#[test]
	fn sdiv_truncates_toward_zero() {
		assert_eq!(int(100) / int(-1), int(-100));
		assert_eq!(int(100) / int(2), int(50));
		assert_eq!(int(-7) / int(2), int(-3));
		assert_eq!(int(-7) / int(-2), int(3));
		assert_eq!(int(7) / int(0), I256::zero());
	}

	#[test]
	fn sdiv_of_the_minimum_wraps() {
		assert_eq!(I256::min_value() / int(-1), I256::min_value());
		assert_eq!(I256::min_value() / int(1), I256::min_value());

		let max = I256(Sign::Plus, MIN_MAGNITUDE - U256::one());
		assert_eq!(max / int(-1), I256(Sign::Minus, MIN_MAGNITUDE - U256::one()));
	}

	#[test]
	fn smod_follows_the_dividend() {
		assert_eq!(int(-7) % int(2), int(-1));
		assert_eq!(int(7) % int(-2), int(1));
		assert_eq!(int(6) % int(-3), I256::zero());
		assert_eq!(int(6) % int(0), I256::zero());
	}

	#[test]
	fn round_trips_negative_words() {
		let minus_two = U256::MAX - U256::one();
		let signed = I256::from(minus_two);
		assert_eq!(signed, I256(Sign::Minus, U256::from(2)));
		assert_eq!(U256::from(signed), minus_two);
		assert_eq!(I256::from(MIN_MAGNITUDE), I256::min_value());
		assert_eq!(U256::from(I256::min_value()), MIN_MAGNITUDE);
	}

	#[test]
	fn ordering_is_numeric() {
		assert!(int(-2) < int(-1));
		assert!(int(-1) < I256::zero());
		assert!(I256::zero() < int(1));
		assert!(I256::min_value() < int(-1));
		assert!(int(3) > int(2));
	}
}
