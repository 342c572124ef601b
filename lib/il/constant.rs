//! A `Constant` holds a single value of arbitrary width.

use num_bigint::BigUint;
use num_traits::{One, ToPrimitive, Zero};
use std::fmt;

/// A constant value.
///
/// The value is always masked to `bits` bits.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Constant {
    value: BigUint,
    bits: usize,
}

impl Constant {
    /// Create a new `Constant` with the given value and bitness.
    pub fn new(value: u64, bits: usize) -> Constant {
        Constant::from_biguint(BigUint::from(value), bits)
    }

    /// Create a new `Constant` from a `BigUint`, truncating it to `bits`.
    pub fn from_biguint(value: BigUint, bits: usize) -> Constant {
        let mask = (BigUint::one() << bits) - BigUint::one();
        Constant {
            value: value & mask,
            bits,
        }
    }

    pub fn value(&self) -> &BigUint {
        &self.value
    }

    /// Get the value of this `Constant` if it fits in a u64.
    pub fn value_u64(&self) -> Option<u64> {
        self.value.to_u64()
    }

    pub fn bits(&self) -> usize {
        self.bits
    }

    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x{:x}:{}", self.value, self.bits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constants_are_masked() {
        let c = Constant::new(0x1ff, 8);
        assert_eq!(c.value_u64(), Some(0xff));
        assert_eq!(c.to_string(), "0xff:8");
    }

    #[test]
    fn wide_constants() {
        let value = BigUint::from(u64::MAX) << 64usize;
        let c = Constant::from_biguint(value.clone(), 128);
        assert_eq!(c.value(), &value);
        assert_eq!(c.value_u64(), None);
    }
}
