use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Mul, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const XOF_CURRENCY_CODE: &str = "XOF";
pub const XOF_CURRENCY_CODE_LOWER: &str = "xof";

//--------------------------------------        Cfa         ---------------------------------------------------------
/// An amount of West African CFA francs. The franc has no minor unit in circulation, so amounts are whole
/// integers.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Cfa(i64);

op!(binary Cfa, Add, add);
op!(binary Cfa, Sub, sub);
op!(inplace Cfa, SubAssign, sub_assign);
op!(unary Cfa, Neg, neg);

impl Mul<i64> for Cfa {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for Cfa {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in CFA francs: {0}")]
pub struct CfaConversionError(String);

impl From<i64> for Cfa {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl PartialEq for Cfa {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Cfa {}

impl TryFrom<u64> for Cfa {
    type Error = CfaConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(CfaConversionError(format!("Value {} is too large to convert to Cfa", value)))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

impl Display for Cfa {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} F", self.0)
    }
}

impl Cfa {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }
}
