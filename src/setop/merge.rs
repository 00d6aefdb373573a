use std::fmt;
use std::str::FromStr;

use layerkv_store::numeric::decode_f64;
use layerkv_store::numeric::decode_i64;
use layerkv_store::numeric::encode_f64;
use layerkv_store::numeric::encode_i64;

use super::parse::ParseError;
use crate::error::OverflowSnafu;
use crate::error::Result;

/// How the values of sources sharing a key combine into the result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum MergePolicy {
    /// Only the first value.
    First,
    /// Only the last value.
    Last,
    /// Every value, in source order.
    #[default]
    Append,
    /// One value: all values concatenated in source order.
    ConCat,
    /// One value: the sum of 8-byte big-endian integers.
    IntegerSum,
    /// One value: the sum of 8-byte big-endian floats.
    FloatSum,
}

impl MergePolicy {
    pub const ALL: [MergePolicy; 6] = [
        Self::First,
        Self::Last,
        Self::Append,
        Self::ConCat,
        Self::IntegerSum,
        Self::FloatSum,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::First => "First",
            Self::Last => "Last",
            Self::Append => "Append",
            Self::ConCat => "ConCat",
            Self::IntegerSum => "IntegerSum",
            Self::FloatSum => "FloatSum",
        }
    }

    /// Combine values, given in source order.
    pub fn merge(self, values: Vec<Vec<u8>>) -> Result<Vec<Vec<u8>>> {
        Ok(match self {
            Self::First => values.into_iter().take(1).collect(),
            Self::Last => values.into_iter().last().into_iter().collect(),
            Self::Append => values,
            Self::ConCat => vec![values.concat()],
            Self::IntegerSum => {
                let mut sum = 0i64;
                for value in &values {
                    sum = sum.checked_add(decode_i64(value)?).ok_or_else(|| OverflowSnafu.build())?;
                }
                vec![encode_i64(sum).to_vec()]
            }
            Self::FloatSum => {
                let mut sum = 0.0;
                for value in &values {
                    sum += decode_f64(value)?;
                }
                vec![encode_f64(sum).to_vec()]
            }
        })
    }
}

impl fmt::Display for MergePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MergePolicy {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|policy| policy.name() == s)
            .ok_or_else(|| ParseError::UnknownMerge { name: s.to_string() })
    }
}
