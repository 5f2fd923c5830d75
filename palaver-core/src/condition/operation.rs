//! Comparison operators for scoreboard conditions.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How an actual value is compared against a condition's expected value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConditionOperation {
    /// No operator; never matches.
    #[default]
    None,
    /// `==`
    Equals,
    /// `!=`
    NotEquals,
    /// `>`
    GreaterThan,
    /// `>=`
    GreaterThanOrEquals,
    /// `<`
    LessThan,
    /// `<=`
    LessThanOrEquals,
}

impl ConditionOperation {
    /// Every operator that can match, in editor order.
    pub const COMPARISONS: [Self; 6] = [
        Self::Equals,
        Self::NotEquals,
        Self::GreaterThan,
        Self::GreaterThanOrEquals,
        Self::LessThan,
        Self::LessThanOrEquals,
    ];

    /// Compare `actual` against `expected`.
    #[must_use]
    pub fn evaluate(self, actual: i32, expected: i32) -> bool {
        match self {
            Self::None => false,
            Self::Equals => actual == expected,
            Self::NotEquals => actual != expected,
            Self::GreaterThan => actual > expected,
            Self::GreaterThanOrEquals => actual >= expected,
            Self::LessThan => actual < expected,
            Self::LessThanOrEquals => actual <= expected,
        }
    }

    /// Operator symbol as shown to authors; empty for [`Self::None`].
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Self::None => "",
            Self::Equals => "==",
            Self::NotEquals => "!=",
            Self::GreaterThan => ">",
            Self::GreaterThanOrEquals => ">=",
            Self::LessThan => "<",
            Self::LessThanOrEquals => "<=",
        }
    }

    /// Look an operator up by its symbol.
    #[must_use]
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Self::COMPARISONS.into_iter().find(|op| op.symbol() == symbol.trim())
    }
}

impl fmt::Display for ConditionOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
