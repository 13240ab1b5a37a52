pub mod builder;
pub mod predicate;

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A user-editable threshold predicate over one contract function.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Rule {
    pub function_name: String,
    pub operator: Operator,
    pub value: f64,
    pub display_name: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Operator {
    GreaterThanEqual,
    LessThanEqual,
    GreaterThan,
    LessThan,
    Equal,
    NotEqual,
}

impl Operator {
    pub const ALL: [Operator; 6] = [
        Operator::GreaterThanEqual,
        Operator::LessThanEqual,
        Operator::GreaterThan,
        Operator::LessThan,
        Operator::Equal,
        Operator::NotEqual,
    ];

    pub fn as_slug(&self) -> &'static str {
        match self {
            Self::GreaterThanEqual => "greater-than-equal",
            Self::LessThanEqual => "less-than-equal",
            Self::GreaterThan => "greater-than",
            Self::LessThan => "less-than",
            Self::Equal => "equal",
            Self::NotEqual => "not-equal",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::GreaterThanEqual => ">=",
            Self::LessThanEqual => "<=",
            Self::GreaterThan => ">",
            Self::LessThan => "<",
            Self::Equal => "==",
            Self::NotEqual => "!=",
        }
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[derive(Debug, Error)]
#[error("unknown operator: {0}")]
pub struct OperatorParseError(pub String);

impl FromStr for Operator {
    type Err = OperatorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "greater-than-equal" | ">=" | "≥" | "gte" => Ok(Self::GreaterThanEqual),
            "less-than-equal" | "<=" | "≤" | "lte" => Ok(Self::LessThanEqual),
            "greater-than" | ">" | "gt" => Ok(Self::GreaterThan),
            "less-than" | "<" | "lt" => Ok(Self::LessThan),
            "equal" | "=" | "==" | "eq" => Ok(Self::Equal),
            "not-equal" | "!=" | "≠" | "ne" => Ok(Self::NotEqual),
            _ => Err(OperatorParseError(s.to_string())),
        }
    }
}
