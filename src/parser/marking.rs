//! Initial marking description
//!
//! Number of users, how their balances are chosen, and which sender
//! addresses may call each function. Numeric fields accept a JSON number or
//! a numeric string since the upstream tools emit both.

use serde::{Deserialize, Deserializer};

use crate::error::{Error, Result};

/// Marking document
#[derive(Debug, Clone, Deserialize)]
pub struct MarkingSpec {
    #[serde(rename = "NumberOfUser", deserialize_with = "number_or_string")]
    pub number_of_users: i64,
    pub balance: BalancePolicy,
    #[serde(default)]
    pub smart_contract: Vec<ContractMarking>,
}

/// How user balances are chosen
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BalancePolicy {
    /// Every user gets the same balance
    Fixed {
        #[serde(deserialize_with = "number_or_string")]
        fixed: i64,
    },
    /// Explicit comma separated balances, used verbatim
    Map { map: String },
    /// Independent uniform draws over an inclusive range
    Random { random: ValueRange },
}

/// Inclusive integer range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ValueRange {
    #[serde(deserialize_with = "number_or_string")]
    pub from: i64,
    #[serde(deserialize_with = "number_or_string")]
    pub to: i64,
}

impl ValueRange {
    pub fn new(from: i64, to: i64) -> Self {
        ValueRange { from, to }
    }

    /// Reject empty ranges
    pub fn validate(&self, field: &str) -> Result<()> {
        if self.from > self.to {
            return Err(Error::InvalidValue {
                field: field.to_string(),
                value: format!("{}..{}", self.from, self.to),
                reason: "`from` is greater than `to`".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContractMarking {
    pub name: String,
    #[serde(default)]
    pub functions: Vec<FunctionMarking>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FunctionMarking {
    pub name: String,
    pub sender_value: ValueRange,
}

impl MarkingSpec {
    pub fn from_json(text: &str) -> Result<Self> {
        Error::from_json(text, "marking")
    }

    /// Sender ranges of the contract entry named `contract`
    pub fn functions_of(&self, contract: &str) -> &[FunctionMarking] {
        self.smart_contract
            .iter()
            .find(|c| c.name == contract)
            .map(|c| c.functions.as_slice())
            .unwrap_or(&[])
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(i64),
    Text(String),
}

fn number_or_string<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("expected an integer, found `{}`", s))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_string_numbers() {
        let marking = MarkingSpec::from_json(
            r#"{"NumberOfUser": "3", "balance": {"type": "fixed", "fixed": "10"},
                "smart_contract": [{"name": "Bank", "functions": [
                    {"name": "deposit", "sender_value": {"from": "1", "to": 2}}]}]}"#,
        )
        .unwrap();
        assert_eq!(marking.number_of_users, 3);
        assert_eq!(marking.balance, BalancePolicy::Fixed { fixed: 10 });
        assert_eq!(marking.functions_of("Bank")[0].sender_value, ValueRange::new(1, 2));
        assert!(marking.functions_of("Other").is_empty());
    }

    #[test]
    fn test_decode_policies() {
        let random = MarkingSpec::from_json(
            r#"{"NumberOfUser": 2, "balance": {"type": "random", "random": {"from": 5, "to": 9}}}"#,
        )
        .unwrap();
        assert_eq!(
            random.balance,
            BalancePolicy::Random {
                random: ValueRange::new(5, 9)
            }
        );

        let map = MarkingSpec::from_json(
            r#"{"NumberOfUser": 2, "balance": {"type": "map", "map": "3,4"}}"#,
        )
        .unwrap();
        assert_eq!(map.balance, BalancePolicy::Map { map: "3,4".to_string() });
    }

    #[test]
    fn test_rejects_bad_input() {
        let err = MarkingSpec::from_json(r#"{"balance": {"type": "map", "map": "1"}}"#).unwrap_err();
        assert!(matches!(err, Error::MissingField { ref field, .. } if field == "NumberOfUser"));

        assert!(MarkingSpec::from_json(
            r#"{"NumberOfUser": "many", "balance": {"type": "map", "map": "1"}}"#
        )
        .is_err());

        assert!(ValueRange::new(4, 2).validate("sender_value").is_err());
        assert!(ValueRange::new(2, 2).validate("sender_value").is_ok());
    }
}
