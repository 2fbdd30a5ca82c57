//! Serde helpers for `Decimal` values.
//!
//! Decimals are written as strings to keep precision, and read from either a
//! JSON number or a string since the backend is not consistent about it.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum NumOrString {
    Num(f64),
    Str(String),
}

fn parse<E: serde::de::Error>(raw: NumOrString) -> Result<Decimal, E> {
    match raw {
        NumOrString::Num(n) => Decimal::try_from(n).map_err(E::custom),
        NumOrString::Str(s) => Decimal::from_str_exact(s.trim()).map_err(E::custom),
    }
}

pub fn serialize<S>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&value.to_string())
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    parse(NumOrString::deserialize(deserializer)?)
}

/// Same as the parent module but for `Option<Decimal>`.
pub mod option {
    use super::*;

    pub fn serialize<S>(value: &Option<Decimal>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(v) => serializer.serialize_some(&v.to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<NumOrString>::deserialize(deserializer)? {
            Some(raw) => parse(raw).map(Some),
            None => Ok(None),
        }
    }
}

/// Rate tables keyed by currency code. Codes are upper-cased on read.
pub mod rates {
    use super::*;
    use serde::ser::SerializeMap;

    pub fn serialize<S>(rates: &HashMap<String, Decimal>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(rates.len()))?;
        for (code, rate) in rates {
            map.serialize_entry(code, &rate.to_string())?;
        }
        map.end()
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<HashMap<String, Decimal>, D::Error>
    where
        D: Deserializer<'de>,
    {
        HashMap::<String, NumOrString>::deserialize(deserializer)?
            .into_iter()
            .map(|(code, raw)| parse::<D::Error>(raw).map(|rate| (code.to_uppercase(), rate)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;
    use std::str::FromStr;

    #[derive(Serialize, Deserialize)]
    struct Wrapper {
        #[serde(with = "super")]
        amount: Decimal,
        #[serde(with = "super::rates")]
        rates: HashMap<String, Decimal>,
    }

    #[test]
    fn test_accepts_numbers_and_strings() {
        let json = r#"{"amount": "10.50", "rates": {"eur": 0.92, "GBP": "0.79"}}"#;
        let parsed: Wrapper = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.amount, Decimal::from_str("10.50").unwrap());
        assert_eq!(parsed.rates["EUR"].round_dp(6), Decimal::from_str("0.92").unwrap());
        assert_eq!(parsed.rates["GBP"], Decimal::from_str("0.79").unwrap());
    }

    #[test]
    fn test_writes_strings() {
        let w = Wrapper {
            amount: Decimal::from_str("1.25").unwrap(),
            rates: HashMap::new(),
        };
        let value = serde_json::to_value(&w).unwrap();
        assert_eq!(value["amount"], "1.25");
    }

    #[test]
    fn test_rejects_non_numeric_rate() {
        let json = r#"{"amount": 1, "rates": {"EUR": true}}"#;
        assert!(serde_json::from_str::<Wrapper>(json).is_err());
    }
}
