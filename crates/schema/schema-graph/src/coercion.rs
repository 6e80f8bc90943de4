// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Scalar coercion between runtime values, variable values and query literals.
//!
//! The three directions fail with three distinct error types so a caller can tell a bad
//! result value (serialize) from bad input (parse value, parse literal).

use async_graphql_value::{ConstValue, Number, Value};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct CoercingSerializeError {
    pub message: String,
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct CoercingParseValueError {
    pub message: String,
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct CoercingParseLiteralError {
    pub message: String,
}

macro_rules! coercing_error {
    ($ty:ident, $($arg:tt)*) => {
        $ty {
            message: format!($($arg)*),
        }
    };
}

pub trait Coercing: Send + Sync {
    /// Runtime value to result value.
    fn serialize(&self, value: &ConstValue) -> Result<ConstValue, CoercingSerializeError>;

    /// Variable value to runtime value.
    fn parse_value(&self, input: &ConstValue) -> Result<ConstValue, CoercingParseValueError>;

    /// Query literal to runtime value. Variables must have been substituted by the caller.
    fn parse_literal(&self, input: &Value) -> Result<ConstValue, CoercingParseLiteralError>;
}

fn describe(value: &ConstValue) -> String {
    match value {
        ConstValue::Null => "null".to_string(),
        ConstValue::Number(_) => "a number".to_string(),
        ConstValue::String(_) => "a string".to_string(),
        ConstValue::Boolean(_) => "a boolean".to_string(),
        ConstValue::Binary(_) => "binary data".to_string(),
        ConstValue::Enum(name) => format!("enum value {name}"),
        ConstValue::List(_) => "a list".to_string(),
        ConstValue::Object(_) => "an object".to_string(),
    }
}

fn literal_kind(value: &Value) -> String {
    match value {
        Value::Variable(name) => format!("variable ${name}"),
        other => other
            .clone()
            .into_const()
            .map(|value| describe(&value))
            .unwrap_or_else(|| "a value containing variables".to_string()),
    }
}

fn as_i32(number: &Number) -> Option<i32> {
    match number.as_i64() {
        Some(value) => i32::try_from(value).ok(),
        None => number
            .as_f64()
            .filter(|value| value.fract() == 0.0)
            .filter(|value| *value >= i32::MIN as f64 && *value <= i32::MAX as f64)
            .map(|value| value as i32),
    }
}

fn finite_number(value: f64) -> Option<ConstValue> {
    Number::from_f64(value).map(ConstValue::Number)
}

/// 32-bit signed integers.
pub struct IntCoercing;

impl Coercing for IntCoercing {
    fn serialize(&self, value: &ConstValue) -> Result<ConstValue, CoercingSerializeError> {
        let int = match value {
            ConstValue::Number(number) => as_i32(number),
            ConstValue::String(text) => text.trim().parse::<i32>().ok(),
            _ => None,
        };
        int.map(|int| ConstValue::Number(int.into())).ok_or_else(|| {
            coercing_error!(
                CoercingSerializeError,
                "Expected a value that can be converted to type 'Int' but it was {}",
                describe(value)
            )
        })
    }

    fn parse_value(&self, input: &ConstValue) -> Result<ConstValue, CoercingParseValueError> {
        match input {
            ConstValue::Number(number) => as_i32(number)
                .map(|int| ConstValue::Number(int.into()))
                .ok_or_else(|| {
                    coercing_error!(
                        CoercingParseValueError,
                        "Expected a value that fits a 32-bit signed integer but it was {number}"
                    )
                }),
            other => Err(coercing_error!(
                CoercingParseValueError,
                "Expected type 'Int' but was {}",
                describe(other)
            )),
        }
    }

    fn parse_literal(&self, input: &Value) -> Result<ConstValue, CoercingParseLiteralError> {
        match input {
            Value::Number(number) if number.is_i64() || number.is_u64() => as_i32(number)
                .map(|int| ConstValue::Number(int.into()))
                .ok_or_else(|| {
                    coercing_error!(
                        CoercingParseLiteralError,
                        "Expected value to be in the Integer range but it was {number}"
                    )
                }),
            other => Err(coercing_error!(
                CoercingParseLiteralError,
                "Expected an integer literal but was {}",
                literal_kind(other)
            )),
        }
    }
}

/// Double precision, finite floating point numbers.
pub struct FloatCoercing;

impl Coercing for FloatCoercing {
    fn serialize(&self, value: &ConstValue) -> Result<ConstValue, CoercingSerializeError> {
        let float = match value {
            ConstValue::Number(number) => number.as_f64(),
            ConstValue::String(text) => text.trim().parse::<f64>().ok(),
            _ => None,
        };
        float.and_then(finite_number).ok_or_else(|| {
            coercing_error!(
                CoercingSerializeError,
                "Expected a value that can be converted to type 'Float' but it was {}",
                describe(value)
            )
        })
    }

    fn parse_value(&self, input: &ConstValue) -> Result<ConstValue, CoercingParseValueError> {
        match input {
            ConstValue::Number(number) => number
                .as_f64()
                .and_then(finite_number)
                .ok_or_else(|| coercing_error!(CoercingParseValueError, "Invalid float {number}")),
            other => Err(coercing_error!(
                CoercingParseValueError,
                "Expected type 'Float' but was {}",
                describe(other)
            )),
        }
    }

    fn parse_literal(&self, input: &Value) -> Result<ConstValue, CoercingParseLiteralError> {
        match input {
            Value::Number(number) => number.as_f64().and_then(finite_number).ok_or_else(|| {
                coercing_error!(CoercingParseLiteralError, "Invalid float literal {number}")
            }),
            other => Err(coercing_error!(
                CoercingParseLiteralError,
                "Expected a numeric literal but was {}",
                literal_kind(other)
            )),
        }
    }
}

pub struct StringCoercing;

impl Coercing for StringCoercing {
    fn serialize(&self, value: &ConstValue) -> Result<ConstValue, CoercingSerializeError> {
        match value {
            ConstValue::String(_) => Ok(value.clone()),
            ConstValue::Number(number) => Ok(ConstValue::String(number.to_string())),
            ConstValue::Boolean(boolean) => Ok(ConstValue::String(boolean.to_string())),
            ConstValue::Enum(name) => Ok(ConstValue::String(name.to_string())),
            other => Err(coercing_error!(
                CoercingSerializeError,
                "Expected a value that can be converted to type 'String' but it was {}",
                describe(other)
            )),
        }
    }

    fn parse_value(&self, input: &ConstValue) -> Result<ConstValue, CoercingParseValueError> {
        match input {
            ConstValue::String(_) => Ok(input.clone()),
            other => Err(coercing_error!(
                CoercingParseValueError,
                "Expected type 'String' but was {}",
                describe(other)
            )),
        }
    }

    fn parse_literal(&self, input: &Value) -> Result<ConstValue, CoercingParseLiteralError> {
        match input {
            Value::String(text) => Ok(ConstValue::String(text.clone())),
            other => Err(coercing_error!(
                CoercingParseLiteralError,
                "Expected a string literal but was {}",
                literal_kind(other)
            )),
        }
    }
}

pub struct BooleanCoercing;

impl Coercing for BooleanCoercing {
    fn serialize(&self, value: &ConstValue) -> Result<ConstValue, CoercingSerializeError> {
        match value {
            ConstValue::Boolean(_) => Ok(value.clone()),
            ConstValue::String(text) if text == "true" || text == "false" => {
                Ok(ConstValue::Boolean(text == "true"))
            }
            other => Err(coercing_error!(
                CoercingSerializeError,
                "Expected a value that can be converted to type 'Boolean' but it was {}",
                describe(other)
            )),
        }
    }

    fn parse_value(&self, input: &ConstValue) -> Result<ConstValue, CoercingParseValueError> {
        match input {
            ConstValue::Boolean(_) => Ok(input.clone()),
            other => Err(coercing_error!(
                CoercingParseValueError,
                "Expected type 'Boolean' but was {}",
                describe(other)
            )),
        }
    }

    fn parse_literal(&self, input: &Value) -> Result<ConstValue, CoercingParseLiteralError> {
        match input {
            Value::Boolean(boolean) => Ok(ConstValue::Boolean(*boolean)),
            other => Err(coercing_error!(
                CoercingParseLiteralError,
                "Expected a boolean literal but was {}",
                literal_kind(other)
            )),
        }
    }
}

/// Identifiers: strings, also accepting integers.
pub struct IdCoercing;

impl Coercing for IdCoercing {
    fn serialize(&self, value: &ConstValue) -> Result<ConstValue, CoercingSerializeError> {
        match value {
            ConstValue::String(_) => Ok(value.clone()),
            ConstValue::Number(number) if number.is_i64() || number.is_u64() => {
                Ok(ConstValue::String(number.to_string()))
            }
            other => Err(coercing_error!(
                CoercingSerializeError,
                "Expected a value that can be converted to type 'ID' but it was {}",
                describe(other)
            )),
        }
    }

    fn parse_value(&self, input: &ConstValue) -> Result<ConstValue, CoercingParseValueError> {
        match input {
            ConstValue::String(_) => Ok(input.clone()),
            ConstValue::Number(number) if number.is_i64() || number.is_u64() => {
                Ok(ConstValue::String(number.to_string()))
            }
            other => Err(coercing_error!(
                CoercingParseValueError,
                "Expected type 'ID' but was {}",
                describe(other)
            )),
        }
    }

    fn parse_literal(&self, input: &Value) -> Result<ConstValue, CoercingParseLiteralError> {
        match input {
            Value::String(text) => Ok(ConstValue::String(text.clone())),
            Value::Number(number) if number.is_i64() || number.is_u64() => {
                Ok(ConstValue::String(number.to_string()))
            }
            other => Err(coercing_error!(
                CoercingParseLiteralError,
                "Expected a string or integer literal but was {}",
                literal_kind(other)
            )),
        }
    }
}

/// Accepts anything that contains no variables. Used for custom scalars without wiring.
pub struct PassthroughCoercing;

impl Coercing for PassthroughCoercing {
    fn serialize(&self, value: &ConstValue) -> Result<ConstValue, CoercingSerializeError> {
        Ok(value.clone())
    }

    fn parse_value(&self, input: &ConstValue) -> Result<ConstValue, CoercingParseValueError> {
        Ok(input.clone())
    }

    fn parse_literal(&self, input: &Value) -> Result<ConstValue, CoercingParseLiteralError> {
        input.clone().into_const().ok_or_else(|| {
            coercing_error!(
                CoercingParseLiteralError,
                "Literal contains unresolved variables"
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn number(value: i64) -> ConstValue {
        ConstValue::Number(value.into())
    }

    #[test]
    fn int_range() {
        assert_eq!(IntCoercing.parse_value(&number(42)).unwrap(), number(42));
        assert!(IntCoercing.parse_value(&number(i64::from(i32::MAX) + 1)).is_err());
        assert!(
            IntCoercing
                .parse_literal(&Value::Number((1_i64 << 40).into()))
                .is_err()
        );
        assert_eq!(
            IntCoercing
                .serialize(&ConstValue::String(" 7 ".to_string()))
                .unwrap(),
            number(7)
        );
    }

    #[test]
    fn int_rejects_fractions() {
        let fraction = ConstValue::Number(Number::from_f64(1.5).unwrap());
        assert!(IntCoercing.serialize(&fraction).is_err());
        assert!(
            IntCoercing
                .parse_literal(&Value::Number(Number::from_f64(1.5).unwrap()))
                .is_err()
        );
    }

    #[test]
    fn float_accepts_integers() {
        assert!(FloatCoercing.parse_literal(&Value::Number(3.into())).is_ok());
        assert!(
            FloatCoercing
                .parse_literal(&Value::String("3.0".to_string()))
                .is_err()
        );
    }

    #[test]
    fn id_accepts_integers_as_strings() {
        assert_eq!(
            IdCoercing.parse_literal(&Value::Number(12.into())).unwrap(),
            ConstValue::String("12".to_string())
        );
        assert!(IdCoercing.parse_literal(&Value::Boolean(true)).is_err());
    }

    #[test]
    fn literals_are_not_variables() {
        let variable = Value::Variable(async_graphql_value::Name::new("id"));
        let error = StringCoercing.parse_literal(&variable).unwrap_err();
        assert!(error.message.contains("$id"));
        assert!(PassthroughCoercing.parse_literal(&variable).is_err());
    }

    #[test]
    fn boolean() {
        assert_eq!(
            BooleanCoercing
                .serialize(&ConstValue::String("true".to_string()))
                .unwrap(),
            ConstValue::Boolean(true)
        );
        assert!(BooleanCoercing.parse_value(&number(1)).is_err());
    }
}
