//! Turning raw tokens into typed values.
//!
//! The engine never parses values itself: it hands the tokens that belong
//! to a spec item to the [`CodecRegistry`], which dispatches on the item's
//! [`ValueType`].

use crate::spec::ValueType;
use crate::tokenizer::merge;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur while decoding tokens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("no codec registered for value type '{0}'")]
    UnknownValueType(String),

    #[error("invalid {expected} value '{value}'")]
    InvalidValue { value: String, expected: String },

    #[error("'{value}' is not one of: {choices}")]
    InvalidChoice { value: String, choices: String },

    #[error("expected {expected} token(s), got {actual}")]
    TokenCount { expected: usize, actual: usize },
}

/// A decoded value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
}

impl Value {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items.as_slice()),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    /// Lists are shown as a command line, quoting items with blanks.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(n) => write!(f, "{}", n),
            Value::Str(s) => f.write_str(s),
            Value::List(items) => {
                let items: Vec<String> = items.iter().map(ToString::to_string).collect();
                f.write_str(&merge(&items))
            }
        }
    }
}

/// Decodes the tokens of one spec item.
///
/// Called once per resolved item with zero, one, or many tokens.
pub trait ValueCodec: Send + Sync {
    fn deserialize(&self, tokens: &[String]) -> Result<Value, CodecError>;
}

impl<F> ValueCodec for F
where
    F: Fn(&[String]) -> Result<Value, CodecError> + Send + Sync,
{
    fn deserialize(&self, tokens: &[String]) -> Result<Value, CodecError> {
        self(tokens)
    }
}

/// The only token of a scalar value.
pub fn single(tokens: &[String]) -> Result<&str, CodecError> {
    match tokens {
        [token] => Ok(token.as_str()),
        _ => Err(CodecError::TokenCount {
            expected: 1,
            actual: tokens.len(),
        }),
    }
}

fn invalid(value: &str, expected: &str) -> CodecError {
    CodecError::InvalidValue {
        value: value.to_string(),
        expected: expected.to_string(),
    }
}

struct StringCodec;

impl ValueCodec for StringCodec {
    fn deserialize(&self, tokens: &[String]) -> Result<Value, CodecError> {
        single(tokens).map(|s| Value::Str(s.to_string()))
    }
}

struct IntCodec;

impl ValueCodec for IntCodec {
    fn deserialize(&self, tokens: &[String]) -> Result<Value, CodecError> {
        let token = single(tokens)?;
        token
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| invalid(token, "int"))
    }
}

struct FloatCodec;

impl ValueCodec for FloatCodec {
    fn deserialize(&self, tokens: &[String]) -> Result<Value, CodecError> {
        let token = single(tokens)?;
        token
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| invalid(token, "float"))
    }
}

/// Strict `true`/`false`.
struct BoolCodec;

impl ValueCodec for BoolCodec {
    fn deserialize(&self, tokens: &[String]) -> Result<Value, CodecError> {
        match single(tokens)? {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            other => Err(invalid(other, "bool")),
        }
    }
}

/// Lookup table from value type to codec.
///
/// Leaf types are looked up directly. `List` and `OneOf` types use a codec
/// registered for the exact type when there is one, and are otherwise
/// decoded through their element or base type.
#[derive(Clone)]
pub struct CodecRegistry {
    codecs: HashMap<ValueType, Arc<dyn ValueCodec>>,
}

impl Default for CodecRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry
            .register(ValueType::String, StringCodec)
            .register(ValueType::Int, IntCodec)
            .register(ValueType::Float, FloatCodec)
            .register(ValueType::Bool, BoolCodec);
        registry
    }
}

impl fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types: Vec<String> = self.codecs.keys().map(ToString::to_string).collect();
        types.sort();
        f.debug_struct("CodecRegistry").field("types", &types).finish()
    }
}

impl CodecRegistry {
    /// A registry without any codec.
    pub fn empty() -> Self {
        Self {
            codecs: HashMap::new(),
        }
    }

    /// Register `codec` for `value_type`, replacing any previous one.
    pub fn register<C>(&mut self, value_type: ValueType, codec: C) -> &mut Self
    where
        C: ValueCodec + 'static,
    {
        self.codecs.insert(value_type, Arc::new(codec));
        self
    }

    /// Whether tokens of `value_type` can be decoded.
    pub fn supports(&self, value_type: &ValueType) -> bool {
        if self.codecs.contains_key(value_type) {
            return true;
        }
        match value_type {
            ValueType::List(element) => self.supports(element),
            ValueType::OneOf { base, .. } => self.supports(base),
            _ => false,
        }
    }

    /// Decode `tokens` as `value_type`.
    pub fn deserialize(
        &self,
        value_type: &ValueType,
        tokens: &[String],
    ) -> Result<Value, CodecError> {
        if let Some(codec) = self.codecs.get(value_type) {
            return codec.deserialize(tokens);
        }
        if !self.supports(value_type) {
            return Err(CodecError::UnknownValueType(value_type.to_string()));
        }

        match value_type {
            ValueType::List(element) => tokens
                .iter()
                .map(|token| self.deserialize(element, std::slice::from_ref(token)))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
            ValueType::OneOf { base, choices } => {
                if let Some(bad) = tokens.iter().find(|t| !choices.contains(*t)) {
                    return Err(CodecError::InvalidChoice {
                        value: bad.clone(),
                        choices: choices.join(", "),
                    });
                }
                self.deserialize(base, tokens)
            }
            other => Err(CodecError::UnknownValueType(other.to_string())),
        }
    }
}
