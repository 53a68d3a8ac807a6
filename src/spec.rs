//! Declarative description of the options and positional arguments to bind.

use std::fmt;
use thiserror::Error;

/// Prefix of a long option (`--name`).
pub const LONG_PREFIX: &str = "--";
/// Prefix of a short option (`-n`).
pub const SHORT_PREFIX: &str = "-";
/// Token that ends option scanning.
pub const END_OF_OPTIONS: &str = "--";

/// Errors raised when a spec item breaks its invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpecError {
    #[error("option '{0}' has neither a short nor a long name")]
    Unnamed(String),

    #[error("option '{0}' has an empty long name")]
    EmptyLongName(String),

    #[error("option '{0}' has an invalid short name '{1}'")]
    InvalidShortName(String, char),

    #[error("positional argument '{0}' cannot be a switch")]
    SwitchArgument(String),
}

/// How many values a spec item accepts.
///
/// The declaration order doubles as the order in which options are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Arity {
    /// No value, presence only.
    Switch,
    /// Exactly one value.
    Scalar,
    /// Any number of values.
    Sequence,
}

/// Semantic type tag used to look up a value codec.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum ValueType {
    #[default]
    String,
    Int,
    Float,
    Bool,
    /// A host-defined type registered under this name.
    Custom(String),
    /// A base type restricted to a fixed set of raw values.
    OneOf {
        base: Box<ValueType>,
        choices: Vec<String>,
    },
    /// A list of the element type.
    List(Box<ValueType>),
}

impl ValueType {
    /// Wrap this type into a list of it.
    pub fn list(self) -> ValueType {
        ValueType::List(Box::new(self))
    }

    /// Restrict this type to `choices`.
    pub fn one_of<I, S>(self, choices: I) -> ValueType
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ValueType::OneOf {
            base: Box::new(self),
            choices: choices.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse a type name as written in configuration.
    pub fn from_name(name: &str) -> ValueType {
        match name {
            "string" => ValueType::String,
            "int" => ValueType::Int,
            "float" => ValueType::Float,
            "bool" => ValueType::Bool,
            other => ValueType::Custom(other.to_string()),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::String => f.write_str("string"),
            ValueType::Int => f.write_str("int"),
            ValueType::Float => f.write_str("float"),
            ValueType::Bool => f.write_str("bool"),
            ValueType::Custom(name) => f.write_str(name),
            ValueType::OneOf { base, choices } => {
                write!(f, "{} in [{}]", base, choices.join(", "))
            }
            ValueType::List(element) => write!(f, "list<{}>", element),
        }
    }
}

/// A named option such as `-v`, `--count 5` or `--tag a --tag b`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionSpec {
    /// Label used to report and look up the bound value.
    pub name: String,
    pub short: Option<char>,
    pub long: Option<String>,
    pub arity: Arity,
    pub value_type: ValueType,
    pub required: bool,
    /// Raw command-line text used when the option is not given.
    pub default: Option<String>,
}

impl OptionSpec {
    fn new(name: impl Into<String>, arity: Arity, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            short: None,
            long: None,
            arity,
            value_type,
            required: false,
            default: None,
        }
    }

    /// A presence-only option bound to a boolean.
    pub fn switch(name: impl Into<String>) -> Self {
        Self::new(name, Arity::Switch, ValueType::Bool)
    }

    /// An option taking exactly one value.
    pub fn scalar(name: impl Into<String>, value_type: ValueType) -> Self {
        Self::new(name, Arity::Scalar, value_type)
    }

    /// A repeatable option collecting a list of `element` values.
    pub fn sequence(name: impl Into<String>, element: ValueType) -> Self {
        Self::new(name, Arity::Sequence, element.list())
    }

    pub fn short(mut self, short: char) -> Self {
        self.short = Some(short);
        self
    }

    pub fn long(mut self, long: impl Into<String>) -> Self {
        self.long = Some(long.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn default_value(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// The most specific way to spell this option, for messages.
    pub fn display_name(&self) -> String {
        match (&self.long, self.short) {
            (Some(long), _) => format!("{}{}", LONG_PREFIX, long),
            (None, Some(short)) => format!("{}{}", SHORT_PREFIX, short),
            (None, None) => self.name.clone(),
        }
    }

    fn validate(&self) -> Result<(), SpecError> {
        if self.short.is_none() && self.long.is_none() {
            return Err(SpecError::Unnamed(self.name.clone()));
        }
        if self.long.as_deref() == Some("") {
            return Err(SpecError::EmptyLongName(self.name.clone()));
        }
        if let Some(short) = self.short {
            if short == '-' || short == '=' || short.is_whitespace() {
                return Err(SpecError::InvalidShortName(self.name.clone(), short));
            }
        }
        Ok(())
    }
}

/// A positional argument, bound in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentSpec {
    pub name: String,
    pub arity: Arity,
    pub value_type: ValueType,
    pub required: bool,
    pub default: Option<String>,
}

impl ArgumentSpec {
    fn new(name: impl Into<String>, arity: Arity, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            arity,
            value_type,
            required: false,
            default: None,
        }
    }

    /// A positional taking the next single token.
    pub fn scalar(name: impl Into<String>, value_type: ValueType) -> Self {
        Self::new(name, Arity::Scalar, value_type)
    }

    /// A positional taking every token left.
    pub fn sequence(name: impl Into<String>, element: ValueType) -> Self {
        Self::new(name, Arity::Sequence, element.list())
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn default_value(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// What the engine needs to know about any spec item.
pub trait SpecItem {
    fn name(&self) -> &str;
    /// How the item is shown in error messages.
    fn label(&self) -> String;
    fn arity(&self) -> Arity;
    fn value_type(&self) -> &ValueType;
    fn is_required(&self) -> bool;
    fn default_text(&self) -> Option<&str>;
}

impl SpecItem for OptionSpec {
    fn name(&self) -> &str {
        &self.name
    }

    fn label(&self) -> String {
        self.display_name()
    }

    fn arity(&self) -> Arity {
        self.arity
    }

    fn value_type(&self) -> &ValueType {
        &self.value_type
    }

    fn is_required(&self) -> bool {
        self.required
    }

    fn default_text(&self) -> Option<&str> {
        self.default.as_deref()
    }
}

impl SpecItem for ArgumentSpec {
    fn name(&self) -> &str {
        &self.name
    }

    fn label(&self) -> String {
        format!("<{}>", self.name)
    }

    fn arity(&self) -> Arity {
        self.arity
    }

    fn value_type(&self) -> &ValueType {
        &self.value_type
    }

    fn is_required(&self) -> bool {
        self.required
    }

    fn default_text(&self) -> Option<&str> {
        self.default.as_deref()
    }
}

/// Identity of a spec item inside its [`Specs`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SpecId {
    Option(usize),
    Argument(usize),
}

/// The ordered options and positional arguments of one command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Specs {
    options: Vec<OptionSpec>,
    arguments: Vec<ArgumentSpec>,
}

impl Specs {
    /// Build a spec set, checking each item's invariants.
    pub fn new(
        options: Vec<OptionSpec>,
        arguments: Vec<ArgumentSpec>,
    ) -> Result<Specs, SpecError> {
        for option in &options {
            option.validate()?;
        }
        for argument in &arguments {
            if argument.arity == Arity::Switch {
                return Err(SpecError::SwitchArgument(argument.name.clone()));
            }
        }
        Ok(Specs { options, arguments })
    }

    pub fn options(&self) -> &[OptionSpec] {
        &self.options
    }

    pub fn arguments(&self) -> &[ArgumentSpec] {
        &self.arguments
    }

    pub fn option(&self, index: usize) -> Option<&OptionSpec> {
        self.options.get(index)
    }

    pub fn argument(&self, index: usize) -> Option<&ArgumentSpec> {
        self.arguments.get(index)
    }

    /// Name of the item behind `id`, if it belongs to this set.
    pub fn name_of(&self, id: SpecId) -> Option<&str> {
        match id {
            SpecId::Option(i) => self.options.get(i).map(|o| o.name.as_str()),
            SpecId::Argument(i) => self.arguments.get(i).map(|a| a.name.as_str()),
        }
    }

    /// Find an item by its name, options first.
    pub fn find(&self, name: &str) -> Option<SpecId> {
        self.options
            .iter()
            .position(|o| o.name == name)
            .map(SpecId::Option)
            .or_else(|| {
                self.arguments
                    .iter()
                    .position(|a| a.name == name)
                    .map(SpecId::Argument)
            })
    }
}
