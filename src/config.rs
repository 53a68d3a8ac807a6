//! JSON configuration describing a command's options and positional arguments.

use crate::spec::{ArgumentSpec, OptionSpec, SpecError, Specs, ValueType};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during config parsing and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse JSON config: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("duplicate argument name: {0}")]
    DuplicateName(String),

    #[error("invalid short option '{0}': must be a single ASCII letter")]
    InvalidShortOption(String),

    #[error("option '{0}' is declared by more than one argument")]
    DuplicateOption(String),

    #[error("positional argument '{0}' cannot have a short or long option")]
    NamedPositional(String),

    #[error("positional argument '{0}' takes all remaining values and must be the last positional")]
    SequenceNotLast(String),

    #[error("'multiple' cannot be used with flag type on argument '{0}'")]
    MultipleOnFlag(String),

    #[error("duplicate subcommand name: {0}")]
    DuplicateSubcommandName(String),

    #[error("'choices' on argument '{0}' is empty: must have at least one valid value")]
    EmptyChoices(String),

    #[error("'choices' on argument '{0}' has duplicate value: {1}")]
    DuplicateChoice(String, String),

    #[error("'choices' cannot be used with flag type on argument '{0}'")]
    ChoicesOnFlag(String),

    #[error("'value_type' cannot be used with flag type on argument '{0}'")]
    ValueTypeOnFlag(String),

    #[error("'required' cannot be used with flag type on argument '{0}'")]
    RequiredOnFlag(String),

    #[error("'default' cannot be used with flag type on argument '{0}'")]
    DefaultOnFlag(String),

    #[error("positional argument '{0}' cannot be declared alongside subcommands")]
    PositionalWithSubcommands(String),

    #[error(transparent)]
    Spec(#[from] SpecError),
}

/// The type of argument.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgType {
    /// A boolean flag (e.g., --verbose)
    Flag,
    /// An option that takes a value (e.g., --output file.txt)
    Option,
    /// A positional argument
    Positional,
}

impl<'de> Deserialize<'de> for ValueType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct ValueTypeVisitor;

        impl<'de> Visitor<'de> for ValueTypeVisitor {
            type Value = ValueType;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("a value type name")
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                if value.is_empty() {
                    return Err(de::Error::custom("value type name cannot be empty"));
                }
                Ok(ValueType::from_name(value))
            }
        }

        deserializer.deserialize_str(ValueTypeVisitor)
    }
}

/// Configuration for a single argument.
#[derive(Debug, Clone, Deserialize)]
pub struct ArgConfig {
    /// The name the bound value is reported under
    pub name: String,
    /// Short option character (e.g., 'v' for -v)
    pub short: Option<char>,
    /// Long option name (e.g., "verbose" for --verbose)
    pub long: Option<String>,
    /// The type of argument
    #[serde(rename = "type")]
    pub arg_type: ArgType,
    /// Whether this argument is required
    #[serde(default)]
    pub required: bool,
    /// Default value if not provided, as command-line text
    pub default: Option<String>,
    /// Collect every occurrence/value into a list
    #[serde(default)]
    pub multiple: bool,
    /// Allowed values for this argument
    #[serde(default)]
    pub choices: Option<Vec<String>>,
    /// Codec used for the values: "string" (default), "int", "float",
    /// "bool" or a host-registered name
    #[serde(default)]
    pub value_type: ValueType,
}

/// Configuration for a subcommand.
#[derive(Debug, Clone, Deserialize)]
pub struct SubcommandConfig {
    /// The name of the subcommand
    pub name: String,
    /// Arguments for this subcommand
    #[serde(default)]
    pub args: Vec<ArgConfig>,
}

/// Top-level configuration for a command.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Name of the command
    pub name: Option<String>,
    /// Environment variable prefix for shell output (default: "CMDBIND_")
    pub prefix: Option<String>,
    /// List of argument configurations
    #[serde(default)]
    pub args: Vec<ArgConfig>,
    /// Subcommands, selected by the first token naming one
    #[serde(default)]
    pub subcommands: Vec<SubcommandConfig>,
}

impl Config {
    /// Parse a JSON string into a Config.
    pub fn from_json(json: &str) -> Result<Config, ConfigError> {
        let config: Config = serde_json::from_str(json)?;
        Ok(config)
    }

    /// Read and parse a JSON config file.
    pub fn from_file(path: &Path) -> Result<Config, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_args(&self.args)?;

        // Top-level positionals would take the subcommand name
        if !self.subcommands.is_empty() {
            if let Some(arg) = self.args.iter().find(|a| a.arg_type == ArgType::Positional) {
                return Err(ConfigError::PositionalWithSubcommands(arg.name.clone()));
            }
        }

        let mut subcmd_names = HashSet::new();
        for subcmd in &self.subcommands {
            if !subcmd_names.insert(&subcmd.name) {
                return Err(ConfigError::DuplicateSubcommandName(subcmd.name.clone()));
            }
            validate_args(&subcmd.args)?;
        }

        Ok(())
    }

    /// Build the specs of the top-level command.
    pub fn specs(&self) -> Result<Specs, ConfigError> {
        build_specs(&self.args)
    }

    pub fn subcommand(&self, name: &str) -> Option<&SubcommandConfig> {
        self.subcommands.iter().find(|s| s.name == name)
    }

    /// Get the effective prefix, using the default if none is set.
    pub fn effective_prefix(&self) -> &str {
        self.prefix.as_deref().unwrap_or("CMDBIND_")
    }
}

impl SubcommandConfig {
    pub fn specs(&self) -> Result<Specs, ConfigError> {
        build_specs(&self.args)
    }
}

impl ArgConfig {
    /// Get the effective short option for this argument.
    /// A single-character name is used as the short option when neither
    /// short nor long is specified.
    pub fn effective_short(&self) -> Option<char> {
        if self.short.is_some() || self.long.is_some() || self.arg_type == ArgType::Positional {
            return self.short;
        }
        let mut chars = self.name.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Some(c),
            _ => None,
        }
    }

    /// Get the effective long option for this argument.
    /// Returns the specified long option, or falls back to the argument name
    /// for non-positional arguments that have no short option and a name
    /// longer than one character.
    pub fn effective_long(&self) -> Option<&str> {
        if self.long.is_some() {
            return self.long.as_deref();
        }
        if self.arg_type != ArgType::Positional
            && self.short.is_none()
            && self.effective_short().is_none()
        {
            return Some(&self.name);
        }
        None
    }

    /// The value type with `choices` applied.
    pub fn effective_value_type(&self) -> ValueType {
        match self.choices {
            Some(ref choices) => self.value_type.clone().one_of(choices.iter().cloned()),
            None => self.value_type.clone(),
        }
    }

    fn to_option_spec(&self) -> OptionSpec {
        let mut spec = match (&self.arg_type, self.multiple) {
            (ArgType::Flag, _) => OptionSpec::switch(&self.name),
            (_, true) => OptionSpec::sequence(&self.name, self.effective_value_type()),
            (_, false) => OptionSpec::scalar(&self.name, self.effective_value_type()),
        };
        spec.short = self.effective_short();
        spec.long = self.effective_long().map(str::to_string);
        spec.required = self.required;
        spec.default = self.default.clone();
        spec
    }

    fn to_argument_spec(&self) -> ArgumentSpec {
        let mut spec = if self.multiple {
            ArgumentSpec::sequence(&self.name, self.effective_value_type())
        } else {
            ArgumentSpec::scalar(&self.name, self.effective_value_type())
        };
        spec.required = self.required;
        spec.default = self.default.clone();
        spec
    }
}

fn build_specs(args: &[ArgConfig]) -> Result<Specs, ConfigError> {
    let mut options = Vec::new();
    let mut arguments = Vec::new();

    for arg in args {
        match arg.arg_type {
            ArgType::Positional => arguments.push(arg.to_argument_spec()),
            _ => options.push(arg.to_option_spec()),
        }
    }

    Ok(Specs::new(options, arguments)?)
}

/// Validate the arguments of one command.
fn validate_args(args: &[ArgConfig]) -> Result<(), ConfigError> {
    let mut names = HashSet::new();
    let mut option_names = HashSet::new();

    for arg in args {
        // Check for duplicate names
        if !names.insert(&arg.name) {
            return Err(ConfigError::DuplicateName(arg.name.clone()));
        }

        validate_arg(arg)?;

        if let Some(short) = arg.effective_short() {
            if !option_names.insert(format!("-{}", short)) {
                return Err(ConfigError::DuplicateOption(format!("-{}", short)));
            }
        }
        if let Some(long) = arg.effective_long() {
            if !option_names.insert(format!("--{}", long)) {
                return Err(ConfigError::DuplicateOption(format!("--{}", long)));
            }
        }
    }

    // A multiple positional swallows everything after it
    let positionals: Vec<&ArgConfig> = args
        .iter()
        .filter(|a| a.arg_type == ArgType::Positional)
        .collect();
    if let Some((_, init)) = positionals.split_last() {
        if let Some(greedy) = init.iter().find(|a| a.multiple) {
            return Err(ConfigError::SequenceNotLast(greedy.name.clone()));
        }
    }

    Ok(())
}

/// Validate a single argument configuration.
fn validate_arg(arg: &ArgConfig) -> Result<(), ConfigError> {
    // Validate short option
    if let Some(short) = arg.effective_short() {
        if !short.is_ascii_alphabetic() {
            return Err(ConfigError::InvalidShortOption(short.to_string()));
        }
    }

    match arg.arg_type {
        ArgType::Positional => {
            if arg.short.is_some() || arg.long.is_some() {
                return Err(ConfigError::NamedPositional(arg.name.clone()));
            }
        }
        ArgType::Flag => {
            if arg.multiple {
                return Err(ConfigError::MultipleOnFlag(arg.name.clone()));
            }
            // value_type cannot be used with flags (flags are boolean by nature)
            if arg.value_type != ValueType::String {
                return Err(ConfigError::ValueTypeOnFlag(arg.name.clone()));
            }
            if arg.required {
                return Err(ConfigError::RequiredOnFlag(arg.name.clone()));
            }
            if arg.default.is_some() {
                return Err(ConfigError::DefaultOnFlag(arg.name.clone()));
            }
        }
        ArgType::Option => {}
    }

    validate_choices(arg)
}

/// Validate choices field on an argument.
fn validate_choices(arg: &ArgConfig) -> Result<(), ConfigError> {
    if let Some(ref choices) = arg.choices {
        // Choices cannot be used with flags
        if arg.arg_type == ArgType::Flag {
            return Err(ConfigError::ChoicesOnFlag(arg.name.clone()));
        }

        // Choices must not be empty
        if choices.is_empty() {
            return Err(ConfigError::EmptyChoices(arg.name.clone()));
        }

        // Check for duplicates
        let mut seen = HashSet::new();
        for choice in choices {
            if !seen.insert(choice) {
                return Err(ConfigError::DuplicateChoice(
                    arg.name.clone(),
                    choice.clone(),
                ));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{Arity, SpecId};
    use std::io::Write;

    #[test]
    fn test_parse_full_config() {
        let json = r#"{
            "name": "mytool",
            "prefix": "MYAPP_",
            "args": [
                {"name": "verbose", "short": "v", "long": "verbose", "type": "flag"},
                {"name": "output", "short": "o", "long": "output", "type": "option", "required": true},
                {"name": "input", "type": "positional", "required": true}
            ]
        }"#;

        let config = Config::from_json(json).unwrap();
        assert_eq!(config.name, Some("mytool".to_string()));
        assert_eq!(config.prefix, Some("MYAPP_".to_string()));
        assert_eq!(config.args.len(), 3);

        let verbose = &config.args[0];
        assert_eq!(verbose.short, Some('v'));
        assert_eq!(verbose.arg_type, ArgType::Flag);
        assert!(!verbose.required);

        let output = &config.args[1];
        assert_eq!(output.arg_type, ArgType::Option);
        assert!(output.required);

        let input = &config.args[2];
        assert_eq!(input.arg_type, ArgType::Positional);

        config.validate().unwrap();
    }

    #[test]
    fn test_parse_minimal_config() {
        let config = Config::from_json(r#"{"name": "minimal"}"#).unwrap();
        assert!(config.prefix.is_none());
        assert!(config.args.is_empty());
        assert!(config.subcommands.is_empty());
        config.validate().unwrap();
    }

    #[test]
    fn test_invalid_json() {
        let result = Config::from_json("{not json");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_value_type_names() {
        let json = r#"{"args": [
            {"name": "a", "type": "option", "value_type": "int"},
            {"name": "b", "type": "option", "value_type": "float"},
            {"name": "c", "type": "option", "value_type": "path"},
            {"name": "d", "type": "option"}
        ]}"#;
        let config = Config::from_json(json).unwrap();
        assert_eq!(config.args[0].value_type, ValueType::Int);
        assert_eq!(config.args[1].value_type, ValueType::Float);
        assert_eq!(
            config.args[2].value_type,
            ValueType::Custom("path".to_string())
        );
        assert_eq!(config.args[3].value_type, ValueType::String);
    }

    #[test]
    fn test_empty_value_type_rejected() {
        let json = r#"{"args": [{"name": "a", "type": "option", "value_type": ""}]}"#;
        assert!(Config::from_json(json).is_err());
    }

    #[test]
    fn test_error_on_duplicate_arg_names() {
        let json = r#"{
            "args": [
                {"name": "dup", "short": "a", "type": "flag"},
                {"name": "dup", "short": "b", "type": "flag"}
            ]
        }"#;
        let config = Config::from_json(json).unwrap();
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::DuplicateName(name)) if name == "dup"));
    }

    #[test]
    fn test_error_on_invalid_short_option() {
        let json = r#"{"args": [{"name": "bad", "short": "1", "type": "flag"}]}"#;
        let config = Config::from_json(json).unwrap();
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::InvalidShortOption(_))));
    }

    #[test]
    fn test_error_on_shared_option_name() {
        let json = r#"{
            "args": [
                {"name": "verbose", "short": "v", "type": "flag"},
                {"name": "version", "short": "v", "type": "flag"}
            ]
        }"#;
        let config = Config::from_json(json).unwrap();
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::DuplicateOption(opt)) if opt == "-v"));
    }

    #[test]
    fn test_no_option_specified_uses_name_as_long() {
        let json = r#"{"args": [{"name": "verbose", "type": "flag"}]}"#;
        let config = Config::from_json(json).unwrap();
        config.validate().unwrap();
        assert_eq!(config.args[0].effective_long(), Some("verbose"));
        assert_eq!(config.args[0].effective_short(), None);
    }

    #[test]
    fn test_single_char_name_used_as_short() {
        let json = r#"{"args": [{"name": "x", "type": "option"}]}"#;
        let config = Config::from_json(json).unwrap();
        assert_eq!(config.args[0].effective_short(), Some('x'));
        assert_eq!(config.args[0].effective_long(), None);
    }

    #[test]
    fn test_positional_without_short_long_is_valid() {
        let json = r#"{"args": [{"name": "input", "type": "positional"}]}"#;
        let config = Config::from_json(json).unwrap();
        config.validate().unwrap();
        assert_eq!(config.args[0].effective_long(), None);
    }

    #[test]
    fn test_error_on_named_positional() {
        let json = r#"{"args": [{"name": "input", "long": "input", "type": "positional"}]}"#;
        let config = Config::from_json(json).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NamedPositional(_))
        ));
    }

    #[test]
    fn test_error_on_multiple_positional_not_last() {
        let json = r#"{"args": [
            {"name": "files", "type": "positional", "multiple": true},
            {"name": "dest", "type": "positional"}
        ]}"#;
        let config = Config::from_json(json).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::SequenceNotLast(name)) if name == "files"
        ));
    }

    #[test]
    fn test_multiple_positional_last_is_valid() {
        let json = r#"{"args": [
            {"name": "dest", "type": "positional"},
            {"name": "verbose", "short": "v", "type": "flag"},
            {"name": "files", "type": "positional", "multiple": true}
        ]}"#;
        Config::from_json(json).unwrap().validate().unwrap();
    }

    #[test]
    fn test_error_on_multiple_flag() {
        let json = r#"{"args": [{"name": "v", "type": "flag", "multiple": true}]}"#;
        let config = Config::from_json(json).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MultipleOnFlag(_))
        ));
    }

    #[test]
    fn test_choices_errors() {
        let empty = r#"{"args": [{"name": "m", "type": "option", "choices": []}]}"#;
        assert!(matches!(
            Config::from_json(empty).unwrap().validate(),
            Err(ConfigError::EmptyChoices(_))
        ));

        let dup = r#"{"args": [{"name": "m", "type": "option", "choices": ["a", "a"]}]}"#;
        assert!(matches!(
            Config::from_json(dup).unwrap().validate(),
            Err(ConfigError::DuplicateChoice(_, value)) if value == "a"
        ));

        let flag = r#"{"args": [{"name": "m", "type": "flag", "choices": ["a"]}]}"#;
        assert!(matches!(
            Config::from_json(flag).unwrap().validate(),
            Err(ConfigError::ChoicesOnFlag(_))
        ));
    }

    #[test]
    fn test_value_type_on_flag_rejected() {
        let json = r#"{"args": [{"name": "v", "type": "flag", "value_type": "int"}]}"#;
        assert!(matches!(
            Config::from_json(json).unwrap().validate(),
            Err(ConfigError::ValueTypeOnFlag(_))
        ));
    }

    #[test]
    fn test_required_or_default_on_flag_rejected() {
        let required = r#"{"args": [{"name": "v", "type": "flag", "required": true}]}"#;
        assert!(matches!(
            Config::from_json(required).unwrap().validate(),
            Err(ConfigError::RequiredOnFlag(name)) if name == "v"
        ));

        let default = r#"{"args": [{"name": "v", "type": "flag", "default": "true"}]}"#;
        assert!(matches!(
            Config::from_json(default).unwrap().validate(),
            Err(ConfigError::DefaultOnFlag(name)) if name == "v"
        ));
    }

    #[test]
    fn test_positional_with_subcommands_rejected() {
        let json = r#"{
            "args": [{"name": "file", "type": "positional"}],
            "subcommands": [{"name": "build"}]
        }"#;
        assert!(matches!(
            Config::from_json(json).unwrap().validate(),
            Err(ConfigError::PositionalWithSubcommands(name)) if name == "file"
        ));

        let nested = r#"{
            "args": [{"name": "verbose", "type": "flag"}],
            "subcommands": [{"name": "build", "args": [{"name": "file", "type": "positional"}]}]
        }"#;
        Config::from_json(nested).unwrap().validate().unwrap();
    }

    #[test]
    fn test_duplicate_subcommand_rejected() {
        let json = r#"{"subcommands": [{"name": "build"}, {"name": "build"}]}"#;
        assert!(matches!(
            Config::from_json(json).unwrap().validate(),
            Err(ConfigError::DuplicateSubcommandName(_))
        ));
    }

    #[test]
    fn test_specs_from_config() {
        let json = r#"{"args": [
            {"name": "files", "type": "positional", "multiple": true, "value_type": "int"},
            {"name": "tag", "long": "tag", "type": "option", "multiple": true},
            {"name": "mode", "type": "option", "choices": ["fast", "slow"], "default": "fast"},
            {"name": "v", "type": "flag"}
        ]}"#;
        let specs = Config::from_json(json).unwrap().specs().unwrap();

        assert_eq!(specs.options().len(), 3);
        assert_eq!(specs.arguments().len(), 1);

        let tag = specs.option(0).unwrap();
        assert_eq!(tag.arity, Arity::Sequence);
        assert_eq!(tag.value_type, ValueType::String.list());

        let mode = specs.option(1).unwrap();
        assert_eq!(mode.long.as_deref(), Some("mode"));
        assert_eq!(mode.default.as_deref(), Some("fast"));
        assert_eq!(
            mode.value_type,
            ValueType::String.one_of(["fast", "slow"])
        );

        let v = specs.option(2).unwrap();
        assert_eq!(v.arity, Arity::Switch);
        assert_eq!(v.short, Some('v'));

        assert_eq!(specs.find("files"), Some(SpecId::Argument(0)));
        assert_eq!(specs.argument(0).unwrap().value_type, ValueType::Int.list());
    }

    #[test]
    fn test_subcommand_specs() {
        let json = r#"{"subcommands": [
            {"name": "build", "args": [{"name": "release", "type": "flag"}]}
        ]}"#;
        let config = Config::from_json(json).unwrap();
        let build = config.subcommand("build").unwrap();
        let specs = build.specs().unwrap();
        assert_eq!(specs.option(0).unwrap().long.as_deref(), Some("release"));
        assert!(config.subcommand("test").is_none());
    }

    #[test]
    fn test_effective_prefix() {
        let config = Config::from_json(r#"{"prefix": "MYAPP_"}"#).unwrap();
        assert_eq!(config.effective_prefix(), "MYAPP_");

        let config = Config::from_json(r#"{}"#).unwrap();
        assert_eq!(config.effective_prefix(), "CMDBIND_");
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"args": [{{"name": "x", "type": "positional"}}]}}"#).unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.args[0].name, "x");
    }

    #[test]
    fn test_from_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::from_file(&dir.path().join("missing.json"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
