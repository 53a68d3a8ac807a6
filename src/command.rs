//! Binding a whole command line, subcommand included.

use crate::config::{Config, ConfigError};
use crate::serializer::{CommandLineSerializer, SerializeError};
use crate::spec::END_OF_OPTIONS;
use crate::values::Values;
use log::debug;
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur while binding a command line to a config.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Serialize(#[from] SerializeError),

    #[error("missing subcommand: expected one of {0}")]
    MissingSubcommand(String),

    #[error("unknown subcommand: {0}")]
    UnknownSubcommand(String),
}

/// The subcommand selected on the command line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedSubcommand {
    pub name: String,
    pub values: Values,
}

/// Values bound for a command and its subcommand.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedCommand {
    pub values: Values,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subcommand: Option<ParsedSubcommand>,
    /// Tokens left once every spec item is bound.
    pub remaining: Vec<String>,
}

/// Bind `args` to the top-level specs of `config`, then to a subcommand.
///
/// When the config declares subcommands, the first token naming one splits
/// the command line: the top-level specs only see the tokens in front of it
/// and the subcommand's specs only see the tokens after it. Any token the
/// top-level specs leave unbound, other than an end-of-options marker, is
/// reported as an unknown subcommand.
pub fn parse_command(
    config: &Config,
    serializer: &CommandLineSerializer,
    args: &[String],
) -> Result<ParsedCommand, CommandError> {
    if config.subcommands.is_empty() {
        let root = serializer.deserialize_values(args.iter().cloned(), &config.specs()?)?;
        return Ok(ParsedCommand {
            values: root.values,
            subcommand: None,
            remaining: root.remaining,
        });
    }

    let split = args
        .iter()
        .position(|arg| config.subcommand(arg).is_some())
        .unwrap_or(args.len());
    let (head, tail) = args.split_at(split);

    let root = serializer.deserialize_values(head.iter().cloned(), &config.specs()?)?;
    if let Some(stray) = root.remaining.into_iter().find(|t| t != END_OF_OPTIONS) {
        return Err(CommandError::UnknownSubcommand(stray));
    }

    let (name, rest) = tail.split_first().ok_or_else(|| {
        let names: Vec<&str> = config.subcommands.iter().map(|s| s.name.as_str()).collect();
        CommandError::MissingSubcommand(names.join(", "))
    })?;
    let subcmd = config
        .subcommand(name)
        .ok_or_else(|| CommandError::UnknownSubcommand(name.clone()))?;
    debug!("dispatching to subcommand {} with {} tokens", name, rest.len());

    let parsed = serializer.deserialize_values(rest.iter().cloned(), &subcmd.specs()?)?;

    Ok(ParsedCommand {
        values: root.values,
        subcommand: Some(ParsedSubcommand {
            name: name.clone(),
            values: parsed.values,
        }),
        remaining: parsed.remaining,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Value;

    fn parse_config(json: &str) -> Config {
        let config = Config::from_json(json).unwrap();
        config.validate().unwrap();
        config
    }

    fn args(s: &[&str]) -> Vec<String> {
        s.iter().map(|s| s.to_string()).collect()
    }

    fn run(config: &Config, tokens: &[&str]) -> Result<ParsedCommand, CommandError> {
        parse_command(config, &CommandLineSerializer::default(), &args(tokens))
    }

    const GIT_LIKE: &str = r#"{
        "args": [{"name": "verbose", "short": "v", "type": "flag"}],
        "subcommands": [
            {"name": "commit", "args": [
                {"name": "message", "short": "m", "type": "option", "required": true},
                {"name": "paths", "type": "positional", "multiple": true}
            ]},
            {"name": "push"}
        ]
    }"#;

    #[test]
    fn test_without_subcommands() {
        let config = parse_config(
            r#"{"args": [{"name": "count", "type": "option", "value_type": "int"}]}"#,
        );
        let parsed = run(&config, &["--count", "2", "extra"]).unwrap();
        assert_eq!(parsed.values.get_by_name("count"), Some(&Value::Int(2)));
        assert!(parsed.subcommand.is_none());
        assert_eq!(parsed.remaining, args(&["extra"]));
    }

    #[test]
    fn test_dispatch_to_subcommand() {
        let config = parse_config(GIT_LIKE);
        let parsed = run(&config, &["-v", "commit", "-m", "fix", "a.rs", "b.rs"]).unwrap();

        assert_eq!(parsed.values.get_by_name("verbose"), Some(&Value::Bool(true)));
        let commit = parsed.subcommand.unwrap();
        assert_eq!(commit.name, "commit");
        assert_eq!(
            commit.values.get_by_name("message"),
            Some(&Value::Str("fix".to_string()))
        );
        assert_eq!(
            commit.values.get_by_name("paths"),
            Some(&Value::List(vec![
                Value::Str("a.rs".to_string()),
                Value::Str("b.rs".to_string())
            ]))
        );
        assert!(parsed.remaining.is_empty());
    }

    #[test]
    fn test_subcommand_after_end_of_options() {
        let config = parse_config(GIT_LIKE);
        let parsed = run(&config, &["--", "push", "origin"]).unwrap();
        assert_eq!(parsed.subcommand.unwrap().name, "push");
        assert_eq!(parsed.remaining, args(&["origin"]));
    }

    #[test]
    fn test_missing_subcommand() {
        let config = parse_config(GIT_LIKE);
        let result = run(&config, &["-v"]);
        assert!(matches!(
            result,
            Err(CommandError::MissingSubcommand(names)) if names == "commit, push"
        ));
    }

    #[test]
    fn test_unknown_subcommand() {
        let config = parse_config(GIT_LIKE);
        let result = run(&config, &["pull"]);
        assert!(matches!(result, Err(CommandError::UnknownSubcommand(name)) if name == "pull"));
    }

    #[test]
    fn test_same_option_on_both_levels() {
        let config = parse_config(
            r#"{
            "args": [{"name": "verbose", "type": "flag"}],
            "subcommands": [
                {"name": "build", "args": [{"name": "verbose", "type": "flag"}]}
            ]
        }"#,
        );

        let parsed = run(&config, &["build", "--verbose"]).unwrap();
        assert_eq!(parsed.values.get_by_name("verbose"), Some(&Value::Bool(false)));
        let build = parsed.subcommand.unwrap();
        assert_eq!(build.values.get_by_name("verbose"), Some(&Value::Bool(true)));

        let parsed = run(&config, &["--verbose", "build"]).unwrap();
        assert_eq!(parsed.values.get_by_name("verbose"), Some(&Value::Bool(true)));
        let build = parsed.subcommand.unwrap();
        assert_eq!(build.values.get_by_name("verbose"), Some(&Value::Bool(false)));
    }

    #[test]
    fn test_stray_token_before_subcommand() {
        let config = parse_config(GIT_LIKE);
        let result = run(&config, &["-x", "push"]);
        assert!(matches!(result, Err(CommandError::UnknownSubcommand(name)) if name == "-x"));
    }

    #[test]
    fn test_subcommand_errors_propagate() {
        let config = parse_config(GIT_LIKE);
        let result = run(&config, &["commit", "a.rs"]);
        assert!(matches!(
            result,
            Err(CommandError::Serialize(SerializeError::MissingRequiredSpec(_)))
        ));
    }
}
