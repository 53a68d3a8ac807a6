//! Binding tokens to options and positional arguments.

use crate::codec::{CodecError, CodecRegistry, Value};
use crate::matcher::{Matcher, OptionMatch, TokenStream};
use crate::spec::{Arity, OptionSpec, SpecId, SpecItem, Specs, END_OF_OPTIONS};
use crate::tokenizer::{tokenize, TokenizeError};
use crate::values::Values;
use log::debug;
use thiserror::Error;

/// Errors that can occur while binding a command line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SerializeError {
    #[error(transparent)]
    MalformedQuoting(#[from] TokenizeError),

    #[error("missing value for option: {0}")]
    MissingScalarValue(String),

    #[error("missing required argument: {0}")]
    MissingRequiredSpec(String),

    #[error("unknown value type '{value_type}' for {spec}")]
    UnknownValueType { spec: String, value_type: String },

    #[error("invalid value for {spec}: {source}")]
    InvalidValue {
        spec: String,
        #[source]
        source: CodecError,
    },
}

/// Result of binding one command line.
#[derive(Debug, Clone, PartialEq)]
pub struct Deserialized {
    pub values: Values,
    /// Tokens no spec item consumed, in their original order.
    pub remaining: Vec<String>,
}

/// Binds command lines to [`Specs`].
///
/// Holds nothing but the codec registry, so one instance can serve any
/// number of invocations, from any number of threads.
#[derive(Debug, Clone, Default)]
pub struct CommandLineSerializer {
    registry: CodecRegistry,
}

impl CommandLineSerializer {
    pub fn new(registry: CodecRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &CodecRegistry {
        &self.registry
    }

    /// Tokenize `line` and bind it.
    pub fn deserialize_line(
        &self,
        line: &str,
        specs: &Specs,
    ) -> Result<Deserialized, SerializeError> {
        let tokens = tokenize(line)?;
        self.deserialize_values(tokens, specs)
    }

    /// Bind `args` to `specs`.
    ///
    /// Options are resolved first, switches before scalars before
    /// sequences, so that clustered short switches are stripped before any
    /// valued option looks at the cluster. Positional arguments then take
    /// the tokens left, starting after the end-of-options marker if there
    /// is one.
    pub fn deserialize_values<I, S>(
        &self,
        args: I,
        specs: &Specs,
    ) -> Result<Deserialized, SerializeError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut stream = TokenStream::new(args);
        let mut matcher = Matcher::new();
        let mut values = Values::new();

        let mut order: Vec<usize> = (0..specs.options().len()).collect();
        order.sort_by_key(|&i| specs.options()[i].arity);

        for index in order {
            let option = &specs.options()[index];
            let value = self.resolve_option(option, &mut stream, &mut matcher)?;
            debug!("option {} bound to {:?}", option.display_name(), value);
            values.insert(SpecId::Option(index), &option.name, value);
        }

        if !specs.arguments().is_empty() {
            let mut cursor = match matcher
                .end_of_options()
                .or_else(|| stream.find(END_OF_OPTIONS))
            {
                Some(marker) => {
                    debug!("positional arguments start after token {}", marker);
                    stream.consume(marker);
                    stream.next_after(marker)
                }
                None => stream.first(),
            };

            for (index, argument) in specs.arguments().iter().enumerate() {
                let taken: Vec<usize> = match (argument.arity, cursor) {
                    (_, None) => Vec::new(),
                    (Arity::Sequence, Some(start)) => stream.live_from(start).collect(),
                    (_, Some(start)) => vec![start],
                };

                let value = match taken.last() {
                    Some(&last) => {
                        cursor = stream.next_after(last);
                        let tokens: Vec<String> =
                            taken.iter().map(|&i| stream.text(i).to_string()).collect();
                        for &i in &taken {
                            stream.consume(i);
                        }
                        Some(self.decode(argument, &tokens)?)
                    }
                    None => self.absent(argument)?,
                };
                debug!("argument <{}> bound to {:?}", argument.name, value);
                values.insert(SpecId::Argument(index), &argument.name, value);
            }
        }

        let remaining = stream.remaining();
        debug!("remaining tokens: {:?}", remaining);
        Ok(Deserialized { values, remaining })
    }

    fn resolve_option(
        &self,
        option: &OptionSpec,
        stream: &mut TokenStream,
        matcher: &mut Matcher,
    ) -> Result<Option<Value>, SerializeError> {
        let found = match stream.first() {
            Some(start) => matcher.try_match(option, stream, start),
            None => None,
        };
        let found = match found {
            Some(found) => found,
            None => return self.absent(option),
        };

        match option.arity {
            Arity::Switch => {
                found.consume(stream, Arity::Switch);
                Ok(Some(Value::Bool(true)))
            }
            Arity::Scalar => {
                let value = found
                    .consume(stream, Arity::Scalar)
                    .value
                    .ok_or_else(|| SerializeError::MissingScalarValue(found.spelled(option)))?;
                self.decode(option, &[value]).map(Some)
            }
            Arity::Sequence => {
                let tokens = collect_sequence(option, found, stream, matcher);
                self.decode(option, &tokens).map(Some)
            }
        }
    }

    /// Value of an item that matched nothing.
    ///
    /// Switches are false. Required items fail. A default is bound as if it
    /// had been given on the command line. Otherwise sequences are empty and
    /// scalars are absent.
    fn absent<T: SpecItem>(&self, item: &T) -> Result<Option<Value>, SerializeError> {
        if item.arity() == Arity::Switch {
            return Ok(Some(Value::Bool(false)));
        }
        if item.is_required() {
            return Err(SerializeError::MissingRequiredSpec(item.label()));
        }
        if let Some(default) = item.default_text() {
            let tokens = match item.arity() {
                Arity::Sequence => tokenize(default)?,
                _ => vec![default.to_string()],
            };
            return self.decode(item, &tokens).map(Some);
        }
        match item.arity() {
            Arity::Sequence => self.decode(item, &[]).map(Some),
            _ => Ok(None),
        }
    }

    fn decode<T: SpecItem>(&self, item: &T, tokens: &[String]) -> Result<Value, SerializeError> {
        self.registry
            .deserialize(item.value_type(), tokens)
            .map_err(|err| match err {
                CodecError::UnknownValueType(value_type) => SerializeError::UnknownValueType {
                    spec: item.label(),
                    value_type,
                },
                source => SerializeError::InvalidValue {
                    spec: item.label(),
                    source,
                },
            })
    }
}

/// Collect every value of a sequence option, starting at its first match.
///
/// Tokens lying between two matches of the option are taken as extra
/// values. Tokens after the last match are left alone.
fn collect_sequence(
    option: &OptionSpec,
    first: OptionMatch,
    stream: &mut TokenStream,
    matcher: &mut Matcher,
) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = Some(first);

    while let Some(found) = current.take() {
        let consumed = found.consume(stream, Arity::Sequence);
        tokens.extend(consumed.value);

        let next = match consumed.next {
            Some(next) => next,
            None => break,
        };
        if let Some(following) = matcher.try_match(option, stream, next) {
            let between: Vec<usize> = stream
                .live_from(next)
                .take_while(|&i| i < following.index)
                .collect();
            for i in between {
                tokens.push(stream.text(i).to_string());
                stream.consume(i);
            }
            current = Some(following);
        }
    }

    tokens
}
