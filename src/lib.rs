//! cmdbind - declarative command-line tokenizing and typed argument binding.
//!
//! A command line, given as tokens or as one raw string, is bound to a set
//! of option and positional-argument specs. Each spec item receives the
//! tokens that belong to it, decoded by a pluggable value codec, and the
//! tokens nobody claimed are handed back to the caller.

pub mod codec;
pub mod command;
pub mod config;
pub mod logger;
pub mod matcher;
pub mod output;
pub mod serializer;
pub mod spec;
pub mod tokenizer;
pub mod values;

pub use codec::{CodecError, CodecRegistry, Value, ValueCodec};
pub use command::{parse_command, CommandError, ParsedCommand, ParsedSubcommand};
pub use config::{ArgConfig, ArgType, Config, ConfigError};
pub use output::{generate_error_string, generate_json_string, generate_output_string};
pub use serializer::{CommandLineSerializer, Deserialized, SerializeError};
pub use spec::{ArgumentSpec, Arity, OptionSpec, SpecError, SpecId, Specs, ValueType};
pub use tokenizer::{merge, tokenize, TokenizeError};
pub use values::Values;
