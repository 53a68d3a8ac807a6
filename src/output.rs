//! Rendering bound values as shell export statements or JSON.

use crate::command::ParsedCommand;
use crate::tokenizer::merge;
use crate::values::Values;

/// Escape a string for safe use in a shell double-quoted context.
///
/// Escapes: $, `, \, ", and !
fn escape_shell_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '$' => escaped.push_str("\\$"),
            '`' => escaped.push_str("\\`"),
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '!' => escaped.push_str("\\!"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Convert a spec name to a valid shell variable name.
///
/// Converts to uppercase and replaces hyphens with underscores.
fn to_shell_var_name(name: &str) -> String {
    name.to_uppercase().replace('-', "_")
}

fn push_export(output: &mut String, var_name: &str, value: &str) {
    output.push_str(&format!(
        "export {}=\"{}\"\n",
        var_name,
        escape_shell_value(value)
    ));
}

fn push_values(output: &mut String, values: &Values, prefix: &str) {
    for (_, entry) in values.iter() {
        // Absent values are left unset
        if let Some(ref value) = entry.value {
            let var_name = format!("{}{}", prefix, to_shell_var_name(&entry.name));
            push_export(output, &var_name, &value.to_string());
        }
    }
}

/// Generate shell export statements for a parsed command.
///
/// Lists are exported as a single command line. A subcommand is exported as
/// `<PREFIX>SUBCOMMAND` and its values are prefixed with its name. Unbound
/// tokens, if any, go to `<PREFIX>REMAINING`.
pub fn generate_output_string(parsed: &ParsedCommand, prefix: &str) -> String {
    let mut output = String::new();

    push_values(&mut output, &parsed.values, prefix);

    if let Some(ref subcmd) = parsed.subcommand {
        push_export(&mut output, &format!("{}SUBCOMMAND", prefix), &subcmd.name);
        let sub_prefix = format!("{}{}_", prefix, to_shell_var_name(&subcmd.name));
        push_values(&mut output, &subcmd.values, &sub_prefix);
    }

    if !parsed.remaining.is_empty() {
        push_export(
            &mut output,
            &format!("{}REMAINING", prefix),
            &merge(&parsed.remaining),
        );
    }

    output
}

/// Generate the parsed command as pretty-printed JSON.
pub fn generate_json_string(parsed: &ParsedCommand) -> serde_json::Result<String> {
    serde_json::to_string_pretty(parsed)
}

/// Generate an error output as a string.
///
/// When sourced, it prints the error message to stderr and exits 1.
pub fn generate_error_string(message: &str) -> String {
    let escaped = escape_shell_value(message);
    format!("echo \"cmdbind: {}\" >&2\nexit 1\n", escaped)
}
