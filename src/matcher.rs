//! Locating options in a token stream and consuming the tokens they own.

use crate::spec::{Arity, OptionSpec, END_OF_OPTIONS, LONG_PREFIX, SHORT_PREFIX};
use log::trace;

/// One slot of the backing token array.
#[derive(Debug, Clone)]
struct Slot {
    text: String,
    consumed: bool,
}

/// Tokens of one invocation, addressed by their original index.
///
/// Tokens are never moved; consuming one only marks its slot, so indices
/// held by cursors stay valid while earlier or later tokens are removed.
#[derive(Debug, Clone)]
pub struct TokenStream {
    slots: Vec<Slot>,
}

impl TokenStream {
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            slots: tokens
                .into_iter()
                .map(|text| Slot {
                    text: text.into(),
                    consumed: false,
                })
                .collect(),
        }
    }

    /// Index of the first unconsumed token.
    pub fn first(&self) -> Option<usize> {
        self.live_from(0).next()
    }

    /// Index of the first unconsumed token after `index`.
    pub fn next_after(&self, index: usize) -> Option<usize> {
        self.live_from(index + 1).next()
    }

    /// Indices of unconsumed tokens at or after `start`.
    pub fn live_from(&self, start: usize) -> impl Iterator<Item = usize> + '_ {
        self.slots
            .iter()
            .enumerate()
            .skip(start)
            .filter(|(_, slot)| !slot.consumed)
            .map(|(i, _)| i)
    }

    /// Current text of the token at `index`.
    pub fn text(&self, index: usize) -> &str {
        &self.slots[index].text
    }

    pub fn is_consumed(&self, index: usize) -> bool {
        self.slots[index].consumed
    }

    pub fn consume(&mut self, index: usize) {
        self.slots[index].consumed = true;
    }

    /// Remove one short flag from a clustered token such as `-abc`.
    ///
    /// The token is consumed once nothing but the dash is left.
    pub fn strip_short(&mut self, index: usize, short: char) {
        let slot = &mut self.slots[index];
        if let Some(pos) = slot.text[SHORT_PREFIX.len()..].find(short) {
            slot.text.remove(SHORT_PREFIX.len() + pos);
        }
        if slot.text == SHORT_PREFIX {
            slot.consumed = true;
        }
    }

    /// Index of the first unconsumed token equal to `text`.
    pub fn find(&self, text: &str) -> Option<usize> {
        self.live_from(0).find(|&i| self.text(i) == text)
    }

    /// The unconsumed tokens, in order.
    pub fn remaining(&self) -> Vec<String> {
        self.live_from(0).map(|i| self.text(i).to_string()).collect()
    }
}

/// Which spelling of an option matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchForm {
    Long,
    Short(char),
}

/// Where an option was found in the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionMatch {
    /// Index of the token naming the option.
    pub index: usize,
    pub form: MatchForm,
    /// Value attached to the matched token (`--name=value`, `-nvalue`).
    pub inline_value: Option<String>,
}

/// Outcome of consuming a match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Consumed {
    /// The value token, if the option took one.
    pub value: Option<String>,
    /// First unconsumed token after the consumed region.
    pub next: Option<usize>,
}

impl OptionMatch {
    pub fn prefix(&self) -> &'static str {
        match self.form {
            MatchForm::Long => LONG_PREFIX,
            MatchForm::Short(_) => SHORT_PREFIX,
        }
    }

    /// The option as it was spelled, e.g. `--count` or `-c`.
    pub fn spelled(&self, option: &OptionSpec) -> String {
        match self.form {
            MatchForm::Long => format!("{}{}", LONG_PREFIX, option.long.as_deref().unwrap_or("")),
            MatchForm::Short(short) => format!("{}{}", SHORT_PREFIX, short),
        }
    }

    /// Consume the matched token and, for valued arities, its value token.
    ///
    /// Without an inline value the following token is taken as the value,
    /// unless there is none or it is the end-of-options marker.
    pub fn consume(&self, stream: &mut TokenStream, arity: Arity) -> Consumed {
        if arity == Arity::Switch {
            match self.form {
                MatchForm::Long => stream.consume(self.index),
                MatchForm::Short(short) => stream.strip_short(self.index, short),
            }
            let next = if stream.is_consumed(self.index) {
                stream.next_after(self.index)
            } else {
                Some(self.index)
            };
            return Consumed { value: None, next };
        }

        stream.consume(self.index);

        if let Some(ref inline) = self.inline_value {
            return Consumed {
                value: Some(inline.clone()),
                next: stream.next_after(self.index),
            };
        }

        match stream.next_after(self.index) {
            Some(value_index) if stream.text(value_index) != END_OF_OPTIONS => {
                let value = stream.text(value_index).to_string();
                stream.consume(value_index);
                Consumed {
                    value: Some(value),
                    next: stream.next_after(value_index),
                }
            }
            next => Consumed { value: None, next },
        }
    }
}

/// Match `token` against `--long` or `--long=value`.
fn match_long(token: &str, long: &str) -> Option<Option<String>> {
    let rest = token.strip_prefix(LONG_PREFIX)?.strip_prefix(long)?;
    if rest.is_empty() {
        Some(None)
    } else {
        rest.strip_prefix('=').map(|value| Some(value.to_string()))
    }
}

/// Match `token` against a short flag anywhere in a `-abc` cluster.
fn match_short(token: &str, short: char) -> Option<Option<String>> {
    if token.starts_with(LONG_PREFIX) {
        return None;
    }
    let body = token.strip_prefix(SHORT_PREFIX)?;
    let pos = body.find(short)?;
    let rest = &body[pos + short.len_utf8()..];
    Some((!rest.is_empty()).then(|| rest.to_string()))
}

/// Finds options in a stream and remembers the end-of-options marker.
#[derive(Debug, Default)]
pub struct Matcher {
    end_of_options: Option<usize>,
}

impl Matcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the first end-of-options marker seen while scanning.
    pub fn end_of_options(&self) -> Option<usize> {
        self.end_of_options
    }

    /// Find the next occurrence of `option` at or after `start`.
    ///
    /// The long form is tried before the short form. Both scans stop at the
    /// end-of-options marker.
    pub fn try_match(
        &mut self,
        option: &OptionSpec,
        stream: &TokenStream,
        start: usize,
    ) -> Option<OptionMatch> {
        if let Some(ref long) = option.long {
            if let Some(found) = self.scan(stream, start, MatchForm::Long, |t| match_long(t, long))
            {
                return Some(found);
            }
        }

        if let Some(short) = option.short {
            if let Some(found) =
                self.scan(stream, start, MatchForm::Short(short), |t| match_short(t, short))
            {
                return Some(found);
            }
        }

        None
    }

    fn scan<F>(
        &mut self,
        stream: &TokenStream,
        start: usize,
        form: MatchForm,
        matches: F,
    ) -> Option<OptionMatch>
    where
        F: Fn(&str) -> Option<Option<String>>,
    {
        for index in stream.live_from(start) {
            let token = stream.text(index);
            if token == END_OF_OPTIONS {
                trace!("end of options at token {}", index);
                self.end_of_options.get_or_insert(index);
                return None;
            }
            if let Some(inline_value) = matches(token) {
                trace!("matched {:?} at token {} ({:?})", form, index, token);
                return Some(OptionMatch {
                    index,
                    form,
                    inline_value,
                });
            }
        }
        None
    }
}
