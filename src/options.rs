//! Flat `--key=value` option parsing shared by every command.
//!
//! Rules:
//! - `--key=value` splits at the first `=`
//! - `--key value` consumes the next argument unless it is itself an option
//! - `--key` on its own is a boolean flag
//! - anything else is a positional, order preserved

use std::collections::HashMap;

use crate::error::UsageError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    Text(String),
    Flag,
}

impl OptionValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Flag => None,
        }
    }

    /// `--raw`, `--raw=true` and `--raw=1` all count as set.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Flag => true,
            Self::Text(s) => s == "true" || s == "1",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedOptions {
    pub options: HashMap<String, OptionValue>,
    pub positionals: Vec<String>,
}

impl ParsedOptions {
    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.options.get(key)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(OptionValue::as_text)
    }

    /// Trimmed text value, `None` when absent, a flag or blank.
    pub fn non_empty_text(&self, key: &str) -> Option<&str> {
        self.text(key).map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn flag(&self, key: &str) -> bool {
        self.get(key).is_some_and(OptionValue::is_truthy)
    }

    /// Reject any option whose key is not in `allowed`.
    ///
    /// Keys are checked in sorted order so the reported key is stable.
    pub fn ensure_allowed(&self, allowed: &[&str], command: &str) -> Result<(), UsageError> {
        let mut keys: Vec<&String> = self.options.keys().collect();
        keys.sort();

        match keys.into_iter().find(|k| !allowed.contains(&k.as_str())) {
            Some(key) => Err(UsageError::new(format!(
                "Unknown option for {command}: --{key}"
            ))),
            None => Ok(()),
        }
    }

    pub fn ensure_max_positionals(&self, max: usize) -> Result<(), UsageError> {
        if self.positionals.len() > max {
            return Err(UsageError::new(format!(
                "Unexpected argument: {}",
                self.positionals[max]
            )));
        }
        Ok(())
    }
}

pub fn parse_option_args<S: AsRef<str>>(args: &[S]) -> ParsedOptions {
    let mut parsed = ParsedOptions::default();
    let mut iter = args.iter().map(S::as_ref).peekable();

    while let Some(arg) = iter.next() {
        let Some(body) = arg.strip_prefix("--") else {
            parsed.positionals.push(arg.to_string());
            continue;
        };

        if let Some((key, value)) = body.split_once('=') {
            parsed
                .options
                .insert(key.to_string(), OptionValue::Text(value.to_string()));
            continue;
        }

        let value = match iter.next_if(|next| !next.starts_with("--")) {
            Some(next) => OptionValue::Text(next.to_string()),
            None => OptionValue::Flag,
        };
        parsed.options.insert(body.to_string(), value);
    }

    parsed
}

/// Parse a "top N" count.
///
/// Anything that is not a positive finite number falls back to `default`;
/// fractional values are truncated and the result is clamped to `max`.
pub fn bounded_top(value: Option<&str>, default: u32, max: u32) -> u32 {
    let Some(numeric) = value.and_then(|v| v.trim().parse::<f64>().ok()) else {
        return default;
    };
    if !numeric.is_finite() || numeric <= 0.0 {
        return default;
    }

    let truncated = numeric.trunc();
    if truncated < 1.0 {
        // 0.5 passes the positive check but truncates to zero
        return default;
    }
    truncated.min(f64::from(max)) as u32
}

/// Parse an id argument the way every `<id>` positional is parsed.
pub fn parse_id(raw: &str) -> Option<u32> {
    raw.trim().parse::<u32>().ok()
}
