use std::fmt;

use super::value::ArgValue;

/// Hierarchical command name built from ordered `(prefix, value, postfix)`
/// elements, e.g. `smua.source.levelv` or `CHANnel1:RANGe`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SubArg {
    elements: Vec<(String, String, String)>,
}

impl SubArg {
    pub fn new(prefix: &str, value: impl Into<ArgValue>, postfix: &str) -> Self {
        let mut arg = Self::default();
        arg.push(prefix, value, postfix);
        arg
    }

    /// Single bare element without prefix or postfix.
    pub fn plain(value: impl Into<ArgValue>) -> Self {
        Self::new("", value, "")
    }

    /// Appends one element; elements render in the order they were pushed.
    pub fn push(&mut self, prefix: &str, value: impl Into<ArgValue>, postfix: &str) -> &mut Self {
        self.elements.push((
            prefix.to_string(),
            value.into().to_string(),
            postfix.to_string(),
        ));
        self
    }

    /// Consuming variant of [`Self::push`] for one-expression construction.
    pub fn with(mut self, prefix: &str, value: impl Into<ArgValue>, postfix: &str) -> Self {
        self.push(prefix, value, postfix);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl fmt::Display for SubArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (prefix, value, postfix) in &self.elements {
            write!(f, "{}{}{}", prefix, value, postfix)?;
        }
        Ok(())
    }
}

impl From<SubArg> for ArgValue {
    fn from(value: SubArg) -> Self {
        ArgValue::Text(value.to_string())
    }
}

impl From<&SubArg> for ArgValue {
    fn from(value: &SubArg) -> Self {
        ArgValue::Text(value.to_string())
    }
}
