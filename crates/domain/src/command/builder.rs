use std::fmt;

use super::value::{ArgValue, FragmentKind};

/// One `key + separator + value` piece of a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFragment {
    pub kind: FragmentKind,
    pub separator: String,
    pub key: String,
    pub value: String,
}

impl fmt::Display for CommandFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.key, self.separator, self.value)
    }
}

/// Assembles a command string from ordered fragments.
///
/// Pure string assembly: nothing is validated and nothing is reordered.
///
/// ```
/// use domain::command::{CommandBuilder, SubArg};
///
/// let mut cmd = CommandBuilder::new();
/// cmd.add(SubArg::new("CHANnel", 1, ":").with("", "RANGe", ""), 1.6, " ");
/// assert_eq!(cmd.to_string(), "CHANnel1:RANGe 1.600000");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandBuilder {
    fragments: Vec<CommandFragment>,
}

impl CommandBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `name + separator + value`. `name` may be a plain string or a
    /// [`SubArg`](super::SubArg).
    pub fn add(
        &mut self,
        name: impl fmt::Display,
        value: impl Into<ArgValue>,
        separator: &str,
    ) -> &mut Self {
        let value = value.into();
        self.fragments.push(CommandFragment {
            kind: value.kind(),
            separator: separator.to_string(),
            key: name.to_string(),
            value: value.to_string(),
        });
        self
    }

    pub fn fragments(&self) -> &[CommandFragment] {
        &self.fragments
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// All fragments concatenated in insertion order, no trailing delimiter.
    pub fn to_command_string(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CommandBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for fragment in &self.fragments {
            write!(f, "{}", fragment)?;
        }
        Ok(())
    }
}
