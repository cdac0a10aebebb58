mod builder;
mod sub_arg;
mod value;

pub use builder::{CommandBuilder, CommandFragment};
pub use sub_arg::SubArg;
pub use value::{ArgValue, FragmentKind};

/// Identification query understood by every SCPI instrument.
pub const IDENTIFY_COMMAND: &str = "*IDN?";
