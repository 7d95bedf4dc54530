//! Serial control channel: line assembly, command grammar, execution, and
//! status rendering.

pub mod commands;
pub mod grammar;
pub mod line;
pub mod status;

pub use commands::{CommandError, ControlChannel};
pub use grammar::{Command, ParseError, Switch};
pub use line::{Line, LineBuffer, LineError};
pub use status::{NoopStatusSink, Outbox, StatusFormatter, StatusLine, StatusSink};
