//! Outer surfaces: the terminal REPL and the HTTP routes used by the chat
//! widget.

pub mod command;
pub mod repl;
pub mod routes;

pub use command::{Command, CommandParser};
pub use repl::Repl;
pub use routes::intake_routes;
