/// Two-stream declaration diffing command.
pub mod diff;
/// Full-stream reconstruction command.
pub mod dump;
/// Stream-level information command.
pub mod info;
/// Record listing command.
pub mod list;
/// Single-type reconstruction command.
pub mod show;
mod util;
