//! Console output: styling, progress text and the terminal [`Reporter`](mozdl_core::Reporter).

pub mod progress;
pub mod reporter;
pub mod theme;

pub use reporter::ConsoleReporter;
pub use theme::Theme;
