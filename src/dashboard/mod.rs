//! # Dashboard
//!
//! Presents a trailing window of the metrics log as a table and per-metric
//! time series, refreshed manually or on a timer.
//!
//! ## Components:
//!
//! - **`session`**: the operator's window and refresh choices, and the
//!   commands that change them.
//! - **`view`**: the pure `render` function turning a log snapshot into a
//!   `View`.
//! - **`terminal`**: the `Screen` sink and its text implementation.
//! - **`refresh`**: the loop that redraws the screen.

pub mod refresh;
pub mod session;
pub mod terminal;
pub mod view;

pub use refresh::{load_view, run_session, spawn_stdin_reader};
pub use session::{RefreshInterval, Session, SessionCommand, SessionError, WindowMinutes};
pub use terminal::{Screen, TerminalScreen};
pub use view::{render, Chart, DashboardView, Series, View};
