//! Terminal ConPTY - Windows pseudo console session hosting
//!
//! This crate hosts interactive child processes inside a Windows pseudo
//! console (ConPTY), giving the parent full-duplex byte-stream control over
//! the child's console I/O as if it were attached to a real terminal.
//!
//! Two attachment modes:
//! - [`PseudoConsole`]: allocates a ConPTY device over an input/output pipe
//!   pair and attaches the child through the pseudo-console thread
//!   attribute.
//! - [`StreamConsole`]: no device; the child directly inherits explicit
//!   input/output/error pipe handles marshaled through the
//!   inheritable-handle-list attribute and the legacy reserved buffer.
//!
//! Both expose the parent-side pipe ends and a one-shot [`ExitSignal`]
//! fired when the child exits.
//!
//! The attachment protocol is specific to the Win32 process creation
//! facility; only the pure pieces (sizes, the exit signal, the
//! reserved-buffer encoder) build elsewhere.
//!
//! Reference: https://learn.microsoft.com/en-us/windows/console/creating-a-pseudoconsole-session

mod attrlist;
mod error;
mod inherit;
mod signal;
mod size;

#[cfg(windows)]
mod child;
#[cfg(windows)]
mod native;
#[cfg(windows)]
mod pipe;
#[cfg(windows)]
mod pty;
#[cfg(windows)]
mod stream;

pub use error::{Error, Result};
pub use signal::ExitSignal;
pub use size::ConsoleSize;

#[cfg(windows)]
pub use child::{Child, StartupConfig};
#[cfg(windows)]
pub use pty::PseudoConsole;
#[cfg(windows)]
pub use stream::StreamConsole;
