//! Direct-handle stream session.
//!
//! The alternate attachment mode: no console device is allocated. Instead
//! the child inherits three explicit pipe handles, marshaled both through
//! the inheritable-handle-list attribute and the packed legacy reserved
//! buffer, and its standard output and standard error are redirected at the
//! startup-descriptor level.

use std::fs::File;
use std::io;

use crate::child::{Child, StartupConfig};
use crate::error::{Error, Result};
use crate::native::{FDEV, FOPEN};
use crate::pipe::InheritablePipe;
use crate::signal::ExitSignal;

/// A stream console hosting at most one child process over plain pipes.
///
/// Same lifecycle as [`PseudoConsole`](crate::PseudoConsole): pipes exist
/// from `new`, so input can be buffered before `start`; the exit signal
/// fires once when the child exits.
pub struct StreamConsole {
    input: InheritablePipe,
    output: InheritablePipe,
    error: InheritablePipe,
    child: Option<Child>,
    exit: ExitSignal,
}

impl StreamConsole {
    /// Create the input, output and error pipes.
    pub fn new() -> Result<Self> {
        Ok(StreamConsole {
            input: InheritablePipe::parent_writes()?,
            output: InheritablePipe::parent_reads()?,
            error: InheritablePipe::parent_reads()?,
            child: None,
            exit: ExitSignal::new(),
        })
    }

    /// Create a stream console and immediately start `command_line` in it.
    pub fn spawn(command_line: &str) -> Result<Self> {
        let mut console = Self::new()?;
        console.start(command_line)?;
        Ok(console)
    }

    /// Launch a child process that inherits the three pipe ends.
    ///
    /// The child-side handles are listed in the order input, error, output,
    /// each flagged as an open device handle. Both standard output and
    /// standard error are pointed at the output pipe, so the dedicated
    /// error pipe only carries what the child writes to it explicitly, not
    /// what goes through the standard-error descriptor.
    pub fn start(&mut self, command_line: &str) -> Result<()> {
        if self.child.is_some() {
            return Err(Error::AlreadyStarted);
        }

        let handles = [
            self.input.child_raw(),
            self.error.child_raw(),
            self.output.child_raw(),
        ];
        let flags = [FOPEN | FDEV; 3];

        let mut config = StartupConfig::with_inherited_handles(&handles, &flags)?;
        let output_end = self.output.child_raw();
        config.redirect_std_output(output_end);
        config.redirect_std_error(output_end);

        let child = Child::spawn(&mut config, command_line, true)?;
        drop(config);

        for pipe in [&mut self.input, &mut self.error, &mut self.output] {
            pipe.transfer_child_end();
            pipe.close_child_end();
        }

        child.notify_on_exit(self.exit.clone())?;
        self.child = Some(child);
        Ok(())
    }

    /// Write to the child's input pipe.
    pub fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::Write::write(self.input.parent_file()?, buf)
    }

    /// Write all bytes to the child's input pipe.
    pub fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        io::Write::write_all(self.input.parent_file()?, buf)
    }

    /// Read from the child's output pipe.
    pub fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        io::Read::read(self.output.parent_file()?, buf)
    }

    /// Read from the child's dedicated error pipe.
    pub fn read_err(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        io::Read::read(self.error.parent_file()?, buf)
    }

    /// Duplicate the parent-side input end for a writer thread.
    pub fn clone_input(&self) -> io::Result<File> {
        self.input.try_clone_parent()
    }

    /// Duplicate the parent-side output end for a reader thread.
    pub fn clone_output(&self) -> io::Result<File> {
        self.output.try_clone_parent()
    }

    /// Duplicate the parent-side error end for a reader thread.
    pub fn clone_error(&self) -> io::Result<File> {
        self.error.try_clone_parent()
    }

    /// The one-shot signal fired when the child exits.
    pub fn exit_signal(&self) -> ExitSignal {
        self.exit.clone()
    }

    /// Whether the child has exited.
    pub fn has_exited(&self) -> bool {
        self.exit.has_fired()
    }

    /// Block until the child exits.
    pub fn wait(&self) {
        self.exit.wait();
    }

    /// Register an observer for child exit. Runs immediately if the child
    /// already exited.
    pub fn on_exit<F>(&self, observer: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.exit.on_fire(observer);
    }

    /// Process id of the hosted child, once started.
    pub fn child_pid(&self) -> Option<u32> {
        self.child.as_ref().map(Child::pid)
    }

    /// Close all parent-side pipe ends. Safe to call more than once.
    pub fn dispose(&mut self) {
        self.input.dispose();
        self.output.dispose();
        self.error.dispose();
    }
}

impl Drop for StreamConsole {
    fn drop(&mut self) {
        self.dispose();
    }
}
