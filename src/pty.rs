//! Pseudo console session.
//!
//! Allocates a ConPTY device over an input and an output pipe, attaches a
//! child process to it through the pseudo-console thread attribute, and
//! exposes the parent-side pipe ends plus a one-shot exit signal.

use std::fs::File;
use std::io;
use std::ptr;

use crate::child::{Child, StartupConfig};
use crate::error::{Error, Result};
use crate::native::{ClosePseudoConsole, CreatePseudoConsole, HPCON, S_OK};
use crate::pipe::InheritablePipe;
use crate::signal::ExitSignal;
use crate::size::ConsoleSize;

/// The pseudo console device handle.
struct Device {
    handle: HPCON,
}

// HPCON is a process-local handle value; moving it between threads is fine.
unsafe impl Send for Device {}

impl Device {
    fn create(input: &InheritablePipe, output: &InheritablePipe, size: ConsoleSize) -> Result<Self> {
        let mut handle: HPCON = ptr::null_mut();
        let hr = unsafe {
            CreatePseudoConsole(
                size.to_coord(),
                input.child_raw(),
                output.child_raw(),
                0,
                &mut handle,
            )
        };
        if hr != S_OK {
            return Err(Error::DeviceCreation(hr));
        }
        Ok(Device { handle })
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        unsafe { ClosePseudoConsole(self.handle) };
    }
}

/// A pseudo console hosting at most one child process.
///
/// The session moves through Created (`new`), Started (`start`) and ends
/// either when the child exits (the exit signal fires) or on `dispose`.
/// Pipes exist before any child does, so callers may write input ahead of
/// `start`; the bytes sit in the pipe until the child reads them.
pub struct PseudoConsole {
    device: Option<Device>,
    input: InheritablePipe,
    output: InheritablePipe,
    child: Option<Child>,
    exit: ExitSignal,
}

impl PseudoConsole {
    /// Create the pipes and the pseudo console device at the fixed initial
    /// geometry (120 columns by 80 rows).
    pub fn new() -> Result<Self> {
        let mut input = InheritablePipe::parent_writes()?;
        let mut output = InheritablePipe::parent_reads()?;

        let device = Device::create(&input, &output, ConsoleSize::default())?;
        // The device now holds duplicates of the child-side ends.
        input.transfer_child_end();
        output.transfer_child_end();
        log::debug!("pseudo console device created");

        Ok(PseudoConsole {
            device: Some(device),
            input,
            output,
            child: None,
            exit: ExitSignal::new(),
        })
    }

    /// Create a pseudo console and immediately start `command_line` in it.
    pub fn spawn(command_line: &str) -> Result<Self> {
        let mut console = Self::new()?;
        console.start(command_line)?;
        Ok(console)
    }

    /// Attach and launch a child process.
    ///
    /// The command line is passed verbatim to process creation. Fails with
    /// [`Error::AlreadyStarted`] on a second call; the first child and its
    /// handles are left untouched.
    pub fn start(&mut self, command_line: &str) -> Result<()> {
        if self.child.is_some() {
            return Err(Error::AlreadyStarted);
        }
        let device = self.device.as_ref().ok_or_else(|| {
            Error::Io(io::Error::new(
                io::ErrorKind::NotConnected,
                "pseudo console disposed",
            ))
        })?;

        let mut config = StartupConfig::with_pseudo_console(device.handle)?;
        let child = Child::spawn(&mut config, command_line, false)?;
        // Attribute list released here, now that the child exists.
        drop(config);

        // Without this, the output pipe never reaches end-of-stream: the
        // parent would still hold a writable duplicate after the child
        // exits.
        self.input.close_child_end();
        self.output.close_child_end();

        child.notify_on_exit(self.exit.clone())?;
        self.child = Some(child);
        Ok(())
    }

    /// Write to the child's console input.
    pub fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::Write::write(self.input.parent_file()?, buf)
    }

    /// Write all bytes to the child's console input.
    pub fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        io::Write::write_all(self.input.parent_file()?, buf)
    }

    /// Read from the child's console output. Returns `Ok(0)` at
    /// end-of-stream, after the child has exited.
    pub fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        io::Read::read(self.output.parent_file()?, buf)
    }

    /// Duplicate the parent-side output end for a reader thread.
    pub fn clone_output(&self) -> io::Result<File> {
        self.output.try_clone_parent()
    }

    /// Duplicate the parent-side input end for a writer thread.
    pub fn clone_input(&self) -> io::Result<File> {
        self.input.try_clone_parent()
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

    /// Close the device and both parent-side pipe ends. Safe to call more
    /// than once; later calls are no-ops.
    pub fn dispose(&mut self) {
        if self.device.take().is_some() {
            log::debug!("pseudo console device closed");
        }
        self.input.dispose();
        self.output.dispose();
    }
}

impl Drop for PseudoConsole {
    fn drop(&mut self) {
        self.dispose();
    }
}
