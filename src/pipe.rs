//! Anonymous pipes with inheritable child ends.
//!
//! Each session pipe has a parent side (kept for I/O) and a child side
//! (handed to the pseudo console device or inherited by the child). The
//! child side goes through an explicit ownership state machine so the
//! parent's local copy is provably closed after the hand-off. Holding it
//! open would keep a writable duplicate alive and the child's output pipe
//! would never reach end-of-stream.

use std::fs::File;
use std::io;
use std::mem;
use std::os::windows::io::{AsRawHandle, FromRawHandle, OwnedHandle, RawHandle};
use std::ptr;

use crate::error::Result;
use crate::native::{
    CreatePipe, SetHandleInformation, HANDLE_FLAG_INHERIT, SECURITY_ATTRIBUTES,
};

/// Ownership state of the child-side pipe end, as seen by the parent.
enum ChildEnd {
    /// The parent still holds its local copy; nothing has consumed it yet.
    Held(OwnedHandle),
    /// The end was handed off (to the device, or to the child through
    /// inheritance), but the parent's local copy is still open.
    Transferred(OwnedHandle),
    /// The parent's local copy is closed.
    Closed,
}

/// One anonymous pipe: a parent-side `File` plus a state-tracked child end.
pub(crate) struct InheritablePipe {
    parent: Option<File>,
    child: ChildEnd,
}

impl InheritablePipe {
    /// Input pipe: the parent writes, the child reads.
    pub(crate) fn parent_writes() -> Result<Self> {
        let (read, write) = create_inheritable_pair()?;
        Self::assemble(write, read)
    }

    /// Output pipe: the parent reads, the child writes.
    pub(crate) fn parent_reads() -> Result<Self> {
        let (read, write) = create_inheritable_pair()?;
        Self::assemble(read, write)
    }

    fn assemble(parent: OwnedHandle, child: OwnedHandle) -> Result<Self> {
        // CreatePipe marked both ends inheritable; only the child side may
        // cross the process boundary.
        let ok = unsafe { SetHandleInformation(parent.as_raw_handle(), HANDLE_FLAG_INHERIT, 0) };
        if ok == 0 {
            return Err(io::Error::last_os_error().into());
        }
        Ok(InheritablePipe {
            parent: Some(File::from(parent)),
            child: ChildEnd::Held(child),
        })
    }

    /// Raw child-side handle for device creation or inheritance marshaling.
    /// Null once the local copy has been closed.
    pub(crate) fn child_raw(&self) -> RawHandle {
        match &self.child {
            ChildEnd::Held(handle) | ChildEnd::Transferred(handle) => handle.as_raw_handle(),
            ChildEnd::Closed => ptr::null_mut(),
        }
    }

    /// Record that the child end was handed off to the device or the child.
    pub(crate) fn transfer_child_end(&mut self) {
        self.child = match mem::replace(&mut self.child, ChildEnd::Closed) {
            ChildEnd::Held(handle) => ChildEnd::Transferred(handle),
            other => other,
        };
    }

    /// Close the parent's local copy of the child end. Valid only after the
    /// hand-off; closing an end that was never transferred is a sequencing
    /// bug in the session.
    pub(crate) fn close_child_end(&mut self) {
        match mem::replace(&mut self.child, ChildEnd::Closed) {
            ChildEnd::Transferred(handle) => drop(handle),
            ChildEnd::Held(handle) => {
                debug_assert!(false, "child end closed before hand-off");
                drop(handle);
            }
            ChildEnd::Closed => {}
        }
    }

    /// Parent-side file for I/O. Fails once the pipe is disposed.
    pub(crate) fn parent_file(&mut self) -> io::Result<&mut File> {
        self.parent
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "pipe disposed"))
    }

    /// Duplicate the parent side so a stream client can service it on its
    /// own thread.
    pub(crate) fn try_clone_parent(&self) -> io::Result<File> {
        match &self.parent {
            Some(file) => file.try_clone(),
            None => Err(io::Error::new(io::ErrorKind::NotConnected, "pipe disposed")),
        }
    }

    /// Close both sides. Safe to call repeatedly.
    pub(crate) fn dispose(&mut self) {
        self.parent = None;
        match mem::replace(&mut self.child, ChildEnd::Closed) {
            ChildEnd::Held(handle) | ChildEnd::Transferred(handle) => drop(handle),
            ChildEnd::Closed => {}
        }
    }
}

fn create_inheritable_pair() -> Result<(OwnedHandle, OwnedHandle)> {
    let mut read = ptr::null_mut();
    let mut write = ptr::null_mut();
    let attributes = SECURITY_ATTRIBUTES {
        nLength: mem::size_of::<SECURITY_ATTRIBUTES>() as u32,
        lpSecurityDescriptor: ptr::null_mut(),
        bInheritHandle: 1,
    };
    let ok = unsafe { CreatePipe(&mut read, &mut write, &attributes, 0) };
    if ok == 0 {
        return Err(io::Error::last_os_error().into());
    }
    unsafe {
        Ok((
            OwnedHandle::from_raw_handle(read),
            OwnedHandle::from_raw_handle(write),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};

    #[test]
    fn test_parent_ends_carry_data() {
        let mut input = InheritablePipe::parent_writes().unwrap();
        let output = InheritablePipe::parent_reads().unwrap();

        // Loop the parent write end back through the output pipe's child end
        // is not possible without a child, but each pair is itself a pipe:
        // write into the input pipe's parent end and read from its child end.
        input.parent_file().unwrap().write_all(b"ping").unwrap();
        let child = input.child_raw();
        assert!(!child.is_null());

        let mut reader = unsafe { File::from_raw_handle(child) };
        let mut buf = [0u8; 4];
        reader.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"ping");
        // reader borrowed the handle the pipe still owns
        mem::forget(reader);

        assert!(!output.child_raw().is_null());
    }

    #[test]
    fn test_dispose_is_idempotent() {
        let mut pipe = InheritablePipe::parent_reads().unwrap();
        pipe.transfer_child_end();
        pipe.dispose();
        pipe.dispose();
        assert!(pipe.child_raw().is_null());
        assert!(pipe.parent_file().is_err());
    }

    #[test]
    fn test_close_after_transfer() {
        let mut pipe = InheritablePipe::parent_writes().unwrap();
        pipe.transfer_child_end();
        pipe.close_child_end();
        assert!(pipe.child_raw().is_null());
        // parent side survives the child-end close
        assert!(pipe.parent_file().is_ok());
    }
}
