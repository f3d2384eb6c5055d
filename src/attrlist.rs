//! Proc-thread attribute list builder.
//!
//! The attribute list is an opaque, variable-length buffer sized by a
//! two-phase probe: ask for the required size against a null buffer (that
//! call is expected to fail), allocate exactly that many bytes, then
//! initialize the real buffer. The buffer and its offsets never leave this
//! module; callers only allocate, set and drop.

#[cfg(windows)]
use std::ffi::c_void;
#[cfg(windows)]
use std::io;
#[cfg(windows)]
use std::ptr;

use crate::error::{Error, Result};
#[cfg(windows)]
use crate::native::{
    DeleteProcThreadAttributeList, InitializeProcThreadAttributeList, UpdateProcThreadAttribute,
    LPPROC_THREAD_ATTRIBUTE_LIST,
};

/// Judge the sizing probe's outcome and yield the required byte size.
///
/// The probe reports failure by contract; it only exists to yield the
/// required size. An unexpected success or a zero size means the probe
/// semantics were violated and the launch attempt must not proceed.
#[cfg_attr(not(windows), allow(dead_code))]
fn probe_outcome(probe_succeeded: bool, size: usize) -> Result<usize> {
    if probe_succeeded || size == 0 {
        return Err(Error::SizeProbe);
    }
    Ok(size)
}

/// An initialized proc-thread attribute list.
///
/// Single-use: attributes are only ever added, up to the count declared at
/// allocation. The native list is deleted on drop, which must happen after
/// (and regardless of the outcome of) process creation.
#[cfg(windows)]
pub(crate) struct AttributeList {
    buf: Vec<u8>,
}

#[cfg(windows)]
impl AttributeList {
    /// Allocate and initialize a list sized for `attribute_count` entries.
    pub(crate) fn new(attribute_count: u32) -> Result<Self> {
        let mut size = 0usize;
        let probe = unsafe {
            InitializeProcThreadAttributeList(ptr::null_mut(), attribute_count, 0, &mut size)
        };
        let size = probe_outcome(probe != 0, size)?;

        let mut buf = vec![0u8; size];
        let mut size = size;
        let ok = unsafe {
            InitializeProcThreadAttributeList(buf.as_mut_ptr().cast(), attribute_count, 0, &mut size)
        };
        if ok == 0 {
            return Err(Error::AttributeListInit(io::Error::last_os_error()));
        }
        Ok(AttributeList { buf })
    }

    /// Install one attribute value under `attribute`.
    ///
    /// For pointer-valued attributes the pointed-to storage must outlive
    /// the list; for the pseudo console attribute the handle value itself
    /// is passed as `value`.
    pub(crate) fn set(&mut self, attribute: usize, value: *const c_void, size: usize) -> Result<()> {
        let ok = unsafe {
            UpdateProcThreadAttribute(
                self.as_ptr(),
                0,
                attribute,
                value,
                size,
                ptr::null_mut(),
                ptr::null_mut(),
            )
        };
        if ok == 0 {
            return Err(Error::AttributeSet(io::Error::last_os_error()));
        }
        Ok(())
    }

    /// Pointer for `STARTUPINFOEXW::lpAttributeList`.
    pub(crate) fn as_ptr(&mut self) -> LPPROC_THREAD_ATTRIBUTE_LIST {
        self.buf.as_mut_ptr().cast()
    }
}

#[cfg(windows)]
impl Drop for AttributeList {
    fn drop(&mut self) {
        // The list was initialized in `new`, so the delete is always owed.
        unsafe { DeleteProcThreadAttributeList(self.buf.as_mut_ptr().cast()) };
    }
}
