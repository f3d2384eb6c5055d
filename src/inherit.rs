//! Legacy inherited-handle buffer packing.
//!
//! `CreateProcess` carries per-handle CRT inheritance data in the startup
//! descriptor's reserved region (`cbReserved2`/`lpReserved2`): a 32-bit
//! count, then one flag byte per handle, then one pointer-sized handle
//! value per handle, in matching order. The layout is defined once here so
//! it can be validated and tested without launching anything.

use std::io;
use std::mem;

use crate::error::{Error, Result};

/// Pack handle values and their CRT flag bytes into the reserved-buffer
/// layout: `[count: u32][flags: u8 * n][handles: usize * n]`.
///
/// Rejects mismatched array lengths before anything else happens, so a
/// caller error never produces partial native state.
#[cfg_attr(not(windows), allow(dead_code))]
pub(crate) fn pack_inherited_handles(handles: &[usize], flags: &[u8]) -> Result<Vec<u8>> {
    if handles.len() != flags.len() {
        return Err(Error::MismatchedFlags {
            handles: handles.len(),
            flags: flags.len(),
        });
    }

    let len = 4 + flags.len() + mem::size_of::<usize>() * handles.len();
    if len > u16::MAX as usize {
        // cbReserved2 is a 16-bit field
        return Err(Error::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            "too many handles for the reserved startup buffer",
        )));
    }

    let mut buf = Vec::with_capacity(len);
    buf.extend_from_slice(&(handles.len() as u32).to_ne_bytes());
    buf.extend_from_slice(flags);
    for handle in handles {
        buf.extend_from_slice(&handle.to_ne_bytes());
    }
    Ok(buf)
}
