//! Process launching with extended startup configuration.
//!
//! `StartupConfig` assembles the extensible startup parameters for one
//! launch attempt: the attribute list carrying either the pseudo console
//! device handle or an explicit inheritable-handle list, the packed legacy
//! reserved buffer, and optional standard-handle overrides. `Child::spawn`
//! performs the creation call and wraps the resulting handles.

use std::ffi::{c_void, OsStr};
use std::io;
use std::iter::once;
use std::mem;
use std::os::windows::ffi::OsStrExt;
use std::os::windows::io::{
    AsHandle, AsRawHandle, BorrowedHandle, FromRawHandle, OwnedHandle, RawHandle,
};
use std::ptr;
use std::thread;

use crate::error::{Error, Result};
use crate::inherit::pack_inherited_handles;
use crate::native::{
    CreateProcessW, SetHandleInformation, WaitForSingleObject, EXTENDED_STARTUPINFO_PRESENT,
    HANDLE, HANDLE_FLAG_INHERIT, INFINITE, PROCESS_INFORMATION, PROC_THREAD_ATTRIBUTE_HANDLE_LIST,
    PROC_THREAD_ATTRIBUTE_PSEUDOCONSOLE, STARTF_USESTDHANDLES, STARTUPINFOEXW,
};
use crate::attrlist::AttributeList;
use crate::signal::ExitSignal;

/// Startup configuration for a single launch attempt.
///
/// Owns every piece of storage the native startup structures point into:
/// the attribute list buffer, the handle array referenced by the
/// handle-list attribute, and the packed reserved buffer. Dropping the
/// config after `Child::spawn` releases the attribute list, which is owed
/// whether or not the launch succeeded.
pub struct StartupConfig {
    attributes: AttributeList,
    // Referenced by the handle-list attribute; the heap allocation must
    // stay put until the attribute list is deleted.
    _handle_list: Option<Vec<HANDLE>>,
    reserved2: Option<Vec<u8>>,
    std_output: HANDLE,
    std_error: HANDLE,
    flags: u32,
}

impl StartupConfig {
    /// Configuration attaching the child to a pseudo console device.
    ///
    /// The device handle is carried exclusively through the attribute list;
    /// general handle inheritance is not required for this mode.
    pub fn with_pseudo_console(device: RawHandle) -> Result<Self> {
        let mut attributes = AttributeList::new(1)?;
        // The attribute payload is the handle value itself, not a pointer
        // to it.
        attributes.set(
            PROC_THREAD_ATTRIBUTE_PSEUDOCONSOLE,
            device as *const c_void,
            mem::size_of::<RawHandle>(),
        )?;
        Ok(StartupConfig {
            attributes,
            _handle_list: None,
            reserved2: None,
            std_output: ptr::null_mut(),
            std_error: ptr::null_mut(),
            flags: 0,
        })
    }

    /// Configuration marshaling explicit pipe handles into the child.
    ///
    /// `handles` and `flags` must have the same length; the mismatch is
    /// rejected before any native call is made. Each handle is flagged
    /// inheritable and written both into the handle-list attribute and the
    /// packed legacy reserved buffer.
    pub fn with_inherited_handles(handles: &[RawHandle], flags: &[u8]) -> Result<Self> {
        let values: Vec<usize> = handles.iter().map(|h| *h as usize).collect();
        let reserved2 = pack_inherited_handles(&values, flags)?;

        let mut attributes = AttributeList::new(1)?;
        let list: Vec<HANDLE> = handles.to_vec();
        attributes.set(
            PROC_THREAD_ATTRIBUTE_HANDLE_LIST,
            list.as_ptr().cast(),
            mem::size_of::<HANDLE>() * list.len(),
        )?;

        for &handle in handles {
            let ok =
                unsafe { SetHandleInformation(handle, HANDLE_FLAG_INHERIT, HANDLE_FLAG_INHERIT) };
            if ok == 0 {
                return Err(io::Error::last_os_error().into());
            }
        }

        Ok(StartupConfig {
            attributes,
            _handle_list: Some(list),
            reserved2: Some(reserved2),
            std_output: ptr::null_mut(),
            std_error: ptr::null_mut(),
            flags: 0,
        })
    }

    /// Point the child's standard output at `handle`.
    pub fn redirect_std_output(&mut self, handle: RawHandle) {
        self.std_output = handle;
        self.flags |= STARTF_USESTDHANDLES;
    }

    /// Point the child's standard error at `handle`.
    pub fn redirect_std_error(&mut self, handle: RawHandle) {
        self.std_error = handle;
        self.flags |= STARTF_USESTDHANDLES;
    }
}

/// A launched child process: process and thread handles plus their ids.
///
/// Both native handles are exclusively owned and closed on drop. Closing
/// them does not terminate the child.
pub struct Child {
    process: OwnedHandle,
    _thread: OwnedHandle,
    pid: u32,
    tid: u32,
}

impl Child {
    /// Create the process described by `config` and `command_line`.
    ///
    /// The command line is handed to the OS verbatim; no shell
    /// interpretation happens at this layer. `inherit_handles` must be true
    /// when the config marshals explicit handles, and the extended startup
    /// form is always requested because an attribute list is always
    /// present.
    pub fn spawn(config: &mut StartupConfig, command_line: &str, inherit_handles: bool) -> Result<Self> {
        // CreateProcessW may modify the command line buffer in place.
        let mut command: Vec<u16> = OsStr::new(command_line)
            .encode_wide()
            .chain(once(0))
            .collect();

        let mut startup: STARTUPINFOEXW = unsafe { mem::zeroed() };
        startup.StartupInfo.cb = mem::size_of::<STARTUPINFOEXW>() as u32;
        startup.StartupInfo.dwFlags = config.flags;
        startup.StartupInfo.hStdOutput = config.std_output;
        startup.StartupInfo.hStdError = config.std_error;
        startup.lpAttributeList = config.attributes.as_ptr();
        if let Some(reserved) = &config.reserved2 {
            startup.StartupInfo.cbReserved2 = reserved.len() as u16;
            startup.StartupInfo.lpReserved2 = reserved.as_ptr() as *mut u8;
        }

        let mut info: PROCESS_INFORMATION = unsafe { mem::zeroed() };
        let ok = unsafe {
            CreateProcessW(
                ptr::null(),
                command.as_mut_ptr(),
                ptr::null(),
                ptr::null(),
                i32::from(inherit_handles),
                EXTENDED_STARTUPINFO_PRESENT,
                ptr::null(),
                ptr::null(),
                &startup.StartupInfo,
                &mut info,
            )
        };
        if ok == 0 {
            let code = io::Error::last_os_error().raw_os_error().unwrap_or(0) as u32;
            return Err(Error::Launch(code));
        }

        log::debug!("spawned child pid {} ({command_line})", info.dwProcessId);
        unsafe {
            Ok(Child {
                process: OwnedHandle::from_raw_handle(info.hProcess),
                _thread: OwnedHandle::from_raw_handle(info.hThread),
                pid: info.dwProcessId,
                tid: info.dwThreadId,
            })
        }
    }

    /// Child process id
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Primary thread id
    pub fn tid(&self) -> u32 {
        self.tid
    }

    /// Borrow the process handle
    pub fn process_handle(&self) -> BorrowedHandle<'_> {
        self.process.as_handle()
    }

    /// Fire `signal` once the process handle becomes signaled.
    ///
    /// The wait runs on a dedicated background thread against a duplicate
    /// of the process handle, so it is decoupled from the caller and from
    /// the session's own lifetime. No timeout; the thread lives as long as
    /// the child does.
    pub(crate) fn notify_on_exit(&self, signal: ExitSignal) -> Result<()> {
        let handle = self.process.try_clone().map_err(Error::Io)?;
        let pid = self.pid;
        thread::Builder::new()
            .name("conpty-exit-wait".to_string())
            .spawn(move || {
                unsafe { WaitForSingleObject(handle.as_raw_handle(), INFINITE) };
                log::debug!("child pid {pid} exited");
                signal.fire();
            })
            .map_err(Error::Io)?;
        Ok(())
    }
}
