//! Native process creation surface.
//!
//! Typed access to the Win32 facilities the crate builds on: the extended
//! startup structures, the proc-thread attribute primitives and the pseudo
//! console entry points. Pure FFI surface from `windows-sys`, plus the few
//! constants the bindings do not carry. No policy lives here.

pub(crate) use windows_sys::Win32::Foundation::{
    SetHandleInformation, HANDLE, HANDLE_FLAG_INHERIT, S_OK,
};
pub(crate) use windows_sys::Win32::Security::SECURITY_ATTRIBUTES;
pub(crate) use windows_sys::Win32::System::Console::{ClosePseudoConsole, CreatePseudoConsole, HPCON};
pub(crate) use windows_sys::Win32::System::Pipes::CreatePipe;
pub(crate) use windows_sys::Win32::System::Threading::{
    CreateProcessW, DeleteProcThreadAttributeList, InitializeProcThreadAttributeList,
    UpdateProcThreadAttribute, WaitForSingleObject, EXTENDED_STARTUPINFO_PRESENT, INFINITE,
    LPPROC_THREAD_ATTRIBUTE_LIST, PROCESS_INFORMATION, STARTF_USESTDHANDLES, STARTUPINFOEXW,
};

/// Attribute id carrying the pseudo console device handle into process
/// creation.
pub(crate) const PROC_THREAD_ATTRIBUTE_PSEUDOCONSOLE: usize = 0x0002_0016;

/// Attribute id carrying an explicit list of handles the child inherits.
pub(crate) const PROC_THREAD_ATTRIBUTE_HANDLE_LIST: usize = 0x0002_0002;

/// CRT per-handle inheritance flag: handle is open.
pub(crate) const FOPEN: u8 = 0x01;

/// CRT per-handle inheritance flag: handle refers to a device.
pub(crate) const FDEV: u8 = 0x40;
