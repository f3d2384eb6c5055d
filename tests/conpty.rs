//! Integration tests for pseudo console and stream sessions.
//!
//! These spawn real children through cmd.exe, so they only run on Windows.

#![cfg(windows)]

use std::io::Read;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use terminal_conpty::{Error, ExitSignal, PseudoConsole, StartupConfig, StreamConsole};

/// Block until `signal` fires, panicking after `timeout`.
fn assert_fires_within(signal: &ExitSignal, timeout: Duration) {
    let (tx, rx) = mpsc::channel();
    let waiter = signal.clone();
    thread::spawn(move || {
        waiter.wait();
        let _ = tx.send(());
    });
    rx.recv_timeout(timeout)
        .expect("exit signal did not fire in time");
}

/// Collect everything a reader yields until end-of-stream.
fn drain_to_string(mut reader: impl Read + Send + 'static) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut out = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            match reader.read(&mut buf) {
                Ok(0) | Err(_) => break,
                Ok(n) => out.extend_from_slice(&buf[..n]),
            }
        }
        String::from_utf8_lossy(&out).into_owned()
    })
}

#[test]
fn test_pseudo_console_echo_end_to_end() {
    let mut console = PseudoConsole::new().expect("failed to create pseudo console");
    let reader = drain_to_string(console.clone_output().unwrap());

    console
        .start("cmd.exe /C echo MARKER_conpty_MARKER")
        .expect("failed to start child");

    assert_fires_within(&console.exit_signal(), Duration::from_secs(10));

    // Give ConPTY a moment to flush, then close the device so the output
    // pipe reaches end-of-stream.
    thread::sleep(Duration::from_millis(200));
    console.dispose();

    let output = reader.join().unwrap();
    assert!(
        output.contains("MARKER_conpty_MARKER"),
        "expected marker in output, got: {output:?}"
    );
}

#[test]
fn test_pseudo_console_input_buffered_before_start() {
    let mut console = PseudoConsole::new().unwrap();
    // No child exists yet; the bytes wait in the pipe until cmd reads them.
    console.write_all(b"exit\r").unwrap();
    console.start("cmd.exe").unwrap();

    assert_fires_within(&console.exit_signal(), Duration::from_secs(10));
}

#[test]
fn test_signal_fires_only_after_exit() {
    let mut console = PseudoConsole::new().unwrap();
    // ping -n 2 waits roughly one second between probes
    console
        .start("cmd.exe /C ping -n 2 127.0.0.1 > NUL")
        .unwrap();

    assert!(
        !console.has_exited(),
        "signal set before the child could have exited"
    );
    thread::sleep(Duration::from_millis(200));
    assert!(!console.has_exited());

    assert_fires_within(&console.exit_signal(), Duration::from_secs(15));
    assert!(console.has_exited());
}

#[test]
fn test_pseudo_console_dispose_twice() {
    let mut console = PseudoConsole::new().unwrap();
    console.start("cmd.exe /C exit").unwrap();
    console.wait();
    console.dispose();
    console.dispose();
}

#[test]
fn test_stream_console_echo_end_to_end() {
    let mut console = StreamConsole::new().expect("failed to create stream console");
    let reader = drain_to_string(console.clone_output().unwrap());

    console
        .start("cmd.exe /C echo MARKER_stream_MARKER")
        .expect("failed to start child");

    assert_fires_within(&console.exit_signal(), Duration::from_secs(10));

    // All write ends are gone once the child exits, so the reader sees
    // end-of-stream without any device close.
    let output = reader.join().unwrap();
    assert!(
        output.contains("MARKER_stream_MARKER"),
        "expected marker in output, got: {output:?}"
    );
}

#[test]
fn test_stream_console_error_pipe_stays_separate() {
    let mut console = StreamConsole::new().unwrap();
    let out_reader = drain_to_string(console.clone_output().unwrap());
    let err_reader = drain_to_string(console.clone_error().unwrap());

    // Standard error is folded into the output pipe at the std-handle
    // level; 2>&1 style output lands on the output pipe, and the dedicated
    // error pipe carries nothing the child does not write to it explicitly.
    console
        .start("cmd.exe /C echo oops 1>&2")
        .expect("failed to start child");

    assert_fires_within(&console.exit_signal(), Duration::from_secs(10));
    console.dispose();

    let output = out_reader.join().unwrap();
    let errors = err_reader.join().unwrap();
    assert!(output.contains("oops"), "stderr text should reach the output pipe, got: {output:?}");
    assert!(errors.is_empty(), "dedicated error pipe should stay silent, got: {errors:?}");
}

#[test]
fn test_stream_console_start_twice() {
    let mut console = StreamConsole::new().unwrap();
    console.start("cmd.exe /C exit").unwrap();
    let pid = console.child_pid();
    assert!(matches!(
        console.start("cmd.exe /C exit"),
        Err(Error::AlreadyStarted)
    ));
    assert_eq!(console.child_pid(), pid, "first child must be untouched");
}

#[test]
fn test_mismatched_flags_rejected_before_launch() {
    let handles = [std::ptr::null_mut(), std::ptr::null_mut(), std::ptr::null_mut()];
    let flags = [0x41u8, 0x41];
    match StartupConfig::with_inherited_handles(&handles, &flags) {
        Err(Error::MismatchedFlags { handles, flags }) => {
            assert_eq!(handles, 3);
            assert_eq!(flags, 2);
        }
        other => panic!("expected MismatchedFlags, got {:?}", other.err()),
    }
}
