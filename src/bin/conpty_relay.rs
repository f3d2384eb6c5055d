//! ConPTY Relay
//!
//! A simple CLI tool that relays stdin/stdout to a pseudo console session.
//! Used for exercising the session lifecycle without a terminal UI.

#[cfg(windows)]
fn main() -> std::io::Result<()> {
    relay::run()
}

#[cfg(not(windows))]
fn main() {
    eprintln!("conpty-relay only runs on Windows");
    std::process::exit(1);
}

#[cfg(windows)]
mod relay {
    use std::io::{self, Read, Write};
    use std::thread;

    use terminal_conpty::PseudoConsole;
    use windows_sys::Win32::System::Console::{
        GetConsoleMode, GetStdHandle, SetConsoleMode, DISABLE_NEWLINE_AUTO_RETURN,
        ENABLE_VIRTUAL_TERMINAL_PROCESSING, STD_OUTPUT_HANDLE,
    };

    pub fn run() -> io::Result<()> {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

        let command = std::env::args().nth(1).unwrap_or_else(|| "cmd.exe".to_string());

        // The hosting console must interpret the escape sequences ConPTY
        // emits; this is a one-shot opt-in.
        enable_virtual_terminal_processing()?;

        let mut console = PseudoConsole::new().map_err(to_io)?;
        console.start(&command).map_err(to_io)?;
        log::info!("started '{}' (pid {:?})", command, console.child_pid());

        // Output pipe -> our stdout
        let mut output = console.clone_output()?;
        let reader = thread::spawn(move || {
            let mut buf = [0u8; 65536];
            let mut stdout = io::stdout();
            loop {
                match output.read(&mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        if stdout.write_all(&buf[..n]).and_then(|_| stdout.flush()).is_err() {
                            break;
                        }
                    }
                }
            }
        });

        // Our stdin -> input pipe
        let mut input = console.clone_input()?;
        thread::spawn(move || {
            let mut buf = [0u8; 4096];
            let mut stdin = io::stdin();
            loop {
                match stdin.read(&mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        if input.write_all(&buf[..n]).is_err() {
                            break;
                        }
                    }
                }
            }
        });

        console.wait();
        console.dispose();
        let _ = reader.join();
        eprintln!("\r\nChild exited");
        Ok(())
    }

    fn enable_virtual_terminal_processing() -> io::Result<()> {
        unsafe {
            let stdout = GetStdHandle(STD_OUTPUT_HANDLE);
            let mut mode = 0u32;
            if GetConsoleMode(stdout, &mut mode) == 0 {
                return Err(io::Error::last_os_error());
            }
            mode |= ENABLE_VIRTUAL_TERMINAL_PROCESSING | DISABLE_NEWLINE_AUTO_RETURN;
            if SetConsoleMode(stdout, mode) == 0 {
                return Err(io::Error::last_os_error());
            }
        }
        Ok(())
    }

    fn to_io(err: terminal_conpty::Error) -> io::Error {
        io::Error::new(io::ErrorKind::Other, err)
    }
}
