//! Console size for the pseudo console device.

/// Console size in character cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsoleSize {
    /// Number of columns (characters per line)
    pub cols: u16,
    /// Number of rows (lines)
    pub rows: u16,
}

impl ConsoleSize {
    /// Create a new console size
    pub fn new(cols: u16, rows: u16) -> Self {
        ConsoleSize { cols, rows }
    }

    /// Convert to the COORD structure expected by `CreatePseudoConsole`
    #[cfg(windows)]
    pub(crate) fn to_coord(self) -> windows_sys::Win32::System::Console::COORD {
        windows_sys::Win32::System::Console::COORD {
            X: self.cols as i16,
            Y: self.rows as i16,
        }
    }
}

impl Default for ConsoleSize {
    /// The fixed geometry a pseudo console session is created with
    fn default() -> Self {
        ConsoleSize::new(120, 80)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_size_new() {
        let size = ConsoleSize::new(80, 24);
        assert_eq!(size.cols, 80);
        assert_eq!(size.rows, 24);
    }

    #[test]
    fn test_console_size_default() {
        let size = ConsoleSize::default();
        assert_eq!(size.cols, 120);
        assert_eq!(size.rows, 80);
    }

    #[cfg(windows)]
    #[test]
    fn test_to_coord() {
        let coord = ConsoleSize::new(120, 80).to_coord();
        assert_eq!(coord.X, 120);
        assert_eq!(coord.Y, 80);
    }
}
