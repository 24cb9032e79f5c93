#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,

    /// A workload script could not be read or parsed.
    ScriptError = 20,

    /// Invalid CLI/config/options (bad flags, invalid durations, malformed address, etc.).
    InvalidInput = 30,

    /// Driver or dataset initializer failure.
    RuntimeError = 40,

    /// Every worker aborted; there is nothing to report.
    NoUsableResults = 41,
}

impl ExitCode {
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}
