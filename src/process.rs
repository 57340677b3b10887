//! External command execution
//!
//! Every call to the packaging tool or the service-control utility goes
//! through [`CommandRunner`], so the lifecycle logic can be exercised
//! without touching the real service manager.

use std::ffi::OsString;
use std::io;
use std::path::Path;
use std::process::Command;
use tracing::trace;

/// Captured result of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when the process was terminated by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Build from raw pipe contents, decoding each stream
    pub fn from_raw(code: Option<i32>, stdout: &[u8], stderr: &[u8]) -> Self {
        Self {
            code,
            stdout: decode_console(stdout),
            stderr: decode_console(stderr),
        }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Human-readable exit status
    pub fn status(&self) -> String {
        match self.code {
            Some(code) => format!("exit code {}", code),
            None => "terminated by signal".to_string(),
        }
    }

    /// stderr if present, otherwise stdout
    pub fn detail(&self) -> &str {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            self.stdout.trim()
        } else {
            stderr
        }
    }
}

/// Runs an external program to completion
pub trait CommandRunner {
    /// Run `program` with `args`, blocking until it exits
    fn run(&self, program: &Path, args: &[OsString]) -> io::Result<CommandOutput>;
}

/// Runs commands with [`std::process::Command`]
///
/// There is no timeout: a hung tool hangs the caller.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &Path, args: &[OsString]) -> io::Result<CommandOutput> {
        trace!("Running {} {:?}", program.display(), args);

        let output = Command::new(program).args(args).output()?;
        Ok(CommandOutput::from_raw(
            output.status.code(),
            &output.stdout,
            &output.stderr,
        ))
    }
}

/// Decode console output that may be UTF-16LE
///
/// NSSM writes UTF-16LE to pipes. Output is treated as UTF-16LE when it
/// carries the FF FE byte order mark, or when it has even length and NUL
/// bytes at odd offsets (the high byte of ASCII code units).
pub fn decode_console(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFF, 0xFE]) {
        return decode_utf16le(rest);
    }
    if looks_like_utf16le(bytes) {
        return decode_utf16le(bytes);
    }
    String::from_utf8_lossy(bytes).into_owned()
}

fn looks_like_utf16le(bytes: &[u8]) -> bool {
    !bytes.is_empty()
        && bytes.len() % 2 == 0
        && bytes.iter().skip(1).step_by(2).any(|b| *b == 0)
}

fn decode_utf16le(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16_lossy(&units)
}

/// Render a command line for log messages
pub fn display_command(program: &Path, args: &[OsString]) -> String {
    let mut line = program.display().to_string();
    for arg in args {
        line.push(' ');
        line.push_str(&arg.to_string_lossy());
    }
    line
}
