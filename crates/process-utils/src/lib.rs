//! Child-process helpers used by the remux engine.

use std::ffi::OsStr;
use std::process::Stdio;

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Apply the Windows `CREATE_NO_WINDOW` flag to child processes.
///
/// On non-Windows targets this is a no-op.
pub trait NoWindowExt {
    fn no_window(&mut self);
}

/// Detach all three standard streams of a child process.
///
/// The child neither inherits the parent's terminal nor has its output
/// captured, so a chatty tool cannot block on a full pipe.
pub trait DiscardStdioExt {
    fn discard_stdio(&mut self) -> &mut Self;
}

impl NoWindowExt for std::process::Command {
    fn no_window(&mut self) {
        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            self.creation_flags(CREATE_NO_WINDOW);
        }
    }
}

impl DiscardStdioExt for std::process::Command {
    fn discard_stdio(&mut self) -> &mut Self {
        self.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
    }
}

/// Create a `std::process::Command` with `CREATE_NO_WINDOW` applied on Windows.
pub fn std_command(program: impl AsRef<OsStr>) -> std::process::Command {
    let mut cmd = std::process::Command::new(program);
    cmd.no_window();
    cmd
}

/// Run `program <flag>` and return the first line it prints on stdout.
///
/// Returns `None` when the program cannot be started or exits unsuccessfully.
pub fn query_version(program: impl AsRef<OsStr>, flag: &str) -> Option<String> {
    let output = std_command(program)
        .arg(flag)
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
}

#[cfg(feature = "tokio")]
impl NoWindowExt for tokio::process::Command {
    fn no_window(&mut self) {
        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            self.as_std_mut().creation_flags(CREATE_NO_WINDOW);
        }
    }
}

#[cfg(feature = "tokio")]
impl DiscardStdioExt for tokio::process::Command {
    fn discard_stdio(&mut self) -> &mut Self {
        self.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
    }
}

/// Create a `tokio::process::Command` for a long-running child.
///
/// `CREATE_NO_WINDOW` is applied on Windows and the child is killed when the
/// handle is dropped, so an abandoned task never leaves an orphan behind.
#[cfg(feature = "tokio")]
pub fn tokio_command(program: impl AsRef<OsStr>) -> tokio::process::Command {
    let mut cmd = tokio::process::Command::new(program);
    cmd.no_window();
    cmd.kill_on_drop(true);
    cmd
}
