//! Interactive selection through `fzf` and handing the choice to the
//! platform's file manager.

use crate::error::PickerError;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::process::{Command, Stdio};

/// Picker binary looked up on `PATH`.
pub const PICKER_PROGRAM: &str = "fzf";

/// Arguments passed to the picker.
pub const PICKER_ARGS: &[&str] = &["--prompt", "findex > ", "--height", "40%", "--reverse"];

/// What to do with a picked path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenAction {
    /// Open with the default application
    Open,
    /// Show in the file manager
    Reveal,
}

/// Lets the user pick one of `paths` with `fzf`.
///
/// Returns `Ok(None)` if the picker was dismissed.
///
/// # Errors
///
/// Returns `PickerError::NotInstalled` if `fzf` is not on `PATH`, or
/// `PickerError::Io` if it could not be driven.
pub fn pick(paths: &[String]) -> Result<Option<String>, PickerError> {
    pick_with(PICKER_PROGRAM, PICKER_ARGS, paths)
}

/// Runs `program` as a line picker: `paths` on stdin, one choice on stdout.
///
/// # Errors
///
/// Same as [`pick`].
pub fn pick_with(
    program: &'static str,
    args: &[&str],
    paths: &[String],
) -> Result<Option<String>, PickerError> {
    let mut child = match Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .spawn()
    {
        Ok(child) => child,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(PickerError::NotInstalled { program });
        }
        Err(e) => return Err(e.into()),
    };

    let stdin = child
        .stdin
        .take()
        .ok_or_else(|| io::Error::other("picker stdin unavailable"))?;
    let mut input = paths.join("\n");
    input.push('\n');

    // Feed from a thread so a picker that stops reading early cannot
    // deadlock against our wait on its stdout.
    let feeder = std::thread::spawn(move || -> io::Result<()> {
        let mut w = BufWriter::new(stdin);
        w.write_all(input.as_bytes())?;
        w.flush()
    });

    let output = child.wait_with_output()?;
    if let Ok(Err(e)) = feeder.join() {
        // Broken pipe once the user has picked is expected
        tracing::debug!(error = %e, "Picker closed stdin early");
    }

    let choice = String::from_utf8_lossy(&output.stdout).trim().to_string();
    Ok((!choice.is_empty()).then_some(choice))
}

/// Builds the platform command that opens or reveals `path`.
#[must_use]
pub fn open_command(action: OpenAction, path: &Path) -> Command {
    if cfg!(target_os = "macos") {
        let mut cmd = Command::new("open");
        if action == OpenAction::Reveal {
            cmd.arg("-R");
        }
        cmd.arg(path);
        cmd
    } else if cfg!(windows) {
        let mut cmd = Command::new("explorer");
        match action {
            OpenAction::Open => cmd.arg(path),
            OpenAction::Reveal => cmd.arg(format!("/select,{}", path.display())),
        };
        cmd
    } else {
        let target = match action {
            OpenAction::Open => path,
            OpenAction::Reveal => path.parent().unwrap_or(path),
        };
        let mut cmd = Command::new("xdg-open");
        cmd.arg(target);
        cmd
    }
}

/// Opens or reveals `path`. Failures are logged, never returned.
pub fn open_path(action: OpenAction, path: &Path) {
    let mut cmd = open_command(action, path);
    match cmd.status() {
        Ok(status) if status.success() => {
            tracing::debug!(path = %path.display(), ?action, "Handed off to opener");
        }
        Ok(status) => {
            tracing::warn!(path = %path.display(), %status, "Opener exited unsuccessfully");
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to launch opener");
        }
    }
}
