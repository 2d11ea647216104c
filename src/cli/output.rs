//! Writing processed documents and checking them against expected output.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use difference::{Changeset, Difference};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::errors::{Result, SpError};

/// Write `text` to `path`, or to stdout for `-`.
pub fn write_output(path: &Path, text: &str) -> Result<()> {
    if path == Path::new("-") {
        let mut stdout = io::stdout().lock();
        return stdout
            .write_all(text.as_bytes())
            .and_then(|_| stdout.flush())
            .map_err(|e| SpError::io("stdout", e));
    }
    fs::write(path, text).map_err(|e| SpError::io(path.display().to_string(), e))
}

/// Compare `text` with the contents of `path`, printing a line diff to
/// stderr on mismatch.
pub fn check_output(path: &Path, text: &str) -> Result<()> {
    let expected =
        fs::read_to_string(path).map_err(|e| SpError::io(path.display().to_string(), e))?;
    if expected == text {
        return Ok(());
    }

    let changeset = Changeset::new(&expected, text, "\n");
    let mut stderr = StandardStream::stderr(ColorChoice::Auto);
    print_diff(&mut stderr, &changeset.diffs);

    Err(SpError::OutputMismatch {
        path: path.display().to_string(),
    })
}

// ============================================================================
// PRIVATE HELPERS
// ============================================================================

fn print_diff(out: &mut StandardStream, diffs: &[Difference]) {
    for diff in diffs {
        let (color, sign, text) = match diff {
            Difference::Same(x) => (None, ' ', x),
            Difference::Add(x) => (Some(Color::Green), '+', x),
            Difference::Rem(x) => (Some(Color::Red), '-', x),
        };
        let _ = out.set_color(ColorSpec::new().set_fg(color));
        for line in text.split('\n') {
            let _ = writeln!(out, "{}{}", sign, line);
        }
    }
    let _ = out.reset();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("expected.tex");
        fs::write(&path, "a\nb\n").unwrap();

        assert!(check_output(&path, "a\nb\n").is_ok());
        let err = check_output(&path, "a\nc\n").unwrap_err();
        assert!(matches!(err, SpError::OutputMismatch { .. }));
    }

    #[test]
    fn test_write_output_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.gp");
        write_output(&path, "plot x\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "plot x\n");
    }
}
