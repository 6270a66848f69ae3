//! Reading the run request from the command line or stdin.

use anyhow::{Context, Result};
use std::io::Read;

/// Positional value that means "read the request from stdin".
pub const STDIN_MARKER: &str = "-";

/// Returns the JSON text of the run request.
pub fn read_request_input(arg: &str, mut stdin: impl Read) -> Result<String> {
    if arg != STDIN_MARKER {
        return Ok(arg.to_string());
    }

    let mut buf = String::new();
    stdin
        .read_to_string(&mut buf)
        .context("failed to read the run request from stdin")?;
    Ok(buf)
}
