//! Line-delimited JSON loop
//!
//! Reads one request object per line and writes exactly one compact JSON
//! response per non-blank line. A malformed line, including one that is
//! not UTF-8, gets an input error and the loop carries on.

use std::io::{BufRead, BufReader, Write};

use anyhow::Result;
use serde_json::Value;
use tracing::{debug, info};

use super::handlers::{error_response, handle};
use crate::core::notebook::Notebook;
use crate::error::NotesError;

/// Serve requests from `reader` until EOF
pub fn serve<R: BufRead, W: Write>(
    notebook: &Notebook,
    mut reader: R,
    mut writer: W,
) -> Result<()> {
    let mut served = 0usize;
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        while matches!(buf.last(), Some(b'\n' | b'\r')) {
            buf.pop();
        }

        let response = match std::str::from_utf8(&buf) {
            Ok(line) if line.trim().is_empty() => continue,
            Ok(line) => {
                let head: String = line.chars().take(100).collect();
                debug!(request = %head, "received");
                match serde_json::from_str::<Value>(line) {
                    Ok(request) => handle(notebook, &request),
                    Err(e) => error_response(&NotesError::invalid(format!("parse error: {}", e))),
                }
            }
            Err(e) => error_response(&NotesError::invalid(format!("request is not UTF-8: {}", e))),
        };

        writeln!(writer, "{}", serde_json::to_string(&response)?)?;
        writer.flush()?;
        served += 1;
    }
    info!(served, "input closed");
    Ok(())
}

/// Serve stdin to stdout
pub fn run_stdio(notebook: &Notebook) -> Result<()> {
    info!(root = %notebook.root().path.display(), "serving on stdio");
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    serve(notebook, BufReader::new(stdin.lock()), stdout.lock())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, ResolvedRoot};
    use anyhow::Result;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn run(dir: &TempDir, input: &str) -> Result<Vec<Value>> {
        run_bytes(dir, input.as_bytes())
    }

    fn run_bytes(dir: &TempDir, input: &[u8]) -> Result<Vec<Value>> {
        let nb = Notebook::open(ResolvedRoot::fixed(dir.path()), Config::default())
            .with_today(NaiveDate::from_ymd_opt(2025, 11, 3).unwrap());
        let mut out = Vec::new();
        serve(&nb, input, &mut out)?;
        String::from_utf8(out)?
            .lines()
            .map(|l| Ok(serde_json::from_str(l)?))
            .collect()
    }

    #[test]
    fn test_one_response_per_line() -> Result<()> {
        let dir = TempDir::new()?;
        let input = concat!(
            "{\"command\":\"add\",\"heading\":\"Work - Deploy\",\"content\":\"v2\"}\n",
            "\n",
            "{\"command\":\"search\",\"query\":\"deploy\"}\n",
        );
        let responses = run(&dir, input)?;
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["status"], "success");
        assert_eq!(responses[1][0]["heading"], "Work - Deploy");
        Ok(())
    }

    #[test]
    fn test_survives_malformed_line() -> Result<()> {
        let dir = TempDir::new()?;
        let input = "{not json\n[1,2]\n{\"command\":\"stats\"}\n";
        let responses = run(&dir, input)?;
        assert_eq!(responses.len(), 3);
        assert_eq!(responses[0]["kind"], "input");
        assert_eq!(responses[1]["kind"], "input");
        assert_eq!(responses[2]["total_entries"], 0);
        Ok(())
    }

    #[test]
    fn test_survives_invalid_utf8_line() -> Result<()> {
        let dir = TempDir::new()?;
        let input = b"\xff\xfe\n{\"command\":\"stats\"}\r\n";
        let responses = run_bytes(&dir, input)?;
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["kind"], "input");
        assert_eq!(responses[1]["total_entries"], 0);
        Ok(())
    }
}
