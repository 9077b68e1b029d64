//! Terminal operator: questions and status lines over stdin/stdout.

use std::io::{self, BufRead, StdinLock, Stdout, Write};

use dirsnap_core::{Result, SnapshotError};
use dirsnap_ops::Operator;

/// Reads answers line by line and prints status lines as they come.
///
/// Names taken from a document are printed through [`sanitize_for_terminal`]
/// so a crafted document cannot emit escape sequences.
pub struct TerminalOperator<R, W> {
    input: R,
    output: W,
}

impl TerminalOperator<StdinLock<'static>, Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> TerminalOperator<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    #[cfg(test)]
    fn into_output(self) -> W {
        self.output
    }
}

impl<R: BufRead, W: Write> Operator for TerminalOperator<R, W> {
    fn ask(&mut self, question: &str) -> Result<String> {
        write!(self.output, "{question}")
            .and_then(|_| self.output.flush())
            .map_err(|e| SnapshotError::io("<stdout>", e))?;

        let mut answer = String::new();
        let read = self
            .input
            .read_line(&mut answer)
            .map_err(|e| SnapshotError::io("<stdin>", e))?;
        if read == 0 {
            return Err(SnapshotError::io(
                "<stdin>",
                io::Error::new(io::ErrorKind::UnexpectedEof, "input closed before an answer"),
            ));
        }
        Ok(answer.trim_end_matches(['\r', '\n']).to_string())
    }

    fn status(&mut self, line: &str) {
        let _ = writeln!(self.output, "{}", sanitize_for_terminal(line));
    }
}

/// Replace control characters with spaces.
pub fn sanitize_for_terminal(input: &str) -> String {
    input
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_ask_reads_one_line() {
        let mut operator = TerminalOperator::new(Cursor::new("y\r\nsecond\n"), Vec::new());
        assert_eq!(operator.ask("Proceed? ").unwrap(), "y");
        assert_eq!(operator.ask("Next? ").unwrap(), "second");
        assert_eq!(
            String::from_utf8(operator.into_output()).unwrap(),
            "Proceed? Next? "
        );
    }

    #[test]
    fn test_ask_empty_line_is_empty_answer() {
        let mut operator = TerminalOperator::new(Cursor::new("\n"), Vec::new());
        assert_eq!(operator.ask("? ").unwrap(), "");
    }

    #[test]
    fn test_ask_at_eof_fails() {
        let mut operator = TerminalOperator::new(Cursor::new(""), Vec::new());
        assert!(operator.ask("? ").is_err());
    }

    #[test]
    fn test_status_strips_escapes() {
        let mut operator = TerminalOperator::new(Cursor::new(""), Vec::new());
        operator.status("Summary for \u{1b}[31mred\u{7}:");
        assert_eq!(
            String::from_utf8(operator.into_output()).unwrap(),
            "Summary for  [31mred :\n"
        );
    }
}
