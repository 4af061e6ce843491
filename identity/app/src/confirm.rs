// Licensed under the Apache-2.0 license

use std::io::{self, BufRead, Stdout, StdinLock, Write};

const SEPARATOR: &str = "------------------------------------------------------------";

/// Gate in front of the artifact write
pub(crate) trait OperatorConfirmation {
    /// Show `preview` and ask whether to write it. `Ok(false)` aborts cleanly.
    fn confirm(&mut self, preview: &str) -> io::Result<bool>;
}

/// Used with `--yes`
pub(crate) struct SkipConfirmation;

impl OperatorConfirmation for SkipConfirmation {
    fn confirm(&mut self, _preview: &str) -> io::Result<bool> {
        Ok(true)
    }
}

/// Interactive prompt; only `yes` proceeds
pub(crate) struct ConsolePrompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> ConsolePrompt<R, W> {
    pub(crate) fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl ConsolePrompt<StdinLock<'static>, Stdout> {
    pub(crate) fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> OperatorConfirmation for ConsolePrompt<R, W> {
    fn confirm(&mut self, preview: &str) -> io::Result<bool> {
        writeln!(self.output, "{SEPARATOR}")?;
        writeln!(self.output, "Preview of generated header:")?;
        writeln!(self.output, "{SEPARATOR}")?;
        writeln!(self.output, "{preview}")?;
        writeln!(self.output, "WARNING: This will generate a provisioning file.")?;
        writeln!(
            self.output,
            "WARNING: Burning this to eFuse is PERMANENT and CANNOT be undone!"
        )?;
        write!(self.output, "\nContinue? (yes/no): ")?;
        self.output.flush()?;

        // EOF leaves the response empty, which declines
        let mut response = String::new();
        self.input.read_line(&mut response)?;
        Ok(is_affirmative(&response))
    }
}

fn is_affirmative(response: &str) -> bool {
    response.trim().eq_ignore_ascii_case("yes")
}
