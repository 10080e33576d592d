//! Interactive console prompts

use crate::types::distribution::EnsembleWeight;
use anyhow::{Context, Result};
use std::io::{BufRead, Write};
use tracing::debug;

pub const IMAGE_PATH_PROMPT: &str = "Enter IMAGE FILE path: ";
pub const DESCRIPTION_PROMPT: &str = "Enter TEXT DESCRIPTION of symptoms: ";
pub const WEIGHT_PROMPT: &str = "Enter IMAGE weight [0.0–1.0]: ";
pub const WEIGHT_RETRY_MESSAGE: &str = "Please enter a decimal between 0 and 1.";

/// The three answers collected from the operator.
#[derive(Debug, Clone, PartialEq)]
pub struct Inputs {
    pub image_path: String,
    pub description: String,
    pub weight: EnsembleWeight,
}

/// Line-oriented prompter over any reader/writer pair.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Print `message` and read one trimmed line. End of input is an error.
    pub fn ask(&mut self, message: &str) -> Result<String> {
        write!(self.output, "{}", message)?;
        self.output.flush()?;

        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .context("Failed to read from stdin")?;
        if read == 0 {
            anyhow::bail!("Input closed while waiting for: {}", message.trim_end());
        }

        Ok(line.trim().to_string())
    }

    /// Ask for the image weight until a decimal in `[0, 1]` is entered.
    pub fn ask_weight(&mut self) -> Result<EnsembleWeight> {
        loop {
            let answer = self.ask(WEIGHT_PROMPT)?;
            match answer.parse::<EnsembleWeight>() {
                Ok(weight) => return Ok(weight),
                Err(e) => {
                    debug!(input = %answer, error = %e, "Rejected weight");
                    writeln!(self.output, "{}", WEIGHT_RETRY_MESSAGE)?;
                }
            }
        }
    }

    /// Image path, description, then weight.
    pub fn collect(&mut self) -> Result<Inputs> {
        let image_path = self.ask(IMAGE_PATH_PROMPT)?;
        let description = self.ask(DESCRIPTION_PROMPT)?;
        let weight = self.ask_weight()?;

        Ok(Inputs {
            image_path,
            description,
            weight,
        })
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn prompter(input: &str) -> Prompter<Cursor<Vec<u8>>, Vec<u8>> {
        Prompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn test_collect_inputs() {
        let mut p = prompter("  /tmp/lesion.jpg \nred itchy bumps on cheeks\n0.6\n");
        let inputs = p.collect().unwrap();

        assert_eq!(inputs.image_path, "/tmp/lesion.jpg");
        assert_eq!(inputs.description, "red itchy bumps on cheeks");
        assert_eq!(inputs.weight.image(), 0.6);

        let out = String::from_utf8(p.into_output()).unwrap();
        assert!(out.starts_with(IMAGE_PATH_PROMPT));
        assert!(!out.contains(WEIGHT_RETRY_MESSAGE));
    }

    #[test]
    fn test_weight_reprompts_until_valid() {
        let mut p = prompter("abc\n-0.1\n1.5\n0.37\n");
        let weight = p.ask_weight().unwrap();

        assert_eq!(weight.image(), 0.37);
        let out = String::from_utf8(p.into_output()).unwrap();
        assert_eq!(out.matches(WEIGHT_RETRY_MESSAGE).count(), 3);
        assert_eq!(out.matches(WEIGHT_PROMPT).count(), 4);
    }

    #[test]
    fn test_weight_boundaries_accepted() {
        assert_eq!(prompter("0\n").ask_weight().unwrap().image(), 0.0);
        assert_eq!(prompter("1\n").ask_weight().unwrap().image(), 1.0);
    }

    #[test]
    fn test_eof_is_error() {
        assert!(prompter("").ask(IMAGE_PATH_PROMPT).is_err());
        assert!(prompter("nope\n").ask_weight().is_err());
    }
}
