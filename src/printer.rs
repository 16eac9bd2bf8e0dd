//! Colored console output.
//!
//! The printer is independent of the log file: a message can be shown here
//! without being logged and the other way around.

use std::fmt::Display;
use std::io::{self, BufRead, Write};

use colored::{Color, Colorize};

/// Colors cycled through when printing a list, one per line.
pub const PALETTE: [Color; 6] = [
    Color::Red,
    Color::Green,
    Color::Yellow,
    Color::Blue,
    Color::Magenta,
    Color::Cyan,
];

/// Color of the line at `index`, wrapping around the palette.
pub fn palette_color(index: usize) -> Color {
    PALETTE[index % PALETTE.len()]
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Printer {
    debug: bool,
}

impl Printer {
    /// `debug` enables `[DEBUG]` lines.
    pub const fn new(debug: bool) -> Self {
        Self { debug }
    }

    pub fn info(&self, msg: impl Display) {
        println!("{} {msg}", "[INFO]".blue());
    }

    pub fn warning(&self, msg: impl Display) {
        println!("{} {msg}", "[WARNING]".yellow());
    }

    /// Prints an error, followed by its error code when one is given.
    pub fn error(&self, msg: impl Display, code: Option<&str>) {
        eprintln!("{} {msg}", "[ERROR]".red());
        if let Some(code) = code {
            eprintln!("{} {code}", "[ERRC]".yellow());
        }
    }

    pub fn success(&self, msg: impl Display) {
        println!("{} {msg}", "[SUCCESS]".green());
    }

    pub fn debug(&self, msg: impl Display) {
        if self.debug {
            println!("{} {msg}", "[DEBUG]".magenta());
        }
    }

    /// Asks a question and returns the raw line read from `input`.
    ///
    /// End of input yields an empty string.
    pub fn prompt<R: BufRead>(&self, msg: impl Display, input: &mut R) -> io::Result<String> {
        print!("{} {msg} ", "[PROMPT]".blue());
        io::stdout().flush()?;

        let mut line = String::new();
        input.read_line(&mut line)?;
        Ok(line)
    }

    pub fn list<T: Display>(&self, items: &[T]) {
        for (index, item) in items.iter().enumerate() {
            println!("{}", item.to_string().color(palette_color(index)));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn test_palette_wraps_every_six_lines() {
        for index in 0..PALETTE.len() {
            assert_eq!(palette_color(index), PALETTE[index]);
            assert_eq!(palette_color(index + PALETTE.len()), PALETTE[index]);
        }
        assert_eq!(palette_color(13), Color::Green);
    }

    #[test]
    fn test_palette_colors_are_distinct() {
        for (i, a) in PALETTE.iter().enumerate() {
            for b in &PALETTE[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_prompt_reads_one_line() {
        let printer = Printer::new(false);
        let mut input = Cursor::new("yes\nsecond\n");

        assert_eq!(printer.prompt("Create?", &mut input).unwrap(), "yes\n");
        assert_eq!(printer.prompt("Again?", &mut input).unwrap(), "second\n");
        assert_eq!(printer.prompt("Eof?", &mut input).unwrap(), "");
    }
}
