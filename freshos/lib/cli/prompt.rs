use std::io::{self, BufRead, Write};

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Asks a yes/no question on the terminal. Declines by default.
pub fn confirm(hint: &str) -> io::Result<bool> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    confirm_with(hint, false, &mut stdin.lock(), &mut stdout.lock())
}

/// Asks a yes/no question on arbitrary streams.
///
/// `y`/`yes` accept and `n`/`no` decline, case-insensitively. An empty answer, `q`, `quit`,
/// `exit` or the end of input take `default`. Anything else asks again.
pub fn confirm_with(
    hint: &str,
    default: bool,
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> io::Result<bool> {
    loop {
        write!(output, "{}", hint)?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            writeln!(output)?;
            return Ok(default);
        }

        let choice = line.trim().to_lowercase();
        match choice.as_str() {
            "" | "q" | "quit" | "exit" => return Ok(default),
            "y" | "yes" => return Ok(true),
            "n" | "no" => return Ok(false),
            _ => writeln!(output, "Option \"{}\" not recognized.", line.trim_end())?,
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn answer(input: &str) -> (bool, String) {
        let mut output = Vec::new();
        let accepted =
            confirm_with("Continue? [y/N]:", false, &mut Cursor::new(input), &mut output).unwrap();
        (accepted, String::from_utf8(output).unwrap())
    }

    #[test]
    fn test_confirm_answers() {
        assert!(answer("y\n").0);
        assert!(answer("  YES \n").0);
        assert!(!answer("n\n").0);
        assert!(!answer("\n").0);
        assert!(!answer("quit\n").0);
        assert!(!answer("").0);
    }

    #[test]
    fn test_confirm_reprompts_on_unknown_answer() {
        let (accepted, output) = answer("maybe\ny\n");
        assert!(accepted);
        assert!(output.contains("Option \"maybe\" not recognized."));
        assert_eq!(output.matches("Continue? [y/N]:").count(), 2);
    }
}
