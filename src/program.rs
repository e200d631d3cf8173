//! Program loader: parse line-oriented program text into instructions.
//!
//! The format is one instruction per non-blank line: an opcode letter
//! (case-insensitive) followed by the rest of the line as the argument, with
//! ASCII whitespace trimmed on both ends. Blank lines are skipped but still
//! count toward the reported line numbers.

use std::error::Error;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use crate::instruction::Instruction;

/// Failure to load or parse a program file.
///
/// Parse failures carry the filename and the 0-indexed line number of the
/// offending line.
#[derive(Debug)]
pub enum LoadError {
    /// The file could not be read.
    Io {
        filename: String,
        source: io::Error,
    },
    /// A line failed to parse.
    Parse {
        filename: String,
        line: usize,
        message: String,
    },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Io { filename, source } => {
                write!(f, "{filename}: {source}")
            }
            LoadError::Parse {
                filename,
                line,
                message,
            } => write!(f, "{filename}:{line}: {message}"),
        }
    }
}

impl Error for LoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            LoadError::Io { source, .. } => Some(source),
            LoadError::Parse { .. } => None,
        }
    }
}

/// Read and parse the program file at `path`.
pub fn load_program(path: &Path) -> Result<Vec<Instruction>, LoadError> {
    let filename = path.display().to_string();
    let source = fs::read_to_string(path).map_err(|e| LoadError::Io {
        filename: filename.clone(),
        source: e,
    })?;
    parse_program(&source, &filename)
}

/// Parse program text into an instruction sequence.
///
/// `filename` is only used for error reporting.
pub fn parse_program(source: &str, filename: &str) -> Result<Vec<Instruction>, LoadError> {
    let mut program = Vec::new();

    for (line_number, raw_line) in source.lines().enumerate() {
        let line = raw_line.trim_ascii();
        if line.is_empty() {
            continue;
        }

        let opcode = line.chars().next().unwrap().to_ascii_uppercase();
        let argument = line[opcode.len_utf8()..].trim_ascii();

        let parse_error = |message: String| LoadError::Parse {
            filename: filename.to_string(),
            line: line_number,
            message,
        };

        let instruction = match opcode {
            'S' | 'A' | 'D' | 'F' => {
                let value: i64 = argument.parse().map_err(|_| {
                    parse_error(format!(
                        "invalid integer argument {argument:?} for {opcode} operation"
                    ))
                })?;
                match opcode {
                    'S' => Instruction::Set(value),
                    'A' => Instruction::Add(value),
                    'D' => Instruction::Decrement(value),
                    _ => Instruction::Fork(value),
                }
            }
            // Trailing content after B/E is ignored.
            'B' => Instruction::Block,
            'E' => Instruction::End,
            'R' => {
                if argument.is_empty() {
                    return Err(parse_error("missing filename argument for R operation".into()));
                }
                Instruction::Replace(argument.to_string())
            }
            other => {
                return Err(parse_error(format!("invalid operation {other:?}")));
            }
        };

        program.push(instruction);
    }

    Ok(program)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_program() {
        let program = parse_program("S 5\nA 3\nE\n", "init.txt").unwrap();
        assert_eq!(
            program,
            vec![Instruction::Set(5), Instruction::Add(3), Instruction::End]
        );
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        let program = parse_program("s 1\nb\ne", "p.txt").unwrap();
        assert_eq!(
            program,
            vec![Instruction::Set(1), Instruction::Block, Instruction::End]
        );
    }

    #[test]
    fn test_parse_negative_arguments() {
        let program = parse_program("A -4\nD -1\nF -1\n", "p.txt").unwrap();
        assert_eq!(
            program,
            vec![
                Instruction::Add(-4),
                Instruction::Decrement(-1),
                Instruction::Fork(-1)
            ]
        );
    }

    #[test]
    fn test_blank_lines_skip_but_count() {
        // The bad opcode sits on line 3 (0-indexed), after two blank lines.
        let err = parse_program("S 1\n\n\nX\n", "p.txt").unwrap_err();
        match err {
            LoadError::Parse { line, .. } => assert_eq!(line, 3),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_whitespace_is_trimmed() {
        let program = parse_program("  S   7  \n\t E \n", "p.txt").unwrap();
        assert_eq!(program, vec![Instruction::Set(7), Instruction::End]);
    }

    #[test]
    fn test_trailing_content_after_no_arg_opcodes_is_ignored() {
        let program = parse_program("B now\nE please\n", "p.txt").unwrap();
        assert_eq!(program, vec![Instruction::Block, Instruction::End]);
    }

    #[test]
    fn test_replace_requires_filename() {
        let err = parse_program("R\n", "p.txt").unwrap_err();
        assert!(err.to_string().contains("missing filename"));

        let program = parse_program("R next.txt\n", "p.txt").unwrap();
        assert_eq!(program, vec![Instruction::Replace("next.txt".into())]);
    }

    #[test]
    fn test_bad_integer_argument() {
        let err = parse_program("S five\n", "p.txt").unwrap_err();
        assert_eq!(err.to_string(), "p.txt:0: invalid integer argument \"five\" for S operation");
    }

    #[test]
    fn test_unknown_opcode() {
        let err = parse_program("Z 1\n", "p.txt").unwrap_err();
        assert!(err.to_string().contains("invalid operation"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_program(Path::new("definitely/not/here.txt")).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }
}
