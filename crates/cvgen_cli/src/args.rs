//! Command-line argument parsing.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const DEFAULT_PDF_OUTPUT: &str = "resume.pdf";
pub const DEFAULT_TEX_OUTPUT: &str = "resume.tex";
pub const DEFAULT_TEMPLATE: &str = "deedy";

pub const USAGE: &str = "\
Usage:
  cvgen compile <document> [--output <name.pdf>]
  cvgen generate <document> [--template <name>] [--output <name.tex>]
  cvgen help

Environment:
  CVGEN_LOG_DIR       absolute directory for log files (logging is off when unset)
  CVGEN_BUILD_DIR     staging directory (default: build)
  CVGEN_TEMPLATE_DIR  template directory (default: cls)
  CVGEN_ENGINE        LaTeX engine (default: pdflatex)";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Full pipeline: generate, stage, typeset.
    Compile { document: PathBuf, output: String },
    /// Markup only; the typesetter is not invoked.
    Generate {
        document: PathBuf,
        template: String,
        output: PathBuf,
    },
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgsError {
    MissingCommand,
    UnknownCommand(String),
    MissingDocument(&'static str),
    MissingValue(String),
    UnknownFlag(String),
    UnexpectedArgument(String),
}

impl Display for ArgsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingCommand => write!(f, "missing command"),
            Self::UnknownCommand(name) => write!(f, "unknown command `{name}`"),
            Self::MissingDocument(command) => write!(f, "`{command}` requires a document path"),
            Self::MissingValue(flag) => write!(f, "`{flag}` requires a value"),
            Self::UnknownFlag(flag) => write!(f, "unknown option `{flag}`"),
            Self::UnexpectedArgument(arg) => write!(f, "unexpected argument `{arg}`"),
        }
    }
}

impl Error for ArgsError {}

/// Parses arguments without the program name.
pub fn parse<I>(args: I) -> Result<Command, ArgsError>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let command = args.next().ok_or(ArgsError::MissingCommand)?;
    match command.as_str() {
        "help" | "-h" | "--help" => Ok(Command::Help),
        "compile" => {
            let parsed = parse_options(args, "compile", &["--output"])?;
            Ok(Command::Compile {
                output: parsed
                    .value("--output")
                    .unwrap_or(DEFAULT_PDF_OUTPUT)
                    .to_string(),
                document: parsed.document,
            })
        }
        "generate" => {
            let parsed = parse_options(args, "generate", &["--output", "--template"])?;
            Ok(Command::Generate {
                template: parsed
                    .value("--template")
                    .unwrap_or(DEFAULT_TEMPLATE)
                    .to_string(),
                output: PathBuf::from(parsed.value("--output").unwrap_or(DEFAULT_TEX_OUTPUT)),
                document: parsed.document,
            })
        }
        other => Err(ArgsError::UnknownCommand(other.to_string())),
    }
}

struct ParsedOptions {
    document: PathBuf,
    values: Vec<(String, String)>,
}

impl ParsedOptions {
    fn value(&self, flag: &str) -> Option<&str> {
        self.values
            .iter()
            .rev()
            .find(|(name, _)| name == flag)
            .map(|(_, value)| value.as_str())
    }
}

fn parse_options(
    mut args: impl Iterator<Item = String>,
    command: &'static str,
    flags: &[&str],
) -> Result<ParsedOptions, ArgsError> {
    let mut document = None;
    let mut values = Vec::new();
    while let Some(arg) = args.next() {
        if arg.starts_with("--") {
            let (flag, inline) = match arg.split_once('=') {
                Some((flag, value)) => (flag.to_string(), Some(value.to_string())),
                None => (arg.clone(), None),
            };
            if !flags.contains(&flag.as_str()) {
                return Err(ArgsError::UnknownFlag(flag));
            }
            let value = match inline {
                Some(value) => value,
                None => args
                    .next()
                    .ok_or_else(|| ArgsError::MissingValue(flag.clone()))?,
            };
            if value.trim().is_empty() {
                return Err(ArgsError::MissingValue(flag));
            }
            values.push((flag, value));
        } else if document.is_none() {
            document = Some(PathBuf::from(arg));
        } else {
            return Err(ArgsError::UnexpectedArgument(arg));
        }
    }
    Ok(ParsedOptions {
        document: document.ok_or(ArgsError::MissingDocument(command))?,
        values,
    })
}

#[cfg(test)]
mod tests {
    use super::{parse, ArgsError, Command};
    use std::path::PathBuf;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|arg| arg.to_string()).collect()
    }

    #[test]
    fn compile_defaults_output() {
        assert_eq!(
            parse(args(&["compile", "resume.yaml"])).unwrap(),
            Command::Compile {
                document: PathBuf::from("resume.yaml"),
                output: "resume.pdf".to_string(),
            }
        );
        assert_eq!(
            parse(args(&["compile", "--output=cv.pdf", "r.yaml"])).unwrap(),
            Command::Compile {
                document: PathBuf::from("r.yaml"),
                output: "cv.pdf".to_string(),
            }
        );
    }

    #[test]
    fn generate_reads_template_and_output() {
        assert_eq!(
            parse(args(&["generate", "r.yaml", "--template", "modern", "--output", "out.tex"]))
                .unwrap(),
            Command::Generate {
                document: PathBuf::from("r.yaml"),
                template: "modern".to_string(),
                output: PathBuf::from("out.tex"),
            }
        );
    }

    #[test]
    fn invalid_input_is_reported() {
        assert_eq!(parse(Vec::<String>::new()), Err(ArgsError::MissingCommand));
        assert_eq!(parse(args(&["--help"])), Ok(Command::Help));
        assert_eq!(
            parse(args(&["render", "r.yaml"])),
            Err(ArgsError::UnknownCommand("render".to_string()))
        );
        assert_eq!(
            parse(args(&["compile", "r.yaml", "--template", "x"])),
            Err(ArgsError::UnknownFlag("--template".to_string()))
        );
        assert_eq!(
            parse(args(&["generate", "r.yaml", "--output"])),
            Err(ArgsError::MissingValue("--output".to_string()))
        );
        assert_eq!(
            parse(args(&["compile"])),
            Err(ArgsError::MissingDocument("compile"))
        );
        assert_eq!(
            parse(args(&["compile", "a.yaml", "b.yaml"])),
            Err(ArgsError::UnexpectedArgument("b.yaml".to_string()))
        );
    }
}
