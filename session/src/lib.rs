use std::{
    fmt, fs,
    io::{self, Read},
    path::PathBuf,
};

use ir::Program;

/// Where the program of a run comes from, already read into memory.
pub enum InputFile {
    File { path: PathBuf, content: String },
    Stdin { content: String },
}

impl InputFile {
    /// Reads `path`, or all of stdin when no path is given.
    pub fn read(path: Option<PathBuf>) -> io::Result<Self> {
        match path {
            Some(path) => {
                let content = fs::read_to_string(&path)?;
                Ok(Self::File { path, content })
            }
            None => {
                let mut content = String::new();
                io::stdin().read_to_string(&mut content)?;
                Ok(Self::Stdin { content })
            }
        }
    }

    pub fn content(&self) -> &str {
        match self {
            Self::File { content, .. } | Self::Stdin { content } => content,
        }
    }
}

impl fmt::Display for InputFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File { path, .. } => write!(f, "{}", path.display()),
            Self::Stdin { .. } => write!(f, "<stdin>"),
        }
    }
}

/// Session is a struct that holds the input and options for a single run.
pub struct Session {
    pub input: InputFile,
    pub output_path: Option<PathBuf>,
    pub compiler_option: CompilerOption,
}

impl Session {
    pub fn new(
        input: InputFile,
        output_path: Option<PathBuf>,
        compiler_option: CompilerOption,
    ) -> Self {
        Self {
            input,
            output_path,
            compiler_option,
        }
    }

    pub fn program(&self) -> serde_json::Result<Program> {
        Program::from_json(self.input.content())
    }
}

#[derive(Debug, Clone, Default)]
pub struct CompilerOption {
    /// Check the control-flow graph after every pass.
    pub verify: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_names() {
        let file = InputFile::File {
            path: PathBuf::from("fixtures/fact.json"),
            content: String::new(),
        };
        assert_eq!(file.to_string(), "fixtures/fact.json");
        let stdin = InputFile::Stdin {
            content: String::new(),
        };
        assert_eq!(stdin.to_string(), "<stdin>");
    }

    #[test]
    fn test_program_from_input() {
        let session = Session::new(
            InputFile::Stdin {
                content: r#"{"functions":[{"name":"main","instrs":[{"op":"nop"}]}]}"#.to_string(),
            },
            None,
            CompilerOption::default(),
        );
        let program = session.program().unwrap();
        assert_eq!(program.functions[0].name, "main");

        let session = Session::new(
            InputFile::Stdin {
                content: "{".to_string(),
            },
            None,
            CompilerOption::default(),
        );
        assert!(session.program().is_err());
    }
}
