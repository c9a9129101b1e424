//! Compile source text into bytecode for the stack machine, one line at a
//! time.
//!
//! For example:
//!
//! (let [x 5] (println (+ x 1)))
//! (if x (println 1) (println 0))
//!
//! compiles to
//!
//! PUSH 5
//! STOR 0
//! LOAD 0
//! PUSH 1
//! ADD
//! PRINT
//! LOAD 0
//! JZ false0
//! true0:
//! PUSH 1
//! PRINT
//! JMP done0
//! false0:
//! PUSH 0
//! PRINT
//! done0:
//!
//! Slots and labels are numbered across the whole run, which is why the
//! second line can still load `x`.

pub mod bytecode;
pub mod codegen;
pub mod environment;

use lasso::Rodeo;
use tracing::debug;

use self::{
    bytecode::{Bytecode, Instruction},
    codegen::{GenerateError, Generator, GeneratorOptions},
};
use crate::{
    lexer::Span,
    parser::{parse_line, ParseError},
};

#[derive(thiserror::Error, Debug, PartialEq, Clone)]
pub enum CompileErrorKind {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Generate(#[from] GenerateError),
}

impl CompileErrorKind {
    pub fn span(&self) -> Span {
        match self {
            Self::Parse(err) => err.span(),
            Self::Generate(err) => err.span(),
        }
    }
}

/// Why a run stopped, and on which line.
#[derive(thiserror::Error, Debug, PartialEq, Clone)]
#[error("line {line}: {kind}")]
pub struct CompileError {
    /// 1-based
    pub line: usize,
    /// The offending line, which [`Self::span`] indexes into
    pub text: Box<str>,
    pub kind: CompileErrorKind,
}

impl CompileError {
    pub fn span(&self) -> Span {
        self.kind.span()
    }
}

/// One compilation run.
///
/// Holds everything that must outlive a single line: the names bound so far,
/// their slots, and the label counter. Nothing is shared between two
/// `Compiler`s.
#[derive(Debug, Default)]
pub struct Compiler {
    names: Rodeo,
    generator: Generator,
    lines_seen: usize,
}

impl Compiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: GeneratorOptions) -> Self {
        Self {
            generator: Generator::with_options(options),
            ..Self::default()
        }
    }

    pub fn names(&self) -> &Rodeo {
        &self.names
    }

    pub fn generator(&self) -> &Generator {
        &self.generator
    }

    /// Compiles the next line of the program.
    pub fn compile_line(&mut self, line: &str) -> Result<Vec<Instruction>, CompileError> {
        self.lines_seen += 1;
        let number = self.lines_seen;
        let fail = |kind: CompileErrorKind| CompileError {
            line: number,
            text: Box::from(line),
            kind,
        };

        let forms = parse_line(line, &mut self.names).map_err(|err| fail(err.into()))?;
        let mut instructions = vec![];
        for form in &forms {
            instructions.extend(
                self.generator
                    .generate(form, &self.names)
                    .map_err(|err| fail(err.into()))?,
            );
        }
        Ok(instructions)
    }

    /// Compiles every line of `source`, stopping at the first error.
    pub fn compile_source(&mut self, source: &str) -> Result<Bytecode, CompileError> {
        let mut bytecode = Bytecode::default();
        for line in source.lines() {
            bytecode.extend(self.compile_line(line)?);
        }
        debug!(
            lines = self.lines_seen,
            instructions = bytecode.len(),
            "compiled source"
        );
        Ok(bytecode)
    }
}

/// Compiles a whole program in a fresh run.
pub fn compile(source: &str) -> Result<Bytecode, CompileError> {
    Compiler::new().compile_source(source)
}
