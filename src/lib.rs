pub mod compiler;
pub mod lexer;
pub mod parser;

pub use compiler::{
    bytecode::{Bytecode, Instruction, Label, LabelKind, Slot},
    codegen::{GenerateError, Generator, GeneratorOptions},
    compile, CompileError, CompileErrorKind, Compiler,
};
pub use parser::{parse_line, Argument, Binding, Form, Operator, ParseError};
