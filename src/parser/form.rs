//! The tree a single parenthesized form parses into.
//!
//! Forms are plain owned trees: every nested form belongs to exactly one
//! argument list, and nothing points back up. Variable names are interned in
//! the [`Rodeo`] shared by one compilation run, so printing a form needs it.
use core::fmt;

use lasso::{Rodeo, Spur};

use crate::lexer::Span;

/// The closed set of operators a form can start with.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Operator {
    Println,
    Let,
    If,
    Add,
    Sub,
    Mul,
    /// Anything else; rejected once code generation reaches it
    Unrecognized(Box<str>),
}

impl Operator {
    pub fn from_name(name: &str) -> Self {
        match name {
            "println" => Self::Println,
            "let" => Self::Let,
            "if" => Self::If,
            "+" => Self::Add,
            "-" => Self::Sub,
            "*" => Self::Mul,
            other => Self::Unrecognized(Box::from(other)),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Println => "println",
            Self::Let => "let",
            Self::If => "if",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Unrecognized(name) => name,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    Literal(i64),
    Variable(Spur),
    Form(Box<Form>),
}

/// One `[name value]` pair of a `let`.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub name: Spur,
    pub value: i64,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Form {
    pub operator: Operator,
    /// Only ever non-empty for `let`, and always in source order
    pub bindings: Vec<Binding>,
    pub arguments: Vec<Argument>,
    /// From the opening to the closing paren, within the form's line
    pub span: Span,
}

impl Form {
    pub fn new(operator: Operator, start: usize) -> Self {
        Self {
            operator,
            bindings: vec![],
            arguments: vec![],
            span: start..start,
        }
    }

    /// Renders the form back as source, resolving variable names in `names`.
    pub fn display<'a>(&'a self, names: &'a Rodeo) -> DisplayForm<'a> {
        DisplayForm { form: self, names }
    }
}

pub struct DisplayForm<'a> {
    form: &'a Form,
    names: &'a Rodeo,
}

impl DisplayForm<'_> {
    fn name(&self, key: &Spur) -> &str {
        self.names.try_resolve(key).unwrap_or("<unknown>")
    }
}

impl fmt::Display for DisplayForm<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}", self.form.operator)?;
        for binding in &self.form.bindings {
            write!(f, " [{} {}]", self.name(&binding.name), binding.value)?;
        }
        for argument in &self.form.arguments {
            match argument {
                Argument::Literal(value) => write!(f, " {value}")?,
                Argument::Variable(key) => write!(f, " {}", self.name(key))?,
                Argument::Form(form) => write!(f, " {}", form.display(self.names))?,
            }
        }
        f.write_str(")")
    }
}
