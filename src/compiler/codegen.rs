//! Lowers one [`Form`] at a time into stack machine instructions.
//!
//! Every expression leaves exactly one value on the stack for whatever
//! encloses it; `println` and the bindings of a `let` leave nothing.
use core::fmt;

use lasso::{Rodeo, Spur};
use tracing::{debug, trace};

use super::{
    bytecode::{Instruction, Label, LabelKind},
    environment::SlotTable,
};
use crate::{
    lexer::Span,
    parser::{Argument, Form, Operator},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratorOptions {
    /// Declare `true<N>:` at the start of every then-branch. Nothing jumps
    /// there, but existing consumers of the bytecode expect to see it.
    pub emit_then_labels: bool,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            emit_then_labels: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exactly(usize),
    AtLeast(usize),
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (qualifier, count) = match self {
            Self::Exactly(count) => ("exactly", count),
            Self::AtLeast(count) => ("at least", count),
        };
        let plural = if *count == 1 { "" } else { "s" };
        write!(f, "{qualifier} {count} argument{plural}")
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Clone)]
pub enum GenerateError {
    #[error("unrecognized operator '{operator}'")]
    UnrecognizedOperator { operator: Box<str>, span: Span },
    #[error("variable '{name}' is not bound by any earlier `let`")]
    UnboundVariable { name: Box<str>, span: Span },
    #[error("`{operator}` takes {expected}, found {found}")]
    ArityMismatch {
        operator: Operator,
        expected: Arity,
        found: usize,
        span: Span,
    },
    #[error("`let` needs at least one binding")]
    MissingBindings(Span),
}

impl GenerateError {
    pub fn span(&self) -> Span {
        match self {
            Self::UnrecognizedOperator { span, .. }
            | Self::UnboundVariable { span, .. }
            | Self::ArityMismatch { span, .. }
            | Self::MissingBindings(span) => span.clone(),
        }
    }
}

/// Code generation state for one compilation run.
///
/// Both the slot table and the label counter carry over from one generated
/// form to the next; start a new `Generator` to start from scratch.
#[derive(Debug, Default)]
pub struct Generator {
    slots: SlotTable,
    next_label: u32,
    options: GeneratorOptions,
}

impl Generator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: GeneratorOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn slots(&self) -> &SlotTable {
        &self.slots
    }

    /// How many conditionals have been given labels so far.
    pub fn labels_allocated(&self) -> u32 {
        self.next_label
    }

    pub fn generate(
        &mut self,
        form: &Form,
        names: &Rodeo,
    ) -> Result<Vec<Instruction>, GenerateError> {
        debug!(form = %form.display(names), "compiling form");
        let mut out = vec![];
        self.form(form, names, &mut out)?;
        Ok(out)
    }

    fn form(
        &mut self,
        form: &Form,
        names: &Rodeo,
        out: &mut Vec<Instruction>,
    ) -> Result<(), GenerateError> {
        match &form.operator {
            Operator::Println => {
                let [argument] = form.arguments.as_slice() else {
                    return Err(arity_mismatch(form, Arity::Exactly(1)));
                };
                self.operand(argument, form, names, out)?;
                out.push(Instruction::Print);
            }
            Operator::Let => {
                if form.bindings.is_empty() {
                    return Err(GenerateError::MissingBindings(form.span.clone()));
                }
                for binding in &form.bindings {
                    out.push(Instruction::Push(binding.value));
                    let (slot, fresh) = self.slots.bind(binding.name);
                    if fresh {
                        trace!(name = resolve(names, binding.name), %slot, "allocated slot");
                    }
                    out.push(Instruction::Stor(slot));
                }
                for argument in &form.arguments {
                    self.operand(argument, form, names, out)?;
                }
            }
            Operator::If => {
                let [condition, then, otherwise] = form.arguments.as_slice() else {
                    return Err(arity_mismatch(form, Arity::Exactly(3)));
                };
                self.operand(condition, form, names, out)?;

                // Taken after the condition and before either branch, so that
                // conditionals nested in a branch get their own suffix
                let id = self.next_label;
                self.next_label += 1;
                trace!(id, "allocated labels");

                let done = Label::new(LabelKind::Done, id);
                let otherwise_label = Label::new(LabelKind::Else, id);

                out.push(Instruction::Jz(otherwise_label));
                if self.options.emit_then_labels {
                    out.push(Instruction::Label(Label::new(LabelKind::Then, id)));
                }
                self.operand(then, form, names, out)?;
                out.push(Instruction::Jmp(done));
                out.push(Instruction::Label(otherwise_label));
                self.operand(otherwise, form, names, out)?;
                out.push(Instruction::Label(done));
            }
            Operator::Add => self.fold(Instruction::Add, form, names, out)?,
            Operator::Sub => self.fold(Instruction::Sub, form, names, out)?,
            Operator::Mul => self.fold(Instruction::Mul, form, names, out)?,
            Operator::Unrecognized(operator) => {
                return Err(GenerateError::UnrecognizedOperator {
                    operator: operator.clone(),
                    span: form.span.clone(),
                })
            }
        }
        Ok(())
    }

    /// Left fold of a binary opcode over two or more operands.
    fn fold(
        &mut self,
        opcode: Instruction,
        form: &Form,
        names: &Rodeo,
        out: &mut Vec<Instruction>,
    ) -> Result<(), GenerateError> {
        let [first, rest @ ..] = form.arguments.as_slice() else {
            return Err(arity_mismatch(form, Arity::AtLeast(2)));
        };
        if rest.is_empty() {
            return Err(arity_mismatch(form, Arity::AtLeast(2)));
        }

        self.operand(first, form, names, out)?;
        for argument in rest {
            self.operand(argument, form, names, out)?;
            out.push(opcode);
        }
        Ok(())
    }

    fn operand(
        &mut self,
        argument: &Argument,
        parent: &Form,
        names: &Rodeo,
        out: &mut Vec<Instruction>,
    ) -> Result<(), GenerateError> {
        match argument {
            Argument::Literal(value) => out.push(Instruction::Push(*value)),
            Argument::Variable(name) => {
                let slot =
                    self.slots
                        .get(*name)
                        .ok_or_else(|| GenerateError::UnboundVariable {
                            name: Box::from(resolve(names, *name)),
                            span: parent.span.clone(),
                        })?;
                out.push(Instruction::Load(slot));
            }
            Argument::Form(form) => self.form(form, names, out)?,
        }
        Ok(())
    }
}

fn resolve(names: &Rodeo, name: Spur) -> &str {
    names.try_resolve(&name).unwrap_or("<unknown>")
}

fn arity_mismatch(form: &Form, expected: Arity) -> GenerateError {
    GenerateError::ArityMismatch {
        operator: form.operator.clone(),
        expected,
        found: form.arguments.len(),
        span: form.span.clone(),
    }
}
