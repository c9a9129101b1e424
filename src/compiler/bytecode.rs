//! The instruction set of the stack machine, and its text form.
//!
//! Jump targets are symbolic. Nothing here resolves or validates them; that
//! is left to whatever runs the bytecode.
use core::fmt;

/// Storage location of one variable at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Slot(pub u32);

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which of the three labels of a conditional this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabelKind {
    /// Start of the then-branch. Declared, but never jumped to
    Then,
    Else,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Label {
    pub kind: LabelKind,
    pub id: u32,
}

impl Label {
    pub fn new(kind: LabelKind, id: u32) -> Self {
        Self { kind, id }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.kind {
            LabelKind::Then => "true",
            LabelKind::Else => "false",
            LabelKind::Done => "done",
        };
        write!(f, "{prefix}{}", self.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Instruction {
    Push(i64),
    Add,
    Sub,
    Mul,
    Print,
    Stor(Slot),
    Load(Slot),
    Jmp(Label),
    /// Pops the top of the stack and jumps if it is zero
    Jz(Label),
    Label(Label),
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Push(value) => write!(f, "PUSH {value}"),
            Self::Add => f.write_str("ADD"),
            Self::Sub => f.write_str("SUB"),
            Self::Mul => f.write_str("MUL"),
            Self::Print => f.write_str("PRINT"),
            Self::Stor(slot) => write!(f, "STOR {slot}"),
            Self::Load(slot) => write!(f, "LOAD {slot}"),
            Self::Jmp(label) => write!(f, "JMP {label}"),
            Self::Jz(label) => write!(f, "JZ {label}"),
            Self::Label(label) => write!(f, "{label}:"),
        }
    }
}

/// A whole compiled program, displayed as one instruction per line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bytecode(Vec<Instruction>);

impl Bytecode {
    pub fn instructions(&self) -> &[Instruction] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The text form of every instruction, in order.
    pub fn lines(&self) -> impl Iterator<Item = String> + '_ {
        self.0.iter().map(Instruction::to_string)
    }
}

impl From<Vec<Instruction>> for Bytecode {
    fn from(instructions: Vec<Instruction>) -> Self {
        Self(instructions)
    }
}

impl Extend<Instruction> for Bytecode {
    fn extend<T: IntoIterator<Item = Instruction>>(&mut self, iter: T) {
        self.0.extend(iter)
    }
}

impl fmt::Display for Bytecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for instruction in &self.0 {
            writeln!(f, "{instruction}")?;
        }
        Ok(())
    }
}
