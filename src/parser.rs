//! Parsing starts where the lexer dropped off: it turns the tokens of one line
//! into zero or more [`Form`] trees.
//!
//! Construction keeps an explicit stack of frames instead of parent pointers.
//! A frame is either a form still waiting for its closing paren, or a
//! parenthesized binding group `([x 1] [y 2])` whose bindings go to the `let`
//! right below it.
use std::iter::Peekable;

use lasso::Rodeo;
use tracing::trace;

use crate::lexer::{tokenize, LexerError, Span, Token};

pub mod form;
pub use form::{Argument, Binding, DisplayForm, Form, Operator};

/// How many forms and binding groups may be open at once on one line.
pub const MAX_NESTING: usize = 128;

#[derive(thiserror::Error, Debug, PartialEq, Clone)]
pub enum ParseError {
    #[error("{error}")]
    Lexer { error: LexerError, span: Span },
    #[error("top-level literals are not permitted")]
    TopLevelLiteral(Span),
    #[error("unrecognized token: '{token}'")]
    UnrecognizedToken { token: Box<str>, span: Span },
    #[error("expected an operator after '('")]
    MissingOperator(Span),
    #[error("malformed binding, expected `[name literal]`")]
    MalformedBinding(Span),
    #[error("bindings are only allowed directly inside `let`")]
    BindingOutsideLet(Span),
    #[error("bindings must come before the body of `let`")]
    BindingAfterBody(Span),
    #[error("unexpected ')'")]
    UnbalancedClose(Span),
    #[error("form is not closed by the end of the line")]
    UnclosedForm(Span),
    #[error("forms are nested more than {} deep", MAX_NESTING)]
    TooDeep(Span),
}

impl ParseError {
    pub fn span(&self) -> Span {
        match self {
            Self::Lexer { span, .. } | Self::UnrecognizedToken { span, .. } => span.clone(),
            Self::TopLevelLiteral(span)
            | Self::MissingOperator(span)
            | Self::MalformedBinding(span)
            | Self::BindingOutsideLet(span)
            | Self::BindingAfterBody(span)
            | Self::UnbalancedClose(span)
            | Self::UnclosedForm(span)
            | Self::TooDeep(span) => span.clone(),
        }
    }
}

type Lexed = (Result<Token, LexerError>, Span);
type Tokens = Peekable<std::vec::IntoIter<Lexed>>;

#[derive(Debug)]
enum Frame {
    Form(Form),
    Group { start: usize },
}

impl Frame {
    fn start(&self) -> usize {
        match self {
            Self::Form(form) => form.span.start,
            Self::Group { start } => *start,
        }
    }
}

/// Parses one line into the forms it contains.
///
/// Names introduced by bindings are interned into `names`, which doubles as
/// the set of identifiers that may be referenced as variables from then on,
/// on this line and every later one.
pub fn parse_line(line: &str, names: &mut Rodeo) -> Result<Vec<Form>, ParseError> {
    let roots = TreeBuilder {
        line,
        names,
        frames: vec![],
        roots: vec![],
    }
    .build(tokenize(line))?;
    trace!(roots = roots.len(), "parsed line");
    Ok(roots)
}

struct TreeBuilder<'a> {
    line: &'a str,
    names: &'a mut Rodeo,
    frames: Vec<Frame>,
    roots: Vec<Form>,
}

impl TreeBuilder<'_> {
    fn build(mut self, tokens: Vec<Lexed>) -> Result<Vec<Form>, ParseError> {
        let mut tokens = tokens.into_iter().peekable();
        while let Some((token, span)) = tokens.next() {
            let token = token.map_err(|error| ParseError::Lexer {
                error,
                span: span.clone(),
            })?;
            match token {
                // Nothing after a comment matters
                Token::Comment => break,
                Token::LParen => self.open(span, &mut tokens)?,
                Token::RParen => self.close(span)?,
                Token::Binding(name) => self.binding(&name, span, &mut tokens)?,
                Token::BindingEnd => Err(ParseError::UnrecognizedToken {
                    token: Box::from("]"),
                    span,
                })?,
                Token::Boolean(value) => self.literal(i64::from(value), span)?,
                Token::Number(value) => self.literal(value, span)?,
                Token::Symbol(name) => self.symbol(name, span)?,
            }
        }

        if let Some(outermost) = self.frames.first() {
            return Err(ParseError::UnclosedForm(
                outermost.start()..self.line.len(),
            ));
        }
        Ok(self.roots)
    }

    fn open(&mut self, span: Span, tokens: &mut Tokens) -> Result<(), ParseError> {
        if self.frames.len() >= MAX_NESTING {
            return Err(ParseError::TooDeep(span));
        }
        match tokens.peek() {
            Some((Ok(token), _)) if token.is_binding() => {
                binding_target(&mut self.frames, span.clone())?;
                self.frames.push(Frame::Group { start: span.start });
            }
            Some((Ok(Token::Symbol(_) | Token::Number(_) | Token::Boolean(_)), op_span)) => {
                if let Some(Frame::Group { .. }) = self.frames.last() {
                    return Err(ParseError::MalformedBinding(span));
                }
                let operator = Operator::from_name(&self.line[op_span.clone()]);
                _ = tokens.next(); // consume the operator
                self.frames.push(Frame::Form(Form::new(operator, span.start)));
            }
            Some((Err(error), span)) => {
                return Err(ParseError::Lexer {
                    error: error.clone(),
                    span: span.clone(),
                })
            }
            _ => return Err(ParseError::MissingOperator(span)),
        }
        Ok(())
    }

    fn close(&mut self, span: Span) -> Result<(), ParseError> {
        let mut form = match self.frames.pop() {
            Some(Frame::Form(form)) => form,
            // The bindings of a group were handed to its `let` as they came
            Some(Frame::Group { .. }) => return Ok(()),
            None => return Err(ParseError::UnbalancedClose(span)),
        };
        form.span.end = span.end;

        match self.frames.last_mut() {
            Some(Frame::Form(parent)) => parent.arguments.push(Argument::Form(Box::new(form))),
            Some(Frame::Group { .. }) => return Err(ParseError::MalformedBinding(form.span)),
            None => self.roots.push(form),
        }
        Ok(())
    }

    fn binding(&mut self, name: &str, span: Span, tokens: &mut Tokens) -> Result<(), ParseError> {
        let (value, end) = match (tokens.next(), tokens.next()) {
            (Some((Ok(Token::Number(value)), _)), Some((Ok(Token::BindingEnd), end))) => {
                (value, end)
            }
            (Some((Ok(Token::Boolean(value)), _)), Some((Ok(Token::BindingEnd), end))) => {
                (i64::from(value), end)
            }
            (Some((Err(error), span)), _) | (_, Some((Err(error), span))) => {
                return Err(ParseError::Lexer { error, span })
            }
            _ => return Err(ParseError::MalformedBinding(span)),
        };

        let span = span.start..end.end;
        let form = binding_target(&mut self.frames, span.clone())?;
        let name = self.names.get_or_intern(name);
        form.bindings.push(Binding { name, value, span });
        Ok(())
    }

    fn literal(&mut self, value: i64, span: Span) -> Result<(), ParseError> {
        match self.frames.last_mut() {
            Some(Frame::Form(form)) => {
                form.arguments.push(Argument::Literal(value));
                Ok(())
            }
            Some(Frame::Group { .. }) => Err(ParseError::MalformedBinding(span)),
            None => Err(ParseError::TopLevelLiteral(span)),
        }
    }

    fn symbol(&mut self, name: Box<str>, span: Span) -> Result<(), ParseError> {
        match (self.frames.last_mut(), self.names.get(name.as_ref())) {
            (Some(Frame::Form(form)), Some(key)) => {
                form.arguments.push(Argument::Variable(key));
                Ok(())
            }
            (Some(Frame::Group { .. }), _) => Err(ParseError::MalformedBinding(span)),
            _ => Err(ParseError::UnrecognizedToken { token: name, span }),
        }
    }
}

/// The `let` that a binding found at this point of the line belongs to.
fn binding_target(frames: &mut [Frame], span: Span) -> Result<&mut Form, ParseError> {
    let form = match frames {
        [.., Frame::Form(form), Frame::Group { .. }] | [.., Frame::Form(form)] => form,
        _ => return Err(ParseError::BindingOutsideLet(span)),
    };
    if form.operator != Operator::Let {
        Err(ParseError::BindingOutsideLet(span))
    } else if !form.arguments.is_empty() {
        Err(ParseError::BindingAfterBody(span))
    } else {
        Ok(form)
    }
}
