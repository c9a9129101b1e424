pub use logos::Span;
use logos::{Lexer, Logos};

fn process_binding_name(lexer: &mut Lexer<Token>) -> Box<str> {
    // Skip the [ and any blanks between it and the name
    Box::from(lexer.slice()[1..].trim_start())
}

fn process_integer(lexer: &mut Lexer<Token>) -> Result<i64, LexerError> {
    lexer
        .slice()
        .parse::<i64>()
        .map_err(|_| LexerError::NumberTooBig)
}

#[derive(thiserror::Error, Debug, PartialEq, Clone, Default)]
pub enum LexerError {
    #[default]
    #[error("invalid token encountered")]
    Invalid,
    #[error("number literal too big")]
    NumberTooBig,
}

/// Tokens of a single source line.
///
/// Parentheses always stand alone, and the opening bracket of a binding is
/// glued to the name that follows it, so that `[ x 5]` lexes as
/// `Binding("x")`, `Number(5)`, `BindingEnd`.
#[derive(Debug, Clone, PartialEq, Logos)]
#[logos(error = LexerError)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum Token {
    #[regex(r";[^\n]*")]
    Comment,

    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[regex(r"\[[ \t]*[^ \t\r\n\f()\[\];]+", callback = process_binding_name)]
    Binding(Box<str>),
    #[token("]")]
    BindingEnd,

    #[regex("(?i)#t(rue)?", priority = 3, callback = |_| true)]
    #[regex("(?i)#f(alse)?", priority = 3, callback = |_| false)]
    Boolean(bool),
    #[regex("-?[0-9]+", priority = 3, callback = process_integer)]
    Number(i64),
    // Operators and variable names alike; the parser decides which is which
    #[regex(r"[^ \t\r\n\f()\[\];]+", priority = 1, callback = |l| Box::from(l.slice()))]
    Symbol(Box<str>),
}

impl Token {
    pub fn lexer(source: &str) -> Lexer<'_, Self> {
        <Self as Logos>::lexer(source)
    }

    /// Whether this token can start a binding pair.
    pub fn is_binding(&self) -> bool {
        matches!(self, Self::Binding(_))
    }
}

/// Splits one line into its tokens, in order.
///
/// Lexing never fails as a whole: invalid input is kept in the sequence as an
/// `Err` and only reported once the parser gets to it.
pub fn tokenize(line: &str) -> Vec<(Result<Token, LexerError>, Span)> {
    Token::lexer(line).spanned().collect()
}

#[cfg(test)]
mod tests {
    use super::{tokenize, LexerError, Token};
    use assert2::{check, let_assert};

    fn tokens(line: &str) -> Vec<Token> {
        tokenize(line)
            .into_iter()
            .map(|(tok, span)| match tok {
                Ok(tok) => tok,
                Err(err) => panic!("unexpected lexer error {err} at {span:?}"),
            })
            .collect()
    }

    #[test]
    fn parens_stand_alone() {
        check!(
            tokens("(println(+ 1 2))")
                == [
                    Token::LParen,
                    Token::Symbol("println".into()),
                    Token::LParen,
                    Token::Symbol("+".into()),
                    Token::Number(1),
                    Token::Number(2),
                    Token::RParen,
                    Token::RParen,
                ]
        );
        check!(tokens("( ( ) )") == tokens("(())"));
    }

    #[test]
    fn binding_normalization() {
        let expected = [
            Token::Binding("x".into()),
            Token::Number(5),
            Token::BindingEnd,
        ];
        check!(tokens("[x 5]") == expected);
        check!(tokens("[  x 5   ]") == expected);
        check!(tokens("[x\t5]") == expected);

        let lexed = tokens("[counter #t]");
        let_assert!([Token::Binding(name), Token::Boolean(true), Token::BindingEnd] = lexed.as_slice());
        check!(name.as_ref() == "counter");
        check!(tokens("[x 1]")[0].is_binding());
        check!(!tokens("x")[0].is_binding());
    }

    #[test]
    fn lone_bracket_is_invalid() {
        let lexed = tokenize("[ ]");
        let_assert!(Some((Err(LexerError::Invalid), span)) = lexed.first());
        check!(span.start == 0);
    }

    #[test]
    fn numbers() {
        check!(tokens("0") == [Token::Number(0)]);
        check!(tokens("42") == [Token::Number(42)]);
        check!(tokens("-7") == [Token::Number(-7)]);
        check!(tokens("-") == [Token::Symbol("-".into())]);
        // longest match wins, so trailing garbage makes a symbol
        check!(tokens("5x") == [Token::Symbol("5x".into())]);

        let lexed = tokenize("99999999999999999999");
        let_assert!([(Err(LexerError::NumberTooBig), _)] = lexed.as_slice());
    }

    #[test]
    fn booleans() {
        check!(tokens("#t") == [Token::Boolean(true)]);
        check!(tokens("#true") == [Token::Boolean(true)]);
        check!(tokens("#F") == [Token::Boolean(false)]);
        check!(tokens("#false") == [Token::Boolean(false)]);
        check!(tokens("#tx") == [Token::Symbol("#tx".into())]);
    }

    #[test]
    fn comments_run_to_end_of_line() {
        check!(tokens("; (println 1)") == [Token::Comment]);
        check!(
            tokens("(println 1) ; trailing")
                == [
                    Token::LParen,
                    Token::Symbol("println".into()),
                    Token::Number(1),
                    Token::RParen,
                    Token::Comment,
                ]
        );
        check!(tokens("x;y") == [Token::Symbol("x".into()), Token::Comment]);
    }

    #[test]
    fn spans_point_into_the_line() {
        let line = "(let [x 5] x)";
        let spans = tokenize(line)
            .into_iter()
            .map(|(_, span)| &line[span])
            .collect::<Vec<_>>();
        check!(spans == ["(", "let", "[x", "5", "]", "x", ")"]);
    }

    #[test]
    fn blank_line() {
        check!(tokens("").is_empty());
        check!(tokens("   \t ").is_empty());
    }
}
