#![allow(clippy::module_name_repetitions)]

//! Lexer and parser for the serial command line.
//!
//! The lexer uses `regal` to produce a bounded token stream and the parser
//! runs `winnow` parser functions over those tokens. Keywords are
//! case-sensitive and arguments are separated by exactly one space.

use core::fmt;

use heapless::Vec as HeaplessVec;
use regal::IncrementalError;
use regal::TokenCache;
use regal_macros::RegalLexer;
use winnow::error::ErrMode;
use winnow::prelude::*;

/// Maximum number of tokens produced per line.
pub const MAX_TOKENS: usize = 16;
const MAX_CACHE_RECORDS: usize = MAX_TOKENS * 2;

/// Lexical token kinds recognized on the serial link.
#[derive(RegalLexer, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TokenKind {
    /// Unsigned decimal literal.
    #[regex(r"[0-9]+")]
    Integer,
    /// Keyword or argument word.
    #[regex(r"[A-Za-z][A-Za-z0-9]*")]
    Word,
    /// Argument separator; significant, never skipped.
    #[token(" ")]
    Space,
    #[token("\r\n")]
    #[token("\n")]
    #[token("\r")]
    Eol,
    /// Pseudo variant used when the lexer encounters unsupported input.
    #[default]
    #[regex(r".", priority = 1024)]
    Error,
}

/// Token emitted by the lexer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub lexeme: &'a str,
}

pub type TokenBuffer<'a> = HeaplessVec<Token<'a>, MAX_TOKENS>;

/// Lexer errors.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LexError {
    /// Input produced more tokens than the static buffer allows.
    TooManyTokens,
    /// Underlying lexer reported an unrecoverable error.
    Engine,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LexError::TooManyTokens => f.write_str("token buffer exhausted"),
            LexError::Engine => f.write_str("lexer engine error"),
        }
    }
}

/// Why a token sequence is not a command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GrammarError<'a> {
    UnexpectedToken {
        expected: &'static str,
        found: &'a str,
    },
    UnexpectedEnd {
        expected: &'static str,
    },
    UnknownKeyword(&'a str),
    InvalidInteger(&'a str),
    InvalidToken(&'a str),
}

impl fmt::Display for GrammarError<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrammarError::UnexpectedToken { expected, found } => {
                write!(f, "expected {expected}, found `{found}`")
            }
            GrammarError::UnexpectedEnd { expected } => {
                write!(f, "unexpected end of input, expected {expected}")
            }
            GrammarError::UnknownKeyword(lexeme) => write!(f, "unknown keyword `{lexeme}`"),
            GrammarError::InvalidInteger(lexeme) => write!(f, "invalid integer `{lexeme}`"),
            GrammarError::InvalidToken(lexeme) => write!(f, "unsupported input `{lexeme}`"),
        }
    }
}

impl<'a> GrammarError<'a> {
    fn unexpected(expected: &'static str, token: Option<&Token<'a>>) -> Self {
        match token {
            Some(token) => GrammarError::UnexpectedToken {
                expected,
                found: token.lexeme,
            },
            None => GrammarError::UnexpectedEnd { expected },
        }
    }
}

type Input<'src, 'slice> = &'slice [Token<'src>];

type GrammarResult<'src, T> = Result<T, ErrMode<GrammarError<'src>>>;

/// Combined lex/parse error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParseError<'a> {
    Lex(LexError),
    Grammar(GrammarError<'a>),
}

impl fmt::Display for ParseError<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Lex(err) => err.fmt(f),
            ParseError::Grammar(err) => err.fmt(f),
        }
    }
}

/// Argument of the `master` command.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Switch {
    On,
    Off,
}

/// Structured commands produced by the parser.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Report every control LED and the configured timer.
    Init,
    /// Synthetic Master press (`on`) or cancel (`off`).
    Master(Switch),
    /// Requested operation duration in minutes, not yet range-checked.
    Timer(u32),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Keyword {
    Init,
    Master,
    Timer,
}

impl Keyword {
    fn find(lexeme: &str) -> Option<Self> {
        match lexeme {
            "init" => Some(Keyword::Init),
            "master" => Some(Keyword::Master),
            "timer" => Some(Keyword::Timer),
            _ => None,
        }
    }
}

/// Tokenize the provided line.
pub fn lex(line: &str) -> Result<TokenBuffer<'_>, LexError> {
    let compiled = TokenKind::lexer();
    let mut cache: TokenCache<TokenKind, MAX_CACHE_RECORDS> = TokenCache::new();
    let partial = cache
        .rebuild(compiled, line)
        .map_err(map_incremental_error)?;
    let mut buffer = TokenBuffer::new();

    for record in cache.tokens() {
        if record.skipped {
            continue;
        }

        let lexeme = &line[record.start..record.end];
        if buffer
            .push(Token {
                kind: record.token,
                lexeme,
            })
            .is_err()
        {
            return Err(LexError::TooManyTokens);
        }
    }

    if let Some(partial) = partial.filter(|partial| !partial.fragment.is_empty()) {
        if buffer
            .push(Token {
                kind: TokenKind::Error,
                lexeme: partial.fragment,
            })
            .is_err()
        {
            return Err(LexError::TooManyTokens);
        }
    }

    Ok(buffer)
}

fn map_incremental_error(error: IncrementalError) -> LexError {
    match error {
        IncrementalError::TokenOverflow => LexError::TooManyTokens,
        _ => LexError::Engine,
    }
}

/// Parse one serial command line.
pub fn parse(line: &str) -> Result<Command, ParseError<'_>> {
    let tokens = lex(line).map_err(ParseError::Lex)?;

    for token in &tokens {
        if token.kind == TokenKind::Error {
            return Err(ParseError::Grammar(GrammarError::InvalidToken(token.lexeme)));
        }
    }

    let mut input = tokens.as_slice();
    let command = match command.parse_next(&mut input) {
        Ok(command) => command,
        Err(ErrMode::Backtrack(err) | ErrMode::Cut(err)) => {
            return Err(ParseError::Grammar(err));
        }
        Err(ErrMode::Incomplete(_)) => {
            return Err(ParseError::Grammar(GrammarError::unexpected(
                "token",
                input.first(),
            )));
        }
    };

    while let Some((token, remaining)) = input.split_first() {
        if token.kind == TokenKind::Eol {
            input = remaining;
        } else {
            return Err(ParseError::Grammar(GrammarError::unexpected(
                "end of command",
                Some(token),
            )));
        }
    }

    Ok(command)
}

fn command<'src>(input: &mut Input<'src, '_>) -> GrammarResult<'src, Command> {
    let keyword_token = expect_kind(TokenKind::Word, "command keyword").parse_next(input)?;
    let Some(keyword) = Keyword::find(keyword_token.lexeme) else {
        return Err(ErrMode::Cut(GrammarError::UnknownKeyword(keyword_token.lexeme)));
    };

    match keyword {
        Keyword::Init => Ok(Command::Init),
        Keyword::Master => {
            expect_kind(TokenKind::Space, "space").parse_next(input)?;
            switch.parse_next(input).map(Command::Master)
        }
        Keyword::Timer => {
            expect_kind(TokenKind::Space, "space").parse_next(input)?;
            let minutes = expect_kind(TokenKind::Integer, "minutes").parse_next(input)?;
            minutes
                .lexeme
                .parse::<u32>()
                .map(Command::Timer)
                .map_err(|_| ErrMode::Cut(GrammarError::InvalidInteger(minutes.lexeme)))
        }
    }
}

fn switch<'src>(input: &mut Input<'src, '_>) -> GrammarResult<'src, Switch> {
    let token = expect_kind(TokenKind::Word, "on|off").parse_next(input)?;
    match token.lexeme {
        "on" => Ok(Switch::On),
        "off" => Ok(Switch::Off),
        _ => Err(ErrMode::Cut(GrammarError::unexpected(
            "on|off",
            Some(&token),
        ))),
    }
}

fn expect_kind<'src, 'slice>(
    kind: TokenKind,
    label: &'static str,
) -> impl FnMut(&mut Input<'src, 'slice>) -> GrammarResult<'src, Token<'src>>
where
    'src: 'slice,
{
    move |input: &mut Input<'src, 'slice>| match input.split_first() {
        Some((token, rest)) if token.kind == kind => {
            *input = rest;
            Ok(token.clone())
        }
        Some((token, _)) => Err(ErrMode::Backtrack(GrammarError::unexpected(
            label,
            Some(token),
        ))),
        None => Err(ErrMode::Backtrack(GrammarError::unexpected(label, None))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(input: &str) -> Command {
        parse(input).expect("command should parse")
    }

    #[test]
    fn parses_init() {
        assert_eq!(parse_ok("init"), Command::Init);
    }

    #[test]
    fn parses_master_switch() {
        assert_eq!(parse_ok("master on"), Command::Master(Switch::On));
        assert_eq!(parse_ok("master off"), Command::Master(Switch::Off));
    }

    #[test]
    fn parses_timer_without_range_check() {
        assert_eq!(parse_ok("timer 45"), Command::Timer(45));
        assert_eq!(parse_ok("timer 99"), Command::Timer(99));
    }

    #[test]
    fn trailing_terminator_is_tolerated() {
        assert_eq!(parse_ok("init\r\n"), Command::Init);
    }

    #[test]
    fn keywords_are_case_sensitive() {
        match parse("Init") {
            Err(ParseError::Grammar(err)) => {
                assert_eq!(err, GrammarError::UnknownKeyword("Init"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(parse("master ON").is_err());
    }

    #[test]
    fn requires_single_space_separator() {
        assert!(parse("master  on").is_err());
        assert!(parse("timer\t30").is_err());
        assert!(parse(" init").is_err());
        assert!(parse("init ").is_err());
    }

    #[test]
    fn rejects_missing_and_extra_arguments() {
        assert!(parse("master").is_err());
        assert!(parse("timer").is_err());
        assert!(parse("timer on").is_err());
        assert!(parse("init now").is_err());
        assert!(parse("master on off").is_err());
    }

    #[test]
    fn rejects_integer_overflow() {
        match parse("timer 99999999999") {
            Err(ParseError::Grammar(err)) => {
                assert_eq!(err, GrammarError::InvalidInteger("99999999999"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn lexer_emits_error_token_for_unknown_symbol() {
        let tokens = lex("timer -5").expect("lexing should succeed");
        assert!(tokens.iter().any(|token| token.kind == TokenKind::Error));
        assert!(parse("timer -5").is_err());
    }

    #[test]
    fn lexer_keeps_space_tokens() {
        let tokens = lex("timer 30").expect("lexing should succeed");
        let kinds: heapless::Vec<TokenKind, 4> = tokens.iter().map(|token| token.kind).collect();
        assert_eq!(
            kinds.as_slice(),
            &[TokenKind::Word, TokenKind::Space, TokenKind::Integer]
        );
    }
}
