pub mod error;
pub mod token;

use error::LexerError;
use nom::Parser;
use nom::bytes::complete::{is_not, take_until, take_while_m_n};
use nom::character::complete::{digit0, digit1, hex_digit1, multispace0, multispace1, one_of};
use nom::combinator::{opt, value};
use nom::{
    IResult,
    branch::alt,
    bytes::complete::{escaped_transform, tag},
    character::complete::{alpha1, alphanumeric1, char, none_of},
    combinator::{map, map_opt, map_res, recognize},
    multi::many0,
    sequence::{delimited, pair, preceded},
};
use nom_locate::position;
use smol_str::SmolStr;
use token::{Token, TokenKind};

use crate::number::Number;
use crate::range::{Position, Range, Span};

macro_rules! define_token_parser {
    ($name:ident, $tag:expr, $kind:expr) => {
        fn $name(input: Span) -> IResult<Span, TokenKind> {
            value($kind, tag($tag)).parse(input)
        }
    };
}

#[derive(Debug, Clone)]
pub struct Options {
    /// Skip `//` and `/* */` comments. When disabled they are lexical errors.
    pub comments: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self { comments: true }
    }
}

pub struct Lexer {
    options: Options,
}

impl Lexer {
    pub fn new(options: Options) -> Self {
        Self { options }
    }

    pub fn tokenize(&self, input: &str) -> Result<Vec<Token>, LexerError> {
        let mut span = Span::new(input);
        let mut tokens = Vec::new();

        loop {
            span = match skip_trivia(span, &self.options) {
                Ok((rest, _)) => rest,
                Err(_) => return Err(self.error_at(span)),
            };

            if span.fragment().is_empty() {
                tokens.push(Token {
                    range: span.into(),
                    kind: TokenKind::Eof,
                });
                return Ok(tokens);
            }

            let fragment = span.fragment();
            if fragment.starts_with("/*") || (!self.options.comments && fragment.starts_with("//")) {
                return Err(self.error_at(span));
            }

            match token(span) {
                Ok((rest, token)) => {
                    tokens.push(token);
                    span = rest;
                }
                Err(_) => return Err(self.error_at(span)),
            }
        }
    }

    fn error_at(&self, span: Span) -> LexerError {
        let start = Position::from(span);
        let fragment = span.fragment();
        let ch = fragment.chars().next().unwrap_or_default();
        let range = Range::new(
            start,
            Position::new(start.line, start.column + 1, start.offset + ch.len_utf8()),
        );

        match ch {
            '"' | '\'' => LexerError::UnterminatedString(range),
            '/' if self.options.comments && fragment.starts_with("/*") => {
                LexerError::UnterminatedComment(range)
            }
            _ => LexerError::UnexpectedCharacter(range, ch),
        }
    }
}

fn line_comment(input: Span) -> IResult<Span, ()> {
    value((), pair(tag("//"), opt(is_not("\n\r")))).parse(input)
}

fn block_comment(input: Span) -> IResult<Span, ()> {
    value((), (tag("/*"), take_until("*/"), tag("*/"))).parse(input)
}

fn skip_trivia<'a>(input: Span<'a>, options: &Options) -> IResult<Span<'a>, ()> {
    if options.comments {
        value(
            (),
            many0(alt((value((), multispace1), line_comment, block_comment))),
        )
        .parse(input)
    } else {
        value((), multispace0).parse(input)
    }
}

fn unicode(input: Span) -> IResult<Span, char> {
    map_opt(
        map_res(
            preceded(
                char('u'),
                alt((
                    delimited(
                        char('{'),
                        take_while_m_n(1, 6, |c: char| c.is_ascii_hexdigit()),
                        char('}'),
                    ),
                    take_while_m_n(4, 4, |c: char| c.is_ascii_hexdigit()),
                )),
            ),
            |span: Span| u32::from_str_radix(span.fragment(), 16),
        ),
        char::from_u32,
    )
    .parse(input)
}

fn escape_sequence(input: Span) -> IResult<Span, char> {
    alt((
        value('\\', char('\\')),
        value('\"', char('\"')),
        value('\'', char('\'')),
        value('\r', char('r')),
        value('\n', char('n')),
        value('\t', char('t')),
        value('\0', char('0')),
        unicode,
    ))
    .parse(input)
}

fn double_quoted(input: Span) -> IResult<Span, TokenKind> {
    alt((
        value(TokenKind::StringLiteral(String::new()), tag("\"\"")),
        map(
            delimited(
                char('"'),
                escaped_transform(none_of("\"\\"), '\\', escape_sequence),
                char('"'),
            ),
            TokenKind::StringLiteral,
        ),
    ))
    .parse(input)
}

fn single_quoted(input: Span) -> IResult<Span, TokenKind> {
    alt((
        value(TokenKind::StringLiteral(String::new()), tag("''")),
        map(
            delimited(
                char('\''),
                escaped_transform(none_of("'\\"), '\\', escape_sequence),
                char('\''),
            ),
            TokenKind::StringLiteral,
        ),
    ))
    .parse(input)
}

fn hex_literal(input: Span) -> IResult<Span, TokenKind> {
    map_res(
        preceded(alt((tag("0x"), tag("0X"))), hex_digit1),
        |span: Span| {
            u64::from_str_radix(span.fragment(), 16)
                .map(|n| TokenKind::NumberLiteral(Number::new(n as f64)))
        },
    )
    .parse(input)
}

fn number_literal(input: Span) -> IResult<Span, TokenKind> {
    map_res(
        recognize(pair(
            alt((
                recognize(pair(digit1, opt(pair(char('.'), digit0)))),
                recognize(pair(char('.'), digit1)),
            )),
            opt((one_of("eE"), opt(one_of("+-")), digit1)),
        )),
        |span: Span| {
            span.fragment()
                .parse::<f64>()
                .map(|n| TokenKind::NumberLiteral(Number::new(n)))
        },
    )
    .parse(input)
}

fn literals(input: Span) -> IResult<Span, TokenKind> {
    alt((hex_literal, number_literal, double_quoted, single_quoted)).parse(input)
}

define_token_parser!(eq_eq_eq, "===", TokenKind::EqEqEq);
define_token_parser!(ne_eq_eq, "!==", TokenKind::NeEqEq);
define_token_parser!(arrow, "=>", TokenKind::Arrow);
define_token_parser!(eq_eq, "==", TokenKind::EqEq);
define_token_parser!(ne_eq, "!=", TokenKind::NeEq);
define_token_parser!(lte, "<=", TokenKind::Lte);
define_token_parser!(gte, ">=", TokenKind::Gte);
define_token_parser!(and, "&&", TokenKind::And);
define_token_parser!(or, "||", TokenKind::Or);
define_token_parser!(nullish, "??", TokenKind::Nullish);
define_token_parser!(plus_equal, "+=", TokenKind::PlusEqual);
define_token_parser!(minus_equal, "-=", TokenKind::MinusEqual);
define_token_parser!(asterisk_equal, "*=", TokenKind::AsteriskEqual);
define_token_parser!(slash_equal, "/=", TokenKind::SlashEqual);
define_token_parser!(l_paren, "(", TokenKind::LParen);
define_token_parser!(r_paren, ")", TokenKind::RParen);
define_token_parser!(l_brace, "{", TokenKind::LBrace);
define_token_parser!(r_brace, "}", TokenKind::RBrace);
define_token_parser!(l_bracket, "[", TokenKind::LBracket);
define_token_parser!(r_bracket, "]", TokenKind::RBracket);
define_token_parser!(comma, ",", TokenKind::Comma);
define_token_parser!(dot, ".", TokenKind::Dot);
define_token_parser!(semi_colon, ";", TokenKind::SemiColon);
define_token_parser!(colon, ":", TokenKind::Colon);
define_token_parser!(question, "?", TokenKind::Question);
define_token_parser!(equal, "=", TokenKind::Equal);
define_token_parser!(lt, "<", TokenKind::Lt);
define_token_parser!(gt, ">", TokenKind::Gt);
define_token_parser!(plus, "+", TokenKind::Plus);
define_token_parser!(minus, "-", TokenKind::Minus);
define_token_parser!(asterisk, "*", TokenKind::Asterisk);
define_token_parser!(slash, "/", TokenKind::Slash);
define_token_parser!(percent, "%", TokenKind::Percent);
define_token_parser!(bang, "!", TokenKind::Bang);

fn operators(input: Span) -> IResult<Span, TokenKind> {
    alt((
        eq_eq_eq,
        ne_eq_eq,
        arrow,
        eq_eq,
        ne_eq,
        lte,
        gte,
        and,
        or,
        nullish,
        plus_equal,
        minus_equal,
        asterisk_equal,
        slash_equal,
    ))
    .parse(input)
}

fn punctuations(input: Span) -> IResult<Span, TokenKind> {
    alt((
        l_paren, r_paren, l_brace, r_brace, l_bracket, r_bracket, comma, dot, semi_colon, colon,
        question, equal, lt, gt, plus, minus, asterisk, slash, percent, bang,
    ))
    .parse(input)
}

fn word(input: Span) -> IResult<Span, TokenKind> {
    map(
        recognize(pair(
            alt((alpha1, tag("_"), tag("$"))),
            many0(alt((alphanumeric1, tag("_"), tag("$")))),
        )),
        |span: Span| {
            let fragment = *span.fragment();
            TokenKind::keyword(fragment).unwrap_or_else(|| TokenKind::Ident(SmolStr::new(fragment)))
        },
    )
    .parse(input)
}

fn token(input: Span) -> IResult<Span, Token> {
    let (input, start) = position(input)?;
    let (input, kind) = alt((literals, operators, punctuations, word)).parse(input)?;
    let (input, end) = position(input)?;

    Ok((
        input,
        Token {
            range: Range::new(start.into(), end.into()),
            kind,
        },
    ))
}
