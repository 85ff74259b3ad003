use std::fmt::{self, Display, Formatter};

use smol_str::SmolStr;

use crate::{number::Number, range::Range};

#[derive(PartialEq, PartialOrd, Debug, Clone)]
pub struct Token {
    pub range: Range,
    pub kind: TokenKind,
}

impl Token {
    #[inline(always)]
    pub fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }
}

#[derive(PartialEq, PartialOrd, Debug, Clone)]
pub enum TokenKind {
    And,
    Arrow,
    Asterisk,
    AsteriskEqual,
    Bang,
    BoolLiteral(bool),
    Colon,
    Comma,
    Const,
    Dot,
    Else,
    Eof,
    EqEq,
    EqEqEq,
    Equal,
    Function,
    Gt,
    Gte,
    Ident(SmolStr),
    If,
    LBrace,
    LBracket,
    Let,
    LParen,
    Lt,
    Lte,
    Minus,
    MinusEqual,
    NeEq,
    NeEqEq,
    Null,
    Nullish,
    NumberLiteral(Number),
    Or,
    Percent,
    Plus,
    PlusEqual,
    Question,
    RBrace,
    RBracket,
    Return,
    RParen,
    SemiColon,
    Slash,
    SlashEqual,
    StringLiteral(String),
    Typeof,
    Var,
    While,
}

impl TokenKind {
    /// Maps a scanned word to its keyword token, if it is reserved.
    pub fn keyword(word: &str) -> Option<TokenKind> {
        match word {
            "const" => Some(TokenKind::Const),
            "else" => Some(TokenKind::Else),
            "false" => Some(TokenKind::BoolLiteral(false)),
            "function" => Some(TokenKind::Function),
            "if" => Some(TokenKind::If),
            "let" => Some(TokenKind::Let),
            "null" => Some(TokenKind::Null),
            "return" => Some(TokenKind::Return),
            "true" => Some(TokenKind::BoolLiteral(true)),
            "typeof" => Some(TokenKind::Typeof),
            "var" => Some(TokenKind::Var),
            "while" => Some(TokenKind::While),
            _ => None,
        }
    }

    /// The name this token spells when used as a property key (`obj.return`).
    pub fn property_name(&self) -> Option<SmolStr> {
        match self {
            TokenKind::Ident(name) => Some(name.clone()),
            TokenKind::BoolLiteral(_)
            | TokenKind::Const
            | TokenKind::Else
            | TokenKind::Function
            | TokenKind::If
            | TokenKind::Let
            | TokenKind::Null
            | TokenKind::Return
            | TokenKind::Typeof
            | TokenKind::Var
            | TokenKind::While => Some(SmolStr::new(self.to_string())),
            _ => None,
        }
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "{}", self.kind)
    }
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match &self {
            TokenKind::And => write!(f, "&&"),
            TokenKind::Arrow => write!(f, "=>"),
            TokenKind::Asterisk => write!(f, "*"),
            TokenKind::AsteriskEqual => write!(f, "*="),
            TokenKind::Bang => write!(f, "!"),
            TokenKind::BoolLiteral(b) => write!(f, "{}", b),
            TokenKind::Colon => write!(f, ":"),
            TokenKind::Comma => write!(f, ","),
            TokenKind::Const => write!(f, "const"),
            TokenKind::Dot => write!(f, "."),
            TokenKind::Else => write!(f, "else"),
            TokenKind::Eof => write!(f, ""),
            TokenKind::EqEq => write!(f, "=="),
            TokenKind::EqEqEq => write!(f, "==="),
            TokenKind::Equal => write!(f, "="),
            TokenKind::Function => write!(f, "function"),
            TokenKind::Gt => write!(f, ">"),
            TokenKind::Gte => write!(f, ">="),
            TokenKind::Ident(ident) => write!(f, "{}", ident),
            TokenKind::If => write!(f, "if"),
            TokenKind::LBrace => write!(f, "{{"),
            TokenKind::LBracket => write!(f, "["),
            TokenKind::Let => write!(f, "let"),
            TokenKind::LParen => write!(f, "("),
            TokenKind::Lt => write!(f, "<"),
            TokenKind::Lte => write!(f, "<="),
            TokenKind::Minus => write!(f, "-"),
            TokenKind::MinusEqual => write!(f, "-="),
            TokenKind::NeEq => write!(f, "!="),
            TokenKind::NeEqEq => write!(f, "!=="),
            TokenKind::Null => write!(f, "null"),
            TokenKind::Nullish => write!(f, "??"),
            TokenKind::NumberLiteral(n) => write!(f, "{}", n),
            TokenKind::Or => write!(f, "||"),
            TokenKind::Percent => write!(f, "%"),
            TokenKind::Plus => write!(f, "+"),
            TokenKind::PlusEqual => write!(f, "+="),
            TokenKind::Question => write!(f, "?"),
            TokenKind::RBrace => write!(f, "}}"),
            TokenKind::RBracket => write!(f, "]"),
            TokenKind::Return => write!(f, "return"),
            TokenKind::RParen => write!(f, ")"),
            TokenKind::SemiColon => write!(f, ";"),
            TokenKind::Slash => write!(f, "/"),
            TokenKind::SlashEqual => write!(f, "/="),
            TokenKind::StringLiteral(s) => write!(f, "{:?}", s),
            TokenKind::Typeof => write!(f, "typeof"),
            TokenKind::Var => write!(f, "var"),
            TokenKind::While => write!(f, "while"),
        }
    }
}
