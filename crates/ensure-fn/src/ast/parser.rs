use crate::lexer::token::{Token, TokenKind};
use crate::range::{Position, Range};
use crate::Shared;
use smallvec::SmallVec;
use smol_str::SmolStr;

use super::error::ParseError;
use super::node::{
    Args, AssignOp, BinaryOp, DeclKind, Declarator, Expr, FunctionBody, FunctionDef, Ident,
    Literal, LogicalOp, Node, Params, Properties, Stmt, StmtKind, UnaryOp,
};
use super::{ParserOptions, Program};

/// Deepest syntax tree the parser builds. Evaluating and printing recurse
/// over the tree, so this bounds their stack use as well.
#[cfg(debug_assertions)]
pub const MAX_NESTING_DEPTH: u32 = 128;
#[cfg(not(debug_assertions))]
pub const MAX_NESTING_DEPTH: u32 = 512;

pub struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    eof: Token,
    prev_end: Position,
    options: &'a ParserOptions,
    function_depth: u32,
    nesting_depth: u32,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token], options: &'a ParserOptions) -> Self {
        let eof = Token {
            range: tokens.last().map(|t| t.range).unwrap_or_default(),
            kind: TokenKind::Eof,
        };

        Self {
            tokens,
            pos: 0,
            eof,
            prev_end: Position::default(),
            options,
            function_depth: 0,
            nesting_depth: 0,
        }
    }

    /// Parses a whole script.
    pub fn parse(&mut self) -> Result<Program, ParseError> {
        self.parse_statements(false)
    }

    /// Parses the tokens as the body of a function, where `return` is always legal.
    pub fn parse_function_body(&mut self) -> Result<Program, ParseError> {
        self.function_depth += 1;
        let program = self.parse_statements(false);
        self.function_depth -= 1;
        program
    }

    /// Goes one level deeper into the tree, failing past `MAX_NESTING_DEPTH`.
    fn enter(&mut self) -> Result<(), ParseError> {
        if self.nesting_depth >= MAX_NESTING_DEPTH {
            return Err(ParseError::NestingTooDeep(self.peek().clone()));
        }
        self.nesting_depth += 1;
        Ok(())
    }

    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> Result<T, ParseError>) -> Result<T, ParseError> {
        self.enter()?;
        let result = parse(self);
        self.nesting_depth -= 1;
        result
    }

    #[inline(always)]
    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&self.eof)
    }

    #[inline(always)]
    fn peek_kind_at(&self, offset: usize) -> &TokenKind {
        self.tokens
            .get(self.pos + offset)
            .map(|t| &t.kind)
            .unwrap_or(&TokenKind::Eof)
    }

    fn next(&mut self) -> Token {
        let token = self.peek().clone();
        if !token.is_eof() {
            self.pos += 1;
            self.prev_end = token.range.end;
        }
        token
    }

    #[inline(always)]
    fn eat(&mut self, kind: &TokenKind) -> bool {
        if &self.peek().kind == kind {
            self.next();
            true
        } else {
            false
        }
    }

    #[inline(always)]
    fn range_from(&self, start: Position) -> Range {
        Range::new(start, self.prev_end)
    }

    fn unexpected(&self) -> ParseError {
        let token = self.peek().clone();
        if token.is_eof() {
            ParseError::UnexpectedEOFDetected(token)
        } else {
            ParseError::UnexpectedToken(token)
        }
    }

    fn parse_statements(&mut self, in_block: bool) -> Result<Program, ParseError> {
        let mut program = Vec::new();

        loop {
            match &self.peek().kind {
                TokenKind::Eof if in_block => {
                    return Err(ParseError::ExpectedClosingBrace(self.peek().clone()));
                }
                TokenKind::Eof => break,
                TokenKind::RBrace if in_block => break,
                _ => program.push(Shared::new(self.parse_statement()?)),
            }
        }

        Ok(program)
    }

    fn parse_statement(&mut self) -> Result<Stmt, ParseError> {
        self.nested(Self::parse_statement_kind)
    }

    fn parse_statement_kind(&mut self) -> Result<Stmt, ParseError> {
        let start = self.peek().range.start;

        match &self.peek().kind {
            TokenKind::SemiColon => {
                self.next();
                Ok(Stmt::with_range(StmtKind::Empty, self.range_from(start)))
            }
            TokenKind::LBrace => self.parse_block(),
            TokenKind::Var | TokenKind::Let | TokenKind::Const => self.parse_var_decl(),
            TokenKind::Function => self.parse_function_decl(),
            TokenKind::Return => self.parse_return(),
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            _ => {
                let expr = self.parse_expr()?;
                self.end_statement()?;
                Ok(Stmt::with_range(StmtKind::Expr(expr), self.range_from(start)))
            }
        }
    }

    /// Consumes the statement terminator, applying automatic semicolon insertion when enabled.
    fn end_statement(&mut self) -> Result<(), ParseError> {
        let token = self.peek();

        match token.kind {
            TokenKind::SemiColon => {
                self.next();
                Ok(())
            }
            TokenKind::RBrace | TokenKind::Eof => Ok(()),
            _ if self.options.semicolon_insertion && token.range.start.line > self.prev_end.line => {
                Ok(())
            }
            _ => Err(ParseError::UnexpectedToken(token.clone())),
        }
    }

    fn parse_block(&mut self) -> Result<Stmt, ParseError> {
        let start = self.peek().range.start;
        if !self.eat(&TokenKind::LBrace) {
            return Err(self.unexpected());
        }

        let body = self.parse_statements(true)?;
        if !self.eat(&TokenKind::RBrace) {
            return Err(ParseError::ExpectedClosingBrace(self.peek().clone()));
        }

        Ok(Stmt::with_range(StmtKind::Block(body), self.range_from(start)))
    }

    fn parse_var_decl(&mut self) -> Result<Stmt, ParseError> {
        let start = self.peek().range.start;
        let keyword = self.next();
        let kind = match keyword.kind {
            TokenKind::Var => DeclKind::Var,
            TokenKind::Let => DeclKind::Let,
            _ => DeclKind::Const,
        };
        let mut declarators = Vec::new();

        loop {
            let ident = self.parse_ident()?;
            let init = if self.eat(&TokenKind::Equal) {
                Some(self.parse_assignment()?)
            } else if kind == DeclKind::Const {
                return Err(ParseError::MissingInitializer(self.peek().clone()));
            } else {
                None
            };

            declarators.push(Declarator { ident, init });

            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }

        self.end_statement()?;
        Ok(Stmt::with_range(
            StmtKind::VarDecl(kind, declarators),
            self.range_from(start),
        ))
    }

    fn parse_function_decl(&mut self) -> Result<Stmt, ParseError> {
        let start = self.peek().range.start;
        self.next();

        let name = self.parse_ident()?;
        let params = self.parse_params()?;
        let body = self.parse_function_block()?;

        Ok(Stmt::with_range(
            StmtKind::FunctionDecl(Shared::new(FunctionDef {
                name: Some(name),
                params,
                body: FunctionBody::Block(body),
            })),
            self.range_from(start),
        ))
    }

    fn parse_return(&mut self) -> Result<Stmt, ParseError> {
        let start = self.peek().range.start;
        let token = self.next();

        if self.function_depth == 0 && !self.options.allow_return_outside_function {
            return Err(ParseError::IllegalReturn(token));
        }

        let next = self.peek();
        // A line break right after `return` ends the statement.
        let argument = match next.kind {
            TokenKind::SemiColon | TokenKind::RBrace | TokenKind::Eof => None,
            _ if next.range.start.line > self.prev_end.line => None,
            _ => Some(self.parse_expr()?),
        };

        self.end_statement()?;
        Ok(Stmt::with_range(
            StmtKind::Return(argument),
            self.range_from(start),
        ))
    }

    fn parse_if(&mut self) -> Result<Stmt, ParseError> {
        let start = self.peek().range.start;
        self.next();

        let test = self.parse_condition()?;
        let consequent = Shared::new(self.parse_statement()?);
        let alternate = if self.eat(&TokenKind::Else) {
            Some(Shared::new(self.parse_statement()?))
        } else {
            None
        };

        Ok(Stmt::with_range(
            StmtKind::If(test, consequent, alternate),
            self.range_from(start),
        ))
    }

    fn parse_while(&mut self) -> Result<Stmt, ParseError> {
        let start = self.peek().range.start;
        self.next();

        let test = self.parse_condition()?;
        let body = Shared::new(self.parse_statement()?);

        Ok(Stmt::with_range(
            StmtKind::While(test, body),
            self.range_from(start),
        ))
    }

    fn parse_condition(&mut self) -> Result<Shared<Node>, ParseError> {
        if !self.eat(&TokenKind::LParen) {
            return Err(self.unexpected());
        }
        let test = self.parse_expr()?;
        if !self.eat(&TokenKind::RParen) {
            return Err(ParseError::ExpectedClosingParen(self.peek().clone()));
        }
        Ok(test)
    }

    fn parse_ident(&mut self) -> Result<Ident, ParseError> {
        match &self.peek().kind {
            TokenKind::Ident(name) => {
                let ident = Ident::new_with_range(name, self.peek().range);
                self.next();
                Ok(ident)
            }
            _ => Err(ParseError::ExpectedIdent(self.peek().clone())),
        }
    }

    fn parse_params(&mut self) -> Result<Params, ParseError> {
        if !self.eat(&TokenKind::LParen) {
            return Err(self.unexpected());
        }

        let mut params = Params::new();
        while !self.eat(&TokenKind::RParen) {
            params.push(self.parse_ident()?);

            match self.peek().kind {
                TokenKind::Comma => {
                    self.next();
                }
                TokenKind::RParen => {}
                _ => return Err(ParseError::ExpectedClosingParen(self.peek().clone())),
            }
        }

        Ok(params)
    }

    fn parse_function_block(&mut self) -> Result<Shared<Stmt>, ParseError> {
        self.function_depth += 1;
        let body = self.parse_block();
        self.function_depth -= 1;
        body.map(Shared::new)
    }

    #[inline(always)]
    fn parse_expr(&mut self) -> Result<Shared<Node>, ParseError> {
        self.parse_assignment()
    }

    /// `x => ...` or `(a, b) => ...`: the parameter list is only known to be one
    /// once the matching `)` is followed by `=>`.
    fn is_arrow_start(&self) -> bool {
        match self.peek_kind_at(0) {
            TokenKind::Ident(_) => matches!(self.peek_kind_at(1), TokenKind::Arrow),
            TokenKind::LParen => {
                let mut depth = 0usize;
                for (offset, token) in self.tokens[self.pos..].iter().enumerate() {
                    match token.kind {
                        TokenKind::LParen => depth += 1,
                        TokenKind::RParen => {
                            depth -= 1;
                            if depth == 0 {
                                return matches!(self.peek_kind_at(offset + 1), TokenKind::Arrow);
                            }
                        }
                        TokenKind::Eof => return false,
                        _ => {}
                    }
                }
                false
            }
            _ => false,
        }
    }

    fn parse_arrow(&mut self) -> Result<Shared<Node>, ParseError> {
        let start = self.peek().range.start;
        let params = if matches!(self.peek().kind, TokenKind::Ident(_)) {
            let mut params = Params::new();
            params.push(self.parse_ident()?);
            params
        } else {
            self.parse_params()?
        };

        if !self.eat(&TokenKind::Arrow) {
            return Err(self.unexpected());
        }

        let body = if matches!(self.peek().kind, TokenKind::LBrace) {
            FunctionBody::Block(self.parse_function_block()?)
        } else {
            FunctionBody::Expr(self.parse_assignment()?)
        };

        Ok(Shared::new(Node::with_range(
            Expr::Arrow(Shared::new(FunctionDef {
                name: None,
                params,
                body,
            })),
            self.range_from(start),
        )))
    }

    fn parse_assignment(&mut self) -> Result<Shared<Node>, ParseError> {
        self.nested(Self::parse_assignment_expr)
    }

    fn parse_assignment_expr(&mut self) -> Result<Shared<Node>, ParseError> {
        if self.is_arrow_start() {
            return self.parse_arrow();
        }

        let start = self.peek().range.start;
        let target = self.parse_conditional()?;
        let op = match self.peek().kind {
            TokenKind::Equal => AssignOp::Assign,
            TokenKind::PlusEqual => AssignOp::Add,
            TokenKind::MinusEqual => AssignOp::Sub,
            TokenKind::AsteriskEqual => AssignOp::Mul,
            TokenKind::SlashEqual => AssignOp::Div,
            _ => return Ok(target),
        };
        let op_token = self.next();

        if !matches!(
            target.expr,
            Expr::Ident(_) | Expr::Member(_, _) | Expr::Index(_, _)
        ) {
            return Err(ParseError::InvalidAssignmentTarget(op_token));
        }

        let value = self.parse_assignment()?;
        Ok(Shared::new(Node::with_range(
            Expr::Assign(op, target, value),
            self.range_from(start),
        )))
    }

    fn parse_conditional(&mut self) -> Result<Shared<Node>, ParseError> {
        let start = self.peek().range.start;
        let test = self.parse_binary(1)?;

        if !self.eat(&TokenKind::Question) {
            return Ok(test);
        }

        let consequent = self.parse_assignment()?;
        if !self.eat(&TokenKind::Colon) {
            return Err(self.unexpected());
        }
        let alternate = self.parse_assignment()?;

        Ok(Shared::new(Node::with_range(
            Expr::Conditional(test, consequent, alternate),
            self.range_from(start),
        )))
    }

    #[inline(always)]
    fn binary_op_precedence(kind: &TokenKind) -> u8 {
        match kind {
            TokenKind::Or | TokenKind::Nullish => 1,
            TokenKind::And => 2,
            TokenKind::EqEq | TokenKind::NeEq | TokenKind::EqEqEq | TokenKind::NeEqEq => 3,
            TokenKind::Lt | TokenKind::Lte | TokenKind::Gt | TokenKind::Gte => 4,
            TokenKind::Plus | TokenKind::Minus => 5,
            TokenKind::Asterisk | TokenKind::Slash | TokenKind::Percent => 6,
            _ => 0,
        }
    }

    fn binary_expr(kind: &TokenKind, lhs: Shared<Node>, rhs: Shared<Node>) -> Option<Expr> {
        match kind {
            TokenKind::Or => Some(Expr::Logical(LogicalOp::Or, lhs, rhs)),
            TokenKind::And => Some(Expr::Logical(LogicalOp::And, lhs, rhs)),
            TokenKind::Nullish => Some(Expr::Logical(LogicalOp::Nullish, lhs, rhs)),
            TokenKind::EqEq => Some(Expr::Binary(BinaryOp::Eq, lhs, rhs)),
            TokenKind::NeEq => Some(Expr::Binary(BinaryOp::NotEq, lhs, rhs)),
            TokenKind::EqEqEq => Some(Expr::Binary(BinaryOp::StrictEq, lhs, rhs)),
            TokenKind::NeEqEq => Some(Expr::Binary(BinaryOp::StrictNotEq, lhs, rhs)),
            TokenKind::Lt => Some(Expr::Binary(BinaryOp::Lt, lhs, rhs)),
            TokenKind::Lte => Some(Expr::Binary(BinaryOp::Lte, lhs, rhs)),
            TokenKind::Gt => Some(Expr::Binary(BinaryOp::Gt, lhs, rhs)),
            TokenKind::Gte => Some(Expr::Binary(BinaryOp::Gte, lhs, rhs)),
            TokenKind::Plus => Some(Expr::Binary(BinaryOp::Add, lhs, rhs)),
            TokenKind::Minus => Some(Expr::Binary(BinaryOp::Sub, lhs, rhs)),
            TokenKind::Asterisk => Some(Expr::Binary(BinaryOp::Mul, lhs, rhs)),
            TokenKind::Slash => Some(Expr::Binary(BinaryOp::Div, lhs, rhs)),
            TokenKind::Percent => Some(Expr::Binary(BinaryOp::Mod, lhs, rhs)),
            _ => None,
        }
    }

    fn parse_binary(&mut self, min_prec: u8) -> Result<Shared<Node>, ParseError> {
        let start = self.peek().range.start;
        let depth = self.nesting_depth;
        let mut lhs = self.parse_unary()?;

        loop {
            let prec = Self::binary_op_precedence(&self.peek().kind);
            if prec == 0 || prec < min_prec {
                break;
            }

            // Each operator wraps everything parsed so far in one more node.
            self.enter()?;
            let operator = self.next();
            let rhs = self.parse_binary(prec + 1)?;
            let expr = Self::binary_expr(&operator.kind, lhs, rhs)
                .ok_or_else(|| ParseError::UnexpectedToken(operator.clone()))?;
            lhs = Shared::new(Node::with_range(expr, self.range_from(start)));
        }

        self.nesting_depth = depth;
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Shared<Node>, ParseError> {
        let start = self.peek().range.start;
        let op = match self.peek().kind {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Plus => UnaryOp::Plus,
            TokenKind::Bang => UnaryOp::Not,
            TokenKind::Typeof => UnaryOp::Typeof,
            _ => return self.parse_postfix(),
        };
        self.next();

        let operand = self.nested(Self::parse_unary)?;
        Ok(Shared::new(Node::with_range(
            Expr::Unary(op, operand),
            self.range_from(start),
        )))
    }

    fn parse_postfix(&mut self) -> Result<Shared<Node>, ParseError> {
        let start = self.peek().range.start;
        let depth = self.nesting_depth;
        let mut expr = self.parse_primary()?;

        loop {
            if matches!(
                self.peek().kind,
                TokenKind::Dot | TokenKind::LBracket | TokenKind::LParen
            ) {
                self.enter()?;
            }

            match self.peek().kind {
                TokenKind::Dot => {
                    self.next();
                    let name = self
                        .peek()
                        .kind
                        .property_name()
                        .ok_or_else(|| ParseError::ExpectedIdent(self.peek().clone()))?;
                    self.next();
                    expr = Shared::new(Node::with_range(
                        Expr::Member(expr, name),
                        self.range_from(start),
                    ));
                }
                TokenKind::LBracket => {
                    self.next();
                    let index = self.parse_expr()?;
                    if !self.eat(&TokenKind::RBracket) {
                        return Err(ParseError::ExpectedClosingBracket(self.peek().clone()));
                    }
                    expr = Shared::new(Node::with_range(
                        Expr::Index(expr, index),
                        self.range_from(start),
                    ));
                }
                TokenKind::LParen => {
                    self.next();
                    let args = self.parse_args(TokenKind::RParen)?;
                    expr = Shared::new(Node::with_range(
                        Expr::Call(expr, args),
                        self.range_from(start),
                    ));
                }
                _ => break,
            }
        }

        self.nesting_depth = depth;
        Ok(expr)
    }

    /// Parses comma separated expressions up to and including `close`.
    fn parse_args(&mut self, close: TokenKind) -> Result<Args, ParseError> {
        let mut args: Args = SmallVec::new();

        while !self.eat(&close) {
            args.push(self.parse_assignment()?);

            match &self.peek().kind {
                TokenKind::Comma => {
                    self.next();
                }
                kind if *kind == close => {}
                _ if close == TokenKind::RBracket => {
                    return Err(ParseError::ExpectedClosingBracket(self.peek().clone()));
                }
                _ => return Err(ParseError::ExpectedClosingParen(self.peek().clone())),
            }
        }

        Ok(args)
    }

    fn parse_object(&mut self) -> Result<Properties, ParseError> {
        let mut properties = Properties::new();

        while !self.eat(&TokenKind::RBrace) {
            let token = self.next();
            let key = match &token.kind {
                TokenKind::StringLiteral(s) => SmolStr::new(s),
                TokenKind::NumberLiteral(n) => SmolStr::new(n.to_string()),
                kind => kind
                    .property_name()
                    .ok_or_else(|| ParseError::UnexpectedToken(token.clone()))?,
            };

            let value = if self.eat(&TokenKind::Colon) {
                self.parse_assignment()?
            } else if let TokenKind::Ident(name) = &token.kind {
                Shared::new(Node::with_range(
                    Expr::Ident(Ident::new_with_range(name, token.range)),
                    token.range,
                ))
            } else {
                return Err(self.unexpected());
            };

            properties.push((key, value));

            match self.peek().kind {
                TokenKind::Comma => {
                    self.next();
                }
                TokenKind::RBrace => {}
                _ => return Err(ParseError::ExpectedClosingBrace(self.peek().clone())),
            }
        }

        Ok(properties)
    }

    fn parse_primary(&mut self) -> Result<Shared<Node>, ParseError> {
        let start = self.peek().range.start;
        let token = self.next();

        let expr = match &token.kind {
            TokenKind::NumberLiteral(n) => Expr::Literal(Literal::Number(*n)),
            TokenKind::StringLiteral(s) => Expr::Literal(Literal::String(s.clone())),
            TokenKind::BoolLiteral(b) => Expr::Literal(Literal::Bool(*b)),
            TokenKind::Null => Expr::Literal(Literal::Null),
            TokenKind::Ident(name) => Expr::Ident(Ident::new_with_range(name, token.range)),
            TokenKind::LParen => {
                let inner = self.parse_expr()?;
                if !self.eat(&TokenKind::RParen) {
                    return Err(ParseError::ExpectedClosingParen(self.peek().clone()));
                }
                // The parenthesized node keeps its parens in its range so the
                // printer can reuse the original text.
                inner.expr.clone()
            }
            TokenKind::LBracket => Expr::Array(self.parse_args(TokenKind::RBracket)?),
            TokenKind::LBrace => Expr::Object(self.parse_object()?),
            TokenKind::Function => {
                let name = match self.peek().kind {
                    TokenKind::Ident(_) => Some(self.parse_ident()?),
                    _ => None,
                };
                let params = self.parse_params()?;
                let body = self.parse_function_block()?;

                Expr::Function(Shared::new(FunctionDef {
                    name,
                    params,
                    body: FunctionBody::Block(body),
                }))
            }
            TokenKind::Eof => return Err(ParseError::UnexpectedEOFDetected(token)),
            _ => return Err(ParseError::UnexpectedToken(token)),
        };

        Ok(Shared::new(Node::with_range(expr, self.range_from(start))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::{Lexer, Options};
    use rstest::rstest;

    fn parse_with(code: &str, options: &ParserOptions) -> Result<Program, ParseError> {
        let tokens = Lexer::new(Options::default()).tokenize(code).unwrap();
        Parser::new(&tokens, options).parse()
    }

    fn parse(code: &str) -> Result<Program, ParseError> {
        parse_with(code, &ParserOptions::default())
    }

    fn expr_of(stmt: &Stmt) -> &Expr {
        match &stmt.kind {
            StmtKind::Expr(node) => &node.expr,
            kind => panic!("expected an expression statement, got {:?}", kind),
        }
    }

    #[rstest]
    #[case::bare_expression("item.value * 2", 1)]
    #[case::semicolons("let multiple; multiple = 2; item.value * multiple", 3)]
    #[case::newlines("var a = 1\nvar b = 2\na + b", 3)]
    #[case::function_declarations(
        "function square (v) { return v * 2 }\nfunction map (item) { return square(item.value) }",
        2
    )]
    #[case::trailing_empty_statement("function f() {};", 2)]
    #[case::empty("", 0)]
    #[case::control_flow("if (a) { b } else c; while (x) x -= 1", 2)]
    fn test_statement_count(#[case] code: &str, #[case] expected: usize) {
        assert_eq!(parse(code).unwrap().len(), expected);
    }

    #[test]
    fn test_precedence() {
        let program = parse("1 + 2 * 3").unwrap();
        match expr_of(&program[0]) {
            Expr::Binary(BinaryOp::Add, lhs, rhs) => {
                assert_eq!(lhs.expr, Expr::Literal(Literal::Number(1.into())));
                assert!(matches!(rhs.expr, Expr::Binary(BinaryOp::Mul, _, _)));
            }
            expr => panic!("unexpected expression {:?}", expr),
        }
    }

    #[test]
    fn test_left_associativity() {
        let program = parse("8 - 4 - 2").unwrap();
        match expr_of(&program[0]) {
            Expr::Binary(BinaryOp::Sub, lhs, rhs) => {
                assert!(matches!(lhs.expr, Expr::Binary(BinaryOp::Sub, _, _)));
                assert_eq!(rhs.expr, Expr::Literal(Literal::Number(2.into())));
            }
            expr => panic!("unexpected expression {:?}", expr),
        }
    }

    #[test]
    fn test_parenthesized_range_includes_parens() {
        let code = "(memo || 0) + item";
        let program = parse(code).unwrap();
        match expr_of(&program[0]) {
            Expr::Binary(BinaryOp::Add, lhs, _) => {
                assert!(matches!(lhs.expr, Expr::Logical(LogicalOp::Or, _, _)));
                assert_eq!(lhs.range.unwrap().slice(code), Some("(memo || 0)"));
            }
            expr => panic!("unexpected expression {:?}", expr),
        }
    }

    #[rstest]
    #[case::single_param("item => item.value * 2", 1, false)]
    #[case::parenthesized("(memo, item) => memo + item", 2, false)]
    #[case::no_params("() => 1", 0, false)]
    #[case::block_body("item => { return item }", 1, true)]
    fn test_arrow(#[case] code: &str, #[case] arity: usize, #[case] block: bool) {
        let program = parse(code).unwrap();
        match expr_of(&program[0]) {
            Expr::Arrow(def) => {
                assert_eq!(def.params.len(), arity);
                assert_eq!(matches!(def.body, FunctionBody::Block(_)), block);
            }
            expr => panic!("unexpected expression {:?}", expr),
        }
    }

    #[test]
    fn test_parenthesized_expression_is_not_arrow() {
        let program = parse("(a) + b").unwrap();
        assert!(matches!(
            expr_of(&program[0]),
            Expr::Binary(BinaryOp::Add, _, _)
        ));
    }

    #[test]
    fn test_function_declaration() {
        let program = parse("function map (item) { return item.value * 2 }").unwrap();
        match &program[0].kind {
            StmtKind::FunctionDecl(def) => {
                assert_eq!(def.name, Some(Ident::new("map")));
                assert_eq!(def.params.as_slice(), &[Ident::new("item")]);
            }
            kind => panic!("unexpected statement {:?}", kind),
        }
    }

    #[test]
    fn test_return_function_expression() {
        let program = parse("return function map (item) { return item }").unwrap();
        match &program[0].kind {
            StmtKind::Return(Some(node)) => assert!(node.is_function()),
            kind => panic!("unexpected statement {:?}", kind),
        }
    }

    #[test]
    fn test_return_followed_by_line_break() {
        let program = parse("function f() { return\n1 }").unwrap();
        match &program[0].kind {
            StmtKind::FunctionDecl(def) => match &def.body {
                FunctionBody::Block(block) => match &block.kind {
                    StmtKind::Block(body) => {
                        assert_eq!(body[0].kind, StmtKind::Return(None));
                        assert_eq!(body.len(), 2);
                    }
                    kind => panic!("unexpected statement {:?}", kind),
                },
                body => panic!("unexpected body {:?}", body),
            },
            kind => panic!("unexpected statement {:?}", kind),
        }
    }

    #[test]
    fn test_object_and_array_literals() {
        let program = parse("({ value: 1, 'key': [1, 2,], other })").unwrap();
        match expr_of(&program[0]) {
            Expr::Object(properties) => {
                let keys: Vec<_> = properties.iter().map(|(k, _)| k.as_str()).collect();
                assert_eq!(keys, vec!["value", "key", "other"]);
                assert!(matches!(&properties[1].1.expr, Expr::Array(items) if items.len() == 2));
            }
            expr => panic!("unexpected expression {:?}", expr),
        }
    }

    #[test]
    fn test_keyword_property_name() {
        let program = parse("a.return").unwrap();
        assert!(matches!(expr_of(&program[0]), Expr::Member(_, name) if name == "return"));
    }

    #[test]
    fn test_statement_range_includes_semicolon() {
        let code = "let a = 1; a";
        let program = parse(code).unwrap();
        assert_eq!(program[0].range.unwrap().slice(code), Some("let a = 1;"));
        assert_eq!(program[1].range.unwrap().slice(code), Some("a"));
    }

    #[rstest]
    #[case::missing_operand("1 +", "UnexpectedEOFDetected")]
    #[case::two_expressions_one_line("a b", "UnexpectedToken")]
    #[case::unclosed_call("f(1, 2", "ExpectedClosingParen")]
    #[case::unclosed_block("function f() { return 1", "ExpectedClosingBrace")]
    #[case::unclosed_index("a[1", "ExpectedClosingBracket")]
    #[case::invalid_target("1 = 2", "InvalidAssignmentTarget")]
    #[case::const_without_init("const a;", "MissingInitializer")]
    #[case::anonymous_declaration("function () {}", "ExpectedIdent")]
    #[case::stray_brace("}", "UnexpectedToken")]
    fn test_parse_errors(#[case] code: &str, #[case] expected: &str) {
        let err = parse(code).unwrap_err();
        assert!(
            format!("{:?}", err).starts_with(expected),
            "{:?} should be {}",
            err,
            expected
        );
    }

    #[test]
    fn test_return_outside_function_disallowed() {
        let options = ParserOptions {
            allow_return_outside_function: false,
            ..ParserOptions::default()
        };

        assert!(matches!(
            parse_with("return 1", &options),
            Err(ParseError::IllegalReturn(_))
        ));
        assert!(parse_with("function f() { return 1 }", &options).is_ok());
    }

    #[test]
    fn test_function_body_allows_return() {
        let options = ParserOptions {
            allow_return_outside_function: false,
            ..ParserOptions::default()
        };
        let tokens = Lexer::new(Options::default()).tokenize("return 1").unwrap();
        assert!(Parser::new(&tokens, &options).parse_function_body().is_ok());
    }

    #[test]
    fn test_semicolon_insertion_disabled() {
        let options = ParserOptions {
            semicolon_insertion: false,
            ..ParserOptions::default()
        };

        assert!(matches!(
            parse_with("var a = 1\na", &options),
            Err(ParseError::UnexpectedToken(_))
        ));
        assert!(parse_with("var a = 1;\na", &options).is_ok());
    }

    #[rstest]
    #[case::parens(format!("{}item{}", "(".repeat(20_000), ")".repeat(20_000)))]
    #[case::unary(format!("{}1", "-".repeat(20_000)))]
    #[case::binary_chain(format!("1{}", " + 1".repeat(20_000)))]
    #[case::member_chain(format!("a{}", ".b".repeat(20_000)))]
    #[case::calls(format!("f{}", "()".repeat(20_000)))]
    #[case::arrows(format!("{}1", "x => ".repeat(20_000)))]
    #[case::blocks(format!("{}{}", "{".repeat(20_000), "}".repeat(20_000)))]
    #[case::arrays(format!("{}{}", "[".repeat(20_000), "]".repeat(20_000)))]
    fn test_nesting_too_deep(#[case] code: String) {
        assert!(matches!(parse(&code), Err(ParseError::NestingTooDeep(_))));
    }

    #[rstest]
    #[case::parens(format!("{}item{}", "(".repeat(32), ")".repeat(32)))]
    #[case::binary_chain(format!("1{}", " + 1".repeat(32)))]
    #[case::blocks(format!("{}{}", "{".repeat(32), "}".repeat(32)))]
    fn test_moderate_nesting(#[case] code: String) {
        assert!(parse(&code).is_ok());
    }
}
