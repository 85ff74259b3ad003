use itertools::Itertools;

use crate::range::Range;

use super::Program;
use super::node::{Expr, FunctionBody, FunctionDef, Literal, Node, Stmt, StmtKind};

const INDENT: &str = "  ";

/// Renders a program back to source.
///
/// Statements and expressions that carry a range are copied verbatim from
/// `source`, together with the text between neighbouring statements, so an
/// unmodified program prints back exactly as it was written. Nodes without a
/// range were synthesized and are printed from their structure.
pub struct Printer<'a> {
    source: &'a str,
}

impl<'a> Printer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { source }
    }

    pub fn print(&self, program: &Program) -> String {
        if program.is_empty() {
            return self.source.to_string();
        }

        let mut buf = String::with_capacity(self.source.len() + 16);

        if let Some(leading) = program
            .first()
            .and_then(|stmt| stmt.range)
            .and_then(|range| self.source.get(..range.start.offset))
        {
            buf.push_str(leading);
        }

        self.format_statements(program, &mut buf, 0);

        if let Some(trailing) = program
            .last()
            .and_then(|stmt| stmt.range)
            .and_then(|range| self.source.get(range.end.offset..))
        {
            buf.push_str(trailing);
        }

        buf
    }

    /// Renders a single statement.
    pub fn print_stmt(&self, stmt: &Stmt) -> String {
        let mut buf = String::new();
        self.format_stmt(stmt, &mut buf, 0);
        buf
    }

    #[inline(always)]
    fn verbatim(&self, range: Option<Range>) -> Option<&'a str> {
        range.and_then(|range| range.slice(self.source))
    }

    /// Text separating two consecutive statements.
    fn gap(&self, prev: &Stmt, next: &Stmt, indent: usize) -> String {
        match (prev.range, next.range) {
            (Some(prev), Some(next)) if prev.end.offset <= next.start.offset => self
                .source
                .get(prev.end.offset..next.start.offset)
                .map(ToString::to_string)
                .unwrap_or_else(|| newline(indent)),
            _ => newline(indent),
        }
    }

    fn format_statements(&self, program: &Program, buf: &mut String, indent: usize) {
        for (i, stmt) in program.iter().enumerate() {
            if i > 0 {
                buf.push_str(&self.gap(&program[i - 1], stmt, indent));
            }
            self.format_stmt(stmt, buf, indent);
        }
    }

    fn format_stmt(&self, stmt: &Stmt, buf: &mut String, indent: usize) {
        if let Some(text) = self.verbatim(stmt.range) {
            buf.push_str(text);
            return;
        }

        match &stmt.kind {
            StmtKind::VarDecl(kind, declarators) => {
                buf.push_str(&kind.to_string());
                buf.push(' ');
                for (i, declarator) in declarators.iter().enumerate() {
                    if i > 0 {
                        buf.push_str(", ");
                    }
                    buf.push_str(&declarator.ident.name);
                    if let Some(init) = &declarator.init {
                        buf.push_str(" = ");
                        self.format_node(init, buf, indent);
                    }
                }
                buf.push(';');
            }
            StmtKind::FunctionDecl(def) => self.format_function(def, buf, indent),
            StmtKind::Return(Some(argument)) => {
                buf.push_str("return ");
                self.format_node(argument, buf, indent);
                buf.push(';');
            }
            StmtKind::Return(None) => buf.push_str("return;"),
            StmtKind::If(test, consequent, alternate) => {
                buf.push_str("if (");
                self.format_node(test, buf, indent);
                buf.push_str(") ");
                self.format_stmt(consequent, buf, indent);
                if let Some(alternate) = alternate {
                    buf.push_str(" else ");
                    self.format_stmt(alternate, buf, indent);
                }
            }
            StmtKind::While(test, body) => {
                buf.push_str("while (");
                self.format_node(test, buf, indent);
                buf.push_str(") ");
                self.format_stmt(body, buf, indent);
            }
            StmtKind::Block(program) if program.is_empty() => buf.push_str("{}"),
            StmtKind::Block(program) => {
                buf.push('{');
                buf.push_str(&newline(indent + 1));
                self.format_statements(program, buf, indent + 1);
                buf.push_str(&newline(indent));
                buf.push('}');
            }
            // A statement starting with `function` or `{` would be read back
            // as a declaration or a block.
            StmtKind::Expr(node) if matches!(node.expr, Expr::Function(_) | Expr::Object(_)) => {
                buf.push('(');
                self.format_node(node, buf, indent);
                buf.push_str(");");
            }
            StmtKind::Expr(node) => {
                self.format_node(node, buf, indent);
                buf.push(';');
            }
            StmtKind::Empty => buf.push(';'),
        }
    }

    fn format_function(&self, def: &FunctionDef, buf: &mut String, indent: usize) {
        buf.push_str("function");
        if let Some(name) = &def.name {
            buf.push(' ');
            buf.push_str(&name.name);
        }
        buf.push('(');
        buf.push_str(&def.params.iter().map(|p| p.name.as_str()).join(", "));
        buf.push_str(") ");
        self.format_body(&def.body, buf, indent);
    }

    fn format_body(&self, body: &FunctionBody, buf: &mut String, indent: usize) {
        match body {
            FunctionBody::Block(block) => self.format_stmt(block, buf, indent),
            FunctionBody::Expr(node) if matches!(node.expr, Expr::Object(_)) => {
                buf.push('(');
                self.format_node(node, buf, indent);
                buf.push(')');
            }
            FunctionBody::Expr(node) => self.format_node(node, buf, indent),
        }
    }

    /// Formats `node`, parenthesized when it is an operator expression.
    fn format_operand(&self, node: &Node, buf: &mut String, indent: usize) {
        if is_compound(node) {
            buf.push('(');
            self.format_node(node, buf, indent);
            buf.push(')');
        } else {
            self.format_node(node, buf, indent);
        }
    }

    fn format_node(&self, node: &Node, buf: &mut String, indent: usize) {
        if let Some(text) = self.verbatim(node.range) {
            buf.push_str(text);
            return;
        }

        match &node.expr {
            Expr::Literal(literal) => format_literal(literal, buf),
            Expr::Ident(ident) => buf.push_str(&ident.name),
            Expr::Array(items) => {
                buf.push('[');
                self.format_args(items, buf, indent);
                buf.push(']');
            }
            Expr::Object(properties) if properties.is_empty() => buf.push_str("{}"),
            Expr::Object(properties) => {
                buf.push_str("{ ");
                for (i, (key, value)) in properties.iter().enumerate() {
                    if i > 0 {
                        buf.push_str(", ");
                    }
                    if is_identifier(key) {
                        buf.push_str(key);
                    } else {
                        format_string(key, buf);
                    }
                    buf.push_str(": ");
                    self.format_node(value, buf, indent);
                }
                buf.push_str(" }");
            }
            Expr::Member(object, name) => {
                self.format_operand(object, buf, indent);
                buf.push('.');
                buf.push_str(name);
            }
            Expr::Index(object, index) => {
                self.format_operand(object, buf, indent);
                buf.push('[');
                self.format_node(index, buf, indent);
                buf.push(']');
            }
            Expr::Call(callee, args) => {
                self.format_operand(callee, buf, indent);
                buf.push('(');
                self.format_args(args, buf, indent);
                buf.push(')');
            }
            Expr::Unary(op, operand) => {
                buf.push_str(&op.to_string());
                self.format_operand(operand, buf, indent);
            }
            Expr::Binary(op, lhs, rhs) => {
                self.format_operand(lhs, buf, indent);
                buf.push_str(&format!(" {} ", op));
                self.format_operand(rhs, buf, indent);
            }
            Expr::Logical(op, lhs, rhs) => {
                self.format_operand(lhs, buf, indent);
                buf.push_str(&format!(" {} ", op));
                self.format_operand(rhs, buf, indent);
            }
            Expr::Conditional(test, consequent, alternate) => {
                self.format_operand(test, buf, indent);
                buf.push_str(" ? ");
                self.format_operand(consequent, buf, indent);
                buf.push_str(" : ");
                self.format_operand(alternate, buf, indent);
            }
            Expr::Assign(op, target, value) => {
                self.format_node(target, buf, indent);
                buf.push_str(&format!(" {} ", op));
                self.format_operand(value, buf, indent);
            }
            Expr::Function(def) => self.format_function(def, buf, indent),
            Expr::Arrow(def) => {
                buf.push('(');
                buf.push_str(&def.params.iter().map(|p| p.name.as_str()).join(", "));
                buf.push_str(") => ");
                self.format_body(&def.body, buf, indent);
            }
        }
    }

    fn format_args(&self, args: &[crate::Shared<Node>], buf: &mut String, indent: usize) {
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                buf.push_str(", ");
            }
            self.format_node(arg, buf, indent);
        }
    }
}

#[inline(always)]
fn newline(indent: usize) -> String {
    format!("\n{}", INDENT.repeat(indent))
}

fn is_compound(node: &Node) -> bool {
    matches!(
        node.expr,
        Expr::Unary(_, _)
            | Expr::Binary(_, _, _)
            | Expr::Logical(_, _, _)
            | Expr::Conditional(_, _, _)
            | Expr::Assign(_, _, _)
            | Expr::Function(_)
            | Expr::Arrow(_)
    )
}

fn is_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

fn format_literal(literal: &Literal, buf: &mut String) {
    match literal {
        Literal::String(s) => format_string(s, buf),
        Literal::Number(n) if n.value() < 0.0 => buf.push_str(&format!("({})", n)),
        Literal::Number(n) => buf.push_str(&n.to_string()),
        Literal::Bool(b) => buf.push_str(&b.to_string()),
        Literal::Null => buf.push_str("null"),
    }
}

fn format_string(s: &str, buf: &mut String) {
    buf.push('"');
    for c in s.chars() {
        match c {
            '"' => buf.push_str("\\\""),
            '\\' => buf.push_str("\\\\"),
            '\n' => buf.push_str("\\n"),
            '\r' => buf.push_str("\\r"),
            '\t' => buf.push_str("\\t"),
            c if c.is_control() => buf.push_str(&format!("\\u{:04x}", c as u32)),
            c => buf.push(c),
        }
    }
    buf.push('"');
}
