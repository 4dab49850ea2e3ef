//! Recursive-descent parser producing [`crate::ast`] nodes.
//!
//! No parser-generator crate is used; this is a hand-rolled recursive
//! descent parser over the token stream. Parsing rejects constructs outside
//! the restricted grammar with `SandboxError::ForbiddenSyntax` rather than
//! a generic parse error, so the
//! agent loop can tell "you wrote something outside the sandbox" apart from
//! "you made a typo".

use crate::ast::*;
use crate::error::{ExceptionKind, SandboxError};
use crate::lexer::{lex, Token, TokenKind};

const FORBIDDEN_KEYWORDS: &[&str] = &["yield", "async", "await", "global", "nonlocal", "lambda"];

pub fn parse(source: &str) -> Result<Block, SandboxError> {
    let tokens = lex(source)?;
    let mut parser = Parser { tokens, pos: 0 };
    let block = parser.parse_block_top()?;
    Ok(block)
}

/// Parse a single expression (used to splice `{expr}` fragments out of
/// f-string literals).
pub fn parse_expr_standalone(source: &str) -> Result<Expr, SandboxError> {
    let tokens = lex(source)?;
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.parse_expr()?;
    Ok(expr)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn cur(&self) -> &TokenKind {
        &self.tokens[self.pos.min(self.tokens.len() - 1)].kind
    }

    fn cur_pos(&self) -> (usize, usize) {
        let t = &self.tokens[self.pos.min(self.tokens.len() - 1)];
        (t.line, t.col)
    }

    fn advance(&mut self) -> TokenKind {
        let k = self.cur().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        k
    }

    fn check_ident(&self, word: &str) -> bool {
        matches!(self.cur(), TokenKind::Ident(s) if s == word)
    }

    fn eat_ident(&mut self, word: &str) -> Result<(), SandboxError> {
        if self.check_ident(word) {
            self.advance();
            Ok(())
        } else {
            let (line, col) = self.cur_pos();
            Err(SandboxError::ParseError {
                    line,
                    col,
                    message: format!("expected '{word}'"),
            })
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<(), SandboxError> {
        if std::mem::discriminant(self.cur()) == std::mem::discriminant(kind) {
            self.advance();
            Ok(())
        } else {
            let (line, col) = self.cur_pos();
            Err(SandboxError::ParseError {
                    line,
                    col,
                    message: format!("expected {kind:?}, got {:?}", self.cur()),
            })
        }
    }

    fn skip_newlines(&mut self) {
        while matches!(self.cur(), TokenKind::Newline) {
            self.advance();
        }
    }

    fn forbid_keyword_check(&self) -> Result<(), SandboxError> {
        if let TokenKind::Ident(name) = self.cur() {
            if FORBIDDEN_KEYWORDS.contains(&name.as_str()) {
                let (line, col) = self.cur_pos();
                return Err(SandboxError::ForbiddenSyntax {
                        line,
                        col,
                        message: format!("'{name}' is outside the restricted grammar"),
                });
            }
        }
        Ok(())
    }

    // ---- blocks ----

    fn parse_block_top(&mut self) -> Result<Block, SandboxError> {
        let mut stmts = Vec::new();
        self.skip_newlines();
        while !matches!(self.cur(), TokenKind::Eof) {
            stmts.push(self.parse_stmt()?);
            self.skip_newlines();
        }
        Ok(stmts)
    }

    fn parse_suite(&mut self) -> Result<Block, SandboxError> {
        self.expect(&TokenKind::Colon)?;
        self.skip_newlines();
        if matches!(self.cur(), TokenKind::Indent) {
            self.advance();
            let mut stmts = Vec::new();
            self.skip_newlines();
            while !matches!(self.cur(), TokenKind::Dedent | TokenKind::Eof) {
                stmts.push(self.parse_stmt()?);
                self.skip_newlines();
            }
            if matches!(self.cur(), TokenKind::Dedent) {
                self.advance();
            }
            Ok(stmts)
        } else {
            // single-line suite: `if x: return 1`
            let stmt = self.parse_stmt()?;
            Ok(vec![stmt])
        }
    }

    // ---- statements ----

    fn parse_stmt(&mut self) -> Result<Stmt, SandboxError> {
        self.forbid_keyword_check()?;
        if let TokenKind::Ident(name) = self.cur().clone() {
            match name.as_str() {
                "if" => return self.parse_if(),
                "while" => return self.parse_while(),
                "for" => return self.parse_for(),
                "def" => return self.parse_funcdef(),
                "class" => return self.parse_classdef(),
                "import" => return self.parse_import(),
                "with" => return self.parse_with(),
                "try" => return self.parse_try(),
                "return" => {
                    self.advance();
                    if matches!(self.cur(), TokenKind::Newline | TokenKind::Eof | TokenKind::Dedent) {
                        return Ok(Stmt::Return(None));
                    }
                    let e = self.parse_expr()?;
                    return Ok(Stmt::Return(Some(e)));
                }
                "break" => {
                    self.advance();
                    return Ok(Stmt::Break);
                }
                "continue" => {
                    self.advance();
                    return Ok(Stmt::Continue);
                }
                "pass" => {
                    self.advance();
                    return Ok(Stmt::Pass);
                }
                _ => {}
            }
        }
        self.parse_expr_or_assign_stmt()
    }

    fn parse_if(&mut self) -> Result<Stmt, SandboxError> {
        self.eat_ident("if")?;
        let cond = self.parse_expr()?;
        let body = self.parse_suite()?;
        let mut branches = vec![(cond, body)];
        let mut orelse = None;
        loop {
            if self.check_ident("elif") {
                self.advance();
                let cond = self.parse_expr()?;
                let body = self.parse_suite()?;
                branches.push((cond, body));
                continue;
            }
            if self.check_ident("else") {
                self.advance();
                orelse = Some(self.parse_suite()?);
            }
            break;
        }
        Ok(Stmt::If { branches, orelse })
    }

    fn parse_while(&mut self) -> Result<Stmt, SandboxError> {
        self.eat_ident("while")?;
        let cond = self.parse_expr()?;
        let body = self.parse_suite()?;
        Ok(Stmt::While { cond, body })
    }

    fn parse_for(&mut self) -> Result<Stmt, SandboxError> {
        self.eat_ident("for")?;
        let target = self.parse_target()?;
        self.eat_ident("in")?;
        let iter = self.parse_expr()?;
        let body = self.parse_suite()?;
        Ok(Stmt::For { target, iter, body })
    }

    fn parse_funcdef(&mut self) -> Result<Stmt, SandboxError> {
        self.eat_ident("def")?;
        let name = self.expect_name()?;
        self.expect(&TokenKind::LParen)?;
        let mut params = Vec::new();
        while !matches!(self.cur(), TokenKind::RParen) {
            let pname = self.expect_name()?;
            // Optional type annotation, parsed and discarded: `x: int`.
            if matches!(self.cur(), TokenKind::Colon) {
                self.advance();
                self.expect_name()?;
            }
            params.push(pname);
            if matches!(self.cur(), TokenKind::Comma) {
                self.advance();
            } else {
                break;
            }
        }
        self.expect(&TokenKind::RParen)?;
        if matches!(self.cur(), TokenKind::Arrow) {
            self.advance();
            self.expect_name()?;
        }
        let body = self.parse_suite()?;
        Ok(Stmt::FuncDef { name, params, body })
    }

    /// `class Name:` with field-only bodies. A non-empty parameter
    /// list after the name means inheritance, which is forbidden syntax.
    fn parse_classdef(&mut self) -> Result<Stmt, SandboxError> {
        let (line, col) = self.cur_pos();
        self.eat_ident("class")?;
        let name = self.expect_name()?;
        if matches!(self.cur(), TokenKind::LParen) {
            self.advance();
            if !matches!(self.cur(), TokenKind::RParen) {
                return Err(SandboxError::ForbiddenSyntax {
                        line,
                        col,
                        message: "class inheritance is not permitted".to_string(),
                });
            }
            self.advance();
        }
        self.expect(&TokenKind::Colon)?;
        self.skip_newlines();
        let mut fields = Vec::new();
        if matches!(self.cur(), TokenKind::Indent) {
            self.advance();
            self.skip_newlines();
            while !matches!(self.cur(), TokenKind::Dedent | TokenKind::Eof) {
                if self.check_ident("pass") {
                    self.advance();
                } else {
                    let fname = self.expect_name()?;
                    if matches!(self.cur(), TokenKind::Colon) {
                        self.advance();
                        self.expect_name()?;
                    }
                    fields.push(fname);
                }
                self.skip_newlines();
            }
            if matches!(self.cur(), TokenKind::Dedent) {
                self.advance();
            }
        }
        Ok(Stmt::RecordDef { name, fields })
    }

    fn parse_import(&mut self) -> Result<Stmt, SandboxError> {
        self.eat_ident("import")?;
        let name = self.expect_name()?;
        let mut alias = None;
        if self.check_ident("as") {
            self.advance();
            alias = Some(self.expect_name()?);
        }
        Ok(Stmt::Import { name, alias })
    }

    /// `with expr as name[, expr as name...]:`.
    /// Multiple comma-separated items share the one suite, matching the
    /// source language's own multi-item `with` sugar.
    fn parse_with(&mut self) -> Result<Stmt, SandboxError> {
        self.eat_ident("with")?;
        let mut items = Vec::new();
        loop {
            let context = self.parse_expr()?;
            let mut binding = None;
            if self.check_ident("as") {
                self.advance();
                binding = Some(self.expect_name()?);
            }
            items.push(WithItem { context, binding });
            if matches!(self.cur(), TokenKind::Comma) {
                self.advance();
                continue;
            }
            break;
        }
        let body = self.parse_suite()?;
        Ok(Stmt::With { items, body })
    }

    fn parse_try(&mut self) -> Result<Stmt, SandboxError> {
        self.eat_ident("try")?;
        let body = self.parse_suite()?;
        let mut handlers = Vec::new();
        while self.check_ident("except") {
            let (line, col) = self.cur_pos();
            self.advance();
            let mut kind = None;
            let mut bind = None;
            if !matches!(self.cur(), TokenKind::Colon) {
                let name = self.expect_name()?;
                if ExceptionKind::from_name(&name).is_none() {
                    return Err(SandboxError::ForbiddenSyntax {
                            line,
                            col,
                            message: format!("unrecognised exception class '{name}'"),
                    });
                }
                kind = Some(name);
                if self.check_ident("as") {
                    self.advance();
                    bind = Some(self.expect_name()?);
                }
            } else {
                return Err(SandboxError::ForbiddenSyntax {
                        line,
                        col,
                        message: "bare 'except:' is not permitted; name an exception class".to_string(),
                });
            }
            let handler_body = self.parse_suite()?;
            handlers.push(ExceptHandler {
                    kind,
                    bind,
                    body: handler_body,
            });
        }
        let mut orelse = None;
        if self.check_ident("else") {
            self.advance();
            orelse = Some(self.parse_suite()?);
        }
        let mut finally = None;
        if self.check_ident("finally") {
            self.advance();
            finally = Some(self.parse_suite()?);
        }
        Ok(Stmt::Try {
                body,
                handlers,
                orelse,
                finally,
        })
    }

    fn parse_expr_or_assign_stmt(&mut self) -> Result<Stmt, SandboxError> {
        let first = self.parse_expr_list()?;
        let aug = self.peek_aug_assign();
        if let Some(op) = aug {
            self.advance();
            let target = expr_to_target(first)?;
            let value = self.parse_expr_list()?;
            return Ok(Stmt::AugAssign { target, op, value });
        }
        if matches!(self.cur(), TokenKind::Assign) {
            self.advance();
            let value = self.parse_expr_list()?;
            let target = expr_to_target(first)?;
            return Ok(Stmt::Assign {
                    targets: vec![target],
                    value,
            });
        }
        Ok(Stmt::Expr(first))
    }

    fn peek_aug_assign(&self) -> Option<BinOp> {
        match self.cur() {
            TokenKind::PlusAssign => Some(BinOp::Add),
            TokenKind::MinusAssign => Some(BinOp::Sub),
            TokenKind::StarAssign => Some(BinOp::Mul),
            TokenKind::SlashAssign => Some(BinOp::Div),
            TokenKind::PercentAssign => Some(BinOp::Mod),
            _ => None,
        }
    }

    /// One expr, or a bare comma-separated tuple (`a, b = 1, 2`).
    fn parse_expr_list(&mut self) -> Result<Expr, SandboxError> {
        let first = self.parse_expr()?;
        if matches!(self.cur(), TokenKind::Comma) {
            let mut items = vec![first];
            while matches!(self.cur(), TokenKind::Comma) {
                self.advance();
                if matches!(self.cur(), TokenKind::Assign | TokenKind::Newline) {
                    break;
                }
                items.push(self.parse_expr()?);
            }
            return Ok(Expr::TupleLit(items));
        }
        Ok(first)
    }

    fn parse_target(&mut self) -> Result<Target, SandboxError> {
        let first = self.parse_postfix()?;
        if matches!(self.cur(), TokenKind::Comma) {
            let mut items = vec![expr_to_target(first)?];
            while matches!(self.cur(), TokenKind::Comma) {
                self.advance();
                if self.check_ident("in") {
                    break;
                }
                items.push(expr_to_target(self.parse_postfix()?)?);
            }
            return Ok(Target::Tuple(items));
        }
        expr_to_target(first)
    }

    fn expect_name(&mut self) -> Result<String, SandboxError> {
        match self.advance() {
            TokenKind::Ident(s) => Ok(s),
            other => {
                let (line, col) = self.cur_pos();
                Err(SandboxError::ParseError {
                        line,
                        col,
                        message: format!("expected identifier, got {other:?}"),
                })
            }
        }
    }

    // ---- expressions (precedence climbing) ----

    fn parse_expr(&mut self) -> Result<Expr, SandboxError> {
        self.parse_ternary()
    }

    fn parse_ternary(&mut self) -> Result<Expr, SandboxError> {
        let body = self.parse_or()?;
        if self.check_ident("if") {
            self.advance();
            let cond = self.parse_or()?;
            self.eat_ident("else")?;
            let orelse = self.parse_ternary()?;
            return Ok(Expr::Ternary {
                    cond: Box::new(cond),
                    body: Box::new(body),
                    orelse: Box::new(orelse),
            });
        }
        Ok(body)
    }

    fn parse_or(&mut self) -> Result<Expr, SandboxError> {
        let mut left = self.parse_and()?;
        while self.check_ident("or") {
            self.advance();
            let right = self.parse_and()?;
            left = Expr::BoolOp(BoolOp::Or, vec![left, right]);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, SandboxError> {
        let mut left = self.parse_not()?;
        while self.check_ident("and") {
            self.advance();
            let right = self.parse_not()?;
            left = Expr::BoolOp(BoolOp::And, vec![left, right]);
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Expr, SandboxError> {
        if self.check_ident("not") {
            self.advance();
            let inner = self.parse_not()?;
            return Ok(Expr::Unary(UnaryOp::Not, Box::new(inner)));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr, SandboxError> {
        let left = self.parse_arith()?;
        let mut chain = Vec::new();
        loop {
            let op = match self.cur() {
                TokenKind::Eq => Some(CmpOp::Eq),
                TokenKind::NotEq => Some(CmpOp::NotEq),
                TokenKind::Lt => Some(CmpOp::Lt),
                TokenKind::Lte => Some(CmpOp::Lte),
                TokenKind::Gt => Some(CmpOp::Gt),
                TokenKind::Gte => Some(CmpOp::Gte),
                TokenKind::Ident(s) if s == "in" => Some(CmpOp::In),
                TokenKind::Ident(s) if s == "not" => {
                    // lookahead for `not in`
                    if matches!(self.tokens.get(self.pos + 1).map(|t| &t.kind), Some(TokenKind::Ident(s2)) if s2 == "in")
                    {
                        Some(CmpOp::NotIn)
                    } else {
                        None
                    }
                }
                _ => None,
            };
            let Some(op) = op else { break };
            match op {
                CmpOp::In => {
                    self.advance();
                }
                CmpOp::NotIn => {
                    self.advance();
                    self.advance();
                }
                _ => {
                    self.advance();
                }
            }
            let rhs = self.parse_arith()?;
            chain.push((op, rhs));
        }
        if chain.is_empty() {
            Ok(left)
        } else {
            Ok(Expr::Compare(Box::new(left), chain))
        }
    }

    fn parse_arith(&mut self) -> Result<Expr, SandboxError> {
        let mut left = self.parse_term()?;
        loop {
            let op = match self.cur() {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_term()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_term(&mut self) -> Result<Expr, SandboxError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.cur() {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::DoubleSlash => BinOp::FloorDiv,
                TokenKind::Percent => BinOp::Mod,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, SandboxError> {
        match self.cur() {
            TokenKind::Minus => {
                self.advance();
                Ok(Expr::Unary(UnaryOp::Neg, Box::new(self.parse_unary()?)))
            }
            TokenKind::Plus => {
                self.advance();
                Ok(Expr::Unary(UnaryOp::Pos, Box::new(self.parse_unary()?)))
            }
            _ => self.parse_power(),
        }
    }

    fn parse_power(&mut self) -> Result<Expr, SandboxError> {
        let base = self.parse_postfix()?;
        if matches!(self.cur(), TokenKind::DoubleStar) {
            self.advance();
            let exp = self.parse_unary()?;
            return Ok(Expr::Binary(BinOp::Pow, Box::new(base), Box::new(exp)));
        }
        Ok(base)
    }

    fn parse_postfix(&mut self) -> Result<Expr, SandboxError> {
        let mut expr = self.parse_atom()?;
        loop {
            match self.cur() {
                TokenKind::Dot => {
                    self.advance();
                    let attr = self.expect_name()?;
                    expr = Expr::Attribute {
                        obj: Box::new(expr),
                        attr,
                    };
                }
                TokenKind::LParen => {
                    self.advance();
                    let mut args = Vec::new();
                    while !matches!(self.cur(), TokenKind::RParen) {
                        args.push(self.parse_expr()?);
                        if matches!(self.cur(), TokenKind::Comma) {
                            self.advance();
                        } else {
                            break;
                        }
                    }
                    self.expect(&TokenKind::RParen)?;
                    expr = Expr::Call {
                        func: Box::new(expr),
                        args,
                    };
                }
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.parse_expr()?;
                    self.expect(&TokenKind::RBracket)?;
                    expr = Expr::Index {
                        obj: Box::new(expr),
                        index: Box::new(index),
                    };
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_atom(&mut self) -> Result<Expr, SandboxError> {
        let (line, col) = self.cur_pos();
        match self.advance() {
            TokenKind::Int(i) => Ok(Expr::Literal(Literal::Int(i))),
            TokenKind::Float(f) => Ok(Expr::Literal(Literal::Float(f))),
            TokenKind::Str(s) => Ok(Expr::Literal(Literal::Str(s))),
            TokenKind::Bytes(b) => Ok(Expr::Literal(Literal::Bytes(b))),
            TokenKind::FStr(raw) => Ok(Expr::FString(crate::fstring::parse_fstring(&raw)?)),
            TokenKind::Ident(name) => match name.as_str() {
                "True" => Ok(Expr::Literal(Literal::Bool(true))),
                "False" => Ok(Expr::Literal(Literal::Bool(false))),
                "None" => Ok(Expr::Literal(Literal::Null)),
                "lambda" => Err(SandboxError::ForbiddenSyntax {
                        line,
                        col,
                        message: "'lambda' is outside the restricted grammar".to_string(),
                }),
                _ => Ok(Expr::Name(name)),
            },
            TokenKind::LParen => {
                if matches!(self.cur(), TokenKind::RParen) {
                    self.advance();
                    return Ok(Expr::TupleLit(Vec::new()));
                }
                let first = self.parse_expr()?;
                if matches!(self.cur(), TokenKind::Comma) {
                    let mut items = vec![first];
                    while matches!(self.cur(), TokenKind::Comma) {
                        self.advance();
                        if matches!(self.cur(), TokenKind::RParen) {
                            break;
                        }
                        items.push(self.parse_expr()?);
                    }
                    self.expect(&TokenKind::RParen)?;
                    return Ok(Expr::TupleLit(items));
                }
                self.expect(&TokenKind::RParen)?;
                Ok(first)
            }
            TokenKind::LBracket => {
                let mut items = Vec::new();
                while !matches!(self.cur(), TokenKind::RBracket) {
                    items.push(self.parse_expr()?);
                    if matches!(self.cur(), TokenKind::Comma) {
                        self.advance();
                    } else {
                        break;
                    }
                }
                if self.check_ident("for") {
                    return Err(SandboxError::ForbiddenSyntax {
                            line,
                            col,
                            message: "comprehensions are outside the restricted grammar".to_string(),
                    });
                }
                self.expect(&TokenKind::RBracket)?;
                Ok(Expr::List(items))
            }
            TokenKind::LBrace => {
                if matches!(self.cur(), TokenKind::RBrace) {
                    self.advance();
                    return Ok(Expr::MapLit(Vec::new()));
                }
                let first = self.parse_expr()?;
                if matches!(self.cur(), TokenKind::Colon) {
                    self.advance();
                    let first_val = self.parse_expr()?;
                    let mut entries = vec![(first, first_val)];
                    while matches!(self.cur(), TokenKind::Comma) {
                        self.advance();
                        if matches!(self.cur(), TokenKind::RBrace) {
                            break;
                        }
                        let k = self.parse_expr()?;
                        self.expect(&TokenKind::Colon)?;
                        let v = self.parse_expr()?;
                        entries.push((k, v));
                    }
                    self.expect(&TokenKind::RBrace)?;
                    Ok(Expr::MapLit(entries))
                } else {
                    let mut items = vec![first];
                    while matches!(self.cur(), TokenKind::Comma) {
                        self.advance();
                        if matches!(self.cur(), TokenKind::RBrace) {
                            break;
                        }
                        items.push(self.parse_expr()?);
                    }
                    self.expect(&TokenKind::RBrace)?;
                    Ok(Expr::SetLit(items))
                }
            }
            other => Err(SandboxError::ParseError {
                    line,
                    col,
                    message: format!("unexpected token {other:?}"),
            }),
        }
    }
}

fn expr_to_target(expr: Expr) -> Result<Target, SandboxError> {
    match expr {
        Expr::Name(n) => Ok(Target::Name(n)),
        Expr::TupleLit(items) => {
            let targets = items.into_iter().map(expr_to_target).collect::<Result<_, _>>()?;
            Ok(Target::Tuple(targets))
        }
        Expr::Attribute { obj, attr } => Ok(Target::Attribute { obj, attr }),
        Expr::Index { obj, index } => Ok(Target::Index { obj, index }),
        other => Err(SandboxError::ParseError {
                line: 0,
                col: 0,
                message: format!("{other:?} is not a valid assignment target"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_assignment() {
        let block = parse("x = 1 + 2\n").unwrap();
        assert_eq!(block.len(), 1);
        assert!(matches!(&block[0], Stmt::Assign {.. }));
    }

    #[test]
    fn parses_if_elif_else() {
        let block = parse("if x:\n y = 1\nelif z:\n y = 2\nelse:\n y = 3\n").unwrap();
        assert!(matches!(&block[0], Stmt::If { branches, orelse } if branches.len() == 2 && orelse.is_some()));
    }

    #[test]
    fn rejects_lambda() {
        let err = parse("f = lambda x: x\n").unwrap_err();
        assert!(matches!(err, SandboxError::ForbiddenSyntax {.. }));
    }

    #[test]
    fn rejects_inheritance() {
        let err = parse("class Foo(Bar):\n x: int\n").unwrap_err();
        assert!(matches!(err, SandboxError::ForbiddenSyntax {.. }));
    }

    #[test]
    fn rejects_bare_except() {
        let err = parse("try:\n x = 1\nexcept:\n pass\n").unwrap_err();
        assert!(matches!(err, SandboxError::ForbiddenSyntax {.. }));
    }

    #[test]
    fn rejects_unknown_exception_class() {
        let err = parse("try:\n x = 1\nexcept Banana:\n pass\n").unwrap_err();
        assert!(matches!(err, SandboxError::ForbiddenSyntax {.. }));
    }

    #[test]
    fn rejects_list_comprehension() {
        let err = parse("x = [i for i in xs]\n").unwrap_err();
        assert!(matches!(err, SandboxError::ForbiddenSyntax {.. }));
    }

    #[test]
    fn parses_function_def_with_type_annotations() {
        let block = parse("def add(x: int, y: int) -> int:\n return x + y\n").unwrap();
        assert!(matches!(&block[0], Stmt::FuncDef { params,.. } if params.len() == 2));
    }

    #[test]
    fn parses_record_def() {
        let block = parse("class Point:\n x: int\n y: int\n").unwrap();
        assert!(matches!(&block[0], Stmt::RecordDef { fields,.. } if fields.len() == 2));
    }

    #[test]
    fn parses_tuple_unpacking_for_target() {
        let block = parse("for k, v in items:\n pass\n").unwrap();
        assert!(matches!(&block[0], Stmt::For { target: Target::Tuple(t),.. } if t.len() == 2));
    }

    #[test]
    fn parses_with_statement_with_binding() {
        let block = parse("with open_scope() as scope:\n x = scope.value\n").unwrap();
        assert!(matches!(&block[0], Stmt::With { items,.. } if items.len() == 1 && items[0].binding.as_deref() == Some("scope")));
    }

    #[test]
    fn parses_fstring_expression_splice() {
        let block = parse("x = f\"hello {name}\"\n").unwrap();
        if let Stmt::Assign { value: Expr::FString(parts),.. } = &block[0] {
            assert_eq!(parts.len(), 2);
        } else {
            panic!("expected f-string assignment");
        }
    }
}
