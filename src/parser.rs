// recursive descent with one token of lookahead (two at the
// assignment-or-call fork). The first mismatch aborts the parse; there is
// no recovery and no second diagnostic

use crate::ast::*;
use crate::span::Span;
use crate::{Token, TokenKind};

#[derive(Debug)]
pub enum ParseError {
    // Expected, got
    Expected(&'static str, Token),
    Eof(&'static str),
}
impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ParseError::Expected(what, got) => {
                write!(f, "[ERROR] expected {}, got {}", what, got)
            }
            ParseError::Eof(parsing) => {
                write!(f, "[ERROR] unexpected end of input while parsing {}", parsing)
            }
        }
    }
}
// all relevant details are in Display and Debug
impl std::error::Error for ParseError {}

type Result<T> = std::result::Result<T, ParseError>;

/// a cursor over the reversed token list; "popping" only moves an index so
/// the underlying tokens stay put
#[derive(Clone, Copy)]
struct NoPop<'a, T: Clone> {
    vec: &'a [T],
    sp: usize,
}
impl<'a, T: Clone> NoPop<'a, T> {
    fn new(vec: &'a [T]) -> Self {
        Self { vec, sp: vec.len() }
    }
    fn pop(&mut self) -> Option<T> {
        if self.sp > 0 {
            self.sp -= 1;
            Some(self.vec[self.sp].clone())
        } else {
            None
        }
    }
    fn last(&self) -> Option<&'a T> {
        self.n(1)
    }
    fn n(&self, n: usize) -> Option<&'a T> {
        if self.sp >= n {
            self.vec.get(self.sp - n)
        } else {
            None
        }
    }
}
type Tokens<'a> = NoPop<'a, Token>;

fn expect_kind(rtokens: &mut Tokens, kind: TokenKind, what: &'static str) -> Result<Token> {
    match rtokens.pop() {
        Some(token) => {
            if token.kind == kind {
                Ok(token)
            } else {
                Err(ParseError::Expected(what, token))
            }
        }
        None => Err(ParseError::Eof(what)),
    }
}

fn expect_delimiter(rtokens: &mut Tokens, delim: &str, what: &'static str) -> Result<Token> {
    match rtokens.pop() {
        Some(token) => {
            if token.kind == TokenKind::Delimiter && token.lexeme == delim {
                Ok(token)
            } else {
                Err(ParseError::Expected(what, token))
            }
        }
        None => Err(ParseError::Eof(what)),
    }
}

fn expect_keyword(rtokens: &mut Tokens, keyword: &str, what: &'static str) -> Result<Token> {
    match rtokens.pop() {
        Some(token) => {
            if token.kind == TokenKind::Keyword && token.lexeme == keyword {
                Ok(token)
            } else {
                Err(ParseError::Expected(what, token))
            }
        }
        None => Err(ParseError::Eof(what)),
    }
}

fn peek_delimiter(rtokens: &Tokens, delim: &str) -> bool {
    matches!(rtokens.last(),
        Some(t) if t.kind == TokenKind::Delimiter && t.lexeme == delim)
}

fn peek_keyword(rtokens: &Tokens, keyword: &str) -> bool {
    matches!(rtokens.last(),
        Some(t) if t.kind == TokenKind::Keyword && t.lexeme == keyword)
}

/// the operator starting the next token, if it is one of `ops`
fn peek_operator(rtokens: &Tokens, ops: &[&str]) -> Option<BinOp> {
    match rtokens.last() {
        Some(t) if t.kind == TokenKind::Operator && ops.contains(&t.lexeme.as_str()) => {
            BinOp::from_lexeme(&t.lexeme)
        }
        _ => None,
    }
}

fn name_span(token: Token) -> NameSpan {
    NameSpan { name: token.lexeme, span: token.span }
}

fn binary(op: BinOp, left: Expression, right: Expression) -> Expression {
    let span = Span::set(vec![left.full_span(), right.full_span()]);
    Expression::Binary(Box::new(BinaryExpr { op, left, right, span }))
}

pub fn parse(mut tokens: Vec<Token>) -> Result<Ast> {
    tokens.reverse();
    let mut rtokens = NoPop::new(&tokens);
    let mut statements = Vec::new();
    while rtokens.last().is_some() {
        statements.push(parse_statement(&mut rtokens)?);
    }
    Ok(statements)
}

fn parse_statement(rtokens: &mut Tokens) -> Result<Statement> {
    let token = match rtokens.last() {
        Some(t) => t,
        None => return Err(ParseError::Eof("statement")),
    };
    match token.kind {
        TokenKind::Keyword => match token.lexeme.as_str() {
            "var" => parse_var_decl(rtokens),
            "if" => parse_if(rtokens),
            "while" => parse_while(rtokens),
            "print" | "input" => parse_io(rtokens),
            "function" => parse_function_def(rtokens),
            "return" => parse_return(rtokens),
            _ => Err(ParseError::Expected("statement", token.clone())),
        },
        TokenKind::Identifier => parse_assign_or_call(rtokens),
        _ => Err(ParseError::Expected("statement", token.clone())),
    }
}

fn parse_var_decl(rtokens: &mut Tokens) -> Result<Statement> {
    expect_keyword(rtokens, "var", "declaration")?;
    let id = expect_kind(rtokens, TokenKind::Identifier, "variable name")?;
    expect_delimiter(rtokens, ";", "';' after declaration")?;
    Ok(Statement::VarDecl(name_span(id)))
}

fn parse_assign_or_call(rtokens: &mut Tokens) -> Result<Statement> {
    match rtokens.n(2) {
        Some(t) if t.kind == TokenKind::Assign => {
            let id = expect_kind(rtokens, TokenKind::Identifier, "assignment target")?;
            expect_kind(rtokens, TokenKind::Assign, "'='")?;
            let rvalue = parse_expression(rtokens)?;
            expect_delimiter(rtokens, ";", "';' after assignment")?;
            let span = Span::set(vec![id.span, rvalue.full_span()]);
            Ok(Statement::Assign(Assign { target: name_span(id), rvalue, span }))
        }
        Some(t) if t.kind == TokenKind::Delimiter && t.lexeme == "(" => {
            let call = parse_call(rtokens)?;
            // a trailing semicolon after a call statement is allowed, not required
            if peek_delimiter(rtokens, ";") {
                rtokens.pop();
            }
            Ok(Statement::FnCall(call))
        }
        Some(t) => Err(ParseError::Expected("'=' or '(' after identifier", t.clone())),
        None => Err(ParseError::Eof("statement")),
    }
}

fn parse_if(rtokens: &mut Tokens) -> Result<Statement> {
    let kw = expect_keyword(rtokens, "if", "if statement")?;
    expect_delimiter(rtokens, "(", "'(' after if")?;
    let condition = parse_expression(rtokens)?;
    expect_delimiter(rtokens, ")", "')' after condition")?;
    expect_delimiter(rtokens, "{", "'{' to open if body")?;
    let then_block = parse_block(rtokens)?;
    let mut close = expect_delimiter(rtokens, "}", "'}' to close if body")?;
    let mut else_block = None;
    if peek_keyword(rtokens, "else") {
        rtokens.pop();
        expect_delimiter(rtokens, "{", "'{' to open else body")?;
        else_block = Some(parse_block(rtokens)?);
        close = expect_delimiter(rtokens, "}", "'}' to close else body")?;
    }
    Ok(Statement::If(If {
        condition,
        then_block,
        else_block,
        span: Span::set(vec![kw.span, close.span]),
    }))
}

fn parse_while(rtokens: &mut Tokens) -> Result<Statement> {
    let kw = expect_keyword(rtokens, "while", "while statement")?;
    expect_delimiter(rtokens, "(", "'(' after while")?;
    let condition = parse_expression(rtokens)?;
    expect_delimiter(rtokens, ")", "')' after condition")?;
    expect_delimiter(rtokens, "{", "'{' to open loop body")?;
    let body = parse_block(rtokens)?;
    let close = expect_delimiter(rtokens, "}", "'}' to close loop body")?;
    Ok(Statement::While(While { condition, body, span: Span::set(vec![kw.span, close.span]) }))
}

fn parse_io(rtokens: &mut Tokens) -> Result<Statement> {
    let kw = rtokens.pop().expect("io statement dispatched without a keyword");
    expect_delimiter(rtokens, "(", "'(' after print/input")?;
    let operand = parse_expression(rtokens)?;
    expect_delimiter(rtokens, ")", "')' after operand")?;
    expect_delimiter(rtokens, ";", "';' after print/input")?;
    Ok(if kw.lexeme == "print" {
        Statement::Print(operand)
    } else {
        Statement::Input(operand)
    })
}

fn parse_function_def(rtokens: &mut Tokens) -> Result<Statement> {
    let kw = expect_keyword(rtokens, "function", "function definition")?;
    let id = expect_kind(rtokens, TokenKind::Identifier, "function name")?;
    expect_delimiter(rtokens, "(", "'(' after function name")?;
    let mut params = Vec::new();
    if !peek_delimiter(rtokens, ")") {
        loop {
            let param = expect_kind(rtokens, TokenKind::Identifier, "parameter name")?;
            params.push(name_span(param));
            if peek_delimiter(rtokens, ",") {
                rtokens.pop();
                continue;
            }
            break;
        }
    }
    expect_delimiter(rtokens, ")", "')' after parameters")?;
    expect_delimiter(rtokens, "{", "'{' to open function body")?;
    let body = parse_block(rtokens)?;
    let close = expect_delimiter(rtokens, "}", "'}' to close function body")?;
    Ok(Statement::FunctionDef(FunctionDef {
        name: name_span(id),
        params,
        body,
        span: Span::set(vec![kw.span, close.span]),
    }))
}

fn parse_return(rtokens: &mut Tokens) -> Result<Statement> {
    expect_keyword(rtokens, "return", "return statement")?;
    let value = if peek_delimiter(rtokens, ";") {
        None
    } else {
        Some(parse_expression(rtokens)?)
    };
    expect_delimiter(rtokens, ";", "';' after return")?;
    Ok(Statement::Return(value))
}

/// statements up to (not including) the closing brace; the caller consumes it
fn parse_block(rtokens: &mut Tokens) -> Result<Block> {
    let mut statements = Vec::new();
    loop {
        if peek_delimiter(rtokens, "}") {
            return Ok(statements);
        }
        if rtokens.last().is_none() {
            return Err(ParseError::Eof("block"));
        }
        statements.push(parse_statement(rtokens)?);
    }
}

fn parse_expression(rtokens: &mut Tokens) -> Result<Expression> {
    parse_or(rtokens)
}

fn parse_or(rtokens: &mut Tokens) -> Result<Expression> {
    let mut left = parse_and(rtokens)?;
    while let Some(op) = peek_operator(rtokens, &["||"]) {
        rtokens.pop();
        let right = parse_and(rtokens)?;
        left = binary(op, left, right);
    }
    Ok(left)
}

fn parse_and(rtokens: &mut Tokens) -> Result<Expression> {
    let mut left = parse_comparison(rtokens)?;
    while let Some(op) = peek_operator(rtokens, &["&&"]) {
        rtokens.pop();
        let right = parse_comparison(rtokens)?;
        left = binary(op, left, right);
    }
    Ok(left)
}

fn parse_comparison(rtokens: &mut Tokens) -> Result<Expression> {
    let mut left = parse_additive(rtokens)?;
    while let Some(op) = peek_operator(rtokens, &["==", "!=", "<", ">", "<=", ">="]) {
        rtokens.pop();
        let right = parse_additive(rtokens)?;
        left = binary(op, left, right);
    }
    Ok(left)
}

fn parse_additive(rtokens: &mut Tokens) -> Result<Expression> {
    let mut left = parse_term(rtokens)?;
    while let Some(op) = peek_operator(rtokens, &["+", "-"]) {
        rtokens.pop();
        let right = parse_term(rtokens)?;
        left = binary(op, left, right);
    }
    Ok(left)
}

fn parse_term(rtokens: &mut Tokens) -> Result<Expression> {
    let mut left = parse_unary(rtokens)?;
    while let Some(op) = peek_operator(rtokens, &["*", "/"]) {
        rtokens.pop();
        let right = parse_unary(rtokens)?;
        left = binary(op, left, right);
    }
    Ok(left)
}

fn parse_unary(rtokens: &mut Tokens) -> Result<Expression> {
    match rtokens.last() {
        Some(t) if t.kind == TokenKind::Operator && t.lexeme == "!" => {
            let bang = rtokens.pop().expect("peeked token vanished");
            let inner = parse_unary(rtokens)?;
            // !e is e == 0
            let zero = Expression::Number(Literal { text: "0".to_string(), span: bang.span });
            Ok(binary(BinOp::Eq, inner, zero))
        }
        Some(t) if t.kind == TokenKind::Operator && t.lexeme == "-" => {
            let minus = rtokens.pop().expect("peeked token vanished");
            match rtokens.last() {
                // a minus in front of a number is part of the literal
                Some(t) if t.kind == TokenKind::Number => {
                    let num = rtokens.pop().expect("peeked token vanished");
                    Ok(Expression::Number(Literal {
                        text: format!("-{}", num.lexeme),
                        span: Span::set(vec![minus.span, num.span]),
                    }))
                }
                _ => {
                    let inner = parse_unary(rtokens)?;
                    let zero = Expression::Number(Literal { text: "0".to_string(), span: minus.span });
                    Ok(binary(BinOp::Sub, zero, inner))
                }
            }
        }
        _ => parse_primary(rtokens),
    }
}

fn parse_primary(rtokens: &mut Tokens) -> Result<Expression> {
    let token = match rtokens.last() {
        Some(t) => t,
        None => return Err(ParseError::Eof("expression")),
    };
    match token.kind {
        TokenKind::Number => {
            let t = rtokens.pop().expect("peeked token vanished");
            Ok(Expression::Number(Literal { text: t.lexeme, span: t.span }))
        }
        TokenKind::Str => {
            let t = rtokens.pop().expect("peeked token vanished");
            Ok(Expression::Str(Literal { text: t.lexeme, span: t.span }))
        }
        TokenKind::Identifier => match rtokens.n(2) {
            Some(t) if t.kind == TokenKind::Delimiter && t.lexeme == "(" => {
                Ok(Expression::Call(parse_call(rtokens)?))
            }
            _ => {
                let t = rtokens.pop().expect("peeked token vanished");
                Ok(Expression::Identifier(name_span(t)))
            }
        },
        TokenKind::Delimiter if token.lexeme == "(" => {
            rtokens.pop();
            let inner = parse_expression(rtokens)?;
            expect_delimiter(rtokens, ")", "')' to close expression")?;
            Ok(inner)
        }
        _ => Err(ParseError::Expected("expression", token.clone())),
    }
}

fn parse_call(rtokens: &mut Tokens) -> Result<FnCall> {
    let id = expect_kind(rtokens, TokenKind::Identifier, "function name")?;
    expect_delimiter(rtokens, "(", "'(' to open arguments")?;
    let mut args = Vec::new();
    if !peek_delimiter(rtokens, ")") {
        loop {
            args.push(parse_expression(rtokens)?);
            if peek_delimiter(rtokens, ",") {
                rtokens.pop();
                continue;
            }
            break;
        }
    }
    let close = expect_delimiter(rtokens, ")", "')' to close arguments")?;
    let id_span = id.span;
    Ok(FnCall { name: name_span(id), args, span: Span::set(vec![id_span, close.span]) })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::lexer::lex;

    fn parse_source(source: &str) -> Ast {
        parse(lex(source).expect("lex error in test")).expect("parse error in test")
    }

    #[test]
    fn declare_then_assign() {
        let ast = parse_source("var a; a = 5;");
        assert_eq!(ast.len(), 2);
        match &ast[0] {
            Statement::VarDecl(id) => assert_eq!(id.name, "a"),
            other => panic!("expected declaration, got {:?}", other),
        }
        match &ast[1] {
            Statement::Assign(assign) => {
                assert_eq!(assign.target.name, "a");
                match &assign.rvalue {
                    Expression::Number(lit) => assert_eq!(lit.text, "5"),
                    other => panic!("expected number, got {:?}", other),
                }
            }
            other => panic!("expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let ast = parse_source("var x; x = 1 + 2 * 3;");
        let rvalue = match &ast[1] {
            Statement::Assign(assign) => &assign.rvalue,
            other => panic!("expected assignment, got {:?}", other),
        };
        match rvalue {
            Expression::Binary(add) => {
                assert_eq!(add.op, BinOp::Add);
                match &add.right {
                    Expression::Binary(mul) => assert_eq!(mul.op, BinOp::Mul),
                    other => panic!("expected nested product, got {:?}", other),
                }
            }
            other => panic!("expected sum, got {:?}", other),
        }
    }

    #[test]
    fn comparison_binds_looser_than_addition() {
        let ast = parse_source("var x; x = 1 + 2 > 3 - 1;");
        let rvalue = match &ast[1] {
            Statement::Assign(assign) => &assign.rvalue,
            other => panic!("expected assignment, got {:?}", other),
        };
        match rvalue {
            Expression::Binary(cmp) => assert_eq!(cmp.op, BinOp::Gt),
            other => panic!("expected comparison at the root, got {:?}", other),
        }
    }

    #[test]
    fn if_else_blocks() {
        let ast = parse_source("if (a > 1) { print(a); } else { print(1); }");
        match &ast[0] {
            Statement::If(stmt) => {
                assert_eq!(stmt.then_block.len(), 1);
                assert_eq!(stmt.else_block.as_ref().map(Vec::len), Some(1));
            }
            other => panic!("expected if, got {:?}", other),
        }
    }

    #[test]
    fn function_def_and_call() {
        let ast = parse_source("function add(x, y) { return x + y; } r = add(1, 2);");
        match &ast[0] {
            Statement::FunctionDef(def) => {
                assert_eq!(def.name.name, "add");
                assert_eq!(def.params.len(), 2);
                assert!(matches!(def.body[0], Statement::Return(Some(_))));
            }
            other => panic!("expected function definition, got {:?}", other),
        }
        match &ast[1] {
            Statement::Assign(assign) => match &assign.rvalue {
                Expression::Call(call) => assert_eq!(call.args.len(), 2),
                other => panic!("expected call, got {:?}", other),
            },
            other => panic!("expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn unary_not_desugars_to_equals_zero() {
        let ast = parse_source("var x; x = !y;");
        let rvalue = match &ast[1] {
            Statement::Assign(assign) => &assign.rvalue,
            other => panic!("expected assignment, got {:?}", other),
        };
        match rvalue {
            Expression::Binary(b) => assert_eq!(b.op, BinOp::Eq),
            other => panic!("expected desugared comparison, got {:?}", other),
        }
    }

    #[test]
    fn missing_semicolon_is_an_error() {
        let tokens = lex("var a").expect("lex error in test");
        let err = parse(tokens).unwrap_err();
        assert!(matches!(err, ParseError::Eof(_)));
    }

    #[test]
    fn stray_delimiter_is_an_error() {
        let tokens = lex("var a; }").expect("lex error in test");
        let err = parse(tokens).unwrap_err();
        match err {
            ParseError::Expected(what, got) => {
                assert_eq!(what, "statement");
                assert_eq!(got.lexeme, "}");
            }
            other => panic!("expected mismatch error, got {:?}", other),
        }
    }
}
