// every stage is a module; lib.rs owns the shared types and wires the
// pipeline together

#[macro_use]
extern crate log;

mod ast;
mod codegen;
mod dot;
mod ir;
mod lexer;
mod lower;
mod optimizer;
mod parser;
mod semantic;
mod span;
mod symbol_table;

pub use crate::ast::{Assign, Ast, BinOp, BinaryExpr, Block, Expression, FnCall, FunctionDef, If, Literal, NameSpan, Statement, While};
pub use crate::codegen::{gen, AluOp, Cc, InternalError, TargetInstruction};
pub use crate::dot::ast_to_dot;
pub use crate::ir::{Instruction, Operand};
pub use crate::lexer::{lex, LexError, Lexer};
pub use crate::lower::{lower, Ir, RETURN_SLOT};
pub use crate::optimizer::{constant_folding, eliminate_dead_code, optimize, peephole, remove_duplicate_labels};
pub use crate::parser::{parse, ParseError};
pub use crate::semantic::{Analyzer, SemanticError};
pub use crate::span::Span;
pub use crate::symbol_table::SymbolTable;

/// The coarse classification the lexer hands out. The lexeme carries the
/// actual text, so one kind covers e.g. every keyword
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum TokenKind {
    Keyword,
    Number,
    Assign,
    Identifier,
    Str,
    Operator,
    Delimiter,
    Comment,
    EndOfInput,
}
impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use TokenKind::*;
        let s = match self {
            Keyword => "KEYWORD",
            Number => "NUMBER",
            Assign => "ASSIGN",
            Identifier => "ID",
            Str => "STRING",
            Operator => "OPERATOR",
            Delimiter => "DELIM",
            Comment => "COMMENT",
            EndOfInput => "EOF",
        };
        write!(f, "{}", s)
    }
}

#[derive(PartialEq, Clone, Debug)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub span: Span,
}
impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, span: Span) -> Token {
        Token { kind, lexeme: lexeme.into(), span }
    }
}
impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{} '{}' at {}", self.kind, self.lexeme, self.span)
    }
}

/// What little typing the language has: literals and variables get tagged,
/// nothing more
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum Type {
    Int,
    Float,
    Str,
}
impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let s = match self {
            Type::Int => "int",
            Type::Float => "float",
            Type::Str => "string",
        };
        write!(f, "{}", s)
    }
}

pub fn fmt_vec<T: std::fmt::Display>(vec: &[T]) -> String {
    vec.iter().map(|e| format!("{}", e)).collect::<Vec<String>>().join("\n")
}

#[derive(Debug)]
pub enum CompileError {
    Lex(LexError),
    Parse(ParseError),
    Semantic(Vec<SemanticError>),
    Internal(InternalError),
}
impl std::fmt::Display for CompileError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            CompileError::Lex(e) => write!(f, "{}", e),
            CompileError::Parse(e) => write!(f, "{}", e),
            CompileError::Semantic(errors) => write!(f, "{}", fmt_vec(errors)),
            CompileError::Internal(e) => write!(f, "{}", e),
        }
    }
}
impl std::error::Error for CompileError {}
impl From<LexError> for CompileError {
    fn from(e: LexError) -> Self {
        CompileError::Lex(e)
    }
}
impl From<ParseError> for CompileError {
    fn from(e: ParseError) -> Self {
        CompileError::Parse(e)
    }
}
impl From<InternalError> for CompileError {
    fn from(e: InternalError) -> Self {
        CompileError::Internal(e)
    }
}

/// Everything one run produces, stage by stage
#[derive(PartialEq, Clone, Debug)]
pub struct Compilation {
    pub tokens: Vec<Token>,
    pub ast: Ast,
    pub ir: Ir,
    pub optimized: Vec<Instruction>,
    pub target: Vec<TargetInstruction>,
}

/// One source unit in, one of: diagnostics, a fatal lex/parse error, or the
/// full set of artifacts. Semantic errors are collected over the whole AST
/// before the run is abandoned; lowering never starts when there are any
pub fn compile(text: &str) -> Result<Compilation, CompileError> {
    let tokens = lexer::lex(text)?;
    let ast = parser::parse(tokens.clone())?;
    let mut analyzer = semantic::Analyzer::new();
    analyzer.analyze(&ast);
    if !analyzer.errors().is_empty() {
        return Err(CompileError::Semantic(analyzer.into_errors()));
    }
    let ir = lower::lower(&ast);
    let optimized = optimizer::optimize(ir.instructions.clone());
    let target = codegen::gen(&optimized)?;
    Ok(Compilation { tokens, ast, ir, optimized, target })
}
