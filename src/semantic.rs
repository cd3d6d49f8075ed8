//! Declaration, initialization and type checking. One walk over the AST,
//! collecting every violation rather than stopping at the first; the caller
//! decides afterwards whether the run goes on

use crate::ast::*;
use crate::span::Span;
use crate::symbol_table::SymbolTable;
use crate::Type;
use indexmap::IndexMap;

#[derive(PartialEq, Clone, Debug)]
pub enum SemanticError {
    Redeclaration { name: String, span: Span },
    Undeclared { name: String, span: Span },
    UseBeforeInit { name: String, span: Span },
    TypeMismatch { name: String, expected: Type, found: Type, span: Span },
    UndefinedFunction { name: String, span: Span },
    ArityMismatch { name: String, expected: usize, found: usize, span: Span },
}
impl std::fmt::Display for SemanticError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use SemanticError::*;
        match self {
            Redeclaration { name, span } => {
                write!(f, "[ERROR] '{}' is declared twice at {}", name, span)
            }
            Undeclared { name, span } => {
                write!(f, "[ERROR] variable '{}' is never declared, used at {}", name, span)
            }
            UseBeforeInit { name, span } => {
                write!(f, "[ERROR] variable '{}' is read before it is assigned at {}", name, span)
            }
            TypeMismatch { name, expected, found, span } => write!(
                f,
                "[ERROR] variable '{}' has type {} but is assigned {} at {}",
                name, expected, found, span
            ),
            UndefinedFunction { name, span } => {
                write!(f, "[ERROR] call to undefined function '{}' at {}", name, span)
            }
            ArityMismatch { name, expected, found, span } => write!(
                f,
                "[ERROR] function '{}' expected {} arguments, got {} at {}",
                name, expected, found, span
            ),
        }
    }
}
impl std::error::Error for SemanticError {}

pub struct Analyzer {
    table: SymbolTable,
    // name -> arity, in definition order
    functions: IndexMap<String, usize>,
    walked_functions: std::collections::HashSet<String>,
    errors: Vec<SemanticError>,
}

impl Analyzer {
    pub fn new() -> Analyzer {
        Analyzer {
            table: SymbolTable::new(),
            functions: IndexMap::new(),
            walked_functions: std::collections::HashSet::new(),
            errors: Vec::new(),
        }
    }

    /// walk the whole tree, accumulating diagnostics; never stops early
    pub fn analyze(&mut self, ast: &Ast) {
        // signatures first, so a call may precede its definition
        self.collect_functions(ast);
        for statement in ast {
            self.check_statement(statement);
        }
        debug!("semantic analysis found {} problem(s)", self.errors.len());
    }

    pub fn errors(&self) -> &[SemanticError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<SemanticError> {
        self.errors
    }

    fn collect_functions(&mut self, statements: &[Statement]) {
        for statement in statements {
            match statement {
                Statement::FunctionDef(def) => {
                    if self.functions.contains_key(&def.name.name) {
                        // reported again during the walk; only record the first
                        continue;
                    }
                    self.functions.insert(def.name.name.clone(), def.params.len());
                    self.collect_functions(&def.body);
                }
                Statement::If(stmt) => {
                    self.collect_functions(&stmt.then_block);
                    if let Some(else_block) = &stmt.else_block {
                        self.collect_functions(else_block);
                    }
                }
                Statement::While(stmt) => self.collect_functions(&stmt.body),
                _ => (),
            }
        }
    }

    fn check_statement(&mut self, statement: &Statement) {
        match statement {
            Statement::VarDecl(id) => {
                if self.table.is_declared(&id.name) {
                    self.errors.push(SemanticError::Redeclaration {
                        name: id.name.clone(),
                        span: id.span,
                    });
                } else {
                    self.table.declare(&id.name);
                }
            }
            Statement::Assign(assign) => {
                self.check_expression(&assign.rvalue);
                if !self.table.is_declared(&assign.target.name) {
                    self.errors.push(SemanticError::Undeclared {
                        name: assign.target.name.clone(),
                        span: assign.target.span,
                    });
                } else {
                    let found = self.infer(&assign.rvalue);
                    if let (Some(expected), Some(found)) =
                        (self.table.get_type(&assign.target.name), found)
                    {
                        if expected != found {
                            self.errors.push(SemanticError::TypeMismatch {
                                name: assign.target.name.clone(),
                                expected,
                                found,
                                span: assign.span,
                            });
                        }
                    }
                    self.table.assign(&assign.target.name, found);
                }
            }
            Statement::If(stmt) => {
                self.check_expression(&stmt.condition);
                for s in &stmt.then_block {
                    self.check_statement(s);
                }
                if let Some(else_block) = &stmt.else_block {
                    for s in else_block {
                        self.check_statement(s);
                    }
                }
            }
            Statement::While(stmt) => {
                self.check_expression(&stmt.condition);
                for s in &stmt.body {
                    self.check_statement(s);
                }
            }
            Statement::Print(operand) => self.check_expression(operand),
            Statement::Input(operand) => match operand {
                // input writes its operand when it names a variable
                Expression::Identifier(id) => {
                    if !self.table.is_declared(&id.name) {
                        self.errors.push(SemanticError::Undeclared {
                            name: id.name.clone(),
                            span: id.span,
                        });
                    } else {
                        self.table.assign(&id.name, None);
                    }
                }
                other => self.check_expression(other),
            },
            Statement::FunctionDef(def) => {
                if !self.walked_functions.insert(def.name.name.clone()) {
                    self.errors.push(SemanticError::Redeclaration {
                        name: def.name.name.clone(),
                        span: def.name.span,
                    });
                }
                for param in &def.params {
                    // parameters live in the same flat namespace as variables
                    self.table.declare(&param.name);
                    self.table.assign(&param.name, None);
                }
                for s in &def.body {
                    self.check_statement(s);
                }
            }
            Statement::FnCall(call) => self.check_call(call),
            Statement::Return(value) => {
                if let Some(value) = value {
                    self.check_expression(value);
                }
            }
        }
    }

    fn check_expression(&mut self, expression: &Expression) {
        match expression {
            Expression::Number(_) | Expression::Str(_) => (),
            Expression::Identifier(id) => {
                if !self.table.is_declared(&id.name) {
                    self.errors.push(SemanticError::Undeclared {
                        name: id.name.clone(),
                        span: id.span,
                    });
                } else if !self.table.is_initialized(&id.name) {
                    self.errors.push(SemanticError::UseBeforeInit {
                        name: id.name.clone(),
                        span: id.span,
                    });
                }
            }
            Expression::Binary(binary) => {
                self.check_expression(&binary.left);
                self.check_expression(&binary.right);
            }
            Expression::Call(call) => self.check_call(call),
        }
    }

    fn check_call(&mut self, call: &FnCall) {
        for arg in &call.args {
            self.check_expression(arg);
        }
        match self.functions.get(&call.name.name) {
            None => self.errors.push(SemanticError::UndefinedFunction {
                name: call.name.name.clone(),
                span: call.name.span,
            }),
            Some(&arity) if arity != call.args.len() => {
                self.errors.push(SemanticError::ArityMismatch {
                    name: call.name.name.clone(),
                    expected: arity,
                    found: call.args.len(),
                    span: call.span,
                })
            }
            Some(_) => (),
        }
    }

    /// what type an expression would produce, when that is knowable without
    /// evaluating anything
    fn infer(&self, expression: &Expression) -> Option<Type> {
        match expression {
            Expression::Number(lit) => {
                Some(if lit.text.contains('.') { Type::Float } else { Type::Int })
            }
            Expression::Str(_) => Some(Type::Str),
            Expression::Identifier(id) => self.table.get_type(&id.name),
            Expression::Binary(binary) => {
                if binary.op.is_relational() || binary.op.is_logical() {
                    // comparisons produce truthy ints
                    return Some(Type::Int);
                }
                match (self.infer(&binary.left), self.infer(&binary.right)) {
                    (Some(Type::Int), Some(Type::Int)) => Some(Type::Int),
                    (Some(Type::Float), Some(Type::Int))
                    | (Some(Type::Int), Some(Type::Float))
                    | (Some(Type::Float), Some(Type::Float)) => Some(Type::Float),
                    (Some(Type::Str), Some(Type::Str)) if binary.op == BinOp::Add => {
                        Some(Type::Str)
                    }
                    _ => None,
                }
            }
            Expression::Call(_) => None,
        }
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::lexer::lex;
    use crate::parser::parse;

    fn analyze_source(source: &str) -> Vec<SemanticError> {
        let ast = parse(lex(source).expect("lex error in test")).expect("parse error in test");
        let mut analyzer = Analyzer::new();
        analyzer.analyze(&ast);
        analyzer.into_errors()
    }

    #[test]
    fn clean_program() {
        assert_eq!(analyze_source("var a; a = 5; print(a);"), vec![]);
    }

    #[test]
    fn assignment_without_declaration() {
        let errors = analyze_source("a = 5;");
        assert_eq!(errors.len(), 1);
        match &errors[0] {
            SemanticError::Undeclared { name, .. } => assert_eq!(name, "a"),
            other => panic!("expected undeclared error, got {:?}", other),
        }
    }

    #[test]
    fn redeclaration() {
        let errors = analyze_source("var a; var a;");
        assert!(matches!(&errors[..], [SemanticError::Redeclaration { name, .. }] if name == "a"));
    }

    #[test]
    fn read_before_assignment() {
        let errors = analyze_source("var a; var b; b = a;");
        assert!(matches!(&errors[..], [SemanticError::UseBeforeInit { name, .. }] if name == "a"));
    }

    #[test]
    fn type_conflict_on_reassignment() {
        let errors = analyze_source("var a; a = 5; a = \"five\";");
        match &errors[..] {
            [SemanticError::TypeMismatch { name, expected, found, .. }] => {
                assert_eq!(name, "a");
                assert_eq!(*expected, Type::Int);
                assert_eq!(*found, Type::Str);
            }
            other => panic!("expected type mismatch, got {:?}", other),
        }
    }

    #[test]
    fn analysis_collects_every_error() {
        let errors = analyze_source("a = 1; b = 2; var c; print(c);");
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn input_initializes_its_operand() {
        assert_eq!(analyze_source("var x; input(x); var y; y = x;"), vec![]);
    }

    #[test]
    fn call_before_definition_is_fine() {
        let errors = analyze_source("var r; r = double(2); function double(x) { return x + x; }");
        assert_eq!(errors, vec![]);
    }

    #[test]
    fn wrong_arity() {
        let errors = analyze_source("function f(x) { print(x); } f(1, 2)");
        assert!(
            matches!(&errors[..], [SemanticError::ArityMismatch { expected: 1, found: 2, .. }])
        );
    }

    #[test]
    fn unknown_function() {
        let errors = analyze_source("nope(1)");
        assert!(
            matches!(&errors[..], [SemanticError::UndefinedFunction { name, .. }] if name == "nope")
        );
    }
}
