//! Renders the AST as a Graphviz digraph for external viewing. Strictly a
//! diagnostic side door: it reads the tree and nothing reads it back, so it
//! can be swapped out without touching the pipeline

use crate::ast::*;

pub fn ast_to_dot(ast: &Ast) -> String {
    let mut graph = Graph { out: String::from("digraph ast {\n"), next_id: 0 };
    let root = graph.node("program");
    for statement in ast {
        let child = graph.statement(statement);
        graph.edge(root, child);
    }
    graph.out.push_str("}\n");
    graph.out
}

struct Graph {
    out: String,
    next_id: usize,
}

impl Graph {
    fn node(&mut self, label: &str) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        self.out.push_str(&format!("    n{} [label=\"{}\"];\n", id, label.replace('"', "\\\"")));
        id
    }

    fn edge(&mut self, parent: usize, child: usize) {
        self.out.push_str(&format!("    n{} -> n{};\n", parent, child));
    }

    fn block(&mut self, parent: usize, label: &str, statements: &[Statement]) {
        let block = self.node(label);
        self.edge(parent, block);
        for statement in statements {
            let child = self.statement(statement);
            self.edge(block, child);
        }
    }

    fn statement(&mut self, statement: &Statement) -> usize {
        match statement {
            Statement::VarDecl(id) => self.node(&format!("var_decl: {}", id.name)),
            Statement::Assign(assign) => {
                let node = self.node(&format!("assign: {}", assign.target.name));
                let rvalue = self.expression(&assign.rvalue);
                self.edge(node, rvalue);
                node
            }
            Statement::If(stmt) => {
                let node = self.node("if");
                let condition = self.expression(&stmt.condition);
                self.edge(node, condition);
                self.block(node, "then", &stmt.then_block);
                if let Some(else_block) = &stmt.else_block {
                    self.block(node, "else", else_block);
                }
                node
            }
            Statement::While(stmt) => {
                let node = self.node("while");
                let condition = self.expression(&stmt.condition);
                self.edge(node, condition);
                self.block(node, "body", &stmt.body);
                node
            }
            Statement::Print(operand) => {
                let node = self.node("print");
                let child = self.expression(operand);
                self.edge(node, child);
                node
            }
            Statement::Input(operand) => {
                let node = self.node("input");
                let child = self.expression(operand);
                self.edge(node, child);
                node
            }
            Statement::FunctionDef(def) => {
                let node = self.node(&format!("function: {}", def.name.name));
                for param in &def.params {
                    let p = self.node(&format!("param: {}", param.name));
                    self.edge(node, p);
                }
                self.block(node, "body", &def.body);
                node
            }
            Statement::FnCall(call) => self.call(call),
            Statement::Return(value) => {
                let node = self.node("return");
                if let Some(value) = value {
                    let child = self.expression(value);
                    self.edge(node, child);
                }
                node
            }
        }
    }

    fn expression(&mut self, expression: &Expression) -> usize {
        match expression {
            Expression::Number(lit) => self.node(&format!("number: {}", lit.text)),
            Expression::Str(lit) => self.node(&format!("string: {}", lit.text)),
            Expression::Identifier(id) => self.node(&format!("id: {}", id.name)),
            Expression::Binary(binary) => {
                let node = self.node(&format!("{}", binary.op));
                let left = self.expression(&binary.left);
                self.edge(node, left);
                let right = self.expression(&binary.right);
                self.edge(node, right);
                node
            }
            Expression::Call(call) => self.call(call),
        }
    }

    fn call(&mut self, call: &FnCall) -> usize {
        let node = self.node(&format!("call: {}", call.name.name));
        for arg in &call.args {
            let child = self.expression(arg);
            self.edge(node, child);
        }
        node
    }
}
