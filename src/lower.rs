// Lower the AST, which matches syntax, into three-address code, which
// matches the target machine's idea of control flow

use crate::ast::*;
use crate::ir::{Instruction, Operand};
use indexmap::IndexMap;

/// where a function leaves its result; calls in expression position copy it
/// into a fresh temporary right after the call
pub const RETURN_SLOT: &str = "ret";

/// The instruction list plus the final counter values. Both counters start
/// at 0 for every unit, so identical trees lower to identical code
#[derive(PartialEq, Clone, Debug)]
pub struct Ir {
    pub instructions: Vec<Instruction>,
    pub label_count: u32,
    pub temp_count: u32,
}

pub fn lower(ast: &Ast) -> Ir {
    let mut lowerer = Lower::new(ast);
    for statement in ast {
        lowerer.lower_statement(statement);
    }
    debug!(
        "lowered to {} instructions ({} labels, {} temps)",
        lowerer.instructions.len(),
        lowerer.label_count,
        lowerer.temp_count
    );
    Ir {
        instructions: lowerer.instructions,
        label_count: lowerer.label_count,
        temp_count: lowerer.temp_count,
    }
}

struct Lower {
    instructions: Vec<Instruction>,
    label_count: u32,
    temp_count: u32,
    // parameter names per function, so calls can bind arguments
    fn_params: IndexMap<String, Vec<String>>,
}

impl Lower {
    fn new(ast: &Ast) -> Lower {
        let mut lowerer = Lower {
            instructions: Vec::new(),
            label_count: 0,
            temp_count: 0,
            fn_params: IndexMap::new(),
        };
        lowerer.collect_params(ast);
        lowerer
    }

    fn collect_params(&mut self, statements: &[Statement]) {
        for statement in statements {
            match statement {
                Statement::FunctionDef(def) => {
                    let params = def.params.iter().map(|p| p.name.clone()).collect();
                    self.fn_params.insert(def.name.name.clone(), params);
                    self.collect_params(&def.body);
                }
                Statement::If(stmt) => {
                    self.collect_params(&stmt.then_block);
                    if let Some(else_block) = &stmt.else_block {
                        self.collect_params(else_block);
                    }
                }
                Statement::While(stmt) => self.collect_params(&stmt.body),
                _ => (),
            }
        }
    }

    fn new_label(&mut self) -> String {
        let label = format!("label_{}", self.label_count);
        self.label_count += 1;
        label
    }

    fn new_temp(&mut self) -> Operand {
        let temp = Operand::Temp(self.temp_count);
        self.temp_count += 1;
        temp
    }

    fn emit(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }

    fn lower_statement(&mut self, statement: &Statement) {
        match statement {
            // declarations are symbol-table bookkeeping, no code
            Statement::VarDecl(_) => (),
            Statement::Assign(assign) => {
                let value = self.lower_expression(&assign.rvalue);
                self.emit(Instruction::Assign {
                    dest: Operand::Var(assign.target.name.clone()),
                    value,
                });
            }
            Statement::If(stmt) => {
                let then_label = self.new_label();
                let else_label = self.new_label();
                let end_label = self.new_label();
                let false_target =
                    if stmt.else_block.is_some() { else_label.clone() } else { end_label.clone() };
                self.lower_condition(&stmt.condition, &then_label, &false_target);
                self.emit(Instruction::Label(then_label));
                for s in &stmt.then_block {
                    self.lower_statement(s);
                }
                self.emit(Instruction::Jump(end_label.clone()));
                if let Some(else_block) = &stmt.else_block {
                    self.emit(Instruction::Label(else_label));
                    for s in else_block {
                        self.lower_statement(s);
                    }
                }
                self.emit(Instruction::Label(end_label));
            }
            Statement::While(stmt) => {
                let start_label = self.new_label();
                let end_label = self.new_label();
                self.emit(Instruction::Label(start_label.clone()));
                let body_label = self.new_label();
                self.lower_condition(&stmt.condition, &body_label, &end_label);
                self.emit(Instruction::Label(body_label));
                for s in &stmt.body {
                    self.lower_statement(s);
                }
                self.emit(Instruction::Jump(start_label));
                self.emit(Instruction::Label(end_label));
            }
            Statement::Print(operand) => {
                let value = self.lower_expression(operand);
                self.emit(Instruction::Print(value));
            }
            Statement::Input(operand) => {
                let value = self.lower_expression(operand);
                self.emit(Instruction::Input(value));
            }
            Statement::FunctionDef(def) => {
                // straight-line flow hops over the body; calls land on the
                // name label
                let skip_label = self.new_label();
                self.emit(Instruction::Jump(skip_label.clone()));
                self.emit(Instruction::Label(def.name.name.clone()));
                for s in &def.body {
                    self.lower_statement(s);
                }
                self.emit(Instruction::Ret);
                self.emit(Instruction::Label(skip_label));
            }
            Statement::FnCall(call) => {
                self.lower_call(call);
            }
            Statement::Return(value) => {
                if let Some(value) = value {
                    let operand = self.lower_expression(value);
                    self.emit(Instruction::Assign {
                        dest: Operand::Var(RETURN_SLOT.to_string()),
                        value: operand,
                    });
                }
                self.emit(Instruction::Ret);
            }
        }
    }

    /// A relational comparison keeps its own operator inside the jump;
    /// anything else is tested against zero. Either way the jump is followed
    /// by an unconditional goto to the false target
    fn lower_condition(&mut self, condition: &Expression, on_true: &str, on_false: &str) {
        match condition {
            Expression::Binary(binary) if binary.op.is_relational() => {
                let lhs = self.lower_expression(&binary.left);
                let rhs = self.lower_expression(&binary.right);
                self.emit(Instruction::CondJump {
                    lhs,
                    op: binary.op,
                    rhs,
                    on_true: on_true.to_string(),
                    on_false: on_false.to_string(),
                });
            }
            other => {
                let value = self.lower_expression(other);
                self.emit(Instruction::CondJump {
                    lhs: value,
                    op: BinOp::Ne,
                    rhs: Operand::Num("0".to_string()),
                    on_true: on_true.to_string(),
                    on_false: on_false.to_string(),
                });
            }
        }
        self.emit(Instruction::Jump(on_false.to_string()));
    }

    fn lower_expression(&mut self, expression: &Expression) -> Operand {
        match expression {
            Expression::Number(lit) => Operand::Num(lit.text.clone()),
            Expression::Str(lit) => Operand::Str(lit.text.clone()),
            Expression::Identifier(id) => Operand::Var(id.name.clone()),
            Expression::Binary(binary) => {
                let lhs = self.lower_expression(&binary.left);
                let rhs = self.lower_expression(&binary.right);
                let dest = self.new_temp();
                self.emit(Instruction::Bin { dest: dest.clone(), op: binary.op, lhs, rhs });
                dest
            }
            Expression::Call(call) => {
                self.lower_call(call);
                let dest = self.new_temp();
                self.emit(Instruction::Assign {
                    dest: dest.clone(),
                    value: Operand::Var(RETURN_SLOT.to_string()),
                });
                dest
            }
        }
    }

    /// arguments land in the parameter variables; the namespace is flat so
    /// parameters are ordinary names
    fn lower_call(&mut self, call: &FnCall) {
        let params = match self.fn_params.get(&call.name.name) {
            Some(params) => params.clone(),
            None => {
                // semantic analysis rejects unknown callees before lowering
                warn!("lowering a call to unknown function {}", call.name.name);
                Vec::new()
            }
        };
        for (param, arg) in params.iter().zip(call.args.iter()) {
            let value = self.lower_expression(arg);
            self.emit(Instruction::Assign { dest: Operand::Var(param.clone()), value });
        }
        self.emit(Instruction::Call(call.name.name.clone()));
    }
}
