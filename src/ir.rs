//! Three-address form: each instruction carries at most one operator, one
//! destination and two sources. The list order IS the control flow, via
//! fallthrough plus labeled jumps

use crate::ast::BinOp;

#[derive(PartialEq, Clone, Debug)]
pub enum Operand {
    Var(String),
    Temp(u32),
    Num(String),
    Str(String),
}
impl std::fmt::Display for Operand {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Operand::Var(name) => write!(f, "{}", name),
            Operand::Temp(n) => write!(f, "t{}", n),
            Operand::Num(text) => write!(f, "{}", text),
            Operand::Str(text) => write!(f, "\"{}\"", text),
        }
    }
}

/// A conditional jump is always immediately followed by `Jump(on_false)`;
/// the lowering emits the pair together and the emitter checks it
#[derive(PartialEq, Clone, Debug)]
pub enum Instruction {
    Assign { dest: Operand, value: Operand },
    Bin { dest: Operand, op: BinOp, lhs: Operand, rhs: Operand },
    CondJump { lhs: Operand, op: BinOp, rhs: Operand, on_true: String, on_false: String },
    Jump(String),
    Label(String),
    Print(Operand),
    Input(Operand),
    Call(String),
    Ret,
}
impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Instruction::Assign { dest, value } => write!(f, "{} := {}", dest, value),
            Instruction::Bin { dest, op, lhs, rhs } => {
                write!(f, "{} := {} {} {}", dest, lhs, op, rhs)
            }
            Instruction::CondJump { lhs, op, rhs, on_true, .. } => {
                write!(f, "if {} {} {} goto {}", lhs, op, rhs, on_true)
            }
            Instruction::Jump(label) => write!(f, "goto {}", label),
            Instruction::Label(name) => write!(f, "{}:", name),
            Instruction::Print(operand) => write!(f, "print {}", operand),
            Instruction::Input(operand) => write!(f, "input {}", operand),
            Instruction::Call(name) => write!(f, "call {}", name),
            Instruction::Ret => write!(f, "ret"),
        }
    }
}
