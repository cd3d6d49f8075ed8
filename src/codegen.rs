//! Lower optimized three-address code onto a two-operand pseudo-assembly.
//! One instruction in, zero or more out, order preserved exactly. Anything
//! the emitter does not recognize is a hard error, never a silent drop

use crate::ast::BinOp;
use crate::ir::{Instruction, Operand};

/// a shape reached the emitter that the pipeline should never produce
#[derive(PartialEq, Clone, Debug)]
pub enum InternalError {
    BadDestination(String),
    NonRelationalJump(String),
    UnpairedCondJump(String),
}
impl std::fmt::Display for InternalError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            InternalError::BadDestination(inst) => {
                write!(f, "[ERROR] internal: literal used as a destination in '{}'", inst)
            }
            InternalError::NonRelationalJump(inst) => {
                write!(f, "[ERROR] internal: conditional jump without a relational operator in '{}'", inst)
            }
            InternalError::UnpairedCondJump(inst) => {
                write!(f, "[ERROR] internal: conditional jump not followed by its false-path goto in '{}'", inst)
            }
        }
    }
}
impl std::error::Error for InternalError {}

/// branch condition; the operator of the comparison picks the mnemonic
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum Cc {
    E,
    Ne,
    L,
    G,
    Le,
    Ge,
}
impl Cc {
    fn suffix(self) -> &'static str {
        match self {
            Cc::E => "e",
            Cc::Ne => "ne",
            Cc::L => "l",
            Cc::G => "g",
            Cc::Le => "le",
            Cc::Ge => "ge",
        }
    }
}

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum AluOp {
    Add,
    Sub,
    Mul,
    Div,
    And,
    Or,
}
impl std::fmt::Display for AluOp {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let s = match self {
            AluOp::Add => "add",
            AluOp::Sub => "sub",
            AluOp::Mul => "mul",
            AluOp::Div => "div",
            AluOp::And => "and",
            AluOp::Or => "or",
        };
        write!(f, "{}", s)
    }
}

#[derive(PartialEq, Clone, Debug)]
pub enum TargetInstruction {
    Mov { dest: Operand, src: Operand },
    Alu { op: AluOp, dest: Operand, src: Operand },
    Cmp { lhs: Operand, rhs: Operand },
    Set { cc: Cc, dest: Operand },
    Branch { cc: Cc, label: String },
    Jmp(String),
    Label(String),
    Print(Operand),
    Input(Operand),
    Call(String),
    Ret,
}
impl std::fmt::Display for TargetInstruction {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use TargetInstruction::*;
        match self {
            Mov { dest, src } => write!(f, "mov {}, {}", dest, src),
            Alu { op, dest, src } => write!(f, "{} {}, {}", op, dest, src),
            Cmp { lhs, rhs } => write!(f, "cmp {}, {}", lhs, rhs),
            Set { cc, dest } => write!(f, "set{} {}", cc.suffix(), dest),
            Branch { cc, label } => write!(f, "j{} {}", cc.suffix(), label),
            Jmp(label) => write!(f, "jmp {}", label),
            Label(name) => write!(f, "{}:", name),
            Print(operand) => write!(f, "print {}", operand),
            Input(operand) => write!(f, "input {}", operand),
            Call(name) => write!(f, "call {}", name),
            Ret => write!(f, "ret"),
        }
    }
}

fn condition_code(op: BinOp) -> Option<Cc> {
    Some(match op {
        BinOp::Eq => Cc::E,
        BinOp::Ne => Cc::Ne,
        BinOp::Lt => Cc::L,
        BinOp::Gt => Cc::G,
        BinOp::Le => Cc::Le,
        BinOp::Ge => Cc::Ge,
        _ => return None,
    })
}

fn alu_op(op: BinOp) -> Option<AluOp> {
    Some(match op {
        BinOp::Add => AluOp::Add,
        BinOp::Sub => AluOp::Sub,
        BinOp::Mul => AluOp::Mul,
        BinOp::Div => AluOp::Div,
        BinOp::And => AluOp::And,
        BinOp::Or => AluOp::Or,
        _ => return None,
    })
}

fn check_destination(dest: &Operand, instruction: &Instruction) -> Result<(), InternalError> {
    match dest {
        Operand::Var(_) | Operand::Temp(_) => Ok(()),
        Operand::Num(_) | Operand::Str(_) => {
            Err(InternalError::BadDestination(instruction.to_string()))
        }
    }
}

pub fn gen(instructions: &[Instruction]) -> Result<Vec<TargetInstruction>, InternalError> {
    let mut out = Vec::new();
    for (i, instruction) in instructions.iter().enumerate() {
        match instruction {
            Instruction::Assign { dest, value } => {
                check_destination(dest, instruction)?;
                out.push(TargetInstruction::Mov { dest: dest.clone(), src: value.clone() });
            }
            Instruction::Bin { dest, op, lhs, rhs } => {
                check_destination(dest, instruction)?;
                if let Some(cc) = condition_code(*op) {
                    // comparisons in value position: compare, then latch the
                    // truth value into the destination
                    out.push(TargetInstruction::Cmp { lhs: lhs.clone(), rhs: rhs.clone() });
                    out.push(TargetInstruction::Set { cc, dest: dest.clone() });
                } else if let Some(op) = alu_op(*op) {
                    out.push(TargetInstruction::Mov { dest: dest.clone(), src: lhs.clone() });
                    out.push(TargetInstruction::Alu { op, dest: dest.clone(), src: rhs.clone() });
                } else {
                    unreachable!("every operator is relational or an alu op");
                }
            }
            Instruction::CondJump { lhs, op, rhs, on_true, on_false } => {
                let cc = condition_code(*op)
                    .ok_or_else(|| InternalError::NonRelationalJump(instruction.to_string()))?;
                let paired = match instructions.get(i + 1) {
                    Some(Instruction::Jump(label)) => label == on_false,
                    _ => false,
                };
                if !paired {
                    return Err(InternalError::UnpairedCondJump(instruction.to_string()));
                }
                out.push(TargetInstruction::Cmp { lhs: lhs.clone(), rhs: rhs.clone() });
                out.push(TargetInstruction::Branch { cc, label: on_true.clone() });
            }
            Instruction::Jump(label) => out.push(TargetInstruction::Jmp(label.clone())),
            Instruction::Label(name) => out.push(TargetInstruction::Label(name.clone())),
            Instruction::Print(operand) => {
                out.push(TargetInstruction::Print(operand.clone()))
            }
            Instruction::Input(operand) => {
                out.push(TargetInstruction::Input(operand.clone()))
            }
            Instruction::Call(name) => out.push(TargetInstruction::Call(name.clone())),
            Instruction::Ret => out.push(TargetInstruction::Ret),
        }
    }
    Ok(out)
}
