//! Optimization passes over three-address code. Each pass takes a list and
//! returns a new list, preserving the relative order of whatever survives,
//! and never looks outside the list it was handed

use crate::ir::{Instruction, Operand};
use std::collections::HashSet;

/// the fixed pipeline: fold, peephole, dead code, duplicate labels
pub fn optimize(instructions: Vec<Instruction>) -> Vec<Instruction> {
    let before = instructions.len();
    let instructions = constant_folding(instructions);
    let instructions = peephole(instructions);
    let instructions = eliminate_dead_code(instructions);
    let instructions = remove_duplicate_labels(instructions);
    debug!("optimizer: {} -> {} instructions", before, instructions.len());
    instructions
}

/// Canonicalize integer-literal right-hand sides of plain assignments
/// (`x := 007` becomes `x := 7`). Arithmetic between two literals is NOT
/// folded here, and decimal literals pass through untouched
pub fn constant_folding(instructions: Vec<Instruction>) -> Vec<Instruction> {
    instructions
        .into_iter()
        .map(|instruction| match instruction {
            Instruction::Assign { dest, value: Operand::Num(text) } => {
                let value = match text.parse::<i64>() {
                    Ok(n) => Operand::Num(n.to_string()),
                    Err(_) => Operand::Num(text),
                };
                Instruction::Assign { dest, value }
            }
            other => other,
        })
        .collect()
}

/// drop an unconditional jump when the very next instruction is the
/// identical jump; a run of copies collapses to one
pub fn peephole(instructions: Vec<Instruction>) -> Vec<Instruction> {
    let mut out = Vec::with_capacity(instructions.len());
    for (i, instruction) in instructions.iter().enumerate() {
        if let Instruction::Jump(_) = instruction {
            if instructions.get(i + 1) == Some(instruction) {
                continue;
            }
        }
        out.push(instruction.clone());
    }
    out
}

/// Remove assignments whose destination is never an assignment destination.
/// That set is computed from the same list, so this is the conservative
/// assigned-set heuristic, not a liveness analysis: anything assigned
/// anywhere survives
pub fn eliminate_dead_code(instructions: Vec<Instruction>) -> Vec<Instruction> {
    let mut assigned = HashSet::new();
    for instruction in &instructions {
        match instruction {
            Instruction::Assign { dest, .. } | Instruction::Bin { dest, .. } => {
                assigned.insert(dest.to_string());
            }
            _ => (),
        }
    }
    instructions
        .into_iter()
        .filter(|instruction| match instruction {
            Instruction::Assign { dest, .. } | Instruction::Bin { dest, .. } => {
                assigned.contains(&dest.to_string())
            }
            _ => true,
        })
        .collect()
}

/// keep the first definition of every label, drop redefinitions. Labels are
/// unique by construction, so outside of hand-built lists this is a no-op
pub fn remove_duplicate_labels(instructions: Vec<Instruction>) -> Vec<Instruction> {
    let mut seen = HashSet::new();
    instructions
        .into_iter()
        .filter(|instruction| match instruction {
            Instruction::Label(name) => seen.insert(name.clone()),
            _ => true,
        })
        .collect()
}
