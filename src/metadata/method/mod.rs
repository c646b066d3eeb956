//! Method bodies and their IL.
//!
//! [`MethodBody`] parses the tiny or fat header in front of a method's code; [`Instructions`]
//! walks the code itself. Together they let the demystifier look for the metadata tokens a method
//! references (`call`, `ldftn`, `newobj`, `stsfld`, ...).

mod body;
mod instructions;

pub use body::{MethodBody, MethodBodyFlags};
pub use instructions::{
    opcodes, token_operands, Instruction, Instructions, Operand, OperandType,
};
