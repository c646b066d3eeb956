//! Walking the CIL instruction stream of a method body.
//!
//! Only operand boundaries are decoded: each instruction is reported with its offset, opcode and
//! operand, which is enough to find the metadata tokens a method references. Opcodes that the
//! ECMA-335 table (III.1.2.1) leaves unassigned are reported as malformed.
//!
//! # Examples
//!
//! ```rust
//! use dotsym::metadata::method::{opcodes, Instructions, Operand};
//!
//! // ldarg.0; call 0x06000002; ret
//! let il = [0x02, 0x28, 0x02, 0x00, 0x00, 0x06, 0x2A];
//! let calls: Vec<_> = Instructions::new(&il)
//!     .filter_map(|instruction| instruction.ok())
//!     .filter(|instruction| instruction.opcode == opcodes::CALL)
//!     .collect();
//!
//! assert_eq!(calls.len(), 1);
//! assert_eq!(calls[0].offset, 1);
//! assert!(matches!(calls[0].operand, Operand::Token(token) if token.value() == 0x0600_0002));
//! # Ok::<(), dotsym::Error>(())
//! ```

use crate::{file::parser::Parser, metadata::token::Token, Result};

/// Opcodes the symbolicator looks for. Two-byte opcodes carry the `0xFE` prefix in the high
/// byte.
pub mod opcodes {
    /// `call <method>`
    pub const CALL: u16 = 0x28;
    /// `callvirt <method>`
    pub const CALLVIRT: u16 = 0x6F;
    /// `newobj <ctor>`
    pub const NEWOBJ: u16 = 0x73;
    /// `ldfld <field>`
    pub const LDFLD: u16 = 0x7B;
    /// `stfld <field>`
    pub const STFLD: u16 = 0x7D;
    /// `ldsfld <field>`
    pub const LDSFLD: u16 = 0x7E;
    /// `stsfld <field>`
    pub const STSFLD: u16 = 0x80;
    /// `ldtoken <token>`
    pub const LDTOKEN: u16 = 0xD0;
    /// `ret`
    pub const RET: u16 = 0x2A;
    /// `ldftn <method>`
    pub const LDFTN: u16 = 0xFE06;
    /// `ldvirtftn <method>`
    pub const LDVIRTFTN: u16 = 0xFE07;
}

/// Encoding of an instruction's inline operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandType {
    /// No operand
    None,
    /// Signed or unsigned 8-bit immediate, short branch target
    Int8,
    /// 16-bit variable index
    UInt16,
    /// 32-bit immediate or long branch target
    Int32,
    /// 64-bit immediate
    Int64,
    /// 32-bit float
    Float32,
    /// 64-bit float
    Float64,
    /// Metadata token
    Token,
    /// Jump table: count followed by 32-bit targets
    Switch,
}

/// A decoded operand.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// No operand
    None,
    /// Integer immediate, variable index or branch displacement
    Int(i64),
    /// Floating point immediate
    Float(f64),
    /// Metadata token
    Token(Token),
    /// Jump table displacements
    Switch(Vec<i32>),
}

/// One instruction of an IL stream.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    /// Offset of the instruction from the start of the IL stream
    pub offset: u32,
    /// Opcode; `0xFExx` for two-byte opcodes
    pub opcode: u16,
    /// The inline operand
    pub operand: Operand,
}

impl Instruction {
    /// The metadata token operand, if this instruction has one.
    #[must_use]
    pub fn token(&self) -> Option<Token> {
        match self.operand {
            Operand::Token(token) => Some(token),
            _ => None,
        }
    }
}

/// Operand encoding of a one-byte opcode, `None` for unassigned opcodes.
fn operand_type(opcode: u8) -> Option<OperandType> {
    let operand = match opcode {
        0x00..=0x0D | 0x14..=0x1E | 0x25 | 0x26 | 0x2A | 0x46..=0x6E | 0x76 | 0x7A | 0x82..=0x8B
        | 0x8E | 0x90..=0xA2 | 0xB3..=0xBA | 0xC3 | 0xD1..=0xDC | 0xDF | 0xE0 => OperandType::None,
        0x0E..=0x13 | 0x1F | 0x2B..=0x37 | 0xDE => OperandType::Int8,
        0x20 | 0x38..=0x44 | 0xDD => OperandType::Int32,
        0x21 => OperandType::Int64,
        0x22 => OperandType::Float32,
        0x23 => OperandType::Float64,
        0x27..=0x29 | 0x6F..=0x75 | 0x79 | 0x7B..=0x81 | 0x8C | 0x8D | 0x8F | 0xA3..=0xA5 | 0xC2
        | 0xC6 | 0xD0 => OperandType::Token,
        0x45 => OperandType::Switch,
        _ => return None,
    };

    Some(operand)
}

/// Operand encoding of a `0xFE`-prefixed opcode, `None` for unassigned opcodes.
fn operand_type_fe(opcode: u8) -> Option<OperandType> {
    let operand = match opcode {
        0x00..=0x05 | 0x0F | 0x11 | 0x13 | 0x14 | 0x17 | 0x18 | 0x1A | 0x1D | 0x1E => {
            OperandType::None
        }
        0x12 | 0x19 => OperandType::Int8,
        0x09..=0x0E => OperandType::UInt16,
        0x06 | 0x07 | 0x15 | 0x16 | 0x1C => OperandType::Token,
        _ => return None,
    };

    Some(operand)
}

fn read_operand(parser: &mut Parser, operand_type: OperandType, opcode: u16) -> Result<Operand> {
    let operand = match operand_type {
        OperandType::None => Operand::None,
        OperandType::Int8 => {
            // Index operands (ldarg.s, ldloc.s, ...) are unsigned, branch displacements signed
            let byte = parser.read_le::<u8>()?;
            if (0x0E..=0x13).contains(&opcode) || opcode == 0xFE12 || opcode == 0xFE19 {
                Operand::Int(i64::from(byte))
            } else {
                Operand::Int(i64::from(byte as i8))
            }
        }
        OperandType::UInt16 => Operand::Int(i64::from(parser.read_le::<u16>()?)),
        OperandType::Int32 => Operand::Int(i64::from(parser.read_le::<i32>()?)),
        OperandType::Int64 => Operand::Int(parser.read_le::<i64>()?),
        OperandType::Float32 => Operand::Float(f64::from(parser.read_le::<f32>()?)),
        OperandType::Float64 => Operand::Float(parser.read_le::<f64>()?),
        OperandType::Token => Operand::Token(Token::new(parser.read_le::<u32>()?)),
        OperandType::Switch => {
            let count = parser.read_le::<u32>()? as usize;
            if count > parser.remaining() / 4 {
                return Err(malformed_error!("Switch table with {} targets is truncated", count));
            }

            let mut targets = Vec::with_capacity(count);
            for _ in 0..count {
                targets.push(parser.read_le::<i32>()?);
            }
            Operand::Switch(targets)
        }
    };

    Ok(operand)
}

/// Iterator over the instructions of an IL stream.
///
/// Iteration stops after the first error; a malformed stream yields exactly one `Err`.
pub struct Instructions<'a> {
    parser: Parser<'a>,
    failed: bool,
}

impl<'a> Instructions<'a> {
    /// Creates an iterator over `il`, the code of a method body without its header.
    #[must_use]
    pub fn new(il: &'a [u8]) -> Self {
        Instructions {
            parser: Parser::new(il),
            failed: false,
        }
    }

    fn decode(&mut self) -> Result<Instruction> {
        let offset = u32::try_from(self.parser.pos())
            .map_err(|_| malformed_error!("IL stream is too large"))?;

        let first_byte = self.parser.read_le::<u8>()?;
        let (opcode, operand_type) = if first_byte == 0xFE {
            let second_byte = self.parser.read_le::<u8>()?;
            match operand_type_fe(second_byte) {
                Some(operand_type) => (0xFE00 | u16::from(second_byte), operand_type),
                None => return Err(malformed_error!("Invalid opcode: FE {:02X}", second_byte)),
            }
        } else {
            match operand_type(first_byte) {
                Some(operand_type) => (u16::from(first_byte), operand_type),
                None => return Err(malformed_error!("Invalid opcode: {:02X}", first_byte)),
            }
        };

        let operand = read_operand(&mut self.parser, operand_type, opcode)?;
        Ok(Instruction {
            offset,
            opcode,
            operand,
        })
    }
}

impl Iterator for Instructions<'_> {
    type Item = Result<Instruction>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || !self.parser.has_more_data() {
            return None;
        }

        let instruction = self.decode();
        self.failed = instruction.is_err();
        Some(instruction)
    }
}

/// Collects the token operands of `il`, in stream order, together with their opcode.
///
/// # Errors
///
/// Returns an error if the stream contains an unassigned opcode or a truncated operand.
pub fn token_operands(il: &[u8]) -> Result<Vec<(u16, Token)>> {
    let mut tokens = Vec::new();
    for instruction in Instructions::new(il) {
        let instruction = instruction?;
        if let Some(token) = instruction.token() {
            tokens.push((instruction.opcode, token));
        }
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operands() {
        #[rustfmt::skip]
        let il = [
            0x00,                               // nop
            0x1F, 0xF6,                         // ldc.i4.s -10
            0x11, 0xF0,                         // ldloc.s 240
            0x20, 0x78, 0x56, 0x34, 0x12,       // ldc.i4 0x12345678
            0x21, 1, 0, 0, 0, 0, 0, 0, 0,       // ldc.i8 1
            0x22, 0x00, 0x00, 0x80, 0x3F,       // ldc.r4 1.0
            0x72, 0x01, 0x00, 0x00, 0x70,       // ldstr
            0xFE, 0x0C, 0x02, 0x01,             // ldloc 0x0102
            0xFE, 0x06, 0x05, 0x00, 0x00, 0x06, // ldftn 0x06000005
            0x2A,                               // ret
        ];

        let instructions: Vec<Instruction> =
            Instructions::new(&il).collect::<Result<_>>().unwrap();
        assert_eq!(instructions.len(), 10);
        assert_eq!(instructions[1].operand, Operand::Int(-10));
        assert_eq!(instructions[2].operand, Operand::Int(240));
        assert_eq!(instructions[3].operand, Operand::Int(0x1234_5678));
        assert_eq!(instructions[4].operand, Operand::Int(1));
        assert_eq!(instructions[5].operand, Operand::Float(1.0));
        assert_eq!(instructions[6].token(), Some(Token::new(0x7000_0001)));
        assert_eq!(instructions[7].opcode, 0xFE0C);
        assert_eq!(instructions[7].operand, Operand::Int(0x0102));
        assert_eq!(instructions[8].opcode, opcodes::LDFTN);
        assert_eq!(instructions[8].offset, 33);
        assert_eq!(instructions[9].opcode, opcodes::RET);
    }

    #[test]
    fn switch_table() {
        #[rustfmt::skip]
        let il = [
            0x45, 0x02, 0x00, 0x00, 0x00,   // switch (2 targets)
            0x05, 0x00, 0x00, 0x00,
            0xFE, 0xFF, 0xFF, 0xFF,
            0x2A,
        ];

        let instructions: Vec<Instruction> =
            Instructions::new(&il).collect::<Result<_>>().unwrap();
        assert_eq!(instructions[0].operand, Operand::Switch(vec![5, -2]));
        assert_eq!(instructions[1].offset, 13);
    }

    #[test]
    fn token_operands_in_order() {
        #[rustfmt::skip]
        let il = [
            0x73, 0x01, 0x00, 0x00, 0x06,       // newobj
            0x7D, 0x02, 0x00, 0x00, 0x04,       // stfld
            0xFE, 0x07, 0x03, 0x00, 0x00, 0x0A, // ldvirtftn
            0x80, 0x04, 0x00, 0x00, 0x04,       // stsfld
            0x2A,
        ];

        let tokens = token_operands(&il).unwrap();
        assert_eq!(
            tokens,
            vec![
                (opcodes::NEWOBJ, Token::new(0x0600_0001)),
                (opcodes::STFLD, Token::new(0x0400_0002)),
                (opcodes::LDVIRTFTN, Token::new(0x0A00_0003)),
                (opcodes::STSFLD, Token::new(0x0400_0004)),
            ]
        );
    }

    #[test]
    fn virtual_calls() {
        let il = crate::test::Il::new()
            .ldarg_0()
            .callvirt(Token::new(0x0A00_0007))
            .ret()
            .build();

        assert_eq!(
            token_operands(&il).unwrap(),
            vec![(opcodes::CALLVIRT, Token::new(0x0A00_0007))]
        );
    }

    #[test]
    fn invalid_streams() {
        // Unassigned opcodes
        assert!(token_operands(&[0x24]).is_err());
        assert!(token_operands(&[0xFE, 0x08]).is_err());
        assert!(token_operands(&[0xA6]).is_err());

        // Truncated operand
        assert!(token_operands(&[0x28, 0x01, 0x00]).is_err());

        // Switch table claiming more targets than the stream holds
        assert!(token_operands(&[0x45, 0xFF, 0xFF, 0xFF, 0x0F]).is_err());

        // The iterator stops after the first error
        let mut instructions = Instructions::new(&[0x24, 0x00]);
        assert!(instructions.next().unwrap().is_err());
        assert!(instructions.next().is_none());
    }

    #[test]
    fn every_assigned_opcode_decodes() {
        for opcode in 0..=0xFF_u8 {
            if opcode == 0xFE {
                continue;
            }
            if let Some(operand) = operand_type(opcode) {
                let mut il = vec![opcode];
                il.extend_from_slice(&[0; 8]);
                let first = Instructions::new(&il).next().unwrap();
                assert!(first.is_ok(), "opcode {:02X} ({:?})", opcode, operand);
            }
        }
    }
}
