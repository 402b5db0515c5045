//! # Packed `.astc` file format
//!
//! The persisted form consumed by the loader path:
//!
//! | Bytes  | Field                                        |
//! |--------|----------------------------------------------|
//! | 0–3    | ASCII `"ASTC"`                               |
//! | 4–7    | u32 LE version (= 1)                         |
//! | 8–11   | u32 LE payload size (bytes after the header) |
//! | 12–15  | u32 LE entry-point instruction index         |
//! | 16–    | packed u32 LE instructions                   |
//!
//! Each instruction word is `((opcode << 24) | (operand & 0x00FF_FFFF))`.
//! Operands with bit 23 set are sign-extended to full width on load;
//! existing `.astc` images depend on this.
//!
//! The packed numbering is the legacy loader subset — `0 = nop`,
//! `1 = load_const`, `2 = return` — not the in-memory opcode table. The
//! in-memory dialect is canonical; programs using instructions the packed
//! form cannot represent are rejected at encode time, and unknown packed
//! opcodes are rejected at load time.

use super::{AstcProgram, Instruction, Opcode, Operand};

/// Legacy packed opcode numbers.
const PACKED_NOP: u8 = 0;
const PACKED_LOAD_CONST: u8 = 1;
const PACKED_RETURN: u8 = 2;

const HEADER_SIZE: usize = 16;

/// Signed range representable in a 24-bit packed operand.
const OPERAND_MIN: i32 = -(1 << 23);
const OPERAND_MAX: i32 = (1 << 23) - 1;

#[derive(Debug, Clone, PartialEq)]
pub enum FileError {
    InvalidMagic,
    UnsupportedVersion(u32),
    Truncated {
        expected: usize,
        actual: usize,
    },
    UnknownOpcode {
        index: usize,
        opcode: u8,
    },
    /// The in-memory program uses an instruction or operand the packed
    /// subset cannot express.
    Unrepresentable {
        pc: usize,
        mnemonic: &'static str,
    },
}

impl std::fmt::Display for FileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileError::InvalidMagic => write!(f, "Invalid ASTC magic"),
            FileError::UnsupportedVersion(v) => write!(f, "Unsupported ASTC version {}", v),
            FileError::Truncated { expected, actual } => {
                write!(
                    f,
                    "Truncated ASTC image: expected {} payload bytes, found {}",
                    expected, actual
                )
            }
            FileError::UnknownOpcode { index, opcode } => {
                write!(
                    f,
                    "Unknown packed opcode {} at instruction {}",
                    opcode, index
                )
            }
            FileError::Unrepresentable { pc, mnemonic } => {
                write!(
                    f,
                    "Instruction '{}' at pc {} is not representable in the packed format",
                    mnemonic, pc
                )
            }
        }
    }
}

impl std::error::Error for FileError {}

/// Serialize a program into the packed format.
///
/// Only the legacy subset round-trips; anything else is an error rather
/// than a silent lossy encode.
pub fn encode_packed(program: &AstcProgram) -> Result<Vec<u8>, FileError> {
    let mut words: Vec<u32> = Vec::with_capacity(program.instructions.len());

    for (pc, inst) in program.instructions.iter().enumerate() {
        let unrepresentable = || FileError::Unrepresentable {
            pc,
            mnemonic: inst.opcode.mnemonic(),
        };

        let (opcode, operand) = match (inst.opcode, inst.operand) {
            (Opcode::Nop, _) => (PACKED_NOP, 0i32),
            (Opcode::I32Const, Operand::I32(v)) => {
                if !(OPERAND_MIN..=OPERAND_MAX).contains(&v) {
                    return Err(unrepresentable());
                }
                (PACKED_LOAD_CONST, v)
            }
            (Opcode::Return, _) => (PACKED_RETURN, 0i32),
            _ => return Err(unrepresentable()),
        };

        words.push(((opcode as u32) << 24) | ((operand as u32) & 0x00FF_FFFF));
    }

    let payload_size = (words.len() * 4) as u32;
    let mut bytes = Vec::with_capacity(HEADER_SIZE + words.len() * 4);
    bytes.extend_from_slice(&AstcProgram::MAGIC);
    bytes.extend_from_slice(&AstcProgram::VERSION.to_le_bytes());
    bytes.extend_from_slice(&payload_size.to_le_bytes());
    bytes.extend_from_slice(&(program.entry_point as u32).to_le_bytes());
    for word in words {
        bytes.extend_from_slice(&word.to_le_bytes());
    }
    Ok(bytes)
}

/// Deserialize a packed image into an in-memory program.
pub fn decode_packed(bytes: &[u8]) -> Result<AstcProgram, FileError> {
    if bytes.len() < HEADER_SIZE {
        return Err(FileError::Truncated {
            expected: HEADER_SIZE,
            actual: bytes.len(),
        });
    }
    if bytes[0..4] != AstcProgram::MAGIC {
        return Err(FileError::InvalidMagic);
    }

    let version = u32::from_le_bytes(bytes[4..8].try_into().unwrap());
    if version != AstcProgram::VERSION {
        return Err(FileError::UnsupportedVersion(version));
    }

    let payload_size = u32::from_le_bytes(bytes[8..12].try_into().unwrap()) as usize;
    let entry_point = u32::from_le_bytes(bytes[12..16].try_into().unwrap()) as usize;

    let payload = &bytes[HEADER_SIZE..];
    if payload.len() < payload_size || payload_size % 4 != 0 {
        return Err(FileError::Truncated {
            expected: payload_size,
            actual: payload.len(),
        });
    }

    let mut program = AstcProgram::new();
    program.entry_point = entry_point;

    for (index, chunk) in payload[..payload_size].chunks_exact(4).enumerate() {
        let word = u32::from_le_bytes(chunk.try_into().unwrap());
        let opcode = (word >> 24) as u8;
        let operand = sign_extend_24(word & 0x00FF_FFFF);

        let inst = match opcode {
            PACKED_NOP => Instruction::new(Opcode::Nop, Operand::None),
            PACKED_LOAD_CONST => Instruction::new(Opcode::I32Const, Operand::I32(operand)),
            PACKED_RETURN => Instruction::new(Opcode::Return, Operand::None),
            _ => return Err(FileError::UnknownOpcode { index, opcode }),
        };
        program.instructions.push(inst);
    }

    Ok(program)
}

/// Sign-extend a 24-bit operand: bit 23 set means negative.
fn sign_extend_24(operand: u32) -> i32 {
    if operand & 0x0080_0000 != 0 {
        (operand | 0xFF00_0000) as i32
    } else {
        operand as i32
    }
}
