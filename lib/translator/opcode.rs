//! Classification of micro-operation mnemonics.

use crate::il::{BinaryOp, CastOp, UnaryOp};

/// What a micro-operation does, as far as the translator is concerned.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Opcode {
    Copy,
    Load,
    Store,
    Subpiece,
    Unary(UnaryOp),
    Binary(BinaryOp),
    Cast(CastOp),
    Branch,
    CBranch,
    BranchInd,
    Call,
    CallInd,
    Return,
    /// An operation with no known semantics.
    Unknown,
}

impl Opcode {
    pub fn from_mnemonic(mnemonic: &str) -> Opcode {
        match mnemonic {
            "COPY" => Opcode::Copy,
            "LOAD" => Opcode::Load,
            "STORE" => Opcode::Store,
            "SUBPIECE" => Opcode::Subpiece,

            "BRANCH" => Opcode::Branch,
            "CBRANCH" => Opcode::CBranch,
            "BRANCHIND" => Opcode::BranchInd,
            "CALL" => Opcode::Call,
            "CALLIND" => Opcode::CallInd,
            "RETURN" => Opcode::Return,

            "INT_ADD" => Opcode::Binary(BinaryOp::Add),
            "INT_SUB" => Opcode::Binary(BinaryOp::Sub),
            "INT_MULT" => Opcode::Binary(BinaryOp::Mul),
            "INT_DIV" => Opcode::Binary(BinaryOp::Divu),
            "INT_SDIV" => Opcode::Binary(BinaryOp::Divs),
            "INT_REM" => Opcode::Binary(BinaryOp::Modu),
            "INT_SREM" => Opcode::Binary(BinaryOp::Mods),
            "INT_AND" => Opcode::Binary(BinaryOp::And),
            "INT_OR" => Opcode::Binary(BinaryOp::Or),
            "INT_XOR" => Opcode::Binary(BinaryOp::Xor),
            "INT_LEFT" => Opcode::Binary(BinaryOp::Shl),
            "INT_RIGHT" => Opcode::Binary(BinaryOp::Shr),
            "INT_SRIGHT" => Opcode::Binary(BinaryOp::Sar),
            "INT_EQUAL" => Opcode::Binary(BinaryOp::Cmpeq),
            "INT_NOTEQUAL" => Opcode::Binary(BinaryOp::Cmpneq),
            "INT_LESS" => Opcode::Binary(BinaryOp::Cmpltu),
            "INT_SLESS" => Opcode::Binary(BinaryOp::Cmplts),
            "INT_LESSEQUAL" => Opcode::Binary(BinaryOp::Cmpleu),
            "INT_SLESSEQUAL" => Opcode::Binary(BinaryOp::Cmples),
            "INT_CARRY" => Opcode::Binary(BinaryOp::Carry),
            "INT_SCARRY" => Opcode::Binary(BinaryOp::Scarry),
            "INT_SBORROW" => Opcode::Binary(BinaryOp::Sborrow),
            "BOOL_AND" => Opcode::Binary(BinaryOp::BoolAnd),
            "BOOL_OR" => Opcode::Binary(BinaryOp::BoolOr),
            "BOOL_XOR" => Opcode::Binary(BinaryOp::BoolXor),
            "PIECE" => Opcode::Binary(BinaryOp::Piece),
            "FLOAT_ADD" => Opcode::Binary(BinaryOp::FloatAdd),
            "FLOAT_SUB" => Opcode::Binary(BinaryOp::FloatSub),
            "FLOAT_MULT" => Opcode::Binary(BinaryOp::FloatMul),
            "FLOAT_DIV" => Opcode::Binary(BinaryOp::FloatDiv),
            "FLOAT_EQUAL" => Opcode::Binary(BinaryOp::FloatCmpeq),
            "FLOAT_NOTEQUAL" => Opcode::Binary(BinaryOp::FloatCmpneq),
            "FLOAT_LESS" => Opcode::Binary(BinaryOp::FloatCmplt),
            "FLOAT_LESSEQUAL" => Opcode::Binary(BinaryOp::FloatCmple),

            "INT_NEGATE" => Opcode::Unary(UnaryOp::Not),
            "INT_2COMP" => Opcode::Unary(UnaryOp::Neg),
            "BOOL_NEGATE" => Opcode::Unary(UnaryOp::BoolNot),
            "POPCOUNT" => Opcode::Unary(UnaryOp::Popcount),
            "FLOAT_NEG" => Opcode::Unary(UnaryOp::FloatNeg),
            "FLOAT_ABS" => Opcode::Unary(UnaryOp::FloatAbs),
            "FLOAT_SQRT" => Opcode::Unary(UnaryOp::FloatSqrt),
            "FLOAT_CEIL" => Opcode::Unary(UnaryOp::FloatCeil),
            "FLOAT_FLOOR" => Opcode::Unary(UnaryOp::FloatFloor),
            "FLOAT_ROUND" => Opcode::Unary(UnaryOp::FloatRound),
            "FLOAT_NAN" => Opcode::Unary(UnaryOp::FloatNan),

            "INT_ZEXT" => Opcode::Cast(CastOp::Zext),
            "INT_SEXT" => Opcode::Cast(CastOp::Sext),
            "INT2FLOAT" => Opcode::Cast(CastOp::IntToFloat),
            "FLOAT2FLOAT" => Opcode::Cast(CastOp::FloatToFloat),
            "TRUNC" => Opcode::Cast(CastOp::FloatToInt),
            "BYTESWAP" => Opcode::Cast(CastOp::ByteSwap),

            _ => Opcode::Unknown,
        }
    }

    /// Returns true if this operation transfers control, and therefore ends
    /// a block.
    pub fn is_control(&self) -> bool {
        matches!(
            self,
            Opcode::Branch
                | Opcode::CBranch
                | Opcode::BranchInd
                | Opcode::Call
                | Opcode::CallInd
                | Opcode::Return
        )
    }

    /// Returns true if the first input of this operation is a direct target
    /// address.
    pub fn has_direct_target(&self) -> bool {
        matches!(self, Opcode::Branch | Opcode::CBranch | Opcode::Call)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        assert_eq!(Opcode::from_mnemonic("INT_SLESS"), Opcode::Binary(BinaryOp::Cmplts));
        assert_eq!(Opcode::from_mnemonic("TRUNC"), Opcode::Cast(CastOp::FloatToInt));
        assert_eq!(Opcode::from_mnemonic("CALLOTHER"), Opcode::Unknown);
        assert!(Opcode::from_mnemonic("RETURN").is_control());
        assert!(!Opcode::from_mnemonic("STORE").is_control());
        assert!(!Opcode::from_mnemonic("CALLIND").has_direct_target());
    }
}
