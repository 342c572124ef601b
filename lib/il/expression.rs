//! Expressions, stored in a per-subroutine arena.
//!
//! An `Expression` node never owns its operands. Operands are `ExprId`
//! handles into the `ExpressionArena` of the `Sub` the expression belongs to.
//! Pushing a node which already exists in the arena returns the existing
//! handle, so common sub-expressions are shared.
//!
//! Expressions mirror the micro-operation they were translated from. Sign
//! and zero extensions, truncations and byte order are always explicit, and
//! nothing is simplified.

use crate::architecture::Endian;
use crate::il::*;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A handle to an `Expression` in an `ExpressionArena`.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ExprId(u32);

impl ExprId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Divu,
    Divs,
    Modu,
    Mods,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    Sar,
    Cmpeq,
    Cmpneq,
    Cmpltu,
    Cmplts,
    Cmpleu,
    Cmples,
    Carry,
    Scarry,
    Sborrow,
    BoolAnd,
    BoolOr,
    BoolXor,
    /// Concatenation, with the left hand side as the most significant part.
    Piece,
    FloatAdd,
    FloatSub,
    FloatMul,
    FloatDiv,
    FloatCmpeq,
    FloatCmpneq,
    FloatCmplt,
    FloatCmple,
}

impl BinaryOp {
    /// Returns true if this operation yields a boolean.
    pub fn is_predicate(&self) -> bool {
        matches!(
            self,
            BinaryOp::Cmpeq
                | BinaryOp::Cmpneq
                | BinaryOp::Cmpltu
                | BinaryOp::Cmplts
                | BinaryOp::Cmpleu
                | BinaryOp::Cmples
                | BinaryOp::Carry
                | BinaryOp::Scarry
                | BinaryOp::Sborrow
                | BinaryOp::BoolAnd
                | BinaryOp::BoolOr
                | BinaryOp::BoolXor
                | BinaryOp::FloatCmpeq
                | BinaryOp::FloatCmpneq
                | BinaryOp::FloatCmplt
                | BinaryOp::FloatCmple
        )
    }

    fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Divu => "/u",
            BinaryOp::Divs => "/s",
            BinaryOp::Modu => "%u",
            BinaryOp::Mods => "%s",
            BinaryOp::And => "&",
            BinaryOp::Or => "|",
            BinaryOp::Xor => "^",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::Sar => ">>s",
            BinaryOp::Cmpeq => "==",
            BinaryOp::Cmpneq => "!=",
            BinaryOp::Cmpltu => "<u",
            BinaryOp::Cmplts => "<s",
            BinaryOp::Cmpleu => "<=u",
            BinaryOp::Cmples => "<=s",
            BinaryOp::Carry => "carry",
            BinaryOp::Scarry => "scarry",
            BinaryOp::Sborrow => "sborrow",
            BinaryOp::BoolAnd => "&&",
            BinaryOp::BoolOr => "||",
            BinaryOp::BoolXor => "^^",
            BinaryOp::Piece => "::",
            BinaryOp::FloatAdd => "f+",
            BinaryOp::FloatSub => "f-",
            BinaryOp::FloatMul => "f*",
            BinaryOp::FloatDiv => "f/",
            BinaryOp::FloatCmpeq => "f==",
            BinaryOp::FloatCmpneq => "f!=",
            BinaryOp::FloatCmplt => "f<",
            BinaryOp::FloatCmple => "f<=",
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum UnaryOp {
    /// Bitwise negation.
    Not,
    /// Two's complement negation.
    Neg,
    BoolNot,
    Popcount,
    FloatNeg,
    FloatAbs,
    FloatSqrt,
    FloatCeil,
    FloatFloor,
    FloatRound,
    FloatNan,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum CastOp {
    Zext,
    Sext,
    IntToFloat,
    FloatToFloat,
    FloatToInt,
    /// Reverse the byte order of the operand.
    ByteSwap,
}

/// The width, in bits, of every boolean result.
pub const BOOL_BITS: usize = 8;

/// An expression node.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Expression {
    Var(Variable),
    Const(Constant),
    Unary {
        op: UnaryOp,
        arg: ExprId,
    },
    Binary {
        op: BinaryOp,
        lhs: ExprId,
        rhs: ExprId,
    },
    Cast {
        op: CastOp,
        bits: usize,
        arg: ExprId,
    },
    /// `bits` bits of `arg`, starting at bit `low_bit`.
    Subpiece {
        low_bit: usize,
        bits: usize,
        arg: ExprId,
    },
    Load {
        address: ExprId,
        bits: usize,
        endian: Endian,
    },
    Store {
        address: ExprId,
        value: ExprId,
        endian: Endian,
    },
    /// A value we could not model, of known width.
    Unknown {
        description: String,
        bits: usize,
    },
}

/// The expression storage of one subroutine.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ExpressionArena {
    nodes: Vec<Expression>,
    interned: FxHashMap<Expression, ExprId>,
}

impl ExpressionArena {
    pub fn new() -> ExpressionArena {
        ExpressionArena::default()
    }

    /// Add a node to the arena, returning its handle.
    ///
    /// Operand handles must come from this arena.
    pub fn push(&mut self, expression: Expression) -> ExprId {
        if let Some(id) = self.interned.get(&expression) {
            return *id;
        }
        let id = ExprId(self.nodes.len() as u32);
        self.nodes.push(expression.clone());
        self.interned.insert(expression, id);
        id
    }

    pub fn get(&self, id: ExprId) -> &Expression {
        &self.nodes[id.index()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn var(&mut self, variable: Variable) -> ExprId {
        self.push(Expression::Var(variable))
    }

    pub fn constant(&mut self, constant: Constant) -> ExprId {
        self.push(Expression::Const(constant))
    }

    pub fn unary(&mut self, op: UnaryOp, arg: ExprId) -> ExprId {
        self.push(Expression::Unary { op, arg })
    }

    pub fn binary(&mut self, op: BinaryOp, lhs: ExprId, rhs: ExprId) -> ExprId {
        self.push(Expression::Binary { op, lhs, rhs })
    }

    pub fn cast(&mut self, op: CastOp, bits: usize, arg: ExprId) -> ExprId {
        self.push(Expression::Cast { op, bits, arg })
    }

    pub fn subpiece(&mut self, low_bit: usize, bits: usize, arg: ExprId) -> ExprId {
        self.push(Expression::Subpiece { low_bit, bits, arg })
    }

    pub fn load(&mut self, address: ExprId, bits: usize, endian: Endian) -> ExprId {
        self.push(Expression::Load {
            address,
            bits,
            endian,
        })
    }

    pub fn store(&mut self, address: ExprId, value: ExprId, endian: Endian) -> ExprId {
        self.push(Expression::Store {
            address,
            value,
            endian,
        })
    }

    pub fn unknown<S: Into<String>>(&mut self, description: S, bits: usize) -> ExprId {
        self.push(Expression::Unknown {
            description: description.into(),
            bits,
        })
    }

    /// Return the width of the value of an expression in bits.
    ///
    /// Stores yield the memory state, which has no width.
    pub fn bits(&self, id: ExprId, registers: &RegisterTable) -> usize {
        match self.get(id) {
            Expression::Var(variable) => variable.bits(registers),
            Expression::Const(constant) => constant.bits(),
            Expression::Unary { op, arg } => match op {
                UnaryOp::FloatNan => BOOL_BITS,
                _ => self.bits(*arg, registers),
            },
            Expression::Binary { op, lhs, rhs } => {
                if op.is_predicate() {
                    BOOL_BITS
                } else if *op == BinaryOp::Piece {
                    self.bits(*lhs, registers) + self.bits(*rhs, registers)
                } else {
                    self.bits(*lhs, registers)
                }
            }
            Expression::Cast { bits, .. }
            | Expression::Subpiece { bits, .. }
            | Expression::Load { bits, .. }
            | Expression::Unknown { bits, .. } => *bits,
            Expression::Store { .. } => 0,
        }
    }

    /// Returns a displayable version of an expression.
    pub fn display<'a>(&'a self, id: ExprId, registers: &'a RegisterTable) -> DisplayExpression<'a> {
        DisplayExpression {
            arena: self,
            registers,
            id,
        }
    }
}

pub struct DisplayExpression<'a> {
    arena: &'a ExpressionArena,
    registers: &'a RegisterTable,
    id: ExprId,
}

impl<'a> DisplayExpression<'a> {
    fn child(&self, id: ExprId) -> DisplayExpression<'a> {
        DisplayExpression {
            arena: self.arena,
            registers: self.registers,
            id,
        }
    }
}

impl<'a> fmt::Display for DisplayExpression<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.arena.get(self.id) {
            Expression::Var(variable) => write!(f, "{}", variable.display(self.registers)),
            Expression::Const(constant) => write!(f, "{}", constant),
            Expression::Unary { op, arg } => write!(f, "{:?}({})", op, self.child(*arg)),
            Expression::Binary { op, lhs, rhs } => write!(
                f,
                "({} {} {})",
                self.child(*lhs),
                op.symbol(),
                self.child(*rhs)
            ),
            Expression::Cast { op, bits, arg } => {
                write!(f, "{:?}.{}({})", op, bits, self.child(*arg))
            }
            Expression::Subpiece { low_bit, bits, arg } => {
                write!(f, "{}[{}..{}]", self.child(*arg), low_bit, low_bit + bits)
            }
            Expression::Load { address, bits, .. } => {
                write!(f, "[{}]:{}", self.child(*address), bits)
            }
            Expression::Store { address, value, .. } => {
                write!(f, "store([{}], {})", self.child(*address), self.child(*value))
            }
            Expression::Unknown { description, bits } => {
                write!(f, "unknown({}):{}", description, bits)
            }
        }
    }
}
