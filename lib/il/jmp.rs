use crate::il::*;
use std::fmt;

/// Information about an indirect target which is trivially visible in the
/// target expression.
///
/// A hint is never a resolution. Downstream analyses remain responsible for
/// computing the actual targets of indirect transfers.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum StaticHint {
    /// The target expression is a constant.
    ConstantTarget(Constant),
    /// The target is loaded from a constant base, possibly plus an index, as
    /// in a jump table.
    TableBase(Constant),
}

/// The target of a call.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum CallTarget {
    Direct(Tid),
    Indirect {
        target: ExprId,
        hint: Option<StaticHint>,
    },
}

/// A control-transfer effect.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Jmp {
    Branch(Tid),
    CBranch {
        target: Tid,
        condition: ExprId,
    },
    Call {
        target: CallTarget,
        /// The block execution continues at when the callee returns.
        return_: Option<Tid>,
    },
    Return(Option<ExprId>),
    BranchInd {
        target: ExprId,
        hint: Option<StaticHint>,
    },
    /// A sentinel for control flow whose semantics could not be recovered.
    Unresolved {
        reason: String,
    },
}

impl Jmp {
    /// The identifier this jump transfers control to, if it is a direct jump.
    ///
    /// Indirect jumps and calls never have one.
    pub fn target(&self) -> Option<&Tid> {
        match self {
            Jmp::Branch(target) | Jmp::CBranch { target, .. } => Some(target),
            Jmp::Call {
                target: CallTarget::Direct(target),
                ..
            } => Some(target),
            Jmp::Call { .. } | Jmp::Return(_) | Jmp::BranchInd { .. } | Jmp::Unresolved { .. } => {
                None
            }
        }
    }

    pub fn is_indirect(&self) -> bool {
        matches!(
            self,
            Jmp::BranchInd { .. }
                | Jmp::Call {
                    target: CallTarget::Indirect { .. },
                    ..
                }
        )
    }

    /// Returns true if execution never continues past this jump within the
    /// same block sequence, without an explicit edge.
    pub fn is_terminating(&self) -> bool {
        !matches!(self, Jmp::CBranch { .. })
    }

    pub fn display<'j>(&'j self, sub: &'j Sub) -> DisplayJmp<'j> {
        DisplayJmp { jmp: self, sub }
    }
}

pub struct DisplayJmp<'j> {
    jmp: &'j Jmp,
    sub: &'j Sub,
}

impl<'j> fmt::Display for DisplayJmp<'j> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let expressions = self.sub.expressions();
        let registers = self.sub.registers();
        match self.jmp {
            Jmp::Branch(target) => write!(f, "branch {}", target),
            Jmp::CBranch { target, condition } => write!(
                f,
                "branch {} if {}",
                target,
                expressions.display(*condition, registers)
            ),
            Jmp::Call { target, return_ } => {
                match target {
                    CallTarget::Direct(tid) => write!(f, "call {}", tid)?,
                    CallTarget::Indirect { target, .. } => {
                        write!(f, "call [{}]", expressions.display(*target, registers))?
                    }
                }
                match return_ {
                    Some(return_) => write!(f, " returns {}", return_),
                    None => Ok(()),
                }
            }
            Jmp::Return(Some(value)) => {
                write!(f, "return [{}]", expressions.display(*value, registers))
            }
            Jmp::Return(None) => write!(f, "return"),
            Jmp::BranchInd { target, .. } => {
                write!(f, "branch [{}]", expressions.display(*target, registers))
            }
            Jmp::Unresolved { reason } => write!(f, "unresolved ({})", reason),
        }
    }
}
