//! The serialized shape of a `Project`.
//!
//! The IL references registers and expressions through per-subroutine
//! tables. The exchange document has no such tables: every variable and
//! expression is written out in full where it is used.

use crate::architecture::Endian;
use crate::il::{self, BinaryOp, CastOp, ExprId, UnaryOp};
use crate::platform::{RegisterConvention, RegisterProperties};
use serde::Serialize;

fn hex(value: u64) -> String {
    format!("0x{:x}", value)
}

/// A resolved value, or the explicit `"unknown"` marker.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution<T> {
    Resolved(T),
    Unknown,
}

impl<T, U> From<&il::Resolution<U>> for Resolution<T>
where
    for<'u> &'u U: Into<T>,
{
    fn from(resolution: &il::Resolution<U>) -> Resolution<T> {
        match resolution {
            il::Resolution::Resolved(value) => Resolution::Resolved(value.into()),
            il::Resolution::Unknown => Resolution::Unknown,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Term<T> {
    pub tid: String,
    pub term: T,
}

impl<T> Term<T> {
    fn new(tid: &il::Tid, term: T) -> Term<T> {
        Term {
            tid: tid.to_string(),
            term,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Register {
    pub name: String,
    pub bits: usize,
    pub is_temp: bool,
}

impl From<&il::Register> for Register {
    fn from(register: &il::Register) -> Register {
        Register {
            name: register.name().to_string(),
            bits: register.bits(),
            is_temp: register.is_temp(),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub enum Variable {
    Register(Register),
    Subregister {
        parent: Register,
        lsb: usize,
        bits: usize,
    },
    Memory,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Constant {
    pub value: String,
    pub bits: usize,
}

impl From<&il::Constant> for Constant {
    fn from(constant: &il::Constant) -> Constant {
        Constant {
            value: format!("0x{:x}", constant.value()),
            bits: constant.bits(),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub enum Expression {
    Var(Variable),
    Const(Constant),
    Unary {
        op: UnaryOp,
        arg: Box<Expression>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },
    Cast {
        op: CastOp,
        bits: usize,
        arg: Box<Expression>,
    },
    Subpiece {
        low_bit: usize,
        bits: usize,
        arg: Box<Expression>,
    },
    Load {
        address: Box<Expression>,
        bits: usize,
        endian: Endian,
    },
    Store {
        address: Box<Expression>,
        value: Box<Expression>,
        endian: Endian,
    },
    Unknown {
        description: String,
        bits: usize,
    },
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Def {
    pub var: Variable,
    pub value: Expression,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub enum StaticHint {
    ConstantTarget(Constant),
    TableBase(Constant),
}

impl From<&il::StaticHint> for StaticHint {
    fn from(hint: &il::StaticHint) -> StaticHint {
        match hint {
            il::StaticHint::ConstantTarget(constant) => StaticHint::ConstantTarget(constant.into()),
            il::StaticHint::TableBase(constant) => StaticHint::TableBase(constant.into()),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub enum CallTarget {
    Direct(String),
    Indirect {
        target: Expression,
        hint: Option<StaticHint>,
    },
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub enum Jmp {
    Branch(String),
    CBranch {
        target: String,
        condition: Expression,
    },
    Call {
        target: CallTarget,
        #[serde(rename = "return")]
        return_: Option<String>,
    },
    Return(Option<Expression>),
    BranchInd {
        target: Expression,
        hint: Option<StaticHint>,
    },
    Unresolved {
        reason: String,
    },
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Blk {
    pub address: String,
    pub defs: Vec<Term<Def>>,
    pub jmps: Vec<Term<Jmp>>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Sub {
    pub name: String,
    pub address: String,
    pub blocks: Vec<Term<Blk>>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub enum Arg {
    Register(Register),
    Stack { offset: u64, bits: usize },
}

impl From<&il::Arg> for Arg {
    fn from(arg: &il::Arg) -> Arg {
        match arg {
            il::Arg::Register(register) => Arg::Register(register.into()),
            il::Arg::Stack { offset, bits } => Arg::Stack {
                offset: *offset,
                bits: *bits,
            },
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct ExternSymbol {
    pub tid: String,
    pub addresses: Vec<String>,
    pub name: String,
    pub calling_convention: Resolution<String>,
    pub parameters: Vec<Arg>,
    pub return_values: Vec<Arg>,
    pub callee_saved: Vec<String>,
    pub no_return: bool,
    pub has_var_args: bool,
}

impl From<&il::ExternSymbol> for ExternSymbol {
    fn from(symbol: &il::ExternSymbol) -> ExternSymbol {
        ExternSymbol {
            tid: symbol.tid().to_string(),
            addresses: symbol.addresses().iter().map(|a| hex(*a)).collect(),
            name: symbol.name().to_string(),
            calling_convention: symbol.calling_convention().into(),
            parameters: symbol.parameters().iter().map(Arg::from).collect(),
            return_values: symbol.return_values().iter().map(Arg::from).collect(),
            callee_saved: symbol.callee_saved().to_vec(),
            no_return: symbol.no_return(),
            has_var_args: symbol.has_var_args(),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Program {
    pub subs: Vec<Term<Sub>>,
    pub extern_symbols: Vec<ExternSymbol>,
    pub entry_points: Vec<String>,
    pub image_base: String,
}

/// The root of the exchange document.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Project {
    pub program: Term<Program>,
    pub stack_pointer_register: Resolution<Register>,
    pub register_properties: Vec<RegisterProperties>,
    pub cpu_architecture: String,
    pub register_calling_convention: Vec<RegisterConvention>,
}

/// Writes out the variables and expressions of one `Sub`.
struct SubWriter<'s> {
    sub: &'s il::Sub,
}

impl<'s> SubWriter<'s> {
    fn register(&self, id: il::RegisterId) -> Register {
        self.sub.registers().register(id).into()
    }

    fn variable(&self, variable: &il::Variable) -> Variable {
        match variable {
            il::Variable::Register(id) => Variable::Register(self.register(*id)),
            il::Variable::Subregister { parent, lsb, bits } => Variable::Subregister {
                parent: self.register(*parent),
                lsb: *lsb,
                bits: *bits,
            },
            il::Variable::Memory => Variable::Memory,
        }
    }

    fn boxed(&self, id: ExprId) -> Box<Expression> {
        Box::new(self.expression(id))
    }

    fn expression(&self, id: ExprId) -> Expression {
        match self.sub.expressions().get(id) {
            il::Expression::Var(variable) => Expression::Var(self.variable(variable)),
            il::Expression::Const(constant) => Expression::Const(constant.into()),
            il::Expression::Unary { op, arg } => Expression::Unary {
                op: *op,
                arg: self.boxed(*arg),
            },
            il::Expression::Binary { op, lhs, rhs } => Expression::Binary {
                op: *op,
                lhs: self.boxed(*lhs),
                rhs: self.boxed(*rhs),
            },
            il::Expression::Cast { op, bits, arg } => Expression::Cast {
                op: *op,
                bits: *bits,
                arg: self.boxed(*arg),
            },
            il::Expression::Subpiece { low_bit, bits, arg } => Expression::Subpiece {
                low_bit: *low_bit,
                bits: *bits,
                arg: self.boxed(*arg),
            },
            il::Expression::Load {
                address,
                bits,
                endian,
            } => Expression::Load {
                address: self.boxed(*address),
                bits: *bits,
                endian: *endian,
            },
            il::Expression::Store {
                address,
                value,
                endian,
            } => Expression::Store {
                address: self.boxed(*address),
                value: self.boxed(*value),
                endian: *endian,
            },
            il::Expression::Unknown { description, bits } => Expression::Unknown {
                description: description.clone(),
                bits: *bits,
            },
        }
    }

    fn jmp(&self, jmp: &il::Jmp) -> Jmp {
        match jmp {
            il::Jmp::Branch(target) => Jmp::Branch(target.to_string()),
            il::Jmp::CBranch { target, condition } => Jmp::CBranch {
                target: target.to_string(),
                condition: self.expression(*condition),
            },
            il::Jmp::Call { target, return_ } => Jmp::Call {
                target: match target {
                    il::CallTarget::Direct(tid) => CallTarget::Direct(tid.to_string()),
                    il::CallTarget::Indirect { target, hint } => CallTarget::Indirect {
                        target: self.expression(*target),
                        hint: hint.as_ref().map(StaticHint::from),
                    },
                },
                return_: return_.as_ref().map(|tid| tid.to_string()),
            },
            il::Jmp::Return(value) => Jmp::Return(value.map(|value| self.expression(value))),
            il::Jmp::BranchInd { target, hint } => Jmp::BranchInd {
                target: self.expression(*target),
                hint: hint.as_ref().map(StaticHint::from),
            },
            il::Jmp::Unresolved { reason } => Jmp::Unresolved {
                reason: reason.clone(),
            },
        }
    }

    fn blk(&self, blk: &il::Blk) -> Blk {
        Blk {
            address: hex(blk.address()),
            defs: blk
                .defs()
                .iter()
                .map(|def| {
                    Term::new(
                        def.tid(),
                        Def {
                            var: self.variable(def.term().var()),
                            value: self.expression(def.term().value()),
                        },
                    )
                })
                .collect(),
            jmps: blk
                .jmps()
                .iter()
                .map(|jmp| Term::new(jmp.tid(), self.jmp(jmp.term())))
                .collect(),
        }
    }

    fn sub(&self) -> Sub {
        Sub {
            name: self.sub.name().to_string(),
            address: hex(self.sub.address()),
            blocks: self
                .sub
                .blocks()
                .iter()
                .map(|blk| Term::new(blk.tid(), self.blk(blk.term())))
                .collect(),
        }
    }
}

impl From<&il::Project> for Project {
    fn from(project: &il::Project) -> Project {
        let program = project.program().term();
        Project {
            program: Term::new(
                project.program().tid(),
                Program {
                    subs: program
                        .subs()
                        .iter()
                        .map(|sub| Term::new(sub.tid(), SubWriter { sub: sub.term() }.sub()))
                        .collect(),
                    extern_symbols: program
                        .extern_symbols()
                        .iter()
                        .map(ExternSymbol::from)
                        .collect(),
                    entry_points: program
                        .entry_points()
                        .iter()
                        .map(|tid| tid.to_string())
                        .collect(),
                    image_base: hex(program.image_base()),
                },
            ),
            stack_pointer_register: project.stack_pointer_register().into(),
            register_properties: project.register_properties().to_vec(),
            cpu_architecture: project.cpu_architecture().to_string(),
            register_calling_convention: project.register_calling_convention().to_vec(),
        }
    }
}
