//! Registers, temporaries, and the variables which reference them.
//!
//! Every `Sub` owns one `RegisterTable`. The table is the sole owner of
//! register storage, and a `Variable` only ever holds an index into it. A
//! write to the low 32 bits of `rax` is therefore a `Subregister` of the
//! `rax` entry, and never a separate `eax` register, so all writes to one
//! physical register can be merged by looking at a single index.

use rustc_hash::FxHashMap;
use std::fmt;

/// An index into a `RegisterTable`.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct RegisterId(u32);

impl RegisterId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// A register or temporary value.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Register {
    name: String,
    bits: usize,
    is_temp: bool,
}

impl Register {
    pub fn new<S: Into<String>>(name: S, bits: usize, is_temp: bool) -> Register {
        Register {
            name: name.into(),
            bits,
            is_temp,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bits(&self) -> usize {
        self.bits
    }

    pub fn is_temp(&self) -> bool {
        self.is_temp
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.bits)
    }
}

/// The register storage of one subroutine.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RegisterTable {
    registers: Vec<Register>,
    index: FxHashMap<(String, usize), RegisterId>,
}

impl RegisterTable {
    pub fn new() -> RegisterTable {
        RegisterTable::default()
    }

    /// Get the id of a register, inserting it if it does not exist yet.
    ///
    /// Registers are keyed by name and width, so a temporary reused at two
    /// widths gets two entries.
    pub fn intern(&mut self, register: Register) -> RegisterId {
        let key = (register.name.clone(), register.bits);
        if let Some(id) = self.index.get(&key) {
            return *id;
        }
        let id = RegisterId(self.registers.len() as u32);
        self.registers.push(register);
        self.index.insert(key, id);
        id
    }

    /// Look up the id of a register by name and width.
    pub fn find(&self, name: &str, bits: usize) -> Option<RegisterId> {
        self.index.get(&(name.to_string(), bits)).copied()
    }

    pub fn register(&self, id: RegisterId) -> &Register {
        &self.registers[id.index()]
    }

    pub fn registers(&self) -> &[Register] {
        &self.registers
    }

    pub fn len(&self) -> usize {
        self.registers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registers.is_empty()
    }
}

/// The target of a definition, or a value read by an expression.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Variable {
    /// A full register or a temporary.
    Register(RegisterId),
    /// `bits` bits of `parent`, starting at bit `lsb`.
    Subregister {
        parent: RegisterId,
        lsb: usize,
        bits: usize,
    },
    /// The memory state. Only written through `Expression::Store`.
    Memory,
}

impl Variable {
    /// The width of this variable in bits. Memory has no width, and reports 0.
    pub fn bits(&self, registers: &RegisterTable) -> usize {
        match self {
            Variable::Register(id) => registers.register(*id).bits(),
            Variable::Subregister { bits, .. } => *bits,
            Variable::Memory => 0,
        }
    }

    /// The register which owns the storage of this variable.
    pub fn owner(&self) -> Option<RegisterId> {
        match self {
            Variable::Register(id) | Variable::Subregister { parent: id, .. } => Some(*id),
            Variable::Memory => None,
        }
    }

    /// Returns a displayable version of this variable.
    pub fn display<'v>(&'v self, registers: &'v RegisterTable) -> DisplayVariable<'v> {
        DisplayVariable {
            variable: self,
            registers,
        }
    }
}

pub struct DisplayVariable<'v> {
    variable: &'v Variable,
    registers: &'v RegisterTable,
}

impl<'v> fmt::Display for DisplayVariable<'v> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.variable {
            Variable::Register(id) => write!(f, "{}", self.registers.register(*id)),
            Variable::Subregister { parent, lsb, bits } => write!(
                f,
                "{}[{}..{}]",
                self.registers.register(*parent).name(),
                lsb,
                lsb + bits
            ),
            Variable::Memory => write!(f, "mem"),
        }
    }
}
