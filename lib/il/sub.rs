use crate::il::*;
use std::fmt;

/// A subroutine.
///
/// A `Sub` owns the registers and expressions referenced by its blocks.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Sub {
    name: String,
    address: u64,
    blocks: Vec<Term<Blk>>,
    registers: RegisterTable,
    expressions: ExpressionArena,
}

impl Sub {
    pub fn new(
        name: String,
        address: u64,
        blocks: Vec<Term<Blk>>,
        registers: RegisterTable,
        expressions: ExpressionArena,
    ) -> Sub {
        Sub {
            name,
            address,
            blocks,
            registers,
            expressions,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> u64 {
        self.address
    }

    /// The blocks of this subroutine, by ascending address.
    pub fn blocks(&self) -> &[Term<Blk>] {
        &self.blocks
    }

    pub fn block(&self, tid: &Tid) -> Option<&Term<Blk>> {
        self.blocks.iter().find(|block| block.tid() == tid)
    }

    pub fn registers(&self) -> &RegisterTable {
        &self.registers
    }

    pub fn expressions(&self) -> &ExpressionArena {
        &self.expressions
    }
}

impl fmt::Display for Sub {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "[ Sub: {} @ 0x{:X} ]", self.name, self.address)?;
        for block in &self.blocks {
            writeln!(f, "[ Blk: {} ]", block.tid())?;
            for def in block.term().defs() {
                writeln!(f, "{} {}", def.tid(), def.term().display(self))?;
            }
            for jmp in block.term().jmps() {
                writeln!(f, "{} {}", jmp.tid(), jmp.term().display(self))?;
            }
        }
        Ok(())
    }
}
