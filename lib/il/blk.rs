use crate::il::*;
use crate::Error;

/// A basic block.
///
/// Definitions come first, in execution order, followed by at least one jump.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Blk {
    /// The address of the first operation of this block.
    address: u64,
    defs: Vec<Term<Def>>,
    jmps: Vec<Term<Jmp>>,
}

impl Blk {
    /// Create a new `Blk`.
    ///
    /// Returns an error if `jmps` is empty, as every block must have an
    /// explicit exit.
    pub fn new(address: u64, defs: Vec<Term<Def>>, jmps: Vec<Term<Jmp>>) -> Result<Blk, Error> {
        if jmps.is_empty() {
            return Err(format!("Block at 0x{:x} has no jumps", address).into());
        }
        Ok(Blk {
            address,
            defs,
            jmps,
        })
    }

    pub fn address(&self) -> u64 {
        self.address
    }

    pub fn defs(&self) -> &[Term<Def>] {
        &self.defs
    }

    pub fn jmps(&self) -> &[Term<Jmp>] {
        &self.jmps
    }
}
