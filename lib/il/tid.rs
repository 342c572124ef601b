//! Term identifiers.
//!
//! A `Tid` is derived from an address and a structural position, and nothing
//! else. There is no counter hidden anywhere in the allocation path, so two
//! extractions of the same binary hand out the same identifiers, and
//! subroutines translated on different threads can never collide: every
//! identifier handed out for a subroutine embeds that subroutine's index.

use std::fmt;

/// What a `Tid` identifies.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum TidKind {
    Program,
    Sub,
    Blk,
    Instr,
    Extern,
    /// A direct target which is neither a block, a subroutine nor an extern
    /// symbol.
    Artificial,
}

impl TidKind {
    fn prefix(&self) -> &'static str {
        match self {
            TidKind::Program => "prog",
            TidKind::Sub => "sub",
            TidKind::Blk => "blk",
            TidKind::Instr => "instr",
            TidKind::Extern => "extern",
            TidKind::Artificial => "artificial",
        }
    }
}

/// An opaque, globally unique term identifier.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Tid {
    kind: TidKind,
    address: u64,
    sub: Option<u32>,
    block: Option<u32>,
    op: Option<u32>,
}

impl Tid {
    /// Allocate an identifier from an address and its structural position.
    ///
    /// This is the single allocation path. It is a pure function of its
    /// arguments.
    pub fn allocate(
        kind: TidKind,
        address: u64,
        sub: Option<u32>,
        block: Option<u32>,
        op: Option<u32>,
    ) -> Tid {
        Tid {
            kind,
            address,
            sub,
            block,
            op,
        }
    }

    pub fn program(image_base: u64) -> Tid {
        Tid::allocate(TidKind::Program, image_base, None, None, None)
    }

    pub fn sub(address: u64, sub_index: u32) -> Tid {
        Tid::allocate(TidKind::Sub, address, Some(sub_index), None, None)
    }

    /// Extern symbols are discriminated by their index in the address-sorted
    /// symbol table.
    pub fn external(address: u64, symbol_index: u32) -> Tid {
        Tid::allocate(TidKind::Extern, address, Some(symbol_index), None, None)
    }

    pub fn artificial(address: u64) -> Tid {
        Tid::allocate(TidKind::Artificial, address, None, None, None)
    }
}

impl fmt::Display for Tid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}_{:08x}", self.kind.prefix(), self.address)?;
        if let Some(sub) = self.sub {
            write!(f, "_s{}", sub)?;
        }
        if let Some(block) = self.block {
            write!(f, "_b{}", block)?;
        }
        if let Some(op) = self.op {
            write!(f, "_o{}", op)?;
        }
        Ok(())
    }
}

/// The slice of the identifier space reserved for one subroutine.
///
/// A `SubTidSpace` is `Copy` and carries no state besides the subroutine
/// index, so handing one to each worker is all the synchronization the
/// allocator needs.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SubTidSpace {
    sub_index: u32,
}

impl SubTidSpace {
    pub fn new(sub_index: u32) -> SubTidSpace {
        SubTidSpace { sub_index }
    }

    pub fn sub_index(&self) -> u32 {
        self.sub_index
    }

    /// The identifier of the subroutine itself.
    pub fn sub(&self, address: u64) -> Tid {
        Tid::sub(address, self.sub_index)
    }

    /// The identifier of the block with the given index, starting at `address`.
    pub fn block(&self, address: u64, block_index: u32) -> Tid {
        Tid::allocate(
            TidKind::Blk,
            address,
            Some(self.sub_index),
            Some(block_index),
            None,
        )
    }

    /// The identifier of the `op_index`th term of a block.
    ///
    /// Defs and jmps of a block share one op index sequence.
    pub fn instruction(&self, address: u64, block_index: u32, op_index: u32) -> Tid {
        Tid::allocate(
            TidKind::Instr,
            address,
            Some(self.sub_index),
            Some(block_index),
            Some(op_index),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn allocation_is_a_function_of_its_inputs() {
        let a = SubTidSpace::new(3).instruction(0x1000, 1, 2);
        let b = SubTidSpace::new(3).instruction(0x1000, 1, 2);
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "instr_00001000_s3_b1_o2");
    }

    #[test]
    fn partitions_do_not_collide() {
        let mut seen = HashSet::new();
        for sub in 0..4 {
            let space = SubTidSpace::new(sub);
            assert!(seen.insert(space.sub(0x1000)));
            for block in 0..4 {
                assert!(seen.insert(space.block(0x1000, block)));
                for op in 0..4 {
                    assert!(seen.insert(space.instruction(0x1000, block, op)));
                }
            }
        }
    }

    #[test]
    fn kinds_are_distinguished() {
        assert_ne!(Tid::sub(0x1000, 0), Tid::external(0x1000, 0));
        assert_eq!(Tid::artificial(0x2000).to_string(), "artificial_00002000");
        assert_eq!(Tid::program(0x400000).to_string(), "prog_00400000");
    }
}
