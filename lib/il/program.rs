use crate::il::*;
use std::fmt;

/// The root of the IR: every subroutine of a binary, its extern symbols, and
/// its entry points.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Program {
    subs: Vec<Term<Sub>>,
    extern_symbols: Vec<ExternSymbol>,
    entry_points: Vec<Tid>,
    image_base: u64,
}

impl Program {
    pub fn new(
        subs: Vec<Term<Sub>>,
        extern_symbols: Vec<ExternSymbol>,
        entry_points: Vec<Tid>,
        image_base: u64,
    ) -> Program {
        Program {
            subs,
            extern_symbols,
            entry_points,
            image_base,
        }
    }

    /// The subroutines of this program, by ascending entry address.
    pub fn subs(&self) -> &[Term<Sub>] {
        &self.subs
    }

    pub fn sub(&self, address: u64) -> Option<&Term<Sub>> {
        self.subs
            .binary_search_by_key(&address, |sub| sub.term().address())
            .ok()
            .map(|index| &self.subs[index])
    }

    pub fn extern_symbols(&self) -> &[ExternSymbol] {
        &self.extern_symbols
    }

    pub fn entry_points(&self) -> &[Tid] {
        &self.entry_points
    }

    pub fn image_base(&self) -> u64 {
        self.image_base
    }

    /// Every identifier in this program, in tree order.
    pub fn tids(&self) -> Vec<&Tid> {
        let mut tids = Vec::new();
        for sub in &self.subs {
            tids.push(sub.tid());
            for block in sub.term().blocks() {
                tids.push(block.tid());
                tids.extend(block.term().defs().iter().map(|def| def.tid()));
                tids.extend(block.term().jmps().iter().map(|jmp| jmp.tid()));
            }
        }
        tids.extend(self.extern_symbols.iter().map(|symbol| symbol.tid()));
        tids
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for sub in &self.subs {
            write!(f, "{}", sub.term())?;
        }
        for symbol in &self.extern_symbols {
            writeln!(f, "extern {} {}", symbol.tid(), symbol.name())?;
        }
        Ok(())
    }
}
