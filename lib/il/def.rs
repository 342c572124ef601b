use crate::il::*;
use std::fmt;

/// A data-defining effect: `var <- value`.
///
/// A `Def` never transfers control. Writes to memory target
/// `Variable::Memory` with an `Expression::Store` value.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Def {
    var: Variable,
    value: ExprId,
}

impl Def {
    pub fn new(var: Variable, value: ExprId) -> Def {
        Def { var, value }
    }

    pub fn var(&self) -> &Variable {
        &self.var
    }

    pub fn value(&self) -> ExprId {
        self.value
    }

    pub fn display<'d>(&'d self, sub: &'d Sub) -> DisplayDef<'d> {
        DisplayDef { def: self, sub }
    }
}

pub struct DisplayDef<'d> {
    def: &'d Def,
    sub: &'d Sub,
}

impl<'d> fmt::Display for DisplayDef<'d> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} = {}",
            self.def.var.display(self.sub.registers()),
            self.sub
                .expressions()
                .display(self.def.value, self.sub.registers())
        )
    }
}
