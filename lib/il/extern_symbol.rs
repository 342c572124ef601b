use crate::il::*;

/// The outcome of matching something against platform metadata.
///
/// `Unknown` is an explicit marker, kept apart from an empty resolution, so
/// consumers can tell "could not resolve" from "resolved to nothing".
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Resolution<T> {
    Resolved(T),
    Unknown,
}

impl<T> Resolution<T> {
    pub fn resolved(&self) -> Option<&T> {
        match self {
            Resolution::Resolved(value) => Some(value),
            Resolution::Unknown => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Resolution::Unknown)
    }
}

/// The location of a parameter or return value.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Arg {
    Register(Register),
    /// A stack slot, at `offset` bytes from the stack pointer at the call.
    Stack { offset: u64, bits: usize },
}

/// A function the program imports.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ExternSymbol {
    tid: Tid,
    addresses: Vec<u64>,
    name: String,
    calling_convention: Resolution<String>,
    parameters: Vec<Arg>,
    return_values: Vec<Arg>,
    callee_saved: Vec<String>,
    no_return: bool,
    has_var_args: bool,
}

impl ExternSymbol {
    /// Create a new `ExternSymbol` whose convention has not been resolved.
    pub fn new(
        tid: Tid,
        addresses: Vec<u64>,
        name: String,
        no_return: bool,
        has_var_args: bool,
    ) -> ExternSymbol {
        ExternSymbol {
            tid,
            addresses,
            name,
            calling_convention: Resolution::Unknown,
            parameters: Vec::new(),
            return_values: Vec::new(),
            callee_saved: Vec::new(),
            no_return,
            has_var_args,
        }
    }

    /// Attach the resolved calling convention and argument locations.
    pub fn with_convention(
        mut self,
        calling_convention: String,
        parameters: Vec<Arg>,
        return_values: Vec<Arg>,
        callee_saved: Vec<String>,
    ) -> ExternSymbol {
        self.calling_convention = Resolution::Resolved(calling_convention);
        self.parameters = parameters;
        self.return_values = return_values;
        self.callee_saved = callee_saved;
        self
    }

    pub fn tid(&self) -> &Tid {
        &self.tid
    }

    pub fn addresses(&self) -> &[u64] {
        &self.addresses
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn calling_convention(&self) -> &Resolution<String> {
        &self.calling_convention
    }

    pub fn parameters(&self) -> &[Arg] {
        &self.parameters
    }

    pub fn return_values(&self) -> &[Arg] {
        &self.return_values
    }

    pub fn callee_saved(&self) -> &[String] {
        &self.callee_saved
    }

    pub fn no_return(&self) -> bool {
        self.no_return
    }

    pub fn has_var_args(&self) -> bool {
        self.has_var_args
    }
}
