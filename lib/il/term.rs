//! The identifier-tagged wrapper around every node of the IR.

use crate::il::*;

mod private {
    pub trait Sealed {}
}

/// The closed set of payloads a `Term` may carry.
///
/// This trait is sealed. Consumers match on the concrete payload types rather
/// than extending the set.
pub trait TermPayload: private::Sealed {}

impl private::Sealed for Program {}
impl private::Sealed for Sub {}
impl private::Sealed for Blk {}
impl private::Sealed for Def {}
impl private::Sealed for Jmp {}

impl TermPayload for Program {}
impl TermPayload for Sub {}
impl TermPayload for Blk {}
impl TermPayload for Def {}
impl TermPayload for Jmp {}

/// A `Tid` paired with a payload.
///
/// Two terms with equal payloads but different identifiers are different
/// terms. Once built, a term is never mutated; there are no mutable accessors.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Term<T: TermPayload> {
    tid: Tid,
    term: T,
}

impl<T: TermPayload> Term<T> {
    pub fn new(tid: Tid, term: T) -> Term<T> {
        Term { tid, term }
    }

    pub fn tid(&self) -> &Tid {
        &self.tid
    }

    pub fn term(&self) -> &T {
        &self.term
    }

    /// Consume this term, returning its parts.
    pub fn into_parts(self) -> (Tid, T) {
        (self.tid, self.term)
    }
}
