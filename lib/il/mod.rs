//! Termir Intermediate Representation.
//!
//! # An Introduction
//!
//! The IR is a tree. A `Program` holds subroutines (`Sub`), a subroutine holds
//! basic blocks (`Blk`), and a block holds definitions (`Def`) followed by
//! jumps (`Jmp`). Each of these is wrapped in a `Term`, which pairs it with a
//! `Tid`.
//!
//! * **Faithful** - Every micro-operation is translated as-is. Extensions,
//! truncations, flag updates and byte order are explicit, and nothing is
//! simplified. A divergence between the IR and the micro-operations is a bug.
//! * **Deterministic** - A `Tid` is computed from an address and a structural
//! position, and nothing else. Extracting the same binary twice yields the
//! same identifiers.
//! * **Explicit control flow** - Blocks never fall through silently. Every
//! block ends with at least one `Jmp`, and when control flow could not be
//! recovered, that `Jmp` is `Jmp::Unresolved`.
//!
//! ## Ownership
//!
//! A `Sub` owns two tables: a `RegisterTable` and an `ExpressionArena`.
//! `Variable`s are indices into the register table, and `Expression` operands
//! are `ExprId` handles into the arena. A partial register, like `eax`, is a
//! `Variable::Subregister` of the full register `rax`, which is the only owner
//! of the storage.
//!
//! ## `Def`
//!
//! A `Def` assigns an expression to a variable. Loads are `Expression::Load`.
//! Stores assign an `Expression::Store` to `Variable::Memory`. Flag side
//! effects of a micro-operation become one `Def` per flag.
//!
//! ## `Jmp`
//!
//! * `Branch`, `CBranch`: direct branches to a `Tid`.
//! * `Call`: direct (`Tid`) or indirect (`Expression`) calls, with the `Tid`
//! of the block execution resumes at.
//! * `BranchInd`: indirect branches, with an expression target only.
//! * `Return`
//! * `Unresolved`: a sentinel for unrecoverable control flow.
//!
//! Indirect jumps never carry a target `Tid`. They may carry a `StaticHint`.
//!
//! ## `Project`
//!
//! A `Project` wraps the `Program` term with the stack pointer, register
//! layout and calling conventions of the target platform. This is the root of
//! the exchange document.

mod blk;
mod constant;
mod def;
mod expression;
mod extern_symbol;
mod jmp;
mod program;
mod project;
mod sub;
mod term;
mod tid;
mod variable;

pub use self::blk::*;
pub use self::constant::*;
pub use self::def::*;
pub use self::expression::*;
pub use self::extern_symbol::*;
pub use self::jmp::*;
pub use self::program::*;
pub use self::project::*;
pub use self::sub::*;
pub use self::term::*;
pub use self::tid::*;
pub use self::variable::*;
