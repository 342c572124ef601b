//! Termir: a term-based intermediate representation of binary programs.
//!
//! Termir takes the micro-operations emitted by a disassembly/lifting engine
//! for every function of a binary, and builds a tree of subroutines, basic
//! blocks, definitions and jumps. Every node of the tree is wrapped in a
//! `Term`, which carries a deterministic identifier, and the whole tree is
//! annotated with the register layout and calling conventions of the target
//! platform. The result is serialized into an exchange document for
//! downstream dataflow analyses.
//!
//! The pipeline, leaves first:
//!
//! * `loader` reads the collaborator's document of raw micro-operations.
//! * `translator` converts micro-operations into `il::Def` and `il::Jmp`, and
//! partitions a function's operations into basic blocks.
//! * `extractor` translates every function, possibly in parallel, and
//! assembles the `il::Program`.
//! * `abi` resolves calling conventions for extern symbols and the stack
//! pointer of the `il::Project`.
//! * `exchange` serializes the finished `il::Project`.
//!
//! ```no_run
//! use termir::{exchange, extractor, loader, platform};
//!
//! # fn run() -> Result<(), termir::Error> {
//! let raw = loader::RawProgram::from_file(std::path::Path::new("pcode.json"))?;
//! let profile = platform::lookup(raw.cpu_architecture())?;
//! let project = extractor::Extractor::new(&profile).extract(&raw)?;
//! exchange::write_file(&project, std::path::Path::new("ir.json"), true)?;
//! # Ok(())
//! # }
//! ```

pub mod abi;
pub mod architecture;
mod error;
pub mod exchange;
pub mod extractor;
pub mod il;
pub mod loader;
pub mod platform;
#[cfg(test)]
mod tests;
pub mod translator;

pub use error::*;
