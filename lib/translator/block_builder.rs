//! Partitioning a subroutine's micro-operations into basic blocks.
//!
//! Block boundaries are computed once, up front, from the set of leaders: the
//! stream positions at which a block must begin. A branch into the middle of
//! what would otherwise be one block therefore splits it, no matter where in
//! the stream the branch sits.

use crate::il::*;
use crate::loader::RawOp;
use crate::translator::{
    direct_target, relative_position, DirectTarget, Opcode, OperandModel, TargetResolver,
    Translator,
};
use crate::Error;
use log::debug;
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;
use std::ops::Range;

/// The position of the first operation at `address`, if there is one.
///
/// `operations` must be sorted by address.
fn position(operations: &[RawOp], address: u64) -> Option<usize> {
    let position = operations.partition_point(|op| op.address < address);
    match operations.get(position) {
        Some(op) if op.address == address => Some(position),
        _ => None,
    }
}

/// Find the stream positions at which blocks begin.
///
/// These are the first operation, the first operation at `entry`, the first
/// operation at every direct branch or call target inside the stream, the
/// operation every relative target points at, and every operation which
/// follows a control operation.
pub fn leaders(operations: &[RawOp], entry: u64) -> BTreeSet<usize> {
    let mut leaders = BTreeSet::new();
    if operations.is_empty() {
        return leaders;
    }
    leaders.insert(0);
    if let Some(position) = position(operations, entry) {
        leaders.insert(position);
    }
    for (index, op) in operations.iter().enumerate() {
        let opcode = Opcode::from_mnemonic(&op.mnemonic);
        if !opcode.is_control() {
            continue;
        }
        if opcode.has_direct_target() {
            let target = match direct_target(&op.inputs) {
                Ok(DirectTarget::Address(address)) => position(operations, address),
                Ok(DirectTarget::Relative(offset)) => relative_position(index, offset)
                    .filter(|target| *target < operations.len()),
                Err(_) => None,
            };
            if let Some(target) = target {
                leaders.insert(target);
            }
        }
        if index + 1 < operations.len() {
            leaders.insert(index + 1);
        }
    }
    leaders
}

/// Split `0..len` into ranges, each beginning at a leader.
pub fn partition(leaders: &BTreeSet<usize>, len: usize) -> Vec<Range<usize>> {
    let starts: Vec<usize> = leaders.iter().copied().filter(|l| *l < len).collect();
    starts
        .iter()
        .enumerate()
        .map(|(i, start)| *start..starts.get(i + 1).copied().unwrap_or(len))
        .collect()
}

/// Builds the blocks of one subroutine.
pub struct BlockBuilder<'a> {
    operations: &'a [RawOp],
    space: SubTidSpace,
    /// Identifiers of subroutines and extern symbols, by address.
    calls: &'a FxHashMap<u64, Tid>,
    blocks: Vec<Range<usize>>,
    block_tids: Vec<Tid>,
    /// Block index, by the stream position the block begins at.
    starts: FxHashMap<usize, usize>,
}

impl<'a> BlockBuilder<'a> {
    /// Lay out the blocks of the subroutine at `entry`.
    ///
    /// `operations` must be sorted by address, see `RawProgram::validate`.
    pub fn new(
        operations: &'a [RawOp],
        entry: u64,
        space: SubTidSpace,
        calls: &'a FxHashMap<u64, Tid>,
    ) -> BlockBuilder<'a> {
        let blocks = partition(&leaders(operations, entry), operations.len());
        let block_tids = blocks
            .iter()
            .enumerate()
            .map(|(index, range)| space.block(operations[range.start].address, index as u32))
            .collect();
        let starts = blocks
            .iter()
            .enumerate()
            .map(|(index, range)| (range.start, index))
            .collect();
        BlockBuilder {
            operations,
            space,
            calls,
            blocks,
            block_tids,
            starts,
        }
    }

    /// The stream ranges of the blocks, in order.
    pub fn blocks(&self) -> &[Range<usize>] {
        &self.blocks
    }

    /// The identifier of the block beginning at stream position `position`.
    fn block_at(&self, position: usize) -> Option<&Tid> {
        self.starts
            .get(&position)
            .and_then(|index| self.block_tids.get(*index))
    }

    fn local_target(&self, address: u64) -> Option<Tid> {
        position(self.operations, address)
            .and_then(|position| self.block_at(position))
            .cloned()
    }

    /// Translate every operation and assemble the blocks.
    pub fn build(
        &self,
        translator: &Translator,
        model: &mut OperandModel,
    ) -> Result<Vec<Term<Blk>>, Error> {
        let mut blocks = Vec::with_capacity(self.blocks.len());
        for (index, range) in self.blocks.iter().enumerate() {
            let block_index = index as u32;
            let mut defs = Vec::new();
            let mut jmps = Vec::new();
            let mut op_index = 0;

            for position in range.clone() {
                let op = &self.operations[position];
                let (op_defs, jmp) = translator
                    .translate(model, op, position, self)?
                    .into_parts();
                for def in op_defs {
                    let tid = self.space.instruction(op.address, block_index, op_index);
                    defs.push(Term::new(tid, def));
                    op_index += 1;
                }
                if let Some(jmp) = jmp {
                    let tid = self.space.instruction(op.address, block_index, op_index);
                    jmps.push(Term::new(tid, jmp));
                    op_index += 1;
                }
            }

            let falls_through = jmps
                .last()
                .map(|jmp: &Term<Jmp>| !jmp.term().is_terminating())
                .unwrap_or(true);
            if falls_through {
                let jmp = match self.block_tids.get(index + 1) {
                    Some(next) => Jmp::Branch(next.clone()),
                    None => {
                        debug!(
                            "Block at 0x{:x} falls off the end of its subroutine",
                            self.operations[range.start].address
                        );
                        Jmp::Unresolved {
                            reason: "no block follows".to_string(),
                        }
                    }
                };
                let address = self.operations[range.end - 1].address;
                let tid = self.space.instruction(address, block_index, op_index);
                jmps.push(Term::new(tid, jmp));
            }

            let address = self.operations[range.start].address;
            blocks.push(Term::new(
                self.block_tids[index].clone(),
                Blk::new(address, defs, jmps)?,
            ));
        }
        Ok(blocks)
    }
}

impl<'a> TargetResolver for BlockBuilder<'a> {
    fn branch_target(&self, address: u64) -> Tid {
        self.local_target(address)
            .or_else(|| self.calls.get(&address).cloned())
            .unwrap_or_else(|| Tid::artificial(address))
    }

    fn call_target(&self, address: u64) -> Tid {
        self.calls
            .get(&address)
            .cloned()
            .or_else(|| self.local_target(address))
            .unwrap_or_else(|| Tid::artificial(address))
    }

    fn relative_target(&self, position: usize, offset: i64) -> Option<Tid> {
        relative_position(position, offset)
            .and_then(|target| self.block_at(target))
            .cloned()
    }

    fn return_site(&self, position: usize) -> Option<Tid> {
        self.block_at(position + 1).cloned()
    }
}
