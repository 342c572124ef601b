//! Translation of micro-operations to termir IL.
//!
//! The translator works one micro-operation at a time. A value-producing or
//! memory-writing operation becomes one `Def`, plus one `Def` for every flag
//! it writes. A control operation becomes exactly one `Jmp`, preceded by its
//! flag `Def`s. Where an operation ends up in the block structure is decided
//! by the `BlockBuilder`, which hands the translator a `TargetResolver` to
//! turn direct target addresses into identifiers.
//!
//! Operations without known semantics, and operations whose operands do not
//! fit their mnemonic, degrade to a placeholder: a `Def` of an
//! `Expression::Unknown` to the operation's output. Control operations which
//! degrade become a `Jmp::Unresolved`. See `Options` to turn this into an
//! error instead.

use crate::il::*;
use crate::loader::{RawOp, RawOperand};
use crate::platform::{PlatformProfile, RegisterProperties};
use crate::Error;
use log::{debug, trace, warn};
use rustc_hash::FxHashMap;

mod block_builder;
mod opcode;
mod operand;
mod options;

pub use self::block_builder::*;
pub use self::opcode::*;
pub use self::operand::*;
pub use self::options::*;

/// Turns direct target addresses into identifiers.
pub trait TargetResolver {
    /// The identifier a direct branch to `address` transfers control to.
    fn branch_target(&self, address: u64) -> Tid;
    /// The identifier a direct call to `address` transfers control to.
    fn call_target(&self, address: u64) -> Tid;
    /// The identifier of the block beginning `offset` operations away from
    /// stream position `position`, if there is one.
    fn relative_target(&self, position: usize, offset: i64) -> Option<Tid>;
    /// The identifier of the block execution resumes at after the operation
    /// at stream position `position`, if there is one.
    fn return_site(&self, position: usize) -> Option<Tid>;
}

/// The result of translating a single micro-operation.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Translation {
    defs: Vec<Def>,
    jmp: Option<Jmp>,
}

impl Translation {
    pub fn defs(&self) -> &[Def] {
        &self.defs
    }

    pub fn jmp(&self) -> Option<&Jmp> {
        self.jmp.as_ref()
    }

    pub fn into_parts(self) -> (Vec<Def>, Option<Jmp>) {
        (self.defs, self.jmp)
    }
}

/// Translates micro-operations for one platform.
///
/// A `Translator` holds no per-subroutine state and may be shared between
/// threads. The state of a subroutine lives in its `OperandModel`.
pub struct Translator<'p> {
    profile: &'p PlatformProfile,
    properties: FxHashMap<&'p str, &'p RegisterProperties>,
    options: Options,
}

impl<'p> Translator<'p> {
    pub fn new(profile: &'p PlatformProfile, options: Options) -> Translator<'p> {
        Translator {
            profile,
            properties: profile.register_map(),
            options,
        }
    }

    pub fn profile(&self) -> &PlatformProfile {
        self.profile
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Create a fresh `OperandModel` for a subroutine.
    pub fn operand_model(&self) -> OperandModel<'_> {
        OperandModel::new(
            &self.properties,
            self.profile.endian(),
            self.profile.word_size(),
        )
    }

    /// Translate the micro-operation at stream position `position`.
    pub fn translate(
        &self,
        model: &mut OperandModel,
        op: &RawOp,
        position: usize,
        resolver: &dyn TargetResolver,
    ) -> Result<Translation, Error> {
        let opcode = Opcode::from_mnemonic(&op.mnemonic);
        trace!("Translating {} at 0x{:x}", op.mnemonic, op.address);
        let error = match self.translate_op(model, op, opcode, position, resolver) {
            Ok(translation) => return Ok(translation),
            Err(error) => error,
        };

        let reason = match error {
            OperandError::Unsupported => {
                if !self.options.unsupported_are_placeholders() {
                    return Err(Error::UnsupportedOperation {
                        address: op.address,
                        mnemonic: op.mnemonic.clone(),
                    });
                }
                debug!("Unsupported operation {} at 0x{:x}", op.mnemonic, op.address);
                format!("unsupported {}", op.mnemonic)
            }
            OperandError::Malformed(reason) => {
                if !self.options.unsupported_are_placeholders() {
                    return Err(Error::MalformedOperation {
                        address: op.address,
                        mnemonic: op.mnemonic.clone(),
                        reason,
                    });
                }
                warn!(
                    "Malformed operation {} at 0x{:x}: {}",
                    op.mnemonic, op.address, reason
                );
                format!("malformed {}: {}", op.mnemonic, reason)
            }
        };
        Ok(self.placeholder(model, op, opcode, reason))
    }

    fn translate_op(
        &self,
        model: &mut OperandModel,
        op: &RawOp,
        opcode: Opcode,
        position: usize,
        resolver: &dyn TargetResolver,
    ) -> Result<Translation, OperandError> {
        let mut defs = Vec::new();
        let jmp = match opcode {
            Opcode::Store => {
                // The address space may be given as a leading input.
                let (address, value) = match op.inputs.as_slice() {
                    [address, value] | [_, address, value] => (address, value),
                    inputs => {
                        return Err(
                            format!("expected 2 or 3 inputs, found {}", inputs.len()).into()
                        )
                    }
                };
                let address = model.read(address)?;
                let value = model.read(value)?;
                let endian = model.endian();
                let store = model.expressions_mut().store(address, value, endian);
                defs.push(Def::new(Variable::Memory, store));
                None
            }
            Opcode::Copy
            | Opcode::Load
            | Opcode::Subpiece
            | Opcode::Unary(_)
            | Opcode::Binary(_)
            | Opcode::Cast(_) => {
                let output = op
                    .output
                    .as_ref()
                    .ok_or_else(|| OperandError::from("missing output"))?;
                let value = model.value(opcode, &op.inputs, output.bits())?;
                defs.push(self.write(model, output, value)?);
                None
            }
            Opcode::Branch => Some(Jmp::Branch(self.direct(
                &op.inputs,
                position,
                resolver,
                |address| resolver.branch_target(address),
            )?)),
            Opcode::CBranch => {
                let condition = match op.inputs.as_slice() {
                    [_, condition] => model.read(condition)?,
                    inputs => {
                        return Err(format!("expected 2 inputs, found {}", inputs.len()).into())
                    }
                };
                Some(Jmp::CBranch {
                    target: self.direct(&op.inputs, position, resolver, |address| {
                        resolver.branch_target(address)
                    })?,
                    condition,
                })
            }
            Opcode::BranchInd => {
                let target = self.indirect_target(model, &op.inputs)?;
                Some(Jmp::BranchInd {
                    target,
                    hint: self.static_hint(model, target),
                })
            }
            Opcode::Call => Some(Jmp::Call {
                target: CallTarget::Direct(self.direct(
                    &op.inputs,
                    position,
                    resolver,
                    |address| resolver.call_target(address),
                )?),
                return_: resolver.return_site(position),
            }),
            Opcode::CallInd => {
                let target = self.indirect_target(model, &op.inputs)?;
                Some(Jmp::Call {
                    target: CallTarget::Indirect {
                        target,
                        hint: self.static_hint(model, target),
                    },
                    return_: resolver.return_site(position),
                })
            }
            Opcode::Return => {
                let value = match op.inputs.first() {
                    Some(input) => Some(model.read(input)?),
                    None => None,
                };
                Some(Jmp::Return(value))
            }
            Opcode::Unknown => return Err(OperandError::Unsupported),
        };

        for flag in &op.flags {
            let value = model.read(&flag.value)?;
            let var = model.variable(&flag.flag)?;
            defs.push(Def::new(var, value));
        }

        Ok(Translation { defs, jmp })
    }

    /// Assign `value` to an output operand. Outputs in memory become stores.
    fn write(
        &self,
        model: &mut OperandModel,
        output: &RawOperand,
        value: ExprId,
    ) -> Result<Def, OperandError> {
        match output {
            RawOperand::Ram { address, .. } => {
                let address = model.address(*address);
                let endian = model.endian();
                let store = model.expressions_mut().store(address, value, endian);
                Ok(Def::new(Variable::Memory, store))
            }
            _ => Ok(Def::new(model.variable(output)?, value)),
        }
    }

    /// Resolve the direct target of the operation at `position`. Absolute
    /// addresses go through `absolute`.
    fn direct<F>(
        &self,
        inputs: &[RawOperand],
        position: usize,
        resolver: &dyn TargetResolver,
        absolute: F,
    ) -> Result<Tid, OperandError>
    where
        F: Fn(u64) -> Tid,
    {
        match direct_target(inputs)? {
            DirectTarget::Address(address) => Ok(absolute(address)),
            DirectTarget::Relative(offset) => resolver
                .relative_target(position, offset)
                .ok_or_else(|| format!("relative target {} leaves the subroutine", offset).into()),
        }
    }

    fn indirect_target(
        &self,
        model: &mut OperandModel,
        inputs: &[RawOperand],
    ) -> Result<ExprId, OperandError> {
        match inputs.first() {
            Some(input) => model.read(input),
            None => Err("missing target".into()),
        }
    }

    /// A hint for an indirect target, when one is trivially visible.
    fn static_hint(&self, model: &OperandModel, target: ExprId) -> Option<StaticHint> {
        if !self.options.static_hints() {
            return None;
        }
        let expressions = model.expressions();
        let constant = |id: ExprId| match expressions.get(id) {
            Expression::Const(constant) => Some(constant.clone()),
            _ => None,
        };
        match expressions.get(target) {
            Expression::Const(constant) => Some(StaticHint::ConstantTarget(constant.clone())),
            Expression::Load { address, .. } => match expressions.get(*address) {
                Expression::Const(base) => Some(StaticHint::TableBase(base.clone())),
                Expression::Binary {
                    op: BinaryOp::Add,
                    lhs,
                    rhs,
                } => constant(*lhs)
                    .or_else(|| constant(*rhs))
                    .map(StaticHint::TableBase),
                _ => None,
            },
            _ => None,
        }
    }

    /// The translation of an operation we could not model.
    ///
    /// Data operations clobber their output, and every flag they write, with
    /// an unknown value. Control operations become `Jmp::Unresolved`.
    fn placeholder(
        &self,
        model: &mut OperandModel,
        op: &RawOp,
        opcode: Opcode,
        reason: String,
    ) -> Translation {
        let description = format!("{} at 0x{:x}", reason, op.address);
        if opcode.is_control() {
            return Translation {
                defs: Vec::new(),
                jmp: Some(Jmp::Unresolved {
                    reason: description,
                }),
            };
        }

        let mut defs = Vec::new();
        let (var, bits) = match op.output.as_ref() {
            Some(output) => match model.variable(output) {
                Ok(var) => (var, output.bits()),
                Err(_) => (Variable::Memory, 0),
            },
            None => (Variable::Memory, 0),
        };
        let value = model.expressions_mut().unknown(description.clone(), bits);
        defs.push(Def::new(var, value));

        for flag in &op.flags {
            if let Ok(var) = model.variable(&flag.flag) {
                let value = model
                    .expressions_mut()
                    .unknown(description.clone(), flag.flag.bits());
                defs.push(Def::new(var, value));
            }
        }
        Translation { defs, jmp: None }
    }
}
