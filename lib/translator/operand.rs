//! Conversion of raw operands into variables and expressions.

use crate::architecture::Endian;
use crate::il::*;
use crate::loader::RawOperand;
use crate::platform::RegisterProperties;
use crate::translator::Opcode;
use rustc_hash::FxHashMap;

/// Why an operand, or an operation, could not be modelled.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum OperandError {
    /// The operation has no known semantics.
    Unsupported,
    /// The operation is known, but its operands do not fit it.
    Malformed(String),
}

impl From<String> for OperandError {
    fn from(reason: String) -> OperandError {
        OperandError::Malformed(reason)
    }
}

impl From<&str> for OperandError {
    fn from(reason: &str) -> OperandError {
        OperandError::Malformed(reason.to_string())
    }
}

/// Operands wider than this are malformed.
pub const MAX_BITS: usize = 4096;

fn check_width(bits: usize) -> Result<(), OperandError> {
    if bits > MAX_BITS {
        Err(format!("{} bits exceed the widest supported operand", bits).into())
    } else {
        Ok(())
    }
}

/// Where a direct branch or call transfers control to.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DirectTarget {
    /// An absolute address, given as a memory reference.
    Address(u64),
    /// A distance in micro-operations from the transferring operation, given
    /// as a constant. These stay inside the operations of one instruction.
    Relative(i64),
}

/// Read the direct target of a branch or call from its first input.
pub fn direct_target(inputs: &[RawOperand]) -> Result<DirectTarget, OperandError> {
    match inputs.first() {
        Some(RawOperand::Ram { address, .. }) => Ok(DirectTarget::Address(*address)),
        Some(RawOperand::Constant { value, .. }) => Constant::from_biguint(value.clone(), 64)
            .value_u64()
            .map(|offset| DirectTarget::Relative(offset as i64))
            .ok_or_else(|| "relative target out of range".into()),
        Some(_) => Err("direct target is not an address".into()),
        None => Err("missing target".into()),
    }
}

/// The stream position `offset` operations away from `position`.
pub fn relative_position(position: usize, offset: i64) -> Option<usize> {
    i64::try_from(position)
        .ok()
        .and_then(|position| position.checked_add(offset))
        .and_then(|target| usize::try_from(target).ok())
}

/// Builds the variables and expressions of one subroutine.
///
/// The model owns the `RegisterTable` and `ExpressionArena` of the
/// subroutine while it is translated. Partial registers are resolved against
/// the platform's register properties, so `EAX` becomes bits 0 to 32 of
/// `RAX`.
pub struct OperandModel<'t> {
    properties: &'t FxHashMap<&'t str, &'t RegisterProperties>,
    endian: Endian,
    address_bits: usize,
    registers: RegisterTable,
    expressions: ExpressionArena,
}

impl<'t> OperandModel<'t> {
    pub fn new(
        properties: &'t FxHashMap<&'t str, &'t RegisterProperties>,
        endian: Endian,
        address_bits: usize,
    ) -> OperandModel<'t> {
        OperandModel {
            properties,
            endian,
            address_bits,
            registers: RegisterTable::new(),
            expressions: ExpressionArena::new(),
        }
    }

    pub fn endian(&self) -> Endian {
        self.endian
    }

    pub fn registers(&self) -> &RegisterTable {
        &self.registers
    }

    pub fn expressions(&self) -> &ExpressionArena {
        &self.expressions
    }

    pub fn expressions_mut(&mut self) -> &mut ExpressionArena {
        &mut self.expressions
    }

    pub fn into_parts(self) -> (RegisterTable, ExpressionArena) {
        (self.registers, self.expressions)
    }

    /// Resolve a register name to a variable, as a `Subregister` of its base
    /// register when it is a partial register.
    fn register(&mut self, name: &str, bits: usize) -> Result<Variable, OperandError> {
        if bits == 0 {
            return Err(format!("register {} has no width", name).into());
        }
        check_width(bits)?;
        let properties = match self.properties.get(name) {
            Some(properties) => *properties,
            None => {
                let id = self.registers.intern(Register::new(name, bits, false));
                return Ok(Variable::Register(id));
            }
        };
        let base_bits = self
            .properties
            .get(properties.base_register())
            .map(|base| base.size() * 8)
            .unwrap_or(properties.size() * 8);
        let lsb = properties.lsb() * 8;
        if lsb + bits > base_bits {
            return Err(format!(
                "{} bits of {} exceed base register {}",
                bits,
                name,
                properties.base_register()
            )
            .into());
        }
        let parent = self
            .registers
            .intern(Register::new(properties.base_register(), base_bits, false));
        if lsb == 0 && bits == base_bits {
            Ok(Variable::Register(parent))
        } else {
            Ok(Variable::Subregister { parent, lsb, bits })
        }
    }

    /// Get the variable an operand writes to.
    ///
    /// Only registers and temporaries are variables. Writes to memory are
    /// stores, see `Translator`.
    pub fn variable(&mut self, operand: &RawOperand) -> Result<Variable, OperandError> {
        match operand {
            RawOperand::Register { name, bits } => self.register(name, *bits),
            RawOperand::Temporary { offset, bits } => {
                check_width(*bits)?;
                let temp = Register::new(format!("$U{:x}", offset), *bits, true);
                Ok(Variable::Register(self.registers.intern(temp)))
            }
            RawOperand::Constant { .. } | RawOperand::Ram { .. } | RawOperand::Op { .. } => {
                Err("operand is not a variable".into())
            }
        }
    }

    /// An absolute address, as a constant expression.
    pub fn address(&mut self, address: u64) -> ExprId {
        self.expressions
            .constant(Constant::new(address, self.address_bits))
    }

    /// Get the expression for the value of an operand.
    pub fn read(&mut self, operand: &RawOperand) -> Result<ExprId, OperandError> {
        match operand {
            RawOperand::Register { .. } | RawOperand::Temporary { .. } => {
                let variable = self.variable(operand)?;
                Ok(self.expressions.var(variable))
            }
            RawOperand::Constant { value, bits } => {
                check_width(*bits)?;
                Ok(self
                    .expressions
                    .constant(Constant::from_biguint(value.clone(), *bits)))
            }
            RawOperand::Ram { address, bits } => {
                check_width(*bits)?;
                let address = self.address(*address);
                Ok(self.expressions.load(address, *bits, self.endian))
            }
            RawOperand::Op {
                mnemonic,
                inputs,
                bits,
            } => self.value(Opcode::from_mnemonic(mnemonic), inputs, *bits),
        }
    }

    fn unary_input<'a>(&self, inputs: &'a [RawOperand]) -> Result<&'a RawOperand, OperandError> {
        match inputs {
            [input] => Ok(input),
            _ => Err(format!("expected 1 input, found {}", inputs.len()).into()),
        }
    }

    fn binary_inputs<'a>(
        &self,
        inputs: &'a [RawOperand],
    ) -> Result<(&'a RawOperand, &'a RawOperand), OperandError> {
        match inputs {
            [lhs, rhs] => Ok((lhs, rhs)),
            _ => Err(format!("expected 2 inputs, found {}", inputs.len()).into()),
        }
    }

    /// Build the expression computed by a value-producing operation, with
    /// an output of `bits` bits.
    pub fn value(
        &mut self,
        opcode: Opcode,
        inputs: &[RawOperand],
        bits: usize,
    ) -> Result<ExprId, OperandError> {
        check_width(bits)?;
        match opcode {
            Opcode::Copy => {
                let input = self.unary_input(inputs)?;
                self.read(input)
            }
            Opcode::Load => {
                // The address space may be given as a leading input.
                let address = match inputs {
                    [address] | [_, address] => self.read(address)?,
                    _ => {
                        return Err(
                            format!("expected 1 or 2 inputs, found {}", inputs.len()).into()
                        )
                    }
                };
                Ok(self.expressions.load(address, bits, self.endian))
            }
            Opcode::Subpiece => {
                let (input, offset) = self.binary_inputs(inputs)?;
                let low_bit = match offset {
                    RawOperand::Constant { value, .. } => Constant::from_biguint(value.clone(), 64)
                        .value_u64()
                        .and_then(|offset| usize::try_from(offset).ok())
                        .and_then(|offset| offset.checked_mul(8))
                        .filter(|low_bit| *low_bit < MAX_BITS)
                        .ok_or_else(|| OperandError::from("subpiece offset out of range"))?,
                    _ => return Err("subpiece offset is not a constant".into()),
                };
                let arg = self.read(input)?;
                Ok(self.expressions.subpiece(low_bit, bits, arg))
            }
            Opcode::Unary(op) => {
                let input = self.unary_input(inputs)?;
                let arg = self.read(input)?;
                Ok(self.expressions.unary(op, arg))
            }
            Opcode::Binary(op) => {
                let (lhs, rhs) = self.binary_inputs(inputs)?;
                let lhs = self.read(lhs)?;
                let rhs = self.read(rhs)?;
                Ok(self.expressions.binary(op, lhs, rhs))
            }
            Opcode::Cast(op) => {
                let input = self.unary_input(inputs)?;
                let arg = self.read(input)?;
                Ok(self.expressions.cast(op, bits, arg))
            }
            Opcode::Store
            | Opcode::Branch
            | Opcode::CBranch
            | Opcode::BranchInd
            | Opcode::Call
            | Opcode::CallInd
            | Opcode::Return => Err("operation does not produce a value".into()),
            Opcode::Unknown => Err(OperandError::Unsupported),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform;
    use num_bigint::BigUint;

    fn register(name: &str, bits: usize) -> RawOperand {
        RawOperand::Register {
            name: name.to_string(),
            bits,
        }
    }

    #[test]
    fn partial_registers_are_subregisters() {
        let profile = platform::lookup("x86_64").unwrap();
        let properties = profile.register_map();
        let mut model = OperandModel::new(&properties, Endian::Little, 64);

        let rax = model.variable(&register("RAX", 64)).unwrap();
        let eax = model.variable(&register("EAX", 32)).unwrap();
        let ah = model.variable(&register("AH", 8)).unwrap();
        let parent = match rax {
            Variable::Register(id) => id,
            other => panic!("unexpected {:?}", other),
        };
        assert_eq!(
            eax,
            Variable::Subregister {
                parent,
                lsb: 0,
                bits: 32
            }
        );
        assert_eq!(
            ah,
            Variable::Subregister {
                parent,
                lsb: 8,
                bits: 8
            }
        );
        assert_eq!(model.registers().len(), 1);
    }

    #[test]
    fn unknown_registers_and_temporaries() {
        let profile = platform::lookup("x86_64").unwrap();
        let properties = profile.register_map();
        let mut model = OperandModel::new(&properties, Endian::Little, 64);

        let zf = model.variable(&register("ZF", 8)).unwrap();
        let temp = model
            .variable(&RawOperand::Temporary {
                offset: 0x100,
                bits: 32,
            })
            .unwrap();
        let registers = model.registers();
        assert_eq!(zf.display(registers).to_string(), "ZF:8");
        assert_eq!(temp.display(registers).to_string(), "$U100:32");
        assert!(registers.register(temp.owner().unwrap()).is_temp());
    }

    #[test]
    fn oversized_partial_register() {
        let profile = platform::lookup("x86_64").unwrap();
        let properties = profile.register_map();
        let mut model = OperandModel::new(&properties, Endian::Little, 64);
        assert!(matches!(
            model.variable(&register("AH", 64)),
            Err(OperandError::Malformed(_))
        ));
    }

    #[test]
    fn oversized_operands_are_malformed() {
        let profile = platform::lookup("x86_64").unwrap();
        let properties = profile.register_map();
        let mut model = OperandModel::new(&properties, Endian::Little, 64);

        assert!(matches!(
            model.variable(&register("AH", usize::MAX)),
            Err(OperandError::Malformed(_))
        ));
        assert!(matches!(
            model.read(&RawOperand::Constant {
                value: BigUint::from(1u32),
                bits: usize::MAX,
            }),
            Err(OperandError::Malformed(_))
        ));
        assert!(matches!(
            model.value(
                Opcode::Subpiece,
                &[
                    register("RAX", 64),
                    RawOperand::Constant {
                        value: BigUint::from(u64::MAX),
                        bits: 64,
                    },
                ],
                32,
            ),
            Err(OperandError::Malformed(_))
        ));
    }

    #[test]
    fn constant_targets_are_relative() {
        let backwards = RawOperand::Constant {
            value: BigUint::from(u64::MAX - 1),
            bits: 64,
        };
        assert_eq!(
            direct_target(&[backwards]),
            Ok(DirectTarget::Relative(-2))
        );
        assert_eq!(
            direct_target(&[RawOperand::Ram {
                address: 0x2010,
                bits: 64,
            }]),
            Ok(DirectTarget::Address(0x2010))
        );
        assert_eq!(relative_position(5, -2), Some(3));
        assert_eq!(relative_position(1, -2), None);
    }

    #[test]
    fn values() {
        let profile = platform::lookup("x86_64").unwrap();
        let properties = profile.register_map();
        let mut model = OperandModel::new(&properties, Endian::Little, 64);

        let one = RawOperand::Constant {
            value: BigUint::from(1u32),
            bits: 64,
        };
        let sum = model
            .value(
                Opcode::Binary(BinaryOp::Add),
                &[register("RAX", 64), one.clone()],
                64,
            )
            .unwrap();
        assert_eq!(
            model.expressions().display(sum, model.registers()).to_string(),
            "(RAX:64 + 0x1:64)"
        );

        let low = model
            .value(
                Opcode::Subpiece,
                &[
                    register("RAX", 64),
                    RawOperand::Constant {
                        value: BigUint::from(4u32),
                        bits: 32,
                    },
                ],
                32,
            )
            .unwrap();
        assert_eq!(
            model.expressions().display(low, model.registers()).to_string(),
            "RAX:64[32..64]"
        );

        let global = model
            .read(&RawOperand::Ram {
                address: 0x4000,
                bits: 32,
            })
            .unwrap();
        assert_eq!(
            model.expressions().display(global, model.registers()).to_string(),
            "[0x4000:64]:32"
        );

        assert_eq!(
            model.value(Opcode::Copy, &[one.clone(), one], 64),
            Err(OperandError::Malformed("expected 1 input, found 2".to_string()))
        );
        assert_eq!(
            model.value(Opcode::Unknown, &[], 64),
            Err(OperandError::Unsupported)
        );
    }
}
