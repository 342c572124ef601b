//! Resolution of calling conventions and register roles.
//!
//! The lifting engine tells us which convention an imported function uses,
//! at best by name. The `AbiResolver` matches those names against the
//! platform profile and works out where parameters and return values live.
//! Anything it cannot match resolves to `Resolution::Unknown`. This is never
//! an error.

use crate::il::*;
use crate::loader::RawExternSymbol;
use crate::platform::{PlatformProfile, RegisterConvention};
use log::debug;

/// Applies a platform's calling conventions.
pub struct AbiResolver<'p> {
    profile: &'p PlatformProfile,
}

impl<'p> AbiResolver<'p> {
    pub fn new(profile: &'p PlatformProfile) -> AbiResolver<'p> {
        AbiResolver { profile }
    }

    /// The convention named `requested`, or the platform default when no
    /// name is given.
    ///
    /// Conventions which pass no integer parameters in registers have no
    /// argument-register mapping, and resolve to `Unknown`.
    pub fn convention(&self, requested: Option<&str>) -> Resolution<&'p RegisterConvention> {
        let name = match requested.or_else(|| self.profile.default_convention()) {
            Some(name) => name,
            None => return Resolution::Unknown,
        };
        match self.profile.convention(name) {
            Some(convention) if !convention.integer_parameter_register().is_empty() => {
                Resolution::Resolved(convention)
            }
            Some(_) => {
                debug!("Convention {} has no parameter registers", name);
                Resolution::Unknown
            }
            None => {
                debug!(
                    "Convention {} is unknown to {}",
                    name,
                    self.profile.cpu_architecture()
                );
                Resolution::Unknown
            }
        }
    }

    /// A register of this platform, at its full width.
    ///
    /// Registers missing from the register properties are a word wide.
    pub fn register(&self, name: &str) -> Register {
        let bits = self
            .profile
            .register_property(name)
            .map(|property| property.size() * 8)
            .unwrap_or_else(|| self.profile.word_size());
        Register::new(name, bits, false)
    }

    /// The stack pointer, or `Unknown` if the platform does not name one.
    pub fn stack_pointer(&self) -> Resolution<Register> {
        match self.profile.stack_pointer() {
            Some(name) => Resolution::Resolved(self.register(name)),
            None => Resolution::Unknown,
        }
    }

    /// Resolve the convention and argument locations of an imported symbol.
    pub fn extern_symbol(&self, tid: Tid, raw: &RawExternSymbol) -> ExternSymbol {
        let symbol = ExternSymbol::new(
            tid,
            raw.addresses.clone(),
            raw.name.clone(),
            raw.no_return,
            raw.has_var_args,
        );
        let convention = match self.convention(raw.calling_convention.as_deref()) {
            Resolution::Resolved(convention) => convention,
            Resolution::Unknown => {
                debug!("Calling convention of {} is unknown", raw.name);
                return symbol;
            }
        };

        let registers = convention.integer_parameter_register();
        let word_bytes = (self.profile.word_size() / 8) as u64;
        let parameters = (0..raw.parameter_count)
            .map(|index| match registers.get(index) {
                Some(name) => Arg::Register(self.register(name)),
                None => Arg::Stack {
                    offset: self.profile.stack_parameter_offset()
                        + (index - registers.len()) as u64 * word_bytes,
                    bits: self.profile.word_size(),
                },
            })
            .collect();
        let return_values = if raw.has_return {
            convention
                .integer_return_register()
                .first()
                .map(|name| Arg::Register(self.register(name)))
                .into_iter()
                .collect()
        } else {
            Vec::new()
        };

        symbol.with_convention(
            convention.calling_convention().to_string(),
            parameters,
            return_values,
            convention.callee_saved_register().to_vec(),
        )
    }

    /// Resolve every imported symbol.
    ///
    /// Symbols are ordered by their first address, then by name, and take
    /// their identifier from that order.
    pub fn extern_symbols(&self, raw: &[RawExternSymbol]) -> Vec<ExternSymbol> {
        let mut sorted: Vec<&RawExternSymbol> = raw.iter().collect();
        sorted.sort_by(|a, b| {
            (a.addresses.first(), &a.name).cmp(&(b.addresses.first(), &b.name))
        });
        sorted
            .into_iter()
            .enumerate()
            .map(|(index, raw)| {
                let address = raw.addresses.first().copied().unwrap_or(0);
                self.extern_symbol(Tid::external(address, index as u32), raw)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform;

    fn symbol(name: &str, parameter_count: usize, convention: Option<&str>) -> RawExternSymbol {
        RawExternSymbol {
            name: name.to_string(),
            addresses: vec![0x5000],
            calling_convention: convention.map(|c| c.to_string()),
            parameter_count,
            has_return: true,
            no_return: false,
            has_var_args: false,
        }
    }

    #[test]
    fn parameters_spill_to_the_stack() {
        let profile = platform::lookup("x86_64").unwrap();
        let resolver = AbiResolver::new(&profile);
        let resolved = resolver.extern_symbol(Tid::external(0x5000, 0), &symbol("f", 8, None));

        assert_eq!(
            resolved.calling_convention(),
            &Resolution::Resolved("__stdcall".to_string())
        );
        assert_eq!(
            resolved.parameters()[0],
            Arg::Register(Register::new("RDI", 64, false))
        );
        assert_eq!(
            resolved.parameters()[6],
            Arg::Stack {
                offset: 8,
                bits: 64
            }
        );
        assert_eq!(
            resolved.parameters()[7],
            Arg::Stack {
                offset: 16,
                bits: 64
            }
        );
        assert_eq!(
            resolved.return_values(),
            &[Arg::Register(Register::new("RAX", 64, false))]
        );
        assert!(resolved.callee_saved().contains(&"RBX".to_string()));
    }

    #[test]
    fn conventions_without_registers_are_unknown() {
        let profile = platform::lookup("x86_32").unwrap();
        let resolver = AbiResolver::new(&profile);
        let resolved = resolver.extern_symbol(Tid::external(0x5000, 0), &symbol("g", 2, None));
        assert!(resolved.calling_convention().is_unknown());
        assert!(resolved.parameters().is_empty());

        let fastcall = resolver.extern_symbol(
            Tid::external(0x5000, 0),
            &symbol("h", 1, Some("__fastcall")),
        );
        assert_eq!(
            fastcall.parameters(),
            &[Arg::Register(Register::new("ECX", 32, false))]
        );
    }

    #[test]
    fn unknown_convention_names() {
        let profile = platform::lookup("x86_64").unwrap();
        let resolver = AbiResolver::new(&profile);
        let resolved = resolver.extern_symbol(
            Tid::external(0x5000, 0),
            &symbol("f", 1, Some("__pascal")),
        );
        assert!(resolved.calling_convention().is_unknown());
    }

    #[test]
    fn missing_platform_data_is_unknown() {
        let profile = PlatformProfile::from_json(
            r#"{
                "cpu_architecture": "bare",
                "endian": "little",
                "word_size": 32,
                "register_calling_convention": [
                    { "calling_convention": "regcall", "integer_parameter_register": ["r0"] }
                ]
            }"#,
        )
        .unwrap();
        let resolver = AbiResolver::new(&profile);
        assert_eq!(resolver.stack_pointer(), Resolution::Unknown);

        let unnamed = resolver.extern_symbol(Tid::external(0x5000, 0), &symbol("f", 1, None));
        assert!(unnamed.calling_convention().is_unknown());
        assert!(unnamed.parameters().is_empty());

        let named = resolver.extern_symbol(
            Tid::external(0x5000, 0),
            &symbol("g", 1, Some("regcall")),
        );
        assert_eq!(
            named.parameters(),
            &[Arg::Register(Register::new("r0", 32, false))]
        );
    }

    #[test]
    fn stack_pointers() {
        let profile = platform::lookup("aarch64").unwrap();
        assert_eq!(
            AbiResolver::new(&profile).stack_pointer(),
            Resolution::Resolved(Register::new("sp", 64, false))
        );
    }
}
