//! Platform profiles: register layouts and calling conventions.
//!
//! A `PlatformProfile` is everything termir needs to know about a target
//! beyond its micro-operations. Profiles come either from a built-in
//! `Architecture`, or from a JSON file.

use crate::architecture::{self, Endian};
use crate::Error;
use log::debug;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Where a register lives inside its full, base register.
///
/// `lsb` and `size` are in bytes.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct RegisterProperties {
    register: String,
    base_register: String,
    lsb: usize,
    size: usize,
}

impl RegisterProperties {
    pub fn new<S: Into<String>, B: Into<String>>(
        register: S,
        base_register: B,
        lsb: usize,
        size: usize,
    ) -> RegisterProperties {
        RegisterProperties {
            register: register.into(),
            base_register: base_register.into(),
            lsb,
            size,
        }
    }

    pub fn register(&self) -> &str {
        &self.register
    }

    pub fn base_register(&self) -> &str {
        &self.base_register
    }

    /// Offset of this register into its base register, in bytes.
    pub fn lsb(&self) -> usize {
        self.lsb
    }

    /// Size of this register in bytes.
    pub fn size(&self) -> usize {
        self.size
    }
}

/// The registers a calling convention uses, by role.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct RegisterConvention {
    calling_convention: String,
    #[serde(default)]
    integer_parameter_register: Vec<String>,
    #[serde(default)]
    float_parameter_register: Vec<String>,
    #[serde(default)]
    integer_return_register: Vec<String>,
    #[serde(default)]
    float_return_register: Vec<String>,
    #[serde(default)]
    callee_saved_register: Vec<String>,
}

impl RegisterConvention {
    pub fn new<S: Into<String>>(
        calling_convention: S,
        integer_parameter_register: Vec<String>,
        float_parameter_register: Vec<String>,
        integer_return_register: Vec<String>,
        float_return_register: Vec<String>,
        callee_saved_register: Vec<String>,
    ) -> RegisterConvention {
        RegisterConvention {
            calling_convention: calling_convention.into(),
            integer_parameter_register,
            float_parameter_register,
            integer_return_register,
            float_return_register,
            callee_saved_register,
        }
    }

    pub fn calling_convention(&self) -> &str {
        &self.calling_convention
    }

    /// Integer parameter registers, in argument order.
    pub fn integer_parameter_register(&self) -> &[String] {
        &self.integer_parameter_register
    }

    pub fn integer_return_register(&self) -> &[String] {
        &self.integer_return_register
    }

    pub fn callee_saved_register(&self) -> &[String] {
        &self.callee_saved_register
    }
}

/// The platform metadata of one target.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PlatformProfile {
    cpu_architecture: String,
    #[serde(default)]
    aliases: Vec<String>,
    endian: Endian,
    /// Natural word size in bits.
    word_size: usize,
    #[serde(default)]
    stack_pointer: Option<String>,
    #[serde(default)]
    stack_parameter_offset: u64,
    #[serde(default)]
    register_properties: Vec<RegisterProperties>,
    #[serde(default)]
    register_calling_convention: Vec<RegisterConvention>,
    #[serde(default)]
    default_convention: Option<String>,
}

impl PlatformProfile {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        cpu_architecture: String,
        aliases: Vec<String>,
        endian: Endian,
        word_size: usize,
        stack_pointer: Option<String>,
        stack_parameter_offset: u64,
        register_properties: Vec<RegisterProperties>,
        register_calling_convention: Vec<RegisterConvention>,
        default_convention: Option<String>,
    ) -> PlatformProfile {
        PlatformProfile {
            cpu_architecture,
            aliases,
            endian,
            word_size,
            stack_pointer,
            stack_parameter_offset,
            register_properties,
            register_calling_convention,
            default_convention,
        }
    }

    /// Load a profile from a JSON file.
    pub fn from_file(path: &Path) -> Result<PlatformProfile, Error> {
        let reader = BufReader::new(File::open(path)?);
        let profile: PlatformProfile = serde_json::from_reader(reader)?;
        profile.validate()?;
        Ok(profile)
    }

    /// Load a profile from JSON text.
    pub fn from_json(json: &str) -> Result<PlatformProfile, Error> {
        let profile: PlatformProfile = serde_json::from_str(json)?;
        profile.validate()?;
        Ok(profile)
    }

    fn validate(&self) -> Result<(), Error> {
        if self.word_size == 0 || self.word_size % 8 != 0 {
            return Err(format!(
                "Profile {} has invalid word size {}",
                self.cpu_architecture, self.word_size
            )
            .into());
        }
        let registers: FxHashMap<&str, &RegisterProperties> = self.register_map();
        for property in &self.register_properties {
            let base = registers.get(property.base_register()).ok_or_else(|| {
                Error::Custom(format!(
                    "Register {} has unknown base register {}",
                    property.register(),
                    property.base_register()
                ))
            })?;
            let end = property.lsb().checked_add(property.size());
            if end.map_or(true, |end| end > base.size()) {
                return Err(format!(
                    "Register {} does not fit in {}",
                    property.register(),
                    property.base_register()
                )
                .into());
            }
        }
        Ok(())
    }

    pub fn cpu_architecture(&self) -> &str {
        &self.cpu_architecture
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn endian(&self) -> Endian {
        self.endian
    }

    /// Natural word size in bits.
    pub fn word_size(&self) -> usize {
        self.word_size
    }

    pub fn stack_pointer(&self) -> Option<&str> {
        self.stack_pointer.as_deref()
    }

    pub fn stack_parameter_offset(&self) -> u64 {
        self.stack_parameter_offset
    }

    pub fn register_properties(&self) -> &[RegisterProperties] {
        &self.register_properties
    }

    pub fn register_calling_convention(&self) -> &[RegisterConvention] {
        &self.register_calling_convention
    }

    pub fn default_convention(&self) -> Option<&str> {
        self.default_convention.as_deref()
    }

    /// Returns true if `name` is the architecture name of this profile, or
    /// one of its aliases. Case is ignored.
    pub fn matches(&self, name: &str) -> bool {
        self.cpu_architecture.eq_ignore_ascii_case(name)
            || self
                .aliases
                .iter()
                .any(|alias| alias.eq_ignore_ascii_case(name))
    }

    pub fn register_property(&self, name: &str) -> Option<&RegisterProperties> {
        self.register_properties
            .iter()
            .find(|property| property.register() == name)
    }

    /// Register properties, keyed by register name.
    pub fn register_map(&self) -> FxHashMap<&str, &RegisterProperties> {
        self.register_properties
            .iter()
            .map(|property| (property.register(), property))
            .collect()
    }

    pub fn convention(&self, name: &str) -> Option<&RegisterConvention> {
        self.register_calling_convention
            .iter()
            .find(|convention| convention.calling_convention() == name)
    }
}

/// Find the built-in profile for an architecture name.
pub fn lookup(name: &str) -> Result<PlatformProfile, Error> {
    lookup_in(name, &[])
}

/// Find the profile for an architecture name, preferring `custom` profiles
/// over the built-in ones.
pub fn lookup_in(name: &str, custom: &[PlatformProfile]) -> Result<PlatformProfile, Error> {
    if let Some(profile) = custom.iter().find(|profile| profile.matches(name)) {
        debug!("Using custom profile {} for {}", profile.cpu_architecture(), name);
        return Ok(profile.clone());
    }
    architecture::architectures()
        .into_iter()
        .map(|architecture| architecture.profile())
        .find(|profile| profile.matches(name))
        .ok_or_else(|| Error::UnsupportedArchitecture(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_alias() {
        let profile = lookup("AMD64").unwrap();
        assert_eq!(profile.cpu_architecture(), "x86_64");
        assert_eq!(profile.stack_pointer(), Some("RSP"));
        assert_eq!(profile.default_convention(), Some("__stdcall"));

        let eax = profile.register_property("EAX").unwrap();
        assert_eq!(eax.base_register(), "RAX");
        assert_eq!(eax.size(), 4);
    }

    #[test]
    fn unknown_architectures_are_fatal() {
        match lookup("z80") {
            Err(Error::UnsupportedArchitecture(name)) => assert_eq!(name, "z80"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn custom_profiles() {
        let json = r#"{
            "cpu_architecture": "toy",
            "endian": "big",
            "word_size": 16,
            "stack_pointer": "SP",
            "register_properties": [
                { "register": "A", "base_register": "A", "lsb": 0, "size": 2 },
                { "register": "AL", "base_register": "A", "lsb": 0, "size": 1 },
                { "register": "SP", "base_register": "SP", "lsb": 0, "size": 2 }
            ],
            "register_calling_convention": [
                { "calling_convention": "toycall", "integer_parameter_register": ["A"] }
            ],
            "default_convention": "toycall"
        }"#;
        let profile = PlatformProfile::from_json(json).unwrap();
        assert_eq!(profile.endian(), Endian::Big);
        let found = lookup_in("TOY", &[profile.clone()]).unwrap();
        assert_eq!(found, profile);
        assert_eq!(
            found.convention("toycall").unwrap().integer_parameter_register(),
            &["A".to_string()]
        );
    }

    #[test]
    fn partial_registers_must_fit() {
        let json = r#"{
            "cpu_architecture": "toy",
            "endian": "little",
            "word_size": 16,
            "register_properties": [
                { "register": "A", "base_register": "A", "lsb": 0, "size": 2 },
                { "register": "AH", "base_register": "A", "lsb": 2, "size": 1 }
            ]
        }"#;
        assert!(PlatformProfile::from_json(json).is_err());
    }
}
