//! Information and types for termir's built-in architectures.
//!
//! Each architecture describes its register layout and its calling
//! conventions, and can produce a `PlatformProfile` from them. Profiles for
//! other platforms can be loaded from JSON, see `platform`.

use crate::platform::{PlatformProfile, RegisterConvention, RegisterProperties};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// An architecture's endianness.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Endian {
    Big,
    Little,
}

/// Necessary information about an architecture.
pub trait Architecture: Debug + Send + Sync {
    /// The name micro-operation documents use for this architecture.
    fn name(&self) -> &'static str;
    /// Other names this architecture goes by.
    fn aliases(&self) -> &'static [&'static str];
    /// Get the endianness of this architecture.
    fn endian(&self) -> Endian;
    /// Get the size of a natural word for this architecture in bits.
    fn word_size(&self) -> usize;
    /// The name of the stack pointer register.
    fn stack_pointer(&self) -> &'static str;
    /// Offset in bytes from the stack pointer at a call to the first argument
    /// passed on the stack.
    fn stack_parameter_offset(&self) -> u64;
    /// The layout of every register, including partial registers.
    fn register_properties(&self) -> Vec<RegisterProperties>;
    /// The calling conventions of this architecture. The first one is the
    /// default.
    fn calling_conventions(&self) -> Vec<RegisterConvention>;

    /// Get the `PlatformProfile` for this architecture.
    fn profile(&self) -> PlatformProfile {
        let calling_conventions = self.calling_conventions();
        let default_convention = calling_conventions
            .first()
            .map(|convention| convention.calling_convention().to_string());
        PlatformProfile::new(
            self.name().to_string(),
            self.aliases().iter().map(|alias| alias.to_string()).collect(),
            self.endian(),
            self.word_size(),
            Some(self.stack_pointer().to_string()),
            self.stack_parameter_offset(),
            self.register_properties(),
            calling_conventions,
            default_convention,
        )
    }
}

/// Every built-in architecture.
pub fn architectures() -> Vec<Box<dyn Architecture>> {
    vec![
        Box::new(Amd64::new()),
        Box::new(X86::new()),
        Box::new(AArch64::new()),
        Box::new(Mips::new()),
        Box::new(Mipsel::new()),
    ]
}

fn full(name: &str, bytes: usize) -> RegisterProperties {
    RegisterProperties::new(name, name, 0, bytes)
}

fn part(name: &str, base: &str, lsb: usize, bytes: usize) -> RegisterProperties {
    RegisterProperties::new(name, base, lsb, bytes)
}

fn names(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

fn numbered(prefix: &str, range: std::ops::Range<usize>) -> Vec<String> {
    range.map(|i| format!("{}{}", prefix, i)).collect()
}

/// The 64-bit X86 Architecture.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Amd64 {}

impl Amd64 {
    pub fn new() -> Amd64 {
        Amd64 {}
    }
}

impl Architecture for Amd64 {
    fn name(&self) -> &'static str {
        "x86_64"
    }
    fn aliases(&self) -> &'static [&'static str] {
        &["amd64", "x86-64", "x86:LE:64:default"]
    }
    fn endian(&self) -> Endian {
        Endian::Little
    }
    fn word_size(&self) -> usize {
        64
    }
    fn stack_pointer(&self) -> &'static str {
        "RSP"
    }
    fn stack_parameter_offset(&self) -> u64 {
        8
    }

    fn register_properties(&self) -> Vec<RegisterProperties> {
        let mut properties = Vec::new();
        for x in ["A", "B", "C", "D"] {
            let base = format!("R{}X", x);
            properties.push(full(&base, 8));
            properties.push(part(&format!("E{}X", x), &base, 0, 4));
            properties.push(part(&format!("{}X", x), &base, 0, 2));
            properties.push(part(&format!("{}L", x), &base, 0, 1));
            properties.push(part(&format!("{}H", x), &base, 1, 1));
        }
        for x in ["SI", "DI", "BP", "SP"] {
            let base = format!("R{}", x);
            properties.push(full(&base, 8));
            properties.push(part(&format!("E{}", x), &base, 0, 4));
            properties.push(part(x, &base, 0, 2));
            properties.push(part(&format!("{}L", x), &base, 0, 1));
        }
        for i in 8..16 {
            let base = format!("R{}", i);
            properties.push(full(&base, 8));
            properties.push(part(&format!("R{}D", i), &base, 0, 4));
            properties.push(part(&format!("R{}W", i), &base, 0, 2));
            properties.push(part(&format!("R{}B", i), &base, 0, 1));
        }
        properties.push(full("RIP", 8));
        for i in 0..16 {
            let base = format!("XMM{}", i);
            properties.push(full(&base, 16));
            properties.push(part(&format!("XMM{}_Qa", i), &base, 0, 8));
            properties.push(part(&format!("XMM{}_Da", i), &base, 0, 4));
        }
        properties
    }

    fn calling_conventions(&self) -> Vec<RegisterConvention> {
        vec![
            RegisterConvention::new(
                "__stdcall",
                names(&["RDI", "RSI", "RDX", "RCX", "R8", "R9"]),
                numbered("XMM", 0..8),
                names(&["RAX", "RDX"]),
                names(&["XMM0"]),
                names(&["RBX", "RSP", "RBP", "R12", "R13", "R14", "R15"]),
            ),
            RegisterConvention::new(
                "__fastcall",
                names(&["RCX", "RDX", "R8", "R9"]),
                numbered("XMM", 0..4),
                names(&["RAX"]),
                names(&["XMM0"]),
                names(&[
                    "RBX", "RBP", "RDI", "RSI", "RSP", "R12", "R13", "R14", "R15",
                ]),
            ),
        ]
    }
}

/// The 32-bit X86 Architecture.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct X86 {}

impl X86 {
    pub fn new() -> X86 {
        X86 {}
    }
}

impl Architecture for X86 {
    fn name(&self) -> &'static str {
        "x86_32"
    }
    fn aliases(&self) -> &'static [&'static str] {
        &["x86", "i386", "x86:LE:32:default"]
    }
    fn endian(&self) -> Endian {
        Endian::Little
    }
    fn word_size(&self) -> usize {
        32
    }
    fn stack_pointer(&self) -> &'static str {
        "ESP"
    }
    fn stack_parameter_offset(&self) -> u64 {
        4
    }

    fn register_properties(&self) -> Vec<RegisterProperties> {
        let mut properties = Vec::new();
        for x in ["A", "B", "C", "D"] {
            let base = format!("E{}X", x);
            properties.push(full(&base, 4));
            properties.push(part(&format!("{}X", x), &base, 0, 2));
            properties.push(part(&format!("{}L", x), &base, 0, 1));
            properties.push(part(&format!("{}H", x), &base, 1, 1));
        }
        for x in ["SI", "DI", "BP", "SP"] {
            let base = format!("E{}", x);
            properties.push(full(&base, 4));
            properties.push(part(x, &base, 0, 2));
        }
        properties.push(full("EIP", 4));
        properties
    }

    /// `__cdecl` passes every argument on the stack.
    fn calling_conventions(&self) -> Vec<RegisterConvention> {
        let callee_saved = names(&["EBX", "ESI", "EDI", "EBP", "ESP"]);
        vec![
            RegisterConvention::new(
                "__cdecl",
                Vec::new(),
                Vec::new(),
                names(&["EAX", "EDX"]),
                names(&["ST0"]),
                callee_saved.clone(),
            ),
            RegisterConvention::new(
                "__fastcall",
                names(&["ECX", "EDX"]),
                Vec::new(),
                names(&["EAX", "EDX"]),
                names(&["ST0"]),
                callee_saved.clone(),
            ),
            RegisterConvention::new(
                "__thiscall",
                names(&["ECX"]),
                Vec::new(),
                names(&["EAX", "EDX"]),
                names(&["ST0"]),
                callee_saved,
            ),
        ]
    }
}

/// The 64-bit little-endian ARM Architecture.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AArch64 {}

impl AArch64 {
    pub fn new() -> AArch64 {
        AArch64 {}
    }
}

impl Architecture for AArch64 {
    fn name(&self) -> &'static str {
        "aarch64"
    }
    fn aliases(&self) -> &'static [&'static str] {
        &["arm64", "AARCH64:LE:64:v8A"]
    }
    fn endian(&self) -> Endian {
        Endian::Little
    }
    fn word_size(&self) -> usize {
        64
    }
    fn stack_pointer(&self) -> &'static str {
        "sp"
    }
    fn stack_parameter_offset(&self) -> u64 {
        0
    }

    fn register_properties(&self) -> Vec<RegisterProperties> {
        let mut properties = Vec::new();
        for i in 0..31 {
            let base = format!("x{}", i);
            properties.push(full(&base, 8));
            properties.push(part(&format!("w{}", i), &base, 0, 4));
        }
        properties.push(full("sp", 8));
        properties.push(part("wsp", "sp", 0, 4));
        properties.push(full("pc", 8));
        for i in 0..32 {
            let base = format!("q{}", i);
            properties.push(full(&base, 16));
            properties.push(part(&format!("d{}", i), &base, 0, 8));
            properties.push(part(&format!("s{}", i), &base, 0, 4));
        }
        properties
    }

    fn calling_conventions(&self) -> Vec<RegisterConvention> {
        let mut callee_saved = numbered("x", 19..30);
        callee_saved.push("sp".to_string());
        callee_saved.extend(numbered("d", 8..16));
        vec![RegisterConvention::new(
            "__cdecl",
            numbered("x", 0..8),
            numbered("d", 0..8),
            names(&["x0", "x1"]),
            names(&["d0"]),
            callee_saved,
        )]
    }
}

fn mips_register_properties() -> Vec<RegisterProperties> {
    let mut properties: Vec<RegisterProperties> = [
        "zero", "at", "v0", "v1", "a0", "a1", "a2", "a3", "t0", "t1", "t2", "t3", "t4", "t5",
        "t6", "t7", "s0", "s1", "s2", "s3", "s4", "s5", "s6", "s7", "t8", "t9", "k0", "k1", "gp",
        "sp", "s8", "ra", "pc",
    ]
    .iter()
    .map(|name| full(name, 4))
    .collect();
    properties.extend((0..32).map(|i| full(&format!("f{}", i), 4)));
    properties
}

fn mips_calling_conventions() -> Vec<RegisterConvention> {
    let mut callee_saved = numbered("s", 0..9);
    callee_saved.extend(names(&["sp", "gp"]));
    callee_saved.extend(numbered("f", 20..31));
    vec![RegisterConvention::new(
        "__stdcall",
        names(&["a0", "a1", "a2", "a3"]),
        names(&["f12", "f14"]),
        names(&["v0", "v1"]),
        names(&["f0"]),
        callee_saved,
    )]
}

/// The 32-bit Mips Architecture.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Mips {}

impl Mips {
    pub fn new() -> Mips {
        Mips {}
    }
}

impl Architecture for Mips {
    fn name(&self) -> &'static str {
        "mips_32"
    }
    fn aliases(&self) -> &'static [&'static str] {
        &["mips", "MIPS:BE:32:default"]
    }
    fn endian(&self) -> Endian {
        Endian::Big
    }
    fn word_size(&self) -> usize {
        32
    }
    fn stack_pointer(&self) -> &'static str {
        "sp"
    }
    fn stack_parameter_offset(&self) -> u64 {
        16
    }
    fn register_properties(&self) -> Vec<RegisterProperties> {
        mips_register_properties()
    }
    fn calling_conventions(&self) -> Vec<RegisterConvention> {
        mips_calling_conventions()
    }
}

/// The 32-bit little-endian Mips Architecture.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Mipsel {}

impl Mipsel {
    pub fn new() -> Mipsel {
        Mipsel {}
    }
}

impl Architecture for Mipsel {
    fn name(&self) -> &'static str {
        "mipsel_32"
    }
    fn aliases(&self) -> &'static [&'static str] {
        &["mipsel", "MIPS:LE:32:default"]
    }
    fn endian(&self) -> Endian {
        Endian::Little
    }
    fn word_size(&self) -> usize {
        32
    }
    fn stack_pointer(&self) -> &'static str {
        "sp"
    }
    fn stack_parameter_offset(&self) -> u64 {
        16
    }
    fn register_properties(&self) -> Vec<RegisterProperties> {
        mips_register_properties()
    }
    fn calling_conventions(&self) -> Vec<RegisterConvention> {
        mips_calling_conventions()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_registers_point_at_full_registers() {
        for architecture in architectures() {
            let properties = architecture.register_properties();
            for property in &properties {
                let base = properties
                    .iter()
                    .find(|p| p.register() == property.base_register())
                    .unwrap();
                assert_eq!(base.base_register(), base.register());
                assert!(property.lsb() + property.size() <= base.size());
            }
        }
    }

    #[test]
    fn stack_pointers_are_full_registers() {
        for architecture in architectures() {
            let profile = architecture.profile();
            let stack_pointer = profile.stack_pointer().unwrap();
            let property = profile.register_property(stack_pointer).unwrap();
            assert_eq!(property.base_register(), stack_pointer);
            assert_eq!(property.size() * 8, architecture.word_size());
        }
    }
}
