//! Loading the micro-operation documents produced by a lifting engine.
//!
//! The lifting engine emits one JSON document per binary. It lists the
//! functions of the binary, each with an address-ordered stream of
//! micro-operations, and the symbols the binary imports.
//!
//! ```json
//! {
//!   "cpu_architecture": "x86_64",
//!   "image_base": "0x400000",
//!   "entry_points": ["0x1000"],
//!   "functions": [{
//!     "name": "main",
//!     "address": "0x1000",
//!     "operations": [{
//!       "address": "0x1000",
//!       "mnemonic": "COPY",
//!       "output": { "kind": "register", "name": "EAX", "bits": 32 },
//!       "inputs": [{ "kind": "constant", "value": "0x1", "bits": 32 }]
//!     }]
//!   }],
//!   "extern_symbols": []
//! }
//! ```

mod binary;

pub use self::binary::*;

use crate::Error;
use log::{debug, info};
use num_bigint::BigUint;
use serde::{Deserialize, Deserializer};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberText {
    Number(u64),
    Text(String),
}

fn parse_biguint(text: &str) -> Option<BigUint> {
    let text = text.trim();
    match text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
    {
        Some(hex) => BigUint::parse_bytes(hex.as_bytes(), 16),
        None => BigUint::parse_bytes(text.as_bytes(), 10),
    }
}

fn parse_address(text: &str) -> Option<u64> {
    let text = text.trim();
    match text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => text.parse().ok(),
    }
}

fn address<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    match NumberText::deserialize(deserializer)? {
        NumberText::Number(address) => Ok(address),
        NumberText::Text(text) => parse_address(&text)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid address {:?}", text))),
    }
}

fn addresses<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u64>, D::Error> {
    Vec::<NumberText>::deserialize(deserializer)?
        .into_iter()
        .map(|address| match address {
            NumberText::Number(address) => Ok(address),
            NumberText::Text(text) => parse_address(&text)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid address {:?}", text))),
        })
        .collect()
}

fn big_value<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BigUint, D::Error> {
    match NumberText::deserialize(deserializer)? {
        NumberText::Number(value) => Ok(BigUint::from(value)),
        NumberText::Text(text) => parse_biguint(&text)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid constant {:?}", text))),
    }
}

/// One operand of a micro-operation.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RawOperand {
    /// A named register, possibly a partial one.
    Register { name: String, bits: usize },
    Constant {
        #[serde(deserialize_with = "big_value")]
        value: BigUint,
        bits: usize,
    },
    /// A temporary of the lifting engine, identified by its offset in the
    /// unique space.
    Temporary {
        #[serde(deserialize_with = "address")]
        offset: u64,
        bits: usize,
    },
    /// A value at an absolute address.
    Ram {
        #[serde(deserialize_with = "address")]
        address: u64,
        bits: usize,
    },
    /// A composed operation, used for flag values.
    Op {
        mnemonic: String,
        #[serde(default)]
        inputs: Vec<RawOperand>,
        bits: usize,
    },
}

impl RawOperand {
    /// The width of this operand in bits.
    pub fn bits(&self) -> usize {
        match self {
            RawOperand::Register { bits, .. }
            | RawOperand::Constant { bits, .. }
            | RawOperand::Temporary { bits, .. }
            | RawOperand::Ram { bits, .. }
            | RawOperand::Op { bits, .. } => *bits,
        }
    }
}

/// A write to a flag, as a side effect of a micro-operation.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct RawFlagWrite {
    pub flag: RawOperand,
    pub value: RawOperand,
}

/// A single micro-operation.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct RawOp {
    #[serde(deserialize_with = "address")]
    pub address: u64,
    pub mnemonic: String,
    #[serde(default)]
    pub output: Option<RawOperand>,
    #[serde(default)]
    pub inputs: Vec<RawOperand>,
    #[serde(default)]
    pub flags: Vec<RawFlagWrite>,
}

/// A function, as found by the lifting engine.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct RawFunction {
    pub name: String,
    #[serde(deserialize_with = "address")]
    pub address: u64,
    #[serde(default)]
    pub operations: Vec<RawOp>,
}

/// A symbol the binary imports.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct RawExternSymbol {
    pub name: String,
    #[serde(default, deserialize_with = "addresses")]
    pub addresses: Vec<u64>,
    #[serde(default)]
    pub calling_convention: Option<String>,
    #[serde(default)]
    pub parameter_count: usize,
    #[serde(default)]
    pub has_return: bool,
    #[serde(default)]
    pub no_return: bool,
    #[serde(default)]
    pub has_var_args: bool,
}

/// The micro-operations of one binary.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct RawProgram {
    cpu_architecture: String,
    #[serde(default, deserialize_with = "address")]
    image_base: u64,
    #[serde(default, deserialize_with = "addresses")]
    entry_points: Vec<u64>,
    #[serde(default)]
    functions: Option<Vec<RawFunction>>,
    #[serde(default)]
    extern_symbols: Vec<RawExternSymbol>,
}

impl RawProgram {
    /// Load and validate a document from a file.
    pub fn from_file(path: &Path) -> Result<RawProgram, Error> {
        let reader = BufReader::new(File::open(path)?);
        let raw: RawProgram = serde_json::from_reader(reader)?;
        raw.validate()?;
        Ok(raw)
    }

    /// Load and validate a document from JSON text.
    pub fn from_json(json: &str) -> Result<RawProgram, Error> {
        let raw: RawProgram = serde_json::from_str(json)?;
        raw.validate()?;
        Ok(raw)
    }

    /// Check that function boundaries are well-formed.
    ///
    /// Every function must have operations, in ascending address order, one
    /// of which is at the function's address. No two functions may share an
    /// address.
    pub fn validate(&self) -> Result<(), Error> {
        let functions = self
            .functions
            .as_ref()
            .ok_or_else(|| Error::MalformedBoundary("missing functions".to_string()))?;

        let mut entries = BTreeSet::new();
        for function in functions {
            if !entries.insert(function.address) {
                return Err(Error::MalformedBoundary(format!(
                    "duplicate function entry 0x{:x}",
                    function.address
                )));
            }
            if function.operations.is_empty() {
                return Err(Error::MalformedBoundary(format!(
                    "function {} at 0x{:x} has no operations",
                    function.name, function.address
                )));
            }
            if let Some(pair) = function
                .operations
                .windows(2)
                .find(|pair| pair[1].address < pair[0].address)
            {
                return Err(Error::MalformedBoundary(format!(
                    "operations of {} out of order at 0x{:x}",
                    function.name, pair[1].address
                )));
            }
            if !function
                .operations
                .iter()
                .any(|op| op.address == function.address)
            {
                return Err(Error::MalformedBoundary(format!(
                    "function {} has no operation at its entry 0x{:x}",
                    function.name, function.address
                )));
            }
        }
        debug!("Validated {} functions", functions.len());
        Ok(())
    }

    pub fn cpu_architecture(&self) -> &str {
        &self.cpu_architecture
    }

    pub fn image_base(&self) -> u64 {
        self.image_base
    }

    pub fn set_image_base(&mut self, image_base: u64) {
        self.image_base = image_base;
    }

    /// Replace the image base with the one found in the binary file, keeping
    /// the current one if the binary cannot be read.
    pub fn discover_image_base(&mut self, binary: &Path) {
        match image_base_from_file(binary) {
            Ok(image_base) => {
                debug!("Image base of {} is 0x{:x}", binary.display(), image_base);
                self.image_base = image_base;
            }
            Err(e) => info!(
                "Could not read image base from {}, keeping 0x{:x}: {}",
                binary.display(),
                self.image_base,
                e
            ),
        }
    }

    pub fn entry_points(&self) -> &[u64] {
        &self.entry_points
    }

    pub fn functions(&self) -> &[RawFunction] {
        self.functions.as_deref().unwrap_or(&[])
    }

    pub fn extern_symbols(&self) -> &[RawExternSymbol] {
        &self.extern_symbols
    }
}
