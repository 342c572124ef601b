//! Assembling subroutines and programs.
//!
//! The `Extractor` is the entry point of termir. It translates every
//! function of a `RawProgram` into a `Sub`, resolves extern symbols against
//! the platform, and wraps the result into a `Project`.
//!
//! Subroutines are translated independently of each other, either one after
//! the other or on a `rayon` thread pool. Every subroutine gets its own
//! `SubTidSpace` from its position in the address-sorted function list, so
//! both ways produce the same identifiers, and the same `Project`.

use crate::abi::AbiResolver;
use crate::il::*;
use crate::loader::{RawFunction, RawProgram};
use crate::platform::PlatformProfile;
use crate::translator::{self, BlockBuilder, Translator};
use crate::Error;
use log::{debug, info, warn};
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A flag to abandon an extraction from another thread.
///
/// Cancellation is all-or-nothing: a cancelled extraction returns
/// `Error::Cancelled`, and no partial program.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> CancellationToken {
        CancellationToken::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Options for an extraction.
#[derive(Clone, Debug)]
pub struct ExtractionOptions {
    parallel: bool,
    threads: usize,
    translator: translator::Options,
    cancellation: CancellationToken,
}

impl ExtractionOptions {
    pub fn new() -> ExtractionOptions {
        ExtractionOptions::default()
    }

    /// Whether subroutines are translated on a thread pool. On by default.
    pub fn parallel(&self) -> bool {
        self.parallel
    }

    /// The size of the thread pool. 0, the default, lets `rayon` choose.
    pub fn threads(&self) -> usize {
        self.threads
    }

    pub fn translator(&self) -> &translator::Options {
        &self.translator
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }
}

impl Default for ExtractionOptions {
    fn default() -> ExtractionOptions {
        ExtractionOptions {
            parallel: true,
            threads: 0,
            translator: translator::Options::default(),
            cancellation: CancellationToken::default(),
        }
    }
}

/// Create your options with the builder pattern.
#[derive(Default)]
pub struct ExtractionOptionsBuilder {
    options: ExtractionOptions,
}

impl ExtractionOptionsBuilder {
    pub fn new() -> ExtractionOptionsBuilder {
        ExtractionOptionsBuilder::default()
    }

    pub fn parallel(mut self, parallel: bool) -> ExtractionOptionsBuilder {
        self.options.parallel = parallel;
        self
    }

    pub fn threads(mut self, threads: usize) -> ExtractionOptionsBuilder {
        self.options.threads = threads;
        self
    }

    pub fn translator(mut self, translator: translator::Options) -> ExtractionOptionsBuilder {
        self.options.translator = translator;
        self
    }

    pub fn cancellation(mut self, cancellation: CancellationToken) -> ExtractionOptionsBuilder {
        self.options.cancellation = cancellation;
        self
    }

    pub fn build(self) -> ExtractionOptions {
        self.options
    }
}

/// Turns `RawProgram`s into `Project`s for one platform.
pub struct Extractor<'p> {
    profile: &'p PlatformProfile,
    options: ExtractionOptions,
}

impl<'p> Extractor<'p> {
    pub fn new(profile: &'p PlatformProfile) -> Extractor<'p> {
        Extractor::with_options(profile, ExtractionOptions::default())
    }

    pub fn with_options(profile: &'p PlatformProfile, options: ExtractionOptions) -> Extractor<'p> {
        Extractor { profile, options }
    }

    pub fn options(&self) -> &ExtractionOptions {
        &self.options
    }

    fn check_cancelled(&self) -> Result<(), Error> {
        if self.options.cancellation.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Translate one function into a `Sub`.
    fn sub(
        &self,
        translator: &Translator,
        calls: &FxHashMap<u64, Tid>,
        sub_index: usize,
        function: &RawFunction,
    ) -> Result<Term<Sub>, Error> {
        self.check_cancelled()?;
        let space = SubTidSpace::new(sub_index as u32);
        let mut model = translator.operand_model();
        let blocks = BlockBuilder::new(&function.operations, function.address, space, calls)
            .build(translator, &mut model)?;
        debug!(
            "Translated {} at 0x{:x} into {} blocks",
            function.name,
            function.address,
            blocks.len()
        );
        let (registers, expressions) = model.into_parts();
        Ok(Term::new(
            space.sub(function.address),
            Sub::new(
                function.name.clone(),
                function.address,
                blocks,
                registers,
                expressions,
            ),
        ))
    }

    /// Extract the `Project` of a binary.
    pub fn extract(&self, raw: &RawProgram) -> Result<Project, Error> {
        if !self.profile.matches(raw.cpu_architecture()) {
            return Err(Error::UnsupportedArchitecture(
                raw.cpu_architecture().to_string(),
            ));
        }
        raw.validate()?;

        let mut functions: Vec<&RawFunction> = raw.functions().iter().collect();
        functions.sort_by_key(|function| function.address);

        let abi = AbiResolver::new(self.profile);
        let extern_symbols = abi.extern_symbols(raw.extern_symbols());

        // Calls to an address an extern symbol lives at go to the symbol,
        // even when a (thunk) function lives there too.
        let mut calls: FxHashMap<u64, Tid> = functions
            .iter()
            .enumerate()
            .map(|(index, function)| (function.address, Tid::sub(function.address, index as u32)))
            .collect();
        for symbol in &extern_symbols {
            for address in symbol.addresses() {
                calls.insert(*address, symbol.tid().clone());
            }
        }

        let translator = Translator::new(self.profile, self.options.translator.clone());
        let subs = if self.options.parallel {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.options.threads)
                .build()?;
            info!(
                "Translating {} functions on {} threads",
                functions.len(),
                pool.current_num_threads()
            );
            pool.install(|| {
                functions
                    .par_iter()
                    .enumerate()
                    .map(|(index, function)| self.sub(&translator, &calls, index, function))
                    .collect::<Result<Vec<Term<Sub>>, Error>>()
            })?
        } else {
            info!("Translating {} functions", functions.len());
            functions
                .iter()
                .enumerate()
                .map(|(index, function)| self.sub(&translator, &calls, index, function))
                .collect::<Result<Vec<Term<Sub>>, Error>>()?
        };
        self.check_cancelled()?;

        let entry_points = raw
            .entry_points()
            .iter()
            .map(|address| {
                match functions.binary_search_by_key(address, |function| function.address) {
                    Ok(index) => Tid::sub(*address, index as u32),
                    Err(_) => {
                        warn!("Entry point 0x{:x} is not a function", address);
                        Tid::artificial(*address)
                    }
                }
            })
            .collect();

        let program = Program::new(subs, extern_symbols, entry_points, raw.image_base());
        Ok(Project::new(
            Term::new(Tid::program(raw.image_base()), program),
            self.profile.cpu_architecture().to_string(),
            abi.stack_pointer(),
            self.profile.register_properties().to_vec(),
            self.profile.register_calling_convention().to_vec(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform;

    const DOCUMENT: &str = r#"{
        "cpu_architecture": "x86_64",
        "entry_points": ["0x1000", "0x9999"],
        "functions": [
            { "name": "b", "address": "0x2000", "operations": [
                { "address": "0x2000", "mnemonic": "RETURN" }
            ] },
            { "name": "a", "address": "0x1000", "operations": [
                { "address": "0x1000", "mnemonic": "CALL",
                  "inputs": [{ "kind": "ram", "address": "0x2000", "bits": 64 }] },
                { "address": "0x1004", "mnemonic": "RETURN" }
            ] }
        ]
    }"#;

    #[test]
    fn subs_are_ordered_by_address() {
        let profile = platform::lookup("x86_64").unwrap();
        let raw = RawProgram::from_json(DOCUMENT).unwrap();
        let project = Extractor::new(&profile).extract(&raw).unwrap();
        let program = project.program().term();

        let names: Vec<&str> = program.subs().iter().map(|sub| sub.term().name()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(
            program.entry_points(),
            &[Tid::sub(0x1000, 0), Tid::artificial(0x9999)]
        );

        let call = program.subs()[0].term().blocks()[0].term().jmps()[0].term();
        assert_eq!(call.target(), Some(&Tid::sub(0x2000, 1)));
    }

    #[test]
    fn cancelled_extractions_fail() {
        let profile = platform::lookup("x86_64").unwrap();
        let raw = RawProgram::from_json(DOCUMENT).unwrap();
        let token = CancellationToken::new();
        token.cancel();
        let options = ExtractionOptionsBuilder::new().cancellation(token).build();
        assert!(matches!(
            Extractor::with_options(&profile, options).extract(&raw),
            Err(Error::Cancelled)
        ));
    }

    #[test]
    fn profiles_must_match() {
        let profile = platform::lookup("mips").unwrap();
        let raw = RawProgram::from_json(DOCUMENT).unwrap();
        assert!(matches!(
            Extractor::new(&profile).extract(&raw),
            Err(Error::UnsupportedArchitecture(_))
        ));
    }
}
