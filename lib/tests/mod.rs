use crate::exchange;
use crate::extractor::{ExtractionOptionsBuilder, Extractor};
use crate::il::*;
use crate::loader::RawProgram;
use crate::platform;
use crate::Error;
use std::collections::HashSet;

mod programs;

fn extract(json: &str) -> Project {
    let raw = RawProgram::from_json(json).unwrap();
    let profile = platform::lookup(raw.cpu_architecture()).unwrap();
    Extractor::new(&profile).extract(&raw).unwrap()
}

#[test]
fn mov_ret() {
    let project = extract(programs::MOV_RET);
    let program = project.program().term();
    assert_eq!(program.subs().len(), 1);

    let sub = &program.subs()[0];
    assert_eq!(sub.tid().to_string(), "sub_00001000_s0");
    assert_eq!(sub.term().blocks().len(), 1);

    let block = &sub.term().blocks()[0];
    assert_eq!(block.tid().to_string(), "blk_00001000_s0_b0");
    assert_eq!(block.term().defs().len(), 1);
    assert_eq!(block.term().jmps().len(), 1);

    let def = &block.term().defs()[0];
    assert_eq!(def.tid().to_string(), "instr_00001000_s0_b0_o0");
    let registers = sub.term().registers();
    let rax = registers.find("RAX", 64).unwrap();
    assert_eq!(
        def.term().var(),
        &Variable::Subregister {
            parent: rax,
            lsb: 0,
            bits: 32
        }
    );
    assert_eq!(
        sub.term().expressions().get(def.term().value()),
        &Expression::Const(Constant::new(1, 32))
    );
    assert_eq!(
        def.term().display(sub.term()).to_string(),
        "RAX[0..32] = 0x1:32"
    );

    let jmp = &block.term().jmps()[0];
    assert_eq!(jmp.tid().to_string(), "instr_00001005_s0_b0_o1");
    assert!(matches!(jmp.term(), Jmp::Return(_)));
}

#[test]
fn conditional_branch() {
    let project = extract(programs::CMP_JE);
    let sub = project.program().term().sub(0x2000).unwrap().term();
    assert!(sub.blocks().len() >= 3);

    let target = sub
        .blocks()
        .iter()
        .find(|block| block.term().address() == 0x2010)
        .unwrap();
    let cbranch = sub.blocks()[0]
        .term()
        .jmps()
        .iter()
        .find(|jmp| matches!(jmp.term(), Jmp::CBranch { .. }))
        .unwrap();
    assert_eq!(cbranch.term().target(), Some(target.tid()));

    // The block between the branch and its target falls through explicitly.
    let middle = &sub.blocks()[1];
    assert_eq!(middle.term().address(), 0x2005);
    assert_eq!(
        middle.term().jmps().last().unwrap().term(),
        &Jmp::Branch(target.tid().clone())
    );
}

#[test]
fn tids_are_unique() {
    let project = extract(programs::MIXED);
    let tids = project.program().term().tids();
    let unique: HashSet<&Tid> = tids.iter().copied().collect();
    assert_eq!(tids.len(), unique.len());
    assert!(!unique.contains(project.program().tid()));
}

#[test]
fn blocks_are_well_formed() {
    let project = extract(programs::MIXED);
    for sub in project.program().term().subs() {
        for block in sub.term().blocks() {
            let jmps = block.term().jmps();
            assert!(!jmps.is_empty(), "{} has no jumps", block.tid());
            for jmp in jmps {
                if jmp.term().is_indirect() {
                    assert!(jmp.term().target().is_none());
                }
            }
            assert!(jmps.last().unwrap().term().is_terminating());
        }
    }
}

#[test]
fn indirect_transfers_have_hints() {
    let project = extract(programs::MIXED);
    let dispatch = project.program().term().sub(0x3100).unwrap().term();
    let hints: Vec<&StaticHint> = dispatch
        .blocks()
        .iter()
        .flat_map(|block| block.term().jmps())
        .filter_map(|jmp| match jmp.term() {
            Jmp::BranchInd {
                hint: Some(hint), ..
            } => Some(hint),
            _ => None,
        })
        .collect();
    assert_eq!(hints, vec![&StaticHint::TableBase(Constant::new(0x8000, 64))]);
}

#[test]
fn extraction_is_deterministic() {
    let first = exchange::to_json(&extract(programs::MIXED), false).unwrap();
    let second = exchange::to_json(&extract(programs::MIXED), false).unwrap();
    assert_eq!(first, second);
}

#[test]
fn parallel_and_sequential_agree() {
    let raw = RawProgram::from_json(programs::MIXED).unwrap();
    let profile = platform::lookup(raw.cpu_architecture()).unwrap();

    let sequential = ExtractionOptionsBuilder::new().parallel(false).build();
    let parallel = ExtractionOptionsBuilder::new()
        .parallel(true)
        .threads(4)
        .build();
    let sequential = Extractor::with_options(&profile, sequential)
        .extract(&raw)
        .unwrap();
    let parallel = Extractor::with_options(&profile, parallel)
        .extract(&raw)
        .unwrap();
    assert_eq!(sequential, parallel);
    assert_eq!(
        exchange::to_json(&sequential, true).unwrap(),
        exchange::to_json(&parallel, true).unwrap()
    );
}

#[test]
fn calls_resolve_to_subs_and_externs() {
    let project = extract(programs::MIXED);
    let program = project.program().term();
    let main = program.sub(0x3000).unwrap().term();
    let puts = &program.extern_symbols()[0];
    assert_eq!(puts.name(), "puts");

    let targets: Vec<&Tid> = main
        .blocks()
        .iter()
        .flat_map(|block| block.term().jmps())
        .filter_map(|jmp| match jmp.term() {
            Jmp::Call {
                target: CallTarget::Direct(target),
                ..
            } => Some(target),
            _ => None,
        })
        .collect();
    assert_eq!(targets, vec![program.sub(0x3100).unwrap().tid(), puts.tid()]);
    assert_eq!(
        puts.calling_convention(),
        &Resolution::Resolved("__stdcall".to_string())
    );
    assert_eq!(
        puts.parameters(),
        &[Arg::Register(Register::new("RDI", 64, false))]
    );
}

#[test]
fn stack_only_conventions_are_unknown() {
    let project = extract(programs::X86_EXTERN);
    let symbol = &project.program().term().extern_symbols()[0];
    assert!(symbol.calling_convention().is_unknown());
    assert_eq!(
        project.stack_pointer_register(),
        &Resolution::Resolved(Register::new("ESP", 32, false))
    );
}

#[test]
fn unsupported_operations_are_placeholders() {
    let project = extract(programs::MIXED);
    let main = project.program().term().sub(0x3000).unwrap().term();
    let unknown = main
        .blocks()
        .iter()
        .flat_map(|block| block.term().defs())
        .find(|def| {
            matches!(
                main.expressions().get(def.term().value()),
                Expression::Unknown { .. }
            )
        })
        .unwrap();
    assert!(matches!(
        unknown.term().var(),
        Variable::Subregister { bits: 32, .. }
    ));
}

#[test]
fn oversized_operands_are_placeholders() {
    let project = extract(programs::OVERSIZED);
    let main = project.program().term().sub(0x1000).unwrap().term();
    let defs: Vec<&Term<Def>> = main
        .blocks()
        .iter()
        .flat_map(|block| block.term().defs())
        .collect();
    assert_eq!(defs.len(), 2);
    for def in &defs {
        assert!(matches!(
            main.expressions().get(def.term().value()),
            Expression::Unknown { .. }
        ));
    }
    assert!(matches!(
        defs[0].term().var(),
        Variable::Subregister { bits: 32, .. }
    ));
    // The AH output cannot be modelled, so the placeholder targets memory.
    assert_eq!(defs[1].term().var(), &Variable::Memory);
}

#[test]
fn fatal_errors() {
    let raw = RawProgram::from_json(&programs::MIXED.replace("x86_64", "sparc")).unwrap();
    assert!(matches!(
        platform::lookup(raw.cpu_architecture()),
        Err(Error::UnsupportedArchitecture(_))
    ));

    // Move the first operation in front of the function's entry.
    let broken = programs::MOV_RET.replace(
        r#""address": "0x1000", "mnemonic""#,
        r#""address": "0x0fff", "mnemonic""#,
    );
    assert!(matches!(
        RawProgram::from_json(&broken),
        Err(Error::MalformedBoundary(_))
    ));
}
