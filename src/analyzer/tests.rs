use super::analyze;
use crate::ast::{AddrMode, FillValue, Statement};
use crate::error::ErrorList;
use crate::isa;
use crate::parser::parse;

fn analyze_source(src: &str) -> (crate::ast::Program, ErrorList) {
    let (listing, mut errors) = parse(src, "t.asm");
    let program = analyze(&listing, &mut errors);
    (program, errors)
}

#[test]
fn add_register_mode() {
    let (program, errors) = analyze_source("ADD R0 R1 R2");
    assert!(errors.is_empty(), "{}", errors);
    assert_eq!(program.statements.len(), 1);
    match &program.statements[0] {
        Statement::Instruction {
            opcode,
            dr,
            sr1,
            sr2,
            mode,
            ..
        } => {
            assert_eq!(*opcode, isa::OP_ADD);
            assert_eq!(*dr, Some(0));
            assert_eq!(*sr1, Some(1));
            assert_eq!(*sr2, Some(2));
            assert_eq!(*mode, Some(AddrMode::Register));
        }
        other => panic!("unexpected statement: {:?}", other),
    }
}

#[test]
fn add_immediate_out_of_range_reports_error() {
    let (_, errors) = analyze_source("ADD R0 R1 #20");
    assert_eq!(errors.len(), 1);
    assert!(errors.to_string().contains("too large to fit in 5 bits"));
}

#[test]
fn duplicate_label_reports_error_without_overwriting() {
    let (program, errors) = analyze_source("LOOP: ADD R0 R1 R2\nLOOP: AND R0 R1 R2\n");
    assert_eq!(errors.len(), 1);
    assert!(errors.to_string().contains("label redefined: LOOP"));
    assert_eq!(program.symbol_table.get("LOOP"), Some(isa::DEFAULT_ORIGIN));
}

#[test]
fn bare_br_means_unconditional() {
    let (program, errors) = analyze_source("BR LOOP");
    assert!(errors.is_empty());
    match &program.statements[0] {
        Statement::Instruction { branch_flags, label_ref, .. } => {
            let flags = branch_flags.unwrap();
            assert!(flags.n && flags.z && flags.p);
            assert_eq!(label_ref.as_deref(), Some("LOOP"));
        }
        other => panic!("unexpected statement: {:?}", other),
    }
}

#[test]
fn brz_only_sets_zero_flag() {
    let (program, errors) = analyze_source("BRz LOOP");
    assert!(errors.is_empty());
    match &program.statements[0] {
        Statement::Instruction { branch_flags, .. } => {
            let flags = branch_flags.unwrap();
            assert!(!flags.n && flags.z && !flags.p);
        }
        other => panic!("unexpected statement: {:?}", other),
    }
}

#[test]
fn br_accepts_a_literal_number_in_place_of_a_label() {
    let (program, errors) = analyze_source("BRnp #5");
    assert!(errors.is_empty(), "{}", errors);
    match &program.statements[0] {
        Statement::Instruction {
            pc_offset9,
            label_ref,
            branch_flags,
            ..
        } => {
            assert_eq!(*pc_offset9, Some(5));
            assert!(label_ref.is_none());
            let flags = branch_flags.unwrap();
            assert!(flags.n && !flags.z && flags.p);
        }
        other => panic!("unexpected statement: {:?}", other),
    }
}

#[test]
fn br_literal_offset_out_of_range_reports_error() {
    let (_, errors) = analyze_source("BR #300");
    assert_eq!(errors.len(), 1);
    assert!(errors.to_string().contains("too large to fit in 9 bits"));
}

#[test]
fn halt_with_operands_reports_error() {
    let (_, errors) = analyze_source("HALT R0 R1 GARBAGE");
    assert_eq!(errors.len(), 1);
    assert!(errors.to_string().contains("expected 0 arguments, got: 3"));
}

#[test]
fn halt_lowers_to_trap_halt_vector() {
    let (program, errors) = analyze_source("HALT");
    assert!(errors.is_empty());
    match &program.statements[0] {
        Statement::Instruction { opcode, trapvect8, .. } => {
            assert_eq!(*opcode, isa::OP_TRAP);
            assert_eq!(*trapvect8, Some(isa::TRAPVECT_HALT));
        }
        other => panic!("unexpected statement: {:?}", other),
    }
}

#[test]
fn fill_accepts_both_numbers_and_labels() {
    let (program, errors) = analyze_source("DATA: .FILL #7\n.FILL DATA\n");
    assert!(errors.is_empty());
    assert!(matches!(
        program.statements[0],
        Statement::FillDirective {
            value: FillValue::Immediate(7),
            ..
        }
    ));
    match &program.statements[1] {
        Statement::FillDirective { value: FillValue::Label(name), .. } => assert_eq!(name, "DATA"),
        other => panic!("unexpected statement: {:?}", other),
    }
}

#[test]
fn orig_sets_program_origin_and_is_not_a_statement() {
    let (program, errors) = analyze_source(".ORIG x4000\nADD R0 R1 R2\n");
    assert!(errors.is_empty());
    assert_eq!(program.origin, 0x4000);
    assert_eq!(program.statements.len(), 1);
}

#[test]
fn orig_after_first_instruction_is_an_error() {
    let (_, errors) = analyze_source("ADD R0 R1 R2\n.ORIG x4000\n");
    assert!(errors
        .to_string()
        .contains("'.ORIG' directive must appear before any instructions"));
}

#[test]
fn unrecognized_opcode_reports_error() {
    let (_, errors) = analyze_source("FROB R0 R1 R2");
    assert_eq!(errors.len(), 1);
    assert!(errors.to_string().contains("unrecognized operation name: FROB"));
}
