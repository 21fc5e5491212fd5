use super::*;
use crate::{
    error::CompileErrorKind,
    frontend::{SourceFile, parser::parse_source},
    index::Index,
    middle::{
        ir::{VarId, lowering::lower_module},
        type_checker::type_check_module,
    },
};

fn layout_of(source: &str) -> StackLayout {
    let module = parse_source(&SourceFile::from_memory(source)).unwrap();
    type_check_module(&module).unwrap();
    StackLayout::for_module(&lower_module(&module).unwrap())
}

fn temporary(index: usize) -> IrVar {
    IrVar::Temporary(VarId::new(index))
}

#[test]
fn test_slots_follow_first_occurrence() {
    let layout = layout_of("1 + 2 * 3");

    assert_eq!(layout.slot_count(), 6);
    for index in 1..=6 {
        assert_eq!(layout.offset_of(temporary(index)), Some(index * SLOT_SIZE));
    }
}

#[test]
fn test_named_variables_have_no_slot() {
    let layout = layout_of("print_int(1)");

    assert_eq!(layout.offset_of(IrVar::named("print_int")), None);
    assert!(
        layout
            .operand(IrVar::named("print_int"), Location::new(1, 1))
            .is_err_and(|error| error.kind == CompileErrorKind::Codegen)
    );
}

#[test]
fn test_layout_is_shared_across_functions() {
    let layout = layout_of("fun add(a: Int, b: Int): Int { a + b }\nadd(1, 2)");

    // x1..x3 belong to `add`, x4..x7 to the entry point
    assert_eq!(layout.slot_count(), 7);
    assert_eq!(layout.offset_of(temporary(1)), Some(8));
    assert_eq!(layout.offset_of(temporary(7)), Some(56));
    assert_eq!(layout.frame_size(), 64);
}

#[test]
fn test_frame_size_is_aligned() {
    assert_eq!(StackLayout::default().frame_size(), 0);
    assert_eq!(layout_of("1").frame_size(), 16);
    assert_eq!(layout_of("1 + 2 * 3").frame_size(), 48);
}

#[test]
fn test_operands() {
    let layout = layout_of("1 + 2");

    assert_eq!(
        layout.operand(temporary(2), Location::default()).unwrap(),
        "qword [rbp - 16]"
    );
    assert!(layout.operand(temporary(99), Location::default()).is_err());
}
