//! Hands generated assembly to the host assembler and linker.

use std::{
    path::Path,
    process::{Command, Output},
};

use mktemp::Temp;

use crate::{
    backend::target::{CodeGenerator, Target},
    error::{CompileResult, error_at},
    frontend::lexer::Location,
};

/// Assembles `assembly` together with the target's runtime and links both
/// into an executable at `output_file`. Intermediate files live in a
/// temporary directory which is removed afterwards.
pub fn build_executable(target: Target, assembly: &str, output_file: &Path) -> CompileResult<()> {
    let code_generator = target.get_code_generator();

    let build_dir = Temp::new_dir()
        .map_err(|e| error_at!(Build, None::<Location>, "failed to create build directory: {e}"))?;

    let program_asm = build_dir.as_path().join("program.s");
    let program_obj = build_dir.as_path().join("program.o");
    let runtime_asm = build_dir.as_path().join("runtime.s");
    let runtime_obj = build_dir.as_path().join("runtime.o");

    write_file(&program_asm, assembly)?;
    write_file(&runtime_asm, code_generator.runtime_asm())?;

    run(
        "assembler",
        code_generator.create_assembler_command(&program_asm, &program_obj),
    )?;
    run(
        "assembler",
        code_generator.create_assembler_command(&runtime_asm, &runtime_obj),
    )?;
    run(
        "linker",
        code_generator.create_linker_command(&[&program_obj, &runtime_obj], output_file),
    )?;

    Ok(())
}

fn write_file(path: &Path, contents: &str) -> CompileResult<()> {
    std::fs::write(path, contents).map_err(|e| {
        error_at!(
            Build,
            None::<Location>,
            "failed to write `{}`: {e}",
            path.display()
        )
    })
}

fn run(tool: &str, mut command: Command) -> CompileResult<Output> {
    let program = command.get_program().to_string_lossy().into_owned();

    let output = command
        .output()
        .map_err(|e| error_at!(Build, None::<Location>, "failed to run {tool} `{program}`: {e}"))?;

    if !output.status.success() {
        return Err(error_at!(
            Build,
            None::<Location>,
            "{tool} `{program}` failed ({}):\n{}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim_end()
        ));
    }

    Ok(output)
}
