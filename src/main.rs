use std::{
    io::{self, Read, Write},
    path::{Path, PathBuf},
    process::ExitCode,
};

use clap::{CommandFactory, Parser as ClapParser, Subcommand, error::ErrorKind};
use minic::{
    Compiler,
    backend::CodegenOptions,
    error::CompileResult,
    frontend::{SourceFile, SourceFileOrigin},
    middle::ir::pretty_print::pretty_print_module,
};

#[derive(Debug, ClapParser)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    command: Command,

    /// Report each finished compilation stage on stderr
    #[arg(long, global = true)]
    verbose: bool,

    /// Annotate generated assembly with the IR each instruction came from
    #[arg(long, global = true)]
    emit_debug_info: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run a program on the IR interpreter
    Interpret {
        /// Source file, read from stdin when omitted
        source: Option<PathBuf>,
    },
    /// Print the IR of a program
    Ir { source: Option<PathBuf> },
    /// Print the generated x86-64 assembly
    Asm { source: Option<PathBuf> },
    /// Build a native executable
    Compile {
        source: Option<PathBuf>,

        #[arg(short, long, default_value = "a.out")]
        output: PathBuf,
    },
}

impl Command {
    fn source(&self) -> Option<&Path> {
        match self {
            Command::Interpret { source }
            | Command::Ir { source }
            | Command::Asm { source }
            | Command::Compile { source, .. } => source.as_deref(),
        }
    }
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(error) => {
            let _ = error.print();

            // --help and --version are not failures
            return if error.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let source_file = match read_source_file(args.command.source()) {
        Ok(source_file) => source_file,
        Err(message) => {
            let _ = Args::command().error(ErrorKind::Io, message).print();
            return ExitCode::FAILURE;
        }
    };

    let compiler = Compiler::new(
        CodegenOptions {
            emit_debug_info: args.emit_debug_info,
        },
        args.verbose,
    );

    match run(&compiler, &args.command, &source_file) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{}", error.render(&source_file));
            ExitCode::FAILURE
        }
    }
}

fn run(compiler: &Compiler, command: &Command, source_file: &SourceFile) -> CompileResult<()> {
    match command {
        Command::Interpret { .. } => {
            compiler.interpret(source_file, io::stdin().lock(), io::stdout().lock())?;
        }
        Command::Ir { .. } => {
            let ir = compiler.lower(source_file)?;
            print!("{}", pretty_print_module(&ir));
        }
        Command::Asm { .. } => {
            let assembly = compiler.generate_assembly(source_file)?;
            print!("{assembly}");
        }
        Command::Compile { output, .. } => {
            compiler.compile(source_file, output)?;
        }
    }

    let _ = io::stdout().flush();

    Ok(())
}

fn read_source_file(path: Option<&Path>) -> Result<SourceFile, String> {
    match path {
        Some(path) => {
            if !path.is_file() {
                return Err(format!("Source file '{}' does not exist!", path.display()));
            }

            let contents = std::fs::read_to_string(path)
                .map_err(|e| format!("Failed to read '{}': {e}", path.display()))?;

            Ok(SourceFile {
                contents,
                origin: SourceFileOrigin::File(path.to_path_buf()),
            })
        }
        None => {
            let mut contents = String::new();

            io::stdin()
                .read_to_string(&mut contents)
                .map_err(|e| format!("Failed to read stdin: {e}"))?;

            Ok(SourceFile {
                contents,
                origin: SourceFileOrigin::Stdin,
            })
        }
    }
}
