use std::fs;
use std::process::ExitCode;

use clap::Parser as Clap;
use thiserror::Error;

use yorkie::ast::dumper::AstDumper;
use yorkie::ast::AstContext;
use yorkie::codegen::CodeGen;
use yorkie::driver::{Driver, Pass, PassError};
use yorkie::parser::Parser;

#[derive(Clap)]
#[command(name = "yorkie", about = "Compiler for the Yorkie language", version)]
struct Args {
    /// File to compile
    #[arg(short = 'i', long = "input-file")]
    input_file: String,

    /// Prints out the AST to stdout
    #[arg(long = "print-ast")]
    print_ast: bool,
}

#[derive(Debug, Error)]
enum CompileError {
    #[error("Could not open input file '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error(transparent)]
    Pass(#[from] PassError),
}

impl CompileError {
    fn exit_code(&self) -> u8 {
        match self {
            CompileError::Io { .. } => 2,
            CompileError::Pass(_) => 1,
        }
    }
}

fn compile(args: &Args) -> Result<(), CompileError> {
    let source = fs::read_to_string(&args.input_file).map_err(|source| CompileError::Io {
        path: args.input_file.clone(),
        source,
    })?;
    let src = source.as_str();

    let mut ctx = AstContext::new(args.input_file.clone());
    let mut driver = Driver::new();

    driver.add(Pass::new("Parse", move |ctx: &mut AstContext| {
        let mut parser = Parser::new(src, ctx);
        parser.parse_top_level();
        if parser.report_errors(src) {
            return Err("the input did not parse cleanly".to_string());
        }
        Ok(())
    }));

    if args.print_ast {
        driver.add(Pass::new("Dump", |ctx: &mut AstContext| {
            print!("{}", AstDumper.run(ctx));
            Ok(())
        }));
    }

    driver.add(Pass::new("CodeGen", move |ctx: &mut AstContext| {
        let file = ctx.file_name.clone();
        let mut codegen = CodeGen::new(&file, &file);
        codegen.run(ctx);
        let failed = codegen.report_errors(src);

        // The module goes to stdout even when some functions failed; the
        // surviving definitions are still useful output.
        print!("{}", codegen.finish());

        if failed {
            return Err("code generation surfaced errors".to_string());
        }
        Ok(())
    }));

    driver.run(&mut ctx)?;
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    match compile(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{}", error);
            ExitCode::from(error.exit_code())
        }
    }
}
