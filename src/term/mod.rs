/*!
## Terminal frontend

`pzero compile <source> [output]` compiles a source file, prints the
disassembly and symbol table, and writes the artifact (default
`elf.txt`). Nothing is written when compilation fails.

`pzero run <artifact>` loads an artifact and executes it, printing the
per-instruction trace. A pending read prompts on the terminal; Ctrl-C
stops a runaway program.

Any fatal error prints one bold diagnostic and exits non-zero.
*/

extern crate ansi_term;
extern crate ctrlc;
extern crate linefeed;
use crate::error;
use crate::lang::Error;
use crate::mach::{compile, disassembly, symbol_table, Event, Vm};
use ansi_term::Style;
use linefeed::{Interface, ReadResult, Signal};
use std::fs;
use std::io::ErrorKind;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

const DEFAULT_ARTIFACT: &str = "elf.txt";

type Result<T> = std::result::Result<T, Error>;

pub fn main() {
    let args: Vec<String> = std::env::args().collect();
    let outcome = match args.get(1).map(String::as_str) {
        Some("compile") if args.len() == 3 || args.len() == 4 => {
            let output = args.get(3).map(String::as_str).unwrap_or(DEFAULT_ARTIFACT);
            run_compile(&args[2], output)
        }
        Some("run") if args.len() == 3 => run_artifact(&args[2]),
        _ => {
            eprintln!("usage: pzero compile <source> [output]");
            eprintln!("       pzero run <artifact>");
            std::process::exit(2);
        }
    };
    if let Err(error) = outcome {
        eprintln!("{}", Style::new().bold().paint(error.to_string()));
        std::process::exit(1);
    }
}

fn run_compile(source_path: &str, output_path: &str) -> Result<()> {
    let source = read_file(source_path)?;
    let (program, symbols) = compile(&source)?;
    println!("Assembly Code:");
    print!("{}", disassembly(&program));
    println!();
    println!("Symbol Table:");
    print!("{}", symbol_table(&symbols));
    let mut text = program.to_text();
    text.push('\n');
    fs::write(output_path, text).map_err(|_| error!(InternalError; "CANNOT WRITE ARTIFACT"))?;
    Ok(())
}

fn run_artifact(artifact_path: &str) -> Result<()> {
    let text = read_file(artifact_path)?;
    let mut vm = Vm::from_text(&text)?;

    let interrupted = Arc::new(AtomicBool::new(false));
    let int_moved = interrupted.clone();
    ctrlc::set_handler(move || {
        int_moved.store(true, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl-C handler");

    let input = Interface::new("pzero").map_err(io_fault)?;
    input.set_report_signal(Signal::Interrupt, true);

    println!("{}", vm.trace_header());
    loop {
        if interrupted.load(Ordering::SeqCst) {
            return Err(error!(Interrupted));
        }
        match vm.step()? {
            Event::Stepped => println!("{}", vm.trace()),
            Event::Output(value) => {
                println!("{}", value);
                println!("{}", vm.trace());
            }
            Event::Input => {
                read_integer(&input, &mut vm)?;
                println!("{}", vm.trace());
            }
            Event::Stopped => {
                println!("{}", vm.trace());
                return Ok(());
            }
        }
    }
}

/// Prompt until a well-formed integer arrives; EOF or an interrupt
/// signal during the prompt stops the program.
fn read_integer(input: &Interface<linefeed::DefaultTerminal>, vm: &mut Vm) -> Result<()> {
    input.set_prompt("? ").map_err(io_fault)?;
    loop {
        match input.read_line().map_err(io_fault)? {
            ReadResult::Input(line) => match line.trim().parse::<i64>() {
                Ok(value) => return vm.input(value),
                Err(_) => println!("{}", Style::new().bold().paint("NOT AN INTEGER")),
            },
            ReadResult::Signal(_) | ReadResult::Eof => return Err(error!(Interrupted)),
        }
    }
}

fn read_file(path: &str) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(source) => Ok(source),
        Err(error) => match error.kind() {
            ErrorKind::NotFound => Err(error!(FileNotFound)),
            _ => Err(error!(InternalError; "CANNOT READ FILE")),
        },
    }
}

fn io_fault(_: std::io::Error) -> Error {
    error!(InternalError; "TERMINAL UNAVAILABLE")
}
