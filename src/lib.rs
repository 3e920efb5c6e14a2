//! # PL/0
//!
//! A compiler and P-code virtual machine for the PL/0 teaching language.
//!
//! PL/0 programs are compiled in a single pass to three-field bytecode
//! (opcode, level, modifier) which a stack machine executes with explicit
//! activation records.
//!
//! `pzero compile program.pl0` produces the bytecode artifact along with a
//! symbol table and disassembly listing. `pzero run elf.txt` loads the
//! artifact and runs it to a halt, tracing every instruction.

pub mod lang;
pub mod mach;
pub mod term;
