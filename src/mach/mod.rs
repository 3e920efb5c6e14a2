/*!
## Rust Machine Module

This Rust module is a compiler and virtual machine for PL/0.

The compiler is a single-pass recursive-descent parser that emits
P-code directly; the virtual machine executes the emitted program on a
stack of activation records linked by static and dynamic links.

*/

/// Absolute word address in the machine store. The text segment starts
/// at [`ORIGIN`]; instruction index `i` lives at `ORIGIN + 3 * i`.
pub type Address = usize;

/// First word of the text segment. Lower addresses are reserved.
pub const ORIGIN: Address = 10;

mod codegen;
mod listing;
mod opcode;
mod program;
mod runtime;
mod stack;
mod symbol;

pub use codegen::compile;
pub use listing::disassembly;
pub use listing::symbol_table;
pub use opcode::Opcode;
pub use opcode::Opr;
pub use opcode::Sys;
pub use program::Forward;
pub use program::Program;
pub use runtime::Event;
pub use runtime::Vm;
pub use stack::Stack;
pub use symbol::SymKind;
pub use symbol::SymbolEntry;
pub use symbol::SymbolTable;
