use super::{Address, Opcode, Stack, ORIGIN};
use crate::error;
use crate::lang::Error;

type Result<T> = std::result::Result<T, Error>;

/// ## Bytecode program
///
/// The ordered instruction sequence produced by the code generator and
/// consumed by the virtual machine. Instructions are never removed once
/// emitted; a forward jump is emitted with a placeholder operand and
/// rewritten in place through its [`Forward`] handle once the target
/// address is known.

#[derive(Debug)]
pub struct Program {
    ops: Stack<Opcode>,
}

/// One-shot handle to an emitted instruction awaiting its jump target.
pub struct Forward(usize);

impl Program {
    pub fn new() -> Program {
        Program {
            ops: Stack::new("PROGRAM TOO LARGE"),
        }
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Word address of the next instruction to be emitted.
    pub fn here(&self) -> Address {
        ORIGIN + 3 * self.ops.len()
    }

    pub fn emit(&mut self, op: Opcode) -> Result<()> {
        self.ops.push(op)
    }

    /// Emit a jump whose target is not yet known. The placeholder operand
    /// is whatever `op` carries; it must be rewritten via [`Program::patch`]
    /// before the program is considered complete.
    pub fn forward(&mut self, op: Opcode) -> Result<Forward> {
        let index = self.ops.len();
        self.ops.push(op)?;
        Ok(Forward(index))
    }

    /// Resolve a forward reference, rewriting the operand in place.
    pub fn patch(&mut self, forward: Forward, target: Address) -> Result<()> {
        use Opcode::*;
        match self.ops.get_mut(forward.0) {
            Some(op) => {
                *op = match *op {
                    Jmp(_) => Jmp(target),
                    Jpc(_) => Jpc(target),
                    Cal(l, _) => Cal(l, target),
                    _ => return Err(error!(InternalError; "PATCH OF A NON-JUMP")),
                };
                Ok(())
            }
            None => Err(error!(InternalError; "PATCH OUT OF RANGE")),
        }
    }

    pub fn ops(&self) -> std::slice::Iter<'_, Opcode> {
        self.ops.iter()
    }

    /// The wire format: one whitespace-separated `op l m` triple per
    /// instruction, in execution order. This text is both the persisted
    /// artifact and the exact form loaded into the machine store.
    pub fn to_text(&self) -> String {
        let mut s = String::new();
        for (index, op) in self.ops.iter().enumerate() {
            let (op, l, m) = op.encode();
            if index > 0 {
                s.push('\n');
            }
            s.push_str(&format!("{} {} {}", op, l, m));
        }
        s
    }

    pub fn from_text(text: &str) -> Result<Program> {
        let mut program = Program::new();
        let mut words = text.split_whitespace();
        loop {
            let op = match words.next() {
                Some(word) => parse_word(word)?,
                None => return Ok(program),
            };
            let l = match words.next() {
                Some(word) => parse_word(word)?,
                None => return Err(error!(SyntaxError; "TRUNCATED TRIPLE")),
            };
            let m = match words.next() {
                Some(word) => parse_word(word)?,
                None => return Err(error!(SyntaxError; "TRUNCATED TRIPLE")),
            };
            program.emit(Opcode::decode(op, l, m)?)?;
        }
    }
}

fn parse_word(word: &str) -> Result<i64> {
    word.parse::<i64>()
        .map_err(|_| error!(SyntaxError; "BAD ARTIFACT"))
}
