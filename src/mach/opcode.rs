use super::Address;
use crate::error;
use crate::lang::Error;

type Result<T> = std::result::Result<T, Error>;

/// ## Virtual machine instruction set
///
/// Every instruction occupies three words on the wire: `op l m`.
/// `l` is a level delta, the number of static links to follow from the
/// current frame; `m` is a literal, a frame offset, a word address, or a
/// sub-operation selector depending on the opcode.
///
/// For example: `b := a + 1` compiles to `[Lit(5), Lit(1), Opr(Add), Sto(0, 3)]`.

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Opcode {
    /// Push literal m.
    Lit(i64),
    /// Arithmetic, relational, and return operations on the stack top.
    Opr(Opr),
    /// Push the value at frame(l) offset m.
    Lod(usize, usize),
    /// Pop into frame(l) offset m.
    Sto(usize, usize),
    /// Call the procedure at word address m with static link frame(l).
    Cal(usize, Address),
    /// Allocate m stack words (frame header plus locals).
    Inc(i64),
    /// Unconditional jump to word address m.
    Jmp(Address),
    /// Pop; jump to word address m if zero.
    Jpc(Address),
    /// System call: write, read, or halt.
    Sys(Sys),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Opr {
    Rtn = 0,
    Add = 1,
    Sub = 2,
    Mul = 3,
    Div = 4,
    Eql = 5,
    Neq = 6,
    Lss = 7,
    Leq = 8,
    Gtr = 9,
    Geq = 10,
    Mod = 11,
    Odd = 12,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sys {
    Write = 1,
    Read = 2,
    Halt = 3,
}

impl Opcode {
    /// Wire encoding as an `op l m` triple.
    pub fn encode(self) -> (i64, i64, i64) {
        use Opcode::*;
        match self {
            Lit(m) => (1, 0, m),
            Opr(sub) => (2, 0, sub as i64),
            Lod(l, m) => (3, l as i64, m as i64),
            Sto(l, m) => (4, l as i64, m as i64),
            Cal(l, m) => (5, l as i64, m as i64),
            Inc(m) => (6, 0, m),
            Jmp(m) => (7, 0, m as i64),
            Jpc(m) => (8, 0, m as i64),
            Sys(sub) => (9, 0, sub as i64),
        }
    }

    /// Decode a wire triple. Anything outside the instruction table is an
    /// invalid opcode, fatal to the machine.
    pub fn decode(op: i64, l: i64, m: i64) -> Result<Opcode> {
        fn field(v: i64) -> Result<usize> {
            if v < 0 {
                Err(error!(InvalidOpcode; "NEGATIVE FIELD"))
            } else {
                Ok(v as usize)
            }
        }
        use Opcode::*;
        Ok(match op {
            1 => Lit(m),
            2 => Opr(self::Opr::decode(m)?),
            3 => Lod(field(l)?, field(m)?),
            4 => Sto(field(l)?, field(m)?),
            5 => Cal(field(l)?, field(m)?),
            6 => Inc(m),
            7 => Jmp(field(m)?),
            8 => Jpc(field(m)?),
            9 => Sys(self::Sys::decode(m)?),
            _ => return Err(error!(InvalidOpcode)),
        })
    }

    /// Coarse opcode name, as used in the disassembly listing.
    pub fn kind_name(self) -> &'static str {
        use Opcode::*;
        match self {
            Lit(_) => "LIT",
            Opr(_) => "OPR",
            Lod(..) => "LOD",
            Sto(..) => "STO",
            Cal(..) => "CAL",
            Inc(_) => "INC",
            Jmp(_) => "JMP",
            Jpc(_) => "JPC",
            Sys(_) => "SYS",
        }
    }

    /// Fine mnemonic, as used in the execution trace. `OPR` instructions
    /// trace as their sub-operation.
    pub fn mnemonic(self) -> &'static str {
        use self::Opr::*;
        match self {
            Opcode::Opr(sub) => match sub {
                Rtn => "RTN",
                Add => "ADD",
                Sub => "SUB",
                Mul => "MUL",
                Div => "DIV",
                Eql => "EQL",
                Neq => "NEQ",
                Lss => "LSS",
                Leq => "LEQ",
                Gtr => "GTR",
                Geq => "GEQ",
                Mod => "MOD",
                Odd => "ODD",
            },
            other => other.kind_name(),
        }
    }
}

impl Opr {
    fn decode(m: i64) -> Result<Opr> {
        use Opr::*;
        Ok(match m {
            0 => Rtn,
            1 => Add,
            2 => Sub,
            3 => Mul,
            4 => Div,
            5 => Eql,
            6 => Neq,
            7 => Lss,
            8 => Leq,
            9 => Gtr,
            10 => Geq,
            11 => Mod,
            12 => Odd,
            _ => return Err(error!(InvalidOpcode; "BAD OPR SUB-OPERATION")),
        })
    }
}

impl Sys {
    fn decode(m: i64) -> Result<Sys> {
        use Sys::*;
        Ok(match m {
            1 => Write,
            2 => Read,
            3 => Halt,
            _ => return Err(error!(InvalidOpcode; "BAD SYS SUB-OPERATION")),
        })
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let (_, l, m) = self.encode();
        write!(f, "{} {} {}", self.kind_name(), l, m)
    }
}
