use super::{Opcode, Opr, Program, Sys, ORIGIN};
use crate::error;
use crate::lang::Error;

type Result<T> = std::result::Result<T, Error>;

/// Total words in the store.
pub const STORE_SIZE: usize = 500;

/// One past the bottom of the stack region; the first push lands at
/// `STACK_BASE - 1`.
const STACK_BASE: usize = 500;

#[derive(Debug, PartialEq)]
pub enum Event {
    /// An instruction retired with no external effect.
    Stepped,
    /// The program wrote a value.
    Output(i64),
    /// The program wants an integer; answer with [`Vm::input`].
    Input,
    /// The program halted. Subsequent steps return this forever.
    Stopped,
}

#[derive(PartialEq)]
enum State {
    Running,
    Reading,
    Halted,
}

/// ## Virtual machine
///
/// A single flat store of words holds both the program text and the
/// stack. Text is loaded at [`ORIGIN`]; the stack grows downward from
/// the top of the store toward the text, and the space between them is
/// the only headroom a running program has.
///
/// The machine is driven one instruction at a time through [`Vm::step`],
/// which reports anything the caller must act on as an [`Event`]. Input
/// is two-phase so the machine itself never touches an I/O stream:
/// `Sys(Read)` returns [`Event::Input`] and the caller answers with
/// [`Vm::input`].
pub struct Vm {
    store: Vec<i64>,
    /// Marks each word that holds a frame base, for the trace bars.
    frames: Vec<bool>,
    pc: usize,
    bp: usize,
    sp: usize,
    /// First word past the loaded text; the stack may not grow below it.
    text_end: usize,
    state: State,
    trace: String,
}

impl Vm {
    /// Load a program into a fresh store.
    pub fn load(program: &Program) -> Result<Vm> {
        let mut store = vec![0; STORE_SIZE];
        let mut index = ORIGIN;
        for op in program.ops() {
            if index + 3 > STORE_SIZE {
                return Err(error!(OutOfMemory; "PROGRAM EXCEEDS STORE"));
            }
            let (op, l, m) = op.encode();
            store[index] = op;
            store[index + 1] = l;
            store[index + 2] = m;
            index += 3;
        }
        Ok(Vm {
            store,
            frames: vec![false; STORE_SIZE],
            pc: ORIGIN,
            bp: STACK_BASE - 1,
            sp: STACK_BASE,
            text_end: index,
            state: State::Running,
            trace: String::new(),
        })
    }

    /// Load a persisted artifact. Loading text and re-loading the same
    /// program in memory produce identical machines.
    pub fn from_text(text: &str) -> Result<Vm> {
        Vm::load(&Program::from_text(text)?)
    }

    pub fn pc(&self) -> usize {
        self.pc
    }

    pub fn bp(&self) -> usize {
        self.bp
    }

    pub fn sp(&self) -> usize {
        self.sp
    }

    /// Trace line for the most recently retired instruction.
    pub fn trace(&self) -> &str {
        &self.trace
    }

    /// Column header and initial register line for the execution trace.
    pub fn trace_header(&self) -> String {
        format!(
            "{:17}PC  BP  SP  Stack\nInitial values:  {:<3} {:<3} {:<3}",
            "", self.pc, self.bp, self.sp
        )
    }

    /// Fetch, decode, and execute one instruction.
    pub fn step(&mut self) -> Result<Event> {
        match self.state {
            State::Halted => return Ok(Event::Stopped),
            State::Reading => return Err(error!(InternalError; "READ STILL PENDING")),
            State::Running => {}
        }
        if self.pc + 3 > STORE_SIZE {
            return Err(error!(InvalidOpcode; "PC OUT OF RANGE"));
        }
        let op = Opcode::decode(
            self.store[self.pc],
            self.store[self.pc + 1],
            self.store[self.pc + 2],
        )?;
        self.pc += 3;
        let event = self.exec(op)?;
        match event {
            Event::Input => self.state = State::Reading,
            Event::Stopped => {
                self.state = State::Halted;
                self.write_trace(op);
            }
            _ => self.write_trace(op),
        }
        Ok(event)
    }

    /// Answer a pending [`Event::Input`] and resume.
    pub fn input(&mut self, value: i64) -> Result<()> {
        if self.state != State::Reading {
            return Err(error!(InternalError; "NO READ PENDING"));
        }
        self.push(value)?;
        self.state = State::Running;
        self.write_trace(Opcode::Sys(Sys::Read));
        Ok(())
    }

    fn exec(&mut self, op: Opcode) -> Result<Event> {
        use Opcode::*;
        match op {
            Lit(m) => self.push(m)?,
            Opr(sub) => return self.operate(sub),
            Lod(l, m) => {
                let slot = self.slot(l, m)?;
                let value = self.word(slot)?;
                self.push(value)?;
            }
            Sto(l, m) => {
                let slot = self.slot(l, m)?;
                let value = self.pop()?;
                self.store[slot] = value;
            }
            Cal(l, m) => {
                // The frame header is written below the current top; the
                // callee's INC claims it along with the locals.
                if self.sp < self.text_end + 3 {
                    return Err(error!(OutOfMemory; "STACK OVERFLOW"));
                }
                let static_link = self.base(l)?;
                self.store[self.sp - 1] = static_link as i64;
                self.store[self.sp - 2] = self.bp as i64;
                self.store[self.sp - 3] = self.pc as i64;
                self.bp = self.sp - 1;
                self.frames[self.bp] = true;
                self.pc = m;
            }
            Inc(m) => {
                if m < 0 {
                    return Err(error!(InvalidOpcode; "NEGATIVE ALLOCATION"));
                }
                let m = m as usize;
                if self.sp < self.text_end + m {
                    return Err(error!(OutOfMemory; "STACK OVERFLOW"));
                }
                self.sp -= m;
            }
            Jmp(m) => self.pc = m,
            Jpc(m) => {
                if self.pop()? == 0 {
                    self.pc = m;
                }
            }
            Sys(sub) => return self.system(sub),
        }
        Ok(Event::Stepped)
    }

    fn system(&mut self, sub: Sys) -> Result<Event> {
        Ok(match sub {
            Sys::Write => Event::Output(self.pop()?),
            Sys::Read => Event::Input,
            Sys::Halt => Event::Stopped,
        })
    }

    fn operate(&mut self, sub: Opr) -> Result<Event> {
        use Opr::*;
        if sub == Rtn {
            // Discard the frame and restore the caller's context from
            // the header the CAL wrote.
            if self.bp < 2 || self.bp + 1 > STACK_BASE {
                return Err(error!(InternalError; "RETURN OUTSIDE FRAME"));
            }
            self.frames[self.bp] = false;
            self.sp = self.bp + 1;
            self.bp = address(self.store[self.sp - 2])?;
            self.pc = address(self.store[self.sp - 3])?;
            return Ok(Event::Stepped);
        }
        if sub == Odd {
            let top = self.top_mut()?;
            *top = top.rem_euclid(2);
            return Ok(Event::Stepped);
        }
        let rhs = self.pop()?;
        let lhs = *self.top_mut()?;
        let result = match sub {
            Add => lhs.checked_add(rhs),
            Sub => lhs.checked_sub(rhs),
            Mul => lhs.checked_mul(rhs),
            Div => {
                if rhs == 0 {
                    return Err(error!(DivisionByZero));
                }
                lhs.checked_div(rhs)
            }
            Mod => {
                if rhs == 0 {
                    return Err(error!(DivisionByZero));
                }
                lhs.checked_rem(rhs)
            }
            Eql => Some((lhs == rhs) as i64),
            Neq => Some((lhs != rhs) as i64),
            Lss => Some((lhs < rhs) as i64),
            Leq => Some((lhs <= rhs) as i64),
            Gtr => Some((lhs > rhs) as i64),
            Geq => Some((lhs >= rhs) as i64),
            Rtn | Odd => unreachable!(),
        };
        match result {
            Some(value) => {
                *self.top_mut()? = value;
                Ok(Event::Stepped)
            }
            None => Err(error!(Overflow)),
        }
    }

    fn push(&mut self, value: i64) -> Result<()> {
        if self.sp <= self.text_end {
            return Err(error!(OutOfMemory; "STACK OVERFLOW"));
        }
        self.sp -= 1;
        self.store[self.sp] = value;
        Ok(())
    }

    fn pop(&mut self) -> Result<i64> {
        if self.sp >= STACK_BASE {
            return Err(error!(InternalError; "STACK UNDERFLOW"));
        }
        let value = self.store[self.sp];
        self.sp += 1;
        Ok(value)
    }

    fn top_mut(&mut self) -> Result<&mut i64> {
        if self.sp >= STACK_BASE {
            return Err(error!(InternalError; "STACK UNDERFLOW"));
        }
        Ok(&mut self.store[self.sp])
    }

    fn word(&self, index: usize) -> Result<i64> {
        self.store
            .get(index)
            .copied()
            .ok_or_else(|| error!(InternalError; "STORE FAULT"))
    }

    /// Follow `l` static links from the current frame.
    fn base(&self, l: usize) -> Result<usize> {
        let mut arb = self.bp;
        for _ in 0..l {
            arb = address(self.word(arb)?)?;
        }
        Ok(arb)
    }

    /// Store index of frame(l) offset m.
    fn slot(&self, l: usize, m: usize) -> Result<usize> {
        let base = self.base(l)?;
        base.checked_sub(m)
            .filter(|slot| *slot >= self.text_end)
            .ok_or_else(|| error!(InternalError; "STORE FAULT"))
    }

    /// One trace line: mnemonic, raw operands, registers, then the stack
    /// from its base down to the top with a bar at each frame boundary.
    fn write_trace(&mut self, op: Opcode) {
        let (_, l, m) = op.encode();
        let mut line = format!(
            "    {:<4} {:<3} {:<3} {:<3} {:<3} {:<3} ",
            op.mnemonic(),
            l,
            m,
            self.pc,
            self.bp,
            self.sp
        );
        for index in (self.sp..STACK_BASE).rev() {
            if self.frames[index] {
                line.push_str("| ");
            }
            line.push_str(&format!("{} ", self.store[index]));
        }
        self.trace = line.trim_end().to_string();
    }
}

fn address(value: i64) -> Result<usize> {
    if value < 0 || value as usize >= STORE_SIZE {
        Err(error!(InternalError; "BAD ADDRESS"))
    } else {
        Ok(value as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mach::compile;

    fn run(source: &str, inputs: &[i64]) -> (Vm, Vec<i64>) {
        let (program, _) = compile(source).expect("compile failed");
        let mut vm = Vm::load(&program).expect("load failed");
        let mut inputs = inputs.iter();
        let mut outputs = vec![];
        loop {
            match vm.step().expect("step failed") {
                Event::Stepped => {}
                Event::Output(value) => outputs.push(value),
                Event::Input => {
                    let value = inputs.next().expect("ran out of inputs");
                    vm.input(*value).expect("input failed");
                }
                Event::Stopped => return (vm, outputs),
            }
        }
    }

    #[test]
    fn test_initial_registers() {
        let (program, _) = compile("write 1.").unwrap();
        let vm = Vm::load(&program).unwrap();
        assert_eq!((vm.pc(), vm.bp(), vm.sp()), (10, 499, 500));
    }

    #[test]
    fn test_straight_line_output() {
        let (_, outputs) = run("const a = 5; var b; begin b := a + 1; write b end.", &[]);
        assert_eq!(outputs, vec![6]);
    }

    #[test]
    fn test_arithmetic() {
        let (_, outputs) = run(
            "begin write 7 / 2; write 7 mod 2; write -7 / 2; write 3 * (-4) end.",
            &[],
        );
        assert_eq!(outputs, vec![3, 1, -3, -12]);
    }

    #[test]
    fn test_comparisons_yield_zero_or_one() {
        // relationals are only reachable through conditions in source, so
        // drive them directly: LSS 2 3, LSS 3 2, NEQ 2 2, GEQ 2 2
        let text = "1 0 2\n1 0 3\n2 0 7\n9 0 1\n\
                    1 0 3\n1 0 2\n2 0 7\n9 0 1\n\
                    1 0 2\n1 0 2\n2 0 6\n9 0 1\n\
                    1 0 2\n1 0 2\n2 0 10\n9 0 1\n\
                    9 0 3";
        let mut vm = Vm::from_text(text).unwrap();
        let mut outputs = vec![];
        loop {
            match vm.step().unwrap() {
                Event::Output(value) => outputs.push(value),
                Event::Stopped => break,
                _ => {}
            }
        }
        assert_eq!(outputs, vec![1, 0, 0, 1]);
    }

    #[test]
    fn test_comparison_in_condition() {
        let source = "var x; begin read x; if x <= 10 then write 1 else write 0 fi end.";
        let (_, outputs) = run(source, &[10]);
        assert_eq!(outputs, vec![1]);
        let (_, outputs) = run(source, &[11]);
        assert_eq!(outputs, vec![0]);
    }

    #[test]
    fn test_read_driven_countdown() {
        let source = "var n; begin read n; while n > 0 do begin write n; n := n - 1 end end.";
        let (vm, outputs) = run(source, &[3]);
        assert_eq!(outputs, vec![3, 2, 1]);
        // the loop leaves nothing behind on the stack
        assert_eq!(vm.sp(), 500 - 4);
    }

    #[test]
    fn test_if_else_branches() {
        let source = "var x; begin read x; if odd x then write 1 else write 2 fi end.";
        let (_, outputs) = run(source, &[7]);
        assert_eq!(outputs, vec![1]);
        let (_, outputs) = run(source, &[8]);
        assert_eq!(outputs, vec![2]);
    }

    #[test]
    fn test_nested_procedures_and_static_links() {
        // inner reads outer's local through one static link
        let source = "\
            var x; \
            procedure outer; \
            var y; \
            procedure inner; \
            x := y + 1; \
            begin y := 41; call inner end; \
            begin call outer; write x end.";
        let (vm, outputs) = run(source, &[]);
        assert_eq!(outputs, vec![42]);
        assert_eq!((vm.bp(), vm.sp()), (499, 496));
    }

    #[test]
    fn test_recursion_unwinds() {
        let source = "\
            var n; \
            procedure count; \
            if n > 0 then \
            begin write n; n := n - 1; call count end \
            fi; \
            begin n := 3; call count end.";
        let (vm, outputs) = run(source, &[]);
        assert_eq!(outputs, vec![3, 2, 1]);
        assert_eq!((vm.bp(), vm.sp()), (499, 496));
    }

    #[test]
    fn test_division_by_zero_faults() {
        let (program, _) = compile("var x; begin x := 0; write 1 / x end.").unwrap();
        let mut vm = Vm::load(&program).unwrap();
        let error = loop {
            match vm.step() {
                Ok(_) => {}
                Err(e) => break e,
            }
        };
        assert_eq!(error.to_string(), "DIVISION BY ZERO");
    }

    #[test]
    fn test_invalid_opcode_faults() {
        let mut vm = Vm::from_text("7 0 11\n9 0 3").unwrap();
        // jump into the middle of a triple; the fetch there is junk
        assert!(vm.step().is_ok());
        assert!(vm.step().is_err());
    }

    #[test]
    fn test_trace_reflects_registers_after_execution() {
        let (program, _) = compile("write 1.").unwrap();
        let mut vm = Vm::load(&program).unwrap();
        assert_eq!(
            vm.trace_header(),
            "                 PC  BP  SP  Stack\nInitial values:  10  499 500"
        );
        vm.step().unwrap(); // JMP 0 13
        assert_eq!(vm.trace(), "    JMP  0   13  13  499 500");
        vm.step().unwrap(); // INC 0 3
        assert_eq!(vm.trace(), "    INC  0   3   16  499 497 0 0 0");
        vm.step().unwrap(); // LIT 0 1
        assert_eq!(vm.trace(), "    LIT  0   1   19  499 496 0 0 0 1");
    }

    #[test]
    fn test_stack_overflow_is_an_error() {
        // a loop that pushes forever must fault, not grow silently
        let mut vm = Vm::from_text("1 0 7\n7 0 10").unwrap();
        let error = loop {
            match vm.step() {
                Ok(_) => {}
                Err(e) => break e,
            }
        };
        assert_eq!(error.code(), 7);
    }
}
