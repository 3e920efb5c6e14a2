use super::{Opcode, Opr, Program, SymKind, SymbolTable, Sys};
use crate::error;
use crate::lang::{lex, Error, Operator, Scan, Token, Word};

type Result<T> = std::result::Result<T, Error>;

/// Compile PL/0 source to a bytecode program and its symbol table.
///
/// Parsing and emission are interleaved in a single pass; no syntax tree
/// is materialized. The first error aborts compilation and no partial
/// program is returned.
pub fn compile(source: &str) -> Result<(Program, SymbolTable)> {
    let scans = lex(source);
    Compiler::compile(&scans)
}

struct Compiler<'a> {
    scans: std::slice::Iter<'a, Scan>,
    token: Option<Token>,
    line: usize,
    program: Program,
    symbols: SymbolTable,
    level: usize,
}

impl<'a> Compiler<'a> {
    fn compile(scans: &'a [Scan]) -> Result<(Program, SymbolTable)> {
        let mut this = Compiler {
            scans: scans.iter(),
            token: None,
            line: 1,
            program: Program::new(),
            symbols: SymbolTable::new(),
            level: 0,
        };
        this.next()?;
        this.block()?;
        match this.token {
            Some(Token::Period) => {}
            _ => return Err(this.syntax("EXPECTED '.' AT END OF PROGRAM")),
        }
        this.program.emit(Opcode::Sys(Sys::Halt))?;
        Ok((this.program, this.symbols))
    }

    /// Advance to the next token. A lexical error marker is fatal the
    /// moment it would be consulted.
    fn next(&mut self) -> Result<()> {
        self.token = match self.scans.next() {
            Some(Ok((line, token))) => {
                self.line = *line;
                Some(token.clone())
            }
            Some(Err(e)) => return Err(e.clone()),
            None => None,
        };
        Ok(())
    }

    fn syntax(&self, message: &'static str) -> Error {
        error!(SyntaxError, Some(self.line); message)
    }

    fn expect(&mut self, token: Token, message: &'static str) -> Result<()> {
        if self.token.as_ref() == Some(&token) {
            self.next()
        } else {
            Err(self.syntax(message))
        }
    }

    fn ident(&mut self, message: &'static str) -> Result<String> {
        match &self.token {
            Some(Token::Ident(name)) => {
                let name = name.clone();
                self.next()?;
                Ok(name)
            }
            _ => Err(self.syntax(message)),
        }
    }

    fn number(&mut self, message: &'static str) -> Result<i64> {
        match self.token {
            Some(Token::Number(n)) => {
                self.next()?;
                Ok(n)
            }
            _ => Err(self.syntax(message)),
        }
    }

    /// Resolve a name that must be a variable; returns the level delta to
    /// its declaring frame and its frame offset.
    fn variable(&self, name: &str, message: &'static str) -> Result<(usize, usize)> {
        let entry = self
            .symbols
            .resolve(name)
            .map_err(|e| e.in_line_number(Some(self.line)))?;
        if entry.kind != SymKind::Var {
            return Err(error!(NotAVariable, Some(self.line); message));
        }
        Ok((self.level - entry.level, entry.address))
    }

    /// `block := [constDecl] [varDecl] {procDecl} statement`
    ///
    /// Nested procedure bodies are emitted inline between the block's
    /// entry jump and its own code; the jump is patched to skip them once
    /// the statement part begins.
    fn block(&mut self) -> Result<()> {
        let entry = self.program.forward(Opcode::Jmp(0))?;
        self.const_declaration()?;
        let num_vars = self.var_declaration()?;
        while self.token == Some(Token::Word(Word::Procedure)) {
            self.next()?;
            let name = self.ident("EXPECTED PROCEDURE NAME")?;
            self.expect(
                Token::Semicolon,
                "EXPECTED ';' AFTER PROCEDURE DECLARATION",
            )?;
            // The entry address is fixed before the body is parsed so the
            // procedure can call itself.
            self.symbols
                .declare(&name, SymKind::Procedure, 0, self.level, self.program.here())
                .map_err(|e| e.in_line_number(Some(self.line)))?;
            self.level += 1;
            self.block()?;
            self.level -= 1;
            self.expect(Token::Semicolon, "EXPECTED ';' AFTER PROCEDURE BODY")?;
            self.program.emit(Opcode::Opr(Opr::Rtn))?;
        }
        let target = self.program.here();
        self.program.patch(entry, target)?;
        // Frame header (return address, dynamic link, static link) plus
        // one slot per declared variable.
        self.program.emit(Opcode::Inc(3 + num_vars as i64))?;
        self.statement()?;
        self.symbols.close_scope(self.level);
        Ok(())
    }

    fn const_declaration(&mut self) -> Result<()> {
        if self.token == Some(Token::Word(Word::Const)) {
            loop {
                self.next()?;
                let name = self.ident("EXPECTED IDENTIFIER AFTER 'const'")?;
                self.expect(
                    Token::Operator(Operator::Equal),
                    "EXPECTED '=' AFTER IDENTIFIER",
                )?;
                let value = self.number("EXPECTED NUMBER AFTER '='")?;
                self.symbols
                    .declare(&name, SymKind::Const, value, self.level, 0)
                    .map_err(|e| e.in_line_number(Some(self.line)))?;
                if self.token != Some(Token::Comma) {
                    break;
                }
            }
            self.expect(Token::Semicolon, "EXPECTED ';' AFTER CONSTANT DECLARATION")?;
        }
        Ok(())
    }

    fn var_declaration(&mut self) -> Result<usize> {
        let mut num_vars = 0;
        if self.token == Some(Token::Word(Word::Var)) {
            loop {
                self.next()?;
                let name = self.ident("EXPECTED IDENTIFIER AFTER 'var'")?;
                num_vars += 1;
                // First variable lands at offset 3, after the frame header.
                self.symbols
                    .declare(&name, SymKind::Var, 0, self.level, 2 + num_vars)
                    .map_err(|e| e.in_line_number(Some(self.line)))?;
                if self.token != Some(Token::Comma) {
                    break;
                }
            }
            self.expect(Token::Semicolon, "EXPECTED ';' AFTER VARIABLE DECLARATION")?;
        }
        Ok(num_vars)
    }

    fn statement(&mut self) -> Result<()> {
        match self.token.clone() {
            Some(Token::Ident(name)) => self.assignment(&name),
            Some(Token::Word(Word::Call)) => self.call(),
            Some(Token::Word(Word::Begin)) => self.begin(),
            Some(Token::Word(Word::If)) => self.r#if(),
            Some(Token::Word(Word::While)) => self.r#while(),
            Some(Token::Word(Word::Read)) => self.read(),
            Some(Token::Word(Word::Write)) => self.write(),
            _ => Ok(()),
        }
    }

    fn assignment(&mut self, name: &str) -> Result<()> {
        let (delta, address) = self.variable(name, "ASSIGNMENT TO CONSTANT OR PROCEDURE")?;
        self.next()?;
        self.expect(Token::Operator(Operator::Becomes), "EXPECTED ':='")?;
        self.expression()?;
        self.program.emit(Opcode::Sto(delta, address))
    }

    fn call(&mut self) -> Result<()> {
        self.next()?;
        let name = self.ident("EXPECTED IDENTIFIER AFTER 'call'")?;
        let entry = self
            .symbols
            .resolve(&name)
            .map_err(|e| e.in_line_number(Some(self.line)))?;
        if entry.kind != SymKind::Procedure {
            return Err(error!(NotAProcedure, Some(self.line); "CALL OF A CONSTANT OR VARIABLE"));
        }
        let op = Opcode::Cal(self.level - entry.level, entry.address);
        self.program.emit(op)
    }

    fn begin(&mut self) -> Result<()> {
        loop {
            self.next()?;
            self.statement()?;
            if self.token != Some(Token::Semicolon) {
                break;
            }
        }
        self.expect(Token::Word(Word::End), "EXPECTED ';' OR 'end'")
    }

    fn r#if(&mut self) -> Result<()> {
        self.next()?;
        self.condition()?;
        let jpc = self.program.forward(Opcode::Jpc(0))?;
        self.expect(Token::Word(Word::Then), "EXPECTED 'then'")?;
        self.statement()?;
        if self.token == Some(Token::Word(Word::Else)) {
            let jmp = self.program.forward(Opcode::Jmp(0))?;
            let target = self.program.here();
            self.program.patch(jpc, target)?;
            self.next()?;
            self.statement()?;
            let target = self.program.here();
            self.program.patch(jmp, target)?;
        } else {
            let target = self.program.here();
            self.program.patch(jpc, target)?;
        }
        self.expect(Token::Word(Word::Fi), "EXPECTED 'fi'")
    }

    fn r#while(&mut self) -> Result<()> {
        self.next()?;
        let top = self.program.here();
        self.condition()?;
        self.expect(Token::Word(Word::Do), "EXPECTED 'do'")?;
        let jpc = self.program.forward(Opcode::Jpc(0))?;
        self.statement()?;
        self.program.emit(Opcode::Jmp(top))?;
        let target = self.program.here();
        self.program.patch(jpc, target)
    }

    fn read(&mut self) -> Result<()> {
        self.next()?;
        let name = self.ident("EXPECTED IDENTIFIER AFTER 'read'")?;
        let (delta, address) = self.variable(&name, "READ INTO CONSTANT OR PROCEDURE")?;
        self.program.emit(Opcode::Sys(Sys::Read))?;
        self.program.emit(Opcode::Sto(delta, address))
    }

    fn write(&mut self) -> Result<()> {
        self.next()?;
        self.expression()?;
        self.program.emit(Opcode::Sys(Sys::Write))
    }

    /// Both operands are evaluated left to right, then one comparison
    /// instruction is emitted.
    fn condition(&mut self) -> Result<()> {
        if self.token == Some(Token::Word(Word::Odd)) {
            self.next()?;
            self.expression()?;
            return self.program.emit(Opcode::Opr(Opr::Odd));
        }
        self.expression()?;
        let opr = match &self.token {
            Some(Token::Operator(op)) => match op {
                Operator::Equal => Opr::Eql,
                Operator::NotEqual => Opr::Neq,
                Operator::Less => Opr::Lss,
                Operator::LessEqual => Opr::Leq,
                Operator::Greater => Opr::Gtr,
                Operator::GreaterEqual => Opr::Geq,
                _ => return Err(self.syntax("EXPECTED RELATIONAL OPERATOR")),
            },
            _ => return Err(self.syntax("EXPECTED RELATIONAL OPERATOR")),
        };
        self.next()?;
        self.expression()?;
        self.program.emit(Opcode::Opr(opr))
    }

    fn expression(&mut self) -> Result<()> {
        // The ISA has no negate; a leading '-' is compiled as 0 - term.
        let negate = match &self.token {
            Some(Token::Operator(Operator::Plus)) => {
                self.next()?;
                false
            }
            Some(Token::Operator(Operator::Minus)) => {
                self.next()?;
                true
            }
            _ => false,
        };
        if negate {
            self.program.emit(Opcode::Lit(0))?;
        }
        self.term()?;
        if negate {
            self.program.emit(Opcode::Opr(Opr::Sub))?;
        }
        loop {
            let opr = match &self.token {
                Some(Token::Operator(Operator::Plus)) => Opr::Add,
                Some(Token::Operator(Operator::Minus)) => Opr::Sub,
                _ => break,
            };
            self.next()?;
            self.term()?;
            self.program.emit(Opcode::Opr(opr))?;
        }
        Ok(())
    }

    fn term(&mut self) -> Result<()> {
        self.factor()?;
        loop {
            let opr = match &self.token {
                Some(Token::Operator(Operator::Multiply)) => Opr::Mul,
                Some(Token::Operator(Operator::Divide)) => Opr::Div,
                Some(Token::Operator(Operator::Modulo)) => Opr::Mod,
                _ => break,
            };
            self.next()?;
            self.factor()?;
            self.program.emit(Opcode::Opr(opr))?;
        }
        Ok(())
    }

    fn factor(&mut self) -> Result<()> {
        match self.token.clone() {
            Some(Token::Ident(name)) => {
                let entry = self
                    .symbols
                    .resolve(&name)
                    .map_err(|e| e.in_line_number(Some(self.line)))?;
                let op = match entry.kind {
                    SymKind::Const => Opcode::Lit(entry.value),
                    SymKind::Var => Opcode::Lod(self.level - entry.level, entry.address),
                    SymKind::Procedure => {
                        return Err(
                            error!(NotAVariable, Some(self.line); "PROCEDURE IN EXPRESSION"),
                        )
                    }
                };
                self.program.emit(op)?;
                self.next()
            }
            Some(Token::Number(n)) => {
                self.program.emit(Opcode::Lit(n))?;
                self.next()
            }
            Some(Token::LParen) => {
                self.next()?;
                self.expression()?;
                self.expect(Token::RParen, "EXPECTED ')'")
            }
            _ => Err(self.syntax("EXPRESSION CANNOT BEGIN WITH THIS SYMBOL")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mach::ORIGIN;

    fn ops(source: &str) -> Vec<Opcode> {
        let (program, _) = compile(source).expect("compile failed");
        program.ops().cloned().collect()
    }

    #[test]
    fn test_straight_line_program() {
        use Opcode::*;
        assert_eq!(
            ops("const a = 5; var b; begin b := a + 1; write b end."),
            vec![
                Jmp(13),
                Inc(4),
                Lit(5),
                Lit(1),
                Opr(self::Opr::Add),
                Sto(0, 3),
                Lod(0, 3),
                Sys(self::Sys::Write),
                Sys(self::Sys::Halt),
            ]
        );
    }

    #[test]
    fn test_if_without_else() {
        use Opcode::*;
        // jpc falls through to just past the then-branch
        assert_eq!(
            ops("var x; begin x := 1; if odd x then x := 0 fi end."),
            vec![
                Jmp(13),
                Inc(4),
                Lit(1),
                Sto(0, 3),
                Lod(0, 3),
                Opr(self::Opr::Odd),
                Jpc(37),
                Lit(0),
                Sto(0, 3),
                Sys(self::Sys::Halt),
            ]
        );
    }

    #[test]
    fn test_if_with_else() {
        use Opcode::*;
        assert_eq!(
            ops("var x; if 1 = 2 then x := 1 else x := 2 fi."),
            vec![
                Jmp(13),
                Inc(4),
                Lit(1),
                Lit(2),
                Opr(self::Opr::Eql),
                Jpc(37),    // to the else branch
                Lit(1),
                Sto(0, 3),
                Jmp(43),    // past the else branch
                Lit(2),
                Sto(0, 3),
                Sys(self::Sys::Halt),
            ]
        );
    }

    #[test]
    fn test_while_loops_back_to_condition() {
        use Opcode::*;
        assert_eq!(
            ops("var x; while x > 0 do x := x - 1."),
            vec![
                Jmp(13),
                Inc(4),
                Lod(0, 3),
                Lit(0),
                Opr(self::Opr::Gtr),
                Jpc(43),
                Lod(0, 3),
                Lit(1),
                Opr(self::Opr::Sub),
                Sto(0, 3),
                Jmp(16),
                Sys(self::Sys::Halt),
            ]
        );
    }

    #[test]
    fn test_procedure_skip_jump_and_recursion() {
        use Opcode::*;
        // The procedure body sits between the outer block's entry jump
        // and its statement part; the self-call resolves to the entry
        // address fixed before the body was parsed.
        assert_eq!(
            ops("procedure p; call p; begin call p end."),
            vec![
                Jmp(25),    // outer block skips the body of p
                Jmp(16),    // p's own entry jump
                Inc(3),
                Cal(1, 13), // recursive call follows one static link
                Opr(self::Opr::Rtn),
                Inc(3),
                Cal(0, 13),
                Sys(self::Sys::Halt),
            ]
        );
    }

    #[test]
    fn test_unary_minus() {
        use Opcode::*;
        assert_eq!(
            ops("var x; x := -3."),
            vec![
                Jmp(13),
                Inc(4),
                Lit(0),
                Lit(3),
                Opr(self::Opr::Sub),
                Sto(0, 3),
                Sys(self::Sys::Halt),
            ]
        );
    }

    #[test]
    fn test_all_jumps_land_inside_the_program() {
        let (program, _) = compile(
            "var a, b; procedure swap; begin a := b end; \
             begin read a; while a > 0 do begin \
             if odd a then call swap else b := a / 2 fi; \
             a := a - 1 end; write b end.",
        )
        .unwrap();
        let end = program.here();
        for op in program.ops() {
            let target = match op {
                Opcode::Jmp(t) | Opcode::Jpc(t) | Opcode::Cal(_, t) => *t,
                _ => continue,
            };
            assert!(target >= ORIGIN && target < end, "stray target {}", target);
            assert_eq!((target - ORIGIN) % 3, 0, "unaligned target {}", target);
        }
    }

    #[test]
    fn test_first_error_is_fatal() {
        assert!(compile("var x; x := y.").is_err());
        assert!(compile("var x; x = 1.").is_err());
        assert!(compile("const a = 5; a := 1.").is_err());
        assert!(compile("var x; call x.").is_err());
        assert!(compile("var x, x; x := 1.").is_err());
        assert!(compile("begin end").is_err());
    }

    #[test]
    fn test_shadowing_addresses() {
        use Opcode::*;
        // inner x hides outer x; outer x is visible again in the
        // outer statement part
        let ops = ops(
            "var x; procedure p; var x; x := 1; begin call p; x := 2 end.",
        );
        assert!(ops.contains(&Sto(0, 3)));
        assert_eq!(
            ops.iter().filter(|op| **op == Sto(0, 3)).count(),
            2 // both stores are frame-local at offset 3
        );
    }
}
