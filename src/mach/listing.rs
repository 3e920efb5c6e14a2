use super::{Program, SymbolTable, ORIGIN};

/// Instruction listing of a compiled program, one line per instruction
/// at its loaded word address.
pub fn disassembly(program: &Program) -> String {
    let mut s = String::from("Addr OP   L   M\n");
    for (index, op) in program.ops().enumerate() {
        let (_, l, m) = op.encode();
        s.push_str(&format!(
            "{:<4} {:<4} {:<3} {}\n",
            ORIGIN + 3 * index,
            op.kind_name(),
            l,
            m
        ));
    }
    s
}

/// Full symbol table dump. Entries deactivated by scope exit are still
/// listed; the mark column is 1 once a scope has closed over them.
pub fn symbol_table(symbols: &SymbolTable) -> String {
    let mut s = String::from("Kind      | Name        | Value | Level | Address | Mark\n");
    for entry in symbols.entries() {
        s.push_str(&format!(
            "{:<9} | {:<11} | {:<5} | {:<5} | {:<7} | {}\n",
            entry.kind.to_string(),
            entry.name,
            entry.value,
            entry.level,
            entry.address,
            if entry.active { 0 } else { 1 }
        ));
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mach::compile;

    #[test]
    fn test_disassembly() {
        let (program, _) = compile("write 1.").unwrap();
        assert_eq!(
            disassembly(&program),
            "Addr OP   L   M\n\
             10   JMP  0   13\n\
             13   INC  0   3\n\
             16   LIT  0   1\n\
             19   SYS  0   1\n\
             22   SYS  0   3\n"
        );
    }

    #[test]
    fn test_symbol_table_dump() {
        let (_, symbols) = compile("const a = 5; var b; b := a.").unwrap();
        assert_eq!(
            symbol_table(&symbols),
            "Kind      | Name        | Value | Level | Address | Mark\n\
             const     | a           | 5     | 0     | 0       | 1\n\
             var       | b           | 0     | 0     | 3       | 1\n"
        );
    }
}
