#[derive(Debug, PartialEq, Clone)]
pub enum Token {
    Ident(String),
    Number(i64),
    Word(Word),
    Operator(Operator),
    LParen,
    RParen,
    Comma,
    Semicolon,
    Period,
}

impl Token {
    /// Reserved-word lookup for a scanned identifier.
    pub fn from_word(s: &str) -> Option<Token> {
        use Word::*;
        let word = match s {
            "begin" => Begin,
            "call" => Call,
            "const" => Const,
            "do" => Do,
            "else" => Else,
            "end" => End,
            "fi" => Fi,
            "if" => If,
            "odd" => Odd,
            "procedure" => Procedure,
            "read" => Read,
            "then" => Then,
            "var" => Var,
            "while" => While,
            "write" => Write,
            "mod" => return Some(Token::Operator(Operator::Modulo)),
            _ => return None,
        };
        Some(Token::Word(word))
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use Token::*;
        match self {
            Ident(s) => write!(f, "{}", s),
            Number(n) => write!(f, "{}", n),
            Word(w) => write!(f, "{}", w),
            Operator(op) => write!(f, "{}", op),
            LParen => write!(f, "("),
            RParen => write!(f, ")"),
            Comma => write!(f, ","),
            Semicolon => write!(f, ";"),
            Period => write!(f, "."),
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum Word {
    Begin,
    Call,
    Const,
    Do,
    Else,
    End,
    Fi,
    If,
    Odd,
    Procedure,
    Read,
    Then,
    Var,
    While,
    Write,
}

impl std::fmt::Display for Word {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use Word::*;
        match self {
            Begin => write!(f, "begin"),
            Call => write!(f, "call"),
            Const => write!(f, "const"),
            Do => write!(f, "do"),
            Else => write!(f, "else"),
            End => write!(f, "end"),
            Fi => write!(f, "fi"),
            If => write!(f, "if"),
            Odd => write!(f, "odd"),
            Procedure => write!(f, "procedure"),
            Read => write!(f, "read"),
            Then => write!(f, "then"),
            Var => write!(f, "var"),
            While => write!(f, "while"),
            Write => write!(f, "write"),
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum Operator {
    Plus,
    Minus,
    Multiply,
    Divide,
    Modulo,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Becomes,
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use Operator::*;
        match self {
            Plus => write!(f, "+"),
            Minus => write!(f, "-"),
            Multiply => write!(f, "*"),
            Divide => write!(f, "/"),
            Modulo => write!(f, "mod"),
            Equal => write!(f, "="),
            NotEqual => write!(f, "<>"),
            Less => write!(f, "<"),
            LessEqual => write!(f, "<="),
            Greater => write!(f, ">"),
            GreaterEqual => write!(f, ">="),
            Becomes => write!(f, ":="),
        }
    }
}
