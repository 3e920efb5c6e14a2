use super::LineNumber;

#[derive(Clone)]
pub struct Error {
    code: u16,
    line_number: LineNumber,
    message: &'static str,
}

#[doc(hidden)]
#[macro_export]
macro_rules! error {
    ($err:ident) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err)
    };
    ($err:ident, $line:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err).in_line_number($line)
    };
    ($err:ident; $msg:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err).message($msg)
    };
    ($err:ident, $line:expr; $msg:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err)
            .in_line_number($line)
            .message($msg)
    };
}

impl Error {
    pub fn new(code: ErrorCode) -> Error {
        Error {
            code: code as u16,
            line_number: None,
            message: "",
        }
    }

    pub fn code(&self) -> u16 {
        self.code
    }

    pub fn line_number(&self) -> LineNumber {
        self.line_number
    }

    pub fn in_line_number(&self, line: LineNumber) -> Error {
        debug_assert!(self.line_number.is_none());
        Error {
            code: self.code,
            line_number: line,
            message: self.message,
        }
    }

    pub fn message(&self, message: &'static str) -> Error {
        debug_assert_eq!(self.message.len(), 0);
        Error {
            code: self.code,
            line_number: self.line_number,
            message,
        }
    }
}

pub enum ErrorCode {
    SyntaxError = 2,
    IdentTooLong = 3,
    NumberTooLong = 4,
    UnknownCharacter = 5,
    UnterminatedComment = 6,
    OutOfMemory = 7,
    UndeclaredIdent = 8,
    DuplicateIdent = 9,
    NotAVariable = 10,
    NotAProcedure = 11,
    DivisionByZero = 12,
    InvalidOpcode = 13,
    Interrupted = 14,
    Overflow = 15,
    FileNotFound = 16,
    InternalError = 51,
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Error {{ {} }}", self.to_string())
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let code_str = match self.code {
            2 => "SYNTAX ERROR",
            3 => "IDENTIFIER TOO LONG",
            4 => "NUMBER TOO LONG",
            5 => "UNKNOWN CHARACTER",
            6 => "UNTERMINATED COMMENT",
            7 => "OUT OF MEMORY",
            8 => "UNDECLARED IDENTIFIER",
            9 => "DUPLICATE IDENTIFIER",
            10 => "NOT A VARIABLE",
            11 => "NOT A PROCEDURE",
            12 => "DIVISION BY ZERO",
            13 => "INVALID OPCODE",
            14 => "INTERRUPTED",
            15 => "ARITHMETIC OVERFLOW",
            16 => "FILE NOT FOUND",
            51 => "INTERNAL ERROR",
            _ => "",
        };
        let mut suffix = String::new();
        if let Some(line_number) = self.line_number {
            suffix.push_str(&format!(" IN LINE {}", line_number));
        }
        if !self.message.is_empty() {
            suffix.push_str(&format!("; {}", self.message));
        }
        if code_str.is_empty() {
            write!(f, "PROGRAM ERROR {}{}", self.code, suffix)
        } else {
            write!(f, "{}{}", code_str, suffix)
        }
    }
}
