use super::{token::*, Error};

pub const MAX_IDENT_LEN: usize = 11;
pub const MAX_NUMBER_LEN: usize = 5;

/// A scanned item: a classified token with its source line, or an error
/// marker for a malformed lexeme. Error markers stay in the stream and
/// become fatal only when the parser consults them.
pub type Scan = Result<(usize, Token), Error>;

pub fn lex(s: &str) -> Vec<Scan> {
    Lexer {
        chars: s.chars().peekable(),
        line: 1,
    }
    .collect()
}

struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
}

impl<'a> Lexer<'a> {
    fn skip(&mut self, ch: char) {
        if ch == '\n' {
            self.line += 1;
        }
        self.chars.next();
    }

    fn alphabetic(&mut self) -> Scan {
        let mut s = String::new();
        while let Some(&ch) = self.chars.peek() {
            if !ch.is_ascii_alphanumeric() {
                break;
            }
            s.push(ch);
            self.chars.next();
        }
        if s.len() > MAX_IDENT_LEN {
            return Err(error!(IdentTooLong, Some(self.line)));
        }
        match Token::from_word(&s) {
            Some(token) => Ok((self.line, token)),
            None => Ok((self.line, Token::Ident(s))),
        }
    }

    fn number(&mut self) -> Scan {
        let mut s = String::new();
        while let Some(&ch) = self.chars.peek() {
            if !ch.is_ascii_digit() {
                break;
            }
            s.push(ch);
            self.chars.next();
        }
        if let Some(ch) = self.chars.peek() {
            if ch.is_ascii_alphabetic() {
                // 123abc is one bad lexeme, not a number and an identifier
                while let Some(&ch) = self.chars.peek() {
                    if !ch.is_ascii_alphanumeric() {
                        break;
                    }
                    self.chars.next();
                }
                return Err(error!(SyntaxError, Some(self.line); "MALFORMED NUMBER"));
            }
        }
        if s.len() > MAX_NUMBER_LEN {
            return Err(error!(NumberTooLong, Some(self.line)));
        }
        match s.parse::<i64>() {
            Ok(n) => Ok((self.line, Token::Number(n))),
            Err(_) => Err(error!(NumberTooLong, Some(self.line))),
        }
    }

    fn comment(&mut self) -> Option<Scan> {
        let start = self.line;
        let mut prev = '\0';
        while let Some(&ch) = self.chars.peek() {
            self.skip(ch);
            if prev == '*' && ch == '/' {
                return None;
            }
            prev = ch;
        }
        Some(Err(error!(UnterminatedComment, Some(start))))
    }

    fn minutia(&mut self, ch: char) -> Scan {
        use Operator::*;
        let token = match ch {
            '+' => Token::Operator(Plus),
            '-' => Token::Operator(Minus),
            '*' => Token::Operator(Multiply),
            '/' => Token::Operator(Divide),
            '(' => Token::LParen,
            ')' => Token::RParen,
            '=' => Token::Operator(Equal),
            ',' => Token::Comma,
            '.' => Token::Period,
            ';' => Token::Semicolon,
            ':' => match self.chars.peek() {
                Some('=') => {
                    self.chars.next();
                    Token::Operator(Becomes)
                }
                _ => return Err(error!(UnknownCharacter, Some(self.line))),
            },
            '<' => match self.chars.peek() {
                Some('=') => {
                    self.chars.next();
                    Token::Operator(LessEqual)
                }
                Some('>') => {
                    self.chars.next();
                    Token::Operator(NotEqual)
                }
                _ => Token::Operator(Less),
            },
            '>' => match self.chars.peek() {
                Some('=') => {
                    self.chars.next();
                    Token::Operator(GreaterEqual)
                }
                _ => Token::Operator(Greater),
            },
            _ => return Err(error!(UnknownCharacter, Some(self.line))),
        };
        Ok((self.line, token))
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Scan;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let pk = *self.chars.peek()?;
            if pk.is_whitespace() {
                self.skip(pk);
                continue;
            }
            if pk.is_ascii_alphabetic() {
                return Some(self.alphabetic());
            }
            if pk.is_ascii_digit() {
                return Some(self.number());
            }
            if pk == '/' {
                self.chars.next();
                if let Some('*') = self.chars.peek() {
                    self.chars.next();
                    match self.comment() {
                        None => continue,
                        Some(err) => return Some(err),
                    }
                }
                return Some(Ok((self.line, Token::Operator(Operator::Divide))));
            }
            self.chars.next();
            return Some(self.minutia(pk));
        }
    }
}
