//! Restricted arithmetic evaluator for counting-channel input.
//!
//! Counting turns may be written as plain numbers or small expressions
//! ("6*7", "2^5+10"). Anything outside the supported grammar, and any
//! result that is not an integer, is treated as "not a turn attempt".

/// Largest exponent accepted, guarding against pathological computation.
const MAX_EXPONENT: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
}

fn tokenize(input: &str) -> Option<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' => {
                chars.next();
            }
            '+' => {
                chars.next();
                tokens.push(Token::Plus);
            }
            '-' => {
                chars.next();
                tokens.push(Token::Minus);
            }
            '*' => {
                chars.next();
                tokens.push(Token::Star);
            }
            '/' => {
                chars.next();
                tokens.push(Token::Slash);
            }
            '^' => {
                chars.next();
                tokens.push(Token::Caret);
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            '0'..='9' | '.' => {
                let mut literal = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' {
                        literal.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Number(literal.parse().ok()?));
            }
            _ => return None,
        }
    }

    if tokens.is_empty() { None } else { Some(tokens) }
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<Token> {
        let tok = self.peek();
        self.pos += 1;
        tok
    }

    // expr := term (('+' | '-') term)*
    fn expr(&mut self) -> Option<f64> {
        let mut value = self.term()?;
        while let Some(op) = self.peek() {
            match op {
                Token::Plus => {
                    self.advance();
                    value += self.term()?;
                }
                Token::Minus => {
                    self.advance();
                    value -= self.term()?;
                }
                _ => break,
            }
        }
        Some(value)
    }

    // term := power (('*' | '/') power)*
    fn term(&mut self) -> Option<f64> {
        let mut value = self.power()?;
        while let Some(op) = self.peek() {
            match op {
                Token::Star => {
                    self.advance();
                    value *= self.power()?;
                }
                Token::Slash => {
                    self.advance();
                    let divisor = self.power()?;
                    if divisor == 0.0 {
                        return None;
                    }
                    value /= divisor;
                }
                _ => break,
            }
        }
        Some(value)
    }

    // power := unary ('^' power)?   (right-associative)
    fn power(&mut self) -> Option<f64> {
        let base = self.unary()?;
        if self.peek() == Some(Token::Caret) {
            self.advance();
            let exponent = self.power()?;
            if exponent > MAX_EXPONENT {
                return None;
            }
            return Some(base.powf(exponent));
        }
        Some(base)
    }

    // unary := '-' unary | atom
    fn unary(&mut self) -> Option<f64> {
        if self.peek() == Some(Token::Minus) {
            self.advance();
            return Some(-self.unary()?);
        }
        self.atom()
    }

    // atom := NUMBER | '(' expr ')'
    fn atom(&mut self) -> Option<f64> {
        match self.advance()? {
            Token::Number(n) => Some(n),
            Token::LParen => {
                let value = self.expr()?;
                if self.advance()? != Token::RParen {
                    return None;
                }
                Some(value)
            }
            _ => None,
        }
    }
}

/// Evaluates a counting message. Returns `None` for anything that is not a
/// valid expression with an integral result in range.
pub fn eval_integer(input: &str) -> Option<i64> {
    let tokens = tokenize(input.trim())?;
    let mut parser = Parser { tokens: &tokens, pos: 0 };
    let value = parser.expr()?;
    if parser.pos != tokens.len() {
        return None;
    }
    if !value.is_finite() || value.fract() != 0.0 {
        return None;
    }
    if value < i64::MIN as f64 || value > i64::MAX as f64 {
        return None;
    }
    Some(value as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_numbers() {
        assert_eq!(eval_integer("42"), Some(42));
        assert_eq!(eval_integer("  7  "), Some(7));
        assert_eq!(eval_integer("-3"), Some(-3));
    }

    #[test]
    fn arithmetic_expressions() {
        assert_eq!(eval_integer("6*7"), Some(42));
        assert_eq!(eval_integer("40 + 2"), Some(42));
        assert_eq!(eval_integer("84/2"), Some(42));
        assert_eq!(eval_integer("2^5 + 10"), Some(42));
        assert_eq!(eval_integer("(40+2)*1"), Some(42));
        assert_eq!(eval_integer("50 - 2*4"), Some(42));
    }

    #[test]
    fn power_is_right_associative() {
        assert_eq!(eval_integer("2^3^2"), Some(512));
    }

    #[test]
    fn non_integral_results_rejected() {
        assert_eq!(eval_integer("1/3"), None);
        assert_eq!(eval_integer("43.5"), None);
        assert_eq!(eval_integer("7/2"), None);
    }

    #[test]
    fn oversized_exponent_rejected() {
        assert_eq!(eval_integer("2^101"), None);
        assert_eq!(eval_integer("2^62"), Some(1i64 << 62));
        // Within the exponent cap but past i64 range
        assert_eq!(eval_integer("2^100"), None);
    }

    #[test]
    fn garbage_rejected() {
        assert_eq!(eval_integer(""), None);
        assert_eq!(eval_integer("forty two"), None);
        assert_eq!(eval_integer("42abc"), None);
        assert_eq!(eval_integer("6 **"), None);
        assert_eq!(eval_integer("(42"), None);
        assert_eq!(eval_integer("1/0"), None);
    }
}
