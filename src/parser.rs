use std::{fmt::Write, str::FromStr, sync::Arc};

use bytes::Buf;
use smartstring::{LazyCompact, SmartString};

use crate::{
    domains::integer::{Integer, IntegerRing},
    poly::{polynomial::MultivariatePolynomial, Exponent, Variable},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Pow,
    Neg,
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operator::Add => f.write_char('+'),
            Operator::Sub | Operator::Neg => f.write_char('-'),
            Operator::Mul => f.write_char('*'),
            Operator::Pow => f.write_char('^'),
        }
    }
}

impl Operator {
    #[inline]
    pub fn get_precedence(&self) -> u8 {
        match self {
            Operator::Add | Operator::Sub => 1,
            Operator::Mul => 2,
            Operator::Neg => 3,
            Operator::Pow => 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Token {
    Number(SmartString<LazyCompact>),
    ID(SmartString<LazyCompact>),
    Op(Operator),
    OpenParenthesis,
    CloseParenthesis,
    EOF,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Number(n) => f.write_str(n),
            Token::ID(v) => f.write_str(v),
            Token::Op(o) => std::fmt::Display::fmt(o, f),
            Token::OpenParenthesis => f.write_char('('),
            Token::CloseParenthesis => f.write_char(')'),
            Token::EOF => f.write_str("end of input"),
        }
    }
}

impl Token {
    /// Split the input into tokens. The last token is always [Token::EOF].
    pub fn tokenize(input: &str) -> Result<Vec<Token>, String> {
        let mut tokens = vec![];
        let mut buf = input.as_bytes();

        while buf.has_remaining() {
            let c = buf.chunk()[0];

            if c.is_ascii_whitespace() {
                buf.advance(1);
                continue;
            }

            if c.is_ascii_digit() {
                let len = buf.iter().take_while(|x| x.is_ascii_digit()).count();
                tokens.push(Token::Number(read_str(&mut buf, len)));
                continue;
            }

            if c.is_ascii_alphabetic() || c == b'_' {
                let len = buf
                    .iter()
                    .take_while(|x| x.is_ascii_alphanumeric() || **x == b'_')
                    .count();
                tokens.push(Token::ID(read_str(&mut buf, len)));
                continue;
            }

            let t = match buf.get_u8() {
                b'+' => Token::Op(Operator::Add),
                b'-' => Token::Op(Operator::Sub),
                b'*' => Token::Op(Operator::Mul),
                b'^' => Token::Op(Operator::Pow),
                b'(' => Token::OpenParenthesis,
                b')' => Token::CloseParenthesis,
                _ => {
                    let pos = input.len() - buf.remaining() - 1;
                    let ch = input[pos..].chars().next().unwrap_or(c as char);
                    return Err(format!("Unexpected character '{}' at position {}", ch, pos));
                }
            };
            tokens.push(t);
        }

        tokens.push(Token::EOF);
        Ok(tokens)
    }
}

/// Read `len` ASCII bytes from the buffer.
fn read_str(buf: &mut &[u8], len: usize) -> SmartString<LazyCompact> {
    let mut s = SmartString::new();
    for _ in 0..len {
        s.push(buf.get_u8() as char);
    }
    s
}

/// A recursive-descent parser for polynomials over the integers in infix notation,
/// supporting `+`, `-`, `*`, `^` with a non-negative integer exponent, parentheses,
/// integers of arbitrary size and variable names.
pub struct PolynomialParser<'a, E: Exponent> {
    tokens: Vec<Token>,
    pos: usize,
    var_map: &'a Arc<Vec<Variable>>,
    zero: MultivariatePolynomial<IntegerRing, E>,
}

impl<'a, E: Exponent> PolynomialParser<'a, E> {
    /// Parse a polynomial in the variables `var_map`. When a variable name occurs
    /// multiple times in `var_map`, its first position is used.
    pub fn parse(
        input: &str,
        var_map: &'a Arc<Vec<Variable>>,
    ) -> Result<MultivariatePolynomial<IntegerRing, E>, String> {
        let mut parser = PolynomialParser {
            tokens: Token::tokenize(input)?,
            pos: 0,
            var_map,
            zero: MultivariatePolynomial::new(&IntegerRing::new(), None, var_map.clone()),
        };

        let res = parser.parse_expression(0)?;

        match parser.peek() {
            Token::EOF => Ok(res),
            t => Err(format!("Unexpected '{}' in '{}'", t, input)),
        }
    }

    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&Token::EOF)
    }

    fn next_token(&mut self) -> Token {
        let t = self.peek().clone();
        self.pos += 1;
        t
    }

    fn parse_expression(
        &mut self,
        min_precedence: u8,
    ) -> Result<MultivariatePolynomial<IntegerRing, E>, String> {
        let mut lhs = self.parse_prefix()?;

        loop {
            let op = match self.peek() {
                Token::Op(op) => *op,
                _ => break,
            };

            if op.get_precedence() < min_precedence {
                break;
            }
            self.pos += 1;

            lhs = match op {
                Operator::Pow => {
                    let e = self.parse_exponent()?.to_u32() as u64;
                    Self::check_degrees(
                        (0..lhs.nvars()).map(|v| lhs.degree(v).to_u32() as u64 * e),
                    )?;
                    lhs.pow(e as usize)
                }
                Operator::Add => &lhs + &self.parse_expression(op.get_precedence() + 1)?,
                Operator::Sub => &lhs - &self.parse_expression(op.get_precedence() + 1)?,
                Operator::Mul => {
                    let rhs = self.parse_expression(op.get_precedence() + 1)?;
                    Self::check_degrees((0..lhs.nvars()).map(|v| {
                        lhs.degree(v).to_u32() as u64 + rhs.degree(v).to_u32() as u64
                    }))?;
                    &lhs * &rhs
                }
                Operator::Neg => unreachable!("negation is a prefix operator"),
            };
        }

        Ok(lhs)
    }

    /// Check that the degrees of a product or power fit in the exponent type.
    fn check_degrees(mut degrees: impl Iterator<Item = u64>) -> Result<(), String> {
        match degrees.find(|d| u32::try_from(*d).ok().and_then(E::try_from_u32).is_none()) {
            Some(d) => Err(format!("Exponent {} is too large", d)),
            None => Ok(()),
        }
    }

    fn parse_prefix(&mut self) -> Result<MultivariatePolynomial<IntegerRing, E>, String> {
        match self.next_token() {
            Token::Number(n) => {
                let n = Integer::from_str(&n).map_err(|e| format!("{}: {}", e, n))?;
                Ok(self.zero.constant(n))
            }
            Token::ID(name) => {
                let index = self
                    .var_map
                    .iter()
                    .position(|x| x == &name)
                    .ok_or_else(|| format!("Undefined variable '{}'", name))?;
                Ok(self.zero.variable(index))
            }
            Token::Op(Operator::Sub) => {
                Ok(-self.parse_expression(Operator::Neg.get_precedence())?)
            }
            Token::Op(Operator::Add) => self.parse_expression(Operator::Neg.get_precedence()),
            Token::OpenParenthesis => {
                let e = self.parse_expression(0)?;
                match self.next_token() {
                    Token::CloseParenthesis => Ok(e),
                    t => Err(format!("Expected ')' instead of '{}'", t)),
                }
            }
            t => Err(format!("Unexpected '{}'", t)),
        }
    }

    /// Parse a non-negative integer exponent, which may be parenthesized.
    /// A chain `a^b^c` is right associative.
    fn parse_exponent(&mut self) -> Result<E, String> {
        let e = match self.next_token() {
            Token::Number(n) => n
                .parse::<u32>()
                .ok()
                .and_then(E::try_from_u32)
                .ok_or_else(|| format!("Exponent {} is too large", n))?,
            Token::OpenParenthesis => {
                let e = self.parse_exponent()?;
                match self.next_token() {
                    Token::CloseParenthesis => e,
                    t => return Err(format!("Expected ')' instead of '{}'", t)),
                }
            }
            Token::Op(Operator::Sub) => {
                return Err("Negative exponents are not supported".to_owned());
            }
            t => return Err(format!("Expected an exponent instead of '{}'", t)),
        };

        if self.peek() == &Token::Op(Operator::Pow) {
            self.pos += 1;
            let r = self.parse_exponent()?;
            let p = e
                .to_u32()
                .checked_pow(r.to_u32())
                .and_then(E::try_from_u32)
                .ok_or_else(|| "Exponent is too large".to_owned())?;
            return Ok(p);
        }

        Ok(e)
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use crate::domains::integer::Integer;
    use crate::poly::polynomial::MultivariatePolynomial;

    use super::{Operator, PolynomialParser, Token};

    fn vars() -> Arc<Vec<crate::poly::Variable>> {
        Arc::new(vec!["x".into(), "y".into(), "x".into()])
    }

    fn parse(s: &str) -> Result<MultivariatePolynomial<crate::domains::integer::IntegerRing, u32>, String> {
        PolynomialParser::parse(s, &vars())
    }

    #[test]
    fn tokens() {
        let t = Token::tokenize("3*x1 - (y)^2").unwrap();
        assert_eq!(
            t,
            vec![
                Token::Number("3".into()),
                Token::Op(Operator::Mul),
                Token::ID("x1".into()),
                Token::Op(Operator::Sub),
                Token::OpenParenthesis,
                Token::ID("y".into()),
                Token::CloseParenthesis,
                Token::Op(Operator::Pow),
                Token::Number("2".into()),
                Token::EOF
            ]
        );
        assert!(Token::tokenize("x/y").is_err());
    }

    #[test]
    fn precedence() {
        let p = parse("-x^2+2*x*y-(y-1)^2").unwrap();
        assert_eq!(p.to_string(), "-x^2+2*x*y-y^2+2*y-1");
        assert_eq!(parse("x^2^3").unwrap(), parse("x^8").unwrap());
        assert_eq!(parse("2*(x+y)").unwrap(), parse("2*x+2*y").unwrap());
        assert_eq!(parse("x - y - 1").unwrap().to_string(), "x-y-1");
    }

    #[test]
    fn large_numbers() {
        let p = parse("123456789012345678901234567890*x").unwrap();
        assert_eq!(
            p.lcoeff(),
            "123456789012345678901234567890".parse::<Integer>().unwrap()
        );
    }

    #[test]
    fn duplicate_variables_use_first_position() {
        let p = parse("x").unwrap();
        assert_eq!(p.exponents(0), &[1, 0, 0]);
    }

    #[test]
    fn errors() {
        assert!(parse("z").is_err());
        assert!(parse("x^-1").is_err());
        assert!(parse("x^y").is_err());
        assert!(parse("(x+1").is_err());
        assert!(parse("x+").is_err());
        assert!(parse("x y").is_err());
        assert!(parse("").is_err());
    }

    #[test]
    fn exponent_overflow() {
        assert_eq!(
            parse("x^4000000000*x^4000000000"),
            Err("Exponent 8000000000 is too large".to_owned())
        );
        assert!(parse("(x^65536)^65536").is_err());
        assert!(parse("x^4294967296").is_err());

        let p = parse("x^4294967295*y+y").unwrap();
        assert_eq!(p.degree(0), u32::MAX);
        assert!(parse("x^4294967295*x^0").is_ok());
        assert!(parse("(x^2147483648+y)^2").is_err());
        assert!(parse("(x^2147483647+y)^2").is_ok());
    }
}
