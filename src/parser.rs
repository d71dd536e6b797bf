use crate::error::{Error, Result};
use crate::term::{Quantification, Term};

#[derive(Clone, Debug, PartialEq, Eq)]
enum Token {
    Name(String),
    Marker(Quantification),
    LeftParen,
    RightParen,
    Comma,
    Dot,
    Colon,
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '\''
}

fn is_operator_char(c: char) -> bool {
    "=+-*/<>!&|^~%#$".contains(c)
}

fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut tokens = vec![];
    let mut chars = input.chars().peekable();
    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        let simple = match c {
            '(' => Some(Token::LeftParen),
            ')' => Some(Token::RightParen),
            ',' => Some(Token::Comma),
            '.' => Some(Token::Dot),
            ':' => Some(Token::Colon),
            '@' => Some(Token::Marker(Quantification::ForAll)),
            '?' => Some(Token::Marker(Quantification::Exists)),
            _ => None,
        };
        if let Some(token) = simple {
            chars.next();
            tokens.push(token);
            continue;
        }

        let class: fn(char) -> bool = if is_word_char(c) {
            is_word_char
        } else if is_operator_char(c) {
            is_operator_char
        } else {
            return Err(Error::parse(input, format!("unexpected character '{}'", c)));
        };
        let mut name = String::new();
        while let Some(&c) = chars.peek() {
            if !class(c) {
                break;
            }
            name.push(c);
            chars.next();
        }
        tokens.push(Token::Name(name));
    }
    Ok(tokens)
}

/// A quantifier in scope while parsing its body.
struct Binder {
    name: String,
    quantification: Quantification,
    sort: Option<String>,
}

/// Parses the prefix term syntax.
///
///   term   := ("forall" | "exists") binder ("," binder)* "." term
///           | marker? NAME (":" NAME)? ("(" term ("," term)* ")")?
///   binder := NAME (":" NAME)?
///
/// Binders are flattened away: every occurrence of a bound name in the body is tagged
/// with the quantifier instead, innermost binder first.
pub struct Parser<'a> {
    input: &'a str,
    tokens: Vec<Token>,
    position: usize,
    scopes: Vec<Binder>,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Parser<'a> {
        Parser {
            input,
            tokens: vec![],
            position: 0,
            scopes: vec![],
        }
    }

    pub fn parse_term(mut self) -> Result<Term> {
        self.tokens = tokenize(self.input)?;
        let term = self.term()?;
        if self.position < self.tokens.len() {
            return Err(self.error("trailing input after term"));
        }
        Ok(term)
    }

    fn error(&self, message: &str) -> Error {
        Error::parse(self.input, format!("{} (at token {})", message, self.position))
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).cloned();
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    fn expect(&mut self, expected: Token) -> Result<()> {
        match self.advance() {
            Some(token) if token == expected => Ok(()),
            _ => Err(self.error(&format!("expected {:?}", expected))),
        }
    }

    fn name(&mut self) -> Result<String> {
        match self.advance() {
            Some(Token::Name(name)) => Ok(name),
            _ => Err(self.error("expected a name")),
        }
    }

    fn optional_sort(&mut self) -> Result<Option<String>> {
        if self.peek() == Some(&Token::Colon) {
            self.advance();
            Ok(Some(self.name()?))
        } else {
            Ok(None)
        }
    }

    fn term(&mut self) -> Result<Term> {
        let quantification = match self.peek() {
            Some(Token::Name(n)) if n == "forall" => Some(Quantification::ForAll),
            Some(Token::Name(n)) if n == "exists" => Some(Quantification::Exists),
            _ => None,
        };
        match quantification {
            Some(q) => self.quantified(q),
            None => self.application(),
        }
    }

    fn quantified(&mut self, quantification: Quantification) -> Result<Term> {
        self.advance();
        let mut count = 0;
        loop {
            let name = self.name()?;
            let sort = self.optional_sort()?;
            self.scopes.push(Binder {
                name,
                quantification,
                sort,
            });
            count += 1;
            match self.advance() {
                Some(Token::Comma) => continue,
                Some(Token::Dot) => break,
                _ => return Err(self.error("expected ',' or '.' after a bound variable")),
            }
        }
        let body = self.term();
        self.scopes.truncate(self.scopes.len() - count);
        body
    }

    fn application(&mut self) -> Result<Term> {
        let marker = match self.peek() {
            Some(Token::Marker(q)) => {
                let q = *q;
                self.advance();
                Some(q)
            }
            _ => None,
        };
        let name = self.name()?;
        let declared_sort = self.optional_sort()?;

        let mut args = vec![];
        if self.peek() == Some(&Token::LeftParen) {
            self.advance();
            loop {
                args.push(self.term()?);
                match self.advance() {
                    Some(Token::Comma) => continue,
                    Some(Token::RightParen) => break,
                    _ => return Err(self.error("expected ',' or ')' in argument list")),
                }
            }
        }

        let (quantification, sort) = match marker {
            Some(q) => (q, declared_sort),
            None => match self.scopes.iter().rev().find(|b| b.name == name) {
                Some(binder) => (binder.quantification, binder.sort.clone()),
                None => (Quantification::None, declared_sort),
            },
        };
        let mut term = Term::new(name, args).with_quantification(quantification);
        if let Some(sort) = sort {
            term = term.with_sort(sort);
        }
        Ok(term)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_application() {
        let term = Term::parse("<=(+(a, b), c)").unwrap();
        assert_eq!(term.name(), "<=");
        assert_eq!(term.num_args(), 2);
        assert_eq!(term.arg(0).to_string(), "+(a, b)");
        assert!(!term.has_quantified());
    }

    #[test]
    fn test_quantifiers_are_pushed_to_leaves() {
        let term = Term::parse("forall i, j, k. implies(and(>(i, 0), <=(+(i, j), k)), <(j, k))")
            .unwrap();
        assert_eq!(
            term.to_string(),
            "implies(and(>(@i, 0), <=(+(@i, @j), @k)), <(@j, @k))"
        );
    }

    #[test]
    fn test_inner_binder_shadows_outer() {
        let term = Term::parse("forall x. and(p(x), exists x. q(x))").unwrap();
        assert_eq!(term.to_string(), "and(p(@x), q(?x))");
    }

    #[test]
    fn test_binder_does_not_leak() {
        let term = Term::parse("and(forall x. p(x), q(x))").unwrap();
        assert_eq!(term.to_string(), "and(p(@x), q(x))");
    }

    #[test]
    fn test_sorted_binder() {
        let term = Term::parse("forall n: N. >=(n, 0)").unwrap();
        assert_eq!(term.arg(0).sort(), Some("N"));
        assert_eq!(term.arg(1).sort(), None);
    }

    #[test]
    fn test_quantified_function_head() {
        let term = Term::parse("forall f. =(f(a), f(b))").unwrap();
        assert!(term.arg(0).is_quantified());
        assert!(!term.arg(0).is_leaf());
    }

    #[test]
    fn test_parse_errors() {
        assert!(Term::parse("f(a,").is_err());
        assert!(Term::parse("f(a) b").is_err());
        assert!(Term::parse("forall . p").is_err());
        assert!(Term::parse("f{a}").is_err());
        assert!(Term::parse("").is_err());
    }
}
