//! Arithmetic evaluator backing `$(math:...)` tokens.
//!
//! Recursive descent over `+ - * / ( )` with f64 arithmetic. The grammar is
//! deliberately tiny; anything it cannot parse makes the caller leave the
//! original token verbatim.

/// Characters a math expression may contain. Checked before parsing so a
/// token like `$(math:2+foo)` is rejected without partial evaluation.
pub fn is_allowed_expression(expression: &str) -> bool {
    expression
        .chars()
        .all(|c| c.is_ascii_digit() || "+-*/(). ,".contains(c))
}

/// Evaluates an arithmetic expression.
///
/// # Returns
/// - `Some(f64)` - Finite result
/// - `None` - Parse failure, trailing garbage, or a non-finite result
///   (division by zero)
pub fn evaluate(expression: &str) -> Option<f64> {
    let chars: Vec<char> = expression.chars().filter(|c| !c.is_whitespace()).collect();
    let mut parser = Parser { chars, pos: 0 };

    let value = parser.expression()?;
    if parser.pos != parser.chars.len() || !value.is_finite() {
        return None;
    }

    Some(value)
}

/// Formats an evaluation result the way a calculator would: integral values
/// print without a fractional part.
pub fn format_result(value: f64) -> String {
    if (value - value.round()).abs() < 1e-9 {
        format!("{}", value.round() as i64)
    } else {
        value.to_string()
    }
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    // expression := term (('+' | '-') term)*
    fn expression(&mut self) -> Option<f64> {
        let mut value = self.term()?;
        while let Some(op) = self.peek() {
            match op {
                '+' => {
                    self.bump();
                    value += self.term()?;
                }
                '-' => {
                    self.bump();
                    value -= self.term()?;
                }
                _ => break,
            }
        }
        Some(value)
    }

    // term := factor (('*' | '/') factor)*
    fn term(&mut self) -> Option<f64> {
        let mut value = self.factor()?;
        while let Some(op) = self.peek() {
            match op {
                '*' => {
                    self.bump();
                    value *= self.factor()?;
                }
                '/' => {
                    self.bump();
                    value /= self.factor()?;
                }
                _ => break,
            }
        }
        Some(value)
    }

    // factor := '-' factor | '(' expression ')' | number
    fn factor(&mut self) -> Option<f64> {
        match self.peek()? {
            '-' => {
                self.bump();
                Some(-self.factor()?)
            }
            '(' => {
                self.bump();
                let value = self.expression()?;
                if self.bump()? != ')' {
                    return None;
                }
                Some(value)
            }
            _ => self.number(),
        }
    }

    fn number(&mut self) -> Option<f64> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() || c == '.' {
                self.pos += 1;
            } else {
                break;
            }
        }
        if self.pos == start {
            return None;
        }

        self.chars[start..self.pos]
            .iter()
            .collect::<String>()
            .parse()
            .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluates_basic_arithmetic() {
        assert_eq!(evaluate("2+2"), Some(4.0));
        assert_eq!(evaluate("10 - 3 * 2"), Some(4.0));
        assert_eq!(evaluate("(1 + 2) * 3"), Some(9.0));
        assert_eq!(evaluate("7 / 2"), Some(3.5));
        assert_eq!(evaluate("-4 + 10"), Some(6.0));
    }

    #[test]
    fn rejects_malformed_input() {
        assert_eq!(evaluate("2+"), None);
        assert_eq!(evaluate("(1+2"), None);
        assert_eq!(evaluate(""), None);
        assert_eq!(evaluate("1,2"), None);
        assert_eq!(evaluate("2**3"), None);
    }

    #[test]
    fn division_by_zero_is_an_error() {
        assert_eq!(evaluate("1/0"), None);
    }

    #[test]
    fn charset_gate_rejects_letters() {
        assert!(is_allowed_expression("2+2"));
        assert!(is_allowed_expression("(1.5 + 2) * 3"));
        assert!(!is_allowed_expression("2+foo"));
        assert!(!is_allowed_expression("2^3"));
    }

    #[test]
    fn integral_results_format_without_fraction() {
        assert_eq!(format_result(4.0), "4");
        assert_eq!(format_result(3.5), "3.5");
        assert_eq!(format_result(-2.0), "-2");
    }
}
