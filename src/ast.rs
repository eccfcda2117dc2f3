//! Parenthesized prefix-form printer for expressions, used by the `parse`
//! subcommand and handy when debugging the parser.

use crate::parser::{Expr, LiteralValue};

pub struct Ast;

impl Ast {
    /// Render `expr` as a fully parenthesized prefix string, e.g.
    /// `(* (- 123) (group 45.67))`.
    pub fn print(&self, expr: &Expr) -> String {
        match expr {
            Expr::Literal(literal) => match literal {
                LiteralValue::Number(n) => {
                    if n.fract() == 0.0 && n.is_finite() {
                        format!("{:.1}", n)
                    } else {
                        format!("{}", n)
                    }
                }
                LiteralValue::Str(s) => s.clone(),
                LiteralValue::True => "true".to_string(),
                LiteralValue::False => "false".to_string(),
                LiteralValue::Nil => "nil".to_string(),
            },

            Expr::Unary { operator, right } => {
                self.parenthesize(&operator.lexeme, &[right])
            }

            Expr::Binary {
                left,
                operator,
                right,
            } => self.parenthesize(&operator.lexeme, &[left, right]),

            Expr::Grouping(inner) => self.parenthesize("group", &[inner]),

            Expr::Variable { name, .. } => name.lexeme.clone(),

            Expr::Assign { name, value, .. } => {
                self.parenthesize(&format!("= {}", name.lexeme), &[value])
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                let mut parts: Vec<&Expr> = vec![callee.as_ref()];
                parts.extend(arguments.iter());

                self.parenthesize("call", &parts)
            }

            Expr::Get { object, name } => {
                self.parenthesize(&format!(". {}", name.lexeme), &[object])
            }

            Expr::Set {
                object,
                name,
                value,
            } => self.parenthesize(&format!("set {}", name.lexeme), &[object, value]),

            Expr::This { .. } => "this".to_string(),

            Expr::Super { method, .. } => format!("(super {})", method.lexeme),

            Expr::Empty => "nil".to_string(),
        }
    }

    fn parenthesize(&self, name: &str, exprs: &[&Expr]) -> String {
        let mut out = String::from("(");
        out.push_str(name);

        for expr in exprs {
            out.push(' ');
            out.push_str(&self.print(expr));
        }

        out.push(')');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{Token, TokenType};

    #[test]
    fn prints_nested_prefix_form() {
        // -123 * (45.67)
        let expr = Expr::Binary {
            left: Box::new(Expr::Unary {
                operator: Token::new(TokenType::MINUS, "-", 1),
                right: Box::new(Expr::Literal(LiteralValue::Number(123.0))),
            }),
            operator: Token::new(TokenType::STAR, "*", 1),
            right: Box::new(Expr::Grouping(Box::new(Expr::Literal(
                LiteralValue::Number(45.67),
            )))),
        };

        assert_eq!(Ast.print(&expr), "(* (- 123.0) (group 45.67))");
    }
}
