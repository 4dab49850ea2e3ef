//! Splits an `f"..."` literal's raw content into literal runs and spliced
//! expressions.
//!
//! Scans by character index; `{{`/`}}` escape to a literal brace, bare
//! `{expr}` delimits one expression fragment which is re-lexed and parsed
//! on its own.

use crate::ast::FStringPart;
use crate::error::SandboxError;

pub fn parse_fstring(raw: &str) -> Result<Vec<FStringPart>, SandboxError> {
    let chars: Vec<char> = raw.chars().collect();
    let mut parts = Vec::new();
    let mut literal = String::new();
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '{' if chars.get(i + 1) == Some(&'{') => {
                literal.push('{');
                i += 2;
            }
            '}' if chars.get(i + 1) == Some(&'}') => {
                literal.push('}');
                i += 2;
            }
            '{' => {
                if !literal.is_empty() {
                    parts.push(FStringPart::Literal(std::mem::take(&mut literal)));
                }
                let start = i + 1;
                let mut depth = 1usize;
                let mut j = start;
                while j < chars.len() && depth > 0 {
                    match chars[j] {
                        '{' => depth += 1,
                        '}' => {
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                        }
                        _ => {}
                    }
                    j += 1;
                }
                if depth != 0 {
                    return Err(SandboxError::ParseError {
                            line: 0,
                            col: 0,
                            message: "unterminated '{' in f-string".to_string(),
                    });
                }
                let expr_src: String = chars[start..j].iter().collect();
                let expr = crate::parser::parse_expr_standalone(&expr_src)?;
                parts.push(FStringPart::Expr(expr));
                i = j + 1;
            }
            c => {
                literal.push(c);
                i += 1;
            }
        }
    }
    if !literal.is_empty() || parts.is_empty() {
        parts.push(FStringPart::Literal(literal));
    }
    Ok(parts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_literal_and_expr_runs() {
        let parts = parse_fstring("hello {name}!").unwrap();
        assert_eq!(parts.len(), 3);
        assert!(matches!(&parts[0], FStringPart::Literal(s) if s == "hello "));
        assert!(matches!(&parts[1], FStringPart::Expr(_)));
        assert!(matches!(&parts[2], FStringPart::Literal(s) if s == "!"));
    }

    #[test]
    fn escaped_braces_are_literal() {
        let parts = parse_fstring("{{literal}}").unwrap();
        assert_eq!(parts, vec![FStringPart::Literal("{literal}".to_string())]);
    }

    #[test]
    fn pure_literal_with_no_splices() {
        let parts = parse_fstring("no splices here").unwrap();
        assert_eq!(parts, vec![FStringPart::Literal("no splices here".to_string())]);
    }
}
