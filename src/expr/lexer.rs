#[derive(Debug, Clone, PartialEq)]
pub(super) enum Token {
    Number(f64),
    String(String),
    Identifier(String),
    Symbol(String),
    End,
}

const SYMBOLS: &[&str] = &[
    "===", "!==", "==", "!=", "<=", ">=", "&&", "||", "<", ">", "+", "-", "*", "/", "%", "!", ".",
    "[", "]", "(", ")", ",",
];

pub(super) fn tokenize(source: &str) -> Result<Vec<Token>, String> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut index = 0;

    while index < chars.len() {
        let current = chars[index];

        if current.is_whitespace() {
            index += 1;
        } else if current.is_ascii_digit() {
            let start = index;
            while index < chars.len() && (chars[index].is_ascii_digit() || chars[index] == '.') {
                index += 1;
            }
            let literal: String = chars[start..index].iter().collect();
            let number = literal
                .parse::<f64>()
                .map_err(|error| format!("invalid number '{literal}': {error}"))?;
            tokens.push(Token::Number(number));
        } else if current == '\'' || current == '"' {
            let (text, next) = string_literal(&chars, index)?;
            tokens.push(Token::String(text));
            index = next;
        } else if current.is_alphabetic() || current == '_' || current == '$' {
            let start = index;
            while index < chars.len()
                && (chars[index].is_alphanumeric() || chars[index] == '_' || chars[index] == '$')
            {
                index += 1;
            }
            tokens.push(Token::Identifier(chars[start..index].iter().collect()));
        } else {
            let rest: String = chars[index..chars.len().min(index + 3)].iter().collect();
            let symbol = SYMBOLS
                .iter()
                .find(|symbol| rest.starts_with(**symbol))
                .ok_or_else(|| format!("unexpected character '{current}'"))?;
            tokens.push(Token::Symbol((*symbol).to_owned()));
            index += symbol.chars().count();
        }
    }

    tokens.push(Token::End);
    Ok(tokens)
}

fn string_literal(chars: &[char], start: usize) -> Result<(String, usize), String> {
    let quote = chars[start];
    let mut text = String::new();
    let mut index = start + 1;

    while index < chars.len() {
        match chars[index] {
            '\\' => {
                let escaped = chars
                    .get(index + 1)
                    .ok_or_else(|| "unterminated escape".to_owned())?;
                text.push(match escaped {
                    'n' => '\n',
                    't' => '\t',
                    other => *other,
                });
                index += 2;
            }
            found if found == quote => return Ok((text, index + 1)),
            other => {
                text.push(other);
                index += 1;
            }
        }
    }

    Err("unterminated string literal".to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_symbols_greedily() {
        let tokens = tokenize("a !== 'b\\'c' && 1.5").expect("tokenize");
        assert_eq!(
            tokens,
            vec![
                Token::Identifier("a".to_owned()),
                Token::Symbol("!==".to_owned()),
                Token::String("b'c".to_owned()),
                Token::Symbol("&&".to_owned()),
                Token::Number(1.5),
                Token::End,
            ]
        );
    }

    #[test]
    fn rejects_assignment_and_unknown_characters() {
        assert!(tokenize("a = 1").is_err());
        assert!(tokenize("a ; b").is_err());
        assert!(tokenize("'open").is_err());
    }
}
