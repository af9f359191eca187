use crate::failure::{Failure, Result};

/// Rows of a pipe table. Blank lines and `#` comments are skipped; `\|`,
/// `\n` and `\\` are unescaped inside cells; every row needs the same width.
pub(super) fn parse(text: &str) -> Result<Vec<Vec<String>>> {
    let mut rows: Vec<Vec<String>> = Vec::new();

    for (number, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some(body) = line.strip_prefix('|').and_then(|rest| rest.strip_suffix('|')) else {
            return Err(Failure::Table(format!(
                "line {}: table rows must start and end with '|'",
                number + 1
            )));
        };

        let cells = split_cells(body);
        if let Some(first) = rows.first()
            && first.len() != cells.len()
        {
            return Err(Failure::Table(format!(
                "line {}: expected {} cells but found {}",
                number + 1,
                first.len(),
                cells.len()
            )));
        }
        rows.push(cells);
    }

    Ok(rows)
}

fn split_cells(body: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut chars = body.chars();

    while let Some(character) = chars.next() {
        match character {
            '\\' => match chars.next() {
                Some('|') => current.push('|'),
                Some('n') => current.push('\n'),
                Some('\\') => current.push('\\'),
                Some(other) => {
                    current.push('\\');
                    current.push(other);
                }
                None => current.push('\\'),
            },
            '|' => cells.push(std::mem::take(&mut current).trim().to_owned()),
            other => current.push(other),
        }
    }
    cells.push(current.trim().to_owned());
    cells
}
