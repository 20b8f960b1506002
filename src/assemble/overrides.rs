// src/assemble/overrides.rs
use std::collections::HashMap;

use crate::render::collapse_whitespace;
use crate::segment::heuristic::is_numeral;

// Se consulta una vez por capítulo al ensamblar; `None` deja el título automático.
pub trait TitleOverrides {
    fn title_for(&self, index: usize, lines: &[String]) -> Option<String>;
}

// Títulos totalmente automáticos.
pub struct NoOverrides;

impl TitleOverrides for NoOverrides {
    fn title_for(&self, _index: usize, _lines: &[String]) -> Option<String> {
        None
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TitleOverride {
    Text(String),
    // Rango inclusivo de líneas del cuerpo, desde 1
    Lines { start: usize, end: usize },
}

#[derive(Debug, Default)]
pub struct OverrideTable {
    overrides: HashMap<usize, TitleOverride>,
}

impl OverrideTable {
    pub fn insert(&mut self, index: usize, title: TitleOverride) {
        self.overrides.insert(index, title);
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }
}

impl TitleOverrides for OverrideTable {
    fn title_for(&self, index: usize, lines: &[String]) -> Option<String> {
        match self.overrides.get(&index)? {
            TitleOverride::Text(text) => Some(text.clone()),
            TitleOverride::Lines { start, end } => title_from_lines(lines, *start, *end),
        }
    }
}

// Título tomado de las líneas start..=end. Un número de capítulo suelto se une a la línea siguiente.
pub fn title_from_lines(lines: &[String], start: usize, end: usize) -> Option<String> {
    if start == 0 || start > end || end > lines.len() {
        return None;
    }

    let title = collapse_whitespace(&lines[start - 1..end].join(" "));
    if title.is_empty() {
        return None;
    }

    match lines.get(end) {
        Some(next) if is_numeral(&title) => Some(format!("{} {}", title, next.trim())),
        _ => Some(title),
    }
}

// "3=El comienzo"
pub fn parse_title_arg(arg: &str) -> Result<(usize, String), String> {
    let (index, text) = split_index(arg)?;
    if text.trim().is_empty() {
        return Err(format!("título vacío en '{}'", arg));
    }
    Ok((index, text.to_string()))
}

// "3=1-2" o "3=7"
pub fn parse_lines_arg(arg: &str) -> Result<(usize, TitleOverride), String> {
    let (index, range) = split_index(arg)?;
    let parse = |s: &str| {
        s.trim()
            .parse::<usize>()
            .map_err(|_| format!("número de línea no válido '{}' en '{}'", s.trim(), arg))
    };

    let (start, end) = match range.split_once('-') {
        Some((a, b)) => (parse(a)?, parse(b)?),
        None => {
            let line = parse(range)?;
            (line, line)
        }
    };
    if start == 0 || start > end {
        return Err(format!("rango de líneas no válido en '{}'", arg));
    }
    Ok((index, TitleOverride::Lines { start, end }))
}

fn split_index(arg: &str) -> Result<(usize, &str), String> {
    let (index, rest) = arg
        .split_once('=')
        .ok_or_else(|| format!("se esperaba CAPITULO=VALOR, se recibió '{}'", arg))?;
    let index = index
        .trim()
        .parse::<usize>()
        .map_err(|_| format!("número de capítulo no válido '{}'", index.trim()))?;
    Ok((index, rest))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn title_from_line_range() {
        let body = lines(&["Part", "One", "Body text"]);
        assert_eq!(title_from_lines(&body, 1, 2).as_deref(), Some("Part One"));
        assert_eq!(title_from_lines(&body, 3, 3).as_deref(), Some("Body text"));
    }

    #[test]
    fn numeral_selection_takes_the_following_line() {
        let body = lines(&["12", "The Storm", "Rain fell."]);
        assert_eq!(title_from_lines(&body, 1, 1).as_deref(), Some("12 The Storm"));

        let last = lines(&["x", "IV"]);
        assert_eq!(title_from_lines(&last, 2, 2).as_deref(), Some("IV"));
    }

    #[test]
    fn out_of_range_selection_is_ignored() {
        let body = lines(&["a", "b"]);
        assert_eq!(title_from_lines(&body, 0, 1), None);
        assert_eq!(title_from_lines(&body, 2, 1), None);
        assert_eq!(title_from_lines(&body, 1, 3), None);
    }

    #[test]
    fn table_answers_only_for_known_chapters() {
        let mut table = OverrideTable::default();
        table.insert(2, TitleOverride::Text("Custom".into()));
        table.insert(3, TitleOverride::Lines { start: 1, end: 1 });

        let body = lines(&["First line"]);
        assert_eq!(table.title_for(1, &body), None);
        assert_eq!(table.title_for(2, &body).as_deref(), Some("Custom"));
        assert_eq!(table.title_for(3, &body).as_deref(), Some("First line"));
        assert_eq!(NoOverrides.title_for(2, &body), None);
    }

    #[test]
    fn parses_cli_arguments() {
        assert_eq!(parse_title_arg("3=The Start"), Ok((3, "The Start".to_string())));
        assert!(parse_title_arg("3=  ").is_err());
        assert!(parse_title_arg("x=Title").is_err());
        assert!(parse_title_arg("Title").is_err());

        assert_eq!(
            parse_lines_arg("4=1-2"),
            Ok((4, TitleOverride::Lines { start: 1, end: 2 }))
        );
        assert_eq!(
            parse_lines_arg("004=7"),
            Ok((4, TitleOverride::Lines { start: 7, end: 7 }))
        );
        assert!(parse_lines_arg("4=2-1").is_err());
        assert!(parse_lines_arg("4=0").is_err());
        assert!(parse_lines_arg("4=a-b").is_err());
    }
}
