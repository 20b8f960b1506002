// src/segment/mod.rs
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use regex::Regex;

use crate::errors::EpubError;
use crate::navigation::TocEntry;
use crate::render::fragment_lines;

pub mod heuristic;

// Atributos que pueden marcar el destino de un fragmento, en orden de búsqueda
const ANCHOR_ATTRIBUTES: [&str; 3] = ["id", "name", "xml:id"];

// Tramo de texto de un capítulo. Las líneas van recortadas y nunca vacías.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub id: usize,
    pub source_file: PathBuf,
    pub title: String,
    pub lines: Vec<String>,
}

pub fn read_content(path: &Path) -> Result<String, EpubError> {
    let bytes = fs::read(path).map_err(|source| EpubError::ContentRead {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

// Lee un archivo de contenido y lo corta por las anclas de las entradas que apuntan a él.
pub fn segment_file(path: &Path, entries: &[&TocEntry]) -> Result<Vec<Segment>, EpubError> {
    let raw = read_content(path)?;
    Ok(segment_by_anchors(&raw, path, entries))
}

// Corta el markup en un segmento por entrada, ordenados por la posición de cada ancla.
// Las entradas sin fragmento, o cuyo fragmento no aparece, empiezan en el offset 0.
pub fn segment_by_anchors(raw: &str, source_file: &Path, entries: &[&TocEntry]) -> Vec<Segment> {
    let mut starts: Vec<(usize, &TocEntry)> = entries
        .iter()
        .map(|entry| {
            let offset = match entry.fragment.as_deref() {
                Some(fragment) => anchor_offset(raw, fragment).unwrap_or_else(|| {
                    debug!(
                        "ancla '{}' no encontrada en {}, se empieza desde el principio",
                        fragment,
                        source_file.display()
                    );
                    0
                }),
                None => 0,
            };
            (offset, *entry)
        })
        .collect();

    // Estable: las entradas con el mismo offset conservan el orden del índice
    starts.sort_by_key(|(offset, _)| *offset);

    starts
        .iter()
        .enumerate()
        .map(|(i, (start, entry))| {
            let end = starts.get(i + 1).map_or(raw.len(), |(next, _)| *next);
            Segment {
                id: entry.sequence,
                source_file: source_file.to_path_buf(),
                title: entry.title.clone(),
                lines: fragment_lines(&raw[*start..end]),
            }
        })
        .collect()
}

// Offset del '<' que abre la etiqueta con id/name/xml:id = fragmento.
// Los atributos se prueban en orden; gana el primero que aparezca en cualquier parte.
pub fn anchor_offset(raw: &str, fragment: &str) -> Option<usize> {
    let escaped = regex::escape(fragment);

    for attribute in ANCHOR_ATTRIBUTES {
        for quote in ['"', '\''] {
            let pattern = format!(r"{}\s*=\s*{}{}{}", regex::escape(attribute), quote, escaped, quote);
            let Ok(re) = Regex::new(&pattern) else {
                continue;
            };
            if let Some(m) = re.find(raw) {
                let start = m.start();
                return Some(raw[..start].rfind('<').unwrap_or(start));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(sequence: usize, fragment: Option<&str>, title: &str) -> TocEntry {
        TocEntry {
            target_path: PathBuf::from("/book/ch1.xhtml"),
            fragment: fragment.map(str::to_string),
            title: title.to_string(),
            sequence,
        }
    }

    const CHAPTER: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<html xmlns="http://www.w3.org/1999/xhtml">
<head><title>Book</title></head>
<body>
  <h2 id="c1">Chapter A</h2>
  <p>Alpha text.</p>
  <h2 id='c2'>Chapter B</h2>
  <p>Beta text.</p>
</body>
</html>"#;

    #[test]
    fn splits_file_at_anchor_boundaries() {
        let a = entry(1, Some("c1"), "A");
        let b = entry(2, Some("c2"), "B");
        let segments = segment_by_anchors(CHAPTER, Path::new("/book/ch1.xhtml"), &[&a, &b]);

        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].id, 1);
        assert_eq!(segments[0].title, "A");
        assert_eq!(segments[0].lines, vec!["Chapter A", "Alpha text."]);
        assert_eq!(segments[1].id, 2);
        assert_eq!(segments[1].lines, vec!["Chapter B", "Beta text."]);
        assert!(!segments[0].lines.iter().any(|l| l.contains("Beta")));
    }

    #[test]
    fn segments_follow_document_order_not_toc_order() {
        let b = entry(1, Some("c2"), "B");
        let a = entry(2, Some("c1"), "A");
        let segments = segment_by_anchors(CHAPTER, Path::new("/book/ch1.xhtml"), &[&b, &a]);

        let ids: Vec<usize> = segments.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![2, 1]);
        assert_eq!(segments[0].lines, vec!["Chapter A", "Alpha text."]);
    }

    #[test]
    fn missing_fragment_starts_at_offset_zero() {
        assert_eq!(anchor_offset(CHAPTER, "nowhere"), None);

        let lost = entry(1, Some("nowhere"), "Lost");
        let b = entry(2, Some("c2"), "B");
        let segments = segment_by_anchors(CHAPTER, Path::new("/book/ch1.xhtml"), &[&b, &lost]);

        assert_eq!(segments[0].id, 1);
        assert_eq!(segments[0].lines, vec!["Chapter A", "Alpha text."]);
        assert_eq!(segments[1].lines, vec!["Chapter B", "Beta text."]);
    }

    #[test]
    fn shared_offsets_produce_an_empty_segment() {
        let first = entry(1, None, "First");
        let second = entry(2, None, "Second");
        let segments = segment_by_anchors(CHAPTER, Path::new("/book/ch1.xhtml"), &[&first, &second]);

        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].id, 1);
        assert!(segments[0].lines.is_empty());
        assert_eq!(segments[1].lines.len(), 4);
    }

    #[test]
    fn offset_points_at_enclosing_tag() {
        let raw = r#"<p>x</p><a name="n1"></a><div xml:id="x1">y</div>"#;
        assert_eq!(anchor_offset(raw, "n1"), Some(8));
        assert_eq!(anchor_offset(raw, "x1"), Some(25));
        assert_eq!(anchor_offset(r#"<h1 id = "s.1">T</h1>"#, "s.1"), Some(0));
    }

    #[test]
    fn fragment_is_matched_literally() {
        let raw = r#"<p id="axb">x</p><p id="a.b">y</p>"#;
        assert_eq!(anchor_offset(raw, "a.b"), Some(17));
    }

    #[test]
    fn anchors_on_table_rows_keep_cells_apart() {
        let raw = r#"<body><table>
            <tr id="r1"><td>One</td><td>Uno</td></tr>
            <tr id="r2"><td>Two</td><td>Dos</td></tr>
            </table></body>"#;
        let one = entry(1, Some("r1"), "One");
        let two = entry(2, Some("r2"), "Two");
        let segments = segment_by_anchors(raw, Path::new("/book/ch1.xhtml"), &[&one, &two]);

        assert_eq!(segments[0].lines, vec!["One", "Uno"]);
        assert_eq!(segments[1].lines, vec!["Two", "Dos"]);
    }

    #[test]
    fn segment_file_reports_unreadable_content() {
        let a = entry(1, None, "A");
        let err = segment_file(Path::new("/nonexistent/ch1.xhtml"), &[&a]).unwrap_err();
        assert!(matches!(err, EpubError::ContentRead { .. }));
    }
}
