// src/segment/heuristic.rs
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};

use super::{read_content, Segment};
use crate::errors::EpubError;
use crate::render::{element_text, visible_lines};

static NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{1,3}$").expect("number regex"));
static ROMAN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[IVXLCDM]+$").expect("roman regex"));

const GENERIC_HEADINGS: [&str; 2] = ["contents", "table of contents"];

// "12", "XIV": número de capítulo que suele ir antes del título real.
pub fn is_numeral(text: &str) -> bool {
    NUMBER_RE.is_match(text) || ROMAN_RE.is_match(text)
}

// Alternativa sin índice: cada archivo del spine es un capítulo.
pub fn heading_chapter(path: &Path, id: usize, book_title: &str) -> Result<Segment, EpubError> {
    let raw = read_content(path)?;
    Ok(chapter_from_markup(&raw, path, id, book_title))
}

pub fn chapter_from_markup(raw: &str, path: &Path, id: usize, book_title: &str) -> Segment {
    let document = Html::parse_document(raw);
    let book_title = book_title.trim().to_lowercase();

    let title = title_from_headings(&document, &book_title)
        .or_else(|| document_title(&document).filter(|t| t.to_lowercase() != book_title))
        .unwrap_or_else(|| {
            path.file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default()
        });

    Segment {
        id,
        source_file: path.to_path_buf(),
        title,
        lines: visible_lines(&document),
    }
}

fn title_from_headings(document: &Html, book_title_lower: &str) -> Option<String> {
    let selector = Selector::parse("h1, h2, h3, h4, h5, h6").ok()?;

    let headings: Vec<String> = document
        .select(&selector)
        .map(element_text)
        .filter(|t| !t.is_empty())
        .filter(|t| {
            let lower = t.to_lowercase();
            lower != book_title_lower && !GENERIC_HEADINGS.contains(&lower.as_str())
        })
        .collect();

    let first = headings.first()?;
    if is_numeral(first) {
        match headings.get(1) {
            Some(second) if second.chars().count() > 2 => Some(format!("{} {}", first, second)),
            _ => Some(first.clone()),
        }
    } else {
        Some(first.clone())
    }
}

fn document_title(document: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    let title = document.select(&selector).next().map(element_text)?;
    (!title.is_empty()).then_some(title)
}
