// src/title.rs
use once_cell::sync::Lazy;
use regex::Regex;

use crate::render::collapse_whitespace;

const OPAQUE_ID_KEEP: usize = 10;
const MAX_TITLE_WORDS: usize = 12;
const MAX_TITLE_CHARS: usize = 80;

static OPAQUE_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_\-]{10,}$").expect("opaque id regex"));

// Normaliza un título en bruto a una etiqueta corta. Idempotente.
pub fn short_title(raw: &str) -> String {
    let mut title = truncate_opaque_id(collapse_whitespace(raw));
    if title.is_empty() {
        return title;
    }

    let words: Vec<&str> = title.split(' ').collect();
    if words.len() > MAX_TITLE_WORDS {
        title = words[..MAX_TITLE_WORDS].join(" ");
    }

    if title.chars().count() > MAX_TITLE_CHARS {
        title = cut_chars(&title, MAX_TITLE_CHARS);
    }

    // El corte por longitud puede dejar un identificador suelto
    truncate_opaque_id(title)
}

fn truncate_opaque_id(title: String) -> String {
    if OPAQUE_ID_RE.is_match(&title) {
        title.chars().take(OPAQUE_ID_KEEP).collect()
    } else {
        title
    }
}

fn cut_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect::<String>().trim_end().to_string()
}

// Todo lo que no sea alfanumérico, espacio, '_' o '-' pasa a '_'; se recorta el final.
pub fn file_safe(title: &str) -> String {
    let replaced: String = title
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, ' ' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    replaced.trim_end().to_string()
}

// Etiqueta de capítulo apta para nombre de archivo; `None` si no queda nada.
pub fn file_safe_chapter(title: &str) -> Option<String> {
    let safe = file_safe(title);
    let safe = if safe.chars().count() > MAX_TITLE_CHARS {
        cut_chars(&safe, MAX_TITLE_CHARS)
    } else {
        safe
    };
    (!safe.is_empty()).then_some(safe)
}
