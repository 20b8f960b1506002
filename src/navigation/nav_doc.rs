// src/navigation/nav_doc.rs
use std::fs;
use std::path::{Path, PathBuf};

use log::warn;
use scraper::{ElementRef, Html, Selector};

use super::anchor::resolve_href;
use super::{NavPoint, TocExtractor};
use crate::render::collapse_whitespace;

// Documento de navegación EPUB 3 (XHTML con un índice en <nav>).
pub struct NavDocument {
    path: PathBuf,
}

impl NavDocument {
    pub fn new(path: PathBuf) -> Self {
        NavDocument { path }
    }
}

impl TocExtractor for NavDocument {
    fn name(&self) -> &'static str {
        "nav"
    }

    fn extract(&self) -> Vec<NavPoint> {
        match fs::read(&self.path) {
            Ok(bytes) => {
                let base_dir = self.path.parent().unwrap_or_else(|| Path::new(""));
                parse_nav_xhtml(&String::from_utf8_lossy(&bytes), base_dir)
            }
            Err(e) => {
                warn!("no se pudo leer el documento de navegación {}: {}", self.path.display(), e);
                Vec::new()
            }
        }
    }
}

pub fn parse_nav_xhtml(content: &str, base_dir: &Path) -> Vec<NavPoint> {
    let document = Html::parse_document(content);
    let mut points = Vec::new();

    let Some(nav) = find_toc_nav(&document) else {
        warn!("el documento de navegación no tiene elemento <nav>");
        return points;
    };

    // La lista puede venir envuelta (encabezados, divs); el primer <ol> es el nivel superior
    let ol = Selector::parse("ol").ok();
    let container = ol
        .as_ref()
        .and_then(|ol| nav.select(ol).next())
        .unwrap_or(nav);

    walk_list(container, base_dir, &mut points);
    points
}

// Gana la primera coincidencia: epub:type="toc", luego role="doc-toc", luego id="toc", luego cualquier <nav>.
fn find_toc_nav(document: &Html) -> Option<ElementRef<'_>> {
    let selector = Selector::parse("nav").ok()?;
    let navs: Vec<ElementRef> = document.select(&selector).collect();

    let by_epub_type = |nav: &&ElementRef| {
        nav.value()
            .attr("epub:type")
            .map_or(false, |types| types.split_whitespace().any(|t| t == "toc"))
    };
    let by_role = |nav: &&ElementRef| nav.value().attr("role") == Some("doc-toc");
    let by_id = |nav: &&ElementRef| nav.value().id() == Some("toc");

    navs.iter()
        .find(by_epub_type)
        .or_else(|| navs.iter().find(by_role))
        .or_else(|| navs.iter().find(by_id))
        .or_else(|| navs.first())
        .copied()
}

// Preorden sobre los <li> hijos directos; un <ol> anidado se recorre justo después de su padre.
fn walk_list(list: ElementRef, base_dir: &Path, points: &mut Vec<NavPoint>) {
    for li in child_elements(list).filter(|el| el.value().name() == "li") {
        if let Some(link) = find_link(li) {
            if let Some(href) = link.value().attr("href") {
                let (target, fragment) = resolve_href(href, base_dir);
                let title = collapse_whitespace(&link.text().collect::<Vec<_>>().join(" "));
                points.push(NavPoint { target, fragment, title });
            }
        }

        if let Some(child_list) = child_elements(li).find(|el| el.value().name() == "ol") {
            walk_list(child_list, base_dir, points);
        }
    }
}

// Primer <a href> de un item, sin mirar dentro de sus listas anidadas.
fn find_link(item: ElementRef) -> Option<ElementRef> {
    for child in child_elements(item) {
        match child.value().name() {
            "a" if child.value().attr("href").is_some() => return Some(child),
            "ol" | "ul" => {}
            _ => {
                if let Some(link) = find_link(child) {
                    return Some(link);
                }
            }
        }
    }
    None
}

fn child_elements<'a>(element: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    element.children().filter_map(ElementRef::wrap)
}
