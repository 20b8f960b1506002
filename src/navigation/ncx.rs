// src/navigation/ncx.rs
use std::fs;
use std::path::{Path, PathBuf};

use log::warn;
use roxmltree::{Document, Node};

use super::anchor::resolve_href;
use super::{NavPoint, TocExtractor};
use crate::epub::xml_options;

// Archivo de control de navegación EPUB 2 (toc.ncx).
pub struct NcxDocument {
    path: PathBuf,
}

impl NcxDocument {
    pub fn new(path: PathBuf) -> Self {
        NcxDocument { path }
    }
}

impl TocExtractor for NcxDocument {
    fn name(&self) -> &'static str {
        "ncx"
    }

    fn extract(&self) -> Vec<NavPoint> {
        let content = match fs::read(&self.path) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) => {
                warn!("no se pudo leer el NCX {}: {}", self.path.display(), e);
                return Vec::new();
            }
        };
        let base_dir = self.path.parent().unwrap_or_else(|| Path::new(""));
        parse_ncx(&content, base_dir)
    }
}

// Cualquier error de parseo se avisa y devuelve una lista vacía.
pub fn parse_ncx(content: &str, base_dir: &Path) -> Vec<NavPoint> {
    let doc = match Document::parse_with_options(content, xml_options()) {
        Ok(doc) => doc,
        Err(e) => {
            warn!("no se pudo parsear el NCX: {}", e);
            return Vec::new();
        }
    };

    let mut points = Vec::new();
    match doc.descendants().find(|n| n.tag_name().name() == "navMap") {
        Some(nav_map) => parse_navpoints(nav_map, base_dir, &mut points),
        None => warn!("el NCX no tiene <navMap>"),
    }
    points
}

// En profundidad y en preorden: un navPoint sale antes que los navPoints que contiene.
fn parse_navpoints(parent: Node, base_dir: &Path, points: &mut Vec<NavPoint>) {
    for node in parent.children().filter(|n| n.tag_name().name() == "navPoint") {
        let title = node
            .children()
            .find(|n| n.tag_name().name() == "navLabel")
            .and_then(|label| {
                label
                    .descendants()
                    .filter(|n| n.tag_name().name() == "text")
                    .find_map(|n| n.text().map(str::trim).filter(|t| !t.is_empty()))
            })
            .unwrap_or("")
            .to_string();

        let src = node
            .children()
            .find(|n| n.tag_name().name() == "content")
            .and_then(|content| content.attribute("src"));

        if let Some(src) = src {
            let (target, fragment) = resolve_href(src, base_dir);
            points.push(NavPoint { target, fragment, title });
        }

        parse_navpoints(node, base_dir, points);
    }
}
