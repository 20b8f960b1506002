// src/navigation/mod.rs
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::epub::ManifestItem;

pub mod anchor;
mod nav_doc;
mod ncx;

pub use nav_doc::NavDocument;
pub use ncx::NcxDocument;

const NCX_MEDIA_TYPE: &str = "application/x-dtbncx+xml";

// Un triple (destino, fragmento, título) tal como lo emite un extractor del índice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavPoint {
    pub target: PathBuf,
    pub fragment: Option<String>,
    pub title: String,
}

// Entrada del índice que apunta a un archivo de contenido existente.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    pub target_path: PathBuf,
    pub fragment: Option<String>,
    pub title: String,
    pub sequence: usize,
}

// Contrato común de las fuentes de navegación: entradas en orden, el padre antes que los hijos.
// Los fallos se absorben; un resultado vacío lleva a la heurística de encabezados.
pub trait TocExtractor {
    fn name(&self) -> &'static str;
    fn extract(&self) -> Vec<NavPoint>;
}

// Elige la fuente de navegación declarada en el manifiesto.
// El documento nav de EPUB 3 gana al NCX; solo se usa uno de los dos.
pub fn select_extractor(manifest: &[ManifestItem]) -> Option<Box<dyn TocExtractor>> {
    let nav_item = manifest.iter().find(|item| item.has_property("nav"));
    let ncx_item = manifest.iter().find(|item| item.media_type == NCX_MEDIA_TYPE);

    if let Some(item) = nav_item {
        if item.path.is_file() {
            return Some(Box::new(NavDocument::new(item.path.clone())));
        }
        warn!("el documento de navegación {} está declarado pero no existe", item.path.display());
    }

    if let Some(item) = ncx_item {
        if item.path.is_file() {
            return Some(Box::new(NcxDocument::new(item.path.clone())));
        }
        warn!("el NCX {} está declarado pero no existe", item.path.display());
    }

    None
}

// Ejecuta el extractor elegido y conserva las entradas que apuntan a HTML/XHTML existentes.
// Los números de secuencia van de 1 a N sobre las entradas que quedan.
pub fn toc_entries(manifest: &[ManifestItem]) -> Vec<TocEntry> {
    let Some(extractor) = select_extractor(manifest) else {
        info!("no hay fuente de navegación declarada, se usan los encabezados");
        return Vec::new();
    };

    let points = extractor.extract();
    debug!("el extractor {} produjo {} entradas", extractor.name(), points.len());

    let entries: Vec<TocEntry> = points
        .into_iter()
        .filter(|point| is_html_file(&point.target))
        .enumerate()
        .map(|(i, point)| TocEntry {
            target_path: point.target,
            fragment: point.fragment,
            title: point.title,
            sequence: i + 1,
        })
        .collect();

    if entries.is_empty() {
        warn!("el índice no tiene entradas utilizables, se usan los encabezados");
    }
    entries
}

pub fn has_html_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("xhtml") || ext.eq_ignore_ascii_case("html"))
        .unwrap_or(false)
}

pub fn is_html_file(path: &Path) -> bool {
    has_html_extension(path) && path.is_file()
}
