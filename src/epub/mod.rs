// src/epub/mod.rs
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use roxmltree::{Document, Node, ParsingOptions};
use tempfile::TempDir;
use walkdir::WalkDir;
use zip::ZipArchive;

use crate::errors::EpubError;
use crate::metadata::BookMetadata;
use crate::navigation::anchor::resolve_href;
use crate::navigation::{has_html_extension, is_html_file};

const CONTAINER_PATH: &str = "META-INF/container.xml";
const OPF_MIME_TYPE: &str = "application/oebps-package+xml";

// Item del manifiesto OPF, con su href resuelto a una ruta del árbol extraído
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestItem {
    pub id: String,
    pub path: PathBuf,
    pub media_type: String,
    pub properties: Option<String>,
}

impl ManifestItem {
    pub fn has_property(&self, property: &str) -> bool {
        self.properties
            .as_deref()
            .map_or(false, |props| props.split_whitespace().any(|p| p == property))
    }
}

// El documento de paquete: metadatos, manifiesto en orden de documento y orden de lectura.
#[derive(Debug)]
pub struct Package {
    pub opf_path: PathBuf,
    pub metadata: BookMetadata,
    pub manifest: Vec<ManifestItem>,
    pub spine: Vec<PathBuf>,
}

// Un EPUB descomprimido. El directorio de extracción se borra al soltar este valor.
#[derive(Debug)]
pub struct ExtractedEpub {
    workspace: TempDir,
    pub package: Package,
}

impl ExtractedEpub {
    pub fn open(path: &Path) -> Result<Self, EpubError> {
        let workspace = tempfile::Builder::new().prefix("epub_markdown-").tempdir()?;
        debug!("extrayendo {} en {}", path.display(), workspace.path().display());

        let file = File::open(path)?;
        let mut archive = ZipArchive::new(BufReader::new(file))?;
        archive.extract(workspace.path())?;

        let package = Package::load(workspace.path())?;
        debug!(
            "documento de paquete {}: {} items en el manifiesto, {} archivos en el spine",
            package.opf_path.display(),
            package.manifest.len(),
            package.spine.len()
        );
        Ok(ExtractedEpub { workspace, package })
    }

    pub fn root(&self) -> &Path {
        self.workspace.path()
    }
}

pub fn xml_options() -> ParsingOptions {
    // Los NCX y OPF suelen traer DOCTYPE
    ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    }
}

impl Package {
    pub fn load(root: &Path) -> Result<Self, EpubError> {
        let opf_path = find_package_document(root)?;
        let opf_content = String::from_utf8_lossy(&fs::read(&opf_path)?).into_owned();
        let opf_dir = opf_path.parent().unwrap_or(root).to_path_buf();

        let (metadata, manifest, spine_ids) = {
            let opf_doc = Document::parse_with_options(&opf_content, xml_options())?;
            let package_node = opf_doc
                .descendants()
                .find(|n| n.tag_name().name() == "package")
                .ok_or_else(|| EpubError::MissingPackageElement(opf_path.clone()))?;

            let metadata = package_node
                .children()
                .find(|n| n.tag_name().name() == "metadata")
                .map(BookMetadata::parse)
                .unwrap_or_default();

            let manifest_node = package_node
                .children()
                .find(|n| n.tag_name().name() == "manifest")
                .ok_or_else(|| EpubError::MissingManifestElement(opf_path.clone()))?;
            let manifest = parse_manifest(manifest_node, &opf_dir);

            let spine_ids = package_node
                .children()
                .find(|n| n.tag_name().name() == "spine")
                .map(parse_spine)
                .unwrap_or_default();

            (metadata, manifest, spine_ids)
        };

        let mut spine: Vec<PathBuf> = spine_ids
            .iter()
            .filter_map(|idref| {
                let item = manifest.iter().find(|item| &item.id == idref);
                if item.is_none() {
                    warn!("el spine referencia un id desconocido del manifiesto '{}'", idref);
                }
                item
            })
            .map(|item| item.path.clone())
            .filter(|path| is_html_file(path))
            .collect();

        if spine.is_empty() {
            warn!("el spine está vacío, se usan todos los HTML del archivo");
            spine = all_html_files(root);
        }

        Ok(Package {
            opf_path,
            metadata,
            manifest,
            spine,
        })
    }
}

// Primero container.xml; si no, el primer .opf del árbol (recorrido ordenado).
fn find_package_document(root: &Path) -> Result<PathBuf, EpubError> {
    if let Some(path) = parse_container(root) {
        return Ok(path);
    }

    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .find(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .map_or(false, |ext| ext.eq_ignore_ascii_case("opf"))
        })
        .ok_or(EpubError::MissingPackageDocument)
}

fn parse_container(root: &Path) -> Option<PathBuf> {
    let content = fs::read_to_string(root.join(CONTAINER_PATH)).ok()?;
    let doc = match Document::parse_with_options(&content, xml_options()) {
        Ok(doc) => doc,
        Err(e) => {
            warn!("no se pudo parsear {}: {}", CONTAINER_PATH, e);
            return None;
        }
    };

    let rootfile = doc.descendants().find(|n| n.tag_name().name() == "rootfile")?;
    let full_path = rootfile.attribute("full-path")?;

    let media_type = rootfile.attribute("media-type");
    if media_type != Some(OPF_MIME_TYPE) {
        warn!(
            "el media-type del rootfile es {:?}, se esperaba '{}'; se continúa",
            media_type, OPF_MIME_TYPE
        );
    }

    let (path, _) = resolve_href(full_path, root);
    path.is_file().then_some(path)
}

fn parse_manifest(manifest_node: Node, opf_dir: &Path) -> Vec<ManifestItem> {
    manifest_node
        .descendants()
        .filter(|n| n.tag_name().name() == "item")
        .filter_map(|item_node| {
            let id = item_node.attribute("id")?;
            let href = item_node.attribute("href")?;
            let (path, _) = resolve_href(href, opf_dir);
            Some(ManifestItem {
                id: id.to_string(),
                path,
                media_type: item_node.attribute("media-type").unwrap_or("").to_string(),
                properties: item_node.attribute("properties").map(str::to_string),
            })
        })
        .collect()
}

fn parse_spine(spine_node: Node) -> Vec<String> {
    spine_node
        .children()
        .filter(|n| n.tag_name().name() == "itemref")
        .filter_map(|n| n.attribute("idref").map(str::to_string))
        .collect()
}

fn all_html_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| has_html_extension(path))
        .collect();
    files.sort();
    files
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::FileOptions;

    pub const CONTAINER: &str = r#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#;

    // Escribe un zip con las entradas (nombre, contenido) dadas.
    pub fn write_epub(path: &Path, entries: &[(&str, &str)]) {
        let file = File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        for (name, contents) in entries {
            zip.start_file(*name, FileOptions::default()).unwrap();
            zip.write_all(contents.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }

    const OPF: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:title>Sample Book</dc:title>
    <dc:creator>Ann Author</dc:creator>
  </metadata>
  <manifest>
    <item id="nav" href="nav.xhtml" media-type="application/xhtml+xml" properties="nav"/>
    <item id="c2" href="Text/ch%202.xhtml" media-type="application/xhtml+xml"/>
    <item id="c1" href="Text/ch1.xhtml" media-type="application/xhtml+xml"/>
    <item id="img" href="cover.jpg" media-type="image/jpeg"/>
  </manifest>
  <spine>
    <itemref idref="c1"/>
    <itemref idref="missing"/>
    <itemref idref="img"/>
    <itemref idref="c2"/>
  </spine>
</package>"#;

    #[test]
    fn opens_archive_and_reads_package() {
        let dir = tempfile::tempdir().unwrap();
        let epub_path = dir.path().join("book.epub");
        write_epub(
            &epub_path,
            &[
                ("mimetype", "application/epub+zip"),
                (CONTAINER_PATH, CONTAINER),
                ("OEBPS/content.opf", OPF),
                ("OEBPS/nav.xhtml", "<html/>"),
                ("OEBPS/cover.jpg", ""),
                ("OEBPS/Text/ch1.xhtml", "<p>one</p>"),
                ("OEBPS/Text/ch 2.xhtml", "<p>two</p>"),
            ],
        );

        let epub = ExtractedEpub::open(&epub_path).unwrap();
        let package = &epub.package;
        let oebps = epub.root().join("OEBPS");

        assert_eq!(package.opf_path, oebps.join("content.opf"));
        assert_eq!(package.metadata.title.as_deref(), Some("Sample Book"));
        assert_eq!(package.manifest.len(), 4);
        assert!(package.manifest[0].has_property("nav"));
        assert_eq!(
            package.spine,
            vec![oebps.join("Text/ch1.xhtml"), oebps.join("Text/ch 2.xhtml")]
        );
    }

    #[test]
    fn workspace_is_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let epub_path = dir.path().join("book.epub");
        write_epub(
            &epub_path,
            &[(CONTAINER_PATH, CONTAINER), ("OEBPS/content.opf", OPF)],
        );

        let epub = ExtractedEpub::open(&epub_path).unwrap();
        let root = epub.root().to_path_buf();
        assert!(root.exists());
        drop(epub);
        assert!(!root.exists());
    }

    #[test]
    fn finds_opf_without_container_and_falls_back_to_all_html() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("book/text")).unwrap();
        fs::write(
            root.join("book/package.opf"),
            "<package><manifest/><spine/></package>",
        )
        .unwrap();
        fs::write(root.join("book/text/b.xhtml"), "<p>b</p>").unwrap();
        fs::write(root.join("book/text/a.html"), "<p>a</p>").unwrap();
        fs::write(root.join("book/text/notes.txt"), "n").unwrap();

        let package = Package::load(root).unwrap();
        assert_eq!(package.opf_path, root.join("book/package.opf"));
        assert_eq!(
            package.spine,
            vec![root.join("book/text/a.html"), root.join("book/text/b.xhtml")]
        );
    }

    #[test]
    fn missing_package_document_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.xhtml"), "<p>a</p>").unwrap();
        assert!(matches!(
            Package::load(dir.path()),
            Err(EpubError::MissingPackageDocument)
        ));
    }

    #[test]
    fn corrupt_archive_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let epub_path = dir.path().join("broken.epub");
        fs::write(&epub_path, b"not a zip").unwrap();
        assert!(matches!(
            ExtractedEpub::open(&epub_path),
            Err(EpubError::Zip(_))
        ));
    }
}
