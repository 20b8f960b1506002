// src/assemble/mod.rs
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::epub::{ExtractedEpub, Package};
use crate::errors::EpubError;
use crate::metadata::BookMetadata;
use crate::navigation::{self, TocEntry};
use crate::segment::{self, heuristic, Segment};
use crate::title::{file_safe, file_safe_chapter, short_title};

pub mod overrides;
pub mod sink;

use overrides::TitleOverrides;
use sink::{DirectorySink, OutputSink};

// Un capítulo de salida. `index` es su posición en el libro (desde 1) y el prefijo del archivo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterRecord {
    pub index: usize,
    pub source_file: PathBuf,
    pub display_title: String,
    pub lines: Vec<String>,
}

impl ChapterRecord {
    // Línea de encabezado más las del cuerpo
    pub fn line_count(&self) -> usize {
        1 + self.lines.len()
    }

    pub fn heading(&self) -> String {
        format!("# {} [{}]", self.display_title, self.line_count())
    }

    pub fn markdown(&self) -> String {
        format!("{}\n\n{}", self.heading(), self.lines.join("\n"))
    }

    pub fn file_name(&self) -> String {
        let label = file_safe_chapter(&self.display_title)
            .unwrap_or_else(|| format!("chapter_{}", self.index));
        format!("{:03}-{}_[{}].md", self.index, label, self.line_count())
    }
}

// Segmentos acumulados de un libro, en orden global de emisión.
pub struct Assembly<'a> {
    package: &'a Package,
    book_title: String,
    segments: Vec<Segment>,
}

impl<'a> Assembly<'a> {
    pub fn new(package: &'a Package, fallback_title: &str) -> Self {
        let book_title = package
            .metadata
            .title
            .clone()
            .unwrap_or_else(|| fallback_title.to_string());
        Assembly {
            package,
            book_title,
            segments: Vec::new(),
        }
    }

    // Modo índice: archivos en el orden en que aparecen, cada uno cortado por sus anclas.
    pub fn collect_toc_segments(&mut self, entries: &[TocEntry]) -> Result<(), EpubError> {
        for (path, file_entries) in group_by_file(entries) {
            let segments = segment::segment_file(path, &file_entries)?;
            self.segments.extend(segments);
        }
        Ok(())
    }

    // Sin índice: un capítulo por archivo del spine, numerado por su posición.
    pub fn collect_heading_segments(&mut self) -> Result<(), EpubError> {
        for (i, path) in self.package.spine.iter().enumerate() {
            let segment = heuristic::heading_chapter(path, i + 1, &self.book_title)?;
            self.segments.push(segment);
        }
        Ok(())
    }

    pub fn finish(self, overrides: &dyn TitleOverrides, fallback_name: &str) -> AssembledBook {
        let chapters = self
            .segments
            .into_iter()
            .enumerate()
            .map(|(i, segment)| {
                let index = i + 1;
                debug!(
                    "chapter {} from entry {} of {}",
                    index,
                    segment.id,
                    segment.source_file.display()
                );
                let raw_title = overrides
                    .title_for(index, &segment.lines)
                    .unwrap_or(segment.title);
                ChapterRecord {
                    index,
                    source_file: segment.source_file,
                    display_title: short_title(&raw_title),
                    lines: segment.lines,
                }
            })
            .collect();

        let safe_title = file_safe(&self.book_title);
        let dir_name = if safe_title.is_empty() {
            file_safe(fallback_name)
        } else {
            safe_title
        };

        AssembledBook {
            title: self.book_title,
            dir_name,
            metadata: self.package.metadata.clone(),
            chapters,
        }
    }
}

// Agrupa las entradas por archivo, en el orden en que aparece cada archivo.
fn group_by_file(entries: &[TocEntry]) -> Vec<(&Path, Vec<&TocEntry>)> {
    let mut groups: Vec<(&Path, Vec<&TocEntry>)> = Vec::new();
    let mut positions: HashMap<&Path, usize> = HashMap::new();

    for entry in entries {
        let path = entry.target_path.as_path();
        match positions.get(path) {
            Some(&pos) => groups[pos].1.push(entry),
            None => {
                positions.insert(path, groups.len());
                groups.push((path, vec![entry]));
            }
        }
    }
    groups
}

#[derive(Debug)]
pub struct AssembledBook {
    pub title: String,
    pub dir_name: String,
    pub metadata: BookMetadata,
    pub chapters: Vec<ChapterRecord>,
}

impl AssembledBook {
    pub fn full_file_name(&self) -> String {
        format!("{}_full.md", self.dir_name)
    }

    // Front matter una vez, luego cada capítulo seguido de una línea horizontal.
    pub fn full_markdown(&self) -> String {
        let mut text = self.metadata.front_matter(&self.title);
        for chapter in &self.chapters {
            text.push_str(&chapter.heading());
            text.push_str("\n\n");
            text.push_str(&chapter.lines.join("\n"));
            text.push_str("\n\n---\n\n");
        }
        text
    }

    // Capítulos en orden de índice y después el libro completo. Devuelve las rutas escritas.
    pub fn write(&self, sink: &mut dyn OutputSink) -> Result<Vec<PathBuf>, EpubError> {
        let mut written = Vec::with_capacity(self.chapters.len() + 1);
        for chapter in &self.chapters {
            let name = chapter.file_name();
            debug!("{} <- {}", name, chapter.source_file.display());
            written.push(sink.write_file(&name, &chapter.markdown())?);
        }
        written.push(sink.write_file(&self.full_file_name(), &self.full_markdown())?);
        Ok(written)
    }
}

#[derive(Debug)]
pub struct ConversionReport {
    pub output_dir: PathBuf,
    pub files: Vec<PathBuf>,
}

// Convierte un EPUB en `<output_base>/<título del libro>/`. El directorio de extracción
// desaparece al volver, sea cual sea el resultado.
pub fn convert_epub(
    epub_path: &Path,
    output_base: &Path,
    overrides: &dyn TitleOverrides,
) -> Result<ConversionReport, EpubError> {
    let epub = ExtractedEpub::open(epub_path)?;
    debug!("trabajando en {}", epub.root().display());
    let fallback_name = epub_path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut assembly = Assembly::new(&epub.package, &fallback_name);
    let entries = navigation::toc_entries(&epub.package.manifest);
    if entries.is_empty() {
        assembly.collect_heading_segments()?;
    } else {
        assembly.collect_toc_segments(&entries)?;
    }

    let book = assembly.finish(overrides, &fallback_name);
    if book.chapters.is_empty() {
        warn!("'{}' no tiene archivos de contenido", book.title);
    }
    info!("'{}': {} capítulos", book.title, book.chapters.len());

    let mut sink = DirectorySink::new(output_base.join(&book.dir_name));
    let files = book.write(&mut sink)?;
    Ok(ConversionReport {
        output_dir: sink.dir().clone(),
        files,
    })
}
