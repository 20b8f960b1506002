// src/main.rs
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{error, warn};

mod assemble;
mod epub;
mod errors;
mod metadata;
mod navigation;
mod render;
mod segment;
mod title;

use assemble::overrides::{parse_lines_arg, parse_title_arg, OverrideTable, TitleOverride};
use assemble::{convert_epub, ConversionReport};

#[derive(Parser, Debug)]
#[command(name = "epub_markdown")]
#[command(about = "Convierte libros EPUB en un archivo Markdown por capítulo más el libro completo", long_about = None)]
#[command(version)]
struct Cli {
    /// Archivos EPUB a convertir
    #[arg(value_name = "EPUB", required = true)]
    inputs: Vec<PathBuf>,

    /// Carpeta base de salida (por defecto: el escritorio, o el directorio actual)
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Reemplaza el título de un capítulo, p. ej. --title "3=El comienzo"
    #[arg(long = "title", value_name = "N=TITLE", value_parser = parse_title_arg)]
    titles: Vec<(usize, String)>,

    /// Toma el título de un capítulo de sus líneas, p. ej. --title-lines 3=1-2
    #[arg(long = "title-lines", value_name = "N=A-B", value_parser = parse_lines_arg)]
    title_lines: Vec<(usize, TitleOverride)>,

    /// Activa la salida de depuración
    #[arg(short, long, default_value_t = false)]
    debug: bool,
}

fn is_epub(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| ext.eq_ignore_ascii_case("epub"))
}

fn default_output_dir() -> Result<PathBuf> {
    match dirs::desktop_dir().filter(|dir| dir.is_dir()) {
        Some(dir) => Ok(dir),
        None => std::env::current_dir().context("No se pudo determinar el directorio actual"),
    }
}

fn print_report(report: &ConversionReport) {
    println!("\nArchivos Markdown escritos en {}", report.output_dir.display());
    for path in &report.files {
        let name = path.file_name().unwrap_or_default().to_string_lossy();
        let first_line = fs::read_to_string(path)
            .ok()
            .and_then(|text| text.lines().next().map(|l| l.trim().to_string()));
        match first_line {
            Some(line) => println!("- {} | {}", name, line),
            None => println!("- {}", name),
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let books: Vec<PathBuf> = cli
        .inputs
        .into_iter()
        .filter(|path| {
            let usable = path.is_file() && is_epub(path);
            if !usable {
                warn!("Se omite {}: no es un archivo .epub existente", path.display());
            }
            usable
        })
        .collect();
    if books.is_empty() {
        bail!("No se indicó ningún archivo EPUB válido");
    }

    let mut overrides = OverrideTable::default();
    for (index, text) in cli.titles {
        overrides.insert(index, TitleOverride::Text(text));
    }
    for (index, lines) in cli.title_lines {
        overrides.insert(index, lines);
    }
    if !overrides.is_empty() && books.len() > 1 {
        bail!("Los títulos manuales solo se pueden usar al convertir un único libro");
    }

    let output_base = match cli.output_dir {
        Some(dir) => dir,
        None => default_output_dir()?,
    };

    // Un libro que falla no detiene el resto de la cola
    let mut failed = 0;
    for book in &books {
        println!("Procesando {}...", book.display());
        match convert_epub(book, &output_base, &overrides)
            .with_context(|| format!("Error al convertir {}", book.display()))
        {
            Ok(report) => print_report(&report),
            Err(e) => {
                error!("{:#}", e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        bail!("{} de {} libros no se pudieron convertir", failed, books.len());
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    run(cli)
}
