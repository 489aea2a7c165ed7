//! ELF64 inspector.
//!
//! Reads one file, decodes it with `elfscope-elf` and prints the requested
//! parts as text tables or JSON.

mod cli;
mod report;
mod verbose;

use std::io::Write;

use anyhow::{Context, Result};
use clap::Parser;
use elfscope_elf::ElfFile;
use verbose::{dprintln, vprintln};

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    verbose::init(cli.quiet, cli.verbose);

    let path = cli.command.file();
    let data = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    vprintln!("read {} bytes from {}", data.len(), path.display());

    let file = ElfFile::parse_with(data, cli.parse_options())
        .with_context(|| format!("decoding {}", path.display()))?;
    report_diagnostics(&file);

    let report = report::Report::build(&file, report::Parts::for_command(&cli.command));
    if cli.json {
        let mut out = std::io::stdout().lock();
        serde_json::to_writer_pretty(&mut out, &report).context("serializing report")?;
        writeln!(out)?;
    } else {
        report.print();
    }
    Ok(())
}

/// Warn about sections whose contents could not be decoded.
fn report_diagnostics(file: &ElfFile) {
    let header = file.header();
    vprintln!(
        "{} {} for {}: {} program headers, {} sections",
        header.ident.class,
        header.e_type,
        header.e_machine,
        file.program_headers().len(),
        file.sections().len(),
    );
    if file.name_table().is_none() && !file.sections().is_empty() {
        dprintln!("warning: no section name table");
    }
    for section in file.sections() {
        match section.content() {
            Ok(content) => vprintln!("  [{:>2}] {}", section.index(), content.kind()),
            Err(err) => dprintln!(
                "warning: section {} could not be decoded: {err}",
                section.index()
            ),
        }
    }
    for (index, phdr) in file.program_headers().iter().enumerate() {
        if let Err(err) = phdr.validate() {
            dprintln!("warning: program header {index}: {err}");
        }
    }
}
