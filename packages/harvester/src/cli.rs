//! Command-line interface for the harvester.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use regex::Regex;

use iao_sections::{resolve_headings, HeadingRecord};

use crate::bioc::BiocCollection;
use crate::config::{
    validate_output_dir, validate_resource_path, DAG_ENV, DEFAULT_INPUT_PATTERN, MAPPING_ENV,
    TERM_IDS_ENV,
};
use crate::error::{HarvesterError, Result};
use crate::files::find_input_files;
use crate::harvester::{process_file, ReferenceData};
use crate::output::save_article;
use crate::selector::ArticleConfig;
use crate::text::normalize_heading;

/// IAO Harvester - Extract sectioned full text and tables from articles.
#[derive(Parser)]
#[command(name = "iao-harvester")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// IAO reference resources.
#[derive(Args, Debug, Clone)]
pub struct ResourceArgs {
    /// Heading to IAO term mapping table
    #[arg(long, env = MAPPING_ENV)]
    pub mapping: PathBuf,

    /// IAO term to identifier table
    #[arg(long, env = TERM_IDS_ENV)]
    pub term_ids: PathBuf,

    /// GraphML model of section transitions
    #[arg(long, env = DAG_ENV)]
    pub dag: PathBuf,
}

impl ResourceArgs {
    fn load(&self) -> Result<ReferenceData> {
        validate_resource_path(&self.mapping)?;
        validate_resource_path(&self.term_ids)?;
        validate_resource_path(&self.dag)?;
        ReferenceData::load(&self.mapping, &self.term_ids, &self.dag)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Process article files into BioC and table JSON.
    Process {
        /// Article files or directories to search
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Selector configuration (JSON or YAML)
        #[arg(short, long)]
        config: PathBuf,

        /// Output directory
        #[arg(short, long)]
        output: PathBuf,

        /// File name pattern used when searching directories
        #[arg(short, long, default_value = DEFAULT_INPUT_PATTERN)]
        pattern: String,

        #[command(flatten)]
        resources: ResourceArgs,
    },

    /// Infer IAO categories for a list of headings, one per line.
    Resolve {
        /// File with one heading per line in document order
        headings: PathBuf,

        #[command(flatten)]
        resources: ResourceArgs,
    },
}

/// Run the CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Process {
            inputs,
            config,
            output,
            pattern,
            resources,
        } => process_command(&inputs, &config, &output, &pattern, &resources),
        Commands::Resolve {
            headings,
            resources,
        } => resolve_command(&headings, &resources),
    }
}

/// Execute the process command.
fn process_command(
    inputs: &[PathBuf],
    config_path: &Path,
    output: &Path,
    pattern: &str,
    resources: &ResourceArgs,
) -> Result<()> {
    validate_output_dir(output)?;
    validate_resource_path(config_path)?;

    let pattern = Regex::new(pattern)?;
    let config = ArticleConfig::load(config_path)?;
    let reference = resources.load()?;

    let mut files = Vec::new();
    for input in inputs {
        files.extend(find_input_files(input, &pattern)?);
    }

    println!(
        "{} {} article(s) into {}",
        style("Processing").bold(),
        style(files.len()).cyan(),
        style(output.display()).green()
    );

    let pb = ProgressBar::new(files.len() as u64);
    #[allow(clippy::expect_used)] // Static template string that is guaranteed to be valid
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:30}] {pos}/{len} {msg}")
            .expect("valid template"),
    );

    let mut written = 0usize;
    let mut failed = 0usize;
    for file in &files {
        pb.set_message(
            file.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        );

        let saved = process_file(file, &config, &reference).and_then(|article| {
            let collection = BiocCollection::today(vec![article.document.clone()]);
            save_article(&article, &collection, file, output)
        });
        match saved {
            Ok(_) => written += 1,
            Err(e) => {
                tracing::warn!(file = %file.display(), error = %e, "Skipping article");
                failed += 1;
            }
        }
        pb.inc(1);
    }

    pb.finish_and_clear();

    println!(
        "{} {} article(s)",
        style("Processed").green().bold(),
        written
    );
    if failed > 0 {
        println!("  Skipped: {}", style(failed).yellow().bold());
    }

    Ok(())
}

/// Execute the resolve command.
fn resolve_command(headings_path: &Path, resources: &ResourceArgs) -> Result<()> {
    let content =
        fs::read_to_string(headings_path).map_err(|e| HarvesterError::file(headings_path, e))?;
    let reference = resources.load()?;

    let records: Vec<HeadingRecord> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| HeadingRecord::lookup(line, &normalize_heading(line), &reference.dictionary))
        .collect();

    let resolution = resolve_headings(&records, &reference.dictionary, &reference.dag);
    println!("{}", serde_json::to_string_pretty(&resolution)?);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cli_parse_process() {
        let cli = Cli::parse_from([
            "iao-harvester",
            "process",
            "in/a.html",
            "in/dir",
            "--config",
            "config.json",
            "--output",
            "out",
            "--mapping",
            "mapping.txt",
            "--term-ids",
            "ids.txt",
            "--dag",
            "dag.graphml",
        ]);

        let Commands::Process {
            inputs,
            config,
            pattern,
            resources,
            ..
        } = cli.command
        else {
            panic!("expected process command");
        };
        assert_eq!(inputs, vec![PathBuf::from("in/a.html"), PathBuf::from("in/dir")]);
        assert_eq!(config, PathBuf::from("config.json"));
        assert_eq!(pattern, DEFAULT_INPUT_PATTERN);
        assert_eq!(resources.dag, PathBuf::from("dag.graphml"));
    }

    #[test]
    fn test_cli_parse_resolve() {
        let cli = Cli::parse_from([
            "iao-harvester",
            "resolve",
            "headings.txt",
            "--mapping",
            "m.txt",
            "--term-ids",
            "i.txt",
            "--dag",
            "d.graphml",
        ]);

        let Commands::Resolve { headings, resources } = cli.command else {
            panic!("expected resolve command");
        };
        assert_eq!(headings, PathBuf::from("headings.txt"));
        assert_eq!(resources.mapping, PathBuf::from("m.txt"));
    }

    #[test]
    fn test_cli_requires_inputs() {
        let result = Cli::try_parse_from([
            "iao-harvester",
            "process",
            "--config",
            "c.json",
            "--output",
            "out",
        ]);
        assert!(result.is_err());
    }
}
