//! convmesh: convert a mesh file in any supported format to `.ams`
//!
//! Usage: `convmesh <input> <outputdir> [-b|--binary] [-n|--name NAME]`

use ams_game::foundation::logging;
use ams_game::mesh::{AmsMeshLoader, ObjMeshLoader};
use ams_game::Context;
use anyhow::{bail, Context as _, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::path::{Path, PathBuf};

#[derive(Debug)]
struct Options {
    input: PathBuf,
    output_dir: PathBuf,
    binary: bool,
    name: Option<String>,
}

impl Options {
    fn from_matches(matches: &ArgMatches) -> Result<Self> {
        Ok(Self {
            input: matches
                .get_one::<PathBuf>("input")
                .cloned()
                .context("missing input path")?,
            output_dir: matches
                .get_one::<PathBuf>("outputdir")
                .cloned()
                .context("missing output directory")?,
            binary: matches.get_flag("binary"),
            name: matches
                .get_one::<String>("name")
                .filter(|name| !name.is_empty())
                .cloned(),
        })
    }

    /// Output file name without extension
    fn stem(&self) -> Option<String> {
        self.name.clone().or_else(|| {
            self.input
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
        })
    }
}

fn command() -> Command {
    Command::new("convmesh")
        .about("Converts a mesh file to the .ams format")
        .arg(
            Arg::new("input")
                .help("Input file path")
                .required(true)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("outputdir")
                .help("Output directory path")
                .required(true)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("binary")
                .short('b')
                .long("binary")
                .help("Write a binary file instead of ASCII")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("name")
                .short('n')
                .long("name")
                .value_name("NAME")
                .help("Output file name, defaults to the input file stem"),
        )
}

fn registered_context() -> Context {
    let mut context = Context::new();
    let loaders = context.mesh_loaders_mut();
    loaders.register::<AmsMeshLoader>();
    loaders.register::<ObjMeshLoader>();
    context
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Convert `options.input`, returning the written path
fn convert(context: &mut Context, options: &Options) -> Result<PathBuf> {
    if !options.input.is_file() {
        bail!("Input file does not exist: {}", options.input.display());
    }
    if !options.output_dir.is_dir() {
        bail!("Output directory does not exist: {}", options.output_dir.display());
    }

    let ext = options
        .input
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default();
    if !context.mesh_loaders().contains(ext) {
        bail!(
            "Input file type '{ext}' is not supported (supported: {})",
            context.mesh_loaders().supported_file_types().join(", ")
        );
    }

    let stem = options.stem().context("Cannot derive an output name")?;
    let output = options.output_dir.join(format!("{stem}.ams"));
    if same_file(&options.input, &output) {
        bail!("Output file cannot be the input file: {}", output.display());
    }

    let mesh = context
        .load_mesh(&options.input)
        .with_context(|| format!("Failed to load {}", options.input.display()))?;
    mesh.save_to_file(&output, options.binary)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    log::info!(
        "Converted {} ({} vertices, {} faces) to {}",
        options.input.display(),
        mesh.vertex_count(),
        mesh.face_count(),
        output.display()
    );
    Ok(output)
}

fn main() -> Result<()> {
    logging::init();
    let options = Options::from_matches(&command().get_matches())?;
    let mut context = registered_context();
    let output = convert(&mut context, &options)?;
    println!("Wrote {}", output.display());
    Ok(())
}
