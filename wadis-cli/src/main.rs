use clap::{Parser, ValueEnum};
use log::info;
use patharg::InputArg;
use std::error::Error;
use std::io::Read;
use std::process::exit;
use wadis::dis::{LabelMode, WasmDisassembler};
use wadis::names::{DevToolsNameGenerator, NameSectionReader};
use wadis::reader::BinaryReader;

#[derive(Parser)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// The module to disassemble. If not provided or is '-', read from
    /// standard input.
    #[arg(default_value_t)]
    pub input: InputArg,

    /// Append the module offset of every line as a `;; @offset` comment.
    #[arg(long, default_value_t = false)]
    pub offsets: bool,

    /// Print the type section.
    #[arg(long, default_value_t = false)]
    pub print_types: bool,

    /// When to label blocks.
    #[arg(long, value_enum, default_value_t = Labels::WhenUsed)]
    pub labels: Labels,

    /// Where entity names come from.
    #[arg(long, value_enum, default_value_t = Names::NameSection)]
    pub names: Names,

    /// Print exports on the entities they export instead of as separate
    /// fields. Only takes effect with `--names devtools`.
    #[arg(long, default_value_t = false)]
    pub inline_exports: bool,

    /// Number of bytes handed to the decoder at a time.
    #[arg(long, default_value_t = wadis::DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,

    /// Enable verbose output: decoder logging, and a debug representation
    /// of errors.
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum Labels {
    Always,
    WhenUsed,
    Depth,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum Names {
    /// Index-based names only.
    None,
    /// Names from the module's `name` section, if it has valid ones.
    NameSection,
    /// `name` section names, falling back to the first import or export name.
    Devtools,
}

fn main() {
    let cli = Cli::parse();
    env_logger::Builder::new()
        .filter_level(if cli.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Warn
        })
        .parse_default_env()
        .init();

    let mut bytes = Vec::new();
    cli.input
        .open()
        .and_then(|mut input| input.read_to_end(&mut bytes))
        .unwrap_or_else(|e| abort(&cli, &e));

    let mut disassembler = configure(&cli, &bytes).unwrap_or_else(|e| abort(&cli, e.as_ref()));
    let result = wadis::disassemble_chunked(&bytes[..], &mut disassembler, cli.chunk_size)
        .unwrap_or_else(|e| abort(&cli, &e));

    print!("{}", wadis::render(&result));
}

fn configure(cli: &Cli, bytes: &[u8]) -> Result<WasmDisassembler, Box<dyn Error>> {
    let mut disassembler = WasmDisassembler::new();
    disassembler.set_add_offsets(cli.offsets)?;
    disassembler.set_skip_types(!cli.print_types)?;
    disassembler.set_label_mode(match cli.labels {
        Labels::Always => LabelMode::Always,
        Labels::WhenUsed => LabelMode::WhenUsed,
        Labels::Depth => LabelMode::Depth,
    })?;

    let mut reader = BinaryReader::new();
    reader.set_data(bytes, 0, bytes.len(), true);
    match cli.names {
        Names::None => {}
        Names::NameSection => {
            let mut names = NameSectionReader::new();
            names.read(&mut reader)?;
            if names.has_valid_names() {
                disassembler.set_name_resolver(names.get_name_resolver()?)?;
            } else {
                info!("module has no usable name section");
            }
        }
        Names::Devtools => {
            let mut names = DevToolsNameGenerator::new();
            names.read(&mut reader)?;
            disassembler.set_name_resolver(names.get_name_resolver())?;
            if cli.inline_exports {
                disassembler.set_export_metadata(names.get_export_metadata())?;
            }
        }
    }
    Ok(disassembler)
}

fn abort<T>(cli: &Cli, err: &dyn Error) -> T {
    eprintln!("ERROR: {err}");

    let mut sources = Vec::new();
    let mut current = err.source();
    while let Some(cause) = current {
        sources.push(cause);
        current = cause.source();
    }
    if !sources.is_empty() {
        eprintln!("\nCaused by:");
        for (i, cause) in sources.iter().enumerate() {
            eprintln!("    {i}: {cause}");
        }
    }

    if cli.verbose {
        eprintln!("\nDEBUG OUTPUT:\n{err:#?}");
    }

    exit(1)
}
