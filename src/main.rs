// zxtap - A ZX Spectrum BASIC tokenizer creating TAP and TZX tape images
// Copyright (C) 2026  Marcel Joachim Kloubert <marcel@kloubert.dev>
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.


//! zxtap CLI
//!
//! Converts ZX Spectrum BASIC listings and binaries into TAP and TZX tape
//! images and lists the blocks of TAP files.

use clap::{Args, Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use tracing::info;
use tracing_subscriber::EnvFilter;

use zxtap::error::{format_warning, render_report, ContainerError};
use zxtap::output::tap::{self, default_name, hex_lines, DEFAULT_CODE_ADDRESS};
use zxtap::output::tzx::{build_from_inputs, ArchiveInfo, HardwareInfo, InputLayout, Model, DEFAULT_PAUSE};
use zxtap::output::{format_from_extension, write_output, OutputFormat};
use zxtap::{tokenize_program, TokenizerOptions, TzxConfig};

/// zxtap - ZX Spectrum tape image tools
#[derive(Parser, Debug)]
#[command(name = "zxtap")]
#[command(version)]
#[command(about = "Tokenize ZX Spectrum BASIC and build TAP and TZX tape images")]
#[command(long_about = r#"
zxtap turns plain-text ZX Spectrum BASIC into the tokenized form the ROM
keeps in memory and saves it as a tape image.

The output can be either:
  - TAP files (.tap) - Header and data blocks as saved by the ROM
  - TZX files (.tzx) - TAP blocks plus metadata and control blocks

Example usage:
  zxtap basic game.bas -o game.tap --autostart 10
  zxtap code screen.bin -o screen.tap --address 16384
  zxtap tzx loader.tap screen.tap -o game.tzx --title "Game" --multiload
  zxtap tzx -o game.tzx --config layout.toml
  zxtap list game.tap --dump
"#)]
struct Cli {
    /// Verbosity level (can be repeated)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Tokenize a BASIC listing into a program tape
    Basic(BasicArgs),
    /// Save a binary file as a CODE tape
    Code(CodeArgs),
    /// Build a TZX image from TAP files or a layout file
    Tzx(TzxArgs),
    /// List the blocks of a TAP file
    List(ListArgs),
}

#[derive(Args, Debug)]
struct BasicArgs {
    /// BASIC source file
    input: PathBuf,

    /// Output file (.tap or .tzx)
    #[arg(short, long)]
    output: PathBuf,

    /// Tape name (max 10 characters, defaults to the input file name)
    #[arg(long)]
    name: Option<String>,

    /// Line to run after loading
    #[arg(long)]
    autostart: Option<u16>,

    /// Match keywords regardless of case
    #[arg(short = 'c', long)]
    case_insensitive: bool,
}

#[derive(Args, Debug)]
struct CodeArgs {
    /// Binary input file
    input: PathBuf,

    /// Output file (.tap or .tzx)
    #[arg(short, long)]
    output: PathBuf,

    /// Tape name (max 10 characters, defaults to the input file name)
    #[arg(long)]
    name: Option<String>,

    /// Load address
    #[arg(long, default_value_t = DEFAULT_CODE_ADDRESS)]
    address: u16,
}

#[derive(Args, Debug)]
struct TzxArgs {
    /// TAP files and .desc text files, in tape order
    inputs: Vec<PathBuf>,

    /// Output TZX file
    #[arg(short, long)]
    output: PathBuf,

    /// TOML layout file (replaces the input list)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Pause after each data block in milliseconds
    #[arg(long, default_value_t = DEFAULT_PAUSE)]
    pause: u16,

    #[arg(long)]
    title: Option<String>,

    #[arg(long)]
    author: Option<String>,

    #[arg(long)]
    year: Option<String>,

    /// Mark the tape as 128K only
    #[arg(long = "k128")]
    k128: bool,

    /// Mark the tape as using the AY sound chip
    #[arg(long)]
    ay: bool,

    /// Mark the tape as using memory paging
    #[arg(long)]
    paging: bool,

    /// Required model (128, +2, +2A, +3)
    #[arg(long)]
    model: Option<String>,

    /// Stop the tape between inputs on 48K machines
    #[arg(long)]
    multiload: bool,

    /// Put all inputs into a group of this name
    #[arg(long)]
    group: Option<String>,
}

#[derive(Args, Debug)]
struct ListArgs {
    /// TAP file
    input: PathBuf,

    /// Dump block data as hex
    #[arg(short, long)]
    dump: bool,

    /// Write the data blocks to stdout, skipping headers
    #[arg(short, long)]
    raw: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        Command::Basic(args) => run_basic(args),
        Command::Code(args) => run_code(args),
        Command::Tzx(args) => run_tzx(args),
        Command::List(args) => run_list(args),
    }
}

fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

/// Output format for a tape file, or a usage error.
fn output_format(path: &Path) -> Result<OutputFormat, ExitCode> {
    format_from_extension(path).ok_or_else(|| {
        eprintln!("Error: Unknown output format. Use .tap or .tzx extension.");
        ExitCode::from(2)
    })
}

fn container_failure(error: ContainerError) -> ExitCode {
    eprintln!("Error: {}", error);
    ExitCode::from(1)
}

fn run_basic(args: BasicArgs) -> ExitCode {
    let format = match output_format(&args.output) {
        Ok(f) => f,
        Err(code) => return code,
    };

    let source = match std::fs::read_to_string(&args.input) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error: Cannot read {}: {}", args.input.display(), e);
            return ExitCode::from(3);
        }
    };

    let filename = args
        .input
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("<input>");

    let options = TokenizerOptions {
        case_insensitive: args.case_insensitive,
    };
    let program = match tokenize_program(&source, options) {
        Ok(program) => program,
        Err(e) => {
            eprint!("{}", render_report(&e, &source, filename));
            return ExitCode::from(1);
        }
    };

    // Warnings don't prevent the conversion
    for warning in &program.warnings {
        eprint!("{}", format_warning(warning, &source, Some(filename)));
    }

    let name = args.name.unwrap_or_else(|| default_name(&args.input));
    let image = match tap::basic_tap(&name, &program.bytes, args.autostart) {
        Ok(image) => image,
        Err(e) => return container_failure(e),
    };

    if let Err(e) = write_output(&image, &args.output, format, program.requires_128k) {
        return container_failure(e);
    }

    println!(
        "Converted {} -> {} ({} bytes of BASIC)",
        filename,
        args.output.display(),
        program.bytes.len()
    );
    if program.requires_128k {
        println!("Note: the program uses 128K keywords and needs a 128K Spectrum");
    }

    ExitCode::SUCCESS
}

fn run_code(args: CodeArgs) -> ExitCode {
    let format = match output_format(&args.output) {
        Ok(f) => f,
        Err(code) => return code,
    };

    let code = match std::fs::read(&args.input) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: Cannot read {}: {}", args.input.display(), e);
            return ExitCode::from(3);
        }
    };

    let name = args.name.unwrap_or_else(|| default_name(&args.input));
    let result = tap::code_tap(&name, &code, args.address)
        .and_then(|image| write_output(&image, &args.output, format, false));
    if let Err(e) = result {
        return container_failure(e);
    }

    println!(
        "Converted {} -> {} ({} bytes at {})",
        args.input.display(),
        args.output.display(),
        code.len(),
        args.address
    );
    ExitCode::SUCCESS
}

fn run_tzx(args: TzxArgs) -> ExitCode {
    if args.config.is_none() && args.inputs.is_empty() {
        eprintln!("Error: No inputs. Give TAP files or use --config <layout.toml>");
        return ExitCode::from(2);
    }

    let archive = ArchiveInfo {
        title: args.title.clone(),
        author: args.author.clone(),
        year: args.year.clone(),
    };
    let hardware = HardwareInfo {
        requires_128k: args.k128,
        uses_ay: args.ay,
        uses_paging: args.paging,
        model: args.model.as_deref().map(Model::from_name),
    };

    let built = match &args.config {
        Some(path) => TzxConfig::load(path).and_then(|mut config| {
            merge_command_line(&mut config, &archive, &hardware);
            config.build()
        }),
        None => {
            let inputs: Vec<&Path> = args.inputs.iter().map(PathBuf::as_path).collect();
            let layout = InputLayout {
                pause: args.pause,
                archive,
                hardware,
                multiload: args.multiload,
                group: args.group.clone(),
            };
            build_from_inputs(&inputs, &layout)
        }
    };

    let builder = match built {
        Ok(builder) => builder,
        Err(ContainerError::Io { path, source }) => {
            eprintln!("Error: Cannot read {}: {}", path, source);
            return ExitCode::from(3);
        }
        Err(e) => return container_failure(e),
    };

    if let Err(e) = builder.write(&args.output) {
        return container_failure(e);
    }

    info!(blocks = builder.len(), "built TZX image");
    println!(
        "Wrote {} ({} blocks)",
        args.output.display(),
        builder.len()
    );
    ExitCode::SUCCESS
}

/// Command line metadata and hardware flags win over the layout file.
fn merge_command_line(config: &mut TzxConfig, archive: &ArchiveInfo, hardware: &HardwareInfo) {
    let metadata = &mut config.metadata;
    for (slot, value) in [
        (&mut metadata.title, &archive.title),
        (&mut metadata.author, &archive.author),
        (&mut metadata.year, &archive.year),
    ] {
        if value.is_some() {
            slot.clone_from(value);
        }
    }

    let settings = &mut config.hardware;
    settings.k128_only |= hardware.requires_128k;
    settings.use_ay |= hardware.uses_ay;
    settings.use_paging |= hardware.uses_paging;
    if let Some(model) = hardware.model {
        settings.model = Some(model.name().to_string());
    }
}

fn run_list(args: ListArgs) -> ExitCode {
    let bytes = match std::fs::read(&args.input) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Error: Cannot read {}: {}", args.input.display(), e);
            return ExitCode::from(3);
        }
    };

    let blocks = match tap::parse_tap(&bytes) {
        Ok(blocks) => blocks,
        Err(e) => return container_failure(e),
    };

    if args.raw {
        let mut stdout = std::io::stdout().lock();
        for block in blocks.iter().filter(|b| !b.is_header()) {
            if let Err(e) = stdout.write_all(&block.data) {
                eprintln!("Error: Cannot write to stdout: {}", e);
                return ExitCode::from(1);
            }
        }
        return ExitCode::SUCCESS;
    }

    println!("Found {} blocks in {}", blocks.len(), args.input.display());
    for (index, block) in blocks.iter().enumerate() {
        println!();
        println!("Block {}:", index);
        println!("  Length: {}", block.length());
        println!(
            "  Flag: 0x{:02X} ({})",
            block.flag,
            if block.is_header() { "Header" } else { "Data" }
        );
        if let Some(header) = &block.header {
            println!("  Header Information:");
            println!(
                "    Type: {} ({})",
                header.block_type,
                header.kind().map(|k| k.name()).unwrap_or("Unknown")
            );
            println!("    Filename: {}", header.name_str());
            println!("    Data Length: {}", header.data_length);
            println!("    Param1: {}", header.param1);
            println!("    Param2: {}", header.param2);
        }
        println!(
            "  Checksum: 0x{:02X}{}",
            block.checksum,
            if block.is_valid() { "" } else { " (invalid)" }
        );
        println!("  Data Length: {} bytes", block.data.len());

        if args.dump {
            println!("  Data:");
            for line in hex_lines(&block.data) {
                println!("    {}", line);
            }
        }
    }

    ExitCode::SUCCESS
}
