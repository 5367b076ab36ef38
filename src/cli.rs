use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::error::Result;
use crate::input::read_input;
use crate::pileup::{Pileup, PileupOptions};
use crate::render::Symbols;
use crate::score::{read_pair, score, ScoreReport};

#[derive(Parser, Debug)]
#[command(name = "cigarpad", version, about = "Column-aligned rendering of =/X/I/D edit scripts")]
pub struct Cli {
    /// Log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render a reference and its reads as an aligned pileup
    Decode(DecodeArgs),
    /// Score a two-haplotype answer against a truth pair
    Score(ScoreArgs),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Reference line followed by `<orientation> <offset> <edit-script>` lines
    pub input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Number of threads
    #[arg(short, long, default_value_t = 1)]
    pub threads: usize,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Pads insertions shorter than their column
    #[arg(long, default_value_t = '=', value_parser = parse_symbol)]
    pub filler: char,

    /// Marks deletions and insertion columns a read does not use
    #[arg(long, default_value_t = '-', value_parser = parse_symbol)]
    pub gap: char,
}

#[derive(Args, Debug)]
pub struct ScoreArgs {
    /// Truth haplotypes, one per line (`-` and `X` allowed)
    pub truth: PathBuf,

    /// Answer haplotypes, one per line (ACGT only)
    pub answer: PathBuf,

    /// Only score the two direct haplotype assignments
    #[arg(long)]
    pub no_switch: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

fn parse_symbol(s: &str) -> std::result::Result<char, String> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii() && !c.is_ascii_control() => Ok(c),
        _ => Err(format!("expected a single printable ASCII character, got '{}'", s)),
    }
}

pub fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Command::Decode(args) => {
            // An existing output file is only replaced once the whole pileup rendered
            let mut rendered = Vec::new();
            run_decode(args, &mut rendered)?;
            let mut out = open_output(args.output.as_deref())?;
            out.write_all(&rendered)?;
            out.flush()?;
        }
        Command::Score(args) => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            run_score(args, &mut out)?;
        }
    }
    Ok(())
}

fn open_output(path: Option<&Path>) -> io::Result<Box<dyn Write>> {
    Ok(match path {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout())),
    })
}

/// Nothing is written unless every read renders
pub fn run_decode(args: &DecodeArgs, out: &mut dyn Write) -> Result<()> {
    let alignment = read_input(&args.input)?;
    log::info!(
        "Loaded reference of {} bases and {} reads from {}",
        alignment.reference.len(),
        alignment.reads.len(),
        args.input.display()
    );

    let options = PileupOptions {
        threads: args.threads,
        symbols: Symbols {
            gap: args.gap as u8,
            filler: args.filler as u8,
            ..Symbols::default()
        },
    };
    let pileup = Pileup::build(&alignment.reference, &alignment.reads, &options)?;

    match args.format {
        OutputFormat::Text => {
            for line in pileup.lines() {
                writeln!(out, "{}", line)?;
            }
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, &pileup)?;
            writeln!(out)?;
        }
    }
    Ok(())
}

pub fn run_score(args: &ScoreArgs, out: &mut dyn Write) -> Result<()> {
    let truth = read_pair(&args.truth)?;
    let answer = read_pair(&args.answer)?;
    let report = score(&truth, &answer, !args.no_switch)?;

    match args.format {
        OutputFormat::Text => write_score_text(&report, out)?,
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, &report)?;
            writeln!(out)?;
        }
    }
    Ok(())
}

fn write_score_text(report: &ScoreReport, out: &mut dyn Write) -> io::Result<()> {
    match report.raw_score {
        Some(raw) => writeln!(out, "raw_score: {}", raw)?,
        None => writeln!(out, "raw_score: unscorable")?,
    }
    writeln!(out, "final_score (raw_score / 100): {}", report.final_score)
}
