// ABOUTME: Main entry point for the vocab-slides program.
// ABOUTME: Provides CLI interface and executes commands from the library.

use clap::{Args, Parser, Subcommand};
use std::io::BufRead;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a vocabulary deck from a word list
    Generate(GenerateArgs),
}

#[derive(Args)]
struct GenerateArgs {
    /// Path to the vocabulary CSV file
    #[arg(short, long, default_value = "example_vocab.csv")]
    input: PathBuf,

    /// Path to the one-slide template deck
    #[arg(short, long, default_value = "template.pptx")]
    template: PathBuf,

    /// Path for the generated deck
    #[arg(short, long, default_value = "Mandarin_Vocabulary_PPT.pptx")]
    output: PathBuf,

    /// Read vocabulary from stdin instead of a file (finish with 'done')
    #[arg(long)]
    paste: bool,

    /// Directory where media assets are staged
    #[arg(long)]
    media_dir: Option<PathBuf>,

    /// Image used when search finds nothing
    #[arg(long)]
    fallback_image: Option<PathBuf>,

    /// Skip automatic translation of entries without one
    #[arg(long)]
    no_translate: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let result = match &cli.command {
        Some(Commands::Generate(args)) => run_generate(args),
        None => {
            println!("No command specified. Use --help for usage information.");
            Ok(())
        }
    };

    match result {
        Ok(()) => Ok(()),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn run_generate(args: &GenerateArgs) -> vocab::Result<()> {
    println!("Executing generate command...");

    let mut config = vocab::Config::from_env();
    if let Some(media_dir) = &args.media_dir {
        config.media_dir = media_dir.clone();
    }
    if let Some(fallback) = &args.fallback_image {
        config.fallback_image = Some(fallback.clone());
    }
    if args.no_translate {
        config.auto_translate = false;
    }

    let entries = if args.paste {
        println!("Paste vocabulary lines (source,translation), then type 'done':");
        let stdin = std::io::stdin();
        let mut lines = Vec::new();
        for line in stdin.lock().lines() {
            let line = line?;
            if vocab::is_end_sentinel(&line) {
                break;
            }
            lines.push(line);
        }
        vocab::parse_vocab_lines(lines)
    } else {
        vocab::read_vocab_csv(&args.input)?
    };

    let report = vocab::generate_deck(entries, &args.template, &args.output, &config)?;
    println!(
        "Deck generated successfully: {:?} ({} slides)",
        report.output_path, report.slides
    );
    Ok(())
}
