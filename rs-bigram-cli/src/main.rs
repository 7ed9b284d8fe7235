mod config;

use std::path::PathBuf;

use clap::Parser;
use log::info;
use rs_bigram_core::MarkovError;
use rs_bigram_core::io;
use rs_bigram_core::model::generation_input::GenerationInput;
use rs_bigram_core::model::generator::TextGenerator;
use rs_bigram_core::model::index_source::{IndexSource, RandomSource, ReplaySource};

use config::Settings;

/// Token cap applied to replay runs that leave `max_tokens` unbounded.
const REPLAY_MAX_TOKENS: usize = 200;

/// Bigram text generator
#[derive(Parser, Debug)]
#[command(name = "rs-bigram")]
#[command(about = "Generate text from a bigram chain trained on example sentences")]
struct Args {
    /// TOML settings file (flags override its values)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Training file, or directory of training files [default: data]
    #[arg(long, short = 'i')]
    input: Option<String>,

    /// Extension of the files to load when the input is a directory [default: txt]
    #[arg(long)]
    extension: Option<String>,

    /// CSV column holding the text (whole lines are used when omitted)
    #[arg(long)]
    column: Option<usize>,

    /// Number of texts to generate [default: 10]
    #[arg(long, short = 'n')]
    count: Option<usize>,

    /// Random seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Maximum number of tokens per text (0 = unbounded, or 200 with --replay)
    #[arg(long)]
    max_tokens: Option<usize>,

    /// Number of retries when a text repeats a training sentence
    #[arg(long)]
    nb_try: Option<usize>,

    /// Replay these comma-separated indices instead of sampling randomly
    #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
    replay: Option<Vec<i64>>,

    /// Print the indices whose replay generates this text, then exit
    #[arg(long)]
    explain: Option<String>,

    /// Print the trained chain
    #[arg(long)]
    dump: bool,

    /// Enable debug logging
    #[arg(long, short = 'v')]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // RUST_LOG still wins over the verbosity flag
    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    let settings = match &args.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };

    let input = args.input.or(settings.input).unwrap_or_else(|| "data".to_owned());
    let extension = args.extension.or(settings.extension).unwrap_or_else(|| "txt".to_owned());
    let column = args.column.or(settings.column);
    let count = args.count.or(settings.count).unwrap_or(10);

    let mut generation = settings.generation;
    if let Some(max_tokens) = args.max_tokens {
        generation.set_max_tokens(max_tokens)?;
    }
    if let Some(nb_try) = args.nb_try {
        generation.nb_try = nb_try;
    }

    let generator = load_generator(&input, &extension, column)?;
    info!(
        "Loaded '{}': {} start tokens, {} words",
        input,
        generator.chain().start_tokens().total(),
        generator.chain().words().count()
    );

    if args.dump {
        print!("{}", generator.chain());
    }

    // Explain mode: show how to reproduce a given text
    if let Some(text) = &args.explain {
        let choices = generator.chain().find_walk_choices(&io::tokenize(text))?;
        let choices: Vec<String> = choices.iter().map(ToString::to_string).collect();
        println!("{}", choices.join(","));
        return Ok(());
    }

    match args.replay {
        Some(values) => {
            let mut source = ReplaySource::new(values)?;
            let generation = replay_generation(generation)?;
            print_texts(&generator, &generation, count, &mut source)?;
        }
        None => {
            // Print the seed so a random run can be reproduced
            let seed = args.seed.or(settings.seed).unwrap_or_else(|| rand::random());
            info!("Using seed {}", seed);
            let mut source = RandomSource::seeded(seed);
            print_texts(&generator, &generation, count, &mut source)?;
        }
    }

    Ok(())
}

/// Trains on a single file, or on every matching file of a directory.
fn load_generator(input: &str, extension: &str, column: Option<usize>) -> Result<TextGenerator, MarkovError> {
    let path = io::normalize_folder(input);
    if path.is_dir() {
        TextGenerator::from_folder(&path, extension, column)
    } else {
        TextGenerator::from_file(&path, column)
    }
}

/// A replay script repeats cyclically, so it can keep a walk looping forever:
/// replay runs are always capped.
fn replay_generation(mut generation: GenerationInput) -> Result<GenerationInput, MarkovError> {
    if generation.max_tokens() == 0 {
        info!("Capping replayed texts at {} tokens", REPLAY_MAX_TOKENS);
        generation.set_max_tokens(REPLAY_MAX_TOKENS)?;
    }
    Ok(generation)
}

fn print_texts<S: IndexSource>(
    generator: &TextGenerator,
    generation: &GenerationInput,
    count: usize,
    source: &mut S,
) -> Result<(), MarkovError> {
    for _ in 0..count {
        println!("{}", generator.predict(generation, source)?);
    }
    Ok(())
}
