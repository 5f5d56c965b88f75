use std::{
    fs::read_to_string,
    path::{Path, PathBuf},
    process::ExitCode,
    rc::Rc,
    time::Instant,
};

use clap::{Parser, Subcommand};
use sigh::{
    errors::errors::Diagnostic,
    interpreter::interpreter::interpret,
    lexer::lexer::tokenize,
    parser::parser::parse,
    render_error,
    type_checker::type_checker::resolve,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sigh", version, about = "Checks and runs Sigh programs")]
struct Cli {
    /// Print the time spent in each phase to stderr
    #[arg(long, global = true)]
    timings: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a program and run it
    Run { file: PathBuf },
    /// Check a program without running it
    Check { file: PathBuf },
    /// Print the tokens of a program
    Tokens { file: PathBuf },
}

struct Source {
    name: String,
    contents: String,
}

impl Source {
    fn read(path: &Path) -> Result<Self, String> {
        let contents = read_to_string(path).map_err(|error| format!("could not read {}: {}", path.display(), error))?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Source { name, contents })
    }

    fn report(&self, error: &dyn Diagnostic) {
        eprint!("{}", render_error(error, &self.contents));
    }
}

struct Timer {
    enabled: bool,
    start: Instant,
}

impl Timer {
    fn phase(&mut self, name: &str) {
        if self.enabled {
            eprintln!("{} in {:?}", name, self.start.elapsed());
        }
        self.start = Instant::now();
    }
}

fn main() -> ExitCode {
    if let Ok(filter) = EnvFilter::try_from_env("SIGH_LOG") {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
        tracing::debug!("tracing initialized");
    }

    let cli = Cli::parse();

    let file = match &cli.command {
        Commands::Run { file } | Commands::Check { file } | Commands::Tokens { file } => file,
    };

    let source = match Source::read(file) {
        Ok(source) => source,
        Err(message) => {
            eprintln!("Error: {}", message);
            return ExitCode::FAILURE;
        }
    };

    let total = Instant::now();
    let mut timer = Timer {
        enabled: cli.timings,
        start: Instant::now(),
    };

    let tokens = match tokenize(source.contents.clone(), Some(source.name.clone())) {
        Ok(tokens) => tokens,
        Err(error) => {
            source.report(&error);
            return ExitCode::FAILURE;
        }
    };
    timer.phase("Tokenized");

    if matches!(cli.command, Commands::Tokens { .. }) {
        for token in &tokens {
            println!("{:?} {}", token.kind, token);
        }
        return ExitCode::SUCCESS;
    }

    let program = match parse(tokens, Rc::new(source.name.clone())) {
        Ok(program) => program,
        Err(error) => {
            source.report(&error);
            return ExitCode::FAILURE;
        }
    };
    timer.phase("Parsed");

    let annotations = match resolve(&program) {
        Ok(annotations) => annotations,
        Err(errors) => {
            for error in &errors {
                source.report(error);
            }
            eprintln!("{} semantic error(s)", errors.len());
            return ExitCode::FAILURE;
        }
    };
    timer.phase("Type checked");

    if matches!(cli.command, Commands::Check { .. }) {
        return ExitCode::SUCCESS;
    }

    let result = interpret(&program, &annotations);
    timer.phase("Interpreted");

    if cli.timings {
        eprintln!("Total time: {:?}", total.elapsed());
    }

    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(error) => {
            source.report(&error);
            ExitCode::FAILURE
        }
    }
}
