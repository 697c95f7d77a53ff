//! `cvgen` command-line entry point.
//!
//! # Responsibility
//! - Map `compile` / `generate` onto core use-cases.
//! - Print one result line and exit 0 on success, 1 on any failure.

mod args;

use args::{Command, USAGE};
use cvgen_core::repo::write_atomic;
use cvgen_core::{
    default_log_level, init_logging, CompilePipeline, CompileRequest, DocumentRepository,
    FileDocumentRepository, LatexTypesetter, MarkupGenerator, WorkspaceConfig,
};
use log::info;
use std::path::Path;
use std::process::ExitCode;

const LOG_DIR_ENV: &str = "CVGEN_LOG_DIR";

fn main() -> ExitCode {
    start_logging();

    let command = match args::parse(std::env::args().skip(1)) {
        Ok(command) => command,
        Err(err) => {
            eprintln!("error: {err}\n\n{USAGE}");
            return ExitCode::FAILURE;
        }
    };

    let result = match command {
        Command::Help => {
            println!("{USAGE}");
            return ExitCode::SUCCESS;
        }
        Command::Compile { document, output } => compile(&document, output),
        Command::Generate {
            document,
            template,
            output,
        } => generate(&document, &template, &output),
    };

    match result {
        Ok(message) => {
            println!("{message}");
            ExitCode::SUCCESS
        }
        Err(message) => {
            println!("{message}");
            ExitCode::FAILURE
        }
    }
}

fn compile(document: &Path, output: String) -> Result<String, String> {
    let config = WorkspaceConfig::from_env().map_err(|err| err.to_string())?;
    let pipeline = CompilePipeline::new(
        config.pipeline_settings(),
        Box::new(LatexTypesetter::new(config.engine.as_str())),
    );
    let outcome = pipeline.run(&CompileRequest::new(document, output));
    info!(
        "event=cli_compile module=cli status={} job_id={}",
        if outcome.ok { "ok" } else { "error" },
        outcome.job_id
    );
    match (outcome.ok, outcome.artifact) {
        (true, Some(artifact)) => Ok(format!("{}: {}", outcome.message, artifact.display())),
        (true, None) => Ok(outcome.message),
        (false, _) => Err(outcome.message),
    }
}

fn generate(document: &Path, template: &str, output: &Path) -> Result<String, String> {
    let render = || -> Result<(), Box<dyn std::error::Error>> {
        let document = FileDocumentRepository::new(document).load()?;
        let markup = MarkupGenerator::new(template).generate(&document)?;
        write_atomic(output, markup.to_latex().as_bytes())?;
        Ok(())
    };
    render().map_err(|err| format!("Error generating resume: {err}"))?;
    Ok(format!("LaTeX resume generated: {}", output.display()))
}

fn start_logging() {
    let Ok(dir) = std::env::var(LOG_DIR_ENV) else {
        return;
    };
    if let Err(err) = init_logging(default_log_level(), &dir) {
        eprintln!("warning: logging disabled: {err}");
    }
}
