use pauta_core::config::RunConfig;
use pauta_core::error::PautaError;
use pauta_core::worker::{Worker, WorkerEvent};
use pauta_core::{save_artifact, Artifact, Backends, Job, OutputKind};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use super::CommandError;

pub fn spreadsheet(
    pdf_file: PathBuf,
    config: RunConfig,
    output: Option<PathBuf>,
    yes: bool,
) -> Result<(), CommandError> {
    run(pdf_file, OutputKind::Spreadsheet, config, output, yes)
}

pub fn document(
    pdf_file: PathBuf,
    config: RunConfig,
    output: Option<PathBuf>,
    yes: bool,
) -> Result<(), CommandError> {
    run(pdf_file, OutputKind::Document, config, output, yes)
}

fn run(
    pdf_file: PathBuf,
    kind: OutputKind,
    config: RunConfig,
    output: Option<PathBuf>,
    yes: bool,
) -> Result<(), CommandError> {
    let worker = Worker::new(Backends::poppler());
    let events = worker.submit(Job {
        pdf_path: pdf_file.clone(),
        kind,
        config,
    })?;
    eprintln!("Processing {}...", pdf_file.display());

    let artifact = match events.recv() {
        Ok(WorkerEvent::Finished(artifact)) => artifact,
        Ok(WorkerEvent::Failed { kind, message }) => {
            return Err(CommandError::Job { kind, message })
        }
        Err(_) => {
            return Err(PautaError::Extraction("worker stopped without reporting".into()).into())
        }
    };

    let destination = match output {
        Some(path) => Some(path),
        None if yes => Some(PathBuf::from(&artifact.suggested_name)),
        None => ask_destination(&artifact)?,
    };
    let written = save_artifact(&artifact, destination.as_deref())?;
    eprintln!("{} written to {}", artifact.kind, written.display());
    Ok(())
}

/// Offer the suggested name on stdin. Empty accepts it, `n` declines.
fn ask_destination(artifact: &Artifact) -> Result<Option<PathBuf>, CommandError> {
    eprint!("Save {} as [{}] (n to cancel): ", artifact.kind, artifact.suggested_name);
    io::stderr().flush()?;

    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer)? == 0 {
        return Ok(None);
    }
    Ok(parse_answer(&answer, &artifact.suggested_name))
}

fn parse_answer(answer: &str, suggested: &str) -> Option<PathBuf> {
    match answer.trim() {
        "" => Some(PathBuf::from(suggested)),
        "n" | "N" => None,
        path => Some(PathBuf::from(path)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_answer() {
        let suggested = "07_03_2025 - Pauta plenário.docx";
        assert_eq!(parse_answer("\n", suggested), Some(PathBuf::from(suggested)));
        assert_eq!(parse_answer("n\n", suggested), None);
        assert_eq!(
            parse_answer("saida.docx\n", suggested),
            Some(PathBuf::from("saida.docx"))
        );
    }
}
