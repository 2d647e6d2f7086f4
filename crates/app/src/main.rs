use std::future::Future;
use std::io;

use clap::Parser;
use glyphfix_ocr::{
    ImageSource, OcrBackend, OcrPipeline, PipelineError, ResultPresenter, TempArtifactCleaner,
};
use tracing_subscriber::EnvFilter;

mod cli;

use cli::Cli;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if !e.use_stderr() => {
            // --help / --version
            let _ = e.print();
            std::process::exit(0);
        }
        Err(e) => std::process::exit(i32::from(reject_command_line(&e))),
    };
    init_tracing(cli.verbose);

    let presenter = ResultPresenter::new(cli.output_format(), cli.source_path.as_deref());
    let pipeline = OcrPipeline::new(backend(&cli), cli.ocr_options());

    let envelope = if cli.list_langs {
        let outcome = interruptible(move || pipeline.available_languages()).await;
        presenter.languages_envelope(&outcome)
    } else {
        let source = ImageSource::new(cli.transport());
        tracing::debug!(transport = %source.transport().kind(), "reading image");
        let outcome = interruptible(move || pipeline.run(&source, io::stdin().lock())).await;
        presenter.envelope(&outcome)
    };

    let code = presenter.emit(&envelope, &mut io::stdout().lock(), &mut io::stderr().lock());

    // Best-effort: the result above is final whatever happens here.
    if cli.cleanup {
        TempArtifactCleaner::default().clean(cli.source_path.as_deref());
    }

    // Exit directly: a recognizer still blocked after an interrupt must not
    // hold the runtime open.
    std::process::exit(i32::from(code));
}

/// Report a malformed command line in the same shapes as any other failure.
fn reject_command_line(e: &clap::Error) -> u8 {
    let format = cli::fallback_format(std::env::args_os());
    let source_path = std::env::var("FILE_PATH").ok();
    let presenter = ResultPresenter::new(format, source_path.as_deref());
    let envelope = presenter.envelope(&Err(PipelineError::Usage(cli::usage_message(e))));
    presenter.emit(&envelope, &mut io::stdout().lock(), &mut io::stderr().lock())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("glyphfix=debug,glyphfix_ocr=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("off"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

#[cfg(feature = "tesseract")]
fn backend(cli: &Cli) -> Box<dyn OcrBackend> {
    use glyphfix_ocr::recognizer::tesseract_backend::TesseractRecognizer;
    let data_path = cli.tessdata_dir.as_ref().map(|p| p.display().to_string());
    Box::new(TesseractRecognizer::new(data_path))
}

#[cfg(not(feature = "tesseract"))]
fn backend(cli: &Cli) -> Box<dyn OcrBackend> {
    Box::new(glyphfix_ocr::TesseractCli::new(&cli.tesseract, cli.tessdata_dir.clone()))
}

/// Run a blocking job, giving up with `Interrupted` on Ctrl-C.
async fn interruptible<T, F>(job: F) -> Result<T, PipelineError>
where
    F: FnOnce() -> Result<T, PipelineError> + Send + 'static,
    T: Send + 'static,
{
    interruptible_until(job, tokio::signal::ctrl_c()).await
}

/// A `signal` that resolves to an error (no handler could be installed)
/// never interrupts; the job then runs to completion.
async fn interruptible_until<T, F, S>(job: F, signal: S) -> Result<T, PipelineError>
where
    F: FnOnce() -> Result<T, PipelineError> + Send + 'static,
    T: Send + 'static,
    S: Future<Output = io::Result<()>>,
{
    let task = tokio::task::spawn_blocking(job);
    tokio::select! {
        joined = task => joined.unwrap_or_else(|e| Err(PipelineError::Unexpected(e.to_string()))),
        Ok(()) = signal => {
            tracing::debug!("interrupted");
            Err(PipelineError::Interrupted)
        }
    }
}
