use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{CommandFactory, Parser};
use owo_colors::OwoColorize;
use paperfold_core::{
    ArticleRecord, Conversion, Converter, ConverterConfig, ExtractionMode, StateStore, extract_shared_url, fetch_file,
    fetch_stdin, render_reading_view,
};
use tracing_subscriber::EnvFilter;

mod args;
mod echo;

use args::{Args, Engine};
use echo::{print_article_details, print_banner, print_history, print_info, print_step, print_success, print_warning};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable consulted for the API key when `--api-key` is absent.
const API_KEY_ENV: &str = "PAPERFOLD_API_KEY";

impl From<Engine> for ExtractionMode {
    fn from(engine: Engine) -> Self {
        match engine {
            Engine::Local => ExtractionMode::Local,
            Engine::Ai => ExtractionMode::Remote,
        }
    }
}

/// Where the article comes from
enum Input {
    Url(String),
    Html { html: String, label: String },
    Pdf { bytes: Vec<u8>, filename: String },
}

impl Input {
    fn resolve(input: &str) -> anyhow::Result<Self> {
        if input == "-" {
            let html = fetch_stdin().context("Failed to read from stdin")?;
            return Ok(Self::Html { html, label: "stdin".to_string() });
        }

        let path = Path::new(input);
        if !path.exists()
            && let Some(url) = extract_shared_url(input)
        {
            return Ok(Self::Url(url));
        }

        let bytes = fetch_file(path).with_context(|| format!("Failed to read file: {}", input))?;
        let is_pdf = path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("pdf")) || bytes.starts_with(b"%PDF");
        if is_pdf {
            let filename = path.file_name().map(|name| name.to_string_lossy().into_owned()).unwrap_or_default();
            Ok(Self::Pdf { bytes, filename })
        } else {
            Ok(Self::Html { html: String::from_utf8_lossy(&bytes).into_owned(), label: input.to_string() })
        }
    }

    fn describe(&self) -> String {
        match self {
            Input::Url(url) => format!("Fetching {}", url.bright_white().underline()),
            Input::Html { label, .. } => format!("Reading HTML from {}", label.bright_white()),
            Input::Pdf { filename, .. } => format!("Reading PDF {}", filename.bright_white()),
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose { "warn,paperfold_core=info" } else { "warn" };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// `output` itself, `output/<default_name>` for directories, or `./<default_name>`
fn output_path(output: Option<&Path>, default_name: &str) -> PathBuf {
    match output {
        Some(path) if path.is_dir() => path.join(default_name),
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(default_name),
    }
}

fn write_output(path: &Path, contents: &[u8]) -> anyhow::Result<()> {
    fs::write(path, contents).with_context(|| format!("Failed to write to file: {}", path.display()))?;
    print_success(&format!("Saved {}", path.display().bright_white()));
    Ok(())
}

/// Handles the history and key flags. Returns true when there is nothing left to do.
fn manage_state(args: &Args, store: &StateStore) -> anyhow::Result<bool> {
    if args.clear_history {
        store.clear_history().context("Failed to clear history")?;
        print_success("History cleared");
    }

    if args.save_key {
        let key = args.api_key.as_deref().unwrap_or_default();
        store.save_credential(key).context("Failed to save API key")?;
        if key.trim().is_empty() {
            print_success("Saved API key removed");
        } else {
            print_success("API key saved");
        }
    }

    if args.history {
        print_history(&store.history().context("Failed to read history")?);
    }

    Ok(args.input.is_none())
}

/// Adds URL inputs to history; other inputs have no address to return to.
fn record_history(store: &StateStore, input: &Input, title: &str, verbose: bool) {
    let Input::Url(url) = input else { return };
    match store.record(title, url) {
        Ok(_) => {
            if verbose {
                print_info("Added to history");
            }
        }
        Err(err) => print_warning(&format!("Could not update history: {}", err)),
    }
}

async fn read(converter: &Converter, input: &Input) -> anyhow::Result<ArticleRecord> {
    Ok(match input {
        Input::Url(url) => converter.read_url(url).await?,
        Input::Html { html, .. } => converter.read_html(html, None).await?,
        Input::Pdf { .. } => bail!("Reading mode is only available for web pages"),
    })
}

async fn convert(converter: &Converter, input: &Input) -> anyhow::Result<Conversion> {
    Ok(match input {
        Input::Url(url) => converter.convert_url(url).await?,
        Input::Html { html, .. } => converter.convert_html(html, None).await?,
        Input::Pdf { bytes, filename } => converter.convert_pdf(bytes, filename).await?,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if let Some(shell) = args.completions {
        clap_complete::generate(shell, &mut Args::command(), "paperfold", &mut io::stdout());
        return Ok(());
    }

    init_tracing(args.verbose);

    let data_dir = args
        .data_dir
        .clone()
        .or_else(StateStore::default_root)
        .context("Could not determine a data directory; pass --data-dir")?;
    let store = StateStore::new(data_dir);
    tracing::debug!(root = %store.root().display(), "using data directory");

    if manage_state(&args, &store)? {
        return Ok(());
    }
    let Some(raw_input) = args.input.as_deref() else {
        return Ok(());
    };

    if args.verbose {
        print_banner();
    }

    let api_key = match args.api_key.clone().or_else(|| env::var(API_KEY_ENV).ok()) {
        Some(key) => Some(key),
        None => store.credential().context("Failed to read saved API key")?,
    };

    let mut builder = ConverterConfig::builder()
        .mode(args.engine.into())
        .api_key(api_key)
        .timeout(args.timeout);
    if let Some(model) = &args.model {
        builder = builder.model(model.as_str());
    }
    if let Some(relay) = &args.relay {
        builder = builder.relay_url(relay.as_str());
    }
    let converter = Converter::new(builder.build());

    let total = 3;
    let input = Input::resolve(raw_input)?;
    if args.verbose {
        print_step(1, total, &input.describe());
    }

    if args.read {
        if args.verbose {
            print_step(2, total, "Extracting article");
        }
        let article = read(&converter, &input).await?;
        if args.verbose {
            print_article_details(&article);
            print_step(3, total, "Writing reading view");
        }
        let path = output_path(args.output.as_deref(), &format!("{}.html", article.file_stem()));
        write_output(&path, render_reading_view(&article).as_bytes())?;
        record_history(&store, &input, &article.title, args.verbose);
        return Ok(());
    }

    if args.verbose {
        print_step(2, total, "Extracting article and generating PDF");
    }
    let conversion = convert(&converter, &input).await?;
    if args.verbose {
        print_article_details(&conversion.article);
        print_step(3, total, "Writing PDF");
    }

    let path = output_path(args.output.as_deref(), &conversion.filename);
    write_output(&path, &conversion.pdf)?;

    record_history(&store, &input, &conversion.article.title, args.verbose);

    Ok(())
}
