use std::{
    fs,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use bert_embeddings::{
    overrides::{apply_overrides, ConfigOverride},
    sentences_from_lines,
};
use clap::{Parser, Subcommand};
use embedding::{select_device, CandleBertLoader};
use model::{
    resources::{DEFAULT_LANG, DEFAULT_MODEL_NAME, DEFAULT_REMOTE_LOC},
    word_embedding_annotations, BertEmbeddings, EmbeddingsConfig, LocalCacheFetcher,
    ResourceFetcher, ResourceRequest,
};
use tracing_subscriber::EnvFilter;

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    if let Err(err) = run() {
        eprintln!("bert-embed failed: {err:#}");
        std::process::exit(1);
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "BERT word embeddings CLI", long_about = None)]
struct Args {
    #[arg(long, global = true, help = "Run inference on the CPU even if a GPU is available")]
    cpu: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import an exported BERT folder and save it as a model directory.
    Import {
        #[arg(long, value_name = "DIR", help = "Folder holding vocab.txt, config.json and model.safetensors")]
        folder: PathBuf,

        #[arg(short, long, value_name = "DIR", help = "Destination model directory")]
        output: PathBuf,

        #[command(flatten)]
        settings: SettingsArgs,
    },
    /// Resolve a named pretrained model and save it as a model directory.
    Pretrained {
        #[arg(long, default_value = DEFAULT_MODEL_NAME)]
        name: String,

        #[arg(long, default_value = DEFAULT_LANG)]
        lang: String,

        #[arg(long, default_value = DEFAULT_REMOTE_LOC)]
        remote_loc: String,

        #[arg(long, value_name = "DIR", help = "Local resource cache root")]
        cache: Option<PathBuf>,

        #[arg(short, long, value_name = "DIR", help = "Destination model directory")]
        output: PathBuf,

        #[command(flatten)]
        settings: SettingsArgs,
    },
    /// Embed every non-blank input line as one sentence, writing JSON lines.
    Embed {
        #[arg(short, long, value_name = "DIR", help = "Model directory written by import")]
        model: PathBuf,

        #[arg(short, long, value_name = "PATH", help = "Input text file (stdin if omitted)")]
        input: Option<PathBuf>,

        #[arg(short, long, value_name = "PATH", help = "Output file (stdout if omitted)")]
        output: Option<PathBuf>,
    },
}

#[derive(clap::Args, Debug)]
struct SettingsArgs {
    #[arg(short, long, value_name = "PATH", help = "Embeddings config file (.toml or .json)")]
    config: Option<PathBuf>,

    #[arg(
        long = "override",
        value_name = "KEY=VALUE",
        help = "Override a configuration value using a dot-separated path"
    )]
    overrides: Vec<ConfigOverride>,
}

impl SettingsArgs {
    fn resolve(&self) -> Result<EmbeddingsConfig> {
        let config = match &self.config {
            Some(path) => EmbeddingsConfig::from_path(path)
                .with_context(|| format!("failed to read config {}", path.display()))?,
            None => EmbeddingsConfig::default(),
        };
        Ok(apply_overrides(config, &self.overrides)?)
    }
}

fn run() -> Result<()> {
    let args = Args::parse();
    let loader = CandleBertLoader::new(select_device(args.cpu));

    match args.command {
        Command::Import {
            folder,
            output,
            settings,
        } => {
            let model = BertEmbeddings::load_saved_model(&folder, settings.resolve()?, &loader)
                .with_context(|| format!("failed to import {}", folder.display()))?;
            save(&model, &output)
        }
        Command::Pretrained {
            name,
            lang,
            remote_loc,
            cache,
            output,
            settings,
        } => {
            let request = ResourceRequest::new(name)
                .with_lang(lang)
                .with_remote_loc(remote_loc);
            let fetcher = fetcher(cache)?;
            let model =
                BertEmbeddings::pretrained(fetcher.as_ref(), &request, settings.resolve()?, &loader)
                    .with_context(|| format!("failed to load pretrained {}", request.cache_key()))?;
            save(&model, &output)
        }
        Command::Embed {
            model,
            input,
            output,
        } => embed(&model, input.as_deref(), output.as_deref(), &loader),
    }
}

fn fetcher(cache: Option<PathBuf>) -> Result<Box<dyn ResourceFetcher>> {
    if let Some(root) = cache {
        return Ok(Box::new(LocalCacheFetcher::new(root)));
    }
    #[cfg(feature = "hub")]
    {
        Ok(Box::new(model::HubFetcher::new()?))
    }
    #[cfg(not(feature = "hub"))]
    {
        bail!("--cache is required when built without the `hub` feature")
    }
}

fn save(model: &BertEmbeddings, output: &Path) -> Result<()> {
    let metadata = model
        .save(output)
        .with_context(|| format!("failed to save model to {}", output.display()))?;
    println!(
        "saved model with {} vocabulary entries to {}",
        metadata.vocab_size,
        output.display()
    );
    Ok(())
}

fn embed(
    model_dir: &Path,
    input: Option<&Path>,
    output: Option<&Path>,
    loader: &CandleBertLoader,
) -> Result<()> {
    let model = BertEmbeddings::load(model_dir, loader)
        .with_context(|| format!("failed to load model from {}", model_dir.display()))?;
    if !model.has_engine() {
        bail!(
            "model directory {} has no saved engine; re-import it from an exported folder",
            model_dir.display()
        );
    }

    let text = match input {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => io::read_to_string(io::stdin()).context("failed to read stdin")?,
    };
    let sentences = sentences_from_lines(&text);
    log::info!("embedding {} sentences", sentences.len());

    let embedded = model.embed_sentences(&sentences)?;
    let annotations = word_embedding_annotations(&embedded, &model.config().annotator_type);

    let mut writer: BufWriter<Box<dyn Write>> = match output {
        Some(path) => BufWriter::new(Box::new(
            fs::File::create(path).with_context(|| format!("failed to create {}", path.display()))?,
        )),
        None => BufWriter::new(Box::new(io::stdout().lock())),
    };
    for annotation in &annotations {
        serde_json::to_writer(&mut writer, annotation)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}
