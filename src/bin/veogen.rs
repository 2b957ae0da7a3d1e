//! CLI for Veogen - Veo video generation via the Gemini API.

use clap::{Parser, ValueEnum};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use veogen::video::poller::DEFAULT_POLL_INTERVAL;
use veogen::{
    generate, AspectRatio, Backoff, PersonGeneration, PollPolicy, RequestOptions, Resolution,
    VeoClient, VeoGenError, DEFAULT_MODEL_ALIAS, MODEL_ALIASES,
};

#[derive(Parser)]
#[command(name = "veogen")]
#[command(about = "Generate video with Veo via the Gemini API")]
#[command(version)]
struct Cli {
    /// Text prompt for video generation
    #[arg(long, required_unless_present = "list_models")]
    prompt: Option<String>,

    /// Output filename (e.g. output.mp4)
    #[arg(long, visible_alias = "filename", required_unless_present = "list_models")]
    output: Option<PathBuf>,

    /// Model alias or full model id (see --list-models)
    #[arg(long, env = "VEOGEN_MODEL", default_value = DEFAULT_MODEL_ALIAS)]
    model: String,

    /// Duration in seconds, snapped to what the model accepts
    #[arg(long, default_value_t = 8)]
    duration: u32,

    /// Aspect ratio
    #[arg(long, value_enum, default_value = "16:9")]
    aspect_ratio: AspectRatioArg,

    /// Resolution (Veo 3 and later)
    #[arg(long, value_enum)]
    resolution: Option<ResolutionArg>,

    /// What to avoid in the video
    #[arg(long)]
    negative_prompt: Option<String>,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u32>,

    /// Number of videos to generate
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    count: u32,

    /// Person generation policy
    #[arg(long, value_enum)]
    person_generation: Option<PersonGenerationArg>,

    /// Starting image for image-to-video generation
    #[arg(long, visible_alias = "input-image")]
    source_image: Option<PathBuf>,

    /// Image to use as the last frame
    #[arg(long)]
    last_frame: Option<PathBuf>,

    /// Asset reference image (repeatable)
    #[arg(long = "element", value_name = "PATH")]
    elements: Vec<PathBuf>,

    /// Style reference image (repeatable)
    #[arg(long = "style", value_name = "PATH")]
    styles: Vec<PathBuf>,

    /// Let the service rewrite the prompt (Veo 2 only, on by default there)
    #[arg(long)]
    enhance_prompt: Option<bool>,

    /// Generate an audio track (Veo 3 and later)
    #[arg(long)]
    generate_audio: Option<bool>,

    /// Frames per second (Veo 2 only)
    #[arg(long)]
    fps: Option<u32>,

    /// Gemini API key (or set GEMINI_API_KEY / GOOGLE_API_KEY)
    #[arg(long)]
    api_key: Option<String>,

    /// API base URL
    #[arg(long, env = "VEOGEN_BASE_URL")]
    base_url: Option<String>,

    /// Seconds between status checks
    #[arg(long, default_value_t = DEFAULT_POLL_INTERVAL.as_secs())]
    poll_interval: u64,

    /// Give up polling after this many seconds (default: wait forever)
    #[arg(long)]
    timeout: Option<u64>,

    /// How the poll interval evolves
    #[arg(long, value_enum, default_value = "fixed")]
    backoff: BackoffArg,

    /// Retries per status check on transient errors
    #[arg(long, default_value_t = 0)]
    poll_retries: u32,

    /// List model aliases and available Veo models, then exit
    #[arg(long)]
    list_models: bool,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum AspectRatioArg {
    #[value(name = "16:9")]
    Landscape,
    #[value(name = "9:16")]
    Portrait,
}

impl From<AspectRatioArg> for AspectRatio {
    fn from(arg: AspectRatioArg) -> Self {
        match arg {
            AspectRatioArg::Landscape => AspectRatio::Landscape,
            AspectRatioArg::Portrait => AspectRatio::Portrait,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ResolutionArg {
    #[value(name = "720p")]
    Hd,
    #[value(name = "1080p")]
    FullHd,
}

impl From<ResolutionArg> for Resolution {
    fn from(arg: ResolutionArg) -> Self {
        match arg {
            ResolutionArg::Hd => Resolution::Hd,
            ResolutionArg::FullHd => Resolution::FullHd,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PersonGenerationArg {
    #[value(name = "allow_adult")]
    AllowAdult,
    #[value(name = "allow_all")]
    AllowAll,
    #[value(name = "dont_allow")]
    DontAllow,
}

impl From<PersonGenerationArg> for PersonGeneration {
    fn from(arg: PersonGenerationArg) -> Self {
        match arg {
            PersonGenerationArg::AllowAdult => PersonGeneration::AllowAdult,
            PersonGenerationArg::AllowAll => PersonGeneration::AllowAll,
            PersonGenerationArg::DontAllow => PersonGeneration::DontAllow,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum BackoffArg {
    Fixed,
    Exponential,
}

/// Cap for exponential poll backoff.
const MAX_BACKOFF: Duration = Duration::from_secs(60);

impl Cli {
    fn poll_policy(&self) -> PollPolicy {
        let interval = Duration::from_secs(self.poll_interval.max(1));
        let backoff = match self.backoff {
            BackoffArg::Fixed => Backoff::Fixed(interval),
            BackoffArg::Exponential => Backoff::Exponential {
                initial: interval,
                max: MAX_BACKOFF.max(interval),
            },
        };
        PollPolicy {
            backoff,
            timeout: self.timeout.map(Duration::from_secs),
            max_fetch_retries: self.poll_retries,
        }
    }

    fn request_options(&self, prompt: String) -> RequestOptions {
        let mut options = RequestOptions::new(prompt)
            .with_model(&self.model)
            .with_duration(self.duration)
            .with_aspect_ratio(self.aspect_ratio.into())
            .with_video_count(self.count);

        if let Some(r) = self.resolution {
            options = options.with_resolution(r.into());
        }
        if let Some(n) = &self.negative_prompt {
            options = options.with_negative_prompt(n);
        }
        if let Some(s) = self.seed {
            options = options.with_seed(s);
        }
        if let Some(p) = self.person_generation {
            options = options.with_person_generation(p.into());
        }
        if let Some(path) = &self.source_image {
            options = options.with_source_image(path);
        }
        if let Some(path) = &self.last_frame {
            options = options.with_last_frame(path);
        }
        for path in &self.elements {
            options = options.with_element_reference(path);
        }
        for path in &self.styles {
            options = options.with_style_reference(path);
        }
        if let Some(a) = self.generate_audio {
            options = options.with_generate_audio(a);
        }
        if let Some(f) = self.fps {
            options = options.with_fps(f);
        }
        if let Some(e) = self.enhance_prompt {
            options = options.with_enhance_prompt(e);
        }
        options.with_default_enhance_prompt()
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("veogen=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    if cli.list_models {
        return list_models(&cli).await;
    }

    generate_video(cli).await
}

fn build_client(cli: &Cli) -> veogen::Result<VeoClient> {
    let mut builder = VeoClient::builder();
    if let Some(key) = &cli.api_key {
        builder = builder.api_key(key);
    }
    if let Some(url) = &cli.base_url {
        builder = builder.base_url(url);
    }
    builder.build()
}

async fn generate_video(cli: Cli) -> anyhow::Result<()> {
    let (Some(prompt), Some(output)) = (cli.prompt.clone(), cli.output.clone()) else {
        anyhow::bail!("--prompt and --output are required");
    };
    let client = build_client(&cli)?;
    let options = cli.request_options(prompt);
    let json_output = cli.json;

    if !json_output {
        println!("Submitting video generation with {}...", veogen::resolve_model(&options.model));
        println!("  Prompt: {}", options.prompt);
        println!(
            "  Duration: {}s | Aspect: {} | Count: {}",
            options.duration_secs, options.aspect_ratio, options.video_count
        );
        let refs = options.element_references.len() + options.style_references.len();
        if refs > 0 {
            println!(
                "  Reference images: {} (elements: {}, styles: {})",
                refs,
                options.element_references.len(),
                options.style_references.len()
            );
        }
        print!("Waiting for generation to complete");
        std::io::stdout().flush().ok();
    }

    let result = generate(
        &client,
        &options,
        &output,
        cli.poll_policy(),
        |warning| eprintln!("Warning: {warning}"),
        |_| {
            if !json_output {
                print!(".");
                std::io::stdout().flush().ok();
            }
        },
    )
    .await;
    if !json_output {
        println!();
    }

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(VeoGenError::NoResults) => anyhow::bail!("No videos generated."),
        Err(e) => return Err(e.into()),
    };

    if json_output {
        let result = serde_json::json!({
            "type": "video",
            "success": true,
            "model": outcome.model,
            "operation": outcome.operation,
            "duration_secs": outcome.duration_secs,
            "outputs": outcome.saved().iter().map(|p| p.display().to_string()).collect::<Vec<_>>(),
            "skipped": outcome.report.skipped.iter().map(|s| s.number).collect::<Vec<_>>(),
            "warnings": outcome.warnings.iter().map(|w| w.to_string()).collect::<Vec<_>>(),
            "elapsed_ms": outcome.elapsed_ms,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        for path in outcome.saved() {
            println!("Video saved: {}", path.display());
        }
        let paths: Vec<_> = outcome
            .saved()
            .iter()
            .map(|p| p.display().to_string())
            .collect();
        if paths.len() == 1 {
            println!("\nOutput: {}", paths[0]);
        } else {
            println!("\nOutputs: {}", paths.join(", "));
        }
    }

    Ok(())
}

async fn list_models(cli: &Cli) -> anyhow::Result<()> {
    // Listing works without a key; remote models need one.
    let remote = match build_client(cli) {
        Ok(client) => Some(client.list_models().await?),
        Err(VeoGenError::Credential(_)) => None,
        Err(e) => return Err(e.into()),
    };

    if cli.json {
        let aliases: serde_json::Map<_, _> = MODEL_ALIASES
            .iter()
            .map(|(alias, model)| (alias.to_string(), serde_json::json!(model)))
            .collect();
        let result = serde_json::json!({
            "default": DEFAULT_MODEL_ALIAS,
            "aliases": aliases,
            "models": remote,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("Model aliases (default: {DEFAULT_MODEL_ALIAS}):\n");
    for (alias, model) in MODEL_ALIASES {
        println!("  {alias:<14} -> {model}");
    }

    match remote {
        Some(models) => {
            println!("\nAvailable Veo models:\n");
            for m in models {
                match &m.display_name {
                    Some(name) => println!("  {} ({})", m.id(), name),
                    None => println!("  {}", m.id()),
                }
            }
        }
        None => println!("\nSet GEMINI_API_KEY or pass --api-key to list remote models."),
    }

    Ok(())
}
