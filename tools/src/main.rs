mod replay;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use imeswitch_core::{
    classify, Config, Document, InputLanguage, InputMethodKind, InputMethodSwitcher, RuleEngine,
    SceneKind, SourceBuffer, SwitchSettings, SyntaxFamily,
};
use imeswitch_platform::Dispatcher;
use replay::DryRunSwitcher;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "imeswitch")]
#[command(about = "Context-aware input method switching for code editors")]
#[command(version)]
struct Cli {
    /// Verbose logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify the cursor context at a byte offset of a file
    Classify {
        file: PathBuf,
        /// Byte offset of the cursor
        #[arg(long)]
        offset: usize,
        /// Language id or extension overriding the file's own
        #[arg(long)]
        language: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Show which rule (if any) matches a line of text
    Rules {
        text: String,
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Target when no rule matches
        #[arg(long, value_enum, default_value_t = MethodArg::Latin)]
        default: MethodArg,
    },
    /// Replay cursor offsets of a file through the switching pipeline
    Replay {
        file: PathBuf,
        /// Comma separated byte offsets
        #[arg(long, value_delimiter = ',', required = true)]
        offsets: Vec<usize>,
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Spacing between replayed events
        #[arg(long, default_value_t = 100)]
        interval_ms: u64,
        /// Drive the real input method instead of a dry run
        #[arg(long)]
        live: bool,
        #[arg(long)]
        json: bool,
    },
    /// Report the platform backend, the active input method and cursor colours
    Status {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
    /// Switch the input method now
    Switch {
        #[arg(value_enum)]
        target: MethodArg,
    },
    /// Write a default configuration file
    InitConfig {
        path: PathBuf,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum MethodArg {
    Latin,
    Native,
}

impl From<MethodArg> for InputMethodKind {
    fn from(arg: MethodArg) -> Self {
        match arg {
            MethodArg::Latin => InputMethodKind::Latin,
            MethodArg::Native => InputMethodKind::Native,
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_directive = if verbose {
        "imeswitch=debug,imeswitch_core=debug,imeswitch_platform=debug,warn"
    } else {
        "warn"
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::load_toml(path)?,
        None => Config::default(),
    };
    tracing::debug!(path = ?path, rules = config.rules.len(), "configuration loaded");
    Ok(config)
}

fn load_buffer(file: &Path, language: Option<&str>) -> Result<SourceBuffer> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("reading {}", file.display()))?;
    let buffer = SourceBuffer::for_path(file, text);
    Ok(match language {
        Some(lang) => {
            let commit = buffer.is_commit_message();
            SourceBuffer::new(buffer.text().to_string(), SyntaxFamily::from_language(lang))
                .with_commit_message(commit)
        }
        None => buffer,
    })
}

fn run_classify(file: &Path, offset: usize, language: Option<&str>, as_json: bool) -> Result<()> {
    let buffer = load_buffer(file, language)?;
    let context = classify(&buffer, offset);
    let scene = context.scene();
    let line = buffer.line_number(offset.min(buffer.len()));

    if as_json {
        let out = json!({
            "file": file.display().to_string(),
            "offset": offset,
            "line": line + 1,
            "family": buffer.syntax_family(),
            "context": context,
            "scene": scene,
            "default_method": scene.default_method(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("{}:{} (offset {})", file.display(), line + 1, offset);
        println!("  context: {}", context);
        println!("  scene:   {} -> {}", scene, scene.default_method());
    }
    Ok(())
}

fn run_rules(text: &str, config: Option<&Path>, default: MethodArg) -> Result<()> {
    let config = load_config(config)?;
    let engine = RuleEngine::new();
    match engine.match_rule(config.custom_rules(), text) {
        Some(rule) => println!(
            "rule '{}' (priority {}) -> {}",
            rule.id, rule.priority, rule.target
        ),
        None => println!("no rule matched -> {}", InputMethodKind::from(default)),
    }
    Ok(())
}

fn print_steps(steps: &[replay::ReplayStep], as_json: bool) -> Result<()> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(steps)?);
        return Ok(());
    }
    for step in steps {
        let context = step.context.map(|c| c.to_string()).unwrap_or_else(|| "-".to_string());
        print!(
            "offset {:>6}  line {:>4}  {:<15} {:<22} active={}",
            step.offset,
            step.line + 1,
            step.outcome,
            context,
            step.active
        );
        match &step.hint {
            Some(hint) => println!("  [{}]", hint),
            None => println!(),
        }
    }
    Ok(())
}

fn run_replay(
    file: &Path,
    offsets: &[usize],
    config: Option<&Path>,
    interval: Duration,
    live: bool,
    as_json: bool,
) -> Result<()> {
    let config = load_config(config)?;
    let buffer = load_buffer(file, None)?;

    let steps = if live {
        let dispatcher = Dispatcher::global();
        if !dispatcher.is_supported() {
            bail!("input method switching is not supported on this platform");
        }
        replay::replay(config, dispatcher, &buffer, offsets, interval)
    } else {
        replay::replay(config, DryRunSwitcher::default(), &buffer, offsets, interval)
    };
    print_steps(&steps, as_json)
}

/// Configured cursor colour per input language, `None` where unset.
fn language_colors(config: &Config) -> Vec<(InputLanguage, Option<String>)> {
    InputLanguage::ALL
        .iter()
        .map(|&lang| (lang, config.cursor_colors.for_language(lang).map(|c| c.to_hex())))
        .collect()
}

fn run_status(config: Option<&Path>, as_json: bool) -> Result<()> {
    let config = load_config(config)?;
    let dispatcher = Dispatcher::global();
    let method = dispatcher.current_method();
    let colors = language_colors(&config);
    if as_json {
        let colors: serde_json::Map<String, serde_json::Value> = colors
            .into_iter()
            .map(|(lang, hex)| (lang.to_string(), json!(hex)))
            .collect();
        let out = json!({
            "backend": dispatcher.backend_name(),
            "supported": dispatcher.is_supported(),
            "current_method": method,
            "cursor_colors": colors,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("backend:   {}", dispatcher.backend_name());
        println!("supported: {}", dispatcher.is_supported());
        println!("current:   {}", method);
        for (lang, hex) in colors {
            println!("  {:<9} {}", lang, hex.as_deref().unwrap_or("-"));
        }
    }
    Ok(())
}

fn run_switch(target: MethodArg) -> Result<()> {
    let dispatcher = Dispatcher::global();
    if !dispatcher.is_supported() {
        bail!("input method switching is not supported on this platform");
    }
    let target = InputMethodKind::from(target);
    if dispatcher.switch_to(target) {
        println!("switched to {}", target);
    } else {
        println!("no transition (already {} or switch failed)", target);
    }
    Ok(())
}

fn run_init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    let config = Config::default();
    config.save_toml(path)?;
    let enabled: Vec<&str> = SceneKind::ALL
        .iter()
        .filter(|s| config.scene_enabled(**s))
        .map(|s| s.label())
        .collect();
    println!("wrote {} (scenes on: {})", path.display(), enabled.join(", "));
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Classify {
            file,
            offset,
            language,
            json,
        } => run_classify(&file, offset, language.as_deref(), json),
        Commands::Rules {
            text,
            config,
            default,
        } => run_rules(&text, config.as_deref(), default),
        Commands::Replay {
            file,
            offsets,
            config,
            interval_ms,
            live,
            json,
        } => run_replay(
            &file,
            &offsets,
            config.as_deref(),
            Duration::from_millis(interval_ms),
            live,
            json,
        ),
        Commands::Status { config, json } => run_status(config.as_deref(), json),
        Commands::Switch { target } => run_switch(target),
        Commands::InitConfig { path, force } => run_init_config(&path, force),
    }
}
