use anyhow::{bail, Context, Result};
use linetrace::attribution::{classify_mapping, BugIdentifier, IntentClassifier};
use linetrace::blame::{BlameTracer, LineOrigin};
use linetrace::cli::{Cli, Commands, ConfigAction, HistoryArgs, LineSpec};
use linetrace::config::Config;
use linetrace::evaluation::{evaluate, Accuracy, GroundTruth};
use linetrace::history::{load_file_history, CommitChain};
use linetrace::matching::{compare_all, load_manifest, LineMatcher, LineSequence, Resolution};
use serde::Serialize;
use std::path::{Path, PathBuf};

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse_args();

    // Initialize logging
    init_logging(cli.verbose);

    // Handle commands
    match cli.command {
        Commands::Diff {
            old,
            new,
            message,
            json,
        } => {
            let config = load_config(cli.config, cli.profile)?;
            cmd_diff(&config, &old, &new, message.as_deref(), json)?;
        }
        Commands::Blame {
            history,
            commit,
            lines,
            json,
        } => {
            let config = load_config(cli.config, cli.profile)?;
            cmd_blame(&config, &history, commit, &lines, json)?;
        }
        Commands::Szz { history, json } => {
            let config = load_config(cli.config, cli.profile)?;
            cmd_szz(&config, &history, json)?;
        }
        Commands::Eval { old, new, truth } => {
            let config = load_config(cli.config, cli.profile)?;
            cmd_eval(&config, &old, &new, &truth)?;
        }
        Commands::Batch { manifest, json } => {
            let config = load_config(cli.config, cli.profile)?;
            cmd_batch(&config, &manifest, json)?;
        }
        Commands::Config { action } => {
            cmd_config(cli.config, cli.profile, action)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose {
        "linetrace=debug"
    } else {
        "linetrace=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_diff(config: &Config, old: &Path, new: &Path, message: Option<&str>, json: bool) -> Result<()> {
    let old_lines = LineSequence::from_content(&read_file(old)?);
    let new_lines = LineSequence::from_content(&read_file(new)?);

    let (mapping, stats) = LineMatcher::new(config.matching.clone()).run(&old_lines, &new_lines);

    let tags = match message {
        Some(message) => {
            let intent = IntentClassifier::new(&config.attribution)?.classify(message);
            tracing::info!("Commit intent: {}", intent);
            Some(classify_mapping(&mapping, intent))
        }
        None => None,
    };

    if json {
        #[derive(Serialize)]
        struct DiffOutput<'a, T: Serialize> {
            mapping: Vec<linetrace::matching::MappedLine>,
            #[serde(skip_serializing_if = "Option::is_none")]
            tags: Option<&'a T>,
            stats: &'a linetrace::matching::MatchStats,
        }
        print_json(&DiffOutput {
            mapping: mapping.report(),
            tags: tags.as_ref(),
            stats: &stats,
        })?;
        return Ok(());
    }

    for (old_index, entry) in mapping.iter() {
        let target = match entry {
            Some(m) => m
                .new_indices
                .iter()
                .map(|n| n.to_string())
                .collect::<Vec<_>>()
                .join(","),
            None => "-".to_string(),
        };
        let resolution = mapping.resolution(old_index);
        let tag = tags
            .as_ref()
            .and_then(|t| t.get(&old_index))
            .map(|t| format!("  {}", t))
            .unwrap_or_default();
        match entry {
            Some(m) if resolution != Resolution::Exact => println!(
                "{:>5} -> {:<10} {:?} ({:.3}){}",
                old_index, target, resolution, m.score, tag
            ),
            _ => println!("{:>5} -> {:<10} {:?}{}", old_index, target, resolution, tag),
        }
    }

    println!(
        "\n{} old / {} new lines: {} exact, {} matched, {} split, {} deleted, {} added ({} ms)",
        stats.old_lines,
        stats.new_lines,
        stats.exact,
        stats.matched,
        stats.split,
        stats.deleted,
        stats.added,
        stats.processing_time_ms
    );
    Ok(())
}

fn cmd_blame(
    config: &Config,
    history: &HistoryArgs,
    commit: Option<String>,
    lines: &str,
    json: bool,
) -> Result<()> {
    let spec = LineSpec::parse(lines)?;
    let chain = load_history(history)?;

    let start = match commit {
        Some(id) => id,
        None => match chain.head() {
            Some(head) => head.id.clone(),
            None => bail!("History is empty"),
        },
    };
    let line_count = chain.get(&start).map_or(0, |c| c.after_lines().len());
    let targets = spec.positions(line_count);

    let report = BlameTracer::new(config.blame_matching())
        .with_max_depth(config.attribution.max_depth)
        .trace(&chain, &start, &targets)?;

    if json {
        return print_json(&report);
    }

    for line in &report.lines {
        match &line.origin {
            LineOrigin::Introduced { commit, position } => {
                let message = chain.get(commit).map(|c| c.message.as_str()).unwrap_or("");
                println!(
                    "line {:>5}: {} (line {} there)  {}",
                    line.position + 1,
                    short_id(commit),
                    position + 1,
                    first_line(message)
                );
            }
            LineOrigin::Unknown {
                last_commit,
                position,
            } => println!(
                "line {:>5}: origin unknown (line {} of {} pre-image)",
                line.position + 1,
                position + 1,
                short_id(last_commit)
            ),
        }
    }
    Ok(())
}

fn cmd_szz(config: &Config, history: &HistoryArgs, json: bool) -> Result<()> {
    let chain = load_history(history)?;
    let identifier = BugIdentifier::new(config.blame_matching(), &config.attribution)?;
    let report = identifier.identify(&chain)?;

    if json {
        return print_json(&report);
    }

    println!("Scanned {} commits", chain.len());
    for fix in &report.fixes {
        println!(
            "\nFix {}  {}",
            short_id(&fix.commit),
            first_line(&fix.message)
        );
        if fix.removed_lines.is_empty() {
            println!("  no lines removed");
            continue;
        }
        match &fix.blame {
            Some(blame) => {
                for line in &blame.lines {
                    let origin = line
                        .origin
                        .commit()
                        .map(short_id)
                        .unwrap_or("unknown");
                    println!("  line {:>5} <- {}", line.position + 1, origin);
                }
            }
            None => println!("  removed lines could not be traced (no parent in history)"),
        }
    }

    println!("\nBug-inducing commits: {}", report.bug_inducing.len());
    for id in &report.bug_inducing {
        let message = chain.get(id).map(|c| c.message.as_str()).unwrap_or("");
        println!("  {}  {}", short_id(id), first_line(message));
    }
    Ok(())
}

fn cmd_eval(config: &Config, old: &Path, new: &Path, truth: &Path) -> Result<()> {
    let truth = GroundTruth::load(truth)?;
    let mapping = LineMatcher::new(config.matching.clone()).track(
        &LineSequence::from_content(&read_file(old)?),
        &LineSequence::from_content(&read_file(new)?),
    );

    let accuracy = evaluate(&mapping, &truth);
    println!(
        "Accuracy: {:.2}% ({}/{})",
        accuracy.percentage(),
        accuracy.correct,
        accuracy.total
    );
    Ok(())
}

fn cmd_batch(config: &Config, manifest: &Path, json: bool) -> Result<()> {
    let loaded = load_manifest(manifest)?;
    let pairs: Vec<_> = loaded.iter().map(|(_, pair)| pair.clone()).collect();
    let results = compare_all(&pairs, &config.matching);

    #[derive(Serialize)]
    struct BatchRow<'a> {
        name: &'a str,
        stats: &'a linetrace::matching::MatchStats,
        #[serde(skip_serializing_if = "Option::is_none")]
        accuracy: Option<Accuracy>,
    }

    let mut overall = Accuracy::default();
    let mut rows = Vec::with_capacity(results.len());
    for ((entry, _), result) in loaded.iter().zip(&results) {
        let accuracy = match &entry.truth {
            Some(path) => {
                let accuracy = evaluate(&result.mapping, &GroundTruth::load(path)?);
                overall.merge(accuracy);
                Some(accuracy)
            }
            None => None,
        };
        rows.push(BatchRow {
            name: &result.name,
            stats: &result.stats,
            accuracy,
        });
    }

    if json {
        return print_json(&rows);
    }

    for row in &rows {
        let accuracy = row
            .accuracy
            .map(|a| format!("  accuracy {:.2}% ({}/{})", a.percentage(), a.correct, a.total))
            .unwrap_or_default();
        println!(
            "{}: {} exact, {} matched, {} split, {} deleted, {} added{}",
            row.name,
            row.stats.exact,
            row.stats.matched,
            row.stats.split,
            row.stats.deleted,
            row.stats.added,
            accuracy
        );
    }
    if overall.total > 0 {
        println!(
            "\nOverall accuracy: {:.2}% ({}/{})",
            overall.percentage(),
            overall.correct,
            overall.total
        );
    }
    Ok(())
}

fn cmd_config(config_path: Option<PathBuf>, profile: Option<String>, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show { section } => {
            let config = load_config(config_path, profile)?;
            let value = match section.as_deref() {
                Some("matching") => toml::Value::try_from(&config.matching)?,
                Some("attribution") => toml::Value::try_from(&config.attribution)?,
                Some("profiles") => toml::Value::try_from(&config.profiles)?,
                _ => toml::Value::try_from(&config)?,
            };
            println!("{}", toml::to_string_pretty(&value)?);
        }
        ConfigAction::Validate { file } => {
            let path = match file {
                Some(path) => path,
                None => Config::default_path()?,
            };
            let config = Config::load(&path)?;
            println!("✓ Configuration is valid");
            println!("  Schema version: {}", config.meta.schema_version);
        }
        ConfigAction::Init { force } => {
            let path = match config_path {
                Some(path) => path,
                None => Config::default_path()?,
            };

            if path.exists() && !force {
                println!("Configuration file already exists at: {}", path.display());
                println!("Use --force to overwrite");
                return Ok(());
            }

            // Create parent directory
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
            }

            Config::default().save(&path)?;
            println!("✓ Configuration initialized at: {}", path.display());
        }
    }

    Ok(())
}

fn load_config(config_path: Option<PathBuf>, profile: Option<String>) -> Result<Config> {
    let path = match config_path {
        Some(path) => path,
        None => Config::default_path()?,
    };

    let mut config = if path.exists() {
        Config::load(&path)?
    } else {
        tracing::warn!(
            "Config file not found, using defaults. Run 'linetrace config init' to create one."
        );
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    };

    if let Some(profile) = profile {
        config.apply_profile(&profile)?;
    }
    Ok(config)
}

fn load_history(args: &HistoryArgs) -> Result<CommitChain> {
    match (&args.history, &args.repo, &args.path) {
        (Some(file), _, _) => Ok(CommitChain::load(file)?),
        (None, Some(repo), Some(path)) => {
            Ok(load_file_history(repo, path, &args.rev, args.max_commits)?)
        }
        _ => bail!("Either --history or --repo with --path is required"),
    }
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

fn short_id(id: &str) -> &str {
    id.get(..10).unwrap_or(id)
}

fn first_line(message: &str) -> &str {
    message.lines().next().unwrap_or("")
}
