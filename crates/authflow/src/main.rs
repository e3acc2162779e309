use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

mod tui;

use anyhow::{Context, Result};
use authflow_core::config::{ConfigLocator, FlowConfig};
use authflow_core::flow::{AuthFlowController, FlowSnapshot, Intent, IntentKind};
use authflow_core::provider::{AuthError, MockIdentityProvider, ProviderCall};
use authflow_core::session::MemorySessionStore;
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use serde_json::json;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Simulated multi-step authentication flow")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct GlobalArgs {
    /// Read configuration from this file instead of the user config directory
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Simulated identity provider delay in milliseconds
    #[arg(long = "latency-ms", global = true)]
    latency_ms: Option<u64>,
    /// Make the next call to a provider operation fail (repeatable)
    #[arg(long = "fail", global = true)]
    fail: Vec<ProviderCall>,
    /// Log filter used when RUST_LOG is not set
    #[arg(long = "log-level", global = true, default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Launch the interactive sign-in screens
    Tui(TuiArgs),
    /// Run sign-in, verification and sign-out end to end
    Walk(WalkArgs),
    /// Dispatch scripted intents in order, e.g. --step "login email=a@b.c password=pw"
    Replay(ReplayArgs),
    /// Show the effective configuration
    Config,
}

#[derive(Args, Debug)]
struct TuiArgs {
    /// Write logs to this file (the terminal is reserved for the UI)
    #[arg(long = "log-file")]
    log_file: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct WalkArgs {
    #[arg(long, default_value = "test@user.com")]
    email: String,
    #[arg(long, default_value = "password123")]
    password: String,
    /// Second-factor code to submit
    #[arg(long, default_value = "123456")]
    code: String,
    /// Output snapshots as JSON lines
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct ReplayArgs {
    /// Intent line: name followed by key=value fields (repeatable)
    #[arg(long = "step", required = true)]
    steps: Vec<String>,
    /// Output results as JSON lines
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    match &cli.command {
        Commands::Tui(args) => init_logging(&cli.global.log_level, args.log_file.as_deref(), true)?,
        _ => init_logging(&cli.global.log_level, None, false)?,
    }

    let config = load_config(&cli.global)?;
    info!(app_id = %config.app_id, latency_ms = config.latency_ms, "configuration loaded");

    match cli.command {
        Commands::Tui(_) => {
            let controller = build_controller(&config, &cli.global.fail);
            tui::run(controller, &config.app_id)?
        }
        Commands::Walk(args) => walk(args, &config, &cli.global.fail).await?,
        Commands::Replay(args) => replay(args, &config, &cli.global.fail).await?,
        Commands::Config => show_config(&cli.global, &config)?,
    }
    Ok(())
}

fn init_logging(default_filter: &str, log_file: Option<&Path>, interactive: bool) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create log file {}", path.display()))?;
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                )
                .try_init()
                .context("failed to install log subscriber")?;
        }
        None if interactive => {}
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .try_init()
                .context("failed to install log subscriber")?;
        }
    }
    Ok(())
}

fn load_config(global: &GlobalArgs) -> Result<FlowConfig> {
    let mut config = match &global.config {
        Some(path) => FlowConfig::from_file(path)
            .with_context(|| format!("failed to read config {}", path.display()))?
            .with_env_overrides()?,
        None => {
            let locator =
                ConfigLocator::new().context("unable to locate configuration directory")?;
            FlowConfig::load(&locator).context("failed to load configuration")?
        }
    };
    if let Some(latency_ms) = global.latency_ms {
        config.latency_ms = latency_ms;
    }
    Ok(config)
}

fn build_controller(config: &FlowConfig, failures: &[ProviderCall]) -> AuthFlowController {
    let provider = MockIdentityProvider::from_config(config);
    for call in failures {
        provider.fail_next(*call, simulated_failure(*call));
    }
    AuthFlowController::new(Arc::new(provider), MemorySessionStore::new())
        .with_code_length(config.code_length)
}

fn simulated_failure(call: ProviderCall) -> AuthError {
    match call {
        ProviderCall::Authenticate => AuthError::InvalidCredentials,
        ProviderCall::VerifySecondFactor => AuthError::InvalidCode,
        ProviderCall::Register => AuthError::Unavailable("registration is disabled".into()),
        ProviderCall::RequestPasswordReset => {
            AuthError::Unavailable("reset mail could not be sent".into())
        }
        ProviderCall::ResendCode => AuthError::Unavailable("device unreachable".into()),
    }
}

async fn walk(args: WalkArgs, config: &FlowConfig, failures: &[ProviderCall]) -> Result<()> {
    let mut controller = build_controller(config, failures);
    let steps = [
        Intent::credentials(args.email, args.password),
        Intent::code(args.code),
        Intent::SignOut,
    ];

    print_snapshot(None, &controller.snapshot(), &config.app_id, args.json)?;
    for intent in steps {
        let kind = intent.kind();
        let outcome = controller.perform(intent).await;
        print_snapshot(Some(kind), &controller.snapshot(), &config.app_id, args.json)?;
        outcome.with_context(|| format!("{kind} failed"))?;
    }
    Ok(())
}

async fn replay(args: ReplayArgs, config: &FlowConfig, failures: &[ProviderCall]) -> Result<()> {
    let intents = args
        .steps
        .iter()
        .map(|line| {
            line.parse::<Intent>()
                .with_context(|| format!("invalid step '{line}'"))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut controller = build_controller(config, failures);
    for intent in intents {
        let kind = intent.kind();
        let outcome = controller.perform(intent).await;
        let snapshot = controller.snapshot();
        if args.json {
            let line = json!({
                "intent": kind,
                "accepted": outcome.is_ok(),
                "error": outcome.as_ref().err().map(ToString::to_string),
                "snapshot": snapshot,
            });
            println!("{}", serde_json::to_string(&line)?);
        } else {
            match outcome {
                Ok(state) => println!("{kind}: ok -> {state}"),
                Err(err) => println!("{kind}: rejected ({err}); still {}", snapshot.state),
            }
        }
    }
    Ok(())
}

fn show_config(global: &GlobalArgs, config: &FlowConfig) -> Result<()> {
    let path = match &global.config {
        Some(path) => path.clone(),
        None => ConfigLocator::new()?.config_file(),
    };
    println!("# {}", path.display());
    print!("{}", config.to_toml_string()?);
    Ok(())
}

fn print_snapshot(
    kind: Option<IntentKind>,
    snapshot: &FlowSnapshot,
    app_id: &str,
    as_json: bool,
) -> Result<()> {
    if as_json {
        let line = json!({ "intent": kind, "snapshot": snapshot });
        println!("{}", serde_json::to_string(&line)?);
        return Ok(());
    }

    match kind {
        Some(kind) => println!("{kind} -> {} ({})", snapshot.state, snapshot.state.label()),
        None => println!("start: {} ({})", snapshot.state, snapshot.state.label()),
    }
    if let Some(status) = &snapshot.status {
        println!("  status: {status}");
    }
    if let Some(error) = &snapshot.error {
        println!("  error: {error}");
    }
    if let Some(session) = &snapshot.session {
        println!("  application: {app_id}");
        println!("  identity: {}", session.identity);
        println!(
            "  profile: {} ({}), last login {}",
            session.profile.email,
            session.profile.status,
            session.profile.last_login.with_timezone(&Local).format("%H:%M:%S")
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "authflow",
            "walk",
            "--latency-ms",
            "0",
            "--fail",
            "verify",
            "--json",
        ])
        .unwrap();
        assert_eq!(cli.global.latency_ms, Some(0));
        assert_eq!(cli.global.fail, vec![ProviderCall::VerifySecondFactor]);
        assert!(matches!(cli.command, Commands::Walk(WalkArgs { json: true, .. })));
    }

    #[test]
    fn replay_requires_steps() {
        assert!(Cli::try_parse_from(["authflow", "replay"]).is_err());
    }

    #[tokio::test]
    async fn walk_stops_at_scripted_failure() {
        let config = FlowConfig {
            latency_ms: 0,
            ..FlowConfig::default()
        };
        let args = WalkArgs {
            email: "test@user.com".into(),
            password: "password123".into(),
            code: "123456".into(),
            json: true,
        };
        let err = walk(args, &config, &[ProviderCall::VerifySecondFactor])
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "submit-code failed");
    }

    #[tokio::test]
    async fn replay_reports_rejections_without_failing() {
        let config = FlowConfig {
            latency_ms: 0,
            ..FlowConfig::default()
        };
        let args = ReplayArgs {
            steps: vec![
                "sign-out".into(),
                "navigate-register".into(),
                "register email=new@user.com password=pw".into(),
            ],
            json: false,
        };
        replay(args, &config, &[]).await.unwrap();
    }

    #[tokio::test]
    async fn replay_rejects_unparseable_steps() {
        let args = ReplayArgs {
            steps: vec!["teleport".into()],
            json: false,
        };
        let err = replay(args, &FlowConfig::default(), &[]).await.unwrap_err();
        assert_eq!(err.to_string(), "invalid step 'teleport'");
    }
}
