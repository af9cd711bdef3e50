use anyhow::Result;
use argh::FromArgs;
use devc::Runner;
use tracing_subscriber::EnvFilter;

/// Launch a project command inside the development environment.
///
/// The command runs attached to this terminal with signals forwarded to
/// it; pass --silent to capture and print its combined output instead.
#[derive(FromArgs)]
struct Cli {
    /// capture the command's output instead of attaching the terminal
    #[argh(switch, short = 's')]
    silent: bool,

    /// executable to launch
    #[argh(positional)]
    exe: String,

    /// arguments passed through to the executable
    #[argh(positional, greedy)]
    args: Vec<String>,
}

fn main() -> Result<()> {
    init_logging();

    let cli: Cli = argh::from_env();
    let args: Vec<&str> = cli.args.iter().map(String::as_str).collect();
    let runner = Runner::new();

    if cli.silent {
        let out = runner.exec(&cli.exe, &args)?;
        if !out.is_empty() {
            println!("{out}");
        }
    } else {
        runner.interactive(&cli.exe, &args)?.apply();
    }
    Ok(())
}

/// Log to stderr so the child's stdout passthrough stays clean. Filter via
/// RUST_LOG, defaulting to warnings.
fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
