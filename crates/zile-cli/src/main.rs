use clap::{Parser, Subcommand};
use zile::commands::{
    build::{self, BuildArgs},
    check::{self, CheckArgs},
    publish::{self, PublishArgs},
};
use zile::{init_tracing, CliError, GlobalOpts};

#[derive(Parser)]
#[command(name = "zile")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "Build TypeScript packages for publishing",
    long_about = "zile compiles the entry points declared in package.json and rewrites the manifest to point at the build output. Run without a subcommand to build."
)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(flatten)]
    global: GlobalOpts,

    #[command(flatten)]
    build: BuildArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a package
    Build(BuildArgs),
    /// Symlink output paths to sources for local development
    Dev(BuildArgs),
    /// Run attw and publint against the package
    Check(CheckArgs),
    /// Build and strip workspace-only fields before publishing
    PreparePublish(PublishArgs),
    /// Restore package.json after publishing
    PostPublish(PublishArgs),
}

fn run(cli: Cli) -> Result<(), CliError> {
    let global = cli.global;
    match cli.command {
        None => build::handle_build(cli.build, false, &global),
        Some(Commands::Build(args)) => build::handle_build(args, false, &global),
        Some(Commands::Dev(args)) => build::handle_build(args, true, &global),
        Some(Commands::Check(args)) => check::handle_check(args, &global),
        Some(Commands::PreparePublish(args)) => publish::handle_prepare_publish(args, &global),
        Some(Commands::PostPublish(args)) => publish::handle_post_publish(args, &global),
    }
}

fn main() {
    let cli = Cli::parse();
    let verbosity = cli.global.verbosity_level();

    init_tracing(verbosity);
    if let Err(e) = zile_logger::init(verbosity) {
        eprintln!("Warning: Failed to initialize logger: {}", e);
    }

    if let Err(e) = run(cli) {
        zile_logger::error(&e.to_string());
        if !e.is_user_error() {
            if let Some(path) = zile_logger::log_path() {
                zile_logger::info(&format!("Details were written to {}", path.display()));
            }
        }
        std::process::exit(1);
    }
}
