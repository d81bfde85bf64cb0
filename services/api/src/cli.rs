use crate::demo::{
    run_audit_report, run_demo, run_template_check, AuditReportArgs, DemoArgs, TemplateCheckArgs,
};
use crate::server;
use audit_core::error::AppError;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "Audit Template Service",
    about = "Author weighted audit templates, conduct audits, and score them from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Inspect a template export without starting the service
    Template {
        #[command(subcommand)]
        command: TemplateCommand,
    },
    /// Score a responded audit export without starting the service
    Audit {
        #[command(subcommand)]
        command: AuditCommand,
    },
    /// Run an end-to-end CLI demo covering authoring, saving, and scoring
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum TemplateCommand {
    /// Check a template JSON export for weight balance and save blockers
    Check(TemplateCheckArgs),
}

#[derive(Subcommand, Debug)]
enum AuditCommand {
    /// Score an audit JSON export and print the report
    Report(AuditReportArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Template {
            command: TemplateCommand::Check(args),
        } => run_template_check(args),
        Command::Audit {
            command: AuditCommand::Report(args),
        } => run_audit_report(args),
        Command::Demo(args) => run_demo(args).await,
    }
}
