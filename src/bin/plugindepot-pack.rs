use clap::{Parser, Subcommand};
use plugindepot_pack::inspect::{inspect_artifact, Inspector};
use plugindepot_pack::operations::generate_installer;
use plugindepot_pack::{OutputLayout, PackagerConfig};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "plugindepot-pack")]
#[command(version)]
#[command(about = "Generate WiX installer sources for PluginDepot plugins")]
struct Cli {
    #[arg(short, long, global = true, help = "Only report errors")]
    quiet: bool,

    #[arg(short, long, global = true, action = clap::ArgAction::Count, help = "Increase verbosity (-v info, -vv debug, -vvv trace)")]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate installer.wxs and overrides.wxl from the build environment
    Wix {
        /// Installer source to write
        #[arg(long, default_value = "packaging/installer.wxs")]
        output: PathBuf,
        /// Localization overrides to write
        #[arg(long, default_value = "packaging/overrides.wxl")]
        localization: PathBuf,
        /// Directory holding icon.ico, EULA.rtf, Readme.rtf, banner.bmp, dialog.bmp
        #[arg(long, default_value = "packaging")]
        assets: PathBuf,
        /// Scratch directory for generated assets
        #[arg(long, default_value = "windowstmp")]
        temp_dir: PathBuf,
        /// Also write a JSON summary of the installer here
        #[arg(long)]
        summary: Option<PathBuf>,
    },
    /// Show what a built artifact links against
    Inspect {
        artifact: PathBuf,
        /// Executable name inside a macOS bundle
        #[arg(long, env = "PRODUCT_NAME", default_value = "")]
        product_name: String,
        /// Print reports as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    fn log_filter(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

fn init_logging(default_filter: &str) {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().compact().with_writer(std::io::stderr))
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_filter());

    match cli.command {
        Commands::Wix {
            output,
            localization,
            assets,
            temp_dir,
            summary,
        } => {
            let layout = OutputLayout {
                wxs_path: output,
                wxl_path: localization,
                assets_dir: assets,
                temp_dir,
                summary_path: summary,
            };
            let config = PackagerConfig::from_env(layout)?;
            let (manifest, files) = generate_installer(&config)?;
            println!(
                "Generated {} ({} feature(s), {} file(s))",
                files.wxs.display(),
                manifest.features.len(),
                manifest.unit_count()
            );
        }
        Commands::Inspect {
            artifact,
            product_name,
            json,
        } => {
            let reports = inspect_artifact(Inspector::for_host(), &artifact, &product_name)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&reports)?);
            } else {
                for report in &reports {
                    println!("== {} {}", report.tool, report.binary.display());
                    print!("{}", report.stdout);
                    eprint!("{}", report.stderr);
                }
            }
        }
    }

    Ok(())
}
