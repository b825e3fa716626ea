use clap::{Parser, Subcommand};
use lazy_picture::config;
use lazy_picture::media::{BuildMode, stock_rules};
use lazy_picture::output;
use lazy_picture::picture::{PictureProps, PlainPicture, ResolvedPicture};
use lazy_picture::simulate::{self, Scenario};
use lazy_picture::smart::{SmartPicture, SmartProps};
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "lazy-picture")]
#[command(about = "Responsive <picture> rendering with lazy-load status tracking")]
#[command(long_about = "\
Responsive <picture> rendering with lazy-load status tracking

Props files describe one image set per breakpoint:

  alt = \"Dunes\"
  loading = \"lazy\"

  [images.mobile]
  plain = \"dunes-640.jpg\"
  plain2x = \"dunes-1280.jpg\"
  webp = \"dunes-640.webp\"

  [images.noMobile]
  plain = \"dunes-1600.jpg\"

Breakpoints come from lazy-picture.toml in the config directory.
Run 'lazy-picture gen-config' to generate a documented config file.

Set RUST_LOG=debug to trace status transitions.")]
#[command(version)]
struct Cli {
    /// Directory holding lazy-picture.toml
    #[arg(long, default_value = ".", global = true)]
    config_dir: PathBuf,

    /// Fail on configuration warnings (development) or log and skip them
    /// (production). Defaults to the build profile.
    #[arg(long, value_enum, global = true)]
    mode: Option<BuildMode>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render a props file as <picture> markup
    Render {
        /// Props file (TOML)
        props: PathBuf,
        /// Wrap the picture in a status-aware container
        #[arg(long)]
        smart: bool,
        /// Print the resolved sources and image as JSON
        #[arg(long, conflicts_with = "summary")]
        json: bool,
        /// Print the resolved sources and image as a listing
        #[arg(long)]
        summary: bool,
    },
    /// List the configured breakpoints and their media queries
    Breakpoints,
    /// List the built-in named width rules
    StockRules,
    /// Replay a load-status scenario and print the transitions
    Simulate {
        /// Scenario file (TOML)
        scenario: PathBuf,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Validate the configuration
    Check,
    /// Print a stock lazy-picture.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let mode = cli.mode.unwrap_or_default();

    match cli.command {
        Command::Render {
            props,
            smart,
            json,
            summary,
        } => {
            let config = config::load_config(&cli.config_dir)?;
            let picture = PlainPicture::new(config.bindings(mode)?);
            let raw = read_toml(&props)?;

            if smart {
                let props: SmartProps = config::merge_toml(config.smart_props_base(), raw).try_into()?;
                props.options.validate()?;
                if json || summary {
                    print_resolved(&picture.resolve(&props.picture), json)?;
                } else {
                    let mut instance = SmartPicture::new(picture).mount(config.recheck_delay());
                    println!("{}", instance.render(&props).into_string());
                }
            } else {
                let props: PictureProps = raw.try_into()?;
                if json || summary {
                    print_resolved(&picture.resolve(&props), json)?;
                } else {
                    println!("{}", picture.render(&props, None).into_string());
                }
            }
        }
        Command::Breakpoints => {
            let config = config::load_config(&cli.config_dir)?;
            output::print_bindings(&config.bindings(mode)?);
        }
        Command::StockRules => {
            output::print_stock_rules(&stock_rules());
        }
        Command::Simulate { scenario, json } => {
            let config = config::load_config(&cli.config_dir)?;
            let picture = PlainPicture::new(config.bindings(mode)?);
            let scenario = Scenario::load(&scenario)?;
            let report = simulate::run_scenario(&picture, &scenario, config.recheck_delay())?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                output::print_simulation(&report);
            }
        }
        Command::Check => {
            println!("==> Checking {}", cli.config_dir.join(config::CONFIG_FILE).display());
            let config = config::load_config(&cli.config_dir)?;
            output::print_bindings(&config.bindings(mode)?);
            println!("==> Config is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn read_toml(path: &Path) -> Result<toml::Value, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

fn print_resolved(
    resolved: &ResolvedPicture,
    json: bool,
) -> Result<(), serde_json::Error> {
    if json {
        println!("{}", serde_json::to_string_pretty(resolved)?);
    } else {
        output::print_resolved(resolved);
    }
    Ok(())
}
