use clap::{Parser, Subcommand, ValueEnum};

use netcompose::Result;
use netcompose::compose::CompositionSpec;
use netcompose::devices::Catalog;
use netcompose::{diagnostics, render};

#[derive(Parser)]
#[command(name = "netcompose")]
#[command(about = "Compose a network stack from device descriptors", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Rust,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a composition and emit its initialization code.
    Emit {
        #[arg(long)]
        config: String,

        /// Write here instead of stdout.
        #[arg(short = 'o', long)]
        out: Option<String>,

        #[arg(long, value_enum, default_value_t = Format::Rust)]
        format: Format,
    },
    /// Print the merged package constraints of a composition.
    Packages {
        #[arg(long)]
        config: String,
    },
    /// List the standard device catalog.
    Devices,
}

fn main() -> Result<()> {
    diagnostics::init();
    let cli = Cli::parse();

    match cli.cmd {
        Commands::Emit {
            config,
            out,
            format,
        } => {
            // 1) Parse + apply the composition.
            let composed = CompositionSpec::load(&config)?.validate_and_build(Catalog::standard()?)?;

            // 2) Aggregate, then emit. Nothing is written unless both succeed.
            let output = netcompose::build(&composed.graph)?;

            // 3) Render.
            let text = match format {
                Format::Rust => render::render_rust_module(&output),
                Format::Json => render::render_json(&output)?,
            };
            match out {
                Some(path) => {
                    std::fs::write(&path, text)?;
                    println!("Wrote {}", path);
                }
                None => print!("{}", text),
            }
        }
        Commands::Packages { config } => {
            let composed = CompositionSpec::load(&config)?.validate_and_build(Catalog::standard()?)?;
            let packages = netcompose::model::aggregate_packages(&composed.graph)?;
            print!("{}", render::render_manifest(&packages));
        }
        Commands::Devices => {
            for descriptor in Catalog::standard()?.iter() {
                println!("{}", descriptor);
                for package in descriptor.packages() {
                    println!("    package {} {}", package.package, package.range);
                }
                if !descriptor.slots().is_empty() {
                    println!("    optional {}", descriptor.slots().join(", "));
                }
            }
        }
    }

    Ok(())
}
