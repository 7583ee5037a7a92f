use clap::{Args, Parser, Subcommand};
use image_resizer::config::{self, ServiceConfig};
use image_resizer::imaging::RustBackend;
use image_resizer::params::ResizeQuery;
use image_resizer::resize::Resizer;
use image_resizer::store::{FsStore, ImageStore};
use image_resizer::{output, server};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "image-resizer")]
#[command(about = "On-demand image resizing proxy")]
#[command(long_about = "\
On-demand image resizing proxy

Serves images from storage containers at a requested width or height:

  GET /{container}/{image}?w=300
  GET /{container}/{image}?h=200

Sizes are rounded to the nearest 10 px. The first request for a size
resizes the original and stores the result next to it as
{stem}-w={n}.{ext}; later requests serve the stored copy. Requests
larger than the original return the original unchanged.

Storage layout:

  storage/                     # [storage] root
  └── images/                  # container
      ├── photo.jpg            # original
      └── photo-w=300.jpg      # generated variant

Run 'image-resizer gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Config file (missing file = defaults)
    #[arg(long, default_value = "config.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

/// Target size for the `resize` command. Exactly one is required.
#[derive(Args)]
#[group(required = true, multiple = false)]
struct SizeArgs {
    /// Target width in pixels
    #[arg(long)]
    width: Option<u32>,
    /// Target height in pixels
    #[arg(long)]
    height: Option<u32>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP service
    Serve {
        /// Listen address (overrides server.bind)
        #[arg(long)]
        bind: Option<String>,
    },
    /// Resize one image through the cache, as an HTTP request would
    Resize {
        /// Image name within the container
        image: String,
        /// Container (defaults to storage.default_container)
        #[arg(long)]
        container: Option<String>,
        #[command(flatten)]
        size: SizeArgs,
        /// Also write the resulting bytes to this file
        #[arg(long = "output")]
        output_file: Option<PathBuf>,
    },
    /// List the objects in a container
    List {
        /// Container (defaults to storage.default_container)
        #[arg(long)]
        container: Option<String>,
        /// Print the names as a JSON array
        #[arg(long)]
        json: bool,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::GenConfig => print!("{}", config::stock_config_toml()),
        command => {
            let config = config::load_config(&cli.config)?;
            init_logging(&config);
            run(command, config)?;
        }
    }

    Ok(())
}

fn run(command: Command, mut config: ServiceConfig) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Serve { bind } => {
            if let Some(bind) = bind {
                config.server.bind = bind;
                config.validate()?;
            }
            let addr = config.server.bind_addr()?;
            let resizer = Arc::new(build_resizer(&config));
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(server::serve(resizer, addr))?;
        }
        Command::Resize {
            image,
            container,
            size,
            output_file,
        } => {
            let container = container.unwrap_or_else(|| config.storage.default_container.clone());
            let query = ResizeQuery {
                w: size.width.map(|w| w.to_string()),
                h: size.height.map(|h| h.to_string()),
            };
            let resizer = build_resizer(&config);
            let resized = resizer.handle(&container, &image, &query)?;
            if let Some(path) = &output_file {
                std::fs::write(path, &resized.data)?;
            }
            output::print_resize_output(&container, &image, &resized, output_file.as_deref());
        }
        Command::List { container, json } => {
            let container = container.unwrap_or_else(|| config.storage.default_container.clone());
            let store = FsStore::new(&config.storage.root);
            let names = store.list(&container)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&names)?);
            } else {
                output::print_listing(&container, &names);
            }
        }
        // Printed before any config is loaded.
        Command::GenConfig => {}
    }
    Ok(())
}

/// `RUST_LOG` wins; otherwise `debug` when the config asks for it.
fn init_logging(config: &ServiceConfig) {
    let default_level = if config.debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn build_resizer(config: &ServiceConfig) -> Resizer<FsStore, RustBackend> {
    Resizer::new(
        FsStore::new(&config.storage.root),
        RustBackend::new(config.images.filter, config.quality()),
    )
}
