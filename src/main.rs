use clap::Parser;
use lumen::core::config::{self, ThemeKind};
use lumen::tui;
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};
use std::fs::File;

#[derive(Parser)]
#[command(name = "lumen", about = "Terminal chat client for conversational insights")]
struct Args {
    /// Chat id to open on startup
    #[arg(long)]
    chat: Option<String>,

    /// Color theme
    #[arg(long, value_enum)]
    theme: Option<ThemeKind>,
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    // Initialize file logger - writes to lumen.log in current directory
    let log_config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .build();

    if let Ok(log_file) = File::create("lumen.log") {
        let _ = WriteLogger::init(LevelFilter::Debug, log_config, log_file);
    }

    let file_config = match config::load_config() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };
    let resolved = config::resolve(&file_config, args.theme, args.chat);

    log::info!("Lumen starting up (theme: {})", resolved.theme.label());

    tui::run(resolved)
}
