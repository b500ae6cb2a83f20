use anyhow::{Context, Result, bail};
use console::style;
use log::{info, warn};
use std::path::Path;
use video_contact_sheet::cli::Args;
use video_contact_sheet::component::ContactSheetGenerator;
use video_contact_sheet::config::Config;
use video_contact_sheet::config::save::{add_recent_path, save_settings};
use video_contact_sheet::init;
use video_contact_sheet::signal::setup_shutdown_signal;
use video_contact_sheet::tools::{ensure_directory_exists, resolve_output_path};

fn main() -> Result<()> {
    init::init();
    let args = Args::parse_args();
    let shutdown_signal = setup_shutdown_signal()?;

    let mut config = Config::new()?;
    let options = args.apply_to(config.settings.sheet.clone())?;

    if args.save_settings {
        config.settings.sheet = options.clone();
        if let Some(input) = &args.input {
            add_recent_path(&mut config.settings, &input.to_string_lossy());
        }
        save_settings(&config.settings)?;
        info!("已儲存預設設定");
    }

    let generator = ContactSheetGenerator::from_options(options, shutdown_signal)?
        .with_overwrite(args.overwrite);

    let result = match &args.input {
        None => generator.run_interactive(&mut config),
        Some(input) if input.is_dir() => {
            if !args.recursive {
                bail!("{} 是資料夾，請加上 -r 以處理資料夾中的影片", input.display());
            }
            generator
                .run_batch(input, args.output.as_deref(), true)
                .map(|_| ())
        }
        Some(input) => run_single(&generator, input, args.output.as_deref()),
    };

    if let Err(e) = &result {
        warn!("Program error: {e:#}");
        eprintln!("{} {e:#}", style("錯誤:").red().bold());
    }

    result
}

/// `-o` 為資料夾時輸出到 `<資料夾>/<檔名>.<副檔名>`，否則視為輸出檔路徑
fn run_single(generator: &ContactSheetGenerator, input: &Path, output: Option<&Path>) -> Result<()> {
    let format = generator.options().output_format;
    let output_path = match output {
        Some(output) if output.is_dir() => resolve_output_path(input, Some(output), format),
        Some(output) => {
            if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
                ensure_directory_exists(parent)
                    .with_context(|| format!("無法建立輸出資料夾: {}", parent.display()))?;
            }
            output.to_path_buf()
        }
        None => resolve_output_path(input, None, format),
    };

    generator.run_single(input, &output_path)
}
