use clap::Parser;
use journey_atlas::{
  atlas_ui::AtlasApp,
  chrome::{FileStore, PanelController},
  config::Config,
};
use log::info;

/// Map viewer for journeys and the places of a reference text.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
  /// Dataset to show instead of the built-in one.
  #[arg(long)]
  data: Option<std::path::PathBuf>,

  /// Forget the stored position and state of the control panel.
  #[arg(long)]
  reset_layout: bool,
}

fn main() -> eframe::Result {
  env_logger::init();
  let args = Args::parse();

  let mut config = Config::new();
  if let Some(data) = args.data {
    config.atlas_path = Some(data);
  }
  if args.reset_layout
    && let Some(path) = config.ui_state_path()
  {
    info!("Resetting layout in {}", path.display());
    PanelController::restore(Box::new(FileStore::open(&path))).reset();
  }

  // start tokio on another thread.
  let rt = tokio::runtime::Runtime::new().map_err(|e| eframe::Error::AppCreation(Box::new(e)))?;
  let handle = rt.handle().clone();
  let _enter = handle.enter();
  std::thread::spawn(move || {
    rt.block_on(async {
      loop {
        tokio::time::sleep(tokio::time::Duration::from_secs(3600)).await;
      }
    });
  });

  let options = eframe::NativeOptions {
    viewport: egui::ViewportBuilder::default()
      .with_title("Journey Atlas")
      .with_inner_size([1280., 800.]),
    ..Default::default()
  };
  eframe::run_native(
    "journey-atlas",
    options,
    Box::new(|cc| {
      egui_extras::install_image_loaders(&cc.egui_ctx);
      Ok(Box::new(AtlasApp::new(cc.egui_ctx.clone(), config)))
    }),
  )
}
