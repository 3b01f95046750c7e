use eframe::egui;
use reel_stack::gui::ShowcaseApp;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1000.0, 760.0])
            .with_title("Reel Stack - Single Audible Surface Showcase"),
        ..Default::default()
    };

    eframe::run_native(
        "Reel Stack",
        options,
        Box::new(|cc| {
            match ShowcaseApp::new(cc) {
                Ok(app) => Ok(Box::new(app)),
                Err(e) => {
                    eprintln!("Failed to initialize showcase: {}", e);
                    std::process::exit(1);
                }
            }
        }),
    ).map_err(|e| anyhow::anyhow!("Failed to run showcase: {}", e))?;

    Ok(())
}
