/// Painter3D Terminal Demo
///
/// Usage: painter3d-terminal [cube|sphere|checkered|bars|scatter|surface|volume|mesh] [mesh-file]
///
/// Controls:
///   - Mouse drag / Arrow Keys: Rotate
///   - Scroll / +/-: Zoom
///   - Q/ESC: Quit
use std::env;

use anyhow::Context;
use painter3d_terminal::{Scene, TerminalApp};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let scene = Scene::from_args(args.first().map(String::as_str), args.get(1).map(String::as_str))
        .with_context(|| format!("usage: painter3d-terminal [{}] [mesh-file]", Scene::NAMES.join("|")))?;

    log::info!("starting scene {scene:?}");
    let mut app = TerminalApp::new(&scene)?;
    app.run()?;

    Ok(())
}
