/// Glimpse Terminal Viewer - Terrain and cube, or an OBJ model
///
/// Controls:
///   - Left drag / Arrow Keys: Look around
///   - Right button held / W / S: Move forward and back
///   - Q/ESC: Quit
use std::f32::consts::FRAC_PI_4;
use std::io;
use std::path::PathBuf;

use clap::Parser;
use glimpse_core::{obj, MeshData, RotationState, Transform, Vector3, ViewerConfig};
use glimpse_terminal::{to_io_error, SceneObject, TerminalApp};

#[derive(Parser, Debug)]
#[command(version, about = "Render a terrain scene or an OBJ model as ASCII art")]
struct Args {
    /// OBJ model to show instead of the demo scene
    model: Option<PathBuf>,

    /// Viewer settings (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

/// Flat terrain centered under the camera plus a cube to look at
fn demo_scene(config: &ViewerConfig) -> io::Result<Vec<SceneObject>> {
    let terrain = config.terrain.generate().map_err(to_io_error)?;
    let half = config.terrain.size / 2.0;
    let center = Vector3::from(config.camera.center);

    Ok(vec![
        SceneObject::new(terrain, Transform::at(Vector3::new(-half, 0.0, -half))),
        SceneObject::new(
            MeshData::cube(2.0),
            Transform::at(Vector3::new(center.x, 1.0, center.z / 2.0))
                .with_rotation(RotationState::new(0.0, FRAC_PI_4, 0.0)),
        ),
    ])
}

fn main() -> io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => ViewerConfig::load(path).map_err(to_io_error)?,
        None => ViewerConfig::default(),
    };

    let objects = match &args.model {
        Some(path) => {
            println!("Loading OBJ file: {}", path.display());
            let mesh = obj::load_obj(path).map_err(to_io_error)?;
            println!(
                "Loaded {} vertices, {} triangles, surface area {:.2}",
                mesh.vertex_count(),
                mesh.triangle_count(),
                mesh.surface_area()
            );
            vec![SceneObject::framed(mesh, Vector3::from(config.camera.center), 10.0)]
        }
        None => demo_scene(&config)?,
    };

    println!("Starting terminal renderer (press Q to quit)...");
    std::thread::sleep(std::time::Duration::from_secs(1));

    let mut app = TerminalApp::new(objects, &config)?;
    app.run()?;

    println!("Thank you for using Glimpse!");
    Ok(())
}
