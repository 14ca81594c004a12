/// Example: Load and render an OBJ file in the terminal
///
/// Usage: cargo run --example load_obj -- path/to/file.obj

use std::env;
use std::io;
use glimpse_core::{obj, MeshData, Vector3, ViewerConfig};
use glimpse_terminal::{to_io_error, SceneObject, TerminalApp};

fn main() -> io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = env::args().collect();
    let config = ViewerConfig::default();
    let target = Vector3::from(config.camera.center);

    if args.len() < 2 {
        eprintln!("Usage: {} <obj-file>", args[0]);
        eprintln!("\nNo OBJ file provided, using default cube...");
        let cube = SceneObject::framed(MeshData::cube(2.0), target, 10.0);
        let mut app = TerminalApp::new(vec![cube], &config)?;
        return app.run();
    }

    let obj_path = &args[1];

    println!("Loading OBJ file: {}", obj_path);

    let mesh = obj::load_obj(obj_path).map_err(to_io_error)?;

    println!(
        "Loaded {} vertices, {} triangles (normals: {}, texture coordinates: {})",
        mesh.vertex_count(),
        mesh.triangle_count(),
        mesh.has_normals(),
        mesh.has_tex_coords()
    );
    println!("Starting terminal renderer (press Q to quit)...");
    std::thread::sleep(std::time::Duration::from_secs(1));

    let mut app = TerminalApp::new(vec![SceneObject::framed(mesh, target, 10.0)], &config)?;
    app.run()?;

    println!("Thank you for using Glimpse!");
    Ok(())
}
