/// Example: Load a mesh file and print what the renderer would draw
///
/// Usage: cargo run --example load_mesh -- path/to/file.{obj,stl}
use std::cell::RefCell;
use std::env;
use std::rc::Rc;

use anyhow::Context;
use painter3d_core::{render::MeshRenderer, render::MeshStyle, Camera, Colormap, MemorySurface, Mesh, ProjectionMode, Renderer};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let path = env::args().nth(1).context("usage: load_mesh <mesh-file>")?;
    let mesh = Mesh::load(&path).with_context(|| format!("failed to load {path}"))?;
    println!("Loaded {} vertices, {} faces of arity {}", mesh.vertices.len(), mesh.face_count(), mesh.arity());

    let surface = Rc::new(RefCell::new(MemorySurface::new()));
    let camera = Camera::new(ProjectionMode::Orthographic, 0.0, 0.0, 2.0);
    let renderer = MeshRenderer::new(&surface, &camera.transform(), Rc::new(mesh), MeshStyle::new().fill(Colormap::magma()))?;

    println!("{} faces visible from the front", renderer.batch().len());
    Ok(())
}
