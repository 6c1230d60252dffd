fn main() {
    if let Err(err) = physics_diagram_renderer::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
