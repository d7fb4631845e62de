fn main() {
    if let Err(err) = struct_layout_viewer::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
