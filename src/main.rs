fn main() {
    if let Err(err) = mat_tabular::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
