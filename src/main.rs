fn main() {
    if let Err(err) = floatnotes::run(std::env::args().skip(1).collect()) {
        eprintln!("floatnotes: {err:#}");
        std::process::exit(1);
    }
}
