fn main() {
    if let Err(err) = apuracao::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
