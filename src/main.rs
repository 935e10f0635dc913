fn main() {
    if let Err(err) = automaton_viz::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
