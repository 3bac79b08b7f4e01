fn main() {
    niyama::cli::run();
}
