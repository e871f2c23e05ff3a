fn main() {
    propex::cli::run();
}
