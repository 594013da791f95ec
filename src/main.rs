fn main() {
    xsltest::cli::run();
}
