fn main() {
    scanpace::app::startup::startup();
}
