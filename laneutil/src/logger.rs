/// Intercept messages from the `log` crate and print them to STDOUT, with an
/// `info` default filter.
pub fn setup() {
    use env_logger::{Builder, Env};
    Builder::from_env(Env::default().default_filter_or("info")).init();
}
