//! Command line runner for the `crspectrum` library.

#[cfg(not(feature = "for-testing"))]
#[quit::main]
fn main() {
    crspectrum::cli::run::run();
}

#[cfg(feature = "for-testing")]
fn main() {
    eprintln!(
        "Warning: The `for-testing` feature is enabled, which will turn errors into panics\n\
         Tip: Use cargo flag --features=all-non-testing to include all features except `for-testing`"
    );
    crspectrum::cli::run::run();
}
