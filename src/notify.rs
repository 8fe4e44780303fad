/// Receives the user-visible outcome of identity and record operations.
pub trait Notifier {
    fn success(&self, message: &str);
    fn failure(&self, message: &str);
}

/// Prints notices to stderr so stdout stays clean for listings.
#[derive(Debug, Default)]
pub struct ConsoleNotifier {
    pub quiet: bool,
}

impl Notifier for ConsoleNotifier {
    fn success(&self, message: &str) {
        if !self.quiet {
            eprintln!("{}", message);
        }
    }

    fn failure(&self, message: &str) {
        eprintln!("Error: {}", message);
    }
}

#[cfg(test)]
pub use recording::RecordingNotifier;
