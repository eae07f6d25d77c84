//! Destination for the pipeline log stream

/// Receives scanner output and step messages one line at a time
pub trait LogSink: Send + Sync {
    fn write_line(&self, line: &str);
}

impl<S: LogSink + ?Sized> LogSink for &S {
    fn write_line(&self, line: &str) {
        (**self).write_line(line)
    }
}
