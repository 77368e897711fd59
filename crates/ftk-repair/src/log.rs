//! Line-oriented log sink shared by inspectors and modifiers.

/// Caller-supplied line callback.
pub type LogFn<'a> = Option<&'a mut dyn FnMut(&str)>;

/// Wraps an optional callback. Without one, lines go to `tracing`.
pub struct LogSink<'a> {
    sink: LogFn<'a>,
}

impl<'a> LogSink<'a> {
    pub fn new(sink: LogFn<'a>) -> Self {
        Self { sink }
    }

    pub fn line(&mut self, msg: &str) {
        match &mut self.sink {
            Some(f) => (*f)(msg),
            None => tracing::info!("{msg}"),
        }
    }

    /// A skipped pair or group. Always reaches `tracing` at warn level.
    pub fn warn(&mut self, msg: &str) {
        tracing::warn!("{msg}");
        if let Some(f) = &mut self.sink {
            (*f)(msg);
        }
    }

    /// Hands the callback to a nested pass.
    pub fn reborrow(&mut self) -> Option<&mut dyn FnMut(&str)> {
        match &mut self.sink {
            Some(f) => Some(&mut **f),
            None => None,
        }
    }
}
