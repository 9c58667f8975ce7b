use std::sync::Arc;

/// Caller-supplied sink for human-readable progress lines.
pub type ProgressCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Send `message` to the reporter, if any.
pub fn report(progress: Option<&ProgressCallback>, message: &str) {
    if let Some(callback) = progress {
        callback(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn report_forwards_to_callback() {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let sink = lines.clone();
        let callback: ProgressCallback = Arc::new(move |msg: &str| {
            sink.lock().unwrap().push(msg.to_string());
        });

        report(Some(&callback), "(poster) Start templates generation");
        report(None, "ignored");

        assert_eq!(
            lines.lock().unwrap().as_slice(),
            ["(poster) Start templates generation".to_string()]
        );
    }
}
