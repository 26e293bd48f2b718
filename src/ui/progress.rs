use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Named progress bars sharing one terminal area. Safe to drive from
/// worker threads.
#[derive(Clone)]
pub struct ProgressManager {
    mp: MultiProgress,
    bars: Arc<Mutex<HashMap<String, ProgressBar>>>,
}

impl ProgressManager {
    pub fn new() -> Self {
        Self {
            mp: MultiProgress::new(),
            bars: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Create a bar.
    /// - `id`: unique key for later updates
    /// - `total`: length of the bar
    /// - `template`: one of [`templates`]
    /// - `message`: initial message
    pub fn create_bar(
        &self,
        id: &str,
        total: u64,
        template: &str,
        message: &str,
    ) -> Result<(), String> {
        let mut bars = self
            .bars
            .lock()
            .map_err(|e| format!("Lock error: {}", e))?;

        if bars.contains_key(id) {
            return Err(format!("Progress bar '{}' already exists", id));
        }

        let style = ProgressStyle::default_bar()
            .template(template)
            .map_err(|e| format!("Bad template: {}", e))?
            .progress_chars("█▉▊▋▌▍▎▏ ");
        let pb = self.mp.add(ProgressBar::new(total));
        pb.set_style(style);
        pb.set_message(message.to_string());

        bars.insert(id.to_string(), pb);
        Ok(())
    }

    pub fn inc(&self, id: &str, value: u64) -> Result<(), String> {
        self.with_bar(id, |pb| pb.inc(value))
    }

    pub fn set_message(&self, id: &str, message: &str) -> Result<(), String> {
        self.with_bar(id, |pb| pb.set_message(message.to_string()))
    }

    pub fn position(&self, id: &str) -> Result<u64, String> {
        self.with_bar(id, |pb| pb.position())
    }

    /// Finish and keep the bar on screen.
    pub fn finish(&self, id: &str, message: &str) -> Result<(), String> {
        self.with_bar(id, |pb| pb.finish_with_message(message.to_string()))
    }

    pub fn exists(&self, id: &str) -> bool {
        if let Ok(bars) = self.bars.lock() {
            bars.contains_key(id)
        } else {
            false
        }
    }

    pub fn clear_all(&self) {
        if let Ok(mut bars) = self.bars.lock() {
            for (_, pb) in bars.drain() {
                pb.finish_and_clear();
            }
        }
    }

    fn with_bar<T>(
        &self,
        id: &str,
        f: impl FnOnce(&ProgressBar) -> T,
    ) -> Result<T, String> {
        let bars = self
            .bars
            .lock()
            .map_err(|e| format!("Lock error: {}", e))?;
        bars.get(id)
            .map(f)
            .ok_or_else(|| format!("Progress bar '{}' not found", id))
    }
}

impl Default for ProgressManager {
    fn default() -> Self {
        Self::new()
    }
}

pub mod templates {
    pub const SWEEP: &str =
        "SWEEP [{bar:30.cyan}] {percent}% ({pos}/{len} jobs) {elapsed_precise} {msg}";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bar_lifecycle() {
        let pm = ProgressManager::new();
        pm.create_bar("sweep", 4, templates::SWEEP, "awgn").unwrap();
        assert!(pm.exists("sweep"));
        assert!(pm.create_bar("sweep", 4, templates::SWEEP, "again").is_err());

        pm.inc("sweep", 3).unwrap();
        assert_eq!(pm.position("sweep").unwrap(), 3);
        pm.set_message("sweep", "bpsk @ 0 dB").unwrap();
        pm.finish("sweep", "done").unwrap();

        pm.clear_all();
        assert!(!pm.exists("sweep"));
        assert!(pm.inc("sweep", 1).is_err());
    }
}
