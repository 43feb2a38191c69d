//! Progress bars for apply and delete passes.

use declarative::{KeyRecord, KeyResult, Phase, ProgressCallback, ResourceClass};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::Mutex;

/// One bar per class pass, shared by the worker pool
pub struct BarProgress {
    bar: Mutex<Option<ProgressBar>>,
    hidden: bool,
}

impl BarProgress {
    /// `hidden` keeps the bar off screen (quiet or JSON output)
    pub fn new(hidden: bool) -> Self {
        Self {
            bar: Mutex::new(None),
            hidden,
        }
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        let guard = self
            .bar
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(pb) = guard.as_ref() {
            f(pb);
        }
    }
}

impl ProgressCallback for BarProgress {
    fn on_class_start(&self, class: ResourceClass, phase: Phase, count: usize) {
        if count == 0 {
            return;
        }
        let pb = if self.hidden {
            ProgressBar::with_draw_target(Some(count as u64), ProgressDrawTarget::hidden())
        } else {
            ProgressBar::new(count as u64)
        };
        if let Ok(style) =
            ProgressStyle::default_bar().template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("=>-"));
        }
        let verb = match phase {
            Phase::Sync => "writing",
            Phase::Cleanup => "deleting",
        };
        pb.set_message(format!("{verb} {class}"));

        let mut guard = self
            .bar
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *guard = Some(pb);
    }

    /// Failed keys are logged here, above the bar
    fn on_key_complete(&self, class: ResourceClass, record: &KeyRecord) {
        self.with_bar(|pb| {
            if let KeyResult::Failed { error } = &record.result {
                pb.suspend(|| log::warn!("{} {} failed: {error}", class.noun(), record.name));
            }
            pb.inc(1);
        });
    }

    fn on_class_complete(&self, _class: ResourceClass) {
        let mut guard = self
            .bar
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(pb) = guard.take() {
            pb.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use declarative::Action;

    #[test]
    fn test_hidden_bar_tracks_keys() {
        let progress = BarProgress::new(true);
        progress.on_class_start(ResourceClass::Variables, Phase::Sync, 2);
        progress.on_key_complete(
            ResourceClass::Variables,
            &KeyRecord::new("A", Action::Create, KeyResult::Applied),
        );

        let pos = progress.bar.lock().unwrap().as_ref().map(ProgressBar::position);
        assert_eq!(pos, Some(1));

        progress.on_class_complete(ResourceClass::Variables);
        assert!(progress.bar.lock().unwrap().is_none());
    }

    #[test]
    fn test_empty_pass_creates_no_bar() {
        let progress = BarProgress::new(true);
        progress.on_class_start(ResourceClass::Secrets, Phase::Cleanup, 0);
        assert!(progress.bar.lock().unwrap().is_none());
        progress.on_class_complete(ResourceClass::Secrets);
    }

    #[test]
    fn test_failed_key_advances_bar() {
        let progress = BarProgress::new(true);
        progress.on_class_start(ResourceClass::Secrets, Phase::Sync, 1);
        progress.on_key_complete(
            ResourceClass::Secrets,
            &KeyRecord::new(
                "TOKEN",
                Action::UpdateUnknown,
                KeyResult::Failed {
                    error: "HTTP 403".into(),
                },
            ),
        );

        let pos = progress.bar.lock().unwrap().as_ref().map(ProgressBar::position);
        assert_eq!(pos, Some(1));
    }
}
