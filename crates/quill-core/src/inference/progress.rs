//! Load progress reporting.

use super::protocol::{Event, ModelKind};

/// Turns raw load progress into `progress` events for one model.
///
/// Reported values are clamped to `0..=100` and never decrease; repeated or
/// lower values are swallowed.
pub struct ProgressReporter<'a> {
    model: ModelKind,
    last: Option<f32>,
    emit: &'a mut dyn FnMut(Event),
}

impl<'a> ProgressReporter<'a> {
    pub fn new(model: ModelKind, emit: &'a mut dyn FnMut(Event)) -> Self {
        Self {
            model,
            last: None,
            emit,
        }
    }

    pub fn report(&mut self, progress: f32) {
        if progress.is_nan() {
            return;
        }
        let progress = progress.clamp(0.0, 100.0);
        if self.last.is_some_and(|last| progress <= last) {
            return;
        }
        self.last = Some(progress);
        (self.emit)(Event::Progress {
            model: self.model,
            progress,
        });
    }

    /// Reports 100 unless it was already reported.
    pub fn finish(&mut self) {
        self.report(100.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(events: &[Event]) -> Vec<f32> {
        events
            .iter()
            .map(|e| match e {
                Event::Progress { progress, .. } => *progress,
                other => panic!("unexpected event {:?}", other),
            })
            .collect()
    }

    #[test]
    fn test_progress_is_monotonic_and_clamped() {
        let mut events: Vec<Event> = Vec::new();
        let mut emit = |e: Event| events.push(e);
        let mut reporter = ProgressReporter::new(ModelKind::Embed, &mut emit);
        for p in [-5.0, 10.0, 5.0, 10.0, f32::NAN, 50.0, 250.0] {
            reporter.report(p);
        }
        reporter.finish();

        assert_eq!(values(&events), vec![0.0, 10.0, 50.0, 100.0]);
    }

    #[test]
    fn test_finish_reports_completion_once() {
        let mut events: Vec<Event> = Vec::new();
        let mut emit = |e: Event| events.push(e);
        let mut reporter = ProgressReporter::new(ModelKind::Llm, &mut emit);
        reporter.finish();
        reporter.finish();

        assert_eq!(
            events,
            vec![Event::Progress {
                model: ModelKind::Llm,
                progress: 100.0
            }]
        );
    }
}
