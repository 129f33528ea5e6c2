use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

use log::debug;

/// Records the duration of named steps, which can be printed at the end of a
/// run.
#[derive(Default)]
pub struct Timing {
    results: Rc<RefCell<Vec<(String, f32)>>>,
}

/// A step that is being measured, the duration is recorded by
/// [Timer::finish].
pub struct Timer {
    name: String,
    start: Instant,
    results: Rc<RefCell<Vec<(String, f32)>>>,
    registered: bool,
}

impl Timing {
    pub fn new() -> Timing {
        Timing::default()
    }

    /// Starts measuring a step with the given name.
    pub fn start(&mut self, name: &str) -> Timer {
        Timer {
            name: name.to_string(),
            start: Instant::now(),
            results: self.results.clone(),
            registered: false,
        }
    }

    /// Returns the recorded steps in the order in which they finished.
    pub fn results(&self) -> Vec<(String, f32)> {
        self.results.borrow().clone()
    }

    /// Prints the recorded steps to stderr.
    pub fn print(&self) {
        for (name, time) in self.results.borrow().iter() {
            eprintln!("Time {}: {:.3}s", name, time);
        }
    }
}

impl Timer {
    /// Records the time elapsed since the start of this step.
    pub fn finish(&mut self) {
        let time = self.start.elapsed().as_secs_f32();
        debug!("Time {}: {:.3}s", self.name, time);

        self.results.borrow_mut().push((self.name.clone(), time));
        self.registered = true;
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        if !self.registered {
            debug!("Timer {} was dropped before finishing", self.name);
        }
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_timing() {
        let mut timing = Timing::new();

        let mut first = timing.start("first");
        let mut second = timing.start("second");
        second.finish();
        first.finish();

        let names: Vec<String> = timing.results().into_iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["second".to_string(), "first".to_string()]);
    }
}
