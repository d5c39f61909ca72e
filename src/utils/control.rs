//! Cross-thread control of a running filter
//!
//! A configuration UI lives on a different thread than the tracker. It never
//! touches filter state directly: it flips a reset flag and publishes slider
//! values, and the tracking thread picks both up at the top of its next frame.
//! Both sliders are published as one pair; the tracking thread only takes
//! the lock when the generation counter says the pair has changed.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use super::config::NoiseSettings;

#[derive(Debug)]
struct ControlState {
    reset_requested: AtomicBool,
    noise: Mutex<NoiseSettings>,
    /// Bumped after every `set_noise`
    noise_generation: AtomicU64,
}

/// Cloneable handle shared between the tracking thread and a settings UI
#[derive(Debug, Clone)]
pub struct FilterControl {
    inner: Arc<ControlState>,
}

impl Default for FilterControl {
    fn default() -> Self {
        Self::new(NoiseSettings::default())
    }
}

impl FilterControl {
    pub fn new(noise: NoiseSettings) -> Self {
        let noise = noise.sanitized();
        Self {
            inner: Arc::new(ControlState {
                reset_requested: AtomicBool::new(false),
                noise: Mutex::new(noise),
                noise_generation: AtomicU64::new(0),
            }),
        }
    }

    /// Ask the filter to discard its history on the next frame
    pub fn request_reset(&self) {
        self.inner.reset_requested.store(true, Ordering::Release);
    }

    /// Consume a pending reset request
    pub fn take_reset(&self) -> bool {
        self.inner.reset_requested.swap(false, Ordering::AcqRel)
    }

    pub fn reset_pending(&self) -> bool {
        self.inner.reset_requested.load(Ordering::Acquire)
    }

    /// Publish new slider positions; values are clamped into [0, 1]
    pub fn set_noise(&self, noise: NoiseSettings) {
        let noise = noise.sanitized();
        {
            let mut current = self.inner.noise.lock().unwrap_or_else(PoisonError::into_inner);
            *current = noise;
        }
        self.inner.noise_generation.fetch_add(1, Ordering::AcqRel);
    }

    /// Latest published slider pair; never a mix of two `set_noise` calls
    pub fn noise(&self) -> NoiseSettings {
        *self.inner.noise.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of `set_noise` calls so far
    pub fn noise_generation(&self) -> u64 {
        self.inner.noise_generation.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_reset_flag_is_consumed_once() {
        let control = FilterControl::default();
        assert!(!control.take_reset());

        control.request_reset();
        control.request_reset();
        assert!(control.reset_pending());
        assert!(control.take_reset());
        assert!(!control.take_reset());
    }

    #[test]
    fn test_request_from_other_thread() {
        let control = FilterControl::default();
        let ui = control.clone();

        thread::spawn(move || {
            ui.set_noise(NoiseSettings::new(0.9, 0.1));
            ui.request_reset();
        })
        .join()
        .unwrap();

        assert!(control.take_reset());
        assert_eq!(control.noise(), NoiseSettings::new(0.9, 0.1));
    }

    #[test]
    fn test_noise_is_clamped() {
        let control = FilterControl::new(NoiseSettings {
            position_slider: 3.0,
            rotation_slider: -1.0,
        });
        assert_eq!(control.noise(), NoiseSettings::new(1.0, 0.0));
    }

    #[test]
    fn test_slider_pair_is_published_atomically() {
        let control = FilterControl::default();
        let ui = control.clone();

        let writer = thread::spawn(move || {
            for i in 0..2000 {
                let v = (i % 100) as f64 / 100.0;
                ui.set_noise(NoiseSettings::new(v, v));
            }
        });
        for _ in 0..2000 {
            let noise = control.noise();
            assert_eq!(noise.position_slider, noise.rotation_slider);
        }
        writer.join().unwrap();
        assert_eq!(control.noise_generation(), 2000);
    }
}
