//! Backend for locally decoded audio.
//!
//! The playback clock is pushed forward by the driver through
//! [`Backend::advance`], which reports a time update every tick. Region
//! looping happens here so the wrap back to the region start never passes
//! through the controller.

use std::time::Duration;

use duet_core::{clamp_time, Error, Result, Track, Volume};
use tracing::{debug, info, trace};

use super::{
    Backend, BackendEvent, Capabilities, EventSink, RateControl, RegionLoop, VolumeControl,
};
use crate::region::LoopRegion;

/// Opens local sources for playback.
pub trait LocalMedia {
    /// Open `source_ref` and return its duration in seconds.
    fn open(&mut self, source_ref: &str) -> Result<f64>;
}

/// Locally decoded playback with rate, region loop and volume support.
pub struct LocalAudioBackend {
    media: Box<dyn LocalMedia + Send>,
    sink: Option<EventSink>,
    source: Option<String>,
    position: f64,
    duration: f64,
    playing: bool,
    rate: f64,
    volume: Volume,
    region: Option<LoopRegion>,
}

impl LocalAudioBackend {
    pub fn new(media: impl LocalMedia + Send + 'static) -> Self {
        Self {
            media: Box::new(media),
            sink: None,
            source: None,
            position: 0.0,
            duration: 0.0,
            playing: false,
            rate: 1.0,
            volume: Volume::DEFAULT,
            region: None,
        }
    }

    pub const fn is_playing(&self) -> bool {
        self.playing
    }

    fn emit(&self, event: BackendEvent) {
        if let Some(sink) = &self.sink {
            sink.emit(event);
        }
    }

    /// Keep the region inside the known duration.
    fn fit_region(&self, region: LoopRegion) -> Option<LoopRegion> {
        if self.duration <= 0.0 || region.end() <= self.duration {
            return Some(region);
        }
        LoopRegion::new(region.start(), self.duration).ok()
    }
}

impl Backend for LocalAudioBackend {
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            playback_rate: true,
            region_loop: true,
            volume: true,
        }
    }

    fn attach(&mut self, sink: EventSink) {
        debug!("Local backend attached ({})", sink.generation());
        self.sink = Some(sink);
    }

    fn detach(&mut self) {
        if let Some(sink) = self.sink.take() {
            debug!("Local backend detached ({})", sink.generation());
        }
        self.playing = false;
    }

    fn load(&mut self, track: &Track) -> Result<()> {
        self.playing = false;
        self.position = 0.0;
        self.duration = 0.0;
        self.region = None;
        self.source = None;

        let duration = self
            .media
            .open(&track.source_ref)
            .map_err(|e| Error::load(&track.source_ref, e.to_string()))?;

        info!("Opened local source {} ({duration:.2}s)", track.source_ref);
        self.source = Some(track.source_ref.clone());
        self.duration = if duration.is_finite() { duration.max(0.0) } else { 0.0 };
        self.emit(BackendEvent::Ready {
            duration: self.duration,
        });
        Ok(())
    }

    fn play(&mut self) {
        if self.source.is_none() {
            self.emit(BackendEvent::Error("No track loaded".to_string()));
            return;
        }
        if self.duration > 0.0 && self.position >= self.duration {
            self.position = 0.0;
        }
        self.playing = true;
    }

    fn pause(&mut self) {
        self.playing = false;
    }

    fn seek(&mut self, seconds: f64) {
        if self.source.is_none() {
            return;
        }
        self.position = clamp_time(seconds, self.duration);
        self.emit(BackendEvent::TimeUpdate(self.position));
    }

    fn current_time(&self) -> f64 {
        self.position
    }

    fn duration(&self) -> f64 {
        self.duration
    }

    fn advance(&mut self, elapsed: Duration) {
        if !self.playing || self.source.is_none() {
            return;
        }

        let previous = self.position;
        let mut position = previous + elapsed.as_secs_f64() * self.rate;

        if let Some(region) = self.region {
            if previous < region.end() && position >= region.end() {
                position = region.wrap(position);
                trace!("Region wrap to {position:.3}s");
                self.position = position;
                self.emit(BackendEvent::TimeUpdate(position));
                return;
            }
        }

        if self.duration > 0.0 && position >= self.duration {
            self.position = self.duration;
            self.playing = false;
            self.emit(BackendEvent::TimeUpdate(self.duration));
            self.emit(BackendEvent::Ended);
            return;
        }

        self.position = position;
        self.emit(BackendEvent::TimeUpdate(position));
    }

    fn rate_control(&mut self) -> Option<&mut dyn RateControl> {
        Some(self)
    }

    fn region_loop(&mut self) -> Option<&mut dyn RegionLoop> {
        Some(self)
    }

    fn volume_control(&mut self) -> Option<&mut dyn VolumeControl> {
        Some(self)
    }
}

impl RateControl for LocalAudioBackend {
    fn playback_rate(&self) -> f64 {
        self.rate
    }

    fn set_playback_rate(&mut self, rate: f64) {
        if rate.is_finite() && rate > 0.0 {
            self.rate = rate;
        }
    }
}

impl RegionLoop for LocalAudioBackend {
    fn region(&self) -> Option<LoopRegion> {
        self.region
    }

    fn set_region(&mut self, region: Option<LoopRegion>) {
        self.region = region.and_then(|r| self.fit_region(r));
    }
}

impl VolumeControl for LocalAudioBackend {
    fn volume(&self) -> Volume {
        self.volume
    }

    fn set_volume(&mut self, volume: Volume) {
        self.volume = volume;
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)] // Tests use unwrap for brevity

    use super::*;
    use crossbeam_channel::{unbounded, Receiver};
    use duet_core::{Generation, TrackDescriptor};

    use crate::backend::Envelope;

    struct FixedMedia(f64);

    impl LocalMedia for FixedMedia {
        fn open(&mut self, source_ref: &str) -> Result<f64> {
            if source_ref.ends_with(".bad") {
                return Err(Error::Parse("unsupported format".into()));
            }
            Ok(self.0)
        }
    }

    fn loaded(duration: f64) -> (LocalAudioBackend, Receiver<Envelope>) {
        let (tx, rx) = unbounded();
        let mut backend = LocalAudioBackend::new(FixedMedia(duration));
        backend.attach(EventSink::new(tx, Generation::new(1)));
        let track = Track::from(TrackDescriptor::local("Song", "song.flac"));
        backend.load(&track).unwrap();
        (backend, rx)
    }

    fn events(rx: &Receiver<Envelope>) -> Vec<BackendEvent> {
        rx.try_iter().map(|e| e.event).collect()
    }

    #[test]
    fn test_load_emits_ready() {
        let (_backend, rx) = loaded(120.0);
        assert_eq!(events(&rx), vec![BackendEvent::Ready { duration: 120.0 }]);
    }

    #[test]
    fn test_load_failure_is_returned() {
        let mut backend = LocalAudioBackend::new(FixedMedia(10.0));
        let track = Track::from(TrackDescriptor::local("Broken", "broken.bad"));
        let err = backend.load(&track).unwrap_err();
        assert!(matches!(err, Error::Load { .. }));
    }

    #[test]
    fn test_advance_applies_rate() {
        let (mut backend, rx) = loaded(120.0);
        events(&rx);
        backend.set_playback_rate(2.0);
        backend.play();
        backend.advance(Duration::from_millis(500));
        assert!((backend.current_time() - 1.0).abs() < 1e-9);
        assert_eq!(events(&rx), vec![BackendEvent::TimeUpdate(1.0)]);
    }

    #[test]
    fn test_paused_clock_does_not_move() {
        let (mut backend, _rx) = loaded(120.0);
        backend.advance(Duration::from_secs(5));
        assert!(backend.current_time().abs() < f64::EPSILON);
    }

    #[test]
    fn test_natural_end_emits_ended_once() {
        let (mut backend, rx) = loaded(3.0);
        events(&rx);
        backend.play();
        backend.advance(Duration::from_secs(5));
        backend.advance(Duration::from_secs(5));

        assert_eq!(
            events(&rx),
            vec![BackendEvent::TimeUpdate(3.0), BackendEvent::Ended]
        );
        assert!(!backend.is_playing());
    }

    #[test]
    fn test_region_wraps_without_ended() {
        let (mut backend, rx) = loaded(60.0);
        backend.set_region(Some(LoopRegion::new(10.0, 12.0).unwrap()));
        backend.seek(11.5);
        backend.play();
        events(&rx);

        backend.advance(Duration::from_secs(1));
        assert!((backend.current_time() - 10.5).abs() < 1e-9);
        assert!(!events(&rx).contains(&BackendEvent::Ended));
        assert!(backend.is_playing());
    }

    #[test]
    fn test_region_is_fit_to_duration() {
        let (mut backend, _rx) = loaded(20.0);
        backend.set_region(Some(LoopRegion::new(15.0, 30.0).unwrap()));
        assert_eq!(backend.region().map(|r| r.end()), Some(20.0));

        backend.set_region(Some(LoopRegion::new(25.0, 30.0).unwrap()));
        assert!(backend.region().is_none());
    }

    #[test]
    fn test_seek_clamps() {
        let (mut backend, rx) = loaded(30.0);
        events(&rx);
        backend.seek(-4.0);
        backend.seek(99.0);
        assert_eq!(
            events(&rx),
            vec![BackendEvent::TimeUpdate(0.0), BackendEvent::TimeUpdate(30.0)]
        );
    }

    #[test]
    fn test_play_without_source_reports_error() {
        let (tx, rx) = unbounded();
        let mut backend = LocalAudioBackend::new(FixedMedia(10.0));
        backend.attach(EventSink::new(tx, Generation::new(1)));
        backend.play();
        assert_eq!(
            events(&rx),
            vec![BackendEvent::Error("No track loaded".to_string())]
        );
    }

    #[test]
    fn test_detached_backend_is_silent() {
        let (mut backend, rx) = loaded(30.0);
        events(&rx);
        backend.detach();
        backend.seek(5.0);
        assert!(events(&rx).is_empty());
    }
}
