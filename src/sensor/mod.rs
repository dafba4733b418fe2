//! Accelerometer input abstractions.
//!
//! The core never talks to hardware directly: it pulls one [`AccelSample`]
//! per sampling tick from a [`SensorSource`]. Platform code implements the
//! trait; [`ScriptedSensor`] replays recorded frames for the CLI and tests.

use crate::error::SensorError;

pub mod scripted;

pub use scripted::{ScriptedSensor, SensorFixture};

/// One accelerometer reading in raw sensor units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AccelSample {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    /// Taken while haptic output was running; never classified.
    #[serde(default)]
    pub settling: bool,
}

impl AccelSample {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self {
            x,
            y,
            z,
            settling: false,
        }
    }

    /// Same reading, flagged as taken during vibration
    pub fn settling(mut self) -> Self {
        self.settling = true;
        self
    }
}

/// Trait implemented by accelerometer drivers.
///
/// Called once per sampling tick on the event loop, so implementations must
/// return immediately. `Ok(None)` means no fresh reading this tick.
pub trait SensorSource: Send {
    fn poll_sample(&mut self) -> Result<Option<AccelSample>, SensorError>;

    /// Side-channel query for haptic output in progress.
    ///
    /// Drivers that cannot flag individual samples report it here instead.
    fn is_settling(&self) -> bool {
        false
    }
}

impl<S: SensorSource + ?Sized> SensorSource for Box<S> {
    fn poll_sample(&mut self) -> Result<Option<AccelSample>, SensorError> {
        (**self).poll_sample()
    }

    fn is_settling(&self) -> bool {
        (**self).is_settling()
    }
}

/// Poll one sample, folding the side-channel settling flag into it.
pub fn read_sample<S: SensorSource + ?Sized>(
    sensor: &mut S,
) -> Result<Option<AccelSample>, SensorError> {
    let settling = sensor.is_settling();
    Ok(sensor.poll_sample()?.map(|mut sample| {
        sample.settling |= settling;
        sample
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingSensor;

    impl SensorSource for FailingSensor {
        fn poll_sample(&mut self) -> Result<Option<AccelSample>, SensorError> {
            Err(SensorError::Unavailable)
        }
    }

    struct VibratingSensor;

    impl SensorSource for VibratingSensor {
        fn poll_sample(&mut self) -> Result<Option<AccelSample>, SensorError> {
            Ok(Some(AccelSample::new(2000, 0, 0)))
        }

        fn is_settling(&self) -> bool {
            true
        }
    }

    #[test]
    fn test_read_sample_passes_errors_through() {
        assert_eq!(read_sample(&mut FailingSensor), Err(SensorError::Unavailable));
    }

    #[test]
    fn test_read_sample_applies_side_channel_settling() {
        let sample = read_sample(&mut VibratingSensor).unwrap().unwrap();
        assert!(sample.settling);
        assert_eq!(sample.x, 2000);
    }

    #[test]
    fn test_settling_default_false_in_json() {
        let sample: AccelSample = serde_json::from_str(r#"{"x":1,"y":2,"z":3}"#).unwrap();
        assert_eq!(sample, AccelSample::new(1, 2, 3));
    }
}
