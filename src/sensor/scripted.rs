// ScriptedSensor - deterministic sample replay
//
// Replays a recorded list of frames, one per sampling tick. A `null` frame in
// a fixture stands for a tick where the driver had no reading. Fixtures are
// JSON files:
//
// { "name": "punch_burst", "looping": true, "frames": [ {"x":0,"y":0,"z":-1000}, null ] }

use std::fs;
use std::path::Path;

use crate::error::SensorError;
use crate::sensor::{AccelSample, SensorSource};

/// Recorded accelerometer frames loaded from disk
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct SensorFixture {
    #[serde(default)]
    pub name: String,
    /// Restart from the first frame when exhausted
    #[serde(default)]
    pub looping: bool,
    pub frames: Vec<Option<AccelSample>>,
}

impl SensorFixture {
    /// Load a fixture from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(&path)?;
        let fixture: SensorFixture = serde_json::from_str(&contents)?;
        log::info!(
            "[Fixture] Loaded {} frames from {:?}",
            fixture.frames.len(),
            path.as_ref()
        );
        Ok(fixture)
    }
}

/// Sensor replaying scripted frames
pub struct ScriptedSensor {
    frames: Vec<Option<AccelSample>>,
    cursor: usize,
    looping: bool,
}

impl ScriptedSensor {
    pub fn new(frames: Vec<Option<AccelSample>>, looping: bool) -> Self {
        Self {
            frames,
            cursor: 0,
            looping,
        }
    }

    /// Sensor returning the same reading on every tick
    pub fn constant(sample: AccelSample) -> Self {
        Self::new(vec![Some(sample)], true)
    }

    /// Sensor that never produces a reading
    pub fn silent() -> Self {
        Self::new(Vec::new(), false)
    }

    pub fn from_fixture(fixture: SensorFixture) -> Self {
        Self::new(fixture.frames, fixture.looping)
    }

    /// Whether a non-looping script has run out of frames
    pub fn is_exhausted(&self) -> bool {
        !self.looping && self.cursor >= self.frames.len()
    }
}

impl SensorSource for ScriptedSensor {
    fn poll_sample(&mut self) -> Result<Option<AccelSample>, SensorError> {
        if self.frames.is_empty() {
            return Ok(None);
        }
        if self.cursor >= self.frames.len() {
            if !self.looping {
                return Err(SensorError::Disconnected);
            }
            self.cursor = 0;
        }
        let frame = self.frames[self.cursor];
        self.cursor += 1;
        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replays_in_order_then_disconnects() {
        let mut sensor = ScriptedSensor::new(
            vec![Some(AccelSample::new(1, 0, 0)), None, Some(AccelSample::new(3, 0, 0))],
            false,
        );
        assert_eq!(sensor.poll_sample().unwrap().unwrap().x, 1);
        assert_eq!(sensor.poll_sample().unwrap(), None);
        assert_eq!(sensor.poll_sample().unwrap().unwrap().x, 3);
        assert!(sensor.is_exhausted());
        assert_eq!(sensor.poll_sample(), Err(SensorError::Disconnected));
    }

    #[test]
    fn test_looping_wraps_around() {
        let mut sensor = ScriptedSensor::new(
            vec![Some(AccelSample::new(1, 0, 0)), Some(AccelSample::new(2, 0, 0))],
            true,
        );
        let xs: Vec<i32> = (0..5)
            .map(|_| sensor.poll_sample().unwrap().unwrap().x)
            .collect();
        assert_eq!(xs, vec![1, 2, 1, 2, 1]);
        assert!(!sensor.is_exhausted());
    }

    #[test]
    fn test_silent_sensor() {
        let mut sensor = ScriptedSensor::silent();
        assert_eq!(sensor.poll_sample().unwrap(), None);
    }

    #[test]
    fn test_fixture_json_with_gaps() {
        let json = r#"{
            "name": "gaps",
            "looping": true,
            "frames": [ {"x": 10, "y": 20, "z": 30, "settling": true}, null ]
        }"#;
        let fixture: SensorFixture = serde_json::from_str(json).unwrap();
        assert_eq!(fixture.frames.len(), 2);
        assert!(fixture.frames[0].unwrap().settling);
        assert!(fixture.frames[1].is_none());
    }
}
