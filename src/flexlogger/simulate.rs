//! Simulated temperature chamber
//!
//! Feeds three FlexLogger input channels with a random walk so a project can
//! be exercised without hardware.

use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

use crate::tag::{BufferedWriter, DataType, StoreError, TagData, TagStore, TagValue};
use crate::utils::CancelToken;

use super::{TagPrefix, create_input_channel};

pub(crate) const CHAMBER_GROUP: &str = "Temperature Chamber";
/// Channel names and starting temperatures
pub(crate) const CHAMBER_CHANNELS: [(&str, f64); 3] =
    [("Ceiling", 78.0), ("Door", 76.0), ("Floor", 74.0)];
const STEP_STD_DEV: f64 = 0.2;
const WRITER_BUFFER_SIZE: usize = 10;

pub(crate) struct TempChamber {
    channels: Vec<TagData>,
    values: Vec<f64>,
}

impl TempChamber {
    pub(crate) fn create(store: &dyn TagStore, prefix: &TagPrefix) -> Result<Self, StoreError> {
        let mut channels = Vec::with_capacity(CHAMBER_CHANNELS.len());
        let mut values = Vec::with_capacity(CHAMBER_CHANNELS.len());
        for (name, initial) in CHAMBER_CHANNELS {
            channels.push(create_input_channel(
                store,
                prefix,
                CHAMBER_GROUP,
                name,
                DataType::Double,
            )?);
            values.push(initial);
        }
        Ok(Self { channels, values })
    }

    pub(crate) fn channels(&self) -> &[TagData] {
        &self.channels
    }

    pub(crate) fn values(&self) -> &[f64] {
        &self.values
    }

    /// Write the current values with one shared timestamp and flush
    pub(crate) fn write_sample(
        &self,
        writer: &mut BufferedWriter<'_>,
        timestamp: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        for (channel, value) in self.channels.iter().zip(&self.values) {
            writer.write_at(&channel.path, TagValue::Double(*value), timestamp)?;
        }
        writer.send_buffered_writes()
    }

    pub(crate) fn step<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for value in &mut self.values {
            let delta: f64 = StandardNormal.sample(rng);
            *value += delta * STEP_STD_DEV;
        }
    }

    /// Write a sample every `interval` until cancelled. Returns the sample count.
    pub(crate) fn run(
        &mut self,
        store: &dyn TagStore,
        interval: Duration,
        cancel: &CancelToken,
    ) -> Result<u64, StoreError> {
        let mut writer = BufferedWriter::new(store, WRITER_BUFFER_SIZE);
        let mut rng = rand::thread_rng();
        let mut samples = 0;
        loop {
            self.write_sample(&mut writer, Utc::now())?;
            samples += 1;
            tracing::trace!(samples, values = ?self.values, "wrote chamber sample");
            if cancel.sleep(interval) {
                return Ok(samples);
            }
            self.step(&mut rng);
        }
    }
}
