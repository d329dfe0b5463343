//! Retreat-and-sample routine
//!
//! Backs the stage away from the sample while polling the gauge and the
//! traced position lines, producing a time series of both. The run ends
//! when the force gets too high (the motor is stopped), when contact has
//! been lost for long enough, or when the sample budget runs out.

use std::time::{Duration, Instant};

use forcestage_core::motion::pulses_to_mm;
use tracing::{debug, info, warn};

use crate::channel::LineChannel;
use crate::config::SamplingConfig;
use crate::error::Result;
use crate::framing::RequestFraming;
use crate::gauge::{ForceGauge, GAUGE_ERROR};
use crate::motion::{pulses_for_mm, StageClient, INVALID_POSITION};

/// Limits of one run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingParams {
    pub force_limit_n: f64,
    pub force_buffer_n: f64,
    pub no_force_limit: Duration,
    pub max_samples: usize,
    pub travel_pulses: u32,
}

impl From<&SamplingConfig> for SamplingParams {
    fn from(config: &SamplingConfig) -> Self {
        Self {
            force_limit_n: config.force_limit_n,
            force_buffer_n: config.force_buffer_n,
            no_force_limit: Duration::from_secs_f64(config.no_force_limit_s.max(0.0)),
            max_samples: config.max_samples,
            travel_pulses: pulses_for_mm(config.travel_mm),
        }
    }
}

/// Why a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Force magnitude exceeded the limit; the motor was stopped
    ForceLimit,
    /// Contact was lost for longer than the no-force limit
    ForceReleased,
    /// Sample budget used up
    SampleLimit,
}

/// Time series of one run; times are measured from the start of sampling
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MotionRecord {
    pub force: Vec<(Duration, f64)>,
    pub position: Vec<(Duration, i32)>,
}

impl MotionRecord {
    /// Largest valid force magnitude
    pub fn peak_force(&self) -> f64 {
        self.force
            .iter()
            .map(|(_, f)| *f)
            .filter(|f| *f != GAUGE_ERROR)
            .fold(0.0, |peak, f| peak.max(f.abs()))
    }

    /// Distance between the extreme valid positions
    pub fn travel_mm(&self) -> f32 {
        let valid = self
            .position
            .iter()
            .map(|(_, p)| *p)
            .filter(|p| *p != INVALID_POSITION);
        let (min, max) = valid.fold((i32::MAX, i32::MIN), |(lo, hi), p| (lo.min(p), hi.max(p)));
        if min > max {
            return 0.0;
        }
        pulses_to_mm(max - min)
    }
}

/// Summary of a finished run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub reason: StopReason,
    pub samples: usize,
    pub peak_force_n: f64,
    pub travel_mm: f32,
}

/// Retreat from the sample and record force and position
pub fn retreat_and_sample<C, F, G>(
    stage: &mut StageClient<C, F>,
    gauge: &mut ForceGauge<G>,
    params: &SamplingParams,
) -> Result<(MotionRecord, RunSummary)>
where
    C: LineChannel,
    F: RequestFraming,
    G: LineChannel,
{
    let mut record = MotionRecord::default();
    stage.quick_backward(params.travel_pulses)?;
    info!("Retreating {} pulses while sampling", params.travel_pulses);

    let started = Instant::now();
    let mut last_contact: Option<Instant> = None;
    let reason = loop {
        let force = gauge.read_force()?;
        record.force.push((started.elapsed(), force));
        let position = stage.quick_listen()?;
        record.position.push((started.elapsed(), position));
        debug!("Sample: {} N at {}", force, position);

        if force == GAUGE_ERROR {
            warn!("Skipping limit checks for a failed gauge reading");
        } else if force.abs() > params.force_limit_n {
            warn!(
                "Force {} N exceeds limit {} N, stopping motor",
                force, params.force_limit_n
            );
            break StopReason::ForceLimit;
        } else if force.abs() > params.force_buffer_n {
            last_contact = Some(Instant::now());
        } else if let Some(contact) = last_contact {
            if contact.elapsed() >= params.no_force_limit {
                info!("No force for {:?}, ending run", params.no_force_limit);
                break StopReason::ForceReleased;
            }
        }

        if record.force.len() >= params.max_samples {
            break StopReason::SampleLimit;
        }
    };
    // The traced retreat is still running on every exit
    stage.stop_motor(false)?;

    let summary = RunSummary {
        reason,
        samples: record.force.len(),
        peak_force_n: record.peak_force(),
        travel_mm: record.travel_mm(),
    };
    info!(
        "Run ended ({:?}): {} samples, peak {} N, travel {} mm",
        summary.reason, summary.samples, summary.peak_force_n, summary.travel_mm
    );
    Ok((record, summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::scripted::ScriptedChannel;
    use crate::config::MotionConfig;
    use crate::controller::Controller;

    fn params(max_samples: usize) -> SamplingParams {
        SamplingParams {
            force_limit_n: 20.0,
            force_buffer_n: 0.02,
            no_force_limit: Duration::ZERO,
            max_samples,
            travel_pulses: 400,
        }
    }

    fn stage(replies: &[&str]) -> StageClient<ScriptedChannel> {
        let mut channel = ScriptedChannel::new(&["motor.set_direction(origin)", "motor.step(400, trace)"]);
        channel.push(replies);
        StageClient::new(Controller::new(channel), MotionConfig::default(), false)
    }

    #[test]
    fn test_force_limit_stops_motor() {
        let mut stage = stage(&[">>>", "8", "16", "motor.no_step()", ">>>"]);
        let mut gauge = ForceGauge::new(
            ScriptedChannel::new(&["0.01 N", "5.0 N", "-25.0 N"]),
            Duration::ZERO,
        );

        let (record, summary) = retreat_and_sample(&mut stage, &mut gauge, &params(100)).unwrap();
        assert_eq!(summary.reason, StopReason::ForceLimit);
        assert_eq!(summary.samples, 3);
        assert_eq!(summary.peak_force_n, 25.0);
        assert_eq!(record.position.iter().map(|(_, p)| *p).collect::<Vec<_>>(), [-99, 8, 16]);
        assert_eq!(summary.travel_mm, 0.1);

        let written = &stage.controller_mut().channel_mut().written;
        assert_eq!(written.last().map(String::as_str), Some("motor.no_step()\r\x0c"));
    }

    fn last_request(stage: &mut StageClient<ScriptedChannel>) -> Option<String> {
        stage.controller_mut().channel_mut().written.last().cloned()
    }

    #[test]
    fn test_contact_released() {
        let mut stage = stage(&["8", "16", "motor.no_step()", ">>>"]);
        let mut gauge = ForceGauge::new(
            ScriptedChannel::new(&["0.5 N", "0.01 N"]),
            Duration::ZERO,
        );

        let (_, summary) = retreat_and_sample(&mut stage, &mut gauge, &params(100)).unwrap();
        assert_eq!(summary.reason, StopReason::ForceReleased);
        assert_eq!(summary.samples, 2);
        assert_eq!(last_request(&mut stage).as_deref(), Some("motor.no_step()\r\x0c"));
    }

    #[test]
    fn test_sample_budget() {
        let mut stage = stage(&[]);
        let mut gauge = ForceGauge::new(ScriptedChannel::new(&[]), Duration::ZERO);
        gauge_fallback(&mut gauge, "0.00 N");

        let (record, summary) = retreat_and_sample(&mut stage, &mut gauge, &params(5)).unwrap();
        assert_eq!(summary.reason, StopReason::SampleLimit);
        assert_eq!(record.force.len(), 5);
        assert_eq!(summary.travel_mm, 0.0);
        assert_eq!(last_request(&mut stage).as_deref(), Some("motor.no_step()\r\x0c"));
    }

    fn gauge_fallback(gauge: &mut ForceGauge<ScriptedChannel>, reply: &str) {
        gauge.channel_mut().fallback = reply.to_string();
    }
}
