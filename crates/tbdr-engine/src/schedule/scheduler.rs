use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result};

/// How consecutive frames are allowed to overlap.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum ScheduleMode {
    /// Each frame's commands complete before the next frame is encoded.
    Serial,
    /// The driver may overlap frames, bounded by the frames-in-flight limit.
    #[default]
    Unconstrained,
}

impl fmt::Display for ScheduleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ScheduleMode::Serial => "serial",
            ScheduleMode::Unconstrained => "unconstrained",
        })
    }
}

impl FromStr for ScheduleMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "serial" => Ok(ScheduleMode::Serial),
            "unconstrained" => Ok(ScheduleMode::Unconstrained),
            other => Err(format!(
                "unknown schedule mode {other:?} (expected serial or unconstrained)"
            )),
        }
    }
}

/// Submits frames and throttles them according to a `ScheduleMode`.
pub struct CommandScheduler {
    mode: ScheduleMode,
    max_in_flight: usize,
    in_flight: VecDeque<wgpu::SubmissionIndex>,
    submitted: u64,
}

impl CommandScheduler {
    /// `max_frames_in_flight` is clamped to at least one; serial mode always
    /// behaves as if it were one.
    pub fn new(mode: ScheduleMode, max_frames_in_flight: usize) -> Self {
        let max_in_flight = match mode {
            ScheduleMode::Serial => 1,
            ScheduleMode::Unconstrained => max_frames_in_flight.max(1),
        };
        Self {
            mode,
            max_in_flight,
            in_flight: VecDeque::with_capacity(max_in_flight),
            submitted: 0,
        }
    }

    #[inline]
    pub fn mode(&self) -> ScheduleMode {
        self.mode
    }

    #[inline]
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight
    }

    #[inline]
    pub fn submitted(&self) -> u64 {
        self.submitted
    }

    /// Blocks until a frame slot is free.
    ///
    /// Call before encoding a frame so that the output target it will write
    /// is no longer read by the GPU.
    pub fn begin_frame(&mut self, device: &wgpu::Device) -> Result<()> {
        while self.in_flight.len() >= self.max_in_flight {
            let Some(index) = self.in_flight.pop_front() else { break };
            wait_for(device, index)?;
        }
        Ok(())
    }

    /// Submits one frame worth of commands.
    pub fn submit(&mut self, queue: &wgpu::Queue, commands: wgpu::CommandBuffer) {
        let index = queue.submit(std::iter::once(commands));
        self.in_flight.push_back(index);
        self.submitted += 1;
    }

    /// Waits for every outstanding frame.
    pub fn finish(&mut self, device: &wgpu::Device) -> Result<()> {
        if let Some(index) = self.in_flight.pop_back() {
            // Queue order: the newest submission completing implies the rest did.
            self.in_flight.clear();
            wait_for(device, index)?;
        }
        Ok(())
    }
}

fn wait_for(device: &wgpu::Device, index: wgpu::SubmissionIndex) -> Result<()> {
    device
        .poll(wgpu::PollType::Wait {
            submission_index: Some(index),
            timeout: None,
        })
        .context("failed waiting for GPU submission")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serial_allows_one_frame_in_flight() {
        let s = CommandScheduler::new(ScheduleMode::Serial, 3);
        assert_eq!(s.max_in_flight(), 1);
    }

    #[test]
    fn unconstrained_keeps_requested_depth() {
        assert_eq!(
            CommandScheduler::new(ScheduleMode::Unconstrained, 3).max_in_flight(),
            3
        );
        assert_eq!(
            CommandScheduler::new(ScheduleMode::Unconstrained, 0).max_in_flight(),
            1
        );
    }

    #[test]
    fn mode_parses_and_displays() {
        for mode in [ScheduleMode::Serial, ScheduleMode::Unconstrained] {
            assert_eq!(mode.to_string().parse::<ScheduleMode>(), Ok(mode));
        }
        assert!("parallel".parse::<ScheduleMode>().is_err());
        assert_eq!(ScheduleMode::default(), ScheduleMode::Unconstrained);
    }
}
