//! 記録済みランドマークの再生
//!
//! 1 行 1 フレームの JSON Lines を読み、指定 FPS で配信する。

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

use crate::landmark::LandmarkFrame;

pub struct LandmarkReplay {
    frames: Vec<LandmarkFrame>,
    interval: Duration,
    looping: bool,
    cursor: usize,
    next_due: Option<Instant>,
}

impl LandmarkReplay {
    pub fn load<P: AsRef<Path>>(path: P, fps: f32, looping: bool) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read replay: {}", path.display()))?;
        let frames = parse_frames(&text)
            .with_context(|| format!("Failed to parse replay: {}", path.display()))?;
        log::info!("replay: {} frames from {}", frames.len(), path.display());
        Self::from_frames(frames, fps, looping)
    }

    pub fn from_frames(frames: Vec<LandmarkFrame>, fps: f32, looping: bool) -> Result<Self> {
        if !fps.is_finite() || fps <= 0.0 {
            bail!("replay fps must be positive: {}", fps);
        }
        Ok(Self {
            frames,
            interval: Duration::from_secs_f64(1.0 / fps as f64),
            looping,
            cursor: 0,
            next_due: None,
        })
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// ループしない再生が終わったか
    pub fn is_finished(&self) -> bool {
        !self.looping && self.cursor >= self.frames.len()
    }

    /// 次のフレームの時刻になっていれば返す
    ///
    /// 大きく遅れた場合は追いつこうとせず、そこから刻み直す。
    pub fn poll(&mut self, now: Instant) -> Option<LandmarkFrame> {
        if self.frames.is_empty() {
            return None;
        }
        if let Some(due) = self.next_due {
            if now < due {
                return None;
            }
        }
        if self.cursor >= self.frames.len() {
            if !self.looping {
                return None;
            }
            self.cursor = 0;
        }
        let frame = self.frames[self.cursor].clone();
        self.cursor += 1;
        self.next_due = Some(match self.next_due {
            Some(due) if now.saturating_duration_since(due) < self.interval => due + self.interval,
            _ => now + self.interval,
        });
        Some(frame)
    }
}

/// 空行は読み飛ばす。壊れた行があれば行番号付きでエラー
pub fn parse_frames(text: &str) -> Result<Vec<LandmarkFrame>> {
    let mut frames = Vec::new();
    for (i, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let frame: LandmarkFrame =
            serde_json::from_str(line).with_context(|| format!("line {}", i + 1))?;
        frames.push(frame);
    }
    Ok(frames)
}
