use std::time::{Duration, Instant};

const WINDOW: Duration = Duration::from_secs(1);

/// 1 秒以上の区間ごとにフレーム数を数える
#[derive(Debug, Clone)]
pub struct FpsCounter {
    frames: u32,
    started: Instant,
    last: Option<f32>,
}

impl FpsCounter {
    pub fn new(now: Instant) -> Self {
        Self {
            frames: 0,
            started: now,
            last: None,
        }
    }

    /// 1 フレーム数える。区間が閉じたときだけ FPS を返す
    pub fn tick(&mut self, now: Instant) -> Option<f32> {
        self.frames += 1;
        let elapsed = now.saturating_duration_since(self.started);
        if elapsed < WINDOW {
            return None;
        }
        let fps = self.frames as f32 / elapsed.as_secs_f32();
        self.frames = 0;
        self.started = now;
        self.last = Some(fps);
        Some(fps)
    }

    /// 直近に閉じた区間の値
    pub fn last(&self) -> Option<f32> {
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq_f32(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn test_reports_after_one_second() {
        let t0 = Instant::now();
        let mut fps = FpsCounter::new(t0);
        for i in 1..30 {
            assert_eq!(fps.tick(t0 + Duration::from_millis(i * 33)), None);
        }
        let value = fps.tick(t0 + Duration::from_millis(1000)).unwrap();
        assert!(approx_eq_f32(value, 30.0));
        assert_eq!(fps.last(), Some(value));
    }

    #[test]
    fn test_window_restarts() {
        let t0 = Instant::now();
        let mut fps = FpsCounter::new(t0);
        fps.tick(t0 + Duration::from_secs(2));
        assert_eq!(fps.tick(t0 + Duration::from_millis(2500)), None);
        let value = fps.tick(t0 + Duration::from_secs(4)).unwrap();
        assert!(approx_eq_f32(value, 1.0));
    }
}
