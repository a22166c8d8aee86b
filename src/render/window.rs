use std::f32::consts::PI;

use anyhow::Result;
use minifb::{Key, KeyRepeat, Window, WindowOptions};

use crate::mode::{Control, Mode};
use crate::render::raster::PixelSurface;
use crate::render::wireframe::StyleKind;

/// 矢印キー 1 回分の回転
const ROTATE_STEP: f32 = PI / 12.0;
const SCALE_STEP: f32 = 1.1;

/// minifbを使用したレンダラー
pub struct MinifbRenderer {
    window: Window,
    /// 左右反転用の作業バッファ
    mirrored: Vec<u32>,
}

impl MinifbRenderer {
    /// ウィンドウを作成
    pub fn new(title: &str, width: usize, height: usize) -> Result<Self> {
        let window = Window::new(
            title,
            width,
            height,
            WindowOptions {
                resize: true,
                ..WindowOptions::default()
            },
        )?;

        Ok(Self {
            window,
            mirrored: Vec::new(),
        })
    }

    pub fn set_target_fps(&mut self, fps: u32) {
        self.window.set_target_fps(fps as usize);
    }

    /// ウィンドウが開いているか
    pub fn is_open(&self) -> bool {
        self.window.is_open()
    }

    /// 現在のクライアント領域
    pub fn size(&self) -> (usize, usize) {
        self.window.get_size()
    }

    /// 押されたキーを操作に変換
    pub fn controls(&self) -> Vec<Control> {
        self.window
            .get_keys_pressed(KeyRepeat::No)
            .into_iter()
            .filter_map(control_for)
            .collect()
    }

    /// バッファをウィンドウに表示
    pub fn present(&mut self, surface: &PixelSurface, mirror: bool) -> Result<()> {
        let (w, h) = (surface.width(), surface.height());
        if mirror {
            surface.mirrored_into(&mut self.mirrored);
            self.window.update_with_buffer(&self.mirrored, w, h)?;
        } else {
            self.window.update_with_buffer(surface.buffer(), w, h)?;
        }
        Ok(())
    }
}

/// キー割り当て
pub fn control_for(key: Key) -> Option<Control> {
    let control = match key {
        Key::V => Control::SetMode(Mode::Overlay),
        Key::Key2 => Control::SetMode(Mode::TwoD),
        Key::Key3 => Control::SetMode(Mode::ThreeD),
        Key::R => Control::SetMode(Mode::Skinned),
        Key::F1 => Control::SetStyle(StyleKind::Neon),
        Key::F2 => Control::SetStyle(StyleKind::Ghost),
        Key::F3 => Control::SetStyle(StyleKind::Robot),
        Key::F4 => Control::SetStyle(StyleKind::Matrix),
        Key::F5 => Control::SetStyle(StyleKind::Synthwave),
        Key::Left => Control::RotateModel(-ROTATE_STEP),
        Key::Right => Control::RotateModel(ROTATE_STEP),
        Key::Up => Control::ScaleModel(SCALE_STEP),
        Key::Down => Control::ScaleModel(1.0 / SCALE_STEP),
        Key::Home => Control::ResetModel,
        Key::M => Control::ToggleMirror,
        Key::S => Control::Snapshot,
        Key::Escape => Control::Quit,
        _ => return None,
    };
    Some(control)
}
