//! Simulation window using `minifb`.
//!
//! The window stands in for the sensor: the mouse is the palm, seen from
//! the front.
//!
//! ```text
//! ┌──────────────────────────────────────────────┬────┐
//! │  tracking volume  (x -200..200, y 50..350)   │ z  │
//! │                                              │bar │
//! │                 (o)  palm                    │    │
//! │                                              │    │
//! ├──────────────────────────────────────────────┴────┤
//! │  status bar                                       │
//! └───────────────────────────────────────────────────┘
//! ```

use std::sync::mpsc::Sender;
use std::time::Instant;

use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};
use motion_core::Vector3;

use crate::source::SimInput;

// ════════════════════════════════════════════════════════════════════════════
// Layout constants
// ════════════════════════════════════════════════════════════════════════════

pub const WIN_W:     usize = 680;
pub const WIN_H:     usize = 480;
const VOL_X:         usize = 20;
const VOL_Y:         usize = 20;
const VOL_W:         usize = 580;
const VOL_H:         usize = 380;
const ZBAR_X:        usize = VOL_X + VOL_W + 20;
const ZBAR_W:        usize = 30;
const STATUS_Y:      usize = WIN_H - 52;
const BG_COLOR:      u32   = 0xFF1A1A2E;
const VOL_BG:        u32   = 0xFF16213E;
const GRID_COLOR:    u32   = 0xFF24335A;
const PALM_COLOR:    u32   = 0xFF6FE3FF;
const GRAB_COLOR:    u32   = 0xFFFFD700;
const CLICK_COLOR:   u32   = 0xFFFF5C5C;
const TEXT_BG:       u32   = 0xFF0F3460;

/// Sensor-space extent of the drawn volume, in millimetres.
pub const X_RANGE: (f32, f32) = (-200.0, 200.0);
pub const Y_RANGE: (f32, f32) = (50.0, 350.0);
pub const Z_RANGE: (f32, f32) = (-150.0, 150.0);
/// z change per frame while W/S is held.
const Z_STEP: f32 = 4.0;

// ════════════════════════════════════════════════════════════════════════════
// Window ↔ sensor mapping
// ════════════════════════════════════════════════════════════════════════════

/// Palm position for a mouse position, or `None` outside the volume.
pub fn window_to_sensor(mx: f32, my: f32, z: f32) -> Option<Vector3> {
    let fx = (mx - VOL_X as f32) / VOL_W as f32;
    let fy = (my - VOL_Y as f32) / VOL_H as f32;
    if !(0.0..=1.0).contains(&fx) || !(0.0..=1.0).contains(&fy) {
        return None;
    }
    Some(Vector3::new(
        X_RANGE.0 + fx * (X_RANGE.1 - X_RANGE.0),
        // screen y grows downward, sensor y grows upward
        Y_RANGE.1 - fy * (Y_RANGE.1 - Y_RANGE.0),
        z,
    ))
}

/// Inverse of [`window_to_sensor`], clamped to the volume.
pub fn sensor_to_window(p: Vector3) -> (usize, usize) {
    let fx = ((p.x - X_RANGE.0) / (X_RANGE.1 - X_RANGE.0)).clamp(0.0, 1.0);
    let fy = ((Y_RANGE.1 - p.y) / (Y_RANGE.1 - Y_RANGE.0)).clamp(0.0, 1.0);
    (
        VOL_X + (fx * (VOL_W - 1) as f32) as usize,
        VOL_Y + (fy * (VOL_H - 1) as f32) as usize,
    )
}

// ════════════════════════════════════════════════════════════════════════════
// Visualizer
// ════════════════════════════════════════════════════════════════════════════

pub struct Visualizer {
    window:  Window,
    buf:     Vec<u32>,
    sim_tx:  Sender<SimInput>,
    started: Instant,
    z:       f32,
    /// Last palm sent (position, grab).
    palm:    Option<(Vector3, bool)>,
}

impl Visualizer {
    pub fn new(title: &str, sim_tx: Sender<SimInput>) -> Result<Self, minifb::Error> {
        let mut window = Window::new(
            title,
            WIN_W, WIN_H,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        )?;

        window.limit_update_rate(Some(std::time::Duration::from_millis(16))); // ~60fps

        Ok(Visualizer {
            window,
            buf: vec![BG_COLOR; WIN_W * WIN_H],
            sim_tx,
            started: Instant::now(),
            z: 0.0,
            palm: None,
        })
    }

    pub fn is_open(&self) -> bool { self.window.is_open() }

    /// Read mouse and keyboard, send one sample. Returns false on quit.
    pub fn poll_input(&mut self) -> bool {
        if !self.window.is_open() { return false; }

        let one_shot = |k: Key| self.window.is_key_pressed(k, KeyRepeat::No);

        if one_shot(Key::Q) || one_shot(Key::Escape) {
            let _ = self.sim_tx.send(SimInput::Quit);
            return false;
        }
        if one_shot(Key::Space) {
            let _ = self.sim_tx.send(SimInput::Tap);
        }

        if self.window.is_key_down(Key::W) { self.z -= Z_STEP; }
        if self.window.is_key_down(Key::S) { self.z += Z_STEP; }
        self.z = self.z.clamp(Z_RANGE.0, Z_RANGE.1);

        let t_ms = self.started.elapsed().as_millis() as i64;
        let grab = self.window.get_mouse_down(MouseButton::Left);
        let position = self
            .window
            .get_mouse_pos(MouseMode::Pass)
            .and_then(|(mx, my)| window_to_sensor(mx, my, self.z));

        let input = match position {
            Some(position) => {
                self.palm = Some((position, grab));
                SimInput::Hand { position, grab, t_ms }
            }
            None => {
                self.palm = None;
                SimInput::NoHand { t_ms }
            }
        };
        self.sim_tx.send(input).is_ok()
    }

    /// Render one frame.
    pub fn render(&mut self, status: &str, click_pending: bool) {
        self.buf.fill(BG_COLOR);

        // ── Tracking volume ───────────────────────────────────────────────
        self.fill_rect(VOL_X, VOL_Y, VOL_W, VOL_H, VOL_BG);
        for i in 1..4 {
            self.fill_rect(VOL_X + i * VOL_W / 4, VOL_Y, 1, VOL_H, GRID_COLOR);
            self.fill_rect(VOL_X, VOL_Y + i * VOL_H / 4, VOL_W, 1, GRID_COLOR);
        }
        self.draw_border(VOL_X, VOL_Y, VOL_W, VOL_H, 0xFF4A6FA5);

        // ── z bar ─────────────────────────────────────────────────────────
        self.fill_rect(ZBAR_X, VOL_Y, ZBAR_W, VOL_H, VOL_BG);
        self.draw_border(ZBAR_X, VOL_Y, ZBAR_W, VOL_H, 0xFF4A6FA5);
        let zf = (self.z - Z_RANGE.0) / (Z_RANGE.1 - Z_RANGE.0);
        let zy = VOL_Y + (zf * (VOL_H - 4) as f32) as usize;
        self.fill_rect(ZBAR_X + 2, zy, ZBAR_W - 4, 4, PALM_COLOR);
        self.draw_label("Z", ZBAR_X + ZBAR_W / 2 - 1, VOL_Y + VOL_H + 4, 0xFFAADDFF);

        // ── Palm ──────────────────────────────────────────────────────────
        if let Some((p, grab)) = self.palm {
            let (cx, cy) = sensor_to_window(p);
            let color = if click_pending {
                CLICK_COLOR
            } else if grab {
                GRAB_COLOR
            } else {
                PALM_COLOR
            };
            self.draw_disc(cx, cy, if grab { 6 } else { 10 }, color);
            let label = format!("{:.0},{:.0},{:.0}", p.x, p.y, p.z);
            self.draw_label(&label, cx + 14, cy.saturating_sub(2), 0xFFEEEEEE);
        } else {
            self.draw_label("NO HAND", VOL_X + VOL_W / 2 - 14, VOL_Y + VOL_H / 2, 0xFF888888);
        }

        // ── Status bar ────────────────────────────────────────────────────
        self.fill_rect(0, STATUS_Y, WIN_W, WIN_H - STATUS_Y, TEXT_BG);
        self.draw_label(status, 10, STATUS_Y + 12, 0xFFEEEEEE);

        // ── Key legend ────────────────────────────────────────────────────
        self.draw_label(
            "mouse=palm  button=grab  W/S=z  space=tap  Q/esc=quit",
            10, WIN_H - 16, 0xFF888888,
        );

        self.window.update_with_buffer(&self.buf, WIN_W, WIN_H).ok();
    }

    // ── Primitive drawing helpers ─────────────────────────────────────────

    fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        for row in y..(y+h).min(WIN_H) {
            for col in x..(x+w).min(WIN_W) {
                self.buf[row * WIN_W + col] = color;
            }
        }
    }

    fn draw_border(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        if w == 0 || h == 0 { return; }
        for col in x..(x+w).min(WIN_W) {
            self.set_pixel(col, y, color);
            self.set_pixel(col, y + h - 1, color);
        }
        for row in y..(y+h).min(WIN_H) {
            self.set_pixel(x, row, color);
            self.set_pixel(x + w - 1, row, color);
        }
    }

    fn set_pixel(&mut self, x: usize, y: usize, color: u32) {
        if x < WIN_W && y < WIN_H {
            self.buf[y * WIN_W + x] = color;
        }
    }

    fn draw_disc(&mut self, cx: usize, cy: usize, r: usize, color: u32) {
        let r = r as isize;
        for dy in -r..=r {
            for dx in -r..=r {
                if dx * dx + dy * dy > r * r { continue; }
                let (x, y) = (cx as isize + dx, cy as isize + dy);
                if x >= 0 && y >= 0 {
                    self.set_pixel(x as usize, y as usize, color);
                }
            }
        }
    }

    /// 3×5 bitmap text.
    fn draw_label(&mut self, text: &str, x: usize, y: usize, color: u32) {
        let mut cx = x;
        for ch in text.chars() {
            let glyph = char_glyph(ch);
            for (row, &bits) in glyph.iter().enumerate() {
                for col in 0..3usize {
                    if bits & (1 << (2 - col)) != 0 {
                        self.set_pixel(cx + col, y + row, color);
                    }
                }
            }
            cx += 4; // 3 wide + 1 gap
            if cx + 4 > WIN_W { break; }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Minimal 3×5 bitmap font
// ────────────────────────────────────────────────────────────────────────────

fn char_glyph(c: char) -> [u8; 5] {
    match c {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        'a' | 'A' => [0b111, 0b101, 0b111, 0b101, 0b101],
        'b' | 'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'c' | 'C' => [0b111, 0b100, 0b100, 0b100, 0b111],
        'd' | 'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'e' | 'E' => [0b111, 0b100, 0b111, 0b100, 0b111],
        'f' | 'F' => [0b111, 0b100, 0b111, 0b100, 0b100],
        'g' | 'G' => [0b111, 0b100, 0b101, 0b101, 0b111],
        'h' | 'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'i' | 'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'j' | 'J' => [0b001, 0b001, 0b001, 0b101, 0b111],
        'k' | 'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'l' | 'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'm' | 'M' => [0b101, 0b111, 0b101, 0b101, 0b101],
        'n' | 'N' => [0b111, 0b101, 0b101, 0b101, 0b101],
        'o' | 'O' => [0b111, 0b101, 0b101, 0b101, 0b111],
        'p' | 'P' => [0b111, 0b101, 0b111, 0b100, 0b100],
        'q' | 'Q' => [0b111, 0b101, 0b101, 0b111, 0b001],
        'r' | 'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        's' | 'S' => [0b111, 0b100, 0b111, 0b001, 0b111],
        't' | 'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'u' | 'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'v' | 'V' => [0b101, 0b101, 0b101, 0b010, 0b010],
        'w' | 'W' => [0b101, 0b101, 0b101, 0b111, 0b101],
        'x' | 'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'y' | 'Y' => [0b101, 0b101, 0b111, 0b010, 0b010],
        'z' | 'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ',' => [0b000, 0b000, 0b000, 0b010, 0b100],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '=' => [0b000, 0b111, 0b000, 0b111, 0b000],
        ' ' => [0b000, 0b000, 0b000, 0b000, 0b000],
        _   => [0b000, 0b000, 0b010, 0b000, 0b000],
    }
}
