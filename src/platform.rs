//! macroquad backend
//!
//! Turns macroquad's polled keyboard/mouse/window state into scene input
//! events, and draws sprites and text with macroquad's shape and text
//! calls. The active camera's position is mapped to the window center.

use lumen2d::math::{mat4_rotation_scale_of, mat4_translation_of, Mat4, Vec2};
use lumen2d::scene::{self, InputEvent, InputQueue, InputSource, Key, Renderer, Sprite, Text};
use macroquad::prelude as mq;

const BACKGROUND: mq::Color = mq::Color::new(0.08, 0.08, 0.1, 1.0);

/// Letter and digit keys, reported as `Key::Char`.
const CHAR_KEYS: [(mq::KeyCode, char); 36] = [
    (mq::KeyCode::A, 'A'), (mq::KeyCode::B, 'B'), (mq::KeyCode::C, 'C'),
    (mq::KeyCode::D, 'D'), (mq::KeyCode::E, 'E'), (mq::KeyCode::F, 'F'),
    (mq::KeyCode::G, 'G'), (mq::KeyCode::H, 'H'), (mq::KeyCode::I, 'I'),
    (mq::KeyCode::J, 'J'), (mq::KeyCode::K, 'K'), (mq::KeyCode::L, 'L'),
    (mq::KeyCode::M, 'M'), (mq::KeyCode::N, 'N'), (mq::KeyCode::O, 'O'),
    (mq::KeyCode::P, 'P'), (mq::KeyCode::Q, 'Q'), (mq::KeyCode::R, 'R'),
    (mq::KeyCode::S, 'S'), (mq::KeyCode::T, 'T'), (mq::KeyCode::U, 'U'),
    (mq::KeyCode::V, 'V'), (mq::KeyCode::W, 'W'), (mq::KeyCode::X, 'X'),
    (mq::KeyCode::Y, 'Y'), (mq::KeyCode::Z, 'Z'),
    (mq::KeyCode::Key0, '0'), (mq::KeyCode::Key1, '1'), (mq::KeyCode::Key2, '2'),
    (mq::KeyCode::Key3, '3'), (mq::KeyCode::Key4, '4'), (mq::KeyCode::Key5, '5'),
    (mq::KeyCode::Key6, '6'), (mq::KeyCode::Key7, '7'), (mq::KeyCode::Key8, '8'),
    (mq::KeyCode::Key9, '9'),
];

fn map_key(code: mq::KeyCode) -> Key {
    match code {
        mq::KeyCode::Escape => Key::Escape,
        mq::KeyCode::Enter => Key::Enter,
        mq::KeyCode::Space => Key::Space,
        mq::KeyCode::Tab => Key::Tab,
        mq::KeyCode::Backspace => Key::Backspace,
        mq::KeyCode::Up => Key::Up,
        mq::KeyCode::Down => Key::Down,
        mq::KeyCode::Left => Key::Left,
        mq::KeyCode::Right => Key::Right,
        other => CHAR_KEYS
            .iter()
            .find(|(code, _)| *code == other)
            .map(|&(_, c)| Key::Char(c))
            .unwrap_or(Key::Other(other as u32)),
    }
}

const MOUSE_BUTTONS: [(mq::MouseButton, scene::MouseButton); 3] = [
    (mq::MouseButton::Left, scene::MouseButton::Left),
    (mq::MouseButton::Right, scene::MouseButton::Right),
    (mq::MouseButton::Middle, scene::MouseButton::Middle),
];

/// Polls macroquad once per frame and queues the changes as events.
pub struct MacroquadInput {
    queue: InputQueue,
    last_mouse: (f32, f32),
    last_size: (f32, f32),
}

impl MacroquadInput {
    pub fn new() -> Self {
        // Window close becomes an event instead of an immediate exit
        mq::prevent_quit();
        Self {
            queue: InputQueue::new(),
            last_mouse: (f32::NAN, f32::NAN),
            last_size: (0.0, 0.0),
        }
    }

    /// Call once per frame, before the scene drains the queue.
    pub fn collect(&mut self) {
        let size = (mq::screen_width(), mq::screen_height());
        if size != self.last_size {
            self.last_size = size;
            self.queue.push(InputEvent::Resized {
                width: size.0,
                height: size.1,
            });
        }

        let mut pressed: Vec<mq::KeyCode> = mq::get_keys_pressed().into_iter().collect();
        pressed.sort_by_key(|code| *code as u32);
        self.queue.extend(pressed.into_iter().map(|code| InputEvent::KeyPressed(map_key(code))));

        let mut released: Vec<mq::KeyCode> = mq::get_keys_released().into_iter().collect();
        released.sort_by_key(|code| *code as u32);
        self.queue.extend(released.into_iter().map(|code| InputEvent::KeyReleased(map_key(code))));

        let (x, y) = mq::mouse_position();
        if (x, y) != self.last_mouse {
            self.last_mouse = (x, y);
            self.queue.push(InputEvent::MouseMoved { x, y });
        }
        for (mq_button, button) in MOUSE_BUTTONS {
            if mq::is_mouse_button_pressed(mq_button) {
                self.queue.push(InputEvent::MouseButtonPressed { button, x, y });
            }
            if mq::is_mouse_button_released(mq_button) {
                self.queue.push(InputEvent::MouseButtonReleased { button, x, y });
            }
        }

        if mq::is_quit_requested() {
            self.queue.push(InputEvent::CloseRequested);
        }
    }
}

impl InputSource for MacroquadInput {
    fn poll_event(&mut self) -> Option<InputEvent> {
        self.queue.poll_event()
    }
}

/// Draws in screen space with the view position at the window center.
pub struct MacroquadRenderer {
    offset: Vec2,
}

impl MacroquadRenderer {
    pub fn new() -> Self {
        Self { offset: Vec2::ZERO }
    }

    fn to_screen(&self, transform: &Mat4) -> Vec2 {
        mat4_translation_of(transform).xy() + self.offset
    }
}

fn to_mq_color(color: scene::Color) -> mq::Color {
    mq::Color::from_rgba(color.r, color.g, color.b, color.a)
}

impl Renderer for MacroquadRenderer {
    fn begin(&mut self, view_position: Vec2) {
        mq::clear_background(BACKGROUND);
        let center = Vec2::new(mq::screen_width(), mq::screen_height()).scale(0.5);
        self.offset = center - view_position;
    }

    fn draw_sprite(&mut self, sprite: &Sprite, transform: &Mat4) {
        let at = self.to_screen(transform);
        let (degrees, scale) = mat4_rotation_scale_of(transform);
        // Texture assets are not loaded by this backend; every sprite is a flat quad
        mq::draw_rectangle_ex(
            at.x,
            at.y,
            sprite.size.x * scale.x,
            sprite.size.y * scale.y,
            mq::DrawRectangleParams {
                offset: mq::vec2(0.5, 0.5),
                rotation: degrees.to_radians(),
                color: to_mq_color(sprite.color),
            },
        );
    }

    fn draw_text(&mut self, text: &Text, transform: &Mat4) {
        let at = self.to_screen(transform);
        mq::draw_text(&text.content, at.x, at.y, text.font_size, to_mq_color(text.color));
    }
}
