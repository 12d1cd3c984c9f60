//! Rendering Contracts
//!
//! The scene never talks to a graphics API. It hands drawable components
//! and their global matrices to a [`Renderer`] supplied by the caller.

use crate::math::{Mat4, Vec2};

use super::components::{Sprite, Text};

/// Backend that turns drawables into pixels.
pub trait Renderer {
    /// Called once before any drawable, with the active camera position.
    fn begin(&mut self, _view_position: Vec2) {}

    fn draw_sprite(&mut self, sprite: &Sprite, transform: &Mat4);

    fn draw_text(&mut self, text: &Text, transform: &Mat4);

    /// Called once after the last drawable.
    fn end(&mut self) {}
}

/// A component that can submit itself to a renderer.
pub trait Drawable {
    fn draw(&self, renderer: &mut dyn Renderer, global_transform: &Mat4);
}

impl Drawable for Sprite {
    fn draw(&self, renderer: &mut dyn Renderer, global_transform: &Mat4) {
        renderer.draw_sprite(self, global_transform);
    }
}

impl Drawable for Text {
    fn draw(&self, renderer: &mut dyn Renderer, global_transform: &Mat4) {
        renderer.draw_text(self, global_transform);
    }
}
