//! Built-in Components
//!
//! Plain data the scene knows how to render, name and follow with the
//! camera. Game logic lives in behaviors, not here.

use serde::{Deserialize, Serialize};

use crate::ecs::Identifier;
use crate::math::Vec2;

/// Human-readable entity name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
}

impl Tag {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// RGBA color, 8 bits per channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::WHITE
    }
}

/// Textured or flat-colored quad centered on the entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sprite {
    /// Size in world units before the transform's scale
    pub size: Vec2,
    pub color: Color,
    /// Texture asset, `None` draws a flat quad
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub texture: Option<Identifier>,
    /// Higher layers draw on top
    #[serde(default)]
    pub layer: i32,
}

impl Sprite {
    pub fn new(size: Vec2, color: Color) -> Self {
        Self {
            size,
            color,
            texture: None,
            layer: 0,
        }
    }
}

impl Default for Sprite {
    fn default() -> Self {
        Self::new(Vec2::ONE, Color::WHITE)
    }
}

/// Text drawn at the entity's origin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Text {
    pub content: String,
    pub font_size: f32,
    pub color: Color,
    /// Font asset, `None` uses the renderer's default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font: Option<Identifier>,
}

impl Text {
    pub fn new(content: impl Into<String>, font_size: f32) -> Self {
        Self {
            content: content.into(),
            font_size,
            color: Color::WHITE,
            font: None,
        }
    }
}

impl Default for Text {
    fn default() -> Self {
        Self::new("", 16.0)
    }
}

/// Marks an entity as a viewpoint. The scene only reads `enabled`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub enabled: bool,
}

impl Default for Camera {
    fn default() -> Self {
        Self { enabled: true }
    }
}
