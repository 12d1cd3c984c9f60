//! Demo scene
//!
//! A player square moved with WASD/arrows, a satellite orbiting it as a
//! child entity, a camera parented to the player, and sparks spawned with
//! Space through deferred calls that fade out and `die()`.
//! P saves the scene to `demo_scene.ron`.

use lumen2d::math::Vec2;
use lumen2d::scene::serializer::save_scene;
use lumen2d::scene::{
    Behavior, BehaviorRegistry, Camera, Color, EntityContext, InputEvent, Key, Scene, SceneError, Sprite,
    Text, Transform,
};

const PLAYER_SPEED: f32 = 240.0;
const ORBIT_RADIUS: f32 = 48.0;
const ORBIT_SPEED: f32 = 180.0;
const SPARK_LIFETIME: f32 = 0.6;
const SAVE_PATH: &str = "demo_scene.ron";

pub fn behaviors() -> BehaviorRegistry {
    let mut registry = BehaviorRegistry::new();
    registry.register_native::<PlayerController>("player");
    registry.register_native::<Orbiter>("orbiter");
    registry.register_native::<Spark>("spark");
    registry
}

pub fn build(scene: &mut Scene) -> Result<(), SceneError> {
    let player = scene.create_entity("player")?;
    scene.add_component(player, Sprite::new(Vec2::new(32.0, 32.0), Color::rgb(90, 200, 250)))?;
    scene.attach_behavior(player, "player")?;

    let satellite = scene.create_entity("satellite")?;
    scene.add_component(satellite, Sprite::new(Vec2::new(10.0, 10.0), Color::rgb(250, 210, 90)))?;
    scene.attach_behavior(satellite, "orbiter")?;
    scene.set_parent(satellite, player)?;

    let camera = scene.create_entity("camera")?;
    scene.add_component(camera, Camera::default())?;
    scene.set_parent(camera, player)?;

    let hud = scene.create_entity("hud")?;
    *scene.get_component_mut::<Transform>(hud)? = Transform::from_position(Vec2::new(-300.0, -200.0));
    scene.add_component(hud, Text::new("WASD move / Space sparks / P save / Esc quit", 20.0))?;
    scene.set_parent(hud, camera)?;

    for (i, x) in [-200.0, 0.0, 200.0].into_iter().enumerate() {
        let marker = scene.create_entity(&format!("marker_{i}"))?;
        scene.get_component_mut::<Transform>(marker)?.position = Vec2::new(x, 120.0);
        let mut sprite = Sprite::new(Vec2::new(20.0, 20.0), Color::rgb(120, 120, 130));
        sprite.layer = -1;
        scene.add_component(marker, sprite)?;
    }
    Ok(())
}

#[derive(Default)]
struct PlayerController {
    held: Vec<Key>,
}

impl PlayerController {
    fn direction(&self) -> Vec2 {
        let mut dir = Vec2::ZERO;
        for key in &self.held {
            match key {
                Key::Char('W') | Key::Up => dir.y -= 1.0,
                Key::Char('S') | Key::Down => dir.y += 1.0,
                Key::Char('A') | Key::Left => dir.x -= 1.0,
                Key::Char('D') | Key::Right => dir.x += 1.0,
                _ => {}
            }
        }
        dir.normalize()
    }
}

impl Behavior for PlayerController {
    fn on_input(&mut self, ctx: &mut EntityContext<'_>, event: &InputEvent) -> anyhow::Result<()> {
        match *event {
            InputEvent::KeyPressed(Key::Space) => {
                let origin = ctx.get::<Transform>()?.position;
                ctx.defer(move |scene| spawn_spark(scene, origin));
            }
            InputEvent::KeyPressed(Key::Char('P')) => {
                ctx.defer(|scene| {
                    save_scene(scene, SAVE_PATH)?;
                    tracing::info!(path = SAVE_PATH, "scene saved");
                    Ok(())
                });
            }
            InputEvent::KeyPressed(key) if !self.held.contains(&key) => self.held.push(key),
            InputEvent::KeyReleased(key) => self.held.retain(|&k| k != key),
            _ => {}
        }
        Ok(())
    }

    fn on_update(&mut self, ctx: &mut EntityContext<'_>, delta_time: f32) -> anyhow::Result<()> {
        let step = self.direction().scale(PLAYER_SPEED * delta_time);
        ctx.get_mut::<Transform>()?.translate(step);
        Ok(())
    }
}

fn spawn_spark(scene: &mut Scene, origin: Vec2) -> Result<(), SceneError> {
    let spark = scene.create_entity("spark")?;
    scene.get_component_mut::<Transform>(spark)?.position = origin;
    let mut sprite = Sprite::new(Vec2::new(6.0, 6.0), Color::rgb(255, 120, 60));
    sprite.layer = 1;
    scene.add_component(spark, sprite)?;
    scene.attach_behavior(spark, "spark")
}

/// Circles its parent; the angle is saved with the scene.
#[derive(Default)]
struct Orbiter {
    degrees: f32,
}

impl Behavior for Orbiter {
    fn on_update(&mut self, ctx: &mut EntityContext<'_>, delta_time: f32) -> anyhow::Result<()> {
        self.degrees = (self.degrees + ORBIT_SPEED * delta_time) % 360.0;
        let (s, c) = self.degrees.to_radians().sin_cos();
        let transform = ctx.get_mut::<Transform>()?;
        transform.position = Vec2::new(c, s).scale(ORBIT_RADIUS);
        transform.rotation = self.degrees;
        Ok(())
    }

    fn save_state(&self) -> Option<ron::Value> {
        Some(ron::Value::Number(ron::Number::from(f64::from(self.degrees))))
    }

    fn restore_state(&mut self, state: &ron::Value) -> anyhow::Result<()> {
        match state {
            ron::Value::Number(n) => {
                self.degrees = n.into_f64() as f32;
                Ok(())
            }
            other => anyhow::bail!("orbiter state must be a number, got {other:?}"),
        }
    }
}

/// Drifts upward and fades, then removes itself.
struct Spark {
    remaining: f32,
}

impl Default for Spark {
    fn default() -> Self {
        Self {
            remaining: SPARK_LIFETIME,
        }
    }
}

impl Behavior for Spark {
    fn on_update(&mut self, ctx: &mut EntityContext<'_>, delta_time: f32) -> anyhow::Result<()> {
        self.remaining -= delta_time;
        if self.remaining <= 0.0 {
            ctx.die();
            return Ok(());
        }
        ctx.get_mut::<Transform>()?.translate(Vec2::new(0.0, -60.0 * delta_time));
        let alpha = (self.remaining / SPARK_LIFETIME * 255.0) as u8;
        ctx.get_mut::<Sprite>()?.color.a = alpha;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen2d::config::SceneConfig;
    use lumen2d::scene::InputQueue;

    fn demo_scene() -> Scene {
        let mut scene = Scene::new(SceneConfig::default(), behaviors()).unwrap();
        build(&mut scene).unwrap();
        scene
    }

    #[test]
    fn test_player_moves_and_camera_follows() {
        let mut scene = demo_scene();
        let player = scene.entity_by_name("player").unwrap();
        let camera = scene.entity_by_name("camera").unwrap();

        let mut input = InputQueue::new();
        input.push(InputEvent::KeyPressed(Key::Char('D')));
        scene.process_input(&mut input).unwrap();
        scene.update(0.5).unwrap();

        let x = scene.get_component::<Transform>(player).unwrap().position.x;
        assert!((x - PLAYER_SPEED * 0.5).abs() < 0.001);
        assert_eq!(scene.active_camera(), Some(camera));
        assert!((scene.view_position().x - x).abs() < 0.001);
    }

    #[test]
    fn test_space_spawns_spark_that_expires() {
        let mut scene = demo_scene();
        let before = scene.entity_count();

        let mut input = InputQueue::new();
        input.push(InputEvent::KeyPressed(Key::Space));
        scene.process_input(&mut input).unwrap();
        assert_eq!(scene.entity_count(), before);

        scene.update(0.1).unwrap();
        let spark = scene.entity_by_name("spark").unwrap();

        for _ in 0..10 {
            scene.update(0.1).unwrap();
        }
        assert!(!scene.is_alive(spark));
        assert_eq!(scene.entity_count(), before);
    }

    #[test]
    fn test_orbiter_state_round_trip() {
        let mut orbiter = Orbiter { degrees: 90.0 };
        let state = orbiter.save_state().unwrap();
        orbiter.degrees = 0.0;
        orbiter.restore_state(&state).unwrap();
        assert!((orbiter.degrees - 90.0).abs() < 0.001);
        assert!(orbiter.restore_state(&ron::Value::Unit).is_err());
    }
}
