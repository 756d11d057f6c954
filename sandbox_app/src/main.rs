//! Sandbox application
//!
//! Builds a small two-level scene, drives it headlessly for a configured
//! number of frames with scripted keyboard input, pokes at it through the
//! debug console and logs what happened.
//!
//! Usage: `sandbox [config.toml|config.ron]`

use rand::seq::SliceRandom;
use rand::Rng;

use scene_engine::ecs::components::Span;
use scene_engine::ecs::ObjectFlags;
use scene_engine::foundation::logging;
use scene_engine::prelude::*;

/// Keys the scripted player presses, one per frame
const SCRIPTED_KEYS: [KeyCode; 10] = [
    KeyCode::W,
    KeyCode::S,
    KeyCode::A,
    KeyCode::D,
    KeyCode::Q,
    KeyCode::E,
    KeyCode::Up,
    KeyCode::Down,
    KeyCode::Left,
    KeyCode::Space,
];

const DEFAULT_FRAMES: u32 = 120;

#[derive(thiserror::Error, Debug)]
enum AppError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("scene setup: {0}")]
    Registry(#[from] RegistryError),

    #[error("console: {0}")]
    Console(#[from] ConsoleError),

    #[error("object `{0}` missing from the scene")]
    Missing(&'static str),
}

fn main() {
    if let Err(e) = run() {
        log::error!("Sandbox failed: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), AppError> {
    let config = match std::env::args().nth(1) {
        Some(path) => ApplicationConfig::load_from_file(path)?,
        None => ApplicationConfig::load_or_default("sandbox.toml")?,
    };
    config.validate()?;
    logging::init_with_level(&config.engine.log_level);
    log::info!("Starting {}", config.name);

    let frames = if config.frames == 0 { DEFAULT_FRAMES } else { config.frames };
    let mut scene = SceneManager::new(config.scene.clone());
    let mut renderer = NullRenderer::new(800, 600);
    let mut audio = NullAudio;
    let mut console = Console::new();
    let mut rng = rand::thread_rng();

    scene.load_level("instance1", build_instance1)?;
    let camera = scene.world().find("camara_main").ok_or(AppError::Missing("camara_main"))?;

    let first_half = frames / 2;
    run_frames(&mut scene, camera, first_half, &mut renderer, &mut audio, &mut rng);

    for line in [
        "list",
        "show cubo_main",
        "set hada mesh_render texture textura1",
        "set camara_aux camera fov 60",
        "disable cubo_second recursive",
        "show cubo_third",
    ] {
        for output in console.execute(scene.world_mut(), line)? {
            log::info!("> {}", output);
        }
    }

    scene.load_level("instance2", build_instance2)?;
    run_frames(&mut scene, camera, frames - first_half, &mut renderer, &mut audio, &mut rng);

    let stats = scene.stats();
    log::info!(
        "Finished after {} frames ({:.1} fps simulated): {} levels, {} roots unloaded, {} objects alive, {} registered",
        stats.frames,
        scene.timer().average_fps(),
        stats.levels_loaded,
        stats.objects_unloaded,
        stats.objects,
        stats.registered
    );
    Ok(())
}

fn run_frames(
    scene: &mut SceneManager,
    camera: GameObjectId,
    count: u32,
    renderer: &mut NullRenderer,
    audio: &mut NullAudio,
    rng: &mut impl Rng,
) {
    for _ in 0..count {
        if !scene.is_running() {
            break;
        }

        let key = SCRIPTED_KEYS.choose(rng).copied();
        if let Some(key) = key {
            scene.push_input(InputEvent::KeyPressed(key));
        }
        let pointer = (rng.gen_range(0.0..800.0), rng.gen_range(0.0..600.0));
        scene.push_input(InputEvent::MouseMoved {
            x: pointer.0,
            y: pointer.1,
        });

        let time = scene.run_frame_with_camera(camera, renderer, audio);
        log::debug!("Frame {} key {:?} dt {:.4}", time.frame, key, time.delta);

        if let Some(key) = key {
            scene.push_input(InputEvent::KeyReleased(key));
        }
    }
}

fn build_instance1(world: &mut World) -> Result<(), RegistryError> {
    let camara_main = world.spawn("camara_main")?;
    let camara_second = world.spawn("camara_second")?;
    let cubo_main = world.spawn("cubo_main")?;
    let cubo_second = world.spawn("cubo_second")?;
    let cubo_third = world.spawn("cubo_third")?;
    let hada = world.spawn("hada")?;
    let chispas = world.spawn("chispas")?;

    for bad in ["$camara", "cubo cuatro", "9hada"] {
        if let Err(e) = world.spawn(bad) {
            log::info!("Rejected as expected: {}", e);
        }
    }

    world.add_child(cubo_main, cubo_second);
    world.add_child(cubo_second, cubo_third);
    world.add_child(hada, chispas);
    if !world.add_child(cubo_third, cubo_main) {
        log::info!("Cycle cubo_third -> cubo_main refused");
    }

    if let Some(object) = world.get_mut(camara_main) {
        object.transform_mut().position.y += 3.0;
        object.camera();
        object.set_flags(ObjectFlags::KEY_EVENT);
        object.set_input_fn(move_main_camera);
    }
    world.preserve(camara_main, false);

    if let Some(object) = world.get_mut(camara_second) {
        object.transform_mut().position.y += 3.0;
        let camera = object.camera();
        camera.target = Some("cubo_main".to_string());
        camera.viewport.width = 0.3;
        camera.viewport.height = 0.3;
        camera.background = Color::new(0.0, 0.5, 0.75, 1.0);
        object.set_flags(ObjectFlags::EVENT);
        object.set_event_fn(toggle_second_camera_target);
    }
    world.rename(camara_second, "camara_aux")?;

    for (id, offset) in [
        (cubo_main, Vec3::new(0.0, 0.0, 5.0)),
        (cubo_second, Vec3::new(1.0, 0.0, 0.0)),
        (cubo_third, Vec3::new(0.0, 1.0, 0.0)),
    ] {
        if let Some(object) = world.get_mut(id) {
            object.transform_mut().translate(&offset);
            object.mesh_render().set_mesh("cubo");
        }
    }
    if let Some(object) = world.get_mut(cubo_main) {
        object.set_flags(ObjectFlags::KEY_EVENT);
        object.set_input_fn(move_main_cube);
    }
    if let Some(object) = world.get_mut(cubo_second) {
        let mut stretch = 1.0_f32;
        object.set_input_fn(move |ctx| {
            let dt = ctx.time().delta;
            if ctx.input().is_key_down(KeyCode::Up) {
                stretch += dt;
            }
            if ctx.input().is_key_down(KeyCode::Down) {
                stretch = (stretch - dt).max(0.1);
            }
            if let Some(transform) = ctx.transform_mut() {
                transform.set_scale(Vec3::new(1.0, stretch, 1.0));
            }
        });
    }

    if let Some(object) = world.get_mut(hada) {
        let transform = object.transform_mut();
        transform.set_scale(Vec3::new(0.1, 0.1, 0.1));
        transform.translate(&Vec3::new(0.0, 0.0, 10.0));
        transform.rotate(&Vec3::new(0.0, 90.0, 0.0));

        let mesh = object.mesh_render();
        mesh.set_mesh("mdl_hada1");
        mesh.set_texture("texture_mdl_hada1");

        object.set_flags(ObjectFlags::LOOP | ObjectFlags::RENDER);
        object.set_behaviour_fn(|ctx| {
            let dt = ctx.time().delta;
            if let Some(transform) = ctx.transform_mut() {
                transform.rotate(&Vec3::new(0.0, 45.0 * dt, 0.0));
            }
        });
    }

    if let Some(object) = world.get_mut(chispas) {
        let emitter = object.particle_emitter();
        emitter.material = Some("spark".to_string());
        emitter.max_particles = 32;
        emitter.gravity = Vec3::new(0.0, -9.8, 0.0);
        emitter.start_life = Span::new(0.5, 1.5);
        emitter.start_min_color = Color::new(1.0, 0.8, 0.2, 1.0);
        emitter.start_max_color = Color::new(1.0, 0.3, 0.0, 1.0);
        emitter.start();
    }

    log::info!(
        "instance1 built: {} objects, {} registered",
        world.len(),
        world.registered_count()
    );
    Ok(())
}

fn build_instance2(world: &mut World) -> Result<(), RegistryError> {
    let puerta = world.spawn("puerta")?;
    let musica = world.spawn("musica")?;

    if let Some(object) = world.get_mut(puerta) {
        object.transform_mut().set_position(Vec3::new(16.0, 16.0, 0.0));
        let gui = object.gui_texture();
        gui.texture = Some("door_icon".to_string());
        gui.width = 64.0;
        gui.height = 64.0;
    }
    if let Some(object) = world.get_mut(musica) {
        let source = object.audio_source();
        source.set_sound("theme");
        source.music = true;
        source.looping = true;
        source.start_playing = true;
    }

    log::info!("instance2 built, door hit at (40, 40): {}", world.gui_hit_test(puerta, 40.0, 40.0));
    Ok(())
}

fn move_main_cube(ctx: &mut ObjectContext<'_>) {
    let dt = ctx.time().delta;
    let input = ctx.input();
    let axis = |positive: KeyCode, negative: KeyCode| {
        f32::from(u8::from(input.is_key_down(positive))) - f32::from(u8::from(input.is_key_down(negative)))
    };
    let step = Vec3::new(0.0, axis(KeyCode::Q, KeyCode::E), axis(KeyCode::W, KeyCode::S)) * 5.0 * dt;
    let turn = Vec3::new(0.0, axis(KeyCode::D, KeyCode::A) * 20.0 * dt, 0.0);

    if let Some(transform) = ctx.transform_mut() {
        transform.translate(&step);
        transform.rotate(&turn);
    }
}

fn move_main_camera(ctx: &mut ObjectContext<'_>) {
    let dt = ctx.time().delta;
    let mut delta = Vec3::zeros();
    if ctx.input().is_key_down(KeyCode::Up) {
        delta.z += dt;
    }
    if ctx.input().is_key_down(KeyCode::Down) {
        delta.z -= dt;
    }
    if ctx.input().is_key_down(KeyCode::Left) {
        delta.x -= dt;
    }
    if ctx.input().is_key_down(KeyCode::Right) {
        delta.x += dt;
    }
    if let Some(transform) = ctx.transform_mut() {
        transform.translate(&delta);
    }
}

fn toggle_second_camera_target(ctx: &mut ObjectContext<'_>) {
    if !ctx.input().was_key_pressed(KeyCode::Space) {
        return;
    }
    let Some(camera) = ctx.object_mut().and_then(|o| o.get_component_mut::<Camera>()) else {
        return;
    };
    camera.target = match camera.target {
        Some(_) => None,
        None => Some("cubo_main".to_string()),
    };
    log::debug!("camara_aux target: {:?}", camera.target);
}
