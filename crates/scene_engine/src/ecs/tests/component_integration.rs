//! Integration tests for leaf components driven through full frames
//!
//! Uses the recording backends to check what reaches the render and audio
//! collaborators.

use crate::audio::{AudioBackend, AudioCall, AudioError, PlayRequest, RecordingAudio};
use crate::core::config::SceneConfig;
use crate::ecs::components::{AudioSource, ParticleEmitter, PlaybackState};
use crate::ecs::GameObjectId;
use crate::foundation::math::{Mat4, Point3, Vec3};
use crate::render::{DrawCall, RecordingRenderer};
use crate::scene::SceneManager;
use approx::assert_relative_eq;

fn frame(scene: &mut SceneManager, renderer: &mut RecordingRenderer, audio: &mut RecordingAudio, view: &Mat4) {
    scene.run_frame(renderer, audio, &Mat4::identity(), view);
}

#[test]
fn mesh_draw_carries_the_composed_model_view() {
    let mut scene = SceneManager::default();
    let (ship, turret) = scene.load_level("one", |world| {
        let ship = world.spawn("ship").unwrap();
        let turret = world.spawn("turret").unwrap();
        world.add_child(ship, turret);
        world.get_mut(ship).unwrap().transform_mut().set_position(Vec3::new(0.0, 0.0, 5.0));
        let object = world.get_mut(turret).unwrap();
        object.transform_mut().set_position(Vec3::new(1.0, 0.0, 0.0));
        object.mesh_render().set_mesh("turret");
        (ship, turret)
    });

    let mut renderer = RecordingRenderer::new();
    let view = Mat4::new_translation(&Vec3::new(0.0, -1.0, 0.0));
    frame(&mut scene, &mut renderer, &mut RecordingAudio::new(), &view);

    let draws: Vec<_> = renderer.meshes().collect();
    assert_eq!(draws.len(), 1);
    assert_eq!(draws[0].owner, turret);
    assert_eq!(draws[0].mesh, "turret");
    assert_eq!(draws[0].shader, "__textureShader");
    let origin = draws[0].model_view.transform_point(&Point3::origin());
    assert_relative_eq!(origin.coords, Vec3::new(1.0, -1.0, 5.0), epsilon = 1e-5);
    assert!(scene.world().contains(ship));
}

#[test]
fn draws_follow_dispatch_order() {
    let mut scene = SceneManager::default();
    scene.load_level("one", |world| {
        for name in ["first", "second"] {
            let id = world.spawn(name).unwrap();
            world.get_mut(id).unwrap().mesh_render().set_mesh(name);
        }
        let hud = world.spawn("hud").unwrap();
        let gui = world.get_mut(hud).unwrap().gui_texture();
        gui.texture = Some("health".into());
        gui.width = 64.0;
        gui.height = 16.0;
    });

    let mut renderer = RecordingRenderer::new();
    frame(&mut scene, &mut renderer, &mut RecordingAudio::new(), &Mat4::identity());

    let kinds: Vec<&str> = renderer
        .draws
        .iter()
        .map(|draw| match draw {
            DrawCall::Mesh(mesh) => mesh.mesh.as_str(),
            DrawCall::Gui(gui) => gui.texture.as_str(),
            DrawCall::Particles(_) => "particles",
        })
        .collect();
    assert_eq!(kinds, vec!["first", "second", "health"]);
}

#[test]
fn disabled_component_submits_nothing() {
    let mut scene = SceneManager::default();
    let id = scene.load_level("one", |world| {
        let id = world.spawn("ghost").unwrap();
        world.get_mut(id).unwrap().mesh_render().set_mesh("ghost");
        id
    });
    scene
        .world_mut()
        .get_mut(id)
        .unwrap()
        .set_component_state::<crate::ecs::components::MeshRender>(false);

    let mut renderer = RecordingRenderer::new();
    frame(&mut scene, &mut renderer, &mut RecordingAudio::new(), &Mat4::identity());
    assert!(renderer.draws.is_empty());
}

#[test]
fn particles_advance_with_the_frame_delta() {
    let mut scene = SceneManager::new(SceneConfig::new().with_fixed_delta(0.1));
    let id = scene.load_level("one", |world| {
        let id = world.spawn("sparks").unwrap();
        let emitter = world.get_mut(id).unwrap().particle_emitter();
        emitter.reseed(7);
        emitter.max_particles = 8;
        emitter.start_life = crate::ecs::components::Span::fixed(10.0);
        emitter.start();
        id
    });

    let mut renderer = RecordingRenderer::new();
    frame(&mut scene, &mut renderer, &mut RecordingAudio::new(), &Mat4::identity());

    let emitter = scene.world().get(id).unwrap().get_component::<ParticleEmitter>().unwrap();
    assert_eq!(emitter.particles().len(), 8);
    for particle in emitter.particles() {
        assert_relative_eq!(particle.life, 9.9, epsilon = 1e-5);
    }
    match renderer.draws.as_slice() {
        [DrawCall::Particles(draw)] => assert_eq!(draw.particles.len(), 8),
        other => panic!("expected one particle draw, got {other:?}"),
    }
}

#[test]
fn audio_commands_flush_at_the_world_position() {
    let mut scene = SceneManager::default();
    let (speaker, radio) = scene.load_level("one", |world| {
        let speaker = world.spawn("speaker").unwrap();
        let radio = world.spawn("radio").unwrap();
        world.add_child(speaker, radio);
        world.get_mut(speaker).unwrap().transform_mut().set_position(Vec3::new(2.0, 0.0, 0.0));
        let source = world.get_mut(radio).unwrap().audio_source();
        source.set_sound("song");
        source.looping = true;
        source.start_playing = true;
        (speaker, radio)
    });

    let mut renderer = RecordingRenderer::new();
    let mut audio = RecordingAudio::new();
    frame(&mut scene, &mut renderer, &mut audio, &Mat4::identity());

    match audio.commands().as_slice() {
        [AudioCall::Play {
            source,
            request,
            position,
        }] => {
            assert_eq!(*source, radio);
            assert_eq!(request.sound, "song");
            assert!(request.looping);
            assert_relative_eq!(*position, Vec3::new(2.0, 0.0, 0.0));
        }
        other => panic!("expected a single play command, got {other:?}"),
    }

    scene
        .world_mut()
        .get_mut(radio)
        .unwrap()
        .get_component_mut::<AudioSource>()
        .unwrap()
        .pause();
    audio.calls.clear();
    frame(&mut scene, &mut renderer, &mut audio, &Mat4::identity());
    assert_eq!(audio.commands(), vec![&AudioCall::Pause(radio)]);
    assert!(scene.world().contains(speaker));
}

fn looping_radio(scene: &mut SceneManager, level: &str) -> GameObjectId {
    scene.load_level(level, |world| {
        let radio = world.spawn("radio").unwrap();
        let source = world.get_mut(radio).unwrap().audio_source();
        source.set_sound("song");
        source.looping = true;
        source.start_playing = true;
        radio
    })
}

#[test]
fn level_transition_stops_unpreserved_voices() {
    let mut scene = SceneManager::default();
    let radio = looping_radio(&mut scene, "one");

    let mut renderer = RecordingRenderer::new();
    let mut audio = RecordingAudio::new();
    frame(&mut scene, &mut renderer, &mut audio, &Mat4::identity());
    assert!(matches!(audio.commands().as_slice(), [AudioCall::Play { source, .. }] if *source == radio));

    scene.load_level("two", |_| ());
    assert!(!scene.world().contains(radio));
    audio.calls.clear();
    frame(&mut scene, &mut renderer, &mut audio, &Mat4::identity());
    assert_eq!(audio.commands(), vec![&AudioCall::Stop(radio)]);

    audio.calls.clear();
    frame(&mut scene, &mut renderer, &mut audio, &Mat4::identity());
    assert!(audio.commands().is_empty());
}

#[test]
fn removing_a_source_stops_only_a_live_voice() {
    let mut scene = SceneManager::default();
    let radio = looping_radio(&mut scene, "one");
    let silent = scene.world_mut().spawn("silent").unwrap();
    scene.world_mut().init(silent);
    scene.world_mut().get_mut(silent).unwrap().audio_source().set_sound("hum");

    let mut renderer = RecordingRenderer::new();
    let mut audio = RecordingAudio::new();
    frame(&mut scene, &mut renderer, &mut audio, &Mat4::identity());

    for id in [radio, silent] {
        assert!(scene.world_mut().get_mut(id).unwrap().remove_component::<AudioSource>());
    }
    audio.calls.clear();
    frame(&mut scene, &mut renderer, &mut audio, &Mat4::identity());
    assert_eq!(audio.commands(), vec![&AudioCall::Stop(radio)]);
    assert!(scene.world().contains(radio));
}

fn radio_source(scene: &mut SceneManager, id: GameObjectId) -> &mut AudioSource {
    scene
        .world_mut()
        .get_mut(id)
        .unwrap()
        .get_component_mut::<AudioSource>()
        .unwrap()
}

/// Records like [`RecordingAudio`] but refuses to start voices
#[derive(Default)]
struct NoVoices {
    inner: RecordingAudio,
}

impl AudioBackend for NoVoices {
    fn play(&mut self, _source: GameObjectId, request: &PlayRequest, _position: Vec3) -> Result<(), AudioError> {
        Err(AudioError::SoundNotFound(request.sound.clone()))
    }

    fn pause(&mut self, source: GameObjectId) -> Result<(), AudioError> {
        self.inner.pause(source)
    }

    fn resume(&mut self, source: GameObjectId) -> Result<(), AudioError> {
        self.inner.resume(source)
    }

    fn stop(&mut self, source: GameObjectId) -> Result<(), AudioError> {
        self.inner.stop(source)
    }

    fn rewind(&mut self, source: GameObjectId) -> Result<(), AudioError> {
        self.inner.rewind(source)
    }

    fn play_one_shot(&mut self, request: &PlayRequest, position: Vec3) -> Result<(), AudioError> {
        self.inner.play_one_shot(request, position)
    }

    fn update_voice(&mut self, source: GameObjectId, position: Vec3, volume: f32) -> Result<(), AudioError> {
        self.inner.update_voice(source, position, volume)
    }
}

#[test]
fn failed_play_keeps_flushing_and_resets_playback() {
    let mut scene = SceneManager::default();
    let radio = scene.load_level("one", |world| {
        let radio = world.spawn("radio").unwrap();
        world.get_mut(radio).unwrap().audio_source().set_sound("missing");
        radio
    });
    {
        let s = radio_source(&mut scene, radio);
        assert!(s.play());
        assert!(s.stop());
        assert!(s.play_one_shot());
    }
    let mut renderer = RecordingRenderer::new();
    let mut audio = NoVoices::default();
    scene.run_frame(&mut renderer, &mut audio, &Mat4::identity(), &Mat4::identity());

    match audio.inner.commands().as_slice() {
        [AudioCall::Stop(stopped), AudioCall::OneShot { request, .. }] => {
            assert_eq!(*stopped, radio);
            assert_eq!(request.sound, "missing");
        }
        other => panic!("expected stop then one-shot, got {other:?}"),
    }
    assert_eq!(radio_source(&mut scene, radio).pending_commands(), 0);

    assert!(radio_source(&mut scene, radio).play());
    scene.run_frame(&mut renderer, &mut audio, &Mat4::identity(), &Mat4::identity());
    let s = radio_source(&mut scene, radio);
    assert_eq!(s.playback(), PlaybackState::Stopped);
    assert!(!s.has_voice());
}
