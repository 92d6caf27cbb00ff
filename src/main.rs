//! Spycewar - headless native runner
//!
//! Plays scripted rounds through the full tick/render handoff and logs the
//! results. Usage: `spycewar [config.json] [seed]`.

#[cfg(not(target_arch = "wasm32"))]
use anyhow::Context as _;
#[cfg(not(target_arch = "wasm32"))]
use spycewar::{
    GameConfig, Scoreboard,
    platform::{FrameClock, InputSource, ScriptedInput},
    render::{self, ProceduralSprites, Renderer, SpriteKey},
    sim::{Arena, ParticleKind, PlayerInput, RoundOutcome, TickInput, tick},
};

#[cfg(not(target_arch = "wasm32"))]
const ROUNDS: u32 = 3;
/// Simulated seconds before a round is called off
#[cfg(not(target_arch = "wasm32"))]
const ROUND_TIME_LIMIT: f32 = 90.0;
/// Host frame rate the runner pretends to have
#[cfg(not(target_arch = "wasm32"))]
const FRAME_DT: f32 = 1.0 / 30.0;

/// Counts draw calls instead of drawing
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Default)]
struct DrawCounter {
    sprites: usize,
    bars: usize,
    particles: usize,
}

#[cfg(not(target_arch = "wasm32"))]
impl Renderer for DrawCounter {
    fn draw(&mut self, _sprite: SpriteKey, _position: glam::Vec2, _rotation: f32) {
        self.sprites += 1;
    }

    fn draw_bar(&mut self, _value: f32, _max: f32, _position: glam::Vec2) {
        self.bars += 1;
    }

    fn draw_particle(&mut self, _position: glam::Vec2, _kind: ParticleKind, _life: f32) {
        self.particles += 1;
    }
}

/// Deterministic sparring pattern for one round
#[cfg(not(target_arch = "wasm32"))]
fn sparring_script(round: u32, ticks: usize) -> ScriptedInput {
    let phase = round as usize * 37;
    ScriptedInput::new((0..ticks).map(move |t| {
        let t = t + phase;
        let one = PlayerInput {
            thrust: t % 90 < 20,
            rotate_dir: if t % 120 < 30 { 1 } else { 0 },
            fire: t % 7 == 0,
            hyperspace: t % 600 == 599,
            shield: t % 300 > 260,
            stop: t % 400 == 0,
        };
        let two = PlayerInput {
            thrust: t % 75 < 15,
            rotate_dir: if t % 100 < 25 { -1 } else { 0 },
            fire: t % 5 == 0,
            hyperspace: t % 450 == 449,
            shield: t % 240 > 210,
            stop: false,
        };
        TickInput::new(one, two)
    }))
}

#[cfg(not(target_arch = "wasm32"))]
fn play_round<S: InputSource>(
    arena: &mut Arena,
    input: &mut S,
    sprites: &mut ProceduralSprites,
    counter: &mut DrawCounter,
) {
    let mut clock = FrameClock::new();
    while !arena.is_finished() {
        for _ in 0..clock.advance(FRAME_DT) {
            let tick_input = TickInput::poll(input);
            tick(arena, &tick_input, spycewar::consts::SIM_DT, sprites);
        }
        render::submit(&arena.render_commands(), counter);

        if arena.elapsed >= ROUND_TIME_LIMIT {
            log::warn!("Round {} hit the time limit", arena.round);
            arena.abort();
        }
    }
}

/// `[config.json] [seed]`, both optional
#[cfg(not(target_arch = "wasm32"))]
fn parse_args(mut args: impl Iterator<Item = String>) -> anyhow::Result<(GameConfig, u64)> {
    let config = match args.next() {
        Some(path) => GameConfig::load(&path).with_context(|| format!("failed loading config {path}"))?,
        None => GameConfig::default(),
    };
    let seed = match args.next() {
        Some(s) => s.parse::<u64>().with_context(|| format!("invalid seed {s:?}"))?,
        None => 0x5eed,
    };
    Ok((config, seed))
}

#[cfg(not(target_arch = "wasm32"))]
fn run() -> anyhow::Result<()> {
    let (config, seed) = parse_args(std::env::args().skip(1))?;

    let mut arena = Arena::new(config, seed).context("failed creating arena")?;
    let mut sprites = ProceduralSprites::new();
    let mut counter = DrawCounter::default();
    let mut board = Scoreboard::new();
    let round_ticks = (ROUND_TIME_LIMIT / spycewar::consts::SIM_DT) as usize + 1;

    for _ in 0..ROUNDS {
        let mut input = sparring_script(arena.round, round_ticks);
        play_round(&mut arena, &mut input, &mut sprites, &mut counter);

        let outcome = arena.outcome();
        let duration = arena.elapsed;
        let round = arena.round;
        let ctx = arena.end_round();
        match outcome {
            Some(outcome) => board.record(round, outcome, duration),
            None => log::info!("Round {} ended without a result: {}", round, ctx),
        }
        arena
            .start_round()
            .with_context(|| format!("failed starting round {}", arena.round + 1))?;
    }

    log::info!(
        "Session over: player1 {} / player2 {} / draws {}",
        board.wins(spycewar::sim::PlayerId::One),
        board.wins(spycewar::sim::PlayerId::Two),
        board.draws()
    );
    if let Some(fastest) = board.fastest_win() {
        if let RoundOutcome::Winner(id) = fastest.outcome {
            log::info!("Fastest win: {} in round {} ({:.1}s)", id, fastest.round, fastest.duration);
        }
    }
    log::info!(
        "Drew {} sprites, {} bars, {} particles ({} sprite orientations cached)",
        counter.sprites,
        counter.bars,
        counter.particles,
        sprites.cached()
    );
    Ok(())
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Spycewar (headless) starting...");

    if let Err(e) = run() {
        log::error!("{e:#}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The simulation core is host-agnostic; no wasm runner ships with it
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> impl Iterator<Item = String> {
        list.iter().map(|s| s.to_string()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn test_defaults_without_args() {
        let (config, seed) = parse_args(args(&[])).unwrap();
        assert_eq!(seed, 0x5eed);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_errors_carry_context() {
        let err = parse_args(args(&["/definitely/not/here.json"])).unwrap_err();
        assert!(format!("{err:#}").starts_with("failed loading config /definitely/not/here.json: "));

        let path = std::env::temp_dir().join("spycewar_args_test.json");
        std::fs::write(&path, "{}").unwrap();
        let err = parse_args(args(&[path.to_str().unwrap(), "soon"])).unwrap_err();
        assert!(format!("{err:#}").starts_with("invalid seed \"soon\": "));
        std::fs::remove_file(&path).ok();
    }
}
