//! Kinetic layer entry point
//!
//! In the browser this starts the decoration layer; natively it runs a
//! headless pass over both simulations and logs what a surface would see.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    console_error_panic_hook::set_once();
    // A second init (hot reload) leaves the first logger in place
    let _ = console_log::init_with_level(log::Level::Info);
    log::info!("Kinetic layer starting...");
    kinetic_layer::platform::web::start_layer();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Kinetic layer (native) starting...");
    log::info!("Native mode runs a headless pass - serve the wasm build for the page layer");

    let config = kinetic_layer::SimConfig::load();
    let seed = config.seed.unwrap_or_else(kinetic_layer::platform::clock_seed);
    log::info!("Headless seed {seed}, density {}", config.density.as_str());
    headless::run(&config, seed, 60 * 30);
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use kinetic_layer::SimConfig;
    use kinetic_layer::consts::SIM_DT_MS;
    use kinetic_layer::renderer::{RecordingSurface, RenderSurface};
    use kinetic_layer::sim::{ContentItem, FreeSimulation, LaneSimulation, Simulation, TickInput, Viewport};

    fn sample_content() -> Vec<ContentItem> {
        (1..=10)
            .map(|i| ContentItem::new(format!("sample-{i}"), format!("/media/sample-{i}.png")))
            .collect()
    }

    fn drive<S: Simulation>(name: &str, sim: &mut S, frames: usize, input_at: impl Fn(usize) -> TickInput) {
        let mut surface = RecordingSurface::new();
        let mut peak = 0;
        for frame in 0..frames {
            surface.apply(&sim.advance(&input_at(frame), SIM_DT_MS));
            peak = peak.max(surface.mounted());
        }
        log::info!(
            "{name}: {} live, peak {peak}, {} mounted, {} unmounted, {} missed writes",
            sim.len(),
            surface.mounted_total,
            surface.unmounted_total,
            surface.missed_writes()
        );
    }

    pub fn run(config: &SimConfig, seed: u64, frames: usize) {
        let viewport = Viewport::new(1280.0, 720.0);

        let mut lane = LaneSimulation::new(config.effective_lane(), viewport, seed);
        lane.set_content(sample_content());
        // Pointer sweeps across the page for the middle third of the run
        drive("lane", &mut lane, frames, |frame| {
            let t = frame as f32 / frames as f32;
            TickInput {
                pointer_x: (0.33..0.66).contains(&t).then(|| (t - 0.33) / 0.33 * viewport.width),
                ..TickInput::default()
            }
        });

        let mut free = FreeSimulation::new(config.effective_free(), viewport, seed.wrapping_add(1));
        free.set_content(sample_content());
        drive("free", &mut free, frames, |_| TickInput::default());
    }
}
