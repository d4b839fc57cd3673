pub mod sequencer;
pub mod state;

pub use sequencer::BootSequencer;
pub use state::{
    render_boot_steps, BootAdvance, BootState, BootStatus, BootStep, RenderedBootStep,
};
