//! Commands the Simulation Service sends to a running Runner task (§4.5).

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerCommand {
    Start,
    Pause,
    Resume,
    Stop,
}
