pub mod catalog;
pub mod clock;
pub mod deterioration;
pub mod dispatch;
pub mod error;
pub mod hospital;
pub mod incident;
pub mod roster;
pub mod routing;
pub mod runner;
pub mod scenario;
pub mod systems;
pub mod team;
pub mod telemetry;
pub mod victim;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;
