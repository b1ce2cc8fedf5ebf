pub mod bootstrap;
pub mod clock_tick;
pub mod deterioration;
pub mod incident_command;
pub mod movement;
pub mod orders;
pub mod procedures;
pub mod reconnaissance;

#[cfg(test)]
mod end_to_end_tests;
