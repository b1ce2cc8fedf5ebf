//! Victim clinical model: states, RPM scoring, deterioration and the
//! intervention-driven improvement transitions.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use bevy_ecs::prelude::Component;
use serde::{Deserialize, Serialize};

use crate::deterioration::{DeteriorationTable, RPM_DETERIORATION_INTERVAL_MINUTES};
use crate::error::SimError;

pub type StateNumber = u32;

/// Discipline moved to the front of a victim's discipline list when present.
pub const EMERGENCY_DISCIPLINE: u32 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VictimId(pub u32);

impl fmt::Display for VictimId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A `(discipline, number)` pair, written `X.Y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HealthProblem {
    pub discipline: u32,
    pub number: u32,
}

impl HealthProblem {
    pub const fn new(discipline: u32, number: u32) -> Self {
        Self { discipline, number }
    }
}

impl fmt::Display for HealthProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.discipline, self.number)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0:?} is not a health problem symbol")]
pub struct ParseHealthProblemError(pub String);

impl FromStr for HealthProblem {
    type Err = ParseHealthProblemError;

    /// Accepts both `X.Y` and the procedure form `P(X.Y)`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let inner = trimmed
            .strip_prefix("P(")
            .and_then(|rest| rest.strip_suffix(')'))
            .unwrap_or(trimmed);
        let err = || ParseHealthProblemError(s.to_string());
        let (discipline, number) = inner.split_once('.').ok_or_else(err)?;
        Ok(Self {
            discipline: discipline.trim().parse().map_err(|_| err())?,
            number: number.trim().parse().map_err(|_| err())?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Procedure {
    pub health_problem: HealthProblem,
    pub duration_minutes: u32,
}

impl Procedure {
    pub const fn new(discipline: u32, number: u32, duration_minutes: u32) -> Self {
        Self {
            health_problem: HealthProblem::new(discipline, number),
            duration_minutes,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriageColour {
    Green,
    Yellow,
    Red,
    Black,
}

impl TriageColour {
    /// Lower is more urgent. Black sorts last; dead victims are never targeted.
    pub fn urgency_rank(self) -> u8 {
        match self {
            TriageColour::Red => 0,
            TriageColour::Yellow => 1,
            TriageColour::Green => 2,
            TriageColour::Black => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimedTransition {
    /// Minutes since simulation start after which the victim deteriorates.
    pub after_minutes: u32,
    pub target: StateNumber,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterventionTransition {
    pub required: BTreeSet<HealthProblem>,
    pub target: StateNumber,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    pub number: StateNumber,
    pub is_walking: bool,
    pub respiratory_rate: u32,
    pub pulse_rate: u32,
    pub is_following_orders: bool,
    pub triage_colour: TriageColour,
    #[serde(default)]
    pub health_problems: Vec<HealthProblem>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub timed_transition: Option<TimedTransition>,
    #[serde(default)]
    pub intervention_transition: Option<InterventionTransition>,
}

impl State {
    pub fn new(number: StateNumber, triage_colour: TriageColour) -> Self {
        Self {
            number,
            is_walking: false,
            respiratory_rate: 0,
            pulse_rate: 0,
            is_following_orders: false,
            triage_colour,
            health_problems: Vec::new(),
            description: String::new(),
            timed_transition: None,
            intervention_transition: None,
        }
    }

    pub fn with_vitals(
        mut self,
        is_walking: bool,
        respiratory_rate: u32,
        pulse_rate: u32,
        is_following_orders: bool,
    ) -> Self {
        self.is_walking = is_walking;
        self.respiratory_rate = respiratory_rate;
        self.pulse_rate = pulse_rate;
        self.is_following_orders = is_following_orders;
        self
    }

    pub fn with_health_problems(mut self, problems: impl IntoIterator<Item = HealthProblem>) -> Self {
        self.health_problems = problems.into_iter().collect();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_timed_transition(mut self, after_minutes: u32, target: StateNumber) -> Self {
        self.timed_transition = Some(TimedTransition {
            after_minutes,
            target,
        });
        self
    }

    pub fn with_intervention_transition(
        mut self,
        required: impl IntoIterator<Item = HealthProblem>,
        target: StateNumber,
    ) -> Self {
        self.intervention_transition = Some(InterventionTransition {
            required: required.into_iter().collect(),
            target,
        });
        self
    }

    pub fn validate(&self) -> Result<(), SimError> {
        if self.number < 1 {
            return Err(SimError::InvalidState {
                state: self.number,
                reason: "state numbers start at 1".to_string(),
            });
        }
        Ok(())
    }

    /// RPM = respiratory score + pulse score + best motor response score.
    pub fn rpm(&self) -> u32 {
        respiratory_score(self.respiratory_rate)
            + pulse_score(self.pulse_rate)
            + motor_response_score(self.is_walking, self.is_following_orders)
    }

    /// Distinct disciplines in ascending order, emergency medicine first.
    pub fn disciplines(&self) -> Vec<u32> {
        let mut disciplines: Vec<u32> = self
            .health_problems
            .iter()
            .map(|problem| problem.discipline)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if let Some(position) = disciplines.iter().position(|&d| d == EMERGENCY_DISCIPLINE) {
            let emergency = disciplines.remove(position);
            disciplines.insert(0, emergency);
        }
        disciplines
    }

    fn required_for_improvement(&self) -> impl Iterator<Item = &HealthProblem> {
        self.intervention_transition
            .iter()
            .flat_map(|transition| transition.required.iter())
    }
}

pub fn respiratory_score(rate: u32) -> u32 {
    match rate {
        0 => 0,
        1..=9 => 1,
        10..=24 => 4,
        25..=35 => 3,
        _ => 2,
    }
}

pub fn pulse_score(rate: u32) -> u32 {
    match rate {
        0 => 0,
        1..=40 => 1,
        41..=60 => 2,
        61..=120 => 4,
        _ => 3,
    }
}

pub fn motor_response_score(is_walking: bool, is_following_orders: bool) -> u32 {
    match (is_walking, is_following_orders) {
        (false, false) => 0,
        (true, false) => 2,
        (false, true) => 3,
        (true, true) => 4,
    }
}

#[derive(Debug, Clone, PartialEq, Component)]
pub struct Victim {
    pub id: VictimId,
    states: Vec<State>,
    current: usize,
    initial_rpm: u32,
    current_rpm: u32,
    procedures_performed: BTreeSet<HealthProblem>,
    /// Set while a specialist is working on this victim.
    pub under_procedure: bool,
    hospital_admittance_time: Option<u32>,
}

impl Victim {
    /// Starts the victim in state 1.
    pub fn new(id: VictimId, states: Vec<State>) -> Result<Self, SimError> {
        for state in &states {
            state.validate()?;
        }
        let current = states
            .iter()
            .position(|state| state.number == 1)
            .ok_or(SimError::UnknownState {
                victim: id,
                state: 1,
            })?;
        let rpm = states[current].rpm();
        Ok(Self {
            id,
            states,
            current,
            initial_rpm: rpm,
            current_rpm: rpm,
            procedures_performed: BTreeSet::new(),
            under_procedure: false,
            hospital_admittance_time: None,
        })
    }

    pub fn current_state(&self) -> &State {
        &self.states[self.current]
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    pub fn initial_rpm(&self) -> u32 {
        self.initial_rpm
    }

    pub fn current_rpm(&self) -> u32 {
        self.current_rpm
    }

    pub fn triage_colour(&self) -> TriageColour {
        self.current_state().triage_colour
    }

    pub fn calculate_rpm(&self) -> u32 {
        self.current_state().rpm()
    }

    pub fn procedures_performed(&self) -> &BTreeSet<HealthProblem> {
        &self.procedures_performed
    }

    pub fn hospital_admittance_time(&self) -> Option<u32> {
        self.hospital_admittance_time
    }

    pub fn is_admitted(&self) -> bool {
        self.hospital_admittance_time.is_some()
    }

    /// Death is decided by the triage colour alone; RPM 0 on its own is not fatal.
    pub fn is_dead(&self) -> bool {
        self.triage_colour() == TriageColour::Black
    }

    pub fn admit(&mut self, time: u32) {
        self.hospital_admittance_time = Some(time);
    }

    pub fn disciplines(&self) -> Vec<u32> {
        self.current_state().disciplines()
    }

    /// Problems that must be treated before the improvement transition fires.
    pub fn critical_health_problems(&self) -> BTreeSet<HealthProblem> {
        self.current_state()
            .required_for_improvement()
            .filter(|problem| !self.procedures_performed.contains(problem))
            .copied()
            .collect()
    }

    /// Untreated problems of the current state that do not gate an improvement.
    pub fn outstanding_health_problems(&self) -> BTreeSet<HealthProblem> {
        let critical = self.critical_health_problems();
        self.current_state()
            .health_problems
            .iter()
            .filter(|problem| !self.procedures_performed.contains(problem))
            .filter(|problem| !critical.contains(problem))
            .copied()
            .collect()
    }

    /// Applies RPM decay at whole intervals, then any timed deterioration whose
    /// threshold has passed. Admitted victims are left untouched.
    pub fn lower_rpm(&mut self, elapsed_minutes: u32, table: &DeteriorationTable) -> Result<(), SimError> {
        if self.is_admitted() {
            return Ok(());
        }
        if elapsed_minutes > 0 && elapsed_minutes % RPM_DETERIORATION_INTERVAL_MINUTES == 0 {
            let interval_index = (elapsed_minutes / RPM_DETERIORATION_INTERVAL_MINUTES - 1) as usize;
            self.current_rpm = table.lookup(self.initial_rpm, interval_index);
        }
        if let Some(transition) = self.current_state().timed_transition {
            if elapsed_minutes >= transition.after_minutes {
                self.change_state(transition.target)?;
            }
        }
        Ok(())
    }

    pub fn change_state(&mut self, number: StateNumber) -> Result<(), SimError> {
        let index = self
            .states
            .iter()
            .position(|state| state.number == number)
            .ok_or(SimError::UnknownState {
                victim: self.id,
                state: number,
            })?;
        self.current = index;
        self.procedures_performed.clear();
        self.initial_rpm = self.calculate_rpm();
        self.current_rpm = self.initial_rpm;
        Ok(())
    }

    /// Records a critical procedure; once the critical set is empty the
    /// improvement transition fires.
    pub fn perform_procedure(&mut self, procedure: &Procedure) -> Result<(), SimError> {
        self.under_procedure = false;
        let problem = procedure.health_problem;
        if !self.critical_health_problems().contains(&problem) {
            return Err(SimError::WrongProcedure {
                victim: self.id,
                problem,
            });
        }
        self.procedures_performed.insert(problem);
        if self.critical_health_problems().is_empty() {
            if let Some(target) = self
                .current_state()
                .intervention_transition
                .as_ref()
                .map(|transition| transition.target)
            {
                self.change_state(target)?;
            }
        }
        Ok(())
    }

    /// Records a procedure that does not gate any transition.
    pub fn perform_supportive_procedure(&mut self, procedure: &Procedure) {
        self.under_procedure = false;
        self.procedures_performed.insert(procedure.health_problem);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn crushed_victim() -> Victim {
        let states = vec![
            State::new(1, TriageColour::Red)
                .with_vitals(false, 34, 0, true)
                .with_health_problems([
                    HealthProblem::new(5, 4),
                    HealthProblem::new(15, 7),
                    HealthProblem::new(15, 14),
                    HealthProblem::new(25, 2),
                ])
                .with_timed_transition(50, 2)
                .with_intervention_transition([HealthProblem::new(15, 7), HealthProblem::new(15, 14)], 3),
            State::new(2, TriageColour::Black),
            State::new(3, TriageColour::Red)
                .with_vitals(false, 14, 0, true)
                .with_health_problems([HealthProblem::new(5, 4), HealthProblem::new(25, 2)]),
        ];
        Victim::new(VictimId(1), states).expect("victim")
    }

    #[test]
    fn rpm_sums_the_three_scores() {
        let victim = crushed_victim();
        assert_eq!(victim.initial_rpm(), 3 + 0 + 3);
        assert_eq!(victim.current_rpm(), victim.calculate_rpm());
    }

    #[test]
    fn score_tables_cover_boundaries() {
        assert_eq!(respiratory_score(9), 1);
        assert_eq!(respiratory_score(10), 4);
        assert_eq!(respiratory_score(36), 2);
        assert_eq!(pulse_score(40), 1);
        assert_eq!(pulse_score(120), 4);
        assert_eq!(pulse_score(121), 3);
        assert_eq!(motor_response_score(true, false), 2);
    }

    #[test]
    fn disciplines_put_emergency_first() {
        assert_eq!(crushed_victim().disciplines(), vec![15, 5, 25]);
    }

    #[test]
    fn rpm_decays_only_on_whole_intervals() {
        let table = DeteriorationTable::default();
        let mut victim = crushed_victim();
        victim.lower_rpm(31, &table).expect("lower");
        assert_eq!(victim.current_rpm(), 6);
        victim.lower_rpm(30, &table).expect("lower");
        assert_eq!(victim.current_rpm(), 4);
    }

    #[test]
    fn admitted_victim_does_not_decay() {
        let mut victim = crushed_victim();
        victim.admit(30);
        victim.lower_rpm(30, &DeteriorationTable::default()).expect("lower");
        assert_eq!(victim.current_rpm(), 6);
    }

    #[test]
    fn timed_transition_fires_after_threshold() {
        let mut victim = crushed_victim();
        victim.lower_rpm(60, &DeteriorationTable::default()).expect("lower");
        assert_eq!(victim.current_state().number, 2);
        assert!(victim.is_dead());
        assert_eq!(victim.current_rpm(), 0);
    }

    #[test]
    fn change_state_rejects_unknown_number() {
        let mut victim = crushed_victim();
        let err = victim.change_state(4).unwrap_err();
        assert!(matches!(err, SimError::UnknownState { state: 4, .. }));
        assert_eq!(victim.current_state().number, 1);
    }

    #[test]
    fn critical_set_shrinks_then_improves() {
        let mut victim = crushed_victim();
        victim
            .perform_procedure(&Procedure::new(15, 7, 7))
            .expect("first critical");
        assert_eq!(
            victim.critical_health_problems(),
            BTreeSet::from([HealthProblem::new(15, 14)])
        );
        assert_eq!(victim.current_state().number, 1);

        victim
            .perform_procedure(&Procedure::new(15, 14, 5))
            .expect("second critical");
        assert_eq!(victim.current_state().number, 3);
        assert!(victim.procedures_performed().is_empty());
        assert_eq!(victim.initial_rpm(), 4 + 0 + 3);
    }

    #[test]
    fn non_critical_procedure_is_rejected() {
        let mut victim = crushed_victim();
        victim.under_procedure = true;
        let err = victim.perform_procedure(&Procedure::new(25, 2, 3)).unwrap_err();
        assert!(matches!(err, SimError::WrongProcedure { .. }));
        assert!(!victim.under_procedure);
    }

    #[test]
    fn outstanding_excludes_critical_and_treated() {
        let mut victim = crushed_victim();
        victim.perform_supportive_procedure(&Procedure::new(5, 4, 3));
        assert_eq!(
            victim.outstanding_health_problems(),
            BTreeSet::from([HealthProblem::new(25, 2)])
        );
    }

    #[test]
    fn parses_both_symbol_forms() {
        assert_eq!("15.7".parse::<HealthProblem>(), Ok(HealthProblem::new(15, 7)));
        assert_eq!("P(0.1)".parse::<HealthProblem>(), Ok(HealthProblem::new(0, 1)));
        assert!("P(15)".parse::<HealthProblem>().is_err());
    }

    #[test]
    fn state_zero_is_invalid() {
        let err = Victim::new(VictimId(2), vec![State::new(0, TriageColour::Green)]).unwrap_err();
        assert!(matches!(err, SimError::InvalidState { state: 0, .. }));
    }
}
