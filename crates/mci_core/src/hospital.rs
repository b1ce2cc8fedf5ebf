//! Hospital capacity: departments with finite beds and the two-phase
//! reserve (`can_admit`) / commit (`admit_to_department`) protocol.

use std::collections::BTreeMap;
use std::fmt;

use bevy_ecs::prelude::Component;
use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::routing::Address;
use crate::victim::{Victim, VictimId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HospitalId(pub u32);

impl fmt::Display for HospitalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DepartmentId(pub u32);

impl fmt::Display for DepartmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Department {
    pub id: DepartmentId,
    pub name: String,
    /// Disciplines this department treats.
    pub medical_categories: Vec<u32>,
    pub current_beds_count: u32,
    pub admitted_victims: Vec<VictimId>,
}

impl Department {
    pub fn new(id: DepartmentId, name: impl Into<String>, medical_categories: Vec<u32>, beds: u32) -> Self {
        Self {
            id,
            name: name.into(),
            medical_categories,
            current_beds_count: beds,
            admitted_victims: Vec::new(),
        }
    }

    pub fn treats(&self, discipline: u32) -> bool {
        self.medical_categories.contains(&discipline)
    }
}

#[derive(Debug, Clone, PartialEq, Component)]
pub struct Hospital {
    pub id: HospitalId,
    pub name: String,
    pub address: Address,
    pub departments: Vec<Department>,
    /// Beds reserved for victims on their way, per department.
    incoming: BTreeMap<DepartmentId, Vec<VictimId>>,
}

impl Hospital {
    pub fn new(id: HospitalId, name: impl Into<String>, address: Address, departments: Vec<Department>) -> Self {
        Self {
            id,
            name: name.into(),
            address,
            departments,
            incoming: BTreeMap::new(),
        }
    }

    pub fn department(&self, id: DepartmentId) -> Option<&Department> {
        self.departments.iter().find(|department| department.id == id)
    }

    pub fn incoming(&self, department: DepartmentId) -> &[VictimId] {
        self.incoming
            .get(&department)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Free beds not yet promised to an incoming victim.
    pub fn available_beds(&self, department: &Department) -> u32 {
        let reserved = self.incoming(department.id).len() as u32;
        department.current_beds_count.saturating_sub(reserved)
    }

    /// First department treating `discipline` that still has an available bed.
    pub fn try_get_department(&self, discipline: u32) -> Option<&Department> {
        self.departments
            .iter()
            .find(|department| department.treats(discipline) && self.available_beds(department) > 0)
    }

    pub fn is_incoming(&self, victim: VictimId) -> bool {
        self.incoming.values().any(|victims| victims.contains(&victim))
    }

    /// Reserves a bed in the first department able to take the victim.
    /// `Ok(false)` means no department has room; nothing is reserved then.
    pub fn can_admit(&mut self, victim: &Victim) -> Result<bool, SimError> {
        if self.is_incoming(victim.id) {
            return Err(SimError::AlreadyReserved {
                hospital: self.id,
                victim: victim.id,
            });
        }
        let department = victim
            .disciplines()
            .into_iter()
            .find_map(|discipline| self.try_get_department(discipline).map(|d| d.id));
        match department {
            Some(department) => {
                self.incoming.entry(department).or_default().push(victim.id);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Releases the victim's reservation, if any.
    pub fn remove_from_incoming(&mut self, victim: VictimId) -> bool {
        let Some(department) = self
            .incoming
            .iter()
            .find(|(_, victims)| victims.contains(&victim))
            .map(|(department, _)| *department)
        else {
            return false;
        };
        if let Some(victims) = self.incoming.get_mut(&department) {
            victims.retain(|id| *id != victim);
            if victims.is_empty() {
                self.incoming.remove(&department);
            }
        }
        true
    }

    /// Takes one bed in the first matching department with capacity and
    /// stamps the victim's admission time. The caller must already have
    /// released the victim's own reservation.
    pub fn admit_to_department(&mut self, victim: &mut Victim, time: u32) -> Result<DepartmentId, SimError> {
        let mut full_match = None;
        let mut chosen = None;
        for discipline in victim.disciplines() {
            if let Some(department) = self.try_get_department(discipline) {
                chosen = Some(department.id);
                break;
            }
            if full_match.is_none() {
                full_match = self
                    .departments
                    .iter()
                    .find(|department| department.treats(discipline))
                    .map(|department| department.id);
            }
        }

        let Some(chosen) = chosen else {
            return Err(match full_match {
                Some(department) => SimError::NoFreeBeds {
                    hospital: self.id,
                    department,
                },
                None => SimError::NoMatchingDepartment {
                    hospital: self.id,
                    victim: victim.id,
                },
            });
        };

        let department = self
            .departments
            .iter_mut()
            .find(|department| department.id == chosen)
            .ok_or(SimError::UnknownDepartment(chosen))?;
        department.current_beds_count -= 1;
        department.admitted_victims.push(victim.id);
        victim.admit(time);
        Ok(chosen)
    }

    pub fn admitted_count(&self) -> usize {
        self.departments
            .iter()
            .map(|department| department.admitted_victims.len())
            .sum()
    }
}
