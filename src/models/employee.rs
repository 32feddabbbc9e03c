//! Employee model.
//!
//! Employees are owned by the employee-management side of the system; the
//! scheduler treats them as read-only input. Eligibility for event types is an
//! explicit table on [`Role`], refined by qualification flags.

use serde::{Deserialize, Serialize};

use super::EventType;

/// Employee identifier.
pub type EmployeeId = String;

/// An employee that can be assigned to work events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    /// Unique employee identifier.
    pub id: EmployeeId,
    /// Display name.
    pub name: String,
    /// Job role.
    pub role: Role,
    /// Trained for rotation-governed work regardless of role.
    pub rotation_trained: bool,
    /// Inactive employees are never assigned.
    pub active: bool,
}

/// Employee role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Event specialist: production and generic work.
    Specialist,
    /// Lead specialist: also support tasks and supervisory checks.
    Lead,
    /// Rotation specialist: always qualified for rotation work.
    RotationSpecialist,
    /// Store supervisor: supervisory checks, exempt from the daily quota.
    Supervisor,
}

impl Role {
    /// Whether this role may work `event_type`, given the rotation-trained flag.
    ///
    /// | EventType | Specialist | Lead | RotationSpecialist | Supervisor |
    /// |---|---|---|---|---|
    /// | Production | ✓ | ✓ | ✓ | ✓ |
    /// | Supervision | | ✓ | | ✓ |
    /// | Rotation* | trained | trained | ✓ | trained |
    /// | Setup/Refresh/Teardown | | ✓ | | ✓ |
    /// | Generic | ✓ | ✓ | ✓ | ✓ |
    pub fn can_work(self, event_type: EventType, rotation_trained: bool) -> bool {
        match event_type {
            EventType::Production | EventType::Generic => true,
            EventType::Supervision => matches!(self, Role::Lead | Role::Supervisor),
            EventType::RotationProduction | EventType::RotationSurvey => {
                self == Role::RotationSpecialist || rotation_trained
            }
            EventType::Setup | EventType::Refresh | EventType::Teardown => {
                matches!(self, Role::Lead | Role::Supervisor)
            }
        }
    }

    /// Exempt from the daily production quota.
    pub fn is_quota_exempt(self) -> bool {
        self == Role::Supervisor
    }

    /// Rule-based candidate priority for an event type (lower = tried first).
    ///
    /// Keeps scarce roles free: specialists take production before leads,
    /// supervisors come last; support work goes to leads before supervisors.
    pub fn candidate_rank(self, event_type: EventType) -> u8 {
        match event_type {
            EventType::Production | EventType::Generic => match self {
                Role::Specialist => 0,
                Role::RotationSpecialist => 1,
                Role::Lead => 2,
                Role::Supervisor => 3,
            },
            EventType::RotationProduction | EventType::RotationSurvey => match self {
                Role::RotationSpecialist => 0,
                Role::Specialist => 1,
                Role::Lead => 2,
                Role::Supervisor => 3,
            },
            EventType::Supervision => match self {
                Role::Supervisor => 0,
                Role::Lead => 1,
                Role::Specialist | Role::RotationSpecialist => 2,
            },
            EventType::Setup | EventType::Refresh | EventType::Teardown => match self {
                Role::Lead => 0,
                Role::Supervisor => 1,
                Role::Specialist | Role::RotationSpecialist => 2,
            },
        }
    }
}

impl Employee {
    /// Creates an active, untrained employee.
    pub fn new(id: impl Into<EmployeeId>, role: Role) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            role,
            rotation_trained: false,
            active: true,
        }
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Marks the employee rotation-trained.
    pub fn rotation_trained(mut self) -> Self {
        self.rotation_trained = true;
        self
    }

    /// Marks the employee inactive.
    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    /// Whether this employee is eligible for `event_type`.
    pub fn can_work(&self, event_type: EventType) -> bool {
        self.role.can_work(event_type, self.rotation_trained)
    }
}
